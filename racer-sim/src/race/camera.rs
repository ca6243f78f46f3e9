use glam::DVec2;
use serde::Serialize;

use racer_core::entity_location::{normalize_degrees, EntityLocation};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CameraPose {
    pub position: DVec2,
    // degrees, screen rotation
    pub rotation: f64,
    pub zoom: f64,
}

// ease-in-out, flat at both ends
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

impl CameraPose {
    pub fn overview(center: DVec2, zoom: f64) -> Self {
        CameraPose {
            position: center,
            rotation: 0.0,
            zoom,
        }
    }

    /// Behind the car with its nose pointing up the screen.
    pub fn following(location: &EntityLocation, zoom: f64) -> Self {
        CameraPose {
            position: location.position,
            rotation: normalize_degrees(location.heading.to_degrees() + 90.0),
            zoom,
        }
    }

    pub fn ease_towards(&self, target: &CameraPose, t: f64) -> CameraPose {
        let s = smoothstep(t);
        CameraPose {
            position: self.position.lerp(target.position, s),
            // shortest way round
            rotation: self.rotation + normalize_degrees(target.rotation - self.rotation) * s,
            zoom: self.zoom + (target.zoom - self.zoom) * s,
        }
    }
}

/// The two poses the pre-race intro moves between.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraRig {
    pub overview: CameraPose,
    pub player: CameraPose,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_is_flat_at_the_ends() {
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(2.0), 1.0);
        assert!(smoothstep(0.1) < 0.1);
        assert!(smoothstep(0.9) > 0.9);
    }

    #[test]
    fn rotation_eases_the_short_way() {
        let from = CameraPose {
            position: DVec2::ZERO,
            rotation: 170.0,
            zoom: 1.0,
        };
        let to = CameraPose {
            rotation: -170.0,
            ..from
        };
        let halfway = from.ease_towards(&to, 0.5);
        assert!((halfway.rotation - 180.0).abs() < 1e-9);
    }
}
