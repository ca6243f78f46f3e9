use glam::DVec2;
use serde::{Deserialize, Serialize};

// Where a vehicle is and which way it faces; heading is in radians, measured
// the same way as `f64::atan2` on map coordinates
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EntityLocation {
    pub position: DVec2,
    pub heading: f64,
}

impl EntityLocation {
    pub fn new(position: DVec2, heading: f64) -> Self {
        Self { position, heading }
    }

    pub fn unit_steer_direction(&self) -> DVec2 {
        DVec2::new(self.heading.cos(), self.heading.sin())
    }

    /// Signed angle in degrees from the current heading to `target`,
    /// normalized to `(-180, 180]`.
    pub fn bearing_to(&self, target: DVec2) -> f64 {
        let to_target = target - self.position;
        let absolute = to_target.y.atan2(to_target.x);
        normalize_degrees((absolute - self.heading).to_degrees())
    }
}

// NaN and infinities come back as NaN
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearing_is_relative_to_heading() {
        let location = EntityLocation::new(DVec2::ZERO, 0.0);
        assert!((location.bearing_to(DVec2::new(10.0, 0.0))).abs() < 1e-9);
        assert!((location.bearing_to(DVec2::new(0.0, 10.0)) - 90.0).abs() < 1e-9);

        let facing_down = EntityLocation::new(DVec2::ZERO, std::f64::consts::FRAC_PI_2);
        assert!((facing_down.bearing_to(DVec2::new(10.0, 0.0)) + 90.0).abs() < 1e-9);
    }

    #[test]
    fn wraps_angles_into_half_open_range() {
        assert_eq!(normalize_degrees(270.0), -90.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(540.0), 180.0);
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(-90.0), -90.0);
    }

    #[test]
    fn wraps_huge_and_non_finite_angles_without_looping() {
        let wrapped = normalize_degrees(1e18 + 45.0);
        assert!(wrapped > -180.0 && wrapped <= 180.0);
        assert_eq!(normalize_degrees(360.0 * 1_000_000.0 + 90.0), 90.0);
        assert_eq!(normalize_degrees(-360.0 * 1_000_000.0 - 90.0), -90.0);

        assert!(normalize_degrees(f64::INFINITY).is_nan());
        assert!(normalize_degrees(f64::NEG_INFINITY).is_nan());
        assert!(normalize_degrees(f64::NAN).is_nan());
    }

    #[test]
    fn steer_direction_follows_heading() {
        let east = EntityLocation::new(DVec2::new(5.0, 5.0), 0.0);
        assert!(east.unit_steer_direction().abs_diff_eq(DVec2::X, 1e-12));

        let south = EntityLocation::new(DVec2::ZERO, std::f64::consts::FRAC_PI_2);
        assert!(south.unit_steer_direction().abs_diff_eq(DVec2::Y, 1e-12));
    }
}
