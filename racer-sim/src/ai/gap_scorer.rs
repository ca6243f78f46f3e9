use racer_core::settings::AiSettings;

use super::sensors::{SensorReading, CENTER_SENSOR, SENSOR_OFFSETS_DEGREES};

// openness assigned to a ray about to run into something
const IMMINENT_SPACE: f64 = -10.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GapChoice {
    pub best_index: usize,
    pub scores: [f64; 5],
    pub steer: f64,
    pub throttle: f64,
    pub brake: f64,
}

/// Openness plus (for passable rays) alignment with the goal. `goal_bearing`
/// is in degrees relative to the car's heading.
pub fn score_ray(reading: &SensorReading, goal_bearing: f64, settings: &AiSettings) -> f64 {
    let space = if reading.distance < settings.imminent_collision_distance {
        IMMINENT_SPACE
    } else {
        reading.distance / settings.max_view_distance
    };
    let mut score = space * settings.openness_weight;

    if reading.distance > settings.passable_distance {
        let misalignment = (goal_bearing - reading.offset_degrees).abs();
        score += (180.0 - misalignment) / 180.0 * settings.alignment_weight;
    }
    score
}

// ties go to the lowest index
pub fn select_best(
    readings: &[SensorReading; 5],
    goal_bearing: f64,
    settings: &AiSettings,
) -> (usize, [f64; 5]) {
    let scores = readings.map(|reading| score_ray(&reading, goal_bearing, settings));
    let mut best_index = CENTER_SENSOR;
    let mut best_score = f64::NEG_INFINITY;
    for (index, score) in scores.iter().enumerate() {
        if *score > best_score {
            best_score = *score;
            best_index = index;
        }
    }
    (best_index, scores)
}

/// Outer rays map to full lock, the center ray to a small nudge towards the
/// goal once it drifts out of the dead-band.
pub fn steer_for(best_index: usize, goal_bearing: f64, settings: &AiSettings) -> f64 {
    if best_index != CENTER_SENSOR {
        return (best_index as f64 - CENTER_SENSOR as f64) / CENTER_SENSOR as f64;
    }
    if goal_bearing.abs() <= settings.center_deadband_degrees {
        return 0.0;
    }
    let widest = SENSOR_OFFSETS_DEGREES[SENSOR_OFFSETS_DEGREES.len() - 1];
    (goal_bearing / widest).clamp(-settings.center_correction, settings.center_correction)
}

/// `(throttle, brake)` from the forward clearance, current speed and steering.
pub fn throttle_for(
    center_distance: f64,
    speed: f64,
    steer: f64,
    settings: &AiSettings,
) -> (f64, f64) {
    if center_distance < settings.cornering_distance {
        let brake = if speed > settings.brake_speed {
            settings.brake_strength
        } else {
            0.0
        };
        (settings.cornering_throttle, brake)
    } else if steer.abs() > settings.sharp_steer {
        (settings.sharp_steer_throttle, 0.0)
    } else {
        (1.0, 0.0)
    }
}

pub fn choose(
    readings: &[SensorReading; 5],
    goal_bearing: f64,
    speed: f64,
    settings: &AiSettings,
) -> GapChoice {
    let (best_index, scores) = select_best(readings, goal_bearing, settings);
    let steer = steer_for(best_index, goal_bearing, settings);
    let (throttle, brake) = throttle_for(readings[CENTER_SENSOR].distance, speed, steer, settings);
    GapChoice {
        best_index,
        scores,
        steer,
        throttle,
        brake,
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use racer_core::GLOBAL_CONFIG;

    use super::*;

    fn readings(distances: [f64; 5]) -> [SensorReading; 5] {
        let mut index = 0;
        SENSOR_OFFSETS_DEGREES.map(|offset_degrees| {
            let distance = distances[index];
            index += 1;
            SensorReading {
                offset_degrees,
                distance,
                hit: distance < GLOBAL_CONFIG.ai.max_view_distance,
                end_point: DVec2::ZERO,
            }
        })
    }

    #[test]
    fn open_road_goes_straight_at_full_throttle() {
        let ai = &GLOBAL_CONFIG.ai;
        let choice = choose(&readings([450.0; 5]), 0.0, 300.0, ai);
        assert_eq!(choice.best_index, CENTER_SENSOR);
        assert_eq!(choice.steer, 0.0);
        assert_eq!((choice.throttle, choice.brake), (1.0, 0.0));
    }

    #[test]
    fn wall_dead_ahead_picks_a_side() {
        let ai = &GLOBAL_CONFIG.ai;
        let choice = choose(&readings([450.0, 450.0, 40.0, 450.0, 450.0]), 0.0, 200.0, ai);
        assert_ne!(choice.best_index, CENTER_SENSOR);
        // both inner rays tie; the left one comes first
        assert_eq!(choice.best_index, 1);
        assert_eq!(choice.steer, -0.5);
        assert_eq!(choice.throttle, ai.cornering_throttle);
        assert_eq!(choice.brake, 0.0);
    }

    #[test]
    fn fast_approach_to_a_wall_brakes() {
        let ai = &GLOBAL_CONFIG.ai;
        let choice = choose(&readings([450.0, 450.0, 100.0, 450.0, 450.0]), 0.0, 600.0, ai);
        assert_eq!(choice.brake, ai.brake_strength);
    }

    #[test]
    fn goal_bearing_pulls_towards_its_side() {
        let ai = &GLOBAL_CONFIG.ai;
        let choice = choose(&readings([450.0; 5]), 60.0, 100.0, ai);
        assert_eq!(choice.best_index, 4);
        assert_eq!(choice.steer, 1.0);
        assert_eq!(choice.throttle, ai.sharp_steer_throttle);
    }

    #[test]
    fn imminent_rays_are_never_chosen_over_clear_ones() {
        let ai = &GLOBAL_CONFIG.ai;
        let scores = readings([10.0, 450.0, 450.0, 450.0, 20.0])
            .map(|reading| score_ray(&reading, -60.0, ai));
        assert!(scores[0] < scores[2]);
        assert_eq!(scores[0], IMMINENT_SPACE * ai.openness_weight);
    }

    #[test]
    fn center_correction_is_small_and_has_a_dead_band() {
        let ai = &GLOBAL_CONFIG.ai;
        assert_eq!(steer_for(CENTER_SENSOR, 3.0, ai), 0.0);
        assert_eq!(steer_for(CENTER_SENSOR, -4.9, ai), 0.0);
        let nudge = steer_for(CENTER_SENSOR, 6.0, ai);
        assert!(nudge > 0.0 && nudge <= ai.center_correction);
        assert_eq!(steer_for(CENTER_SENSOR, -50.0, ai), -ai.center_correction);
    }

    #[test]
    fn scoring_is_deterministic() {
        let ai = &GLOBAL_CONFIG.ai;
        let input = readings([120.0, 300.0, 80.0, 260.0, 450.0]);
        let first = choose(&input, 17.0, 350.0, ai);
        for _ in 0..10 {
            assert_eq!(choose(&input, 17.0, 350.0, ai), first);
        }
    }
}
