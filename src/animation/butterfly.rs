use cgmath::Vector3;

/// Distance from the path centre at which the butterfly turns around
pub const TURN_POINT: f32 = 20.0;

/// Path units per second
pub const DEFAULT_SPEED: f32 = 60.0;

/// Which wing frame the sprite shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pose {
    Front,
    Back,
}

/// Position of the butterfly along its back-and-forth path
///
/// The state is just a position and a direction, so any stored pair can be
/// resumed exactly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButterflyState {
    pub position: f32,
    /// `1.0` or `-1.0`
    pub direction: f32,
    pub pose: Pose,
}

impl Default for ButterflyState {
    fn default() -> Self {
        Self {
            position: 0.0,
            direction: 1.0,
            pose: Pose::Front,
        }
    }
}

impl ButterflyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves along the path; returns true when the butterfly turned around
    pub fn advance(&mut self, delta_seconds: f32, speed: f32) -> bool {
        self.position += delta_seconds.max(0.0) * self.direction * speed;

        if self.direction > 0.0 && self.position >= TURN_POINT {
            self.direction = -1.0;
            self.pose = Pose::Back;
            true
        } else if self.direction < 0.0 && self.position <= -TURN_POINT {
            self.direction = 1.0;
            self.pose = Pose::Front;
            true
        } else {
            false
        }
    }

    /// World position of the sprite for the current state
    pub fn path_point(&self) -> Vector3<f32> {
        Vector3::new(
            self.direction * TURN_POINT * (self.position / TURN_POINT).cos(),
            50.0 + 0.7 * self.position.sin(),
            self.position,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_turns_at_positive_extreme() {
        let mut butterfly = ButterflyState::new();

        let mut flipped_at = None;
        for frame in 0..100 {
            // exactly one unit per frame
            if butterfly.advance(0.5, 2.0) {
                flipped_at = Some(frame);
                break;
            }
        }

        assert_eq!(flipped_at, Some(19));
        assert_eq!(butterfly.direction, -1.0);
        assert_eq!(butterfly.pose, Pose::Back);
    }

    #[test]
    fn test_full_cycle_returns_to_front_pose() {
        let mut butterfly = ButterflyState::new();
        let mut flips = Vec::new();
        for _ in 0..200 {
            if butterfly.advance(0.02, DEFAULT_SPEED) {
                flips.push(butterfly.pose);
            }
        }
        assert!(flips.len() >= 2);
        assert_eq!(flips[0], Pose::Back);
        assert_eq!(flips[1], Pose::Front);
    }

    #[test]
    fn test_overshoot_is_bounded_by_one_step() {
        let mut rng = rand::rng();
        let mut butterfly = ButterflyState::new();

        for _ in 0..5000 {
            let delta: f32 = rng.random_range(0.0..0.05);
            let before = butterfly.position;
            let flipped = butterfly.advance(delta, DEFAULT_SPEED);
            let increment = delta * DEFAULT_SPEED;

            assert!((butterfly.position - before).abs() <= increment + 1e-4);
            if flipped {
                assert!(butterfly.position.abs() - TURN_POINT <= increment + 1e-4);
            }
            assert!(butterfly.position.abs() <= TURN_POINT + 0.05 * DEFAULT_SPEED + 1e-4);
        }
    }

    #[test]
    fn test_zero_delta_keeps_state() {
        let mut butterfly = ButterflyState {
            position: 5.0,
            direction: -1.0,
            pose: Pose::Back,
        };
        let before = butterfly;
        assert!(!butterfly.advance(0.0, DEFAULT_SPEED));
        assert_eq!(butterfly, before);
    }

    #[test]
    fn test_path_point_formula() {
        let butterfly = ButterflyState {
            position: 10.0,
            direction: -1.0,
            pose: Pose::Back,
        };
        let p = butterfly.path_point();
        assert!((p.x - (-20.0 * 0.5f32.cos())).abs() < 1e-5);
        assert!((p.y - (50.0 + 0.7 * 10.0f32.sin())).abs() < 1e-5);
        assert_eq!(p.z, 10.0);

        let start = ButterflyState::new().path_point();
        assert!((start.x - 20.0).abs() < 1e-6);
        assert!((start.y - 50.0).abs() < 1e-6);
    }
}
