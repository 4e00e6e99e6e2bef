use glam::{Mat4, Vec3};

/// Bank (euler Z) limits reached while strafing in ride mode.
pub const BANK_MIN: f32 = -44.0;
pub const BANK_MAX: f32 = 45.0;
pub const BANK_STEP: f32 = 2.0;
/// Pitch and yaw change per tick while the ride keys are held.
pub const TURN_STEP: f32 = 0.5;

/// Placement of the animated model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipTransform {
    pub position: Vec3,
    /// Euler angles in degrees, applied X then Y then Z in model space.
    pub euler_deg: Vec3,
    pub scale: f32,
}

impl Default for ShipTransform {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.0, 0.0),
            euler_deg: Vec3::ZERO,
            scale: 0.01,
        }
    }
}

impl ShipTransform {
    /// `T(position + lift) * S(scale) * Rx * Ry * Rz`.
    pub fn model_matrix(&self, lift: f32) -> Mat4 {
        let radians = Vec3::new(
            self.euler_deg.x.to_radians(),
            self.euler_deg.y.to_radians(),
            self.euler_deg.z.to_radians(),
        );
        Mat4::from_translation(self.position + Vec3::Y * lift)
            * Mat4::from_scale(Vec3::splat(self.scale))
            * Mat4::from_rotation_x(radians.x)
            * Mat4::from_rotation_y(radians.y)
            * Mat4::from_rotation_z(radians.z)
    }

    pub fn bank_left(&mut self) {
        self.euler_deg.z = (self.euler_deg.z - BANK_STEP).max(BANK_MIN);
    }

    pub fn bank_right(&mut self) {
        self.euler_deg.z = (self.euler_deg.z + BANK_STEP).min(BANK_MAX);
    }

    /// Moves a left bank one step back towards level. No-op when level or
    /// banked right.
    pub fn recover_left_bank(&mut self) {
        if self.euler_deg.z < 0.0 {
            self.euler_deg.z = (self.euler_deg.z + BANK_STEP).min(0.0);
        }
    }

    pub fn recover_right_bank(&mut self) {
        if self.euler_deg.z > 0.0 {
            self.euler_deg.z = (self.euler_deg.z - BANK_STEP).max(0.0);
        }
    }
}

/// Automatic vertical oscillation of the ship, reflecting at `[0, MAX]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levitation {
    step: u32,
    rising: bool,
}

impl Default for Levitation {
    fn default() -> Self {
        Self {
            step: 0,
            rising: true,
        }
    }
}

impl Levitation {
    pub const STEP: f32 = 0.001;
    pub const MAX: f32 = 0.1;
    const STEPS: u32 = 100;

    /// Current lift above the ship's resting height.
    pub fn offset(&self) -> f32 {
        self.step as f32 * Self::STEP
    }

    pub fn rising(&self) -> bool {
        self.rising
    }

    /// Advances one tick. The direction flips on the tick that reaches a bound.
    pub fn advance(&mut self) {
        if self.rising {
            self.step += 1;
            if self.step == Self::STEPS {
                self.rising = false;
            }
        } else {
            self.step -= 1;
            if self.step == 0 {
                self.rising = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn levitation_stays_within_bounds_and_flips_at_edges() {
        let mut levitation = Levitation::default();
        let mut previous = levitation.offset();
        for _ in 0..2_000 {
            let was_rising = levitation.rising();
            levitation.advance();
            let offset = levitation.offset();
            assert!((0.0..=Levitation::MAX + EPS).contains(&offset));
            if levitation.rising() != was_rising {
                let at_bound = offset.abs() < EPS || (offset - Levitation::MAX).abs() < EPS;
                assert!(at_bound, "flipped away from a bound at {offset}");
            } else if was_rising {
                assert!(offset > previous);
            } else {
                assert!(offset < previous);
            }
            previous = offset;
        }
    }

    #[test]
    fn levitation_reaches_peak_after_hundred_ticks() {
        let mut levitation = Levitation::default();
        for _ in 0..100 {
            levitation.advance();
        }
        assert!((levitation.offset() - 0.1).abs() < EPS);
        assert!(!levitation.rising());
        for _ in 0..100 {
            levitation.advance();
        }
        assert_eq!(levitation.offset(), 0.0);
        assert!(levitation.rising());
    }

    #[test]
    fn bank_is_clamped_both_ways() {
        let mut ship = ShipTransform::default();
        for _ in 0..100 {
            ship.bank_left();
            assert!(ship.euler_deg.z >= BANK_MIN);
        }
        assert_eq!(ship.euler_deg.z, BANK_MIN);
        for _ in 0..100 {
            ship.bank_right();
            assert!(ship.euler_deg.z <= BANK_MAX);
        }
        assert_eq!(ship.euler_deg.z, BANK_MAX);
    }

    #[test]
    fn bank_recovers_towards_level() {
        let mut ship = ShipTransform::default();
        for _ in 0..5 {
            ship.bank_left();
        }
        assert_eq!(ship.euler_deg.z, -10.0);
        ship.recover_right_bank();
        assert_eq!(ship.euler_deg.z, -10.0);
        for _ in 0..5 {
            ship.recover_left_bank();
        }
        assert_eq!(ship.euler_deg.z, 0.0);
        ship.recover_left_bank();
        assert_eq!(ship.euler_deg.z, 0.0);
    }

    #[test]
    fn model_matrix_orders_translate_scale_rotate() {
        let ship = ShipTransform {
            position: Vec3::new(1.0, 2.0, 3.0),
            euler_deg: Vec3::new(0.0, 90.0, 0.0),
            scale: 2.0,
        };
        let model = ship.model_matrix(0.05);
        let moved = model.transform_point3(Vec3::X);
        // +X rotated about Y lands on -Z, then scaled and translated
        assert!(moved.abs_diff_eq(Vec3::new(1.0, 2.05, 1.0), EPS));
    }
}
