/**
 * Differential-Drive Mixer
 *
 * Combines steering/throttle coefficients into a left/right motor pair
 * for a skid-steer robot. B is a shared throttle applied to both motors,
 * A is a half-weighted differential term.
 */

use super::MAX_POWER;
use super::coefficients::Coefficients;

/// Actuator-ready motor pair, each in [-100, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotorCommand{
    pub motor_a: i32,
    pub motor_b: i32,
}

impl MotorCommand{
    pub const STOP: MotorCommand = MotorCommand{ motor_a: 0, motor_b: 0 };

    pub fn new(motor_a: i32, motor_b: i32) -> Self{
        MotorCommand{ motor_a, motor_b }
    }
}

#[derive(Debug, Clone)]
pub struct DifferentialMixer{
    /// Output bound per motor
    pub max_power: i32,
}

impl Default for DifferentialMixer{
    fn default() -> Self{
        Self{ max_power: MAX_POWER }
    }
}

impl DifferentialMixer{
    /// `motor_a = a/2 + b`, `motor_b = b - a/2`, truncating division, each clamped.
    ///
    /// Inputs are clamped first so an out-of-range coefficient mixes like its
    /// saturated value.
    pub fn mix(&self, coeffs: &Coefficients) -> MotorCommand{
        let a = coeffs.a.clamp(-self.max_power, self.max_power);
        let b = coeffs.b.clamp(-self.max_power, self.max_power);
        let half_a = a / 2;

        MotorCommand{
            motor_a: (half_a + b).clamp(-self.max_power, self.max_power),
            motor_b: (b - half_a).clamp(-self.max_power, self.max_power),
        }
    }
}
