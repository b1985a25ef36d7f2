/**
 * Drive Module
 *
 * Angle -> coefficient mapping and the differential-drive mix that turns
 * steering/throttle coefficients into a left/right motor pair.
 */

pub mod coefficients;
pub mod mixer;

pub use coefficients::{Coefficients, coefficient, sensitivity_from_slider};
pub use mixer::{DifferentialMixer, MotorCommand};

/// Motor and coefficient values live in [-MAX_POWER, MAX_POWER].
pub const MAX_POWER: i32 = 100;
