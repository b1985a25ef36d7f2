/**
 * Coefficient Mapper
 *
 * Linear, saturating map from an angle in degrees to an integer coefficient.
 * +-90 degrees at sensitivity 1.0 covers the full +-100 range.
 */

use super::MAX_POWER;
use crate::orientation::OrientationEstimate;

pub const FULL_SCALE_DEGREES: f32 = 90.0;
pub const MAX_SENSITIVITY: f32 = 4.0;
//slider ticks per 1.0 of sensitivity
const SLIDER_STEPS_PER_UNIT: f32 = 100.0;

/// Steering (a, from pitch) and throttle (b, from roll), each in [-100, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coefficients{
    pub a: i32,
    pub b: i32,
}

impl Coefficients{
    pub fn from_orientation(estimate: &OrientationEstimate, sensitivity: f32) -> Self{
        Coefficients{
            a: coefficient(estimate.pitch, sensitivity),
            b: coefficient(estimate.roll, sensitivity),
        }
    }

    /// Largest magnitude of the pair, 0..=100.
    pub fn max_abs(&self) -> i32{
        self.a.abs().max(self.b.abs())
    }
}

/// `clamp(trunc(angle / 90 * 100 * sensitivity), -100, 100)`.
///
/// The float to int cast truncates toward zero and saturates, NaN becomes 0.
pub fn coefficient(angle_deg: f32, sensitivity: f32) -> i32{
    let raw = (angle_deg / FULL_SCALE_DEGREES * MAX_POWER as f32 * sensitivity) as i32;
    raw.clamp(-MAX_POWER, MAX_POWER)
}

/// Slider position 0..=400 to sensitivity 0.0..=4.0.
pub fn sensitivity_from_slider(progress: u16) -> f32{
    let max_progress = (MAX_SENSITIVITY * SLIDER_STEPS_PER_UNIT) as u16;
    progress.min(max_progress) as f32 / SLIDER_STEPS_PER_UNIT
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_full_scale_at_unit_sensitivity(){
        assert_eq!(coefficient(90.0, 1.0), 100);
        assert_eq!(coefficient(-90.0, 1.0), -100);
        assert_eq!(coefficient(0.0, 1.0), 0);
    }

    #[test]
    fn test_sensitivity_compresses_range(){
        assert_eq!(coefficient(45.0, 2.0), 100);
        assert_eq!(coefficient(9.0, 2.0), 20);
        assert_eq!(coefficient(45.0, 0.0), 0);
    }

    #[test]
    fn test_truncates_toward_zero(){
        //10/90*100 = 11.11
        assert_eq!(coefficient(10.0, 1.0), 11);
        assert_eq!(coefficient(-10.0, 1.0), -11);
        //0.5/90*100 = 0.55
        assert_eq!(coefficient(-0.5, 1.0), 0);
    }

    #[test]
    fn test_saturates_out_of_range_angles(){
        assert_eq!(coefficient(180.0, 2.0), 100);
        assert_eq!(coefficient(-180.0, 2.0), -100);
        assert_eq!(coefficient(f32::INFINITY, 1.0), 100);
        assert_eq!(coefficient(f32::NAN, 1.0), 0);
    }

    #[test]
    fn test_bounded_and_monotonic(){
        for &sensitivity in &[0.0f32, 0.5, 1.0, 2.0, 4.0, 10.0]{
            let mut prev = i32::MIN;
            let mut angle = -200.0f32;
            while angle <= 200.0{
                let c = coefficient(angle, sensitivity);
                assert!((-100..=100).contains(&c));
                assert!(c >= prev, "not monotonic at {} (s={})", angle, sensitivity);
                prev = c;
                angle += 0.25;
            }
        }
    }

    #[test]
    fn test_from_orientation(){
        let est = OrientationEstimate{ azimuth: 12.0, pitch: 0.0, roll: 90.0 };
        let c = Coefficients::from_orientation(&est, 1.0);
        assert_eq!(c, Coefficients{ a: 0, b: 100 });
        assert_eq!(c.max_abs(), 100);
    }

    #[test]
    fn test_slider_mapping(){
        assert_eq!(sensitivity_from_slider(0), 0.0);
        assert_eq!(sensitivity_from_slider(200), 2.0);
        assert_eq!(sensitivity_from_slider(400), 4.0);
        assert_eq!(sensitivity_from_slider(1000), 4.0);
    }
}
