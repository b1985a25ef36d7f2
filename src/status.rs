use crate::drive::Coefficients;
use crate::session::Mode;

/// Light red shown while Idle.
pub const IDLE_COLOR: Rgb = Rgb{ r: 255, g: 200, b: 200 };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb{
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// What the display collaborator renders: session mode plus how hard the
/// device is tilted, 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSignal{
    pub mode: Mode,
    pub intensity: u8,
}

impl StatusSignal{
    pub fn new(mode: Mode, coefficients: &Coefficients) -> Self{
        StatusSignal{ mode, intensity: activity_intensity(coefficients) }
    }

    pub fn idle() -> Self{
        StatusSignal{ mode: Mode::Idle, intensity: 0 }
    }

    /// Idle: light red. Active: white fading to green with intensity.
    pub fn indicator_color(&self) -> Rgb{
        match self.mode{
            Mode::Idle => IDLE_COLOR,
            Mode::Active =>{
                let green = ((255.0 * (self.intensity as f64 / 100.0)) as i32).min(255) as u8;
                Rgb{ r: 255 - green, g: 255, b: 255 - green }
            }
        }
    }
}

/// `max(|a|, |b|)`, clamped to 0..=100.
pub fn activity_intensity(coefficients: &Coefficients) -> u8{
    coefficients.max_abs().clamp(0, 100) as u8
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_intensity(){
        assert_eq!(activity_intensity(&Coefficients{ a: -70, b: 20 }), 70);
        assert_eq!(activity_intensity(&Coefficients{ a: 0, b: 0 }), 0);
        assert_eq!(activity_intensity(&Coefficients{ a: 100, b: -100 }), 100);
    }

    #[test]
    fn test_idle_is_light_red(){
        let signal = StatusSignal::new(Mode::Idle, &Coefficients{ a: 90, b: 0 });
        assert_eq!(signal.indicator_color(), Rgb{ r: 255, g: 200, b: 200 });
    }

    #[test]
    fn test_active_gradient(){
        let still = StatusSignal::new(Mode::Active, &Coefficients::default());
        assert_eq!(still.indicator_color(), Rgb{ r: 255, g: 255, b: 255 });

        let half = StatusSignal::new(Mode::Active, &Coefficients{ a: 50, b: 10 });
        assert_eq!(half.indicator_color(), Rgb{ r: 128, g: 255, b: 128 });

        let full = StatusSignal::new(Mode::Active, &Coefficients{ a: 0, b: -100 });
        assert_eq!(full.indicator_color(), Rgb{ r: 0, g: 255, b: 0 });
    }
}
