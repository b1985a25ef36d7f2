use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 12345;
pub const DEFAULT_SENSITIVITY: f32 = 2.0;
pub const DEFAULT_WORKERS: usize = 2;
pub const DEFAULT_QUEUE_CAPACITY: usize = 32;
pub const DEFAULT_BAUD: u32 = 9600;

/// Controller configuration loaded from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config{
    /// Robot UDP port, used when the endpoint text carries none.
    pub port: u16,
    /// Sensitivity a fresh session starts with.
    pub sensitivity: f32,
    /// Transmission worker threads.
    pub workers: usize,
    /// Commands that may wait for a worker before new ones are dropped.
    pub queue_capacity: usize,
    /// UART device delivering IMU frames, if any.
    pub serial_port: Option<String>,
    pub baud_rate: u32,
}

impl Default for Config{
    fn default() -> Self{
        Config{
            port: DEFAULT_PORT,
            sensitivity: DEFAULT_SENSITIVITY,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            serial_port: None,
            baud_rate: DEFAULT_BAUD,
        }
    }
}

impl Config{
    /// Loads configuration from environment variables, reading `.env` first.
    ///
    /// Optional environment variables:
    /// - `TILTDRIVE_PORT`: robot UDP port (default: 12345)
    /// - `TILTDRIVE_SENSITIVITY`: initial sensitivity (default: 2.0)
    /// - `TILTDRIVE_WORKERS`: transmission threads (default: 2)
    /// - `TILTDRIVE_QUEUE`: pending command bound (default: 32)
    /// - `TILTDRIVE_SERIAL_PORT`: IMU serial device (default: none)
    /// - `TILTDRIVE_BAUD`: IMU serial baud rate (default: 9600)
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError>{
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let sensitivity = parse_var(&lookup, "TILTDRIVE_SENSITIVITY", defaults.sensitivity)?;
        if !sensitivity.is_finite() || sensitivity < 0.0{
            return Err(ConfigError::InvalidValue{
                var: "TILTDRIVE_SENSITIVITY",
                value: sensitivity.to_string(),
            });
        }

        Ok(Config{
            port: parse_var(&lookup, "TILTDRIVE_PORT", defaults.port)?,
            sensitivity,
            workers: parse_var(&lookup, "TILTDRIVE_WORKERS", defaults.workers)?.max(1),
            queue_capacity: parse_var(&lookup, "TILTDRIVE_QUEUE", defaults.queue_capacity)?.max(1),
            serial_port: lookup("TILTDRIVE_SERIAL_PORT").filter(|p| !p.trim().is_empty()),
            baud_rate: parse_var(&lookup, "TILTDRIVE_BAUD", defaults.baud_rate)?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var){
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue{ var, value: raw }),
    }
}
