pub mod config;
pub mod controller;
pub mod drive;
pub mod error;
pub mod ffi;
pub mod orientation;
pub mod sensor;
pub mod session;
pub mod status;
pub mod transport;

#[cfg(feature = "python")]
pub mod python;

pub use config::Config;
pub use controller::{TickOutcome, TiltController};
pub use drive::{Coefficients, DifferentialMixer, MotorCommand};
pub use error::{ConfigError, DecodeError, OrientationError, SessionError, TransmitError};
pub use orientation::{estimate, OrientationEstimate, SensorSample, Vector3};
pub use sensor::{SensorHub, SensorKind, SensorProvider};
pub use session::{Mode, SessionController, SessionState};
pub use status::{activity_intensity, Rgb, StatusSignal};
pub use transport::{DatagramSink, Dispatcher, Endpoint, UdpSink};
