pub mod channel;
pub mod serial;

pub use channel::SensorChannel;
pub use serial::{ImuFrame, SerialImuSource};

use std::sync::Arc;

use crate::orientation::{SensorSample, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind{
    Gravity,
    Magnetic,
}

/// Source of the most recent vector per sensor kind. The pipeline pulls
/// from this instead of registering itself as a listener.
pub trait SensorProvider: Send + Sync{
    fn latest(&self, kind: SensorKind) -> Option<Vector3>;

    /// Both vectors, once each kind has been observed at least once.
    fn sample(&self) -> Option<SensorSample>{
        Some(SensorSample{
            gravity: self.latest(SensorKind::Gravity)?,
            magnetic: self.latest(SensorKind::Magnetic)?,
        })
    }
}

impl<T: SensorProvider + ?Sized> SensorProvider for Arc<T>{
    fn latest(&self, kind: SensorKind) -> Option<Vector3>{
        (**self).latest(kind)
    }
}

/// One latest-value channel per sensor kind.
pub struct SensorHub{
    gravity: SensorChannel,
    magnetic: SensorChannel,
}

impl SensorHub{
    pub fn new() -> Self{
        SensorHub{
            gravity: SensorChannel::new(),
            magnetic: SensorChannel::new(),
        }
    }

    pub fn channel(&self, kind: SensorKind) -> &SensorChannel{
        match kind{
            SensorKind::Gravity => &self.gravity,
            SensorKind::Magnetic => &self.magnetic,
        }
    }

    pub fn publish(&self, kind: SensorKind, value: Vector3) -> u64{
        self.channel(kind).publish(value)
    }

    /// Forget both readings, `sample()` is None until each kind is published again.
    pub fn clear(&self){
        self.gravity.clear();
        self.magnetic.clear();
    }
}

impl Default for SensorHub{
    fn default() -> Self{
        Self::new()
    }
}

impl SensorProvider for SensorHub{
    fn latest(&self, kind: SensorKind) -> Option<Vector3>{
        self.channel(kind).latest()
    }
}
