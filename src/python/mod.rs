use pyo3::prelude::*;
use pyo3::exceptions::{PyOSError, PyValueError};
use std::sync::Arc;

use crate::config::Config;
use crate::controller::{TickOutcome, TiltController};
use crate::orientation::Vector3;
use crate::sensor::{SensorHub, SensorKind};
use crate::session::Mode;

#[pyclass]
pub struct PyTiltController{
    inner: Arc<TiltController<Arc<SensorHub>>>,
}

#[pymethods]
impl PyTiltController{
    #[new]
    #[pyo3(signature = (port=None, sensitivity=None))]
    fn new(port: Option<u16>, sensitivity: Option<f32>) -> PyResult<Self>{
        let mut config = Config::from_env().map_err(|e| PyValueError::new_err(e.to_string()))?;
        if let Some(port) = port{
            config.port = port;
        }
        if let Some(sensitivity) = sensitivity{
            config.sensitivity = sensitivity;
        }

        let controller = TiltController::<Arc<SensorHub>>::with_hub(&config)
            .map_err(|e| PyOSError::new_err(e.to_string()))?;
        controller.set_sensitivity(config.sensitivity)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        Ok(PyTiltController{ inner: Arc::new(controller) })
    }

    /// Returns the resolved "host:port" target.
    fn start(&self, endpoint: &str) -> PyResult<String>{
        self.inner.start(endpoint)
            .map(|ep| ep.to_string())
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn stop(&self){
        self.inner.stop();
    }

    fn set_sensitivity(&self, value: f32) -> PyResult<()>{
        self.inner.set_sensitivity(value).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn is_active(&self) -> bool{
        self.inner.session().mode() == Mode::Active
    }

    /// Motor pair if this reading produced a command.
    fn push_gravity(&self, x: f32, y: f32, z: f32) -> Option<(i32, i32)>{
        self.push(SensorKind::Gravity, x, y, z)
    }

    fn push_magnetic(&self, x: f32, y: f32, z: f32) -> Option<(i32, i32)>{
        self.push(SensorKind::Magnetic, x, y, z)
    }

    /// (active, intensity, (r, g, b))
    fn status(&self) -> (bool, u8, (u8, u8, u8)){
        let status = self.inner.status();
        let color = status.indicator_color();
        (status.mode == Mode::Active, status.intensity, (color.r, color.g, color.b))
    }

    /// (sent, failed, dropped)
    fn stats(&self) -> (u64, u64, u64){
        let stats = self.inner.dispatch_stats();
        (stats.sent, stats.failed, stats.dropped)
    }
}

impl PyTiltController{
    fn push(&self, kind: SensorKind, x: f32, y: f32, z: f32) -> Option<(i32, i32)>{
        match self.inner.on_sample(kind, Vector3::new(x, y, z)){
            TickOutcome::Dispatched{ command, .. } => Some((command.motor_a, command.motor_b)),
            _ => None,
        }
    }
}

#[pymodule]
fn tiltdrive(_py: Python, m: &PyModule) -> PyResult<()>{
    m.add_class::<PyTiltController>()?;
    Ok(())
}
