/**
 * Session Controller
 *
 * Idle/Active state machine gating the pipeline. Control actions are the
 * only writers; the pipeline reads one consistent snapshot per tick.
 */

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::config::{DEFAULT_PORT, DEFAULT_SENSITIVITY};
use crate::drive::coefficients::MAX_SENSITIVITY;
use crate::error::SessionError;
use crate::transport::Endpoint;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode{
    #[default]
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState{
    pub mode: Mode,
    pub sensitivity: f32,
    /// Set by `start`, kept across `stop` so the last target stays visible.
    pub endpoint: Option<Endpoint>,
}

impl SessionState{
    fn idle(sensitivity: f32) -> Self{
        SessionState{ mode: Mode::Idle, sensitivity, endpoint: None }
    }

    pub fn is_active(&self) -> bool{
        self.mode == Mode::Active
    }

    /// Target for this tick, only while Active.
    pub fn active_endpoint(&self) -> Option<&Endpoint>{
        match self.mode{
            Mode::Active => self.endpoint.as_ref(),
            Mode::Idle => None,
        }
    }
}

impl Default for SessionState{
    fn default() -> Self{
        SessionState::idle(DEFAULT_SENSITIVITY)
    }
}

pub struct SessionController{
    state: RwLock<SessionState>,
    default_port: u16,
    default_sensitivity: f32,
}

impl SessionController{
    pub fn new() -> Self{
        Self::with_defaults(DEFAULT_PORT, DEFAULT_SENSITIVITY)
    }

    pub fn with_defaults(default_port: u16, default_sensitivity: f32) -> Self{
        SessionController{
            state: RwLock::new(SessionState::idle(default_sensitivity)),
            default_port,
            default_sensitivity,
        }
    }

    /// Idle -> Active towards `endpoint_text`. While Active this re-targets.
    pub fn start(&self, endpoint_text: &str) -> Result<Endpoint, SessionError>{
        let endpoint = Endpoint::parse(endpoint_text, self.default_port)?;

        let mut state = self.write();
        let previous = state.mode;
        state.endpoint = Some(endpoint.clone());
        state.mode = Mode::Active;
        drop(state);

        match previous{
            Mode::Idle => info!(%endpoint, "session started"),
            Mode::Active => info!(%endpoint, "session re-targeted"),
        }
        Ok(endpoint)
    }

    /// -> Idle. Sends already dispatched are left to finish.
    pub fn stop(&self){
        let mut state = self.write();
        if state.mode == Mode::Active{
            state.mode = Mode::Idle;
            drop(state);
            info!("session stopped");
        }
    }

    pub fn set_sensitivity(&self, value: f32) -> Result<(), SessionError>{
        if !value.is_finite() || value < 0.0{
            return Err(SessionError::InvalidSensitivity(value));
        }
        if value > MAX_SENSITIVITY{
            debug!(value, "sensitivity above nominal range");
        }
        self.write().sensitivity = value;
        Ok(())
    }

    pub fn snapshot(&self) -> SessionState{
        self.read().clone()
    }

    pub fn mode(&self) -> Mode{
        self.read().mode
    }

    /// Back to Idle with default sensitivity and no endpoint.
    pub fn reset(&self){
        *self.write() = SessionState::idle(self.default_sensitivity);
    }

    //a panicking writer cannot leave the state half-updated, so poison is ignored
    fn read(&self) -> RwLockReadGuard<'_, SessionState>{
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState>{
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SessionController{
    fn default() -> Self{
        Self::new()
    }
}
