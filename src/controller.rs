/**
 * Tilt Controller
 *
 * Runs one pipeline tick per sensor update:
 * 1. Snapshot the session (mode, sensitivity, endpoint)
 * 2. Estimate orientation from the latest gravity/magnetic vectors
 * 3. Map pitch/roll to coefficients and mix into a motor pair
 * 4. Hand the command to the transmit pool without waiting on it
 */

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{debug, trace};

use crate::config::Config;
use crate::drive::{Coefficients, DifferentialMixer, MotorCommand};
use crate::error::SessionError;
use crate::orientation::{self, OrientationEstimate, Vector3};
use crate::sensor::{SensorHub, SensorKind, SensorProvider};
use crate::session::{Mode, SessionController};
use crate::status::{activity_intensity, StatusSignal};
use crate::transport::{DatagramSink, DispatchStats, Dispatcher, Endpoint, UdpSink};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome{
    /// Session is Idle, sample ignored
    Idle,
    /// Gravity or magnetic field not observed yet
    AwaitingSamples,
    /// Degenerate vectors, tick skipped
    Undefined,
    Dispatched{
        estimate: OrientationEstimate,
        coefficients: Coefficients,
        command: MotorCommand,
        /// false if the transmit queue was full and the command was dropped
        queued: bool,
    },
}

pub struct TiltController<P: SensorProvider>{
    session: Arc<SessionController>,
    sensors: P,
    mixer: DifferentialMixer,
    dispatcher: Dispatcher,
    /// Intensity of the last dispatched tick, mode always comes from the session
    intensity: AtomicU8,
}

impl<P: SensorProvider> TiltController<P>{
    /// Controller sending real UDP datagrams.
    pub fn new(sensors: P, config: &Config) -> io::Result<Self>{
        Self::with_sink(sensors, Arc::new(UdpSink::new()), config)
    }

    pub fn with_sink(sensors: P, sink: Arc<dyn DatagramSink>, config: &Config) -> io::Result<Self>{
        let session = SessionController::with_defaults(config.port, config.sensitivity);
        Ok(TiltController{
            session: Arc::new(session),
            sensors,
            mixer: DifferentialMixer::default(),
            dispatcher: Dispatcher::new(sink, config.workers, config.queue_capacity)?,
            intensity: AtomicU8::new(0),
        })
    }

    pub fn session(&self) -> &Arc<SessionController>{
        &self.session
    }

    pub fn sensors(&self) -> &P{
        &self.sensors
    }

    pub fn start(&self, endpoint_text: &str) -> Result<Endpoint, SessionError>{
        let endpoint = self.session.start(endpoint_text)?;
        self.intensity.store(0, Ordering::Release);
        Ok(endpoint)
    }

    pub fn stop(&self){
        self.session.stop();
        self.intensity.store(0, Ordering::Release);
    }

    pub fn set_sensitivity(&self, value: f32) -> Result<(), SessionError>{
        self.session.set_sensitivity(value)
    }

    /// Run the pipeline once against the latest known vectors.
    pub fn tick(&self) -> TickOutcome{
        let state = self.session.snapshot();
        let Some(endpoint) = state.active_endpoint() else{
            return TickOutcome::Idle;
        };

        let Some(sample) = self.sensors.sample() else{
            return TickOutcome::AwaitingSamples;
        };

        let estimate = match orientation::estimate(&sample){
            Ok(estimate) => estimate,
            Err(e) =>{
                debug!(?sample, "{}", e);
                return TickOutcome::Undefined;
            }
        };

        let coefficients = Coefficients::from_orientation(&estimate, state.sensitivity);
        let command = self.mixer.mix(&coefficients);
        trace!(pitch = estimate.pitch, roll = estimate.roll, a = coefficients.a, b = coefficients.b,
            motor_a = command.motor_a, motor_b = command.motor_b, "tick");

        let queued = self.dispatcher.dispatch(endpoint.clone(), command);
        self.intensity.store(activity_intensity(&coefficients), Ordering::Release);

        TickOutcome::Dispatched{ estimate, coefficients, command, queued }
    }

    /// Display signal for the current session mode. A tick that finishes
    /// after `stop()` can update the intensity but never the mode.
    pub fn status(&self) -> StatusSignal{
        match self.session.mode(){
            Mode::Idle => StatusSignal::idle(),
            Mode::Active => StatusSignal{ mode: Mode::Active, intensity: self.intensity.load(Ordering::Acquire) },
        }
    }

    pub fn dispatch_stats(&self) -> DispatchStats{
        self.dispatcher.stats()
    }

    /// Return the session to Idle and wait for queued sends to finish.
    pub fn shutdown(self) -> DispatchStats{
        let TiltController{ session, dispatcher, .. } = self;
        session.reset();
        dispatcher.shutdown()
    }
}

impl TiltController<Arc<SensorHub>>{
    /// Controller fed by its own sensor hub.
    pub fn with_hub(config: &Config) -> io::Result<Self>{
        Self::new(Arc::new(SensorHub::new()), config)
    }

    /// One sensor callback: store the reading, then tick.
    pub fn on_sample(&self, kind: SensorKind, value: Vector3) -> TickOutcome{
        self.sensors.publish(kind, value);
        self.tick()
    }

    /// Back to a fresh session: Idle, default sensitivity, no endpoint and
    /// no remembered sensor readings.
    pub fn reset(&self){
        self.session.reset();
        self.sensors.clear();
        self.intensity.store(0, Ordering::Release);
    }
}
