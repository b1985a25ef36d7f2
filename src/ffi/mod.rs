use std::ffi::{c_char, CStr};
use std::sync::Arc;
use std::ptr;

use tracing::warn;

use crate::config::Config;
use crate::controller::{TickOutcome, TiltController};
use crate::orientation::Vector3;
use crate::sensor::{SensorHub, SensorKind};
use crate::session::Mode;

pub const TILTDRIVE_OK: i32 = 0;
pub const TILTDRIVE_ERR_NULL: i32 = -1;
pub const TILTDRIVE_ERR_INVALID_CONFIG: i32 = -2;
pub const TILTDRIVE_ERR_INVALID_SENSITIVITY: i32 = -3;
pub const TILTDRIVE_ERR_BAD_KIND: i32 = -4;

pub const TILTDRIVE_SENSOR_GRAVITY: u8 = 0;
pub const TILTDRIVE_SENSOR_MAGNETIC: u8 = 1;

pub const TILTDRIVE_TICK_IDLE: i32 = 0;
pub const TILTDRIVE_TICK_AWAITING: i32 = 1;
pub const TILTDRIVE_TICK_UNDEFINED: i32 = 2;
pub const TILTDRIVE_TICK_DISPATCHED: i32 = 3;

pub struct TiltdriveController{
    inner: TiltController<Arc<SensorHub>>,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct TiltdriveMotorCommand{
    pub motor_a: i32,
    pub motor_b: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
pub struct TiltdriveStatus{
    pub active: bool,
    pub intensity: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Create a controller configured from the environment. Null on failure.
#[no_mangle]
pub extern "C" fn tiltdrive_controller_new() -> *mut TiltdriveController{
    let config = Config::from_env().unwrap_or_else(|e|{
        warn!(error = %e, "bad environment configuration, using defaults");
        Config::default()
    });

    match TiltController::<Arc<SensorHub>>::with_hub(&config){
        Ok(inner) => Box::into_raw(Box::new(TiltdriveController{ inner })),
        Err(e) =>{
            warn!(error = %e, "failed to start transmit workers");
            ptr::null_mut()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn tiltdrive_controller_free(controller: *mut TiltdriveController){
    if !controller.is_null(){
        unsafe{
            let boxed = Box::from_raw(controller);
            boxed.inner.shutdown();
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn tiltdrive_start(controller: *mut TiltdriveController, endpoint: *const c_char) -> i32{
    if controller.is_null() || endpoint.is_null(){
        return TILTDRIVE_ERR_NULL;
    }

    unsafe{
        let c = &*controller;
        let text = match CStr::from_ptr(endpoint).to_str(){
            Ok(s) => s,
            Err(_) => return TILTDRIVE_ERR_INVALID_CONFIG,
        };

        match c.inner.start(text){
            Ok(_) => TILTDRIVE_OK,
            Err(_) => TILTDRIVE_ERR_INVALID_CONFIG,
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn tiltdrive_stop(controller: *mut TiltdriveController) -> i32{
    if controller.is_null(){
        return TILTDRIVE_ERR_NULL;
    }
    unsafe{
        (*controller).inner.stop();
    }
    TILTDRIVE_OK
}

#[no_mangle]
pub unsafe extern "C" fn tiltdrive_set_sensitivity(controller: *mut TiltdriveController, value: f32) -> i32{
    if controller.is_null(){
        return TILTDRIVE_ERR_NULL;
    }
    unsafe{
        match (*controller).inner.set_sensitivity(value){
            Ok(()) => TILTDRIVE_OK,
            Err(_) => TILTDRIVE_ERR_INVALID_SENSITIVITY,
        }
    }
}

/// Feed one sensor reading and run a tick. Returns a TILTDRIVE_TICK_* code,
/// `out_command` (nullable) receives the motor pair when one was dispatched.
#[no_mangle]
pub unsafe extern "C" fn tiltdrive_push_sample(
    controller: *mut TiltdriveController,
    kind: u8,
    x: f32,
    y: f32,
    z: f32,
    out_command: *mut TiltdriveMotorCommand,
) -> i32{
    if controller.is_null(){
        return TILTDRIVE_ERR_NULL;
    }
    let kind = match kind{
        TILTDRIVE_SENSOR_GRAVITY => SensorKind::Gravity,
        TILTDRIVE_SENSOR_MAGNETIC => SensorKind::Magnetic,
        _ => return TILTDRIVE_ERR_BAD_KIND,
    };

    unsafe{
        let c = &*controller;
        match c.inner.on_sample(kind, Vector3::new(x, y, z)){
            TickOutcome::Idle => TILTDRIVE_TICK_IDLE,
            TickOutcome::AwaitingSamples => TILTDRIVE_TICK_AWAITING,
            TickOutcome::Undefined => TILTDRIVE_TICK_UNDEFINED,
            TickOutcome::Dispatched{ command, .. } =>{
                if !out_command.is_null(){
                    *out_command = TiltdriveMotorCommand{
                        motor_a: command.motor_a,
                        motor_b: command.motor_b,
                    };
                }
                TILTDRIVE_TICK_DISPATCHED
            }
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn tiltdrive_status(controller: *mut TiltdriveController, out_status: *mut TiltdriveStatus) -> i32{
    if controller.is_null() || out_status.is_null(){
        return TILTDRIVE_ERR_NULL;
    }

    unsafe{
        let status = (*controller).inner.status();
        let color = status.indicator_color();
        *out_status = TiltdriveStatus{
            active: status.mode == Mode::Active,
            intensity: status.intensity,
            red: color.r,
            green: color.g,
            blue: color.b,
        };
    }
    TILTDRIVE_OK
}

#[cfg(test)]
mod tests{
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_ffi_controller_create_free(){
        let controller = tiltdrive_controller_new();
        assert!(!controller.is_null());
        unsafe{ tiltdrive_controller_free(controller); }
    }

    #[test]
    fn test_ffi_null_handles(){
        unsafe{
            assert_eq!(tiltdrive_stop(ptr::null_mut()), TILTDRIVE_ERR_NULL);
            assert_eq!(tiltdrive_start(ptr::null_mut(), ptr::null()), TILTDRIVE_ERR_NULL);
            assert_eq!(
                tiltdrive_push_sample(ptr::null_mut(), 0, 0.0, 0.0, 9.8, ptr::null_mut()),
                TILTDRIVE_ERR_NULL
            );
            tiltdrive_controller_free(ptr::null_mut());
        }
    }

    #[test]
    fn test_ffi_session_flow(){
        let controller = tiltdrive_controller_new();
        let empty = CString::new("").unwrap();
        let host = CString::new("127.0.0.1:9").unwrap();

        unsafe{
            assert_eq!(tiltdrive_start(controller, empty.as_ptr()), TILTDRIVE_ERR_INVALID_CONFIG);
            assert_eq!(tiltdrive_set_sensitivity(controller, -1.0), TILTDRIVE_ERR_INVALID_SENSITIVITY);
            assert_eq!(tiltdrive_set_sensitivity(controller, 2.0), TILTDRIVE_OK);

            let mut status = TiltdriveStatus::default();
            assert_eq!(tiltdrive_status(controller, &mut status), TILTDRIVE_OK);
            assert!(!status.active);
            assert_eq!((status.red, status.green, status.blue), (255, 200, 200));

            assert_eq!(tiltdrive_start(controller, host.as_ptr()), TILTDRIVE_OK);
            assert_eq!(tiltdrive_push_sample(controller, 7, 0.0, 0.0, 0.0, ptr::null_mut()), TILTDRIVE_ERR_BAD_KIND);

            let mut cmd = TiltdriveMotorCommand::default();
            assert_eq!(
                tiltdrive_push_sample(controller, TILTDRIVE_SENSOR_MAGNETIC, 40.0, 22.0, 0.0, &mut cmd),
                TILTDRIVE_TICK_AWAITING
            );
            //rolled 90 degrees: gravity along -x
            assert_eq!(
                tiltdrive_push_sample(controller, TILTDRIVE_SENSOR_GRAVITY, -9.81, 0.0, 0.0, &mut cmd),
                TILTDRIVE_TICK_DISPATCHED
            );
            assert_eq!((cmd.motor_a, cmd.motor_b), (100, 100));

            assert_eq!(tiltdrive_status(controller, &mut status), TILTDRIVE_OK);
            assert!(status.active);
            assert_eq!(status.intensity, 100);

            assert_eq!(tiltdrive_stop(controller), TILTDRIVE_OK);
            assert_eq!(
                tiltdrive_push_sample(controller, TILTDRIVE_SENSOR_GRAVITY, -9.81, 0.0, 0.0, &mut cmd),
                TILTDRIVE_TICK_IDLE
            );

            tiltdrive_controller_free(controller);
        }
    }
}
