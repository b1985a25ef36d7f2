/**
 * Orientation Estimator
 *
 * Fuses a gravity vector and a magnetic-field vector (device coordinates)
 * into azimuth/pitch/roll by building the east/north/up rotation frame.
 */

use crate::error::OrientationError;

pub const STANDARD_GRAVITY: f32 = 9.81;

//below this |gravity|^2 the device is in free fall (or the vector is zero)
const FREE_FALL_GRAVITY_SQUARED: f32 = 0.01 * STANDARD_GRAVITY * STANDARD_GRAVITY;
//|magnetic x gravity| below this means the two are (near) collinear
const MIN_EAST_NORM: f32 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3{
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3{
    pub const fn new(x: f32, y: f32, z: f32) -> Self{
        Vector3{ x, y, z }
    }

    pub fn cross(&self, other: &Vector3) -> Vector3{
        Vector3{
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    pub fn norm_squared(&self) -> f32{
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub fn norm(&self) -> f32{
        self.norm_squared().sqrt()
    }

    pub fn scale(&self, k: f32) -> Vector3{
        Vector3{ x: self.x * k, y: self.y * k, z: self.z * k }
    }

    pub fn is_finite(&self) -> bool{
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Vector3{
    fn from(v: [f32; 3]) -> Self{
        Vector3::new(v[0], v[1], v[2])
    }
}

/// Latest gravity and magnetic readings, possibly from different instants.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSample{
    pub gravity: Vector3,
    pub magnetic: Vector3,
}

/// Angles in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrientationEstimate{
    pub azimuth: f32,
    pub pitch: f32,   //forward/backward tilt
    pub roll: f32,    //left/right tilt
}

/// Rows are east (H), north (M) and up (A), all unit length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationFrame{
    pub east: Vector3,
    pub north: Vector3,
    pub up: Vector3,
}

impl RotationFrame{
    pub fn from_vectors(gravity: &Vector3, magnetic: &Vector3) -> Result<Self, OrientationError>{
        if !gravity.is_finite() || !magnetic.is_finite(){
            return Err(OrientationError::Undefined);
        }
        if gravity.norm_squared() < FREE_FALL_GRAVITY_SQUARED{
            return Err(OrientationError::Undefined);
        }

        let east = magnetic.cross(gravity);
        let east_norm = east.norm();
        if !(east_norm >= MIN_EAST_NORM){
            return Err(OrientationError::Undefined);
        }

        let east = east.scale(1.0 / east_norm);
        let up = gravity.scale(1.0 / gravity.norm());
        let north = up.cross(&east);

        Ok(RotationFrame{ east, north, up })
    }

    pub fn orientation(&self) -> OrientationEstimate{
        let azimuth = self.east.y.atan2(self.north.y);
        let pitch = (-self.north.z).clamp(-1.0, 1.0).asin();
        let roll = (-self.up.x).atan2(self.up.z);

        OrientationEstimate{
            azimuth: azimuth.to_degrees(),
            pitch: pitch.to_degrees(),
            roll: roll.to_degrees(),
        }
    }
}

/// Estimate pitch/roll for one tick. Nothing is cached between calls.
pub fn estimate(sample: &SensorSample) -> Result<OrientationEstimate, OrientationError>{
    let frame = RotationFrame::from_vectors(&sample.gravity, &sample.magnetic)?;
    let estimate = frame.orientation();

    if !(estimate.azimuth.is_finite() && estimate.pitch.is_finite() && estimate.roll.is_finite()){
        return Err(OrientationError::Undefined);
    }
    Ok(estimate)
}
