/**
 * Serial IMU source
 *
 * Reads framed IMU messages from a microcontroller over UART and publishes
 * the accelerometer and magnetometer vectors into a SensorHub.
 *
 * Frame format: [SYNC][TYPE][LEN][PAYLOAD...][CHECKSUM]
 *               0xAA  1byte 1byte  LEN bytes   1byte
 * checksum = wrapping sum of TYPE, LEN and PAYLOAD
 */

use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, info, warn};

use super::{SensorHub, SensorKind};
use crate::orientation::Vector3;

pub const SYNC_BYTE: u8 = 0xAA;
pub const MAX_MSG_SIZE: usize = 244;
pub const MSG_TYPE_IMU: u8 = 0x01;
pub const IMU_MSG_SIZE: usize = 36; //9 * f32

/// One IMU reading: accel in m/s², gyro in rad/s, mag in µT.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ImuFrame{
    pub accel: Vector3,
    pub gyro: Vector3,
    pub mag: Vector3,
}

impl ImuFrame{
    pub fn from_bytes(data: &[u8]) -> Option<Self>{
        if data.len() < IMU_MSG_SIZE{
            return None;
        }
        let f = |i: usize| f32::from_le_bytes([data[4 * i], data[4 * i + 1], data[4 * i + 2], data[4 * i + 3]]);
        Some(ImuFrame{
            accel: Vector3::new(f(0), f(1), f(2)),
            gyro: Vector3::new(f(3), f(4), f(5)),
            mag: Vector3::new(f(6), f(7), f(8)),
        })
    }

    pub fn to_bytes(&self) -> Vec<u8>{
        let mut bytes = Vec::with_capacity(IMU_MSG_SIZE);
        for v in [self.accel, self.gyro, self.mag]{
            for c in [v.x, v.y, v.z]{
                bytes.extend_from_slice(&c.to_le_bytes());
            }
        }
        bytes
    }
}

pub fn calculate_checksum(data: &[u8]) -> u8{
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Wrap a payload into a frame. Payloads over MAX_MSG_SIZE are refused.
pub fn encode_frame(msg_type: u8, payload: &[u8]) -> Option<Vec<u8>>{
    if payload.len() > MAX_MSG_SIZE{
        return None;
    }
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.push(SYNC_BYTE);
    frame.push(msg_type);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    let checksum = calculate_checksum(&frame[1..]);
    frame.push(checksum);
    Some(frame)
}

/// Incremental frame decoder over an arbitrary byte stream.
#[derive(Debug, Default)]
pub struct FrameParser{
    rx_buffer: Vec<u8>,
}

impl FrameParser{
    pub fn new() -> Self{
        FrameParser{ rx_buffer: Vec::with_capacity(512) }
    }

    pub fn extend(&mut self, bytes: &[u8]){
        self.rx_buffer.extend_from_slice(bytes);
    }

    /// Next complete, checksum-valid frame as (type, payload).
    pub fn next_frame(&mut self) -> Option<(u8, Vec<u8>)>{
        loop{
            let sync_pos = match self.rx_buffer.iter().position(|&b| b == SYNC_BYTE){
                Some(pos) => pos,
                None =>{
                    self.rx_buffer.clear();
                    return None;
                }
            };
            if sync_pos > 0{
                self.rx_buffer.drain(0..sync_pos);
            }

            if self.rx_buffer.len() < 4{
                return None;
            }

            let msg_type = self.rx_buffer[1];
            let len = self.rx_buffer[2] as usize;

            if len > MAX_MSG_SIZE{
                self.rx_buffer.remove(0);
                continue;
            }

            let frame_len = 4 + len; //sync + type + len + payload + checksum
            if self.rx_buffer.len() < frame_len{
                return None;
            }

            let checksum = self.rx_buffer[3 + len];
            if checksum != calculate_checksum(&self.rx_buffer[1..3 + len]){
                //false sync, rescan from the next byte
                self.rx_buffer.remove(0);
                continue;
            }

            let payload = self.rx_buffer[3..3 + len].to_vec();
            self.rx_buffer.drain(0..frame_len);
            return Some((msg_type, payload));
        }
    }

    pub fn buffered(&self) -> usize{
        self.rx_buffer.len()
    }
}

/// Feed raw bytes, publish every IMU frame found, call `on_sample` after each.
pub fn process_bytes<F>(parser: &mut FrameParser, bytes: &[u8], hub: &SensorHub, on_sample: &mut F) -> usize
where
    F: FnMut(),
{
    parser.extend(bytes);
    let mut published = 0;

    while let Some((msg_type, payload)) = parser.next_frame(){
        if msg_type != MSG_TYPE_IMU{
            debug!(msg_type, "ignoring non-imu frame");
            continue;
        }
        match ImuFrame::from_bytes(&payload){
            Some(imu) =>{
                hub.publish(SensorKind::Gravity, imu.accel);
                hub.publish(SensorKind::Magnetic, imu.mag);
                published += 1;
                on_sample();
            }
            None => debug!(len = payload.len(), "short imu payload"),
        }
    }
    published
}

pub struct SerialImuSource{
    port: Box<dyn SerialPort>,
    port_name: String,
    running: Arc<AtomicBool>,
}

impl SerialImuSource{
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, serialport::Error>{
        let port = serialport::new(port_name, baud_rate)
            .timeout(Duration::from_millis(10))
            .open()?;
        info!(port = port_name, baud_rate, "imu serial port open");

        Ok(SerialImuSource{
            port,
            port_name: port_name.to_string(),
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Read on a background thread until the returned flag is cleared.
    pub fn start<F>(mut self, hub: Arc<SensorHub>, mut on_sample: F) -> (JoinHandle<()>, Arc<AtomicBool>)
    where
        F: FnMut() + Send + 'static,
    {
        let running = Arc::clone(&self.running);
        self.running.store(true, Ordering::SeqCst);

        let handle = thread::spawn(move ||{
            let mut parser = FrameParser::new();
            let mut read_buf = [0u8; 256];

            while self.running.load(Ordering::SeqCst){
                match self.port.read(&mut read_buf){
                    Ok(n) if n > 0 =>{
                        process_bytes(&mut parser, &read_buf[..n], &hub, &mut on_sample);
                    }
                    Ok(_) => {}
                    Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(e) =>{
                        warn!(port = %self.port_name, error = %e, "imu serial read error");
                        thread::sleep(Duration::from_millis(100));
                    }
                }
            }
            info!(port = %self.port_name, "imu serial reader stopped");
        });

        (handle, running)
    }
}

pub fn stop_source(running: &Arc<AtomicBool>){
    running.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests{
    use super::*;
    use crate::sensor::SensorProvider;

    fn imu_frame(accel: Vector3, mag: Vector3) -> Vec<u8>{
        let imu = ImuFrame{ accel, gyro: Vector3::default(), mag };
        encode_frame(MSG_TYPE_IMU, &imu.to_bytes()).unwrap()
    }

    #[test]
    fn test_checksum(){
        let data = [0x01, 0x05, 0xAB, 0xCD];
        assert_eq!(calculate_checksum(&data), 0x01u8.wrapping_add(0x05).wrapping_add(0xAB).wrapping_add(0xCD));
    }

    #[test]
    fn test_imu_payload_layout(){
        let imu = ImuFrame{
            accel: Vector3::new(0.1, 0.2, 9.8),
            gyro: Vector3::new(1.0, 2.0, 3.0),
            mag: Vector3::new(20.0, -5.0, -40.0),
        };
        let bytes = imu.to_bytes();
        assert_eq!(bytes.len(), IMU_MSG_SIZE);
        assert_eq!(&bytes[8..12], &9.8f32.to_le_bytes());
        assert_eq!(ImuFrame::from_bytes(&bytes), Some(imu));
        assert_eq!(ImuFrame::from_bytes(&bytes[..20]), None);
    }

    #[test]
    fn test_parser_handles_split_and_noise(){
        let frame = imu_frame(Vector3::new(0.0, 0.0, 9.8), Vector3::new(0.0, 22.0, -40.0));
        let mut stream = vec![0x00, 0x13, 0x37];
        stream.extend_from_slice(&frame);

        let mut parser = FrameParser::new();
        parser.extend(&stream[..10]);
        assert!(parser.next_frame().is_none());
        parser.extend(&stream[10..]);

        let (msg_type, payload) = parser.next_frame().unwrap();
        assert_eq!(msg_type, MSG_TYPE_IMU);
        assert_eq!(payload.len(), IMU_MSG_SIZE);
        assert_eq!(parser.buffered(), 0);
    }

    #[test]
    fn test_parser_resyncs_after_corruption(){
        let mut bad = imu_frame(Vector3::new(1.0, 1.0, 1.0), Vector3::new(1.0, 1.0, 1.0));
        let last = bad.len() - 1;
        bad[last] = bad[last].wrapping_add(1);
        let good = imu_frame(Vector3::new(0.0, 0.0, 9.8), Vector3::new(0.0, 22.0, -40.0));

        let mut parser = FrameParser::new();
        parser.extend(&bad);
        parser.extend(&good);

        let (_, payload) = parser.next_frame().unwrap();
        let imu = ImuFrame::from_bytes(&payload).unwrap();
        assert_eq!(imu.accel, Vector3::new(0.0, 0.0, 9.8));
        assert!(parser.next_frame().is_none());
    }

    #[test]
    fn test_process_bytes_publishes_into_hub(){
        let hub = SensorHub::new();
        let mut parser = FrameParser::new();
        let mut ticks = 0;

        let mut stream = imu_frame(Vector3::new(0.0, 0.0, 9.8), Vector3::new(0.0, 22.0, -40.0));
        stream.extend(encode_frame(0x02, &[1, 2, 3, 4]).unwrap()); //depth frame, ignored
        stream.extend(imu_frame(Vector3::new(0.0, 1.0, 9.7), Vector3::new(0.0, 21.0, -41.0)));

        let published = process_bytes(&mut parser, &stream, &hub, &mut || ticks += 1);
        assert_eq!(published, 2);
        assert_eq!(ticks, 2);
        assert_eq!(hub.latest(SensorKind::Gravity), Some(Vector3::new(0.0, 1.0, 9.7)));
        assert_eq!(hub.latest(SensorKind::Magnetic), Some(Vector3::new(0.0, 21.0, -41.0)));
    }

    #[test]
    fn test_encode_frame_rejects_oversize(){
        assert!(encode_frame(MSG_TYPE_IMU, &[0u8; MAX_MSG_SIZE + 1]).is_none());
        let frame = encode_frame(MSG_TYPE_IMU, &[]).unwrap();
        assert_eq!(frame, vec![SYNC_BYTE, MSG_TYPE_IMU, 0, MSG_TYPE_IMU]);
    }
}
