use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::orientation::Vector3;

/// Latest-value slot for one sensor stream.
///
/// Every publish overwrites the previous reading and bumps the epoch; readers
/// never queue, they only ever see the freshest vector.
pub struct SensorChannel{
    latest: RwLock<Option<(Vector3, u64)>>,
    write_epoch: AtomicU64,
}

impl SensorChannel{
    pub fn new() -> Self{
        SensorChannel{
            latest: RwLock::new(None),
            write_epoch: AtomicU64::new(0),
        }
    }

    /// Store a reading, return its epoch (1 for the first one).
    pub fn publish(&self, value: Vector3) -> u64{
        let mut slot = self.latest.write().unwrap_or_else(|e| e.into_inner());
        //epoch bumped under the lock so slot and counter agree
        let epoch = self.write_epoch.fetch_add(1, Ordering::AcqRel) + 1;
        *slot = Some((value, epoch));
        epoch
    }

    pub fn peek_latest(&self) -> Option<(Vector3, u64)>{
        *self.latest.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn latest(&self) -> Option<Vector3>{
        self.peek_latest().map(|(v, _)| v)
    }

    pub fn latest_epoch(&self) -> u64{
        self.write_epoch.load(Ordering::Acquire)
    }

    /// True if something was published after `seen_epoch`.
    pub fn has_new(&self, seen_epoch: u64) -> bool{
        self.latest_epoch() > seen_epoch
    }

    /// Drop the stored reading. The epoch keeps counting.
    pub fn clear(&self){
        *self.latest.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl Default for SensorChannel{
    fn default() -> Self{
        Self::new()
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_publish_overwrites(){
        let channel = SensorChannel::new();
        assert!(channel.latest().is_none());
        assert_eq!(channel.latest_epoch(), 0);

        let e1 = channel.publish(Vector3::new(0.0, 0.0, 9.8));
        let e2 = channel.publish(Vector3::new(0.0, 1.0, 9.7));
        assert_eq!(e1, 1);
        assert_eq!(e2, 2);

        let (v, epoch) = channel.peek_latest().unwrap();
        assert_eq!(v, Vector3::new(0.0, 1.0, 9.7));
        assert_eq!(epoch, 2);
    }

    #[test]
    fn test_freshness(){
        let channel = SensorChannel::new();
        assert!(!channel.has_new(0));
        channel.publish(Vector3::new(1.0, 2.0, 3.0));
        assert!(channel.has_new(0));
        let seen = channel.latest_epoch();
        assert!(!channel.has_new(seen));
        channel.publish(Vector3::new(1.0, 2.0, 4.0));
        assert!(channel.has_new(seen));
    }

    #[test]
    fn test_clear(){
        let channel = SensorChannel::new();
        channel.publish(Vector3::new(1.0, 0.0, 0.0));
        channel.clear();
        assert!(channel.latest().is_none());
        assert_eq!(channel.latest_epoch(), 1);
    }

    #[test]
    fn test_threaded_publish(){
        let channel = Arc::new(SensorChannel::new());
        let producer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move ||{
                for i in 0..1000{
                    channel.publish(Vector3::new(i as f32, 0.0, 0.0));
                }
            })
        };

        let mut last = 0;
        while last < 1000{
            if let Some((v, epoch)) = channel.peek_latest(){
                assert!(epoch >= last);
                assert_eq!(v.x as u64 + 1, epoch);
                last = epoch;
            }
            std::hint::spin_loop();
        }
        producer.join().unwrap();
    }
}
