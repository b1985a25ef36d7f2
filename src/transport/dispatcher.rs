/**
 * Fire-and-forget dispatch
 *
 * A fixed pool of worker threads drains a bounded queue of motor commands.
 * The caller never blocks: when the queue is full the command is dropped.
 * Sends complete in any order; failures are logged and counted only.
 */

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};
use tracing::{debug, warn};

use super::{encode, DatagramSink, Endpoint};
use crate::drive::MotorCommand;

struct Job{
    endpoint: Endpoint,
    command: MotorCommand,
}

#[derive(Debug, Default)]
struct Counters{
    sent: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time view of the dispatch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats{
    pub sent: u64,
    pub failed: u64,
    pub dropped: u64,
}

pub struct Dispatcher{
    tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl Dispatcher{
    pub fn new(sink: Arc<dyn DatagramSink>, workers: usize, queue_capacity: usize) -> io::Result<Self>{
        let (tx, rx) = bounded::<Job>(queue_capacity.max(1));
        let counters = Arc::new(Counters::default());

        let mut handles = Vec::with_capacity(workers.max(1));
        for i in 0..workers.max(1){
            let rx = rx.clone();
            let sink = Arc::clone(&sink);
            let counters = Arc::clone(&counters);

            let handle = thread::Builder::new()
                .name(format!("tiltdrive-tx-{}", i))
                .spawn(move ||{
                    //ends once every sender is gone and the queue is drained
                    for job in rx.iter(){
                        let payload = encode(&job.command);
                        match sink.send(&job.endpoint, payload.as_bytes()){
                            Ok(()) =>{
                                counters.sent.fetch_add(1, Ordering::Relaxed);
                                debug!(endpoint = %job.endpoint, %payload, "motor command sent");
                            }
                            Err(e) =>{
                                counters.failed.fetch_add(1, Ordering::Relaxed);
                                warn!(endpoint = %job.endpoint, %payload, error = %e, "motor command lost");
                            }
                        }
                    }
                })?;
            handles.push(handle);
        }

        Ok(Dispatcher{
            tx: Some(tx),
            workers: handles,
            counters,
        })
    }

    /// Queue a command without blocking. Returns false if it was dropped.
    pub fn dispatch(&self, endpoint: Endpoint, command: MotorCommand) -> bool{
        let Some(tx) = self.tx.as_ref() else{
            return false;
        };

        match tx.try_send(Job{ endpoint, command }){
            Ok(()) => true,
            Err(TrySendError::Full(job)) =>{
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(endpoint = %job.endpoint, "transmit queue full, dropping motor command");
                false
            }
            Err(TrySendError::Disconnected(_)) =>{
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Commands waiting for a worker.
    pub fn pending(&self) -> usize{
        self.tx.as_ref().map_or(0, |tx| tx.len())
    }

    pub fn stats(&self) -> DispatchStats{
        DispatchStats{
            sent: self.counters.sent.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// Close the queue, let in-flight and queued sends finish, return final counters.
    pub fn shutdown(mut self) -> DispatchStats{
        self.close();
        self.stats()
    }

    fn close(&mut self){
        self.tx.take();
        for handle in self.workers.drain(..){
            if handle.join().is_err(){
                warn!("transmit worker panicked");
            }
        }
    }
}

impl Drop for Dispatcher{
    fn drop(&mut self){
        self.close();
    }
}

#[cfg(test)]
mod tests{
    use super::*;
    use std::sync::Mutex;
    use crossbeam_channel::{unbounded, Receiver};
    use crate::error::TransmitError;

    #[derive(Default)]
    struct RecordingSink{
        payloads: Mutex<Vec<(Endpoint, String)>>,
    }

    impl DatagramSink for RecordingSink{
        fn send(&self, endpoint: &Endpoint, payload: &[u8]) -> Result<(), TransmitError>{
            self.payloads.lock().unwrap()
                .push((endpoint.clone(), String::from_utf8(payload.to_vec()).unwrap()));
            Ok(())
        }
    }

    struct FailingSink;

    impl DatagramSink for FailingSink{
        fn send(&self, endpoint: &Endpoint, _payload: &[u8]) -> Result<(), TransmitError>{
            Err(TransmitError::NoAddress(endpoint.host.clone()))
        }
    }

    //blocks inside send until released
    struct GatedSink{
        entered: Sender<()>,
        release: Receiver<()>,
    }

    impl DatagramSink for GatedSink{
        fn send(&self, _endpoint: &Endpoint, _payload: &[u8]) -> Result<(), TransmitError>{
            self.entered.send(()).unwrap();
            self.release.recv().unwrap();
            Ok(())
        }
    }

    #[test]
    fn test_dispatch_delivers_encoded_payloads(){
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(sink.clone(), 2, 16).unwrap();
        let endpoint = Endpoint::new("robot", 12345);

        assert!(dispatcher.dispatch(endpoint.clone(), MotorCommand::new(50, -50)));
        assert!(dispatcher.dispatch(endpoint.clone(), MotorCommand::new(0, 100)));

        let stats = dispatcher.shutdown();
        assert_eq!(stats, DispatchStats{ sent: 2, failed: 0, dropped: 0 });

        //workers may finish out of order
        let mut payloads: Vec<String> = sink.payloads.lock().unwrap().iter().map(|(_, p)| p.clone()).collect();
        payloads.sort();
        assert_eq!(payloads, vec!["0,100".to_string(), "50,-50".to_string()]);
    }

    #[test]
    fn test_failures_are_counted_not_raised(){
        let dispatcher = Dispatcher::new(Arc::new(FailingSink), 1, 8).unwrap();
        for _ in 0..3{
            assert!(dispatcher.dispatch(Endpoint::new("nowhere", 1), MotorCommand::STOP));
        }
        let stats = dispatcher.shutdown();
        assert_eq!(stats, DispatchStats{ sent: 0, failed: 3, dropped: 0 });
    }

    #[test]
    fn test_full_queue_drops_without_blocking(){
        let (entered_tx, entered_rx) = unbounded();
        let (release_tx, release_rx) = unbounded();
        let sink = Arc::new(GatedSink{ entered: entered_tx, release: release_rx });
        let dispatcher = Dispatcher::new(sink, 1, 1).unwrap();
        let endpoint = Endpoint::new("robot", 12345);

        assert!(dispatcher.dispatch(endpoint.clone(), MotorCommand::new(1, 1)));
        entered_rx.recv().unwrap(); //worker is now stuck in send

        assert!(dispatcher.dispatch(endpoint.clone(), MotorCommand::new(2, 2)));
        assert_eq!(dispatcher.pending(), 1);
        assert!(!dispatcher.dispatch(endpoint.clone(), MotorCommand::new(3, 3)));

        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();

        let stats = dispatcher.shutdown();
        assert_eq!(stats, DispatchStats{ sent: 2, failed: 0, dropped: 1 });
    }
}
