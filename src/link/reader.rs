//! Background reader loop driving a shared engine from a range link

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::engine::PositioningEngine;
use crate::link::{LinkError, RangeLink};

/// Engine shared between the reader loop and configuration or render
/// collaborators. All of them lock the same mutex, so a configuration
/// replace never interleaves with a reading-driven recompute.
pub type SharedEngine = Arc<Mutex<PositioningEngine>>;

/// Build a shared engine from a configuration
pub fn shared_engine(config: EngineConfig) -> SharedEngine {
    Arc::new(Mutex::new(PositioningEngine::new(config)))
}

/// Idle delay between polls while the link has nothing pending
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Handle to a running reader loop
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: thread::JoinHandle<()>,
}

impl ReaderHandle {
    /// Ask the loop to stop without waiting for it
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Ask the loop to stop and wait until it has exited
    pub fn stop(self) {
        self.request_stop();
        let _ = self.thread.join();
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
}

/// Spawn the read loop: await the next chunk, feed it to the engine under
/// the shared lock, repeat. Each chunk is processed to completion before
/// the next read. The loop exits on request or when the link fails;
/// either way the last published estimate stays intact, since estimates
/// are only ever replaced by an accepted recompute.
pub fn spawn_reader(mut link: Box<dyn RangeLink>, engine: SharedEngine) -> ReaderHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let thread = thread::spawn(move || {
        while !flag.load(Ordering::Relaxed) {
            match link.read_chunk() {
                Ok(Some(chunk)) => {
                    engine.lock().feed(&chunk);
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(LinkError::Disconnected { link_id }) => {
                    log::info!("range link {} disconnected, reader exiting", link_id);
                    break;
                }
                Err(err) => {
                    log::warn!("reader exiting: {}", err);
                    break;
                }
            }
        }
    });
    ReaderHandle { stop, thread }
}
