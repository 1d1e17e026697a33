//! Background weight receiver
//!
//! Reads protocol lines from any `BufRead` (typically an opened serial port)
//! on a dedicated thread and keeps the most recent reading.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::protocol::{parse_line, DeviceMessage};
use super::{WeightReading, WeightSource};

/// Counters for the receiver thread
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReceiverStats {
    pub messages_received: u64,
    pub weight_messages: u64,
    pub device_errors: u64,
    pub unparsed_lines: u64,
    pub last_message_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Shared {
    latest: Option<WeightReading>,
    stats: ReceiverStats,
}

/// Weight source fed by a line reader on a background thread
pub struct LineWeightReceiver {
    shared: Arc<Mutex<Shared>>,
    running: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl LineWeightReceiver {
    /// Start reading lines from `reader`
    pub fn spawn<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let running = Arc::new(AtomicBool::new(true));

        let handle = {
            let shared = Arc::clone(&shared);
            let running = Arc::clone(&running);
            std::thread::spawn(move || receive_loop(reader, shared, running))
        };

        Self {
            shared,
            running,
            handle: Mutex::new(Some(handle)),
        }
    }

    pub fn stats(&self) -> ReceiverStats {
        self.shared
            .lock()
            .map(|s| s.stats.clone())
            .unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the thread to stop.
    ///
    /// A read already blocked on a silent port is not interrupted: the thread
    /// exits once the next line or EOF arrives. Dropping the receiver only
    /// calls this; it does not wait for the thread.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Wait for the thread to finish (EOF, read error, or `stop`)
    pub fn join(&self) {
        let handle = self.handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Weight receiver thread panicked");
            }
        }
    }
}

impl WeightSource for LineWeightReceiver {
    fn latest(&self) -> Option<WeightReading> {
        self.shared.lock().ok().and_then(|s| s.latest.clone())
    }

    fn stats(&self) -> Option<ReceiverStats> {
        Some(LineWeightReceiver::stats(self))
    }
}

impl Drop for LineWeightReceiver {
    fn drop(&mut self) {
        self.stop();
    }
}

fn receive_loop<R: BufRead>(
    mut reader: R,
    shared: Arc<Mutex<Shared>>,
    running: Arc<AtomicBool>,
) {
    tracing::info!("Weight receiver started");
    let mut line = String::new();

    while running.load(Ordering::SeqCst) {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Weight receiver read failed");
                break;
            }
        }

        if line.trim().is_empty() {
            continue;
        }

        let message = parse_line(&line);
        let Ok(mut state) = shared.lock() else {
            break;
        };
        state.stats.messages_received += 1;
        state.stats.last_message_at = Some(Utc::now());

        match message {
            DeviceMessage::Weight(reading) => {
                state.stats.weight_messages += 1;
                tracing::debug!(grams = reading.grams, stable = reading.stable, "Weight reading");
                state.latest = Some(reading);
            }
            DeviceMessage::Error(detail) => {
                state.stats.device_errors += 1;
                tracing::warn!(%detail, "Scale reported an error");
            }
            DeviceMessage::Status(detail) | DeviceMessage::Log(detail) => {
                tracing::trace!(%detail, "Scale message");
            }
            DeviceMessage::Unknown(raw) => {
                state.stats.unparsed_lines += 1;
                tracing::debug!(%raw, "Unrecognized scale line");
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    tracing::info!("Weight receiver stopped");
}
