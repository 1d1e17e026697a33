//! Weight sources and the scale display
//!
//! Where the grams come from: a fixed value, or a scale reporting over a
//! line-oriented serial link. Results go back over the same link.

pub mod protocol;
pub mod receiver;

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use protocol::{format_result_message, parse_line, DeviceMessage};
pub use receiver::{LineWeightReceiver, ReceiverStats};

/// One scale reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightReading {
    pub grams: f64,
    pub stable: bool,
    pub received_at: DateTime<Utc>,
}

impl WeightReading {
    pub fn new(grams: f64, stable: bool) -> Self {
        Self {
            grams,
            stable,
            received_at: Utc::now(),
        }
    }

    /// Stable and heavy enough to start an analysis automatically
    pub fn ready_for_analysis(&self, auto_trigger_grams: f64) -> bool {
        self.stable && self.grams > auto_trigger_grams
    }
}

/// Mass-in-grams capability
pub trait WeightSource: Send + Sync {
    /// Most recent reading, if any has arrived
    fn latest(&self) -> Option<WeightReading>;

    /// Link counters, for sources that have a link
    fn stats(&self) -> Option<ReceiverStats> {
        None
    }
}

/// Line-out capability: the display side of the scale
pub trait DisplaySink: Send + Sync {
    fn send_line(&self, line: &str) -> io::Result<()>;
}

/// Writes newline-terminated protocol lines to any writer
pub struct LineDisplay<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> LineDisplay<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> DisplaySink for LineDisplay<W> {
    fn send_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "display writer poisoned"))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

/// A weight source that always reports the same stable value
#[derive(Debug, Clone, Copy)]
pub struct FixedWeight(pub f64);

impl WeightSource for FixedWeight {
    fn latest(&self) -> Option<WeightReading> {
        Some(WeightReading::new(self.0, true))
    }
}
