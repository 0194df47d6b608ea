//! Stage timing for the generation pipeline

use std::time::Instant;

/// RAII timer that logs the elapsed time of a stage on drop
///
/// ```ignore
/// let _t = Timed::debug("Clipping");
/// // ... do work ...
/// // logs "Clipping: 1.234ms" when _t is dropped
/// ```
pub(crate) struct Timed {
    name: &'static str,
    start: Instant,
    level: log::Level,
}

impl Timed {
    /// Log the stage at DEBUG level
    pub fn debug(name: &'static str) -> Self {
        log::trace!("{}...", name);
        Self {
            name,
            start: Instant::now(),
            level: log::Level::Debug,
        }
    }

    /// Log the stage at TRACE level, for per-iteration work
    pub fn trace(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
            level: log::Level::Trace,
        }
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        log::log!(self.level, "{}: {:.3?}", self.name, self.start.elapsed());
    }
}
