// Sinks - destinations for log events

mod console;
mod file;
pub mod retention;
pub mod rotation;

pub use console::ConsoleSink;
pub use file::{FileSink, FileSinkOptions, SinkState, DEFAULT_BUFFER_SIZE, DEFAULT_CHECK_ROTATION_EVERY};

use crate::event::Event;
use crate::filter::{run_chain, Filter};
use crate::level::Level;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{PoisonError, RwLock};

/// A destination that accepts, formats and persists or displays events.
///
/// Sinks are shared between the dispatcher and the application, so every
/// method takes `&self` and implementations guard their own state.
pub trait Sink: Send + Sync {
    /// Level threshold and filter chain of this sink
    fn gate(&self) -> &Gate;

    /// Persist or display an event that already passed the gate
    fn write(&self, event: &Event);

    /// Gate check followed by [`Sink::write`]; rejected events have no effect
    fn emit(&self, event: &Event) {
        if self.gate().admits(event) {
            self.write(event);
        }
    }

    /// Push buffered output to its destination
    fn flush(&self) {}

    /// Flush and stop accepting events
    fn close(&self) {
        self.flush();
    }

    /// Short name used in diagnostics
    fn name(&self) -> &str;
}

/// Per-sink accept check: minimum rank plus an ordered filter chain
pub struct Gate {
    minimum_rank: AtomicU8,
    filters: RwLock<Vec<Box<dyn Filter>>>,
}

impl Gate {
    pub fn new(minimum: Level) -> Self {
        Self {
            minimum_rank: AtomicU8::new(minimum.rank()),
            filters: RwLock::new(Vec::new()),
        }
    }

    pub fn set_level(&self, minimum: Level) {
        self.minimum_rank.store(minimum.rank(), Ordering::Relaxed);
    }

    pub fn minimum_rank(&self) -> u8 {
        self.minimum_rank.load(Ordering::Relaxed)
    }

    /// Append a filter to the end of the chain
    pub fn add_filter(&self, filter: impl Filter + 'static) {
        self.filters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(filter));
    }

    pub fn filter_count(&self) -> usize {
        self.filters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if the event clears the threshold and every filter, in order
    pub fn admits(&self, event: &Event) -> bool {
        if event.rank() < self.minimum_rank() {
            return false;
        }
        let filters = self.filters.read().unwrap_or_else(PoisonError::into_inner);
        run_chain(&filters, event).is_accept()
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new(Level::Trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{KeywordFilter, ModuleFilter};

    #[test]
    fn test_gate_threshold() {
        let gate = Gate::new(Level::Info);
        assert!(!gate.admits(&Event::new(Level::Debug, "m", "c")));
        assert!(gate.admits(&Event::new(Level::Info, "m", "c")));

        gate.set_level(Level::Error);
        assert!(!gate.admits(&Event::new(Level::Warning, "m", "c")));
        assert_eq!(gate.minimum_rank(), 40);
    }

    #[test]
    fn test_gate_filters_in_order() {
        let gate = Gate::default();
        gate.add_filter(ModuleFilter::new(["db"]));
        gate.add_filter(KeywordFilter::new(["password"]));
        assert_eq!(gate.filter_count(), 2);

        assert!(gate.admits(&Event::new(Level::Info, "query ok", "db:3:")));
        assert!(!gate.admits(&Event::new(Level::Info, "query ok", "http:3:")));
        assert!(!gate.admits(&Event::new(Level::Info, "bad PASSWORD", "db:3:")));
    }
}
