// Dispatcher - fans events out to registered sinks

use crate::context::{CallSiteContext, ContextProvider};
use crate::event::Event;
use crate::level::Level;
use crate::sink::Sink;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle returned by [`Dispatcher::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

impl SinkId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Owns the ordered sink list and serializes every fan-out.
///
/// A single lock is held for the whole delivery of one event, so events from
/// different threads never interleave their sink visits. Sinks must not log
/// back through the dispatcher that is calling them.
pub struct Dispatcher {
    minimum_rank: AtomicU8,
    context: Box<dyn ContextProvider>,
    sinks: Mutex<Vec<(SinkId, Arc<dyn Sink>)>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// Dispatcher accepting every level, labelling events by call site
    pub fn new() -> Self {
        Self::with_context(CallSiteContext::new())
    }

    pub fn with_context(context: impl ContextProvider + 'static) -> Self {
        Self {
            minimum_rank: AtomicU8::new(Level::Trace.rank()),
            context: Box::new(context),
            sinks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SinkId, Arc<dyn Sink>)>> {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Process-wide threshold checked before any event is built
    pub fn set_level(&self, minimum: Level) {
        self.minimum_rank.store(minimum.rank(), Ordering::Relaxed);
    }

    pub fn minimum_rank(&self) -> u8 {
        self.minimum_rank.load(Ordering::Relaxed)
    }

    /// True if an event at `level` would be built and dispatched
    pub fn enabled(&self, level: Level) -> bool {
        level.rank() >= self.minimum_rank()
    }

    /// Append a sink; events reach sinks in registration order
    pub fn register(&self, sink: Arc<dyn Sink>) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(target: "dlogger", sink = sink.name(), id = id.0, "Registered sink");
        self.lock().push((id, sink));
        id
    }

    /// Detach a sink, handing it back to the caller
    pub fn remove(&self, id: SinkId) -> Option<Arc<dyn Sink>> {
        let mut sinks = self.lock();
        let index = sinks.iter().position(|(sink_id, _)| *sink_id == id)?;
        Some(sinks.remove(index).1)
    }

    pub fn sink_count(&self) -> usize {
        self.lock().len()
    }

    /// Snapshot of the registered sinks, in order
    pub fn sinks(&self) -> Vec<Arc<dyn Sink>> {
        self.lock().iter().map(|(_, sink)| Arc::clone(sink)).collect()
    }

    /// Log a message, labelling it with the caller's location
    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<String>) {
        self.log_at(level, message, Location::caller());
    }

    /// Log a message attributed to an explicit call site
    pub fn log_at(
        &self,
        level: Level,
        message: impl Into<String>,
        site: &'static Location<'static>,
    ) {
        if !self.enabled(level) {
            return;
        }

        let context = self.context.resolve(site);
        let event = Event::new(level, message, context);
        self.deliver(&event);
    }

    /// Dispatch a prebuilt event, still subject to the threshold
    pub fn dispatch(&self, event: &Event) {
        if self.enabled(event.level()) {
            self.deliver(event);
        }
    }

    fn deliver(&self, event: &Event) {
        let sinks = self.lock();
        for (_, sink) in sinks.iter() {
            sink.emit(event);
        }
    }

    /// Flush every sink
    pub fn flush(&self) {
        let sinks = self.lock();
        for (_, sink) in sinks.iter() {
            sink.flush();
        }
    }

    /// Flush and close every sink, in registration order
    pub fn shutdown(&self) {
        let sinks = self.lock();
        for (_, sink) in sinks.iter() {
            sink.close();
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
