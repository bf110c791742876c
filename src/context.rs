//! Provenance labels attached to events
//!
//! The dispatcher asks a [`ContextProvider`] for a label only after an event
//! has passed the global level threshold.

use std::collections::HashMap;
use std::panic::Location;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Label returned when a provider cannot say anything useful
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Maximum number of call sites memoized by [`CallSiteContext`]
const CALL_SITE_CACHE_LIMIT: usize = 128;

/// Produces the context label for a log call. Must be cheap and must not fail.
pub trait ContextProvider: Send + Sync {
    fn resolve(&self, site: &'static Location<'static>) -> String;
}

/// Labels events with `<file stem>:<line>:` of the calling code
#[derive(Debug, Default)]
pub struct CallSiteContext {
    cache: Mutex<HashMap<(&'static str, u32), String>>,
}

impl CallSiteContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of memoized call sites
    pub fn cached_sites(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn render(site: &Location<'_>) -> String {
        match Path::new(site.file()).file_stem().and_then(|s| s.to_str()) {
            Some(stem) if !stem.is_empty() => format!("{}:{}:", stem, site.line()),
            _ => UNKNOWN_CONTEXT.to_string(),
        }
    }
}

impl ContextProvider for CallSiteContext {
    fn resolve(&self, site: &'static Location<'static>) -> String {
        let key = (site.file(), site.line());
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(label) = cache.get(&key) {
            return label.clone();
        }

        let label = Self::render(site);
        if cache.len() < CALL_SITE_CACHE_LIMIT {
            cache.insert(key, label.clone());
        }
        label
    }
}

/// Always returns the same label
#[derive(Debug, Clone)]
pub struct StaticContext(pub String);

impl StaticContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }
}

impl ContextProvider for StaticContext {
    fn resolve(&self, _site: &'static Location<'static>) -> String {
        self.0.clone()
    }
}

/// Empty label, for setups that never display context
#[derive(Debug, Default, Clone, Copy)]
pub struct NoContext;

impl ContextProvider for NoContext {
    fn resolve(&self, _site: &'static Location<'static>) -> String {
        String::new()
    }
}
