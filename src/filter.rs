// Filters - predicates deciding whether a sink takes an event

use crate::event::Event;
use crate::level::Level;

/// Outcome of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

impl From<bool> for Decision {
    fn from(accept: bool) -> Self {
        if accept {
            Decision::Accept
        } else {
            Decision::Reject
        }
    }
}

/// A pure predicate over events
pub trait Filter: Send + Sync {
    fn decide(&self, event: &Event) -> Decision;
}

/// Accepts events whose rank is at least the configured minimum
#[derive(Debug, Clone, Copy)]
pub struct LevelFilter {
    minimum: Level,
}

impl LevelFilter {
    pub fn new(minimum: Level) -> Self {
        Self { minimum }
    }
}

impl Filter for LevelFilter {
    fn decide(&self, event: &Event) -> Decision {
        event.level().passes(self.minimum).into()
    }
}

/// Rejects events whose message contains any excluded keyword
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    exclude: Vec<String>,
    case_sensitive: bool,
}

impl KeywordFilter {
    /// Case-insensitive keyword filter
    pub fn new<I, S>(exclude: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_case(exclude, false)
    }

    pub fn with_case<I, S>(exclude: I, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let exclude = exclude
            .into_iter()
            .map(Into::into)
            .map(|k: String| if case_sensitive { k } else { k.to_lowercase() })
            .collect();
        Self {
            exclude,
            case_sensitive,
        }
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

impl Filter for KeywordFilter {
    fn decide(&self, event: &Event) -> Decision {
        let hit = if self.case_sensitive {
            self.exclude.iter().any(|k| event.message().contains(k.as_str()))
        } else {
            let message = event.message().to_lowercase();
            self.exclude.iter().any(|k| message.contains(k.as_str()))
        };
        (!hit).into()
    }
}

/// Accepts events whose context mentions at least one allowed module
#[derive(Debug, Clone)]
pub struct ModuleFilter {
    modules: Vec<String>,
}

impl ModuleFilter {
    pub fn new<I, S>(modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modules: modules.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for ModuleFilter {
    fn decide(&self, event: &Event) -> Decision {
        self.modules
            .iter()
            .any(|m| event.context().contains(m.as_str()))
            .into()
    }
}

/// Adapts a closure into a filter
pub struct FnFilter<F>(pub F);

impl<F> Filter for FnFilter<F>
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    fn decide(&self, event: &Event) -> Decision {
        (self.0)(event).into()
    }
}

/// Runs filters in order, stopping at the first rejection
pub fn run_chain(filters: &[Box<dyn Filter>], event: &Event) -> Decision {
    filters
        .iter()
        .all(|f| f.decide(event).is_accept())
        .into()
}
