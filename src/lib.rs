// Library exports for dlogger

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod level;
pub mod logger;
pub mod reader;
pub mod sink;

pub use config::LoggerConfig;
pub use dispatch::{Dispatcher, SinkId};
pub use error::{LoggerError, Result};
pub use event::Event;
pub use filter::{Decision, Filter, KeywordFilter, LevelFilter, ModuleFilter};
pub use format::{Formatter, SimpleFormatter};
pub use level::Level;
pub use logger::Logger;
pub use sink::{ConsoleSink, FileSink, FileSinkOptions, Sink};
