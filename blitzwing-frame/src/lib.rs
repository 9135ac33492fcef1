#[macro_use]
extern crate failure;
extern crate failure_derive;
#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate derive_new;
#[macro_use]
extern crate getset;
extern crate arrow;

// Engine records obey the session's log level on top of the global logger.
macro_rules! engine_log {
  ($session:expr, $level:expr, $($args:tt)+) => {
    if $session.log_enabled($level) {
      log!($level, $($args)+);
    }
  };
}

#[macro_use]
pub mod error;
pub mod client;
pub mod config;
pub mod frame;
pub mod reader;
pub mod session;
pub mod writer;

pub use client::CsvClient;
pub use frame::DataFrame;
pub use session::{Session, SessionBuilder};
pub use writer::SaveMode;
