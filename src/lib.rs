#![allow(dead_code)]
#![warn(clippy::all)]

pub mod cache;
pub mod codec;
pub mod constants;
pub mod context;
pub mod error;
pub mod features;
pub mod game_loop;
pub mod grid;
pub mod host;
pub mod knowledge;
pub mod logging;
pub mod panic;
pub mod pathing;
pub mod priorityqueue;
pub mod protocol;
pub mod roles;
pub mod strategy;
pub mod tactics;

pub use game_loop::Controller;

/// Installs logging and the panic hook. Hosts call this once per process.
pub fn setup(verbosity: log::LevelFilter, sink: logging::LogSink) {
    logging::setup_logging(verbosity, sink);
    panic::setup_panic_hook();
}
