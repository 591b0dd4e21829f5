//! Worker execution shared by the document engine.
//!
//! Background analysis runs on a tokio blocking pool so that parse bodies
//! never run on the thread that owns the document. Work is tagged with a
//! [`TaskClass`] for tracing and superseded through [`GenerationToken`]s.

mod class;
mod spawn;
mod token;


pub use class::TaskClass;
pub use spawn::spawn_blocking;
pub use token::{GenerationClock, GenerationToken};
