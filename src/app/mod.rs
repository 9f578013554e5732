//! The livebuild pipeline
//!
//! - Initial pass: compile every monitored file, then reload once
//! - Watch pass: recompile each changed file and reload what changed
//! - Compile errors are reported as events and never stop the loop
//! - Graceful Ctrl+C shutdown flushes a pending reload

mod event;
mod pipeline;

pub use event::PipelineEvent;
pub use pipeline::{reloader_for, Orchestrator};
