#![forbid(unsafe_code)]

//! Core domain model and scheduling logic for the Rota system.
//!
//! This crate provides:
//! - Domain types (professionals, resources, appointments, tasks, slots)
//! - Per-professional diaries with conflict checking
//! - Atomic single and recurring booking across professionals
//! - Availability search over a date range
//! - Snapshot-based undo
//! - Persistence gateway and configuration

pub mod types;
pub mod error;
pub mod resources;
pub mod config;
pub mod logging;
pub mod diary;
pub mod undo;
pub mod scheduler;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use resources::{build_default_resources, default_shared_resources};
pub use config::Config;
pub use diary::Diary;
pub use undo::{SchedulerMemento, UndoManager};
pub use scheduler::Scheduler;
pub use store::{load_from_file, save_to_file};
