//! Sticky Notes - lifecycle core for independent floating note windows
//!
//! This library provides the note data model, the persisting repository,
//! and the coordinator that keeps one live window per active note. The
//! rendering shell plugs in through the `WindowBackend` seam and the
//! environment-derived `Config`.

pub mod config;
pub mod error;
pub mod logging;
pub mod notes;
pub mod storage;
