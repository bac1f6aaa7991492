//! Loading legacy client exports into the new client store.
//!
//! The parser crate turns CSV rows into [`legacy_clients_parser::LegacyClientRecord`]s;
//! this crate decides which of them to keep, groups them into batches and
//! hands each batch to a [`sink::RecordSink`].

pub mod batch;
pub mod config;
pub mod db;
pub mod dedup;
pub mod error;
pub mod ingestion;
pub mod sink;

pub use error::{LoaderError, Result};
