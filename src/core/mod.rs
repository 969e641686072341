//! Core modules for Arborist's journal: storage, configuration and shared types.
//!
//! Everything that touches the database or the filesystem lives here. The
//! engines and robots in `plugins` build on these primitives.

pub mod broker;
pub mod config;
pub mod db;
pub mod entry;
pub mod error;
pub mod gateway;
pub mod schemas;
pub mod store;
pub mod time;
