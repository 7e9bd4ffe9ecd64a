//! Macroscope: meal and hydration logging with a best-effort mirror into
//! an external health ledger.
//!
//! The local store is authoritative. Two interchangeable backends (SQLite
//! and a flat key-value fallback) sit behind one repository contract;
//! writes are mirrored outward with deterministic client identifiers so
//! re-syncs upsert instead of duplicating.

pub mod analysis;
pub mod commands;
pub mod config;
pub mod db;
pub mod health;
pub mod models;
