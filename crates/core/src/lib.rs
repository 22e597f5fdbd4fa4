//! Punchcard Core - Shared types library.
//!
//! This crate provides common types used across all Punchcard components:
//! - `server` - The loyalty-card web application
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and usernames, plus the
//!   reward progress computation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
