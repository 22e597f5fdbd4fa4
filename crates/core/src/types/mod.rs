//! Core types for Punchcard.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod progress;
pub mod username;

pub use id::*;
pub use progress::{DEFAULT_STAMPS_FOR_REWARD, RewardProgress};
pub use username::{Username, UsernameError};
