//! HTTP middleware: sessions and auth extractors.

pub mod auth;
pub mod session;
