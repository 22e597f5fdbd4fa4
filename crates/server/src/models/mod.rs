//! Domain models shared across routes and services.

pub mod account;
pub mod session;
