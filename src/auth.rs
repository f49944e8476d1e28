//! Credential model and the remote auth service boundary.

pub mod credential;
pub mod service;

pub use credential::*;
pub use service::*;
