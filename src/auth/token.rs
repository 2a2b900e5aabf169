//! Issued OAuth credentials and the secret wrapper that keeps them out of logs.

pub mod data;
pub mod secret;
