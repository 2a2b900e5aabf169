//! Auth-domain models: issued credentials, redacted secrets, and OAuth scope sets.

pub mod scope;
pub mod token;

pub use scope::*;
pub use token::{data::*, secret::*};
