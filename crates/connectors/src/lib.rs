//! External systems the fulfillment engine talks to.
//!
//! Each system is an async trait; an in-memory implementation of every
//! trait ships alongside it for tests and local runs.

pub mod cloud;
pub mod error;
pub mod notify;
pub mod onboarding;
pub mod store;
pub mod ticketing;

pub use cloud::*;
pub use error::*;
pub use notify::*;
pub use onboarding::*;
pub use store::*;
pub use ticketing::*;
