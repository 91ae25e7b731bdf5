//! Drives a disposable container through the lifecycle of a test sandbox:
//! build an image, start a container, bootstrap it with a provisioner, run
//! a verifier against it and tear it down again.
//!
//! ```text
//! DriverConfig ──► dockerfile::synthesize ──┐
//!        │                                   ▼
//!        └──────► commands::* ──► CommandRunner ──► parser::* ──► SessionState
//! ```
//!
//! [`Controller`] ties the pieces together. Everything outside of it, the
//! process runner, the provisioner and the verifier, sits behind the traits
//! in [`services`] so an embedding test framework can supply its own.

pub mod backends;
pub mod commands;
pub mod config;
pub mod controller;
pub mod dockerfile;
pub mod error;
pub mod frontends;
pub mod models;
pub mod parser;
pub mod services;
pub mod state;

pub use controller::Controller;
pub use error::{DriverError, Result};
pub use models::{ContainerId, DriverConfig, ImageId, LoginCommand, SessionState};
