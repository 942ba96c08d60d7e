// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the supervised program,
//! using `tokio::process::Command`, and reporting back to the supervisor via
//! `RuntimeEvent`s.
//!
//! - [`command`] builds the child's argument vector.
//! - [`handle`] is the supervisor's reference to one running child.
//! - [`runner`] runs a single child process (output readers, stdin writer,
//!   kill handling).
//! - [`backend`] provides the `ChildSpawner` trait and the `RealSpawner` used
//!   in production, which tests replace with a fake implementation.

pub mod backend;
pub mod command;
pub mod handle;
pub mod runner;

pub use backend::{ChildSpawner, RealSpawner};
pub use command::ChildCommand;
pub use handle::ChildHandle;
