// src/exec/mod.rs

//! External process management.
//!
//! The preview HTTP server is not part of this crate; in watch mode the
//! configured `serveCommand` is spawned as a child process via
//! [`preview::PreviewServer`] and killed on shutdown.

pub mod preview;

pub use preview::PreviewServer;
