// src/site/mod.rs

//! Site content model.
//!
//! - [`entity`] defines fragments, layouts and posts together with their
//!   immutable identity keys.
//! - [`store`] is the entity cache: one unique-keyed store per kind,
//!   bundled into an explicitly constructed [`SiteStore`].
//! - [`paths`] derives post identities and output locations from file names.
//! - [`loader`] reads and parses source files into entities.

pub mod entity;
pub mod loader;
pub mod paths;
pub mod store;

pub use entity::{Entity, Fragment, Layout, Metadata, Post, PostKey};
pub use loader::SourceLoader;
pub use store::{EntityStore, SiteStore};
