//! Git abstraction layer for covmerge.
//!
//! This crate defines the [`GitRepo`] trait: the single interface through
//! which the other covmerge crates read historical file content. No covmerge
//! crate should import gix directly; instead, they depend on `covmerge-git`
//! and program against the trait.
//!
//! # Crate layout
//!
//! - [`repo`]: the [`GitRepo`] trait definition.
//! - [`types`]: value types used in trait signatures ([`GitOid`]).
//! - [`error`]: the [`GitError`] enum returned by all trait methods.

pub mod error;
pub mod repo;
pub mod types;

// gix-backed implementation modules
mod gix_repo;
mod objects_impl;

pub use gix_repo::GixRepo;

pub use error::GitError;
pub use repo::GitRepo;
pub use types::GitOid;
