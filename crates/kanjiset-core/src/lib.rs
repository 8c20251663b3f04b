//! Core data structures for kanjiset datasets.
//!
//! This crate defines the record model, the metadata aggregate, content
//! hashing and the error types shared by the container format and the
//! higher-level operations.

pub mod defaults;
pub mod error;
pub mod hash;
pub mod naming;
pub mod types;
