//! # Murmur Common Library
//!
//! Shared code for the murmur survey service:
//! - Database schema initialization and models
//! - Identity anonymization (salted one-way hash)
//! - Configuration loading
//! - Common error type

pub mod anonymize;
pub mod config;
pub mod db;
pub mod error;

pub use anonymize::Anonymizer;
pub use error::{Error, Result};
