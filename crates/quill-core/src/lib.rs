//! # Quill Core
//!
//! The domain layer of the Quill post service.
//! This crate contains the post model, error types and the ports that
//! infrastructure implements. It has no database or HTTP dependencies.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::{CredentialError, DomainError, RepoError};
