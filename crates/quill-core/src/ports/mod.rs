//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod credentials;
mod repository;

pub use credentials::CredentialProvider;
pub use repository::{BaseRepository, PostRepository};
