//! Domain entities - the core business objects.

mod credentials;
mod post;

pub use credentials::DatabaseCredentials;
pub use post::{MAX_TITLE_LEN, NewPost, Post, PostChanges};
