use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest title the `posts.title` column accepts.
pub const MAX_TITLE_LEN: usize = 255;

/// Post entity - a titled text record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a post. Storage assigns the id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

impl NewPost {
    pub fn new(title: String, content: String) -> Result<Self, DomainError> {
        validate_title(&title)?;
        Ok(Self { title, content })
    }
}

/// Validated replacement of an existing post's title and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostChanges {
    pub id: i32,
    pub title: String,
    pub content: String,
}

impl PostChanges {
    pub fn new(id: i32, title: String, content: String) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::Validation(format!(
                "post id must be positive, got {id}"
            )));
        }
        validate_title(&title)?;
        Ok(Self { id, title, content })
    }
}

fn validate_title(title: &str) -> Result<(), DomainError> {
    if title.trim().is_empty() {
        return Err(DomainError::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(DomainError::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}
