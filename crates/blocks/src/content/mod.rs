//! Post store abstraction.
//!
//! The block renderer never touches storage directly. It issues a single
//! [`PostQuery`] through [`PostStore::recent_posts`] and resolves featured
//! images through [`PostStore::attachment_image`]. Two backends ship:
//! - [`InMemoryPostStore`]: fixtures, tests, and database-less operation
//! - [`PgPostStore`]: PostgreSQL via sqlx, SQL generated by sea-query

mod memory;
mod postgres;
mod query_builder;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::{InMemoryPostStore, PostFixture, StoredAttachment, StoredPost};
pub use postgres::PgPostStore;
pub use query_builder::{AttachmentQueryBuilder, RecentPostsQueryBuilder};

/// Post identifier.
pub type PostId = i64;

/// Taxonomy term identifier (category or tag).
pub type TermId = i64;

/// Attachment (media) identifier.
pub type AttachmentId = i64;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse a direction, case-insensitively. Anything but `asc` sorts descending.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Field the query orders by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    #[default]
    Date,
    Modified,
    Title,
    Name,
    Id,
    Rand,
}

impl OrderBy {
    /// Parse an `orderBy` attribute value.
    ///
    /// Accepts both the short names (`date`, `title`) and the `post_`-prefixed
    /// column names. Unknown fields fall back to ordering by date.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" | "post_date" => Self::Date,
            "modified" | "post_modified" => Self::Modified,
            "title" | "post_title" => Self::Title,
            "name" | "post_name" | "slug" => Self::Name,
            "id" => Self::Id,
            "rand" | "random" => Self::Rand,
            other => {
                tracing::debug!(order_by = %other, "unknown orderBy field, ordering by date");
                Self::Date
            }
        }
    }
}

/// Publication status of a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Publish,
    Draft,
    Pending,
    Private,
    Future,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Future => "future",
        }
    }
}

/// Named image renditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSize {
    Thumbnail,
    Medium,
    MediumLarge,
    Large,
    Full,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thumbnail => "thumbnail",
            Self::Medium => "medium",
            Self::MediumLarge => "medium_large",
            Self::Large => "large",
            Self::Full => "full",
        }
    }
}

/// A request for recent posts.
///
/// An empty id list on either taxonomy means no filter on that taxonomy.
/// When both lists are non-empty a post must match both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub limit: u32,
    pub status: PostStatus,
    pub order: SortOrder,
    pub order_by: OrderBy,
    pub tag_ids: Vec<TermId>,
    pub category_ids: Vec<TermId>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            limit: 5,
            status: PostStatus::Publish,
            order: SortOrder::Desc,
            order_by: OrderBy::Date,
            tag_ids: Vec::new(),
            category_ids: Vec::new(),
        }
    }
}

impl PostQuery {
    /// Whether the query restricts by any taxonomy.
    pub fn has_taxonomy_filter(&self) -> bool {
        !self.tag_ids.is_empty() || !self.category_ids.is_empty()
    }

    /// Requested limit, at least 1. There is no upper bound.
    pub fn effective_limit(&self) -> u32 {
        self.limit.max(1)
    }
}

/// A post as returned by a store query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    /// Raw title. `None` or empty renders a localized placeholder.
    pub title: Option<String>,
    pub permalink: String,
    pub featured_image: Option<AttachmentId>,
    pub published: DateTime<Utc>,
}

/// A resolved image rendition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(default)]
    pub alt: String,
}

/// Errors surfaced by post store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to posts and their media.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Published posts matching the query, in query order.
    async fn recent_posts(&self, query: &PostQuery) -> Result<Vec<PostRecord>, StoreError>;

    /// Resolve an attachment at a named size.
    ///
    /// Backends fall back to the full-size rendition when the requested one
    /// does not exist. `Ok(None)` means the attachment is unknown.
    async fn attachment_image(
        &self,
        attachment_id: AttachmentId,
        size: ImageSize,
    ) -> Result<Option<Attachment>, StoreError>;
}
