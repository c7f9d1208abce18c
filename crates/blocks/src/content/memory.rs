//! In-memory post store.
//!
//! Holds posts and attachment renditions behind a `parking_lot::RwLock`.
//! Used by tests, by `wds-blocks render --fixture`, and by the server when no
//! database is configured.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{
    Attachment, AttachmentId, ImageSize, OrderBy, PostId, PostQuery, PostRecord, PostStatus,
    PostStore, SortOrder, StoreError, TermId,
};

/// A post with the metadata the store filters and sorts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: PostId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: String,
    pub permalink: String,
    #[serde(default)]
    pub status: PostStatus,
    pub published: DateTime<Utc>,
    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<TermId>,
    #[serde(default)]
    pub categories: Vec<TermId>,
    #[serde(default)]
    pub featured_image: Option<AttachmentId>,
}

impl StoredPost {
    /// A published post with no taxonomy terms or featured image.
    pub fn new(id: PostId, title: &str, published: DateTime<Utc>) -> Self {
        let slug = slugify(title, id);
        Self {
            id,
            title: Some(title.to_string()),
            permalink: format!("/{slug}/"),
            slug,
            status: PostStatus::Publish,
            published,
            modified: None,
            tags: Vec::new(),
            categories: Vec::new(),
            featured_image: None,
        }
    }

    fn modified_or_published(&self) -> DateTime<Utc> {
        self.modified.unwrap_or(self.published)
    }

    fn matches(&self, query: &PostQuery) -> bool {
        if self.status != query.status {
            return false;
        }
        if !query.tag_ids.is_empty() && !self.tags.iter().any(|t| query.tag_ids.contains(t)) {
            return false;
        }
        if !query.category_ids.is_empty()
            && !self.categories.iter().any(|c| query.category_ids.contains(c))
        {
            return false;
        }
        true
    }

    fn to_record(&self) -> PostRecord {
        PostRecord {
            id: self.id,
            title: self.title.clone(),
            permalink: self.permalink.clone(),
            featured_image: self.featured_image,
            published: self.published,
        }
    }
}

/// One rendition of an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttachment {
    pub id: AttachmentId,
    pub size: ImageSize,
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub alt: String,
}

/// Serialized store contents, as read from a fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostFixture {
    #[serde(default)]
    pub posts: Vec<StoredPost>,
    #[serde(default)]
    pub attachments: Vec<StoredAttachment>,
}

#[derive(Debug, Default)]
struct Inner {
    posts: Vec<StoredPost>,
    attachments: HashMap<(AttachmentId, ImageSize), StoredAttachment>,
}

/// Post store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryPostStore {
    inner: RwLock<Inner>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from fixture data.
    pub fn from_fixture(fixture: PostFixture) -> Self {
        let store = Self::new();
        for post in fixture.posts {
            store.insert_post(post);
        }
        for attachment in fixture.attachments {
            store.insert_attachment(attachment);
        }
        store
    }

    /// Parse a JSON fixture (`{"posts": [...], "attachments": [...]}`).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let fixture: PostFixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    /// Insert a post, replacing any post with the same id.
    pub fn insert_post(&self, post: StoredPost) {
        let mut inner = self.inner.write();
        inner.posts.retain(|p| p.id != post.id);
        inner.posts.push(post);
    }

    /// Insert an attachment rendition, replacing the same id and size.
    pub fn insert_attachment(&self, attachment: StoredAttachment) {
        self.inner
            .write()
            .attachments
            .insert((attachment.id, attachment.size), attachment);
    }

    pub fn post_count(&self) -> usize {
        self.inner.read().posts.len()
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn recent_posts(&self, query: &PostQuery) -> Result<Vec<PostRecord>, StoreError> {
        let inner = self.inner.read();
        let mut matching: Vec<&StoredPost> = inner.posts.iter().filter(|p| p.matches(query)).collect();

        if query.order_by == OrderBy::Rand {
            matching.shuffle(&mut rand::thread_rng());
        } else {
            matching.sort_by(|a, b| {
                let ordering = compare(a, b, query.order_by).then_with(|| a.id.cmp(&b.id));
                match query.order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        Ok(matching
            .into_iter()
            .take(query.effective_limit() as usize)
            .map(StoredPost::to_record)
            .collect())
    }

    async fn attachment_image(
        &self,
        attachment_id: AttachmentId,
        size: ImageSize,
    ) -> Result<Option<Attachment>, StoreError> {
        let inner = self.inner.read();
        let found = inner
            .attachments
            .get(&(attachment_id, size))
            .or_else(|| inner.attachments.get(&(attachment_id, ImageSize::Full)));

        Ok(found.map(|a| Attachment {
            id: a.id,
            url: a.url.clone(),
            width: a.width,
            height: a.height,
            alt: a.alt.clone(),
        }))
    }
}

fn compare(a: &StoredPost, b: &StoredPost, order_by: OrderBy) -> Ordering {
    match order_by {
        OrderBy::Date => a.published.cmp(&b.published),
        OrderBy::Modified => a.modified_or_published().cmp(&b.modified_or_published()),
        OrderBy::Title => a
            .title
            .as_deref()
            .unwrap_or("")
            .to_lowercase()
            .cmp(&b.title.as_deref().unwrap_or("").to_lowercase()),
        OrderBy::Name => a.slug.cmp(&b.slug),
        OrderBy::Id | OrderBy::Rand => Ordering::Equal,
    }
}

fn slugify(title: &str, id: PostId) -> String {
    let slug = title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        id.to_string()
    } else {
        slug
    }
}
