//! PostgreSQL post store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use super::query_builder::{AttachmentQueryBuilder, RecentPostsQueryBuilder};
use super::{
    Attachment, AttachmentId, ImageSize, PostId, PostQuery, PostRecord, PostStore, StoreError,
};

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: Option<String>,
    slug: String,
    published: DateTime<Utc>,
    featured_image_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct AttachmentRow {
    attachment_id: i64,
    url: String,
    width: Option<i32>,
    height: Option<i32>,
    alt: Option<String>,
}

/// Post store over the `post`, `post_term` and `attachment_size` tables.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
    site_url: String,
}

impl PgPostStore {
    /// Create a store. Permalinks are built as `{site_url}/{slug}/`.
    pub fn new(pool: PgPool, site_url: &str) -> Self {
        Self {
            pool,
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    fn permalink(&self, id: PostId, slug: &str) -> String {
        if slug.is_empty() {
            format!("{}/?p={id}", self.site_url)
        } else {
            format!("{}/{slug}/", self.site_url)
        }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn recent_posts(&self, query: &PostQuery) -> Result<Vec<PostRecord>, StoreError> {
        let sql = RecentPostsQueryBuilder::new(query).build();
        debug!(%sql, "recent posts query");

        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| PostRecord {
                permalink: self.permalink(row.id, &row.slug),
                id: row.id,
                title: row.title,
                featured_image: row.featured_image_id,
                published: row.published,
            })
            .collect())
    }

    async fn attachment_image(
        &self,
        attachment_id: AttachmentId,
        size: ImageSize,
    ) -> Result<Option<Attachment>, StoreError> {
        let sql = AttachmentQueryBuilder::new(attachment_id, size).build();

        let row = sqlx::query_as::<_, AttachmentRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Attachment {
            id: row.attachment_id,
            url: row.url,
            width: row.width.and_then(|w| u32::try_from(w).ok()),
            height: row.height.and_then(|h| u32::try_from(h).ok()),
            alt: row.alt.unwrap_or_default(),
        }))
    }
}

