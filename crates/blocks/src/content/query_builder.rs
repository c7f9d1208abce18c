//! Recent-posts SQL generation using SeaQuery.
//!
//! Tables (see `migrations/`):
//! - `post`: one row per post
//! - `post_term`: post ↔ taxonomy term assignments
//! - `attachment_size`: one row per attachment rendition

use sea_query::{Expr, Iden, Order, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr};

use super::{AttachmentId, ImageSize, OrderBy, PostQuery, SortOrder, TermId};

/// Taxonomy name for tags in `post_term.taxonomy`.
pub const TAXONOMY_TAG: &str = "post_tag";

/// Taxonomy name for categories in `post_term.taxonomy`.
pub const TAXONOMY_CATEGORY: &str = "category";

#[derive(Iden)]
enum Post {
    Table,
    Id,
    Title,
    Slug,
    Status,
    Published,
    Modified,
    FeaturedImageId,
}

#[derive(Iden)]
enum PostTerm {
    Table,
    PostId,
    TermId,
    Taxonomy,
}

#[derive(Iden)]
enum AttachmentSize {
    Table,
    AttachmentId,
    Size,
    Url,
    Width,
    Height,
    Alt,
}

/// Builds the single SELECT issued for a recent-posts render.
pub struct RecentPostsQueryBuilder<'a> {
    query: &'a PostQuery,
}

impl<'a> RecentPostsQueryBuilder<'a> {
    pub fn new(query: &'a PostQuery) -> Self {
        Self { query }
    }

    /// Build the SELECT as a SQL string with inlined, escaped values.
    pub fn build(&self) -> String {
        self.statement().to_string(PostgresQueryBuilder)
    }

    fn statement(&self) -> SelectStatement {
        let mut select = Query::select();

        select
            .columns([
                (Post::Table, Post::Id),
                (Post::Table, Post::Title),
                (Post::Table, Post::Slug),
                (Post::Table, Post::Published),
                (Post::Table, Post::FeaturedImageId),
            ])
            .from(Post::Table)
            .and_where(Expr::col((Post::Table, Post::Status)).eq(self.query.status.as_str()));

        if let Some(condition) = taxonomy_condition(TAXONOMY_TAG, &self.query.tag_ids) {
            select.and_where(condition);
        }
        if let Some(condition) = taxonomy_condition(TAXONOMY_CATEGORY, &self.query.category_ids) {
            select.and_where(condition);
        }

        self.add_sort(&mut select);
        select.limit(u64::from(self.query.effective_limit()));
        select
    }

    /// ORDER BY the requested field, then by id in the same direction so the
    /// result order is total.
    fn add_sort(&self, select: &mut SelectStatement) {
        let order = match self.query.order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };

        match self.query.order_by {
            OrderBy::Rand => {
                select.order_by_expr(Expr::cust("RANDOM()"), Order::Asc);
                return;
            }
            OrderBy::Date => {
                select.order_by((Post::Table, Post::Published), order.clone());
            }
            OrderBy::Modified => {
                select.order_by((Post::Table, Post::Modified), order.clone());
            }
            OrderBy::Title => {
                select.order_by_expr(
                    Expr::cust("LOWER(COALESCE(\"post\".\"title\", ''))"),
                    order.clone(),
                );
            }
            OrderBy::Name => {
                select.order_by((Post::Table, Post::Slug), order.clone());
            }
            OrderBy::Id => {}
        }
        select.order_by((Post::Table, Post::Id), order);
    }
}

/// `post.id IN (SELECT post_id FROM post_term WHERE taxonomy = .. AND term_id IN (..))`
///
/// Returns `None` for an empty id list: no filter, never match-nothing.
fn taxonomy_condition(taxonomy: &str, term_ids: &[TermId]) -> Option<SimpleExpr> {
    if term_ids.is_empty() {
        return None;
    }

    let subquery = Query::select()
        .column(PostTerm::PostId)
        .from(PostTerm::Table)
        .and_where(Expr::col(PostTerm::Taxonomy).eq(taxonomy))
        .and_where(Expr::col(PostTerm::TermId).is_in(term_ids.iter().copied()))
        .to_owned();

    Some(Expr::col((Post::Table, Post::Id)).in_subquery(subquery))
}

/// Builds the lookup of one attachment rendition, preferring the requested
/// size and falling back to `full`.
pub struct AttachmentQueryBuilder {
    attachment_id: AttachmentId,
    size: ImageSize,
}

impl AttachmentQueryBuilder {
    pub fn new(attachment_id: AttachmentId, size: ImageSize) -> Self {
        Self {
            attachment_id,
            size,
        }
    }

    pub fn build(&self) -> String {
        Query::select()
            .columns([
                AttachmentSize::AttachmentId,
                AttachmentSize::Url,
                AttachmentSize::Width,
                AttachmentSize::Height,
                AttachmentSize::Alt,
            ])
            .from(AttachmentSize::Table)
            .and_where(Expr::col(AttachmentSize::AttachmentId).eq(self.attachment_id))
            .and_where(
                Expr::col(AttachmentSize::Size)
                    .is_in([self.size.as_str(), ImageSize::Full.as_str()]),
            )
            .order_by_expr(
                Expr::col(AttachmentSize::Size).eq(self.size.as_str()),
                Order::Desc,
            )
            .limit(1)
            .to_string(PostgresQueryBuilder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_filters_only_status() {
        let query = PostQuery::default();
        let sql = RecentPostsQueryBuilder::new(&query).build();

        assert!(sql.contains("FROM \"post\""));
        assert!(sql.contains("\"post\".\"status\" = 'publish'"));
        assert!(!sql.contains("post_term"), "no taxonomy subquery expected: {sql}");
        assert!(sql.contains("ORDER BY \"post\".\"published\" DESC, \"post\".\"id\" DESC"));
        assert!(sql.contains("LIMIT 5"));
    }

    #[test]
    fn tag_filter_uses_subquery() {
        let query = PostQuery {
            tag_ids: vec![3, 4],
            ..Default::default()
        };
        let sql = RecentPostsQueryBuilder::new(&query).build();

        assert!(sql.contains("\"post\".\"id\" IN (SELECT \"post_id\" FROM \"post_term\""));
        assert!(sql.contains("\"taxonomy\" = 'post_tag'"));
        assert!(sql.contains("\"term_id\" IN (3, 4)"));
        assert!(!sql.contains("'category'"));
    }

    #[test]
    fn both_taxonomies_are_anded() {
        let query = PostQuery {
            tag_ids: vec![3],
            category_ids: vec![9],
            ..Default::default()
        };
        let sql = RecentPostsQueryBuilder::new(&query).build();

        assert!(sql.contains("'post_tag'"));
        assert!(sql.contains("'category'"));
        assert_eq!(sql.matches("IN (SELECT").count(), 2);
        assert!(sql.contains(") AND \"post\".\"id\" IN (SELECT"));
    }

    #[test]
    fn ascending_title_order() {
        let query = PostQuery {
            order: SortOrder::Asc,
            order_by: OrderBy::Title,
            ..Default::default()
        };
        let sql = RecentPostsQueryBuilder::new(&query).build();
        assert!(sql.contains("LOWER(COALESCE(\"post\".\"title\", '')) ASC"));
        assert!(sql.contains("\"post\".\"id\" ASC"));
    }

    #[test]
    fn random_order_has_no_tiebreak() {
        let query = PostQuery {
            order_by: OrderBy::Rand,
            ..Default::default()
        };
        let sql = RecentPostsQueryBuilder::new(&query).build();
        assert!(sql.contains("ORDER BY RANDOM() ASC"));
        assert!(!sql.contains("\"post\".\"id\" DESC"));
    }

    #[test]
    fn limit_is_passed_through() {
        let query = PostQuery {
            limit: 10_000,
            ..Default::default()
        };
        let sql = RecentPostsQueryBuilder::new(&query).build();
        assert!(sql.contains("LIMIT 10000"));
    }

    #[test]
    fn attachment_lookup_prefers_requested_size() {
        let sql = AttachmentQueryBuilder::new(12, ImageSize::MediumLarge).build();
        assert!(sql.contains("FROM \"attachment_size\""));
        assert!(sql.contains("\"attachment_id\" = 12"));
        assert!(sql.contains("\"size\" IN ('medium_large', 'full')"));
        assert!(sql.contains("ORDER BY \"size\" = 'medium_large' DESC"));
        assert!(sql.contains("LIMIT 1"));
    }
}
