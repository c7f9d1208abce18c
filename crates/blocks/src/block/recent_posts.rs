//! Server-side rendering of the `wds/recent-posts` block.
//!
//! One render issues a single store query, resolves each post's featured
//! image, and emits:
//!
//! ```text
//! <!-- wp:wds/recent-posts -->
//! <section class="wp-block-wds-recent-posts">
//!   {block options}{block title}
//!   <ul class="align{align}[ is-grid columns-{n}]">
//!     <li>{thumbnail}<a href="{permalink}"><h3>{title}</h3></a>[<time ...>]</li>
//!   </ul>
//! </section>
//! <!-- /wp:wds/recent-posts -->
//! ```
//!
//! Store failures degrade to an empty list; rendering never fails.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::decorator::BlockDecorator;
use super::taxonomy::TaxonomyFilter;
use super::types::{
    AttributeDefinition, AttributeSchema, AttributeType, Attributes, BlockTypeDefinition,
    BlockTypeRegistry, RenderCallback,
};
use crate::content::{
    Attachment, ImageSize, OrderBy, PostQuery, PostRecord, PostStatus, PostStore, SortOrder,
};
use crate::html::{Attr, Markup, Text, Url};
use crate::locale::LocaleService;

/// Registered block name.
pub const BLOCK_NAME: &str = "wds/recent-posts";

/// Placeholder for posts without a title, before translation.
pub const UNTITLED: &str = "(Untitled)";

/// Class on each `<time>` element.
const DATE_CLASS: &str = "wp-block-wds-recent-posts__post-date";

/// Machine-readable date format (ISO 8601 with offset).
const MACHINE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

const DEFAULT_POSTS_TO_SHOW: u32 = 5;
const DEFAULT_COLUMNS: i64 = 3;
const DEFAULT_ALIGN: &str = "center";

/// The block's attribute schema.
pub fn definition() -> BlockTypeDefinition {
    use AttributeType::{Boolean, Number, Object, String};

    let schema = AttributeSchema::new()
        .with("taxonomies", AttributeDefinition::new(String))
        .with(
            "postsToShow",
            AttributeDefinition::new(Number).with_default(DEFAULT_POSTS_TO_SHOW),
        )
        .with("displayPostDate", AttributeDefinition::new(Boolean).with_default(false))
        .with("postLayout", AttributeDefinition::new(String).with_default("list"))
        .with("columns", AttributeDefinition::new(Number).with_default(DEFAULT_COLUMNS))
        .with("align", AttributeDefinition::new(String).with_default(DEFAULT_ALIGN))
        .with("order", AttributeDefinition::new(String).with_default("desc"))
        .with("orderBy", AttributeDefinition::new(String).with_default("date"))
        .with("blockTitle", AttributeDefinition::new(String))
        .with("backgroundType", AttributeDefinition::new(String))
        .with("backgroundImage", AttributeDefinition::new(Object))
        .with("backgroundVideo", AttributeDefinition::new(Object))
        .with("backgroundColor", AttributeDefinition::new(String))
        .with("animationType", AttributeDefinition::new(String))
        .with("textColor", AttributeDefinition::new(String));

    BlockTypeDefinition::new(BLOCK_NAME, schema)
}

/// Register the block with its render callback.
pub fn register(registry: &mut BlockTypeRegistry, block: RecentPostsBlock) {
    registry.register(definition(), Arc::new(block));
}

/// List layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostLayout {
    #[default]
    List,
    Grid,
}

impl PostLayout {
    pub fn parse(value: &str) -> Self {
        if value == "grid" { Self::Grid } else { Self::List }
    }
}

/// Typed view of the attributes this renderer reads.
///
/// Presentational pass-through attributes are left to the decorator.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentPostsAttributes {
    pub taxonomies: TaxonomyFilter,
    pub posts_to_show: u32,
    pub order: SortOrder,
    pub order_by: OrderBy,
    pub display_post_date: bool,
    pub post_layout: PostLayout,
    pub columns: i64,
    pub align: String,
}

impl Default for RecentPostsAttributes {
    fn default() -> Self {
        Self::from_attributes(&Attributes::new())
    }
}

impl RecentPostsAttributes {
    /// Read attributes, tolerating absent or mistyped values.
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let posts_to_show = attributes
            .get("postsToShow")
            .and_then(number)
            .filter(|n| *n >= 1)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
            .unwrap_or(DEFAULT_POSTS_TO_SHOW);

        Self {
            taxonomies: TaxonomyFilter::decode(attributes.get("taxonomies")),
            posts_to_show,
            order: string(attributes, "order").map(SortOrder::parse).unwrap_or_default(),
            order_by: string(attributes, "orderBy").map(OrderBy::parse).unwrap_or_default(),
            display_post_date: attributes
                .get("displayPostDate")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            post_layout: string(attributes, "postLayout")
                .map(PostLayout::parse)
                .unwrap_or_default(),
            columns: attributes
                .get("columns")
                .and_then(number)
                .unwrap_or(DEFAULT_COLUMNS),
            align: string(attributes, "align").unwrap_or(DEFAULT_ALIGN).to_string(),
        }
    }

    /// The store query for these attributes.
    pub fn query(&self) -> PostQuery {
        PostQuery {
            limit: self.posts_to_show,
            status: PostStatus::Publish,
            order: self.order,
            order_by: self.order_by,
            tag_ids: self.taxonomies.tag_ids.clone(),
            category_ids: self.taxonomies.category_ids.clone(),
        }
    }

    /// Classes of the `<ul>` container.
    ///
    /// `columns-N` is emitted for every grid, including the default column
    /// count, and never for a list.
    pub fn container_class(&self) -> String {
        let mut class = format!("align{}", self.align);
        if self.post_layout == PostLayout::Grid {
            class.push_str(" is-grid");
            class.push_str(&format!(" columns-{}", self.columns));
        }
        class
    }
}

fn string<'a>(attributes: &'a Attributes, name: &str) -> Option<&'a str> {
    attributes.get(name).and_then(Value::as_str)
}

/// Integer value of a JSON number or numeric string; fractions truncate.
fn number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    }
}

/// Site-level rendering settings.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// chrono format string for the human-readable date.
    pub date_format: String,
    /// Offset applied to publish timestamps before formatting.
    pub utc_offset: FixedOffset,
    /// Interface language for placeholders.
    pub language: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            date_format: "%B %-d, %Y".to_string(),
            utc_offset: Utc.fix(),
            language: "en".to_string(),
        }
    }
}

impl RenderSettings {
    /// Check that the date format only contains known specifiers.
    pub fn validate_date_format(format: &str) -> Result<(), String> {
        let invalid = chrono::format::StrftimeItems::new(format)
            .any(|item| matches!(item, chrono::format::Item::Error));
        if invalid {
            Err(format!("invalid date format '{format}'"))
        } else {
            Ok(())
        }
    }

    /// Parse a `+HH:MM` / `-HH:MM` offset.
    pub fn parse_utc_offset(value: &str) -> Result<FixedOffset, String> {
        value
            .trim()
            .parse::<FixedOffset>()
            .map_err(|e| format!("invalid UTC offset '{value}': {e}"))
    }
}

/// Render callback for `wds/recent-posts`.
pub struct RecentPostsBlock {
    store: Arc<dyn PostStore>,
    decorator: Arc<dyn BlockDecorator>,
    locale: Arc<LocaleService>,
    settings: RenderSettings,
}

impl RecentPostsBlock {
    pub fn new(
        store: Arc<dyn PostStore>,
        decorator: Arc<dyn BlockDecorator>,
        locale: Arc<LocaleService>,
        settings: RenderSettings,
    ) -> Self {
        Self {
            store,
            decorator,
            locale,
            settings,
        }
    }

    /// Render the block for a prepared attribute bag.
    pub async fn render_attributes(&self, attributes: &Attributes) -> Markup {
        let parsed = RecentPostsAttributes::from_attributes(attributes);
        let query = parsed.query();
        let posts = self.fetch_posts(&query).await;

        let mut items = Markup::new();
        for post in &posts {
            items.push(&self.render_item(post, parsed.display_post_date).await);
        }

        let list = Markup::trusted(format!(
            "<ul class=\"{}\">{items}</ul>",
            Attr(&parsed.container_class())
        ));

        let options = self.decorator.block_options(attributes);
        let title = self.decorator.block_title(attributes);

        Markup::trusted(format!(
            "\n\t<!-- wp:wds/recent-posts -->\n\t<section class=\"wp-block-wds-recent-posts\">\n\t{options}\n\t\t{title}{list}\n\t</section>\n\t<!-- /wp:wds/recent-posts -->\n\n\t"
        ))
    }

    async fn fetch_posts(&self, query: &PostQuery) -> Vec<PostRecord> {
        match self.store.recent_posts(query).await {
            Ok(posts) => {
                debug!(
                    limit = query.limit,
                    filtered = query.has_taxonomy_filter(),
                    found = posts.len(),
                    "recent posts fetched"
                );
                posts
            }
            Err(e) => {
                warn!(error = %e, "recent posts query failed; rendering empty list");
                Vec::new()
            }
        }
    }

    async fn render_item(&self, post: &PostRecord, display_post_date: bool) -> Markup {
        let title = match post.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => self.locale.translate(UNTITLED, "", &self.settings.language),
        };

        let thumbnail = self.thumbnail(post).await;

        let mut item = format!(
            "<li>{thumbnail}<a href=\"{}\"><h3>{}</h3></a>",
            Url(&post.permalink),
            Text(&title)
        );

        if display_post_date {
            item.push_str(self.render_date(post.published).as_str());
        }

        item.push_str("</li>\n");
        Markup::trusted(item)
    }

    async fn thumbnail(&self, post: &PostRecord) -> Markup {
        let Some(attachment_id) = post.featured_image else {
            return Markup::new();
        };

        match self
            .store
            .attachment_image(attachment_id, ImageSize::MediumLarge)
            .await
        {
            Ok(Some(attachment)) => image_markup(&attachment, ImageSize::MediumLarge),
            Ok(None) => Markup::new(),
            Err(e) => {
                warn!(error = %e, post = post.id, attachment = attachment_id, "thumbnail lookup failed");
                Markup::new()
            }
        }
    }

    fn render_date(&self, published: DateTime<Utc>) -> Markup {
        let local = published.with_timezone(&self.settings.utc_offset);

        let machine = local.format(MACHINE_DATE_FORMAT).to_string();
        let mut display = String::new();
        if write!(display, "{}", local.format(&self.settings.date_format)).is_err() {
            display = local.format("%Y-%m-%d").to_string();
        }

        Markup::trusted(format!(
            "<time datetime=\"{}\" class=\"{DATE_CLASS}\">{}</time>",
            Attr(&machine),
            Text(&display)
        ))
    }
}

#[async_trait]
impl RenderCallback for RecentPostsBlock {
    async fn render(&self, attributes: &Attributes) -> Markup {
        self.render_attributes(attributes).await
    }
}

/// `<img>` markup for an attachment rendition.
pub fn image_markup(attachment: &Attachment, size: ImageSize) -> Markup {
    let mut html = String::from("<img");
    if let Some(width) = attachment.width {
        html.push_str(&format!(" width=\"{width}\""));
    }
    if let Some(height) = attachment.height {
        html.push_str(&format!(" height=\"{height}\""));
    }
    let size = size.as_str();
    html.push_str(&format!(
        " src=\"{}\" class=\"attachment-{size} size-{size}\" alt=\"{}\" />",
        Url(&attachment.url),
        Attr(&attachment.alt)
    ));
    Markup::trusted(html)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> Attributes {
        value.as_object().cloned().unwrap()
    }

    fn prepared(value: Value) -> RecentPostsAttributes {
        RecentPostsAttributes::from_attributes(&definition().attributes.apply(&attrs(value)))
    }

    #[test]
    fn schema_matches_declared_attributes() {
        let def = definition();
        assert_eq!(def.name, "wds/recent-posts");
        assert_eq!(def.attributes.len(), 15);

        let posts = def.attributes.get("postsToShow").unwrap();
        assert_eq!(posts.attribute_type, AttributeType::Number);
        assert_eq!(posts.default, Some(json!(5)));

        assert_eq!(def.attributes.get("order").unwrap().default, Some(json!("desc")));
        assert_eq!(def.attributes.get("orderBy").unwrap().default, Some(json!("date")));
        assert_eq!(def.attributes.get("align").unwrap().default, Some(json!("center")));
        assert_eq!(def.attributes.get("postLayout").unwrap().default, Some(json!("list")));
        assert_eq!(def.attributes.get("columns").unwrap().default, Some(json!(3)));
        assert_eq!(def.attributes.get("displayPostDate").unwrap().default, Some(json!(false)));
        assert!(def.attributes.get("taxonomies").unwrap().default.is_none());
        assert_eq!(
            def.attributes.get("backgroundImage").unwrap().attribute_type,
            AttributeType::Object
        );
    }

    #[test]
    fn defaults() {
        let a = prepared(json!({}));
        assert_eq!(a.posts_to_show, 5);
        assert_eq!(a.order, SortOrder::Desc);
        assert_eq!(a.order_by, OrderBy::Date);
        assert!(!a.display_post_date);
        assert_eq!(a.post_layout, PostLayout::List);
        assert_eq!(a.columns, 3);
        assert_eq!(a.align, "center");
        assert!(a.taxonomies.is_empty());
    }

    #[test]
    fn unprepared_bag_uses_same_defaults() {
        assert_eq!(RecentPostsAttributes::default(), prepared(json!({})));
    }

    #[test]
    fn query_from_attributes() {
        let a = prepared(json!({
            "postsToShow": "3",
            "order": "asc",
            "orderBy": "title",
            "taxonomies": r#"{"category":[{"id":2}],"post_tag":[{"id":8}]}"#
        }));
        let query = a.query();
        assert_eq!(query.limit, 3);
        assert_eq!(query.status, PostStatus::Publish);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.order_by, OrderBy::Title);
        assert_eq!(query.category_ids, vec![2]);
        assert_eq!(query.tag_ids, vec![8]);
    }

    #[test]
    fn posts_to_show_bounds() {
        assert_eq!(prepared(json!({ "postsToShow": 0 })).posts_to_show, 5);
        assert_eq!(prepared(json!({ "postsToShow": -1 })).posts_to_show, 5);
        assert_eq!(prepared(json!({ "postsToShow": 1000 })).posts_to_show, 1000);
        assert_eq!(prepared(json!({ "postsToShow": 2.9 })).posts_to_show, 2);
    }

    #[test]
    fn list_layout_class() {
        let a = prepared(json!({ "postLayout": "list", "columns": 4 }));
        assert_eq!(a.container_class(), "aligncenter");
    }

    #[test]
    fn grid_layout_class() {
        let a = prepared(json!({ "postLayout": "grid", "columns": 4, "align": "wide" }));
        assert_eq!(a.container_class(), "alignwide is-grid columns-4");
    }

    #[test]
    fn grid_layout_uses_default_columns() {
        let a = prepared(json!({ "postLayout": "grid" }));
        assert_eq!(a.container_class(), "aligncenter is-grid columns-3");
    }

    #[test]
    fn image_markup_with_dimensions() {
        let attachment = Attachment {
            id: 1,
            url: "https://example.com/a.jpg?x=1&y=2".to_string(),
            width: Some(768),
            height: Some(512),
            alt: "A \"quoted\" alt".to_string(),
        };
        assert_eq!(
            image_markup(&attachment, ImageSize::MediumLarge).as_str(),
            "<img width=\"768\" height=\"512\" src=\"https://example.com/a.jpg?x=1&#038;y=2\" \
             class=\"attachment-medium_large size-medium_large\" alt=\"A &quot;quoted&quot; alt\" />"
        );
    }

    #[test]
    fn image_markup_without_dimensions() {
        let attachment = Attachment {
            id: 1,
            url: "/a.jpg".to_string(),
            width: None,
            height: None,
            alt: String::new(),
        };
        assert_eq!(
            image_markup(&attachment, ImageSize::Full).as_str(),
            "<img src=\"/a.jpg\" class=\"attachment-full size-full\" alt=\"\" />"
        );
    }
}
