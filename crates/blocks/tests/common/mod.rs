#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use wds_blocks::block::{
    Attributes, BlockDecorator, BlockTypeRegistry, NoopDecorator, RecentPostsBlock,
    RenderSettings, recent_posts,
};
use wds_blocks::content::{
    Attachment, AttachmentId, ImageSize, InMemoryPostStore, PostQuery, PostRecord, PostStore,
    StoreError, StoredAttachment, StoredPost,
};
use wds_blocks::html::Markup;
use wds_blocks::locale::LocaleService;
use wds_blocks::routes;
use wds_blocks::state::AppState;

/// Publish timestamp `day` days into March 2024, at 09:30 UTC.
pub fn march(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap()
}

/// Three published posts (one untitled, one with a featured image) and a draft.
pub fn sample_store() -> InMemoryPostStore {
    let store = InMemoryPostStore::new();

    let mut hello = StoredPost::new(1, "Hello world", march(1));
    hello.categories = vec![2];
    hello.tags = vec![7];
    store.insert_post(hello);

    let mut editor = StoredPost::new(2, "Shipping <the> editor & more", march(5));
    editor.categories = vec![3];
    editor.tags = vec![7, 9];
    editor.featured_image = Some(10);
    store.insert_post(editor);

    let mut untitled = StoredPost::new(3, "", march(8));
    untitled.title = None;
    untitled.categories = vec![2];
    store.insert_post(untitled);

    let mut draft = StoredPost::new(4, "Draft notes", march(9));
    draft.status = wds_blocks::content::PostStatus::Draft;
    store.insert_post(draft);

    store.insert_attachment(StoredAttachment {
        id: 10,
        size: ImageSize::MediumLarge,
        url: "https://example.com/uploads/editor-768x512.jpg".to_string(),
        width: Some(768),
        height: Some(512),
        alt: "Editor screenshot".to_string(),
    });

    store
}

/// Store wrapper that records every query it receives.
pub struct RecordingStore {
    inner: InMemoryPostStore,
    queries: Mutex<Vec<PostQuery>>,
}

impl RecordingStore {
    pub fn new(inner: InMemoryPostStore) -> Self {
        Self {
            inner,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<PostQuery> {
        self.queries.lock().clone()
    }

    pub fn last_query(&self) -> PostQuery {
        self.queries.lock().last().cloned().unwrap()
    }
}

#[async_trait]
impl PostStore for RecordingStore {
    async fn recent_posts(&self, query: &PostQuery) -> Result<Vec<PostRecord>, StoreError> {
        self.queries.lock().push(query.clone());
        self.inner.recent_posts(query).await
    }

    async fn attachment_image(
        &self,
        attachment_id: AttachmentId,
        size: ImageSize,
    ) -> Result<Option<Attachment>, StoreError> {
        self.inner.attachment_image(attachment_id, size).await
    }
}

/// Store whose every call fails.
pub struct FailingStore;

#[async_trait]
impl PostStore for FailingStore {
    async fn recent_posts(&self, _query: &PostQuery) -> Result<Vec<PostRecord>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn attachment_image(
        &self,
        _attachment_id: AttachmentId,
        _size: ImageSize,
    ) -> Result<Option<Attachment>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Decorator that emits fixed markers and records the attribute bags it saw.
#[derive(Default)]
pub struct RecordingDecorator {
    seen: Mutex<Vec<Attributes>>,
}

impl RecordingDecorator {
    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn last_seen(&self) -> Attributes {
        self.seen.lock().last().cloned().unwrap()
    }
}

impl BlockDecorator for RecordingDecorator {
    fn block_options(&self, attributes: &Attributes) -> Markup {
        self.seen.lock().push(attributes.clone());
        Markup::trusted("<!--options-->")
    }

    fn block_title(&self, attributes: &Attributes) -> Markup {
        self.seen.lock().push(attributes.clone());
        Markup::trusted("<!--title-->")
    }
}

/// Registry holding only the recent-posts block over `store`.
pub fn registry_with(
    store: Arc<dyn PostStore>,
    decorator: Arc<dyn BlockDecorator>,
    locale: Arc<LocaleService>,
    settings: RenderSettings,
) -> BlockTypeRegistry {
    let mut registry = BlockTypeRegistry::new();
    recent_posts::register(
        &mut registry,
        RecentPostsBlock::new(store, decorator, locale, settings),
    );
    registry
}

/// Registry over `store` with no decoration and default settings.
pub fn plain_registry(store: Arc<dyn PostStore>) -> BlockTypeRegistry {
    registry_with(
        store,
        Arc::new(NoopDecorator),
        Arc::new(LocaleService::new()),
        RenderSettings::default(),
    )
}

/// Convert a `json!` object literal into an attribute bag.
pub fn attrs(value: Value) -> Attributes {
    value.as_object().cloned().unwrap()
}

/// Number of non-overlapping occurrences of `needle`.
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Test application over the real routes, backed by the sample store.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_registry(plain_registry(Arc::new(sample_store())))
    }

    pub fn with_registry(registry: BlockTypeRegistry) -> Self {
        let state = AppState::from_parts(registry, None);
        Self {
            router: routes::app(state.clone()),
            state,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET `uri`, returning status and body text.
    pub async fn get(&self, uri: &str) -> (u16, String) {
        let response = self
            .request(Request::get(uri).body(Body::empty()).unwrap())
            .await;
        into_parts(response).await
    }

    /// POST a JSON body to `uri`, returning status and body text.
    pub async fn post_json(&self, uri: &str, body: &Value) -> (u16, String) {
        let response = self
            .request(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        into_parts(response).await
    }
}

async fn into_parts(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}
