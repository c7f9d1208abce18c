//! Block types: attribute schemas, registration and server-side rendering.

pub mod decorator;
pub mod recent_posts;
pub mod taxonomy;
pub mod types;

use std::sync::Arc;

use thiserror::Error;

pub use decorator::{BlockDecorator, ContainerDecorator, NoopDecorator};
pub use recent_posts::{RecentPostsAttributes, RecentPostsBlock, RenderSettings};
pub use taxonomy::TaxonomyFilter;
pub use types::{
    AttributeDefinition, AttributeSchema, AttributeType, Attributes, BlockTypeDefinition,
    BlockTypeRegistry, RenderCallback,
};

use crate::content::PostStore;
use crate::locale::LocaleService;

/// Block registry errors.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("unknown block type '{0}'")]
    UnknownBlockType(String),

    #[error("invalid block attributes: {}", .0.join("; "))]
    InvalidAttributes(Vec<String>),
}

/// Registry with every block type this crate provides.
pub fn standard_registry(
    store: Arc<dyn PostStore>,
    locale: Arc<LocaleService>,
    settings: RenderSettings,
) -> BlockTypeRegistry {
    let mut registry = BlockTypeRegistry::new();
    recent_posts::register(
        &mut registry,
        RecentPostsBlock::new(store, Arc::new(ContainerDecorator), locale, settings),
    );
    registry
}
