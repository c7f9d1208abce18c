//! Block wrapper decoration.
//!
//! Blocks delegate two pieces of their container markup:
//! - block options: background (color, image, video) and animation
//! - block title: the optional heading above the block content
//!
//! Both read the pass-through presentational attributes (`backgroundType`,
//! `backgroundColor`, `backgroundImage`, `backgroundVideo`, `animationType`,
//! `textColor`, `blockTitle`) and nothing else.

use serde_json::Value;

use super::Attributes;
use crate::html::{Attr, Markup, Text, Url};

/// Renders the shared wrapper pieces of a block.
pub trait BlockDecorator: Send + Sync {
    /// Background and animation markup placed first inside the section.
    fn block_options(&self, attributes: &Attributes) -> Markup;

    /// Title markup placed before the block content.
    fn block_title(&self, attributes: &Attributes) -> Markup;
}

/// Emits nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDecorator;

impl BlockDecorator for NoopDecorator {
    fn block_options(&self, _attributes: &Attributes) -> Markup {
        Markup::new()
    }

    fn block_title(&self, _attributes: &Attributes) -> Markup {
        Markup::new()
    }
}

/// Standard container decoration.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerDecorator;

impl ContainerDecorator {
    fn background(&self, attributes: &Attributes) -> Markup {
        match str_attr(attributes, "backgroundType") {
            Some("color") => {
                let Some(color) = str_attr(attributes, "backgroundColor").filter(|c| is_css_color(c))
                else {
                    return Markup::new();
                };
                Markup::trusted(format!(
                    "<div class=\"block-background background-color\" style=\"background-color: {};\" aria-hidden=\"true\"></div>",
                    Attr(color)
                ))
            }
            Some("image") => {
                let Some(url) = media_url(attributes, "backgroundImage") else {
                    return Markup::new();
                };
                Markup::trusted(format!(
                    "<div class=\"block-background background-image\" aria-hidden=\"true\"><img src=\"{}\" alt=\"\" /></div>",
                    Url(url)
                ))
            }
            Some("video") => {
                let Some(url) = media_url(attributes, "backgroundVideo") else {
                    return Markup::new();
                };
                let mime = attributes
                    .get("backgroundVideo")
                    .and_then(|v| v.get("mime"))
                    .and_then(Value::as_str)
                    .unwrap_or("video/mp4");
                Markup::trusted(format!(
                    "<div class=\"block-background background-video\" aria-hidden=\"true\"><video autoplay muted loop playsinline><source src=\"{}\" type=\"{}\" /></video></div>",
                    Url(url),
                    Attr(mime)
                ))
            }
            _ => Markup::new(),
        }
    }
}

impl BlockDecorator for ContainerDecorator {
    fn block_options(&self, attributes: &Attributes) -> Markup {
        let mut markup = self.background(attributes);

        let animation = str_attr(attributes, "animationType");
        let text_color = str_attr(attributes, "textColor").filter(|c| is_css_color(c));
        if animation.is_some() || text_color.is_some() {
            let mut options = String::from("<span class=\"block-options\" hidden");
            if let Some(animation) = animation {
                options.push_str(&format!(" data-animation=\"{}\"", Attr(animation)));
            }
            if let Some(color) = text_color {
                options.push_str(&format!(" data-text-color=\"{}\"", Attr(color)));
            }
            options.push_str("></span>");
            markup.push(&Markup::trusted(options));
        }

        markup
    }

    fn block_title(&self, attributes: &Attributes) -> Markup {
        match str_attr(attributes, "blockTitle") {
            Some(title) => Markup::trusted(format!(
                "<header class=\"block-title\"><h2>{}</h2></header>",
                Text(title)
            )),
            None => Markup::new(),
        }
    }
}

/// Non-empty string attribute.
fn str_attr<'a>(attributes: &'a Attributes, name: &str) -> Option<&'a str> {
    attributes
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// `url` of a media object attribute (`{"url": "...", ...}`).
fn media_url<'a>(attributes: &'a Attributes, name: &str) -> Option<&'a str> {
    attributes
        .get(name)
        .and_then(|v| v.get("url"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Hex colors (`#fff`, `#ffffff`, `#ffffffff`) and plain color keywords.
fn is_css_color(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
}
