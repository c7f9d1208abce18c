//! Context-aware HTML output.
//!
//! Interpolated values pick their escaping context at the call site:
//! - [`Text`]: element body text
//! - [`Attr`]: quoted attribute values
//! - [`Url`]: `href`/`src` attributes (scheme allow-list, then attribute escaping)
//!
//! Anything already rendered travels as [`Markup`], which is only created
//! from escaped fragments or explicitly trusted strings.

use std::fmt;

use url::Url as ParsedUrl;

/// Schemes accepted in URL attributes. Anything else collapses to an empty URL.
const ALLOWED_SCHEMES: &[&str] = &[
    "http", "https", "ftp", "ftps", "mailto", "news", "irc", "irc6", "ircs", "gopher", "nntp",
    "feed", "telnet", "mms", "rtsp", "sms", "svn", "tel", "fax", "xmpp", "webcal", "urn",
];

/// A fragment of HTML that is safe to emit as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    /// Create an empty fragment.
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Wrap a string the caller has already escaped or fully controls.
    pub fn trusted(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    /// Escape plain text into a fragment.
    pub fn text(text: &str) -> Self {
        Self(escape_html(text))
    }

    /// Append another fragment.
    pub fn push(&mut self, other: &Markup) {
        self.0.push_str(&other.0);
    }

    /// Append plain text, escaping it.
    pub fn push_text(&mut self, text: &str) {
        self.0.push_str(&escape_html(text));
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromIterator<Markup> for Markup {
    fn from_iter<I: IntoIterator<Item = Markup>>(iter: I) -> Self {
        let mut out = Markup::new();
        for fragment in iter {
            out.push(&fragment);
        }
        out
    }
}

/// Element body text. Displays HTML-escaped.
#[derive(Debug, Clone, Copy)]
pub struct Text<'a>(pub &'a str);

impl fmt::Display for Text<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, self.0)
    }
}

/// Quoted attribute value. Displays attribute-escaped.
#[derive(Debug, Clone, Copy)]
pub struct Attr<'a>(pub &'a str);

impl fmt::Display for Attr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, self.0)
    }
}

/// URL attribute value. Displays sanitized, with `&` as `&#038;` and `'` as
/// `&#039;`.
#[derive(Debug, Clone, Copy)]
pub struct Url<'a>(pub &'a str);

impl fmt::Display for Url<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_url_escaped(f, &sanitize_url(self.0))
    }
}

/// Escape text for an HTML element body.
pub fn escape_html(s: &str) -> String {
    Text(s).to_string()
}

/// Escape a value for a double-quoted HTML attribute.
pub fn escape_attr(s: &str) -> String {
    Attr(s).to_string()
}

/// Sanitize and escape a URL for an `href`/`src` attribute.
pub fn escape_url(s: &str) -> String {
    Url(s).to_string()
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let mut last = 0;
    for (i, c) in s.char_indices() {
        let entity = match c {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&#x27;",
            _ => continue,
        };
        f.write_str(&s[last..i])?;
        f.write_str(entity)?;
        last = i + c.len_utf8();
    }
    f.write_str(&s[last..])
}

/// Numeric-entity escaping for sanitized URLs. An existing `&amp;` is
/// treated as a bare `&`, so it is not double-encoded.
fn write_url_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let mut rest = s;
    while let Some(i) = rest.find(['&', '\'']) {
        f.write_str(&rest[..i])?;
        if rest[i..].starts_with('\'') {
            f.write_str("&#039;")?;
            rest = &rest[i + 1..];
        } else {
            f.write_str("&#038;")?;
            let after = &rest[i + 1..];
            rest = after.strip_prefix("amp;").unwrap_or(after);
        }
    }
    f.write_str(rest)
}

/// Normalize a URL for output.
///
/// Strips characters that never belong in a URL, encodes spaces, rejects
/// disallowed schemes (`javascript:`, `data:`, ...) and prefixes bare
/// host-like values with `http://`. Relative paths, queries and fragments
/// pass through.
fn sanitize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let cleaned: String = trimmed
        .replace(' ', "%20")
        .chars()
        .filter(|c| is_url_char(*c))
        .collect();

    if cleaned.starts_with('/') || cleaned.starts_with('#') || cleaned.starts_with('?') {
        return cleaned;
    }

    match ParsedUrl::parse(&cleaned) {
        Ok(parsed) => {
            if ALLOWED_SCHEMES.contains(&parsed.scheme()) {
                cleaned
            } else {
                String::new()
            }
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if cleaned.contains(':') {
                String::new()
            } else {
                format!("http://{cleaned}")
            }
        }
        Err(_) => String::new(),
    }
}

fn is_url_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || (!c.is_ascii() && !c.is_control() && !c.is_whitespace())
        || "-~+_.?#=!&;,/:%@$|*'()[]".contains(c)
}
