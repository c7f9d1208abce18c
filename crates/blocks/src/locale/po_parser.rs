//! Gettext `.po` catalog parser.
//!
//! Supports `msgctxt`, `msgid`, `msgstr`, plural forms (only `msgstr[0]` is
//! kept), continuation lines and the usual backslash escapes. The header
//! entry (empty `msgid`) and untranslated entries are skipped.

/// One translated catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoEntry {
    pub context: String,
    pub source: String,
    pub translation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Context,
    Source,
    Plural,
    Translation,
    OtherPlural,
}

#[derive(Default)]
struct Pending {
    context: String,
    source: String,
    translation: String,
    field: Option<Field>,
}

impl Pending {
    fn field_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Context => Some(&mut self.context),
            Field::Source => Some(&mut self.source),
            Field::Translation => Some(&mut self.translation),
            Field::Plural | Field::OtherPlural => None,
        }
    }

    fn finish(&mut self, entries: &mut Vec<PoEntry>) {
        let done = std::mem::take(self);
        if !done.source.is_empty() && !done.translation.is_empty() {
            entries.push(PoEntry {
                context: done.context,
                source: done.source,
                translation: done.translation,
            });
        }
    }
}

/// Parse `.po` file contents into translated entries.
pub fn parse_po(content: &str) -> Vec<PoEntry> {
    let mut entries = Vec::new();
    let mut pending = Pending::default();

    for line in content.lines().map(str::trim) {
        if line.is_empty() {
            pending.finish(&mut entries);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        if line.starts_with('"') {
            if let Some(target) = pending.field.and_then(|f| pending.field_mut(f)) {
                target.push_str(&unquote(line));
            }
            continue;
        }

        let Some((keyword, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };

        let field = match keyword {
            "msgctxt" => Field::Context,
            "msgid" => {
                // A msgid without a blank line before it starts a new entry.
                if pending.field == Some(Field::Translation) {
                    pending.finish(&mut entries);
                }
                Field::Source
            }
            "msgid_plural" => Field::Plural,
            "msgstr" | "msgstr[0]" => Field::Translation,
            k if k.starts_with("msgstr[") => Field::OtherPlural,
            _ => continue,
        };

        pending.field = Some(field);
        if let Some(target) = pending.field_mut(field) {
            *target = unquote(rest);
        }
    }

    pending.finish(&mut entries);
    entries
}

/// Strip surrounding quotes and resolve escapes in one pass, so `\\n`
/// stays a literal backslash followed by `n`.
fn unquote(s: &str) -> String {
    let s = s.trim();
    let s = s.strip_prefix('"').unwrap_or(s);
    let s = s.strip_suffix('"').unwrap_or(s);

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries() {
        let entries = parse_po(
            r#"
msgid "(Untitled)"
msgstr "(Sans titre)"

msgid "Recent Posts"
msgstr "Articles récents"
"#,
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].source, "(Untitled)");
        assert_eq!(entries[0].translation, "(Sans titre)");
        assert_eq!(entries[1].translation, "Articles récents");
    }

    #[test]
    fn skips_header_and_untranslated() {
        let entries = parse_po(
            r#"
msgid ""
msgstr ""
"Content-Type: text/plain; charset=UTF-8\n"

msgid "Untranslated"
msgstr ""

msgid "Translated"
msgstr "Übersetzt"
"#,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, "Translated");
    }

    #[test]
    fn context_and_continuations() {
        let entries = parse_po(
            r#"
# translator comment
msgctxt "block"
msgid ""
"Recent "
"Posts"
msgstr ""
"Entradas "
"recientes""#,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].context, "block");
        assert_eq!(entries[0].source, "Recent Posts");
        assert_eq!(entries[0].translation, "Entradas recientes");
    }

    #[test]
    fn plural_keeps_first_form() {
        let entries = parse_po(
            r#"
msgid "%d post"
msgid_plural "%d posts"
msgstr[0] "%d article"
msgstr[1] "%d articles"
"#,
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].source, "%d post");
        assert_eq!(entries[0].translation, "%d article");
    }

    #[test]
    fn entries_without_blank_separator() {
        let entries = parse_po("msgid \"A\"\nmsgstr \"a\"\nmsgid \"B\"\nmsgstr \"b\"\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].source, "B");
    }

    #[test]
    fn escapes() {
        assert_eq!(unquote(r#""a\nb""#), "a\nb");
        assert_eq!(unquote(r#""a\\nb""#), "a\\nb");
        assert_eq!(unquote(r#""say \"hi\"""#), "say \"hi\"");
    }
}
