//! Checklist export renderers.
//!
//! # Responsibility
//! - Render a materialized checklist as plain text, HTML or JSON.
//!
//! # Invariants
//! - Renderers read the flat list; flat child entries and the parent's
//!   children snapshot are the same items, so HTML nests from the snapshot.
//! - HTML output escapes all user text.

use crate::model::list_item::ListItem;
use crate::repo::checklist_repo::ChecklistNote;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter, Write};

const CHILD_INDENT: &str = "    ";

#[derive(Debug)]
pub enum ExportError {
    Json(serde_json::Error),
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "json export failed: {err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// One line per item: `[ ] body` or `[✓] body`, children indented.
pub fn display_body(items: &[ListItem]) -> String {
    items
        .iter()
        .map(|item| {
            let indent = if item.is_child { CHILD_INDENT } else { "" };
            let mark = if item.checked { "[✓]" } else { "[ ]" };
            format!("{indent}{mark} {}", item.body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Title line, blank line, then [`display_body`].
pub fn to_text(note: &ChecklistNote) -> String {
    if note.title.is_empty() {
        return display_body(&note.items);
    }
    format!("{}\n\n{}", note.title, display_body(&note.items))
}

/// Stand-alone HTML document with a checkbox list.
pub fn to_html(title: &str, items: &[ListItem]) -> String {
    let title = escape_html(title);
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html><head>");
    let _ = write!(out, "<meta charset=\"UTF-8\"><title>{title}</title>");
    out.push_str("</head><body>");
    let _ = write!(out, "<h2>{title}</h2>");

    out.push_str("<ol style=\"list-style: none; padding: 0;\">");
    for parent in items.iter().filter(|item| !item.is_child) {
        push_checkbox(&mut out, parent);
        if !parent.children.is_empty() {
            out.push_str("<ol style=\"list-style: none;\">");
            for child in &parent.children {
                push_checkbox(&mut out, child);
                out.push_str("</li>");
            }
            out.push_str("</ol>");
        }
        out.push_str("</li>");
    }
    out.push_str("</ol></body></html>");
    out
}

/// Pretty JSON with title, save time and the flat item list.
pub fn to_json(note: &ChecklistNote) -> Result<String, ExportError> {
    let value = json!({
        "type": "LIST",
        "title": note.title,
        "updated_at": note.updated_at,
        "items": note.items,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}

fn push_checkbox(out: &mut String, item: &ListItem) {
    let checked = if item.checked { " checked" } else { "" };
    let _ = write!(
        out,
        "<li><input type=\"checkbox\"{checked}>{}",
        escape_html(&item.body)
    );
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{display_body, escape_html};
    use crate::model::list_item::ListItem;

    #[test]
    fn display_body_marks_and_indents() {
        let items = vec![
            ListItem::new(1, "milk").with_children(vec![ListItem::child(2, "oat")]),
            ListItem::child(2, "oat").with_checked(true),
            ListItem::new(3, "bread"),
        ];
        assert_eq!(display_body(&items), "[ ] milk\n    [✓] oat\n[ ] bread");
    }

    #[test]
    fn display_body_of_empty_list_is_empty() {
        assert_eq!(display_body(&[]), "");
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }
}
