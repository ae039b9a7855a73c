//! Plain-text and JSON output for views, banners and session state.

use std::io::{self, Write};

use serde::Serialize;

use crate::{
    filter::View,
    session::{Banner, BannerKind, InspectorState, SessionSummary},
    store::DocumentStore,
};

/// Maximum characters of document text shown per point line.
pub const SNIPPET_MAX_CHARS: usize = 60;

/// First line of `text`, cut to at most `max_chars` characters.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let mut out: String = first_line.chars().take(max_chars).collect();
    if first_line.chars().count() > max_chars || text.lines().nth(1).is_some()
    {
        out.push_str("...");
    }
    out
}

pub fn write_view<W: Write>(out: &mut W, view: &View) -> io::Result<()> {
    if view.is_empty() {
        return writeln!(out, "No documents match the current filters.");
    }

    for trace in &view.traces {
        if let Some(name) = &trace.name {
            writeln!(out, "== {name} ({})", trace.points.len())?;
        }
        for p in &trace.points {
            writeln!(
                out,
                "{:>6}  ({:.3}, {:.3})  [{}]  {}",
                p.meta.id.to_string(),
                p.x,
                p.y,
                p.label,
                snippet(&p.meta.text, SNIPPET_MAX_CHARS)
            )?;
        }
    }
    writeln!(out, "\n{} document(s)", view.len())
}

pub fn write_json<W: Write, T: Serialize>(
    out: &mut W,
    value: &T,
) -> io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)
}

pub fn write_banner<W: Write>(out: &mut W, banner: &Banner) -> io::Result<()> {
    let tag = match banner.kind {
        BannerKind::Success => "ok",
        BannerKind::Warning => "warning",
        BannerKind::Error => "error",
    };
    writeln!(out, "[{tag}] {}", banner.message)
}

pub fn write_inspector<W: Write>(
    out: &mut W,
    inspector: &InspectorState,
) -> io::Result<()> {
    match (inspector.is_open, inspector.document, &inspector.text) {
        (true, Some(id), Some(text)) => {
            writeln!(out, "--- document {id} ---")?;
            writeln!(out, "{text}")?;
            writeln!(out, "---")
        }
        _ => writeln!(out, "(detail closed)"),
    }
}

pub fn write_summary<W: Write>(
    out: &mut W,
    summary: &SessionSummary,
) -> io::Result<()> {
    writeln!(
        out,
        "Documents: {} ({} visible)",
        summary.documents, summary.visible
    )?;
    writeln!(out, "Labels: {}", summary.labels.join(", "))?;
    if !summary.label_filter.is_empty() {
        writeln!(out, "Label filter: {}", summary.label_filter.join(", "))?;
    }
    if !summary.keywords.is_empty() {
        let keywords: Vec<String> = summary
            .keywords
            .iter()
            .map(|item| {
                let mark = if item.checked { 'x' } else { ' ' };
                format!("[{mark}] \"{}\"", item.keyword)
            })
            .collect();
        writeln!(out, "Keywords: {}", keywords.join(" "))?;
    }
    if let Some(label) = &summary.assign_label {
        writeln!(out, "Assign label: {label}")?;
    }
    if !summary.selection.is_empty() {
        writeln!(out, "Selected: {} point(s)", summary.selection.len())?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct StoreStatus<'a> {
    pub documents: usize,
    pub columns: &'a [String],
    pub labels: std::collections::BTreeMap<String, usize>,
}

impl<'a> StoreStatus<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self {
            documents: store.len(),
            columns: store.headers(),
            labels: store.label_counts(),
        }
    }
}

pub fn write_status<W: Write>(
    out: &mut W,
    status: &StoreStatus<'_>,
) -> io::Result<()> {
    writeln!(out, "Documents: {}", status.documents)?;
    writeln!(out, "Columns: {}", status.columns.join(";"))?;
    writeln!(out, "Labels: {}", status.labels.len())?;
    for (label, count) in &status.labels {
        writeln!(out, "  {label}: {count}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{filter::compute_view, store::tests::sample_store};

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn snippet_truncates_long_and_multiline_text() {
        assert_eq!(snippet("short", 10), "short");
        assert_eq!(snippet("abcdefghij", 4), "abcd...");
        assert_eq!(snippet("first\nsecond", 20), "first...");
        assert_eq!(snippet("", 5), "");
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        assert_eq!(snippet("ááááá", 2), "áá...");
    }

    #[test]
    fn view_lists_points_with_ids() {
        let store = sample_store();
        let view = compute_view(&store, &["cat".to_string()], &[]);
        let text = render(|out| write_view(out, &view));

        assert!(text.contains("== cat (2)"));
        assert!(text.contains("#0"));
        assert!(text.contains("afoobar"));
        assert!(text.contains("2 document(s)"));
    }

    #[test]
    fn empty_view_message() {
        let store = sample_store();
        let view = compute_view(&store, &[], &["nothing".to_string()]);
        let text = render(|out| write_view(out, &view));
        assert_eq!(text, "No documents match the current filters.\n");
    }

    #[test]
    fn status_lists_label_counts() {
        let store = sample_store();
        let status = StoreStatus::new(&store);
        let text = render(|out| write_status(out, &status));
        assert!(text.contains("Documents: 5"));
        assert!(text.contains("Columns: x;y;text;label"));
        assert!(text.contains("  dog: 2"));
    }

    #[test]
    fn status_json_has_counts() {
        let store = sample_store();
        let text = render(|out| write_json(out, &StoreStatus::new(&store)));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["documents"], 5);
        assert_eq!(value["labels"]["cat"], 2);
    }
}
