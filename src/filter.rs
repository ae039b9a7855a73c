//! Derives the visible subset of documents and the plot data for it.
//!
//! A document is visible when:
//! - no label is selected, or its label is one of the selected labels, and
//! - its text contains every active keyword as a literal, case-sensitive
//!   substring.

use serde::Serialize;

use crate::{
    doc_id::DocumentId,
    store::{Document, DocumentStore},
};

/// Identity attached to every rendered point. Selections and clicks come
/// back with this, never with a display position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointMeta {
    pub text: String,
    pub id: DocumentId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub meta: PointMeta,
}

/// A group of points drawn in one color. `name` is the label when the view
/// is color-encoded, `None` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    pub name: Option<String>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub color_by_label: bool,
    pub traces: Vec<Trace>,
}

impl View {
    pub fn len(&self) -> usize {
        self.traces.iter().map(|t| t.points.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.traces.iter().flat_map(|t| t.points.iter())
    }

    /// Ids of every visible document, sorted.
    pub fn ids(&self) -> Vec<DocumentId> {
        let mut ids: Vec<DocumentId> =
            self.points().map(|p| p.meta.id).collect();
        ids.sort_unstable();
        ids
    }
}

pub fn matches(
    doc: &Document,
    selected_labels: &[String],
    keywords: &[String],
) -> bool {
    if !selected_labels.is_empty() && !selected_labels.contains(&doc.label) {
        return false;
    }
    keywords.iter().all(|kw| doc.text.contains(kw.as_str()))
}

pub fn compute_view(
    store: &DocumentStore,
    selected_labels: &[String],
    keywords: &[String],
) -> View {
    let visible = store
        .documents()
        .iter()
        .filter(|doc| matches(doc, selected_labels, keywords))
        .map(to_point);

    if selected_labels.is_empty() {
        return View {
            color_by_label: false,
            traces: vec![Trace {
                name: None,
                points: visible.collect(),
            }],
        };
    }

    // One trace per label, in order of first appearance.
    let mut traces: Vec<Trace> = Vec::new();
    for point in visible {
        match traces
            .iter_mut()
            .find(|t| t.name.as_deref() == Some(point.label.as_str()))
        {
            Some(trace) => trace.points.push(point),
            None => traces.push(Trace {
                name: Some(point.label.clone()),
                points: vec![point],
            }),
        }
    }

    View {
        color_by_label: true,
        traces,
    }
}

fn to_point(doc: &Document) -> Point {
    Point {
        x: doc.x,
        y: doc.y,
        label: doc.label.clone(),
        meta: PointMeta {
            text: doc.text.clone(),
            id: doc.id,
        },
    }
}
