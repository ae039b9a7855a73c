use std::{collections::BTreeMap, fs::File, io, path::Path};

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    doc_id::DocumentId,
    error::{Error, Result},
};

/// Label given to every document when the input has no label data.
pub const UNLABELED: &str = "no_label";

/// Field delimiter used by input and exported files.
pub const DEFAULT_DELIMITER: u8 = b';';

/// One row of the input table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub label: String,
    /// Coordinate cells as they appeared in the input, written back on
    /// export.
    #[serde(skip)]
    pub raw_x: String,
    #[serde(skip)]
    pub raw_y: String,
    /// Values of columns the tool does not interpret, in input order.
    #[serde(skip)]
    pub extra: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    X,
    Y,
    Text,
    Label,
    Extra(usize),
}

/// In-memory table of documents loaded from a delimited file.
///
/// The store is the only place labels are mutated. `documents[i].id` is
/// always `DocumentId(i)`.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    delimiter: u8,
    headers: Vec<String>,
    layout: Vec<Column>,
    documents: Vec<Document>,
}

impl DocumentStore {
    pub fn load(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path)?;
        let store = Self::from_reader(file, delimiter)?;
        info!(
            path = %path.display(),
            documents = store.len(),
            "loaded document table"
        );
        Ok(store)
    }

    pub fn from_reader<R: io::Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let mut headers: Vec<String> =
            rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut layout = Vec::with_capacity(headers.len() + 1);
        let mut extra_count = 0;
        for name in &headers {
            let column = match name.as_str() {
                "x" if !layout.contains(&Column::X) => Column::X,
                "y" if !layout.contains(&Column::Y) => Column::Y,
                "text" if !layout.contains(&Column::Text) => Column::Text,
                "label" if !layout.contains(&Column::Label) => Column::Label,
                _ => {
                    extra_count += 1;
                    Column::Extra(extra_count - 1)
                }
            };
            layout.push(column);
        }

        for (column, name) in
            [(Column::X, "x"), (Column::Y, "y"), (Column::Text, "text")]
        {
            if !layout.contains(&column) {
                return Err(Error::MissingColumn(name));
            }
        }

        let has_label = layout.contains(&Column::Label);
        if !has_label {
            debug!("input has no label column, using '{UNLABELED}'");
            headers.push("label".to_string());
            layout.push(Column::Label);
        }

        let mut documents = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let mut doc = Document {
                id: DocumentId::from_row(row),
                x: 0.0,
                y: 0.0,
                text: String::new(),
                label: UNLABELED.to_string(),
                raw_x: String::new(),
                raw_y: String::new(),
                extra: Vec::with_capacity(extra_count),
            };

            for (i, column) in layout.iter().enumerate() {
                let Some(value) = record.get(i) else {
                    continue;
                };
                match column {
                    Column::X => {
                        doc.x = parse_coordinate(value, row, "x")?;
                        doc.raw_x = value.to_string();
                    }
                    Column::Y => {
                        doc.y = parse_coordinate(value, row, "y")?;
                        doc.raw_y = value.to_string();
                    }
                    Column::Text => doc.text = value.to_string(),
                    Column::Label => doc.label = value.to_string(),
                    Column::Extra(_) => doc.extra.push(value.to_string()),
                }
            }

            documents.push(doc);
        }

        Ok(Self {
            delimiter,
            headers,
            layout,
            documents,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.index())
    }

    /// Delimiter the input was read with; exports reuse it.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Column names written on export, in output order. Never includes the
    /// document id.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Sorted, deduplicated labels currently assigned to documents.
    pub fn distinct_labels(&self) -> Vec<String> {
        self.label_counts().into_keys().collect()
    }

    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for doc in &self.documents {
            *counts.entry(doc.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Set `label` on every document in `ids`.
    ///
    /// Either every id resolves and all of them are updated, or an unknown
    /// id is reported and nothing changes. Returns the number of distinct
    /// documents labeled.
    pub fn apply_label(
        &mut self,
        ids: &[DocumentId],
        label: &str,
    ) -> Result<usize> {
        let mut unique = ids.to_vec();
        unique.sort_unstable();
        unique.dedup();

        if let Some(missing) =
            unique.iter().find(|id| id.index() >= self.documents.len())
        {
            return Err(Error::NotFound {
                kind: "document",
                name: missing.to_string(),
            });
        }

        for id in &unique {
            self.documents[id.index()].label = label.to_string();
        }

        info!(count = unique.len(), label, "applied label");
        Ok(unique.len())
    }

    /// Field values of `doc` aligned with [`headers`](Self::headers).
    pub fn record(&self, doc: &Document) -> Vec<String> {
        self.layout
            .iter()
            .map(|column| match column {
                Column::X => doc.raw_x.clone(),
                Column::Y => doc.raw_y.clone(),
                Column::Text => doc.text.clone(),
                Column::Label => doc.label.clone(),
                Column::Extra(i) => {
                    doc.extra.get(*i).cloned().unwrap_or_default()
                }
            })
            .collect()
    }
}

fn parse_coordinate(
    value: &str,
    row: usize,
    column: &'static str,
) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidCoordinate {
            row: row + 1,
            column,
            value: value.to_string(),
        })
}
