//! doclabel - manual labeling of documents laid out on a 2D projection.
//!
//! A document table (`x`, `y`, `text` and an optional `label` column) is
//! loaded into a [`DocumentStore`]. An operator narrows the visible points by
//! label and keyword, selects points, assigns a label to the selection and
//! exports the result to a new timestamped file.
//!
//! All state lives in a [`Session`], which is driven by tagged
//! [`Event`](session::Event)s and answers with render
//! [`Effect`](session::Effect)s.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use doclabel::{DocumentId, Session};
//! use doclabel::session::Event;
//!
//! let mut session = Session::open(Path::new("demo.csv"), b';', None).unwrap();
//!
//! session.dispatch(Event::KeywordSubmitted("rust".to_string()));
//! let picked: Vec<DocumentId> =
//!     session.view().points().map(|p| p.meta.id).collect();
//!
//! session.dispatch(Event::PointsSelected(picked));
//! session.dispatch(Event::AssignLabelChosen(Some("programming".to_string())));
//! session.dispatch(Event::CommitRequested);
//! session.dispatch(Event::ExportRequested);
//! ```

pub mod cli;
pub mod config;
pub mod doc_id;
pub mod error;
pub mod export;
pub mod filter;
pub mod mcp;
pub mod registry;
pub mod render;
pub mod repl;
pub mod session;
pub mod store;

pub use config::ExportTarget;
pub use doc_id::DocumentId;
pub use error::{Error, Result};
pub use filter::{View, compute_view};
pub use registry::{KeywordRegistry, LabelRegistry};
pub use session::Session;
pub use store::{Document, DocumentStore};
