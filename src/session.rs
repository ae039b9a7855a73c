//! The labeling session: one owner of the document store and both
//! registries, driven by tagged operator events.
//!
//! Every operator action becomes one [`Event`]. [`Session::dispatch`] applies
//! it synchronously and returns the [`Effect`]s a front-end has to render.
//! Failures never escape `dispatch`; they are reported as error banners.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::ExportTarget,
    doc_id::DocumentId,
    error::{Error, Result},
    export,
    filter::{self, View},
    registry::{ChecklistItem, KeywordRegistry, LabelRegistry},
    store::DocumentStore,
};

/// How long labeling confirmations stay visible.
pub const LABELING_BANNER_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The multi-select label filter now holds exactly these labels.
    LabelFilterChanged(Vec<String>),
    /// A keyword was typed and submitted.
    KeywordSubmitted(String),
    /// The keyword checkboxes now have exactly these entries checked.
    KeywordChecklistChanged(Vec<String>),
    /// A new label was typed and submitted.
    LabelCreated(String),
    /// The single-select assign dropdown changed.
    AssignLabelChosen(Option<String>),
    /// Points were lasso- or click-selected on the plot.
    PointsSelected(Vec<DocumentId>),
    /// Write the chosen label onto every selected point.
    CommitRequested,
    PointClicked(DocumentId),
    InspectorClosed,
    ExportRequested,
}

/// Text inputs that a handler may reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    Keyword,
    NewLabel,
    AssignLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerSlot {
    Labeling,
    Export,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub slot: BannerSlot,
    pub kind: BannerKind,
    pub message: String,
    /// Auto-dismiss hint for the front-end. Purely cosmetic.
    pub dismiss_after_ms: Option<u64>,
}

impl Banner {
    fn labeling(kind: BannerKind, message: String) -> Self {
        Self {
            slot: BannerSlot::Labeling,
            kind,
            message,
            dismiss_after_ms: Some(LABELING_BANNER_MS),
        }
    }

    fn export(kind: BannerKind, message: String) -> Self {
        Self {
            slot: BannerSlot::Export,
            kind,
            message,
            dismiss_after_ms: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectorState {
    pub is_open: bool,
    pub document: Option<DocumentId>,
    pub text: Option<String>,
}

/// Render instructions produced by [`Session::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// The visible set may have changed; recompute [`Session::view`].
    Redraw,
    ClearInput(InputField),
    /// Dropdown options or keyword checkboxes changed.
    RegistriesChanged,
    Banner(Banner),
    Inspector(InspectorState),
    Exported(PathBuf),
}

/// Serializable snapshot of the operator-visible state.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub documents: usize,
    pub visible: usize,
    pub labels: Vec<String>,
    pub label_filter: Vec<String>,
    pub keywords: Vec<ChecklistItem>,
    pub assign_label: Option<String>,
    pub selection: Vec<DocumentId>,
    pub inspector: InspectorState,
    pub labeling_banner: Option<Banner>,
    pub export_banner: Option<Banner>,
}

#[derive(Debug)]
pub struct Session {
    store: DocumentStore,
    labels: LabelRegistry,
    keywords: KeywordRegistry,
    label_filter: Vec<String>,
    assign_label: Option<String>,
    selection: Vec<DocumentId>,
    inspector: InspectorState,
    labeling_banner: Option<Banner>,
    export_banner: Option<Banner>,
    target: ExportTarget,
}

impl Session {
    pub fn new(store: DocumentStore, target: ExportTarget) -> Self {
        let labels = LabelRegistry::initialize(&store);
        Self {
            store,
            labels,
            keywords: KeywordRegistry::new(),
            label_filter: Vec::new(),
            assign_label: None,
            selection: Vec::new(),
            inspector: InspectorState::default(),
            labeling_banner: None,
            export_banner: None,
            target,
        }
    }

    /// Load `input` and resolve where its exports go.
    pub fn open(
        input: &Path,
        delimiter: u8,
        output_dir: Option<&Path>,
    ) -> Result<Self> {
        let store = DocumentStore::load(input, delimiter)?;
        let target = ExportTarget::resolve(input, output_dir)?;
        Ok(Self::new(store, target))
    }

    pub fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        debug!(?event, "dispatch");
        match event {
            Event::LabelFilterChanged(labels) => self.set_label_filter(labels),
            Event::KeywordSubmitted(candidate) => {
                let mut effects = vec![Effect::ClearInput(InputField::Keyword)];
                if self.keywords.submit(&candidate) {
                    effects.push(Effect::RegistriesChanged);
                    effects.push(Effect::Redraw);
                }
                effects
            }
            Event::KeywordChecklistChanged(checked) => {
                self.keywords.replace_from_selection(&checked);
                vec![Effect::RegistriesChanged, Effect::Redraw]
            }
            Event::LabelCreated(candidate) => {
                let mut effects =
                    vec![Effect::ClearInput(InputField::NewLabel)];
                if self.labels.add(&candidate) {
                    effects.push(Effect::RegistriesChanged);
                }
                effects
            }
            Event::AssignLabelChosen(label) => {
                self.assign_label = label.filter(|l| !l.is_empty());
                Vec::new()
            }
            Event::PointsSelected(ids) => {
                self.selection = ids;
                Vec::new()
            }
            Event::CommitRequested => self.commit(),
            Event::PointClicked(id) => self.toggle_inspector(id),
            Event::InspectorClosed => {
                self.inspector.is_open = false;
                vec![Effect::Inspector(self.inspector.clone())]
            }
            Event::ExportRequested => self.export(),
        }
    }

    fn set_label_filter(&mut self, labels: Vec<String>) -> Vec<Effect> {
        let mut filter = Vec::with_capacity(labels.len());
        let mut unknown = Vec::new();
        for label in labels {
            if filter.contains(&label) {
                continue;
            }
            if !self.labels.contains(&label) {
                warn!(label, "filtering on unregistered label");
                unknown.push(format!("\"{label}\""));
            }
            filter.push(label);
        }
        self.label_filter = filter;

        if unknown.is_empty() {
            return vec![Effect::Redraw];
        }
        // Unknown labels stay in the filter so the view narrows instead of
        // silently falling back to every document.
        let banner = Banner::labeling(
            BannerKind::Warning,
            format!("unknown label(s) in filter: {}", unknown.join(", ")),
        );
        self.labeling_banner = Some(banner.clone());
        vec![Effect::Banner(banner), Effect::Redraw]
    }

    fn commit(&mut self) -> Vec<Effect> {
        let Some(label) = self.assign_label.clone() else {
            let banner = Banner::labeling(
                BannerKind::Warning,
                "no label selected".to_string(),
            );
            self.labeling_banner = Some(banner.clone());
            return vec![Effect::Banner(banner)];
        };

        let banner = match self.store.apply_label(&self.selection, &label) {
            Ok(count) => {
                let noun = if count == 1 { "document" } else { "documents" };
                Banner::labeling(
                    BannerKind::Success,
                    format!("{count} {noun} labeled as \"{label}\""),
                )
            }
            Err(e) => {
                warn!(error = %e, "commit rejected");
                let banner = Banner::labeling(BannerKind::Error, e.to_string());
                self.labeling_banner = Some(banner.clone());
                return vec![Effect::Banner(banner)];
            }
        };

        let mut effects = Vec::with_capacity(4);
        if self.labels.add(&label) {
            effects.push(Effect::RegistriesChanged);
        }
        self.assign_label = None;
        self.labeling_banner = Some(banner.clone());
        effects.push(Effect::Banner(banner));
        effects.push(Effect::ClearInput(InputField::AssignLabel));
        effects.push(Effect::Redraw);
        effects
    }

    fn toggle_inspector(&mut self, id: DocumentId) -> Vec<Effect> {
        if self.inspector.is_open {
            self.inspector.is_open = false;
            return vec![Effect::Inspector(self.inspector.clone())];
        }

        let Some(doc) = self.store.get(id) else {
            let err = Error::NotFound {
                kind: "document",
                name: id.to_string(),
            };
            let banner = Banner::labeling(BannerKind::Error, err.to_string());
            self.labeling_banner = Some(banner.clone());
            return vec![Effect::Banner(banner)];
        };

        self.inspector = InspectorState {
            is_open: true,
            document: Some(id),
            text: Some(doc.text.clone()),
        };
        vec![Effect::Inspector(self.inspector.clone())]
    }

    fn export(&mut self) -> Vec<Effect> {
        match export::export(&self.store, &self.target, Local::now()) {
            Ok(path) => {
                info!(path = %path.display(), "export finished");
                let banner = Banner::export(
                    BannerKind::Success,
                    format!("Labels saved to \"{}\"", path.display()),
                );
                self.export_banner = Some(banner.clone());
                vec![Effect::Banner(banner), Effect::Exported(path)]
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                let banner = Banner::export(
                    BannerKind::Error,
                    format!("Export failed: {e}"),
                );
                self.export_banner = Some(banner.clone());
                vec![Effect::Banner(banner)]
            }
        }
    }

    pub fn view(&self) -> View {
        filter::compute_view(
            &self.store,
            &self.label_filter,
            self.keywords.keywords(),
        )
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            documents: self.store.len(),
            visible: self.view().len(),
            labels: self.labels.labels().to_vec(),
            label_filter: self.label_filter.clone(),
            keywords: self.keywords.checklist(),
            assign_label: self.assign_label.clone(),
            selection: self.selection.clone(),
            inspector: self.inspector.clone(),
            labeling_banner: self.labeling_banner.clone(),
            export_banner: self.export_banner.clone(),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn labels(&self) -> &LabelRegistry {
        &self.labels
    }

    pub fn keywords(&self) -> &KeywordRegistry {
        &self.keywords
    }

    pub fn label_filter(&self) -> &[String] {
        &self.label_filter
    }

    pub fn assign_label(&self) -> Option<&str> {
        self.assign_label.as_deref()
    }

    pub fn selection(&self) -> &[DocumentId] {
        &self.selection
    }

    pub fn inspector(&self) -> &InspectorState {
        &self.inspector
    }

    pub fn labeling_banner(&self) -> Option<&Banner> {
        self.labeling_banner.as_ref()
    }

    pub fn export_banner(&self) -> Option<&Banner> {
        self.export_banner.as_ref()
    }

    pub fn target(&self) -> &ExportTarget {
        &self.target
    }
}
