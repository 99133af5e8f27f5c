//! Certificate processing pipeline.
//!
//! A [`Pipeline`] turns one [`DocumentLayout`] into a [`ProcessedDocument`]
//! by running the parser and reconciliation stages in a fixed order, and
//! persists the result through a [`Store`]. Batches process documents one at
//! a time; a failing document is reported and the batch moves on.
//!
//! # Example
//!
//! ```no_run
//! use takbis::{JsonLayoutSource, LayoutSource, Pipeline, PipelineOptions, Store};
//!
//! fn main() -> takbis::Result<()> {
//!     let mut pipeline = Pipeline::new(PipelineOptions::default())?;
//!     let mut store = Store::open("takbis.db")?;
//!
//!     let layout = JsonLayoutSource::new().load("certificate.json".as_ref())?;
//!     let doc = pipeline.process(&layout)?;
//!     pipeline.persist(&mut store, &doc, false)?;
//!     Ok(())
//! }
//! ```

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Diagnostic, Error, Result};
use crate::model::{
    CertificateInfo, DocumentLayout, HeaderSet, MortgageRecord, ObservationPool, ParcelEntity,
    RowRecord,
};
use crate::parser::{
    capture_observations, certificate_info, is_mortgage_page, merge_continuations,
    remove_merged, validate_document, HeaderClassifier, HeaderClassifierConfig,
    PipelineOptions, RowClassifier, RowExtractor, ThresholdKey, ZoneExtractor,
};
use crate::reconcile::{
    assign_sections, build_parcel, clean_dates, drop_spillover_rows, extract_journals,
    label_identity_section, link_serial_tags, mark_empty_pledges, repair_collisions,
    repair_from_observations, repair_neighbors,
};
use crate::store::Store;
use crate::text::{BankDirectory, TextNormalizer};

/// Something that can produce certificate layouts from files.
pub trait LayoutSource {
    /// File extensions this source reads (without the dot).
    fn extensions(&self) -> &[&str];

    /// Load one layout.
    fn load(&self, path: &Path) -> Result<DocumentLayout>;

    /// Whether the source reads this path.
    fn can_load(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions().iter().any(|x| x.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Paths to load for `path`: the file itself, or every readable file
    /// of a directory in name order.
    fn discover(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if !path.is_dir() {
            return Ok(vec![path.to_path_buf()]);
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_file() && self.can_load(&entry_path) {
                paths.push(entry_path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// Reads layouts dumped as JSON by the extraction service.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLayoutSource;

impl JsonLayoutSource {
    pub fn new() -> Self {
        Self
    }
}

impl LayoutSource for JsonLayoutSource {
    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn load(&self, path: &Path) -> Result<DocumentLayout> {
        let raw = std::fs::read_to_string(path)?;
        let mut layout: DocumentLayout = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidLayout(format!("{}: {}", path.display(), e)))?;
        if layout.pages.is_empty() {
            return Err(Error::InvalidLayout(format!("{}: no pages", path.display())));
        }
        if layout.source.is_none() {
            layout.source = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
        }
        Ok(layout)
    }
}

/// Everything recovered from one certificate.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    /// Layout source label
    pub source: Option<String>,
    pub parcel: ParcelEntity,
    pub headers: HeaderSet,
    /// Surviving rows, all finalized
    pub rows: Vec<RowRecord>,
    pub mortgages: Vec<MortgageRecord>,
    pub observations: ObservationPool,
    /// Recoverable problems met along the way
    pub diagnostics: Vec<Diagnostic>,
}

impl ProcessedDocument {
    pub fn identity(&self) -> &str {
        &self.parcel.identity
    }

    /// Rows without a section.
    pub fn unassigned_rows(&self) -> impl Iterator<Item = &RowRecord> {
        self.rows.iter().filter(|r| r.is_data() && !r.has_section())
    }
}

/// What happened to one document of a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Processed {
        parcel: String,
        rows: usize,
        mortgages: usize,
        diagnostics: Vec<Diagnostic>,
    },
    SkippedDuplicate {
        parcel: String,
    },
    Failed {
        error: String,
    },
}

/// Outcome of one batch entry.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub source: String,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    /// Observations deleted at the end of the batch
    pub discarded_observations: usize,
    /// Whether the caller stopped the batch early
    pub cancelled: bool,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Processed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::SkippedDuplicate { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, DocumentStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&DocumentStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Runs the processing stages over certificate layouts.
pub struct Pipeline {
    options: PipelineOptions,
    normalizer: TextNormalizer,
}

impl Pipeline {
    /// Create a pipeline, opening the bank directory file if one is set.
    pub fn new(options: PipelineOptions) -> Result<Self> {
        options.validate()?;
        let directory = match &options.bank_directory {
            Some(path) => BankDirectory::open(path)?,
            None => BankDirectory::with_defaults(),
        };
        Ok(Self::with_directory(options, directory))
    }

    /// Create a pipeline over an existing bank directory.
    pub fn with_directory(options: PipelineOptions, directory: BankDirectory) -> Self {
        let normalizer =
            TextNormalizer::new(directory).with_threshold(options.threshold(ThresholdKey::BankName));
        Self {
            options,
            normalizer,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn directory(&self) -> &BankDirectory {
        self.normalizer.directory()
    }

    /// Validate a layout and return its parcel identity.
    pub fn identify(&self, layout: &DocumentLayout) -> Result<String> {
        validate_document(layout, self.options.min_mandatory_labels)
    }

    /// Process one certificate.
    pub fn process(&mut self, layout: &DocumentLayout) -> Result<ProcessedDocument> {
        let options = &self.options;
        let identity = self.identify(layout)?;
        log::debug!("Pipeline: {} is parcel {}", layout.label(), identity);

        let mut observations = capture_observations(layout, &identity);
        let mut diagnostics = Vec::new();

        // Mortgage zones
        let zones = ZoneExtractor::with_layout(options.zones.clone());
        let mut mortgages = Vec::new();
        for page in &layout.pages {
            if !is_mortgage_page(&page.plain_text(), options.mortgage_min_text) {
                continue;
            }
            let result = zones.extract(page, &identity, &mut self.normalizer)?;
            diagnostics.extend(result.diagnostic);
            if !result.record.is_empty() {
                mortgages.push(result.record);
            }
        }
        let certificate = layout
            .first_page()
            .map(certificate_info)
            .unwrap_or_else(CertificateInfo::default);

        // Rows
        let mut rows = RowExtractor::new()
            .with_average_row_height(options.average_row_height)
            .extract(layout);
        for row in rows.iter_mut() {
            row.parcel = Some(identity.clone());
        }
        let rows = RowClassifier::new()
            .with_thresholds(
                options.threshold(ThresholdKey::PageOneLabel),
                options.threshold(ThresholdKey::HeaderArchetype),
            )
            .classify(rows);
        let (rows, merged) = merge_continuations(rows);
        log::debug!("Pipeline: merged {} continuation rows", merged);
        let rows = remove_merged(rows);

        // Page-one summary
        let rows = label_identity_section(rows, options.threshold(ThresholdKey::IdentitySectionLabel));
        let parcel = build_parcel(&identity, &rows, &options.thresholds, certificate);

        let mortgages = clean_dates(mortgages);
        let mortgages = link_serial_tags(mortgages, &rows);
        let mortgages = mark_empty_pledges(mortgages, &rows);

        // Sections
        let headers = HeaderClassifier::with_config(HeaderClassifierConfig {
            size_tolerance: options.header_size_tolerance,
            max_x: options.header_max_x,
            min_words: options.header_min_words,
        })
        .classify(layout);

        let rows = assign_sections(rows, &headers);
        let rows = repair_from_observations(rows, &observations, &headers);
        let (rows, unresolved) = repair_collisions(rows, &mut observations, &headers);
        diagnostics.extend(unresolved);
        let (rows, unassigned) = repair_neighbors(rows, options.neighbor_window);
        diagnostics.extend(unassigned);

        // Cleanup
        let rows = extract_journals(rows);
        let (mut rows, _) = drop_spillover_rows(rows);
        for row in rows.iter_mut() {
            row.finalized = true;
        }

        log::debug!(
            "Pipeline: parcel {} done ({} rows, {} headers, {} mortgages, {} diagnostics)",
            identity,
            rows.len(),
            headers.len(),
            mortgages.len(),
            diagnostics.len()
        );

        Ok(ProcessedDocument {
            source: layout.source.clone(),
            parcel,
            headers,
            rows,
            mortgages,
            observations,
            diagnostics,
        })
    }

    /// Store a processed document.
    pub fn persist(&self, store: &mut Store, doc: &ProcessedDocument, overwrite: bool) -> Result<()> {
        store.save(doc, overwrite)
    }

    /// Process and store a sequence of layouts.
    ///
    /// `on_document` runs after every document and may break to stop the
    /// batch. Unconsumed observations are discarded once the batch ends,
    /// whether or not it was stopped.
    pub fn run_batch<I, F>(
        &mut self,
        layouts: I,
        store: &mut Store,
        overwrite: bool,
        mut on_document: F,
    ) -> Result<BatchReport>
    where
        I: IntoIterator<Item = (String, Result<DocumentLayout>)>,
        F: FnMut(&DocumentOutcome) -> ControlFlow<()>,
    {
        let mut report = BatchReport::default();

        for (source, layout) in layouts {
            let status = match layout.and_then(|l| self.process_one(&l, store, overwrite)) {
                Ok(status) => status,
                Err(e) if e.is_document_scoped() => {
                    log::warn!("{}: {}", source, e);
                    DocumentStatus::Failed {
                        error: e.to_string(),
                    }
                }
                Err(e) => return Err(e),
            };
            let outcome = DocumentOutcome { source, status };
            let flow = on_document(&outcome);
            report.outcomes.push(outcome);
            if flow.is_break() {
                log::info!("Batch stopped after {} documents", report.outcomes.len());
                report.cancelled = true;
                break;
            }
        }

        report.discarded_observations = store.discard_unconsumed_observations()?;
        Ok(report)
    }

    fn process_one(
        &mut self,
        layout: &DocumentLayout,
        store: &mut Store,
        overwrite: bool,
    ) -> Result<DocumentStatus> {
        let identity = self.identify(layout)?;
        if !overwrite && store.parcel_exists(&identity)? {
            log::info!("Parcel {} already stored, skipping {}", identity, layout.label());
            return Ok(DocumentStatus::SkippedDuplicate { parcel: identity });
        }

        let doc = self.process(layout)?;
        self.persist(store, &doc, overwrite)?;
        Ok(DocumentStatus::Processed {
            parcel: doc.parcel.identity,
            rows: doc.rows.len(),
            mortgages: doc.mortgages.len(),
            diagnostics: doc.diagnostics,
        })
    }
}

/// Load every layout a source finds under `path`, labelled by file name.
pub fn load_layouts<S: LayoutSource>(
    source: &S,
    path: &Path,
) -> Result<Vec<(String, Result<DocumentLayout>)>> {
    Ok(source
        .discover(path)?
        .into_iter()
        .map(|p| {
            let label = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string());
            (label, source.load(&p))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_json_source_extensions() {
        let source = JsonLayoutSource::new();
        assert!(source.can_load(Path::new("a/b/cert.JSON")));
        assert!(!source.can_load(Path::new("cert.pdf")));
        assert!(!source.can_load(Path::new("noext")));
    }

    #[test]
    fn test_json_source_rejects_empty_layout() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"pages": []}}"#).unwrap();
        let err = JsonLayoutSource::new().load(file.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidLayout(_)));
    }

    #[test]
    fn test_json_source_names_the_layout() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"pages": [{{"number": 1, "width": 842.0, "height": 595.0}}]}}"#
        )
        .unwrap();
        let layout = JsonLayoutSource::new().load(file.path()).unwrap();
        assert_eq!(layout.page_count(), 1);
        assert!(layout.label().ends_with(".json"));
    }

    #[test]
    fn test_pipeline_rejects_bad_options() {
        let options = PipelineOptions::new().with_neighbor_window(0);
        assert!(matches!(Pipeline::new(options), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_process_rejects_non_certificate() {
        let mut pipeline = Pipeline::new(PipelineOptions::new()).unwrap();
        let layout = DocumentLayout::new(vec![crate::model::PageLayout::a4_landscape(1)]);
        assert!(matches!(
            pipeline.process(&layout),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_batch_report_counts() {
        let report = BatchReport {
            outcomes: vec![
                DocumentOutcome {
                    source: "a".into(),
                    status: DocumentStatus::SkippedDuplicate { parcel: "1".into() },
                },
                DocumentOutcome {
                    source: "b".into(),
                    status: DocumentStatus::Failed { error: "x".into() },
                },
            ],
            ..Default::default()
        };
        assert_eq!(report.processed(), 0);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);
    }
}
