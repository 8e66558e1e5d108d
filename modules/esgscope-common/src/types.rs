use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EsgError;

// --- Categories ---

/// ESG reporting category. A sentence may belong to several at once;
/// iteration order is always Environmental, Social, Governance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "E")]
    Environmental,
    #[serde(rename = "S")]
    Social,
    #[serde(rename = "G")]
    Governance,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Environmental,
        Category::Social,
        Category::Governance,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Category::Environmental => "E",
            Category::Social => "S",
            Category::Governance => "G",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// --- Evidence ---

/// A deduplicated, weighted sentence selected to support generation.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSpan {
    pub text: String,
    pub weight: f64,
    pub category: Category,
    pub source_file: String,
}

// --- Job state machine ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Error,
}

/// One step in the linear job progression. Transitions are one-directional;
/// each stage carries a fixed progress percentage so monotonicity holds by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Stage {
    Upload,
    Extract,
    Filter,
    Weight,
    Intelligence,
    Validate,
    Output,
}

impl Stage {
    pub fn progress(&self) -> u8 {
        match self {
            Stage::Upload => 5,
            Stage::Extract => 20,
            Stage::Filter => 40,
            Stage::Weight => 55,
            Stage::Intelligence => 75,
            Stage::Validate => 90,
            Stage::Output => 100,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Upload => "UPLOAD",
            Stage::Extract => "EXTRACT",
            Stage::Filter => "FILTER",
            Stage::Weight => "WEIGHT",
            Stage::Intelligence => "INTELLIGENCE",
            Stage::Validate => "VALIDATE",
            Stage::Output => "OUTPUT",
        };
        f.write_str(name)
    }
}

/// User-facing failure detail attached to an errored job. The message is
/// short and generic; the detail is the stringified error, never a backtrace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobError {
    pub message: String,
    pub detail: String,
}

/// Mutable record for one processing job. Owned by the orchestrator for the
/// duration of a run and published to the store at stage boundaries only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub status: JobStatus,
    pub stage: Stage,
    pub progress: u8,
    pub source_files: Vec<String>,
    pub raw_text_preview: String,
    pub result: Option<EsgOutput>,
    pub error: Option<JobError>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn new(source_files: Vec<String>) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: JobStatus::Queued,
            stage: Stage::Upload,
            progress: Stage::Upload.progress(),
            source_files,
            raw_text_preview: String::new(),
            result: None,
            error: None,
            updated_at: Utc::now(),
        }
    }

    /// Move to a later stage. Stages never go backwards; a stale transition
    /// is a programming error, so it is ignored rather than applied.
    pub fn advance(&mut self, stage: Stage) {
        if stage < self.stage {
            return;
        }
        self.stage = stage;
        self.progress = stage.progress();
        if self.status == JobStatus::Queued {
            self.status = JobStatus::Running;
        }
    }

    pub fn complete(&mut self, result: EsgOutput, raw_text_preview: String) {
        self.stage = Stage::Output;
        self.progress = 100;
        self.status = JobStatus::Done;
        self.raw_text_preview = raw_text_preview;
        self.result = Some(result);
        self.error = None;
    }

    /// Terminal failure: stage is forced to OUTPUT at 100 so pollers see a
    /// finished job, and any partial result is discarded.
    pub fn fail(&mut self, message: impl Into<String>, detail: impl Into<String>) {
        self.stage = Stage::Output;
        self.progress = 100;
        self.status = JobStatus::Error;
        self.result = None;
        self.error = Some(JobError {
            message: message.into(),
            detail: detail.into(),
        });
    }
}

// --- Output schema ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    pub source_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgSection {
    pub narrative: String,
    pub metrics: Vec<Metric>,
    pub confidence_score: f64,
    pub top_evidence: Vec<EvidenceSpan>,
}

/// Pipeline-computed ground truth about a run. The generation model's own
/// claims about these fields are never trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputMetadata {
    pub source_files: Vec<String>,
    pub extraction_date: String,
    pub model_provider: String,
    pub model_name: String,
    pub awfa_weights_preserved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub total_documents: u64,
    pub total_esg_sentences: u64,
    pub total_weighted_blocks: u64,
    pub ocr_used: bool,
}

/// The final validated report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EsgOutput {
    pub metadata: OutputMetadata,
    pub aggregation: Aggregation,
    pub environmental: EsgSection,
    pub social: EsgSection,
    pub governance: EsgSection,
}

impl EsgOutput {
    /// Range checks beyond what typed deserialization enforces.
    pub fn validate(&self) -> Result<(), EsgError> {
        for (name, section) in [
            ("environmental", &self.environmental),
            ("social", &self.social),
            ("governance", &self.governance),
        ] {
            if !(0.0..=1.0).contains(&section.confidence_score) {
                return Err(EsgError::SchemaValidation(format!(
                    "{name}.confidence_score {} outside [0.0, 1.0]",
                    section.confidence_score
                )));
            }
        }
        Ok(())
    }
}
