use mongodb::bson::{oid::ObjectId, DateTime, Document};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use super::{field_error, trim_opt, Entity, EntityPatch, IndexSpec};

/// Steps a video goes through between upload and playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingEvent {
    /// Upload stream accepted.
    IngestStarted,
    /// Bytes or duration sampled during upload.
    IngestProgress,
    /// Frame and audio inspection.
    MediaAnalysis,
    /// NSFW, violence and similar classifiers.
    ContentClassification,
    /// Encoding and packaging.
    MediaProcessing,
    /// Thumbnails and previews.
    DerivativeGeneration,
    /// Playable outputs are available.
    StreamReady,
    PipelineCompleted,
    PipelineError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensitivityLevel {
    #[default]
    Safe,
    Moderate,
    Sensitive,
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub step: ProcessingEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 100.0, message = "Progress percentage must be between 0 and 100"))]
    pub progress_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Document>,
}

impl LogEntry {
    pub fn new(step: ProcessingEvent) -> Self {
        Self {
            id: None,
            step,
            message: None,
            timestamp: None,
            error: None,
            progress_percentage: None,
            metadata: None,
        }
    }

    fn fill_defaults(&mut self) {
        if self.id.is_none() {
            self.id = Some(ObjectId::new());
        }
        if self.timestamp.is_none() {
            self.timestamp = Some(DateTime::now());
        }
        trim_opt(&mut self.error);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContentModerationResult {
    #[serde(rename = "isNSFW", default)]
    pub is_nsfw: bool,
    #[serde(default)]
    pub sensitivity_level: SensitivityLevel,
    #[serde(default)]
    #[validate(range(min = 0.0, max = 100.0, message = "Confidence score must be between 0 and 100"))]
    pub confidence_score: f64,
    #[serde(default)]
    pub detected_categories: Vec<String>,
    #[serde(default)]
    pub flagged_frames: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzed_at: Option<DateTime>,
}

impl Default for ContentModerationResult {
    fn default() -> Self {
        Self {
            is_nsfw: false,
            sensitivity_level: SensitivityLevel::Safe,
            confidence_score: 0.0,
            detected_categories: Vec::new(),
            flagged_frames: Vec::new(),
            analyzed_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_extracted: Option<i64>,
}

/// Passive record of how far a single video got through processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingLog {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub video_id: ObjectId,
    #[serde(default)]
    pub status: ProcessingStatus,
    #[serde(default)]
    pub progress: f64,
    pub current_step: ProcessingEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_moderation: Option<ContentModerationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProcessingMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl ProcessingLog {
    pub fn new(video_id: ObjectId, current_step: ProcessingEvent) -> Self {
        Self {
            id: None,
            video_id,
            status: ProcessingStatus::Pending,
            progress: 0.0,
            current_step,
            completed_at: None,
            failed_at: None,
            logs: Vec::new(),
            content_moderation: None,
            metadata: None,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingLogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProcessingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<ProcessingEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<LogEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_moderation: Option<ContentModerationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProcessingMetadata>,
}

fn check_progress(errors: &mut ValidationErrors, progress: f64) {
    if !(0.0..=100.0).contains(&progress) {
        errors.add("progress", field_error("range", "Progress must be between 0 and 100"));
    }
}

fn check_logs(errors: &mut ValidationErrors, logs: &[LogEntry]) {
    for (index, entry) in logs.iter().enumerate() {
        if let Err(nested) = entry.validate() {
            errors.add("logs", nested_error("invalid_log_entry", &format!("Log entry {}", index), &nested));
        }
    }
}

fn check_moderation(errors: &mut ValidationErrors, moderation: Option<&ContentModerationResult>) {
    if let Some(Err(nested)) = moderation.map(|m| m.validate()) {
        errors.add(
            "contentModeration",
            nested_error("invalid_content_moderation", "Content moderation", &nested),
        );
    }
}

/// Folds the errors of an embedded document into a single field error on its parent.
fn nested_error(code: &'static str, label: &str, nested: &ValidationErrors) -> ValidationError {
    let mut details: Vec<String> = nested
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let message = e.message.clone().unwrap_or_else(|| e.code.clone());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    details.sort();

    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(format!("{} is invalid ({})", label, details.join(", "))));
    error
}

fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl Validate for ProcessingLog {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_progress(&mut errors, self.progress);
        check_logs(&mut errors, &self.logs);
        check_moderation(&mut errors, self.content_moderation.as_ref());
        into_result(errors)
    }
}

impl Validate for ProcessingLogPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(progress) = self.progress {
            check_progress(&mut errors, progress);
        }
        if let Some(logs) = &self.logs {
            check_logs(&mut errors, logs);
        }
        check_moderation(&mut errors, self.content_moderation.as_ref());
        into_result(errors)
    }
}

impl Entity for ProcessingLog {
    type Patch = ProcessingLogPatch;

    const NAME: &'static str = "ProcessingLog";
    const COLLECTION: &'static str = "processinglogs";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn assign_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn stamp_created(&mut self, now: DateTime) {
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }

    fn normalize(&mut self) {
        self.logs.iter_mut().for_each(LogEntry::fill_defaults);
        if let Some(moderation) = self.content_moderation.as_mut() {
            moderation.analyzed_at.get_or_insert_with(DateTime::now);
        }
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![
            IndexSpec::on("videoId").unique(),
            IndexSpec::on("status"),
            IndexSpec::on("currentStep"),
            IndexSpec::on("contentModeration.isNSFW"),
        ]
    }
}

impl EntityPatch for ProcessingLogPatch {
    fn normalize(&mut self) {
        if let Some(logs) = self.logs.as_mut() {
            logs.iter_mut().for_each(LogEntry::fill_defaults);
        }
        if let Some(moderation) = self.content_moderation.as_mut() {
            moderation.analyzed_at.get_or_insert_with(DateTime::now);
        }
    }
}
