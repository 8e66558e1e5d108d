//! Generation orchestrator — drives one job through its stages.
//!
//! Stages run strictly in order with no backward transitions. Extraction and
//! the provider calls are the only suspension points; everything between is
//! pure computation. The observer is notified at each stage boundary so the
//! surrounding service can publish progress.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use ai_client::GenerationProvider;
use esgscope_common::{EsgError, EsgOutput, Stage};

use crate::extract::{DocumentExtractor, ExtractedDocuments, UploadedFile};
use crate::filter::{filter_sentences, CategorizedSentences, KeywordSets};
use crate::prompt::{generation_prompt, repair_prompt};
use crate::selector::{select_evidence, EVIDENCE_BUDGET};
use crate::weighter::apply_weighting;

/// Immutable collaborators for a run, wired once at startup.
pub struct PipelineDeps {
    pub extractor: Arc<dyn DocumentExtractor>,
    pub provider: Arc<dyn GenerationProvider>,
    pub keywords: KeywordSets,
}

/// Stage-boundary hook. The orchestrator owns sequencing; the observer only
/// mirrors it outward (job record updates, progress polling).
#[async_trait]
pub trait StageObserver: Send {
    async fn on_stage(&mut self, stage: Stage);
}

/// Observer that drops stage notifications (synchronous endpoint, tests).
pub struct NoopObserver;

#[async_trait]
impl StageObserver for NoopObserver {
    async fn on_stage(&mut self, _stage: Stage) {}
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub output: EsgOutput,
    pub raw_text: String,
    pub usage: serde_json::Value,
}

/// Run the full pipeline for one job: extract, filter, weight, select,
/// generate (with one repair round), reconcile, validate.
pub async fn run_pipeline(
    files: &[UploadedFile],
    deps: &PipelineDeps,
    job_id: &str,
    observer: &mut dyn StageObserver,
) -> Result<PipelineOutcome, EsgError> {
    info!(job_id, file_count = files.len(), "pipeline start");

    observer.on_stage(Stage::Extract).await;
    let t_extract = Instant::now();
    let extracted = deps.extractor.extract(files).await?;
    let extract_ms = t_extract.elapsed().as_millis() as u64;
    let raw_text = extracted.combined_text();

    observer.on_stage(Stage::Filter).await;
    let t_filter = Instant::now();
    let mut categorized = CategorizedSentences::default();
    for document in &extracted.documents {
        categorized.extend(filter_sentences(&document.text, &deps.keywords));
    }
    let total_esg_sentences = categorized.total();
    let filter_ms = t_filter.elapsed().as_millis() as u64;

    observer.on_stage(Stage::Weight).await;
    let t_weight = Instant::now();
    let weighted = apply_weighting(&categorized);
    let weight_ms = t_weight.elapsed().as_millis() as u64;
    let evidence = select_evidence(&weighted, &extracted, EVIDENCE_BUDGET);

    observer.on_stage(Stage::Intelligence).await;
    let prompt = generation_prompt(&evidence);
    let t_generate = Instant::now();
    let generation = deps
        .provider
        .generate(&prompt, job_id)
        .await
        .map_err(|e| EsgError::Provider(e.to_string()))?;
    let generate_ms = t_generate.elapsed().as_millis() as u64;

    let mut payload = match parse_json_lenient(&generation.text) {
        Ok(value) => value,
        Err(parse_err) => {
            // One repair round-trip, then the failure is final.
            warn!(job_id, error = %parse_err, "generation output unparseable, requesting repair");
            let repair = deps
                .provider
                .generate(&repair_prompt(&generation.text), job_id)
                .await
                .map_err(|e| EsgError::Provider(e.to_string()))?;
            parse_json_lenient(&repair.text)
                .map_err(|e| EsgError::MalformedGeneration(e.to_string()))?
        }
    };

    observer.on_stage(Stage::Validate).await;
    let t_validate = Instant::now();
    reconcile(
        &mut payload,
        &extracted,
        deps.provider.name(),
        &generation.model_name,
        total_esg_sentences as u64,
        weighted.len() as u64,
    )?;
    let output: EsgOutput =
        serde_json::from_value(payload).map_err(|e| EsgError::SchemaValidation(e.to_string()))?;
    output.validate()?;
    let validate_ms = t_validate.elapsed().as_millis() as u64;

    info!(
        job_id,
        total_esg_sentences,
        weighted_blocks = weighted.len(),
        evidence_spans = evidence.len(),
        usage = %generation.usage,
        extract_ms,
        filter_ms,
        weight_ms,
        generate_ms,
        validate_ms,
        "pipeline complete"
    );

    Ok(PipelineOutcome {
        output,
        raw_text,
        usage: generation.usage,
    })
}

/// Parse strict JSON; failing that, parse the outermost `{...}` span of the
/// raw text (models love to wrap JSON in prose or code fences).
fn parse_json_lenient(text: &str) -> Result<serde_json::Value, serde_json::Error> {
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(err) => {
            if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
                if end > start {
                    return serde_json::from_str(&text[start..=end]);
                }
            }
            Err(err)
        }
    }
}

/// Replace the model-authored `metadata` and `aggregation` objects with
/// pipeline-computed ground truth. Every field of both blocks is ours to
/// state, so the model's claims are discarded wholesale.
fn reconcile(
    payload: &mut serde_json::Value,
    extracted: &ExtractedDocuments,
    provider_name: &str,
    model_name: &str,
    total_esg_sentences: u64,
    total_weighted_blocks: u64,
) -> Result<(), EsgError> {
    let map = payload.as_object_mut().ok_or_else(|| {
        EsgError::MalformedGeneration("generation output is not a JSON object".to_string())
    })?;
    map.insert(
        "metadata".to_string(),
        serde_json::json!({
            "source_files": extracted.filenames(),
            "extraction_date": Utc::now().to_rfc3339(),
            "model_provider": provider_name,
            "model_name": model_name,
            "awfa_weights_preserved": true,
        }),
    );
    map.insert(
        "aggregation".to_string(),
        serde_json::json!({
            "total_documents": extracted.documents.len(),
            "total_esg_sentences": total_esg_sentences,
            "total_weighted_blocks": total_weighted_blocks,
            "ocr_used": extracted.ocr_used,
        }),
    );
    Ok(())
}
