// Journal entry analysis

use std::sync::Arc;

use super::{require_text_and_id, AnalyzeEntryRequest, AnalyzeEntryResponse};
use crate::auth::CallerIdentity;
use crate::crisis::CrisisDetector;
use crate::errors::{ServiceError, ServiceResult};
use crate::parser::ResponseParser;
use crate::prompt::PromptBuilder;
use crate::providers::{GenerationConfig, ModelGateway};
use crate::store::{DocumentPath, DocumentStore, FieldValue, Fields};
use crate::types::AnalysisResult;

const FAILED: &str = "Failed to analyze entry";

/// Analyzes a journal entry and records the result on the entry
pub struct AnalysisService {
    gateway: Arc<dyn ModelGateway>,
    store: Arc<dyn DocumentStore>,
    detector: CrisisDetector,
}

impl AnalysisService {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        store: Arc<dyn DocumentStore>,
        detector: CrisisDetector,
    ) -> Self {
        Self {
            gateway,
            store,
            detector,
        }
    }

    /// Screen, classify, and merge the analysis into
    /// `users/{uid}/journals/{journalId}`
    ///
    /// The entry must already exist. Unparseable model output is stored as
    /// the neutral fallback rather than failing the call.
    pub async fn analyze_entry(
        &self,
        caller: Option<&CallerIdentity>,
        request: AnalyzeEntryRequest,
    ) -> ServiceResult<AnalyzeEntryResponse> {
        let caller = caller.ok_or(ServiceError::Unauthenticated)?;
        let (text, journal_id) = require_text_and_id(
            request.text,
            request.journal_id,
            "Text and journalId are required",
        )?;
        let path = DocumentPath::journal(&caller.uid, &journal_id)
            .map_err(|e| ServiceError::internal(FAILED, e))?;

        let has_crisis_trigger = self.detector.detect_crisis(&text);

        let prompt = PromptBuilder::build_analysis_prompt(&text);
        let response = match self.gateway.generate(&prompt, &GenerationConfig::ANALYSIS).await {
            Ok(response) => response,
            Err(e) => {
                if has_crisis_trigger {
                    tracing::warn!(
                        user_id = %caller.uid,
                        journal_id = %journal_id,
                        "Crisis trigger on entry whose analysis failed"
                    );
                }
                return Err(ServiceError::internal(FAILED, e));
            }
        };
        let analysis = ResponseParser::parse_analysis(&response);

        self.store
            .update(&path, analysis_fields(&analysis, has_crisis_trigger))
            .await
            .map_err(|e| ServiceError::internal(FAILED, e))?;

        tracing::info!(
            user_id = %caller.uid,
            journal_id = %journal_id,
            emotion = %analysis.emotion,
            has_crisis_trigger,
            "Analyzed journal entry"
        );

        Ok(AnalyzeEntryResponse {
            success: true,
            analysis,
            has_crisis_trigger,
        })
    }
}

/// Fields merged into the journal entry
fn analysis_fields(analysis: &AnalysisResult, has_crisis_trigger: bool) -> Fields {
    let analysis_map = Fields::from([
        ("emotion".to_string(), FieldValue::from(analysis.emotion.as_str())),
        ("confidence".to_string(), FieldValue::from(analysis.confidence)),
        ("timestamp".to_string(), FieldValue::ServerTimestamp),
    ]);

    Fields::from([
        ("analysis".to_string(), FieldValue::Map(analysis_map)),
        ("localQuickTrigger".to_string(), FieldValue::from(has_crisis_trigger)),
        ("analyzedAt".to_string(), FieldValue::ServerTimestamp),
    ])
}
