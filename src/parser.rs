// Response parsing for model output
//
// Analysis parsing never fails: anything that is not a well-formed
// `{"emotion", "confidence"}` object degrades to the neutral fallback.
// Chat reply extraction has no fallback and reports an error instead.

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::providers::GenerateResponse;
use crate::types::{AnalysisResult, Emotion};

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    emotion: String,
    confidence: f64,
}

/// Parser for extracting structured results from model output
pub struct ResponseParser;

impl ResponseParser {
    /// Emotion analysis from a raw model response, or the fallback
    pub fn parse_analysis(response: &GenerateResponse) -> AnalysisResult {
        match response.first_text() {
            Some(text) => Self::parse_analysis_text(text),
            None => {
                tracing::warn!("Model response has no candidate text, using fallback analysis");
                AnalysisResult::FALLBACK
            }
        }
    }

    /// Emotion analysis from free text that should contain a JSON object
    pub fn parse_analysis_text(text: &str) -> AnalysisResult {
        match Self::try_parse_analysis(text) {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse model analysis, using fallback");
                AnalysisResult::FALLBACK
            }
        }
    }

    fn try_parse_analysis(text: &str) -> Result<AnalysisResult> {
        let json = Self::extract_json_object(text).context("No JSON object in model output")?;
        let raw: RawAnalysis =
            serde_json::from_str(json).context("Model output is not a valid analysis object")?;

        let emotion: Emotion = raw.emotion.parse().map_err(anyhow::Error::msg)?;
        if !raw.confidence.is_finite() || !(0.0..=1.0).contains(&raw.confidence) {
            bail!("Confidence out of range: {}", raw.confidence);
        }

        Ok(AnalysisResult {
            emotion,
            confidence: raw.confidence,
        })
    }

    /// Reply text of the first candidate, trimmed
    ///
    /// # Errors
    /// Returns error if the response has no candidate text or the text is
    /// blank. No substitute reply is produced.
    pub fn extract_chat_reply(response: &GenerateResponse) -> Result<String> {
        let text = response
            .first_text()
            .context("Model response contains no candidate text")?;

        let reply = text.trim();
        if reply.is_empty() {
            bail!("Model returned an empty reply");
        }

        Ok(reply.to_string())
    }

    /// First balanced, top-level `{...}` substring of `text`
    ///
    /// Braces inside JSON string literals are ignored.
    pub fn extract_json_object(text: &str) -> Option<&str> {
        let start = text.find('{')?;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (offset, ch) in text[start..].char_indices() {
            if in_string {
                match ch {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            match ch {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..=start + offset]);
                    }
                }
                _ => {}
            }
        }

        None
    }
}
