// Crisis keyword detector

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const SELF_HARM: &[&str] = &[
    "suicide",
    "kill myself",
    "end my life",
    "want to die",
    "hurt myself",
    "self harm",
    "cut myself",
    "overdose",
    "jump off",
    "hang myself",
];

const HOPELESSNESS: &[&str] = &["no point living", "better off dead", "worthless", "hopeless"];

/// Phrase lists grouped by category. Matching ignores case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisKeywords {
    pub self_harm: Vec<String>,
    #[serde(default)]
    pub hopelessness: Vec<String>,
}

impl Default for CrisisKeywords {
    fn default() -> Self {
        Self {
            self_harm: SELF_HARM.iter().map(|s| s.to_string()).collect(),
            hopelessness: HOPELESSNESS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CrisisDetector {
    keywords: CrisisKeywords,
}

impl Default for CrisisDetector {
    fn default() -> Self {
        Self::new(CrisisKeywords::default())
    }
}

impl CrisisDetector {
    pub fn new(keywords: CrisisKeywords) -> Self {
        // Stored lower-cased so detection only lowers the input
        let lower = |list: Vec<String>| list.into_iter().map(|k| k.to_lowercase()).collect();
        Self {
            keywords: CrisisKeywords {
                self_harm: lower(keywords.self_harm),
                hopelessness: lower(keywords.hopelessness),
            },
        }
    }

    /// Load crisis keywords from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read crisis keywords file: {}", path.display()))?;

        let keywords: CrisisKeywords =
            serde_json::from_str(&contents).context("Failed to parse crisis keywords file")?;

        Ok(Self::new(keywords))
    }

    /// Detect if text contains crisis keywords
    ///
    /// Plain substring match over the lower-cased text. No tokenization or
    /// stemming, so "hopelessly" matches "hopeless".
    pub fn detect_crisis(&self, text: &str) -> bool {
        let text_lower = text.to_lowercase();

        if self.keywords.self_harm.iter().any(|k| text_lower.contains(k.as_str())) {
            tracing::warn!(category = "self_harm", "Crisis keyword detected");
            return true;
        }

        if self.keywords.hopelessness.iter().any(|k| text_lower.contains(k.as_str())) {
            tracing::warn!(category = "hopelessness", "Crisis keyword detected");
            return true;
        }

        false
    }

    /// Get all keywords (for display purposes)
    pub fn all_keywords(&self) -> Vec<String> {
        let mut all = Vec::new();
        all.extend(self.keywords.self_harm.clone());
        all.extend(self.keywords.hopelessness.clone());
        all
    }
}
