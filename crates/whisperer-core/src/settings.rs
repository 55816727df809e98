//! Generation settings forwarded to the model capability.

use serde::{Deserialize, Serialize};

/// Sampling and length settings for one generation call.
///
/// These map one-to-one onto the knobs the hosted model exposes
/// (temperature, top-k, top-p, max output tokens). Defaults match the
/// assistant's stock configuration for code-review turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Controls randomness (0.0 = deterministic, 1.0 = creative)
    pub temperature: f32,
    /// Limits sampling to the top-k most likely tokens
    pub top_k: u32,
    /// Nucleus sampling cutoff (range: 0-1)
    pub top_p: f32,
    /// Limits response length
    pub max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_k: 40,
            top_p: 0.95,
            max_tokens: 512,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.temperature, 0.3);
        assert_eq!(settings.top_k, 40);
        assert_eq!(settings.top_p, 0.95);
        assert_eq!(settings.max_tokens, 512);
    }

    #[test]
    fn test_settings_roundtrip() {
        let settings = GenerationSettings {
            temperature: 0.7,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: GenerationSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
