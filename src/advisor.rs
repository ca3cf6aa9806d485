use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AgriError, Result};
use crate::lookup::{self, MAX_RECOMMENDATIONS};
use crate::models::{FormInput, Recommendation};

/// Anything that turns a filled-in form into fertilizer advice
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn recommend(&self, input: &FormInput) -> Result<Vec<Recommendation>>;
    fn name(&self) -> &str;
}

/// Keyword lookup over the nutrient deficiency text. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAdvisor;

#[async_trait]
impl Advisor for HeuristicAdvisor {
    async fn recommend(&self, input: &FormInput) -> Result<Vec<Recommendation>> {
        let recs = lookup::recommend(&input.nutrient_deficiencies);
        debug!(
            "Heuristic lookup matched {} recommendation(s) for crop '{}'",
            recs.len(),
            input.crop_type
        );
        Ok(recs)
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// Gemini generateContent client
pub struct GeminiAdvisor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: serde_json::Value,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fenced json regex should compile")
});

impl GeminiAdvisor {
    pub fn new(api_key: String, model: String, endpoint: String, timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

/// Prompt carrying every form field
pub fn build_prompt(input: &FormInput) -> String {
    let crop = if input.crop_type.trim().is_empty() {
        "unspecified crop"
    } else {
        input.crop_type.trim()
    };
    let symptoms = if input.nutrient_deficiencies.trim().is_empty() {
        "none described"
    } else {
        input.nutrient_deficiencies.trim()
    };
    format!(
        "You are an agronomist. Recommend at most {max} fertilizers.\n\
         Crop: {crop}\n\
         Soil quality: {soil}\n\
         Climate: {climate}\n\
         Growth stage: {stage}\n\
         Nutrient deficiencies: {symptoms}\n\n\
         Respond with a JSON array only. Each element must have the string fields \
         fertilizerName, applicationMethod, reasoning, precautions.",
        max = MAX_RECOMMENDATIONS,
        soil = input.soil_quality,
        climate = input.climate,
        stage = input.growth_stage,
    )
}

/// Parse model output into recommendations, tolerating a markdown fence
pub fn parse_recommendations(text: &str) -> Result<Vec<Recommendation>> {
    let body = FENCED_JSON
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text)
        .trim();

    let mut recs: Vec<Recommendation> = serde_json::from_str(body)
        .map_err(|e| AgriError::advisor(format!("unparsable advisor output: {}", e)))?;
    if recs.is_empty() {
        return Err(AgriError::advisor("advisor returned no recommendations"));
    }
    recs.truncate(MAX_RECOMMENDATIONS);
    Ok(recs)
}

#[async_trait]
impl Advisor for GeminiAdvisor {
    async fn recommend(&self, input: &FormInput) -> Result<Vec<Recommendation>> {
        debug!("Requesting Gemini recommendation (model={})", self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(input),
                }],
            }],
            generation_config: json!({ "responseMimeType": "application/json" }),
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!("Gemini API error {}", status);
            return Err(AgriError::advisor(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let parsed: GenerateResponse = response.json().await?;
        let text: String = parsed
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .next()
            .ok_or_else(|| AgriError::advisor("Gemini returned no candidates"))?;

        parse_recommendations(&text)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

/// Pick the advisor named by configuration.
///
/// `auto` uses Gemini only when a real key is present, otherwise the lookup.
pub fn create_advisor(config: &Config) -> Result<Arc<dyn Advisor>> {
    let gemini = |key: &str| -> Result<Arc<dyn Advisor>> {
        info!("Using Gemini advisor (model={})", config.advisor.model);
        Ok(Arc::new(GeminiAdvisor::new(
            key.to_string(),
            config.advisor.model.clone(),
            config.advisor.endpoint.clone(),
            config.advisor.timeout_ms,
        )?))
    };

    match config.advisor.provider.as_str() {
        "heuristic" => {
            info!("Using heuristic advisor");
            Ok(Arc::new(HeuristicAdvisor))
        }
        "gemini" => match config.gemini_key() {
            Some(key) => gemini(key),
            None => Err(AgriError::Config {
                message: "advisor provider is gemini but GEMINI_API_KEY is not set".to_string(),
            }),
        },
        "auto" => match config.gemini_key() {
            Some(key) => gemini(key),
            None => {
                info!("No Gemini key configured; using heuristic advisor");
                Ok(Arc::new(HeuristicAdvisor))
            }
        },
        other => Err(AgriError::Config {
            message: format!("unknown advisor provider '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Climate, GrowthStage, SoilQuality};

    #[tokio::test]
    async fn heuristic_reads_deficiency_text() {
        let input = FormInput {
            crop_type: "Maize".into(),
            nutrient_deficiencies: "Nitrogen deficiency".into(),
            ..Default::default()
        };
        let recs = HeuristicAdvisor.recommend(&input).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].fertilizer_name, "Urea (46% N)");
    }

    #[test]
    fn prompt_carries_every_field() {
        let input = FormInput {
            crop_type: "Tomato".into(),
            soil_quality: SoilQuality::Poor,
            climate: Climate::Dry,
            growth_stage: GrowthStage::Fruiting,
            nutrient_deficiencies: "blossom end rot".into(),
        };
        let prompt = build_prompt(&input);
        for needle in ["Tomato", "Poor", "Dry", "Fruiting", "blossom end rot"] {
            assert!(prompt.contains(needle), "missing {needle}");
        }
        assert!(build_prompt(&FormInput::default()).contains("unspecified crop"));
    }

    #[test]
    fn parse_accepts_plain_and_fenced_json() {
        let raw = r#"[{"fertilizerName":"Potash","applicationMethod":"Band","reasoning":"K","precautions":"None"}]"#;
        assert_eq!(parse_recommendations(raw).unwrap()[0].fertilizer_name, "Potash");

        let fenced = format!("Here you go:\n```json\n{}\n```", raw);
        assert_eq!(parse_recommendations(&fenced).unwrap().len(), 1);
    }

    #[test]
    fn parse_truncates_and_rejects_empty() {
        let one = r#"{"fertilizerName":"X","applicationMethod":"a","reasoning":"r","precautions":"p"}"#;
        let three = format!("[{one},{one},{one}]");
        assert_eq!(parse_recommendations(&three).unwrap().len(), MAX_RECOMMENDATIONS);

        assert!(matches!(
            parse_recommendations("[]"),
            Err(AgriError::Advisor { .. })
        ));
        assert!(parse_recommendations("not json").is_err());
    }

    #[test]
    fn auto_without_key_is_heuristic() {
        let config = Config::default();
        assert_eq!(create_advisor(&config).unwrap().name(), "heuristic");
    }

    #[test]
    fn gemini_without_key_is_config_error() {
        let mut config = Config::default();
        config.advisor.provider = "gemini".into();
        config.runtime.gemini_api_key = Some("PLACEHOLDER_API_KEY".into());
        assert!(matches!(
            create_advisor(&config),
            Err(AgriError::Config { .. })
        ));
    }

    #[test]
    fn auto_with_key_is_gemini() {
        let mut config = Config::default();
        config.runtime.gemini_api_key = Some("AIzaSyExample".into());
        assert_eq!(create_advisor(&config).unwrap().name(), "gemini");
    }
}
