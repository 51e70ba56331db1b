use super::catalog::Product;
use serde::Deserialize;

pub const ACT_COUNT: usize = 3;

/// Voice actors the blueprint model may cast, keyed by a descriptive name.
pub const VOICE_OPTIONS: &[(&str, &str)] = &[
    ("professional_male_voice_1", "wlmwDR77ptH6bKHZui0l"),
    ("professional_female_voice_1", "wlmwDR77ptH6bKHZui0l"),
    ("professional_female_voice_2", "2zRM7PkgwBPiau2jvVXc"),
];

/// Creative plan for one ad. Lives only inside a single worker invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blueprint {
    pub acts: [String; ACT_COUNT],
    pub voiceover_script: String,
    pub voice_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAct {
    Text(String),
    Object { prompt: String },
}

#[derive(Deserialize)]
struct RawBlueprint {
    acts: Vec<RawAct>,
    voiceover_script: String,
    voice_id: String,
}

impl Blueprint {
    /// Parses the JSON object produced by the blueprint model. An act may be
    /// a bare prompt string or an object carrying a `prompt` field.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        let parsed: RawBlueprint =
            serde_json::from_str(raw.trim()).map_err(|e| format!("invalid blueprint JSON: {}", e))?;

        let acts: Vec<String> = parsed
            .acts
            .into_iter()
            .map(|act| match act {
                RawAct::Text(prompt) | RawAct::Object { prompt } => prompt.trim().to_string(),
            })
            .collect();

        let count = acts.len();
        let acts: [String; ACT_COUNT] = acts
            .try_into()
            .map_err(|_| format!("expected {} acts, got {}", ACT_COUNT, count))?;

        if acts.iter().any(String::is_empty) {
            return Err("blueprint contains an empty act prompt".to_string());
        }
        if parsed.voiceover_script.trim().is_empty() {
            return Err("blueprint is missing a voiceover script".to_string());
        }
        if parsed.voice_id.trim().is_empty() {
            return Err("blueprint is missing a voice id".to_string());
        }

        Ok(Self {
            acts,
            voiceover_script: parsed.voiceover_script,
            voice_id: parsed.voice_id.trim().to_string(),
        })
    }
}

/// Instruction sent to the blueprint model.
pub fn creative_brief(product: &Product, user_context: &str) -> String {
    let voices: serde_json::Map<String, serde_json::Value> = VOICE_OPTIONS
        .iter()
        .map(|(name, id)| (name.to_string(), serde_json::Value::from(*id)))
        .collect();

    format!(
        r#"You are a careful creative director planning a product ad. The finished ad runs 26 seconds and the last 2 seconds are a silent branding outro.
Return one JSON object with exactly these keys:
1. "acts": an array of 3 visual prompts for a text-to-video model. Keep the language neutral and descriptive so downstream content filters do not reject it: avoid words about impact, drama or conflict (for example "shot", "dramatic", "tension", "hit") and prefer phrasing such as "a view of" or "a scene showing". Focus on the product, the setting and positive emotion.
2. "voiceover_script": a single script that reads in roughly 22 to 23 seconds and ends before the branding outro.
3. "voice_id": the id (the value, not the name) of the one voice from the available voices that best fits the requested tone.

Product name: {product}
Creative brief: {context}
Available voices: {voices}

Respond with the JSON object only."#,
        product = product.product_name,
        context = user_context,
        voices = serde_json::Value::Object(voices),
    )
}
