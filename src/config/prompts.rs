//! Prompt templates for hent.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub matching: MatchingPrompts,
}

/// Prompts and tool descriptions for match selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingPrompts {
    /// Selection policy sent as the system message.
    pub system: String,
    /// Header of the user message; `{{query}}` is replaced with the song query.
    pub user_header: String,
    /// Description of the `select_best_match` function.
    pub tool_description: String,
    /// Description of the `correct_title` argument.
    pub title_description: String,
}

impl Default for MatchingPrompts {
    fn default() -> Self {
        Self {
            system: r#"YouTube Audio Selection System

Task: Review YouTube search results and identify the best video for downloading audio based on a given query.

Rules (in order of precedence):
1. Assume the most popular artist for a song title if no artist is specified.
2. Select the official recorded studio version if both song title and artist are specified.
3. Choose a video that matches the requested cover artist if a cover version is specified.
4. Select a video that matches the requested version type (remix, instrumental, live, acoustic).

Additional considerations:
- Favor audio-only versions or lyric videos over music videos.
- Do not select instrumental-only videos unless specified.
- Consider official sources (e.g., VEVO, official artist channel) over random YouTube users.
- Refer to view count, likes/dislikes, and upload date for decision making.
- Avoid live performances unless requested.

Prioritize videos that:
1. Match the query requirements precisely.
2. Come from official or reputable sources.
3. Have high view counts and positive engagement metrics.
4. Are more recent uploads, unless an older version is required.

Aim to select the highest quality audio source matching the user's query and intent. Always answer by calling the select_best_match function."#
                .to_string(),

            user_header: "Query: {{query}}\n\nSearch Results:\n".to_string(),

            tool_description: "Select the best matching video for the given query".to_string(),

            title_description: "The correct title in the format 'Artist - Song Title (Optional Version Description)'. \
                Always separate artist and title with ' - '. Omit the version description when moot, \
                such as (audio) or (lyric video)."
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, overriding defaults from `matching.toml` in the custom directory.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let matching_path = custom_path.join("matching.toml");
            if matching_path.exists() {
                let content = std::fs::read_to_string(&matching_path)?;
                prompts.matching = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }
}
