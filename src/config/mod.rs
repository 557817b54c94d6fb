//! Configuration module for hent.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{MatchingPrompts, Prompts};
pub use settings::{
    CatalogSettings, DownloadSettings, GeneralSettings, LlmSettings, PromptSettings, Settings,
    YoutubeSettings,
};
