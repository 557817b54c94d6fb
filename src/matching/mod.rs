//! LLM-assisted match selection.
//!
//! Sends the query and an enumerated candidate list to a language model that
//! answers through a single structured function call.

mod openai;

pub use openai::{select_best_match_tool, OpenAiDecisionBackend, SELECT_BEST_MATCH};

use crate::config::{MatchingPrompts, Prompts};
use crate::error::Result;
use crate::search::Candidate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A prepared decision request.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    pub query: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub candidate_count: usize,
}

/// The structured answer of the decision backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchDecision {
    /// One-based index into the candidate list.
    #[serde(default)]
    pub best_match_index: Option<i64>,
    /// Normalized "Artist - Title" string.
    #[serde(default)]
    pub correct_title: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// A candidate chosen by the selector, with its normalized title.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedCandidate {
    pub candidate: Candidate,
    pub normalized_title: String,
    pub explanation: Option<String>,
}

/// Trait for match decision backends.
#[async_trait]
pub trait DecisionBackend: Send + Sync {
    /// Ask the backend for a decision.
    async fn decide(&self, request: &DecisionRequest) -> Result<MatchDecision>;
}

/// Picks the best candidate for a query.
pub struct MatchSelector {
    backend: Arc<dyn DecisionBackend>,
    prompts: MatchingPrompts,
}

impl MatchSelector {
    pub fn new(backend: Arc<dyn DecisionBackend>, prompts: &Prompts) -> Self {
        Self {
            backend,
            prompts: prompts.matching.clone(),
        }
    }

    /// Build the decision request for a query and candidate list.
    pub fn build_request(&self, query: &str, candidates: &[Candidate]) -> DecisionRequest {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());

        let mut user_prompt = Prompts::render(&self.prompts.user_header, &vars);
        for (i, c) in candidates.iter().enumerate() {
            let _ = writeln!(
                user_prompt,
                "{}. Title: {}, Channel: {}, Views: {}, Likes: {}, Dislikes: {}, Published: {}",
                i + 1,
                c.title,
                c.channel_title,
                c.statistics.view_count,
                c.statistics.like_count,
                c.statistics.dislike_count,
                c.published_display(),
            );
        }

        DecisionRequest {
            query: query.to_string(),
            system_prompt: self.prompts.system.clone(),
            user_prompt,
            candidate_count: candidates.len(),
        }
    }

    /// Select the best candidate, or None when there is no usable decision.
    #[instrument(skip(self, candidates), fields(query = %query, candidates = candidates.len()))]
    pub async fn select(&self, query: &str, candidates: &[Candidate]) -> Option<SelectedCandidate> {
        if candidates.is_empty() {
            return None;
        }

        let request = self.build_request(query, candidates);
        info!("[{}] Requesting LLM decision", query);

        let decision = match self.backend.decide(&request).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("[{}] Error in LLM decision: {}", query, e);
                return None;
            }
        };

        let explanation = decision
            .explanation
            .clone()
            .unwrap_or_else(|| "No explanation provided".to_string());

        let Some(index) = resolve_index(decision.best_match_index, candidates.len()) else {
            warn!(
                "[{}] No suitable match found (index {:?}): {}",
                query, decision.best_match_index, explanation
            );
            return None;
        };

        let Some(title) = decision
            .correct_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            warn!("[{}] Decision has no title: {}", query, explanation);
            return None;
        };

        info!(
            "[{}] Selected #{} '{}' as '{}'",
            query,
            index + 1,
            candidates[index].title,
            title
        );

        Some(SelectedCandidate {
            candidate: candidates[index].clone(),
            normalized_title: title.to_string(),
            explanation: decision.explanation,
        })
    }
}

/// Convert a one-based index to zero-based, rejecting anything out of range.
pub fn resolve_index(one_based: Option<i64>, len: usize) -> Option<usize> {
    let zero_based = one_based?.checked_sub(1)?;
    let index = usize::try_from(zero_based).ok()?;
    (index < len).then_some(index)
}
