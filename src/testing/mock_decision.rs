//! Mock match decision backend.

use super::lock;
use crate::error::{HentError, Result};
use crate::matching::{DecisionBackend, DecisionRequest, MatchDecision};
use async_trait::async_trait;
use std::sync::Mutex;

/// Scripted decision backend.
///
/// Without a configured decision it picks the first candidate and echoes the
/// query back as the normalized title.
#[derive(Debug, Default)]
pub struct MockDecisionBackend {
    decision: Mutex<Option<MatchDecision>>,
    error: Mutex<Option<String>>,
    requests: Mutex<Vec<DecisionRequest>>,
}

impl MockDecisionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request with this decision.
    pub fn set_decision(&self, decision: MatchDecision) {
        *lock(&self.decision) = Some(decision);
    }

    /// Fail every request with this message.
    pub fn fail_with(&self, message: &str) {
        *lock(&self.error) = Some(message.to_string());
    }

    pub fn recorded_requests(&self) -> Vec<DecisionRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl DecisionBackend for MockDecisionBackend {
    async fn decide(&self, request: &DecisionRequest) -> Result<MatchDecision> {
        lock(&self.requests).push(request.clone());

        if let Some(message) = lock(&self.error).clone() {
            return Err(HentError::OpenAI(message));
        }

        Ok(lock(&self.decision).clone().unwrap_or_else(|| MatchDecision {
            best_match_index: Some(1),
            correct_title: Some(request.query.clone()),
            explanation: Some("First result".to_string()),
        }))
    }
}
