//! OpenAI function-calling decision backend.

use super::{DecisionBackend, DecisionRequest, MatchDecision};
use crate::config::{LlmSettings, MatchingPrompts};
use crate::error::{HentError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionNamedToolChoice, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionTool, ChatCompletionToolChoiceOption,
    ChatCompletionToolType, CreateChatCompletionRequestArgs, FunctionName, FunctionObject,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Name of the single function the model must call.
pub const SELECT_BEST_MATCH: &str = "select_best_match";

/// Decision backend backed by an OpenAI chat model.
pub struct OpenAiDecisionBackend {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    tool: ChatCompletionTool,
}

impl OpenAiDecisionBackend {
    pub fn new(settings: &LlmSettings, prompts: &MatchingPrompts) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
            tool: select_best_match_tool(prompts),
        })
    }
}

/// Function definition for `select_best_match`.
pub fn select_best_match_tool(prompts: &MatchingPrompts) -> ChatCompletionTool {
    ChatCompletionTool {
        r#type: ChatCompletionToolType::Function,
        function: FunctionObject {
            name: SELECT_BEST_MATCH.to_string(),
            description: Some(prompts.tool_description.clone()),
            parameters: Some(serde_json::json!({
                "type": "object",
                "properties": {
                    "best_match_index": {
                        "type": "integer",
                        "description": "The index of the best matching video (1-based)"
                    },
                    "correct_title": {
                        "type": "string",
                        "description": prompts.title_description
                    },
                    "explanation": {
                        "type": "string",
                        "description": "A brief explanation of why this video was selected"
                    }
                },
                "required": ["best_match_index", "correct_title", "explanation"]
            })),
            strict: None,
        },
    }
}

#[async_trait]
impl DecisionBackend for OpenAiDecisionBackend {
    #[instrument(skip(self, request), fields(query = %request.query))]
    async fn decide(&self, request: &DecisionRequest) -> Result<MatchDecision> {
        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(request.system_prompt.as_str())
            .build()
            .map_err(|e| HentError::Matching(e.to_string()))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(request.user_prompt.as_str())
            .build()
            .map_err(|e| HentError::Matching(e.to_string()))?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![system.into(), user.into()])
            .tools(vec![self.tool.clone()])
            .tool_choice(ChatCompletionToolChoiceOption::Named(
                ChatCompletionNamedToolChoice {
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionName {
                        name: SELECT_BEST_MATCH.to_string(),
                    },
                },
            ))
            .build()
            .map_err(|e| HentError::Matching(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| HentError::OpenAI(format!("Chat API error: {}", e)))?;

        let call = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.tool_calls)
            .and_then(|calls| calls.into_iter().find(|c| c.function.name == SELECT_BEST_MATCH))
            .ok_or_else(|| HentError::Matching("Model did not call select_best_match".to_string()))?;

        debug!("select_best_match arguments: {}", call.function.arguments);
        parse_arguments(&call.function.arguments)
    }
}

/// Parse the JSON arguments of a `select_best_match` call.
pub(crate) fn parse_arguments(arguments: &str) -> Result<MatchDecision> {
    serde_json::from_str(arguments)
        .map_err(|e| HentError::Matching(format!("Invalid function arguments: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_schema_requires_all_fields() {
        let tool = select_best_match_tool(&MatchingPrompts::default());
        assert_eq!(tool.function.name, SELECT_BEST_MATCH);

        let params = tool.function.parameters.unwrap();
        assert_eq!(
            params["required"],
            serde_json::json!(["best_match_index", "correct_title", "explanation"])
        );
        assert_eq!(params["properties"]["best_match_index"]["type"], "integer");
    }

    #[test]
    fn test_parse_arguments() {
        let decision = parse_arguments(
            r#"{"best_match_index": 2, "correct_title": "Eagles - Hotel California", "explanation": "Official audio"}"#,
        )
        .unwrap();
        assert_eq!(decision.best_match_index, Some(2));
        assert_eq!(decision.correct_title.as_deref(), Some("Eagles - Hotel California"));
    }

    #[test]
    fn test_parse_arguments_with_missing_fields() {
        let decision = parse_arguments(r#"{"explanation": "Nothing fits"}"#).unwrap();
        assert_eq!(decision.best_match_index, None);
        assert_eq!(decision.explanation.as_deref(), Some("Nothing fits"));
    }

    #[test]
    fn test_parse_arguments_rejects_garbage() {
        assert!(parse_arguments("not json").is_err());
    }
}
