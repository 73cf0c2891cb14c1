use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde_json::json;

use crate::config::Config;
use crate::errors::AgentError;
use crate::types::{Perception, Plan};

const SYSTEM_PROMPT: &str = r#"You are a desktop automation agent. You see a screenshot of the user's screen and control the mouse and keyboard.
Return ONLY a JSON array of action objects with fields {action,x,y,rel_x,rel_y,text,seconds,amount}.
Valid actions: move_mouse, click_mouse, write, wait, open_app, scroll, press_key, hotkey.
x/y are pixels; rel_x/rel_y are fractions of the screen in [0,1]. hotkey joins keys with '+', e.g. "ctrl+shift+a".
Return an empty array [] when the instruction is fully accomplished. No markdown, no explanation."#;

/// Asks the remote planner for the next actions given an instruction and a
/// fresh observation.
#[async_trait]
pub trait PlanningClient: Send {
    async fn plan(&mut self, instruction: &str, perception: &Perception)
    -> Result<Plan, AgentError>;
}

/// Gemini-backed planner. One stateless, zero-temperature request per round.
pub struct Brain {
    client: Client,
    api_key: String,
    model: String,
}

impl Brain {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl PlanningClient for Brain {
    async fn plan(
        &mut self,
        instruction: &str,
        perception: &Perception,
    ) -> Result<Plan, AgentError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": SYSTEM_PROMPT },
                    { "inlineData": {
                        "mimeType": "image/png",
                        "data": STANDARD.encode(&perception.png),
                    }},
                    { "text": instruction },
                ],
            }],
            "generationConfig": { "temperature": 0 },
        });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::PlanningUnavailable(e.to_string()))?;

        let status = response.status();
        let json_resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AgentError::PlanningUnavailable(e.to_string()))?;

        if !status.is_success() {
            let message = json_resp["error"]["message"]
                .as_str()
                .unwrap_or("unknown API error");
            return Err(AgentError::PlanningUnavailable(format!("{status}: {message}")));
        }

        let content = json_resp["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                AgentError::PlanningUnavailable(format!("no text candidate in response: {json_resp}"))
            })?;

        tracing::debug!(reply = content, "planner replied");
        decode_plan(content)
    }
}

/// Decode the model's reply into a plan. Models occasionally wrap the JSON
/// in markdown fences despite the prompt; strip them before parsing.
pub fn decode_plan(content: &str) -> Result<Plan, AgentError> {
    let cleaned = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    serde_json::from_str(cleaned)
        .map_err(|e| AgentError::MalformedResponse(format!("{e}; content: {cleaned}")))
}
