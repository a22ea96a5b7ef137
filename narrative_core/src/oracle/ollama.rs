//! Oracle backed by an Ollama chat endpoint.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{parse_reply, Oracle, OracleError, OracleReply};
use crate::context_assembler::{OracleContext, DEFAULT_SYSTEM_PROMPT};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434/api/chat";
pub const DEFAULT_MODEL: &str = "llama3.1:8b";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Connection settings for [`OllamaOracle`].
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    /// Upper bound on one request, connect through last byte.
    pub timeout: Duration,
    pub temperature: f32,
    pub system_prompt: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OLLAMA_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl OllamaConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}

/// Blocking client for a local Ollama server.
pub struct OllamaOracle {
    client: Client,
    config: OllamaConfig,
}

impl OllamaOracle {
    pub fn new(config: OllamaConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::Unavailable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn build_request(&self, command: &str, context: &OracleContext) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: self.config.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: context.user_message(command),
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
            },
        }
    }
}

impl Oracle for OllamaOracle {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn propose(&mut self, command: &str, context: &OracleContext) -> Result<OracleReply, OracleError> {
        let request = self.build_request(command, context);
        tracing::debug!(url = %self.config.url, model = %self.config.model, "calling oracle");

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .map_err(|e| OracleError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OracleError::Unavailable(format!(
                "status {}: {}",
                status.as_u16(),
                body
            )));
        }

        let chat: ChatResponse = response.json().map_err(envelope_error)?;

        parse_reply(&chat.message.content)
    }
}

/// A timeout while the body is still streaming is a transport failure, not a bad reply.
fn envelope_error(e: reqwest::Error) -> OracleError {
    if e.is_timeout() {
        OracleError::Unavailable(format!("timed out reading response: {e}"))
    } else {
        OracleError::Malformed(format!("unexpected response envelope: {e}"))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context_assembler::ContextAssembler;
    use game_rules::{EndConditions, GameState, Quest, RuleCatalog, TurnHistory};
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn context() -> OracleContext {
        let catalog = RuleCatalog::new(
            GameState::new("gate", 10),
            2,
            EndConditions {
                max_turns: 10,
                ..EndConditions::default()
            },
            vec!["look".to_string()],
            Quest {
                name: "Q".to_string(),
                intro: "I".to_string(),
            },
        )
        .unwrap();
        ContextAssembler::with_defaults()
            .assemble(&catalog.initial_state(), &catalog, &TurnHistory::new())
            .unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let oracle = OllamaOracle::new(OllamaConfig::default().with_model("tiny")).unwrap();
        let body = serde_json::to_value(oracle.build_request("look", &context())).unwrap();

        assert_eq!(body["model"], "tiny");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], DEFAULT_SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("Player command: look"));
        assert!(body["options"]["temperature"].is_number());
    }

    #[test]
    fn test_unreachable_server_is_unavailable() {
        let config = OllamaConfig::default()
            .with_url("http://127.0.0.1:9/api/chat")
            .with_timeout(Duration::from_secs(2));
        let mut oracle = OllamaOracle::new(config).unwrap();

        let result = oracle.propose("look", &context());
        assert!(matches!(result, Err(OracleError::Unavailable(_))));
    }

    /// Serve one request: send headers and the start of a body, then stall.
    fn stalling_server() -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/chat", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 100\r\n\r\n{\"message\":",
            );
            let _ = stream.flush();
            thread::sleep(Duration::from_secs(3));
        });
        (url, handle)
    }

    #[test]
    fn test_timeout_while_reading_body_is_unavailable() {
        let (url, handle) = stalling_server();
        let config = OllamaConfig::default()
            .with_url(url)
            .with_timeout(Duration::from_millis(500));
        let mut oracle = OllamaOracle::new(config).unwrap();

        let result = oracle.propose("look", &context());
        assert!(
            matches!(result, Err(OracleError::Unavailable(_))),
            "got {result:?}"
        );
        handle.join().unwrap();
    }
}
