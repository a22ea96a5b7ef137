//! A deterministic oracle that replays queued replies.
//!
//! Use this for tests and offline play: no network, no randomness.

use std::collections::VecDeque;

use super::{parse_reply, Oracle, OracleError, OracleReply};
use crate::context_assembler::OracleContext;

/// A request the scripted oracle received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedRequest {
    pub command: String,
    pub context: OracleContext,
}

/// Replays scripted results in order.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    model: String,
    queue: VecDeque<Result<OracleReply, OracleError>>,
    /// Returned once the queue is empty; without it an empty queue is unavailable.
    fallback: Option<OracleReply>,
    requests: Vec<ScriptedRequest>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            model: "scripted".to_string(),
            ..Self::default()
        }
    }

    /// Build from newline-separated raw reply texts, one reply per line.
    /// Lines that fail to parse replay as malformed replies.
    pub fn from_script(script: &str) -> Self {
        let mut oracle = Self::new();
        for line in script.lines().filter(|line| !line.trim().is_empty()) {
            oracle.queue.push_back(parse_reply(line));
        }
        oracle
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_reply(mut self, reply: OracleReply) -> Self {
        self.queue.push_back(Ok(reply));
        self
    }

    pub fn with_failure(mut self, error: OracleError) -> Self {
        self.queue.push_back(Err(error));
        self
    }

    pub fn with_fallback(mut self, reply: OracleReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> &[ScriptedRequest] {
        &self.requests
    }

    /// Number of queued results not yet replayed.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl Oracle for ScriptedOracle {
    fn model(&self) -> &str {
        &self.model
    }

    fn propose(&mut self, command: &str, context: &OracleContext) -> Result<OracleReply, OracleError> {
        self.requests.push(ScriptedRequest {
            command: command.to_string(),
            context: context.clone(),
        });

        match self.queue.pop_front() {
            Some(result) => result,
            None => self
                .fallback
                .clone()
                .ok_or_else(|| OracleError::Unavailable("no scripted replies left".to_string())),
        }
    }
}
