/*!
 * Mock provider for testing.
 *
 * `MockProvider` answers prompts built by the translation engine without a
 * network. Its default answer is a numbered list echoing every requested
 * cue in upper case, which keeps word counts and line breaks intact so
 * markup restoration can be checked exactly.
 *
 * - `MockProvider::working()` - Always succeeds
 * - `MockProvider::fail_times(n)` - Fails `n` times with a 503, then succeeds
 * - `MockProvider::failing()` - Always fails with a 500
 * - `MockProvider::scripted(..)` - Replays a fixed list of results first
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::{CompletionProvider, CompletionRequest};

/// Header of a cue in the user prompt: `12. 00:00:01,000 --> 00:00:02,000`
static CUE_HEADER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\. \d+:\d{2}:\d{2},\d{3} --> \d+:\d{2}:\d{2},\d{3}$").unwrap());

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails the first `failures` calls with a retryable error
    FailTimes { failures: usize },
    /// Fails every Nth call
    Intermittent { fail_every: usize },
    /// Always fails with a retryable server error
    Failing,
    /// Always fails with an authentication error
    Unauthorized,
    /// Returns an empty body
    Empty,
    /// Succeeds after sleeping
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Calls so far, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every request received, in order
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    /// Results replayed before `behavior` applies
    script: Arc<Mutex<VecDeque<Result<String, ProviderError>>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&CompletionRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a provider failing `failures` times before succeeding
    pub fn fail_times(failures: usize) -> Self {
        Self::new(MockBehavior::FailTimes { failures })
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that rejects its credentials
    pub fn unauthorized() -> Self {
        Self::new(MockBehavior::Unauthorized)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that answers after `delay_ms`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a working mock that first replays `results`
    pub fn scripted(results: Vec<Result<String, ProviderError>>) -> Self {
        let provider = Self::working();
        provider.script.lock().extend(results);
        provider
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&CompletionRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of `complete` calls so far
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copies of all requests received so far
    pub fn recorded_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }

    /// Echo the cues of a user prompt as an upper-cased numbered list
    pub fn echo_numbered(request: &CompletionRequest) -> String {
        let mut entries: Vec<(String, Vec<String>)> = Vec::new();
        let mut in_cue = false;

        for line in request.user_prompt.lines() {
            if let Some(caps) = CUE_HEADER_REGEX.captures(line) {
                entries.push((caps[1].to_string(), Vec::new()));
                in_cue = true;
            } else if line.trim().is_empty() {
                in_cue = false;
            } else if in_cue {
                if let Some((_, lines)) = entries.last_mut() {
                    lines.push(line.to_uppercase());
                }
            }
        }

        entries
            .into_iter()
            .map(|(number, lines)| format!("{}. {}", number, lines.join("\n")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn respond(&self, request: &CompletionRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => Self::echo_numbered(request),
        }
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());

        if let Some(result) = self.script.lock().pop_front() {
            return result;
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(request)),

            MockBehavior::FailTimes { failures } if count < failures => Err(ProviderError::ApiError {
                status_code: 503,
                message: format!("Simulated failure (request #{})", count + 1),
            }),
            MockBehavior::FailTimes { .. } => Ok(self.respond(request)),

            MockBehavior::Intermittent { fail_every } if count % fail_every.max(1) == fail_every.max(1) - 1 => {
                Err(ProviderError::ApiError {
                    status_code: 503,
                    message: format!("Simulated intermittent failure (request #{})", count + 1),
                })
            }
            MockBehavior::Intermittent { .. } => Ok(self.respond(request)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),

            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError("Invalid API key".to_string())),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(self.respond(request))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Unauthorized => Err(ProviderError::AuthenticationError("Invalid API key".to_string())),
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated outage".to_string())),
            _ => Ok(()),
        }
    }
}
