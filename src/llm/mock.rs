use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::GenerativeModel;
use super::error::ModelError;

enum Step {
    Reply(String),
    Fail(ModelError),
    Hang(Duration),
}

/// Scripted [`GenerativeModel`]. Steps are consumed in order; the last one repeats.
pub struct MockModel {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Instant>>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockModel {
    fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::from_steps(vec![Step::Reply(text.into())])
    }

    /// Always fails.
    pub fn failing() -> Self {
        Self::from_steps(vec![Step::Fail(ModelError::Provider {
            message: "connection refused".to_string(),
        })])
    }

    /// Fails `failures` times, then answers `text`.
    pub fn failing_then(failures: usize, text: impl Into<String>) -> Self {
        let mut steps: Vec<Step> = (0..failures)
            .map(|_| {
                Step::Fail(ModelError::Provider {
                    message: "connection refused".to_string(),
                })
            })
            .collect();
        steps.push(Step::Reply(text.into()));
        Self::from_steps(steps)
    }

    /// Sleeps `delay` before answering `text`, for timeout tests.
    pub fn hanging_then(delay: Duration, text: impl Into<String>) -> Self {
        Self::from_steps(vec![Step::Hang(delay), Step::Reply(text.into())])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// When each attempt started (tokio clock, so paused-time tests see virtual instants).
    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().clone()
    }

    /// `(system, user)` pairs received.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().clone()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock();
        let step = if steps.len() > 1 {
            steps.pop_front()
        } else {
            None
        };
        match step {
            Some(step) => step,
            None => match steps.front() {
                Some(Step::Reply(text)) => Step::Reply(text.clone()),
                Some(Step::Fail(e)) => Step::Fail(e.clone()),
                Some(Step::Hang(d)) => Step::Hang(*d),
                None => Step::Fail(ModelError::EmptyResponse),
            },
        }
    }
}

#[async_trait]
impl GenerativeModel for MockModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError> {
        self.calls.lock().push(Instant::now());
        self.prompts
            .lock()
            .push((system.to_string(), user.to_string()));

        match self.next_step() {
            Step::Reply(text) => Ok(text),
            Step::Fail(e) => Err(e),
            Step::Hang(delay) => {
                tokio::time::sleep(delay).await;
                Err(ModelError::EmptyResponse)
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
