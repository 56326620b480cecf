use super::TryOnService;
use crate::encoder::EncodedImage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted outcome of one mock generation call.
#[derive(Debug, Clone)]
enum MockOutcome {
    Image(String),
    Empty,
    Transport(String),
}

/// In-memory [`TryOnService`] for tests and harnesses.
///
/// Clones share their counters, so a probe clone can observe calls made
/// through a boxed copy.
#[derive(Clone)]
pub struct MockTryOnClient {
    outcomes: Arc<Mutex<Vec<MockOutcome>>>,
    requests: Arc<Mutex<Vec<(EncodedImage, EncodedImage)>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockTryOnClient {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    pub fn with_image_response(self, payload: String) -> Self {
        self.outcomes.lock().unwrap().push(MockOutcome::Image(payload));
        self
    }

    pub fn with_empty_response(self) -> Self {
        self.outcomes.lock().unwrap().push(MockOutcome::Empty);
        self
    }

    pub fn with_transport_failure(self, detail: String) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push(MockOutcome::Transport(detail));
        self
    }

    /// Hold every call for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<(EncodedImage, EncodedImage)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockTryOnClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TryOnService for MockTryOnClient {
    async fn generate(&self, person: &EncodedImage, clothing: &EncodedImage) -> Result<String> {
        let outcome = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;

            self.requests
                .lock()
                .unwrap()
                .push((person.clone(), clothing.clone()));

            let outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                // 1x1 transparent PNG
                MockOutcome::Image(
                    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg=="
                        .to_string(),
                )
            } else {
                outcomes[(*count - 1) % outcomes.len()].clone()
            }
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match outcome {
            MockOutcome::Image(payload) => Ok(payload),
            MockOutcome::Empty => Err(Error::EmptyResponse(
                "The model did not return an image".to_string(),
            )),
            MockOutcome::Transport(detail) => Err(Error::Transport(detail)),
        }
    }
}
