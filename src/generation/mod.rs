//! Text generation boundary
//!
//! The generation service is opaque: a prompt goes in, text comes out. Every
//! call is bounded by the configured deadline and never retried here.

pub mod gemini;
pub mod prompts;

pub use gemini::GeminiClient;

use crate::error::AppError;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A text-generation service
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AppError>;
}

/// Call `generator` once, giving up after `deadline`.
///
/// On expiry the in-flight request is dropped and `AppError::Timeout` is
/// returned. Failures are passed through unchanged.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    prompt: &str,
    deadline: Duration,
) -> Result<String, AppError> {
    let started = Instant::now();

    match tokio::time::timeout(deadline, generator.generate(prompt)).await {
        Ok(Ok(text)) => {
            debug!(
                "Generated {} chars from a {} char prompt in {:?}",
                text.len(),
                prompt.len(),
                started.elapsed()
            );
            Ok(text)
        }
        Ok(Err(e)) => {
            warn!("Text generation failed after {:?}: {}", started.elapsed(), e);
            Err(e)
        }
        Err(_) => {
            warn!("Text generation abandoned after {:?}", deadline);
            Err(AppError::Timeout(deadline.as_secs()))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned generator: replies with fixed text, fails, or stalls
    pub(crate) struct ScriptedGenerator {
        reply: Result<String, String>,
        delay: Duration,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                ..Self::replying("")
            }
        }

        pub(crate) fn stalling(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::replying("late")
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn last_prompt(&self) -> Option<String> {
            self.prompts.lock().unwrap().last().cloned()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.reply.clone().map_err(AppError::ServiceError)
        }
    }
}
