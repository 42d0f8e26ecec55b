//! Bounded retry with exponential backoff for optimistic-concurrency conflicts.
//!
//! [`retry_on_conflict`] knows nothing about nodes: it repeats an operation while a
//! caller-supplied predicate classifies the failure as a conflict, and gives up
//! after [`RetryPolicy::max_attempts`] tries.

use std::{fmt::Display, future::Future, time::Duration};

use derive_builder::Builder;
use log::debug;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct RetryPolicy {
    // first attempt included
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            multiplier: 2.0,
            max_delay: Duration::from_secs(1),
            jitter: 0.1,
        }
    }
}

impl RetryPolicyBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == Some(0) {
            return Err("max_attempts must be at least 1".to_owned());
        }

        if let Some(multiplier) = self.multiplier {
            if !(multiplier >= 1.0 && multiplier.is_finite()) {
                return Err(format!("multiplier must be a finite number >= 1, got {multiplier}"));
            }
        }

        if let Some(jitter) = self.jitter {
            if !(0.0..1.0).contains(&jitter) {
                return Err(format!("jitter must be within [0, 1), got {jitter}"));
            }
        }

        Ok(())
    }
}

impl RetryPolicy {
    /// Delay before the retry following the `retry`-th failure (zero based),
    /// without jitter.
    pub fn delay(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let delay = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);

        Duration::try_from_secs_f64(delay)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    pub fn jittered_delay(&self, retry: u32) -> Duration {
        let delay = self.delay(retry);

        if self.jitter.is_nan() || self.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }

        let jitter = self.jitter.min(1.0);
        let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));

        Duration::try_from_secs_f64(delay.as_secs_f64() * factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[derive(Debug, Error)]
pub enum RetryError<E: Display> {
    #[error("Gave up after {} conflicting attempts! Last error: {}", .attempts, .last)]
    Exhausted { attempts: u32, last: E },
    #[error("{}", .0)]
    Failed(E),
}

/// Runs `operation` until it succeeds, fails with an error `is_conflict` rejects,
/// or `policy.max_attempts` attempts have conflicted.
pub async fn retry_on_conflict<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    is_conflict: C,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(error) if !is_conflict(&error) => return Err(RetryError::Failed(error)),
            Err(error) => error,
        };

        if attempt >= policy.max_attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                last: error,
            });
        }

        let delay = policy.jittered_delay(attempt - 1);
        debug!("Attempt {attempt} conflicted ({error}), retrying in {delay:?}...");
        drop(error);

        tokio::time::sleep(delay).await;
    }
}
