use std::{env::var, str::FromStr, time::Duration};

use derive_builder::Builder;

use crate::{
    retry::{RetryPolicy, RetryPolicyBuilder},
    REGISTERED_LABEL_KEY, UNREGISTERED_TAINT_KEY,
};

use super::error::ConfigError;

pub const STABILIZATION_WINDOW_ENV: &str = "TAINT_REAPER_STABILIZATION_SECS";
pub const REQUEUE_INTERVAL_ENV: &str = "TAINT_REAPER_REQUEUE_SECS";
pub const ERROR_REQUEUE_INTERVAL_ENV: &str = "TAINT_REAPER_ERROR_REQUEUE_SECS";
pub const MIN_REFRESH_INTERVAL_ENV: &str = "TAINT_REAPER_MIN_REFRESH_SECS";
pub const RETRY_ATTEMPTS_ENV: &str = "TAINT_REAPER_RETRY_ATTEMPTS";
pub const RETRY_INITIAL_DELAY_ENV: &str = "TAINT_REAPER_RETRY_INITIAL_DELAY_MS";

const DEFAULT_STABILIZATION_WINDOW_SECS: u64 = 60;
const DEFAULT_REQUEUE_SECS: u64 = 60;
const DEFAULT_ERROR_REQUEUE_SECS: u64 = 10;
const DEFAULT_MIN_REFRESH_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct ReconcilerConfig {
    #[builder(setter(into))]
    pub registered_label: String,
    #[builder(setter(into))]
    pub marker_taint_key: String,
    pub stabilization_window: Duration,
    pub requeue_interval: Duration,
    pub error_requeue_interval: Duration,
    // shortest gap between the start of a pass and a refresh-triggered one
    pub min_refresh_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            registered_label: REGISTERED_LABEL_KEY.to_owned(),
            marker_taint_key: UNREGISTERED_TAINT_KEY.to_owned(),
            stabilization_window: Duration::from_secs(DEFAULT_STABILIZATION_WINDOW_SECS),
            requeue_interval: Duration::from_secs(DEFAULT_REQUEUE_SECS),
            error_requeue_interval: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
            min_refresh_interval: Duration::from_secs(DEFAULT_MIN_REFRESH_SECS),
            retry: RetryPolicy::default(),
        }
    }
}

impl ReconcilerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.requeue_interval.is_some_and(|interval| interval.is_zero()) {
            return Err("requeue interval must be greater than zero".to_owned());
        }

        if self
            .error_requeue_interval
            .is_some_and(|interval| interval.is_zero())
        {
            return Err("error requeue interval must be greater than zero".to_owned());
        }

        if self
            .registered_label
            .as_ref()
            .is_some_and(|label| label.is_empty())
        {
            return Err("registered label can't be empty".to_owned());
        }

        if self
            .marker_taint_key
            .as_ref()
            .is_some_and(|key| key.is_empty())
        {
            return Err("marker taint key can't be empty".to_owned());
        }

        Ok(())
    }
}

impl ReconcilerConfig {
    /// Reads overrides from `TAINT_REAPER_*` environment variables.
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut retry = RetryPolicyBuilder::default();

        if let Some(attempts) = parse_var(&lookup, RETRY_ATTEMPTS_ENV)? {
            retry.max_attempts(attempts);
        }

        if let Some(millis) = parse_var(&lookup, RETRY_INITIAL_DELAY_ENV)? {
            retry.initial_delay(Duration::from_millis(millis));
        }

        let mut builder = ReconcilerConfigBuilder::default();
        builder.retry(retry.build().map_err(ConfigError::RetryPolicy)?);

        if let Some(secs) = parse_var(&lookup, STABILIZATION_WINDOW_ENV)? {
            builder.stabilization_window(Duration::from_secs(secs));
        }

        if let Some(secs) = parse_var(&lookup, REQUEUE_INTERVAL_ENV)? {
            builder.requeue_interval(Duration::from_secs(secs));
        }

        if let Some(secs) = parse_var(&lookup, ERROR_REQUEUE_INTERVAL_ENV)? {
            builder.error_requeue_interval(Duration::from_secs(secs));
        }

        if let Some(secs) = parse_var(&lookup, MIN_REFRESH_INTERVAL_ENV)? {
            builder.min_refresh_interval(Duration::from_secs(secs));
        }

        builder.build().map_err(ConfigError::Config)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}
