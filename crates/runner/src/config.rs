//! Where the job-runner service lives and how often to poll it.

use std::collections::BTreeMap;
use std::time::Duration;

use trigger::ConfigurationError;
use url::Url;

pub const RUNNER_URL_VAR: &str = "SMARTJOB_RUNNER_URL";
pub const POLL_SECONDS_VAR: &str = "SMARTJOB_RUNNER_POLL_SECONDS";

pub const DEFAULT_RUNNER_URL: &str = "http://127.0.0.1:8081/";
pub const DEFAULT_POLL_SECONDS: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Base address of the job-runner API. Always ends with `/`.
    pub base_url: Url,
    /// Delay between two status polls while a job runs.
    pub poll_interval: Duration,
}

impl RunnerConfig {
    pub fn new(base_url: Url, poll_interval: Duration) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            poll_interval,
        }
    }

    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_vars(trigger::process_vars()?)
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: BTreeMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.is_empty())
            .collect();

        let raw_url = vars
            .get(RUNNER_URL_VAR)
            .map(String::as_str)
            .unwrap_or(DEFAULT_RUNNER_URL);
        let base_url = Url::parse(raw_url).map_err(|e| ConfigurationError::Invalid {
            variable: RUNNER_URL_VAR.to_owned(),
            value: raw_url.to_owned(),
            reason: e.to_string(),
        })?;

        let poll_seconds = match vars.get(POLL_SECONDS_VAR) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(seconds) if seconds > 0 => seconds,
                _ => {
                    return Err(ConfigurationError::Invalid {
                        variable: POLL_SECONDS_VAR.to_owned(),
                        value: raw.clone(),
                        reason: "must be a whole number of seconds, at least 1".to_owned(),
                    })
                }
            },
            None => DEFAULT_POLL_SECONDS,
        };

        Ok(Self::new(base_url, Duration::from_secs(poll_seconds)))
    }
}

/// Normalizes the base address so it always ends with `/`.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
