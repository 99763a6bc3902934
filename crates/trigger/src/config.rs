//! Process-wide configuration, read once from the environment at startup.
//!
//! Every value is resolved when the process starts; handlers receive the
//! resulting [`GatewayConfig`] by reference and never consult the environment
//! themselves. Parsing is written against an arbitrary set of `(name, value)`
//! pairs ([`GatewayConfig::from_vars`]) so it can be exercised without
//! touching the real process environment.
//!
//! | Variable | Required | Default |
//! |----------|----------|---------|
//! | `SMARTJOB_PROJECT` | yes | |
//! | `SMARTJOB_REGION` | yes | |
//! | `SMARTJOB_STAGING` | yes | |
//! | `SMARTJOB_DOCKER_IMAGE` | yes | |
//! | `SMARTJOB_LOG_LEVEL` | no | `INFO` |
//! | `SMARTJOB_TIMEOUT_SECONDS` | no | `3600` |
//! | `SMARTJOB_MAX_ATTEMPTS` | no | `3` |
//! | `SMARTJOB_SERVICE_ACCOUNT` | no | none |
//! | `SMARTJOB_CPU` | no | `1.0` |
//! | `SMARTJOB_MEMORY_GB` | no | `0.5` |
//! | `SMARTJOB_MACHINE_TYPE` | no | none |
//! | `SMARTJOB_ADD_ENV_<KEY>` | no | job variable `<KEY>` |
//! | `SMARTJOB_ADD_LABEL_<KEY>` | no | job label `<key>` |

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::str::FromStr;

use tracing::Level;

use crate::errors::ConfigurationError;
use crate::types::{Placement, ResourceSpec};

pub const PROJECT_VAR: &str = "SMARTJOB_PROJECT";
pub const REGION_VAR: &str = "SMARTJOB_REGION";
pub const STAGING_VAR: &str = "SMARTJOB_STAGING";
pub const IMAGE_VAR: &str = "SMARTJOB_DOCKER_IMAGE";
pub const LOG_LEVEL_VAR: &str = "SMARTJOB_LOG_LEVEL";
pub const TIMEOUT_VAR: &str = "SMARTJOB_TIMEOUT_SECONDS";
pub const MAX_ATTEMPTS_VAR: &str = "SMARTJOB_MAX_ATTEMPTS";
pub const SERVICE_ACCOUNT_VAR: &str = "SMARTJOB_SERVICE_ACCOUNT";
pub const CPU_VAR: &str = "SMARTJOB_CPU";
pub const MEMORY_GB_VAR: &str = "SMARTJOB_MEMORY_GB";
pub const MACHINE_TYPE_VAR: &str = "SMARTJOB_MACHINE_TYPE";

/// Variables with this prefix are forwarded into every job, prefix stripped.
pub const EXTRA_ENV_PREFIX: &str = "SMARTJOB_ADD_ENV_";
/// Variables with this prefix become job labels, prefix stripped and key lower-cased.
pub const LABEL_PREFIX: &str = "SMARTJOB_ADD_LABEL_";

/// Every variable this service reads starts with this prefix.
pub const VAR_PREFIX: &str = "SMARTJOB_";

/// Default job timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 3600;
/// Default number of attempts the runner may make.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

/// Everything a handler needs that does not come from the inbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    /// Minimum level for log output when `RUST_LOG` is not set.
    pub log_level: Level,
    /// Defaults applied to every job request.
    pub job: JobDefaults,
}

/// Job-launch defaults shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDefaults {
    pub placement: Placement,
    pub container_image: String,
    pub resources: ResourceSpec,
    pub timeout_seconds: u64,
    /// Passed through to the runner; not enforced here.
    pub max_attempts: u32,
    pub service_account: Option<String>,
    /// Variables forwarded into every job before the derived input path is added.
    pub extra_env: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
}

impl GatewayConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_vars(process_vars()?)
    }

    /// Reads the configuration from `(name, value)` pairs.
    ///
    /// Empty values are treated as absent.
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

        let placement = Placement {
            project: required(&vars, PROJECT_VAR)?,
            region: required(&vars, REGION_VAR)?,
            staging: required(&vars, STAGING_VAR)?,
        };
        let container_image = required(&vars, IMAGE_VAR)?;

        let log_level = match vars.get(LOG_LEVEL_VAR) {
            Some(raw) => parse_level(raw)?,
            None => Level::INFO,
        };

        let resources = ResourceSpec {
            cpu: positive_f64(&vars, CPU_VAR, ResourceSpec::DEFAULT_CPU)?,
            memory_gb: positive_f64(&vars, MEMORY_GB_VAR, ResourceSpec::DEFAULT_MEMORY_GB)?,
            machine_type: vars.get(MACHINE_TYPE_VAR).cloned(),
        };

        let timeout_seconds = parsed(&vars, TIMEOUT_VAR, DEFAULT_TIMEOUT_SECONDS)?;
        if timeout_seconds == 0 {
            return Err(invalid(TIMEOUT_VAR, "0", "must be at least 1"));
        }
        let max_attempts = parsed(&vars, MAX_ATTEMPTS_VAR, DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(invalid(MAX_ATTEMPTS_VAR, "0", "must be at least 1"));
        }

        let extra_env = stripped(&vars, EXTRA_ENV_PREFIX, |key| key.to_owned());
        let labels = stripped(&vars, LABEL_PREFIX, str::to_lowercase);

        Ok(Self {
            log_level,
            job: JobDefaults {
                placement,
                container_image,
                resources,
                timeout_seconds,
                max_attempts,
                service_account: vars.get(SERVICE_ACCOUNT_VAR).cloned(),
                extra_env,
                labels,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Environment access
// ---------------------------------------------------------------------------

/// The process environment as UTF-8 `(name, value)` pairs.
pub fn process_vars() -> Result<Vec<(String, String)>, ConfigurationError> {
    utf8_vars(std::env::vars_os())
}

/// Drops pairs that are not valid UTF-8, except that a [`VAR_PREFIX`] variable
/// with a non-UTF-8 value is reported instead of silently ignored.
fn utf8_vars<I>(vars: I) -> Result<Vec<(String, String)>, ConfigurationError>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    let mut pairs = Vec::new();
    for (name, value) in vars {
        let Ok(name) = name.into_string() else {
            continue;
        };
        match value.into_string() {
            Ok(value) => pairs.push((name, value)),
            Err(raw) if name.starts_with(VAR_PREFIX) => {
                return Err(invalid(
                    &name,
                    &raw.to_string_lossy(),
                    "value is not valid UTF-8",
                ));
            }
            Err(_) => {}
        }
    }
    Ok(pairs)
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn required(vars: &BTreeMap<String, String>, name: &str) -> Result<String, ConfigurationError> {
    vars.get(name).cloned().ok_or_else(|| ConfigurationError::Missing {
        variable: name.to_owned(),
    })
}

fn parsed<T>(
    vars: &BTreeMap<String, String>,
    name: &str,
    default: T,
) -> Result<T, ConfigurationError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| invalid(name, raw, &e.to_string())),
        None => Ok(default),
    }
}

fn positive_f64(
    vars: &BTreeMap<String, String>,
    name: &str,
    default: f64,
) -> Result<f64, ConfigurationError> {
    let value: f64 = parsed(vars, name, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(name, &value.to_string(), "must be a positive number"))
    }
}

/// Accepts the usual level names in any case, plus `WARNING` and `CRITICAL`.
fn parse_level(raw: &str) -> Result<Level, ConfigurationError> {
    let normalized = match raw.trim().to_ascii_uppercase().as_str() {
        "WARNING" => "WARN".to_owned(),
        "CRITICAL" | "FATAL" => "ERROR".to_owned(),
        other => other.to_owned(),
    };
    Level::from_str(&normalized).map_err(|e| invalid(LOG_LEVEL_VAR, raw, &e.to_string()))
}

/// Collects every variable starting with `prefix`, keyed by the remainder.
///
/// A bare prefix (nothing after it) is ignored.
fn stripped(
    vars: &BTreeMap<String, String>,
    prefix: &str,
    key: impl Fn(&str) -> String,
) -> BTreeMap<String, String> {
    vars.iter()
        .filter_map(|(name, value)| {
            let rest = name.strip_prefix(prefix)?;
            (!rest.is_empty()).then(|| (key(rest), value.clone()))
        })
        .collect()
}

fn invalid(variable: &str, value: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::Invalid {
        variable: variable.to_owned(),
        value: value.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mandatory() -> Vec<(&'static str, &'static str)> {
        vec![
            (PROJECT_VAR, "my-project"),
            (REGION_VAR, "europe-west1"),
            (STAGING_VAR, "gs://staging-bucket/smartjob"),
            (IMAGE_VAR, "docker.io/library/python:3.12"),
        ]
    }

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut vars = mandatory();
        vars.extend_from_slice(extra);
        vars
    }

    #[test]
    fn defaults_apply_when_only_mandatory_vars_are_set() {
        let config = GatewayConfig::from_vars(mandatory()).unwrap();

        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.job.placement.project, "my-project");
        assert_eq!(config.job.placement.region, "europe-west1");
        assert_eq!(config.job.placement.staging, "gs://staging-bucket/smartjob");
        assert_eq!(config.job.container_image, "docker.io/library/python:3.12");
        assert_eq!(config.job.resources, ResourceSpec::default());
        assert_eq!(config.job.timeout_seconds, 3600);
        assert_eq!(config.job.max_attempts, 3);
        assert!(config.job.service_account.is_none());
        assert!(config.job.extra_env.is_empty());
        assert!(config.job.labels.is_empty());
    }

    #[rstest]
    #[case::project(PROJECT_VAR)]
    #[case::region(REGION_VAR)]
    #[case::staging(STAGING_VAR)]
    #[case::image(IMAGE_VAR)]
    fn missing_mandatory_var_is_named(#[case] name: &str) {
        let vars: Vec<_> = mandatory().into_iter().filter(|(k, _)| *k != name).collect();
        assert_eq!(
            GatewayConfig::from_vars(vars).unwrap_err(),
            ConfigurationError::Missing {
                variable: name.to_owned()
            }
        );
    }

    #[test]
    fn empty_mandatory_var_counts_as_missing() {
        let vars: Vec<_> = mandatory()
            .into_iter()
            .map(|(k, v)| if k == IMAGE_VAR { (k, "") } else { (k, v) })
            .collect();
        assert!(matches!(
            GatewayConfig::from_vars(vars),
            Err(ConfigurationError::Missing { variable }) if variable == IMAGE_VAR
        ));
    }

    #[test]
    fn optional_values_override_defaults() {
        let config = GatewayConfig::from_vars(with(&[
            (LOG_LEVEL_VAR, "debug"),
            (TIMEOUT_VAR, "600"),
            (MAX_ATTEMPTS_VAR, "1"),
            (SERVICE_ACCOUNT_VAR, "runner@my-project.iam.gserviceaccount.com"),
            (CPU_VAR, "4"),
            (MEMORY_GB_VAR, "16"),
            (MACHINE_TYPE_VAR, "n2-standard-4"),
        ]))
        .unwrap();

        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.job.timeout_seconds, 600);
        assert_eq!(config.job.max_attempts, 1);
        assert_eq!(
            config.job.service_account.as_deref(),
            Some("runner@my-project.iam.gserviceaccount.com")
        );
        assert_eq!(config.job.resources.cpu, 4.0);
        assert_eq!(config.job.resources.memory_gb, 16.0);
        assert_eq!(
            config.job.resources.machine_type.as_deref(),
            Some("n2-standard-4")
        );
    }

    #[test]
    fn prefixed_vars_are_stripped() {
        let config = GatewayConfig::from_vars(with(&[
            ("SMARTJOB_ADD_ENV_FOO", "bar"),
            ("SMARTJOB_ADD_ENV_Mixed_Case", "kept"),
            ("SMARTJOB_ADD_ENV_", "ignored"),
            ("SMARTJOB_ADD_LABEL_TEAM", "data"),
            ("UNRELATED", "x"),
        ]))
        .unwrap();

        let expected: BTreeMap<String, String> = [("FOO", "bar"), ("Mixed_Case", "kept")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        assert_eq!(config.job.extra_env, expected);
        assert_eq!(config.job.labels.get("team").map(String::as_str), Some("data"));
        assert_eq!(config.job.labels.len(), 1);
    }

    #[rstest]
    #[case::warning("WARNING", Level::WARN)]
    #[case::critical("CRITICAL", Level::ERROR)]
    #[case::lower("info", Level::INFO)]
    #[case::trace("TRACE", Level::TRACE)]
    fn log_level_names(#[case] raw: &'static str, #[case] expected: Level) {
        let config = GatewayConfig::from_vars(with(&[(LOG_LEVEL_VAR, raw)])).unwrap();
        assert_eq!(config.log_level, expected);
    }

    #[rstest]
    #[case::timeout_text(TIMEOUT_VAR, "soon")]
    #[case::timeout_zero(TIMEOUT_VAR, "0")]
    #[case::attempts_negative(MAX_ATTEMPTS_VAR, "-1")]
    #[case::attempts_zero(MAX_ATTEMPTS_VAR, "0")]
    #[case::cpu_text(CPU_VAR, "lots")]
    #[case::cpu_zero(CPU_VAR, "0")]
    #[case::memory_negative(MEMORY_GB_VAR, "-2")]
    #[case::memory_nan(MEMORY_GB_VAR, "NaN")]
    #[case::log_level(LOG_LEVEL_VAR, "chatty")]
    fn invalid_values_are_rejected(#[case] name: &'static str, #[case] raw: &'static str) {
        match GatewayConfig::from_vars(with(&[(name, raw)])) {
            Err(ConfigurationError::Invalid { variable, .. }) => assert_eq!(variable, name),
            other => panic!("expected invalid {name}, got {other:?}"),
        }
    }

    #[test]
    fn utf8_pairs_are_kept() {
        let vars = utf8_vars([(OsString::from(PROJECT_VAR), OsString::from("p"))]).unwrap();
        assert_eq!(vars, vec![(PROJECT_VAR.to_owned(), "p".to_owned())]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_values_are_skipped_or_reported() {
        use std::os::unix::ffi::OsStringExt;

        let garbage = || OsString::from_vec(vec![0x66, 0x6f, 0x80]);

        let vars = utf8_vars([
            (OsString::from("UNRELATED"), garbage()),
            (garbage(), OsString::from("value")),
            (OsString::from(REGION_VAR), OsString::from("r")),
        ])
        .unwrap();
        assert_eq!(vars, vec![(REGION_VAR.to_owned(), "r".to_owned())]);

        match utf8_vars([(OsString::from(IMAGE_VAR), garbage())]) {
            Err(ConfigurationError::Invalid { variable, reason, .. }) => {
                assert_eq!(variable, IMAGE_VAR);
                assert_eq!(reason, "value is not valid UTF-8");
            }
            other => panic!("expected invalid {IMAGE_VAR}, got {other:?}"),
        }
    }
}
