//! Layered configuration resolution.
//!
//! Precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (`EASYPBT_*`)
//! 3. Defaults
//!
//! Every resolved value remembers where it came from, so callers can report
//! the effective configuration.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Environment variable overriding the test-file suffix pattern.
pub const ENV_TEST_SUFFIX: &str = "EASYPBT_TEST_SUFFIX";
/// Environment variable overriding the external generator program.
pub const ENV_GENERATOR: &str = "EASYPBT_GENERATOR";
/// Environment variable overriding the generator timeout (seconds).
pub const ENV_GENERATOR_TIMEOUT: &str = "EASYPBT_GENERATOR_TIMEOUT";

/// Default suffix inserted before `.py` when deriving the test file name.
pub const DEFAULT_TEST_SUFFIX: &str = "_test";
/// Default generator program, looked up on `PATH`.
pub const DEFAULT_GENERATOR: &str = "hypothesis";
/// Default bound on a single generator invocation.
pub const DEFAULT_GENERATOR_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// Configuration Sources
// ============================================================================

/// Configuration value source (for precedence tracking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigSource {
    /// Built-in default value.
    Default = 0,
    /// From environment variable.
    EnvVar = 1,
    /// From CLI flag (highest precedence).
    CliFlag = 2,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValue<T> {
    /// The actual value.
    pub value: T,
    /// Where the value came from.
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    /// Create a new config value with the given source.
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }
}

// ============================================================================
// CLI Overrides
// ============================================================================

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    /// --test-suffix flag.
    pub test_suffix: Option<String>,
    /// --generator flag.
    pub generator: Option<PathBuf>,
    /// --generator-timeout flag (seconds).
    pub generator_timeout_secs: Option<u64>,
}

// ============================================================================
// Resolved Configuration
// ============================================================================

/// Resolved configuration with precedence information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Suffix inserted before `.py` in the test file name.
    pub test_suffix: ConfigValue<String>,
    /// External generator program (name or path).
    pub generator: ConfigValue<PathBuf>,
    /// Bound on a single generator invocation.
    pub generator_timeout: ConfigValue<Duration>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ResolvedConfig {
            test_suffix: ConfigValue::new(DEFAULT_TEST_SUFFIX.to_string(), ConfigSource::Default),
            generator: ConfigValue::new(PathBuf::from(DEFAULT_GENERATOR), ConfigSource::Default),
            generator_timeout: ConfigValue::new(DEFAULT_GENERATOR_TIMEOUT, ConfigSource::Default),
        }
    }
}

impl ResolvedConfig {
    /// Resolve configuration from the process environment and CLI flags.
    pub fn resolve(cli_overrides: &CliOverrides) -> Self {
        Self::resolve_with(cli_overrides, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with an explicit environment lookup.
    ///
    /// Tests use this to avoid mutating the process environment.
    pub fn resolve_with<F>(cli_overrides: &CliOverrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ResolvedConfig::default();
        config.apply_env_vars(env);
        config.apply_cli_overrides(cli_overrides);
        config
    }

    fn apply_env_vars<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(suffix) = env(ENV_TEST_SUFFIX) {
            self.test_suffix = ConfigValue::new(suffix, ConfigSource::EnvVar);
        }

        if let Some(generator) = env(ENV_GENERATOR) {
            self.generator = ConfigValue::new(PathBuf::from(generator), ConfigSource::EnvVar);
        }

        if let Some(timeout) = env(ENV_GENERATOR_TIMEOUT) {
            match timeout.trim().parse::<u64>() {
                Ok(secs) => {
                    self.generator_timeout =
                        ConfigValue::new(Duration::from_secs(secs), ConfigSource::EnvVar);
                }
                Err(_) => warn!(
                    "ignoring {}={:?}: expected a whole number of seconds",
                    ENV_GENERATOR_TIMEOUT, timeout
                ),
            }
        }
    }

    fn apply_cli_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(ref suffix) = overrides.test_suffix {
            self.test_suffix = ConfigValue::new(suffix.clone(), ConfigSource::CliFlag);
        }

        if let Some(ref generator) = overrides.generator {
            self.generator = ConfigValue::new(generator.clone(), ConfigSource::CliFlag);
        }

        if let Some(secs) = overrides.generator_timeout_secs {
            self.generator_timeout =
                ConfigValue::new(Duration::from_secs(secs), ConfigSource::CliFlag);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
