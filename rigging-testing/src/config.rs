// Runner configuration

use rigging_core::logging::LogConfig;

/// Settings applied when a test container is built
///
/// ```
/// use rigging_core::logging::{LogConfig, LogLevel};
/// use rigging_testing::RunnerConfig;
///
/// let config = RunnerConfig::new()
///     .strict_groups(true)
///     .with_logging(LogConfig::new().level(LogLevel::Debug));
///
/// assert!(config.validate_dependencies);
/// assert!(config.strict_groups);
/// ```
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Fail the build when a binding depends on an unbound key
    pub validate_dependencies: bool,
    /// Reject multi-bindings that merge into a group they did not create
    pub strict_groups: bool,
    /// Subscriber to install before the first container is built
    pub logging: Option<LogConfig>,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate_dependencies(mut self, enable: bool) -> Self {
        self.validate_dependencies = enable;
        self
    }

    pub fn strict_groups(mut self, enable: bool) -> Self {
        self.strict_groups = enable;
        self
    }

    pub fn with_logging(mut self, logging: LogConfig) -> Self {
        self.logging = Some(logging);
        self
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            validate_dependencies: true,
            strict_groups: false,
            logging: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::default();
        assert!(config.validate_dependencies);
        assert!(!config.strict_groups);
        assert!(config.logging.is_none());
    }

    #[test]
    fn test_builder() {
        let config = RunnerConfig::new()
            .validate_dependencies(false)
            .strict_groups(true)
            .with_logging(LogConfig::new());
        assert!(!config.validate_dependencies);
        assert!(config.strict_groups);
        assert!(config.logging.is_some());
    }
}
