//! Process-wide logger setup on top of `env_logger`

/// Filter used when neither an explicit filter nor `RUST_LOG` is given.
/// wgpu internals are noisy at `info`, so they are held at `warn`.
pub const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

/// How the demos and host applications want logging set up
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// `env_logger` filter directives, e.g. "pallet3d=debug,warn"
    pub filter: Option<String>,
    /// Strip ANSI colors, for logs that go to files or CI
    pub plain: bool,
}

impl LoggingConfig {
    pub fn with_filter(mut self, filter: &str) -> Self {
        self.filter = Some(filter.to_owned());
        self
    }

    pub fn plain(mut self) -> Self {
        self.plain = true;
        self
    }

    /// Filter directives in effect: explicit filter, then `RUST_LOG`, then
    /// [`DEFAULT_FILTER`]
    pub fn resolved_filter(&self) -> String {
        self.filter
            .clone()
            .or_else(|| std::env::var("RUST_LOG").ok().filter(|f| !f.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_FILTER.to_owned())
    }
}

/// Installs the global logger.
///
/// Returns `false` when a logger is already installed, either by an earlier
/// call or by the host application; the existing logger and its level are
/// left untouched in that case.
pub fn init_logging(config: LoggingConfig) -> bool {
    let filter = config.resolved_filter();
    let style = if config.plain {
        env_logger::WriteStyle::Never
    } else {
        env_logger::WriteStyle::Auto
    };

    let installed = env_logger::Builder::new()
        .parse_filters(&filter)
        .write_style(style)
        .format_timestamp_millis()
        .try_init()
        .is_ok();

    if installed {
        log::debug!("logging initialized with filter \"{filter}\"");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::LevelFilter;

    #[test]
    fn test_explicit_filter_wins() {
        let config = LoggingConfig::default().with_filter("pallet3d=trace");
        assert_eq!(config.resolved_filter(), "pallet3d=trace");
        assert!(!config.plain);
        assert!(config.plain().plain);
    }

    #[test]
    fn test_first_init_sets_level_and_later_inits_keep_it() {
        // the only test in this crate that installs the global logger
        assert!(init_logging(LoggingConfig::default().with_filter("warn").plain()));
        assert_eq!(log::max_level(), LevelFilter::Warn);
        assert!(log::log_enabled!(log::Level::Warn));
        assert!(!log::log_enabled!(log::Level::Info));

        assert!(!init_logging(LoggingConfig::default().with_filter("trace")));
        assert_eq!(log::max_level(), LevelFilter::Warn);
    }
}
