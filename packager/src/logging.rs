//! Log backend initialisation for the binary.
//!
//! Library modules only emit records through the `log` facade. The binary
//! installs `env_logger` with a default filter derived from `-v`/`-q`;
//! `RUST_LOG` still takes precedence when set.

use log::LevelFilter;

/// Map CLI verbosity flags to the default log filter.
///
/// # Examples
///
/// ```
/// use bindpack::logging::level_filter;
/// use log::LevelFilter;
///
/// assert_eq!(level_filter(0, false), LevelFilter::Warn);
/// assert_eq!(level_filter(2, false), LevelFilter::Debug);
/// assert_eq!(level_filter(0, true), LevelFilter::Error);
/// ```
#[must_use]
pub const fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install `env_logger` as the global logger.
///
/// Calling this more than once keeps the first logger.
pub fn init_logging(verbosity: u8, quiet: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level_filter(verbosity, quiet))
        .format_timestamp(None)
        .format_target(false)
        .parse_default_env();
    if builder.try_init().is_err() {
        // A logger is already installed.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::default(0, false, LevelFilter::Warn)]
    #[case::verbose(1, false, LevelFilter::Info)]
    #[case::very_verbose(2, false, LevelFilter::Debug)]
    #[case::trace(3, false, LevelFilter::Trace)]
    #[case::saturates(9, false, LevelFilter::Trace)]
    #[case::quiet(0, true, LevelFilter::Error)]
    fn verbosity_maps_to_filter(
        #[case] verbosity: u8,
        #[case] quiet: bool,
        #[case] expected: LevelFilter,
    ) {
        assert_eq!(level_filter(verbosity, quiet), expected);
    }
}
