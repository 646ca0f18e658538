//! Config for the referee behaviors
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional, and case-insensitive. Set the value to `"true"` to enable a flag.
//!
//! - `KINGSHEEP_VERBOSE`: Print match results and disqualifications to stdout (default: `true`)
//! - `KINGSHEEP_LOG`: Enable logging to a file (default: `false`)

/// Configuration for referee behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - The referee prints results and disqualifications to stdout.
    /// - Logging to file is disabled.
    pub fn new() -> Self {
        Self {
            verbose: true,
            log: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// The following environment variables are recognized:
    /// - `KINGSHEEP_VERBOSE`: if set to `"true"`, enables verbose output (default: `true`)
    /// - `KINGSHEEP_LOG`: if set to `"true"`, enables logging to file (default: `false`)
    ///
    /// Any other value disables the flag; unset variables keep the default.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        Self {
            verbose: get_env_flag("KINGSHEEP_VERBOSE", true),
            log: get_env_flag("KINGSHEEP_LOG", false),
        }
    }

    /// Enable or disable printing to stdout.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
