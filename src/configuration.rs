//! Config for the referee behaviors
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional. Flags are case-insensitive, set them to `"true"` to enable.
//!
//! - `CHASER_COOL_PORT`: Port Cool's bot connects to (default: `2009`)
//! - `CHASER_HOT_PORT`: Port Hot's bot connects to (default: `2010`)
//! - `CHASER_KEEP_ALIVE_MS`: Keep-alive period of connected links (default: `1000`)
//! - `CHASER_TURN_TIMEOUT_MS`: Deadline of a half-turn (default: none)
//! - `CHASER_VERBOSE`: Print match progress to stdout (default: `true`)
//! - `CHASER_LOG`: Enable logging to a file (default: `false`)

use std::time::Duration;

/// Configuration for referee behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) cool_port: u16,
    pub(crate) hot_port: u16,
    pub(crate) keep_alive: Duration,
    pub(crate) turn_timeout: Option<Duration>,
    pub(crate) verbose: bool,
    pub(crate) log: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Cool listens on port 2009 and Hot on port 2010.
    /// - Connected links send a keep-alive every second.
    /// - Half-turns have no deadline.
    /// - Match progress is printed to stdout.
    /// - Logging to file is disabled.
    pub fn new() -> Self {
        Self {
            cool_port: 2009,
            hot_port: 2010,
            keep_alive: Duration::from_secs(1),
            turn_timeout: None,
            verbose: true,
            log: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their default value.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        fn get_env_parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
            std::env::var(var).ok()?.trim().parse().ok()
        }

        let default = Self::new();
        Self {
            cool_port: get_env_parsed("CHASER_COOL_PORT").unwrap_or(default.cool_port),
            hot_port: get_env_parsed("CHASER_HOT_PORT").unwrap_or(default.hot_port),
            keep_alive: get_env_parsed("CHASER_KEEP_ALIVE_MS")
                .map(Duration::from_millis)
                .unwrap_or(default.keep_alive),
            turn_timeout: get_env_parsed("CHASER_TURN_TIMEOUT_MS").map(Duration::from_millis),
            verbose: get_env_flag("CHASER_VERBOSE", default.verbose),
            log: get_env_flag("CHASER_LOG", default.log),
        }
    }

    /// Set the port Cool's bot connects to.
    pub fn with_cool_port(mut self, port: u16) -> Self {
        self.cool_port = port;
        self
    }

    /// Set the port Hot's bot connects to.
    pub fn with_hot_port(mut self, port: u16) -> Self {
        self.hot_port = port;
        self
    }

    /// Set the keep-alive period of connected links.
    ///
    /// # Panics
    /// Panics if `period` is zero.
    pub fn with_keep_alive(mut self, period: Duration) -> Self {
        assert!(!period.is_zero(), "keep-alive period must be non-zero");
        self.keep_alive = period;
        self
    }

    /// Set (or remove) the deadline of a half-turn.
    ///
    /// When it elapses the active link is closed, and the match ends as if its bot disconnected.
    pub fn with_turn_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.turn_timeout = timeout;
        self
    }

    /// Enable or disable progress output.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Port Cool's bot connects to.
    pub fn cool_port(&self) -> u16 {
        self.cool_port
    }

    /// Port Hot's bot connects to.
    pub fn hot_port(&self) -> u16 {
        self.hot_port
    }

    /// Period of the connection probe while a bot is connected.
    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Longest a half-turn may last, if limited.
    pub fn turn_timeout(&self) -> Option<Duration> {
        self.turn_timeout
    }

    /// Print progress on stdout.
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Log to a file instead of stderr.
    pub fn log(&self) -> bool {
        self.log
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
