//! Timing and length rules of a match.
//!
//! The main entry point is the [`RulesBuilder`], which uses a builder pattern. Unset values
//! fall back to the standard King Sheep rules:
//!
//! - **Think limit**: 1000 ms per think step. A creature that thinks longer is disqualified.
//! - **Grace**: 100 ms on top of the think limit before the simulator stops waiting, to
//!   absorb scheduling jitter.
//! - **Turns**: 100 turns per match.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use king_sheep::rules::RulesBuilder;
//!
//! let rules = RulesBuilder::new()
//!     .with_think_limit(Duration::from_millis(200))
//!     .with_max_turns(50)
//!     .build()
//!     .unwrap();
//! assert_eq!(rules.deadline(), Duration::from_millis(300));
//! ```
//!
//! Rules can also be read from environment variables with [`RulesBuilder::from_env()`].

use std::{env, time::Duration};

use anyhow::bail;

const DEFAULT_THINK_LIMIT: Duration = Duration::from_millis(1000);
const DEFAULT_GRACE: Duration = Duration::from_millis(100);
const DEFAULT_MAX_TURNS: u32 = 100;

/// A builder for [`Rules`].
#[derive(Debug, Default, Clone)]
pub struct RulesBuilder {
    think_limit: Option<Duration>,
    grace: Option<Duration>,
    max_turns: Option<u32>,
}

impl RulesBuilder {
    /// Creates a new `RulesBuilder` with the standard rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `RulesBuilder` configured from environment variables.
    ///
    /// Read environment variables are:
    /// - `THINK_LIMIT_MS` (u64): think limit in milliseconds
    /// - `THINK_GRACE_MS` (u64): grace margin in milliseconds
    /// - `MAX_TURNS` (u32): number of turns per match
    ///
    /// Unset or unparsable variables keep the standard value.
    #[must_use]
    pub fn from_env() -> Self {
        fn parse_duration_millis(var: &str) -> Option<Duration> {
            env::var(var)
                .ok()?
                .parse::<u64>()
                .ok()
                .map(Duration::from_millis)
        }

        RulesBuilder {
            think_limit: parse_duration_millis("THINK_LIMIT_MS"),
            grace: parse_duration_millis("THINK_GRACE_MS"),
            max_turns: env::var("MAX_TURNS").ok().and_then(|v| v.parse().ok()),
        }
    }

    /// Sets the maximum time a creature may think per step.
    #[must_use]
    pub fn with_think_limit(self, duration: Duration) -> Self {
        Self {
            think_limit: Some(duration),
            ..self
        }
    }

    /// Sets the extra time waited after the think limit before giving up on an agent.
    #[must_use]
    pub fn with_grace(self, duration: Duration) -> Self {
        Self {
            grace: Some(duration),
            ..self
        }
    }

    /// Sets the number of turns after which the match is decided by score.
    #[must_use]
    pub fn with_max_turns(self, turns: u32) -> Self {
        Self {
            max_turns: Some(turns),
            ..self
        }
    }

    /// Consumes the builder and returns the constructed `Rules`.
    ///
    /// # Errors
    ///
    /// When the think limit or the number of turns is zero.
    pub fn build(self) -> anyhow::Result<Rules> {
        let think_limit = self.think_limit.unwrap_or(DEFAULT_THINK_LIMIT);
        let grace = self.grace.unwrap_or(DEFAULT_GRACE);
        let max_turns = self.max_turns.unwrap_or(DEFAULT_MAX_TURNS);

        if think_limit.is_zero() {
            bail!("think limit must be greater than zero");
        }
        if max_turns == 0 {
            bail!("a match needs at least one turn");
        }

        Ok(Rules {
            think_limit,
            grace,
            max_turns,
        })
    }
}

/// Obtained using `RulesBuilder`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    pub(crate) think_limit: Duration,
    pub(crate) grace: Duration,
    pub(crate) max_turns: u32,
}

impl Rules {
    /// create a RulesBuilder
    pub fn builder() -> RulesBuilder {
        RulesBuilder::new()
    }

    /// Maximum think time before disqualification.
    pub fn think_limit(&self) -> Duration {
        self.think_limit
    }

    /// How long the simulator waits for an agent: think limit plus grace.
    pub fn deadline(&self) -> Duration {
        self.think_limit.saturating_add(self.grace)
    }

    /// Turns after which the match is decided by score.
    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules {
            think_limit: DEFAULT_THINK_LIMIT,
            grace: DEFAULT_GRACE,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}
