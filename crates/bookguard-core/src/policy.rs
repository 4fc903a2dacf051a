//! Neutralization policy
//!
//! Decides whether a payload is too large to be persisted safely and, if so,
//! reduces it to a uniform placeholder book:
//! - size at or below the threshold: payload is left untouched
//! - size above the threshold: every page becomes the placeholder
//!
//! The policy never touches host storage. Callers commit the mutated payload.

use tracing::{debug, warn};

use crate::{GuardConfig, GuardResult, Payload};

/// Outcome of checking one payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// At or below the threshold, nothing changed
    Untouched { size: usize },
    /// Every page was replaced with the placeholder.
    ///
    /// `size` is `None` when measurement failed and the policy failed closed.
    Neutralized { size: Option<usize>, pages: usize },
    /// Measurement failed and the policy is configured to fail open
    Unmeasured,
}

impl Verdict {
    /// Did the payload change?
    #[inline]
    pub fn is_neutralized(&self) -> bool {
        matches!(self, Verdict::Neutralized { .. })
    }
}

/// Oversized payload policy
#[derive(Clone, Debug)]
pub struct Policy {
    config: GuardConfig,
}

impl Policy {
    /// Create a policy from a validated configuration
    pub fn new(config: GuardConfig) -> GuardResult<Self> {
        config.validate()?;
        Ok(Policy { config })
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    #[inline]
    pub fn threshold(&self) -> usize {
        self.config.threshold
    }

    #[inline]
    pub fn placeholder(&self) -> &str {
        &self.config.placeholder
    }

    /// Size of a payload in the configured encoding
    pub fn measure(&self, payload: &Payload) -> GuardResult<usize> {
        payload.try_measure(self.config.encoding)
    }

    /// Decide what `enforce` would do, without mutating
    pub fn judge(&self, payload: &Payload) -> Verdict {
        self.verdict(self.measure(payload), payload.page_count())
    }

    fn verdict(&self, measured: GuardResult<usize>, pages: usize) -> Verdict {
        let verdict = match measured {
            Ok(size) if size <= self.config.threshold => return Verdict::Untouched { size },
            Ok(size) => Verdict::Neutralized {
                size: Some(size),
                pages,
            },
            Err(err) if self.config.fail_closed => {
                debug!(error = %err, "payload could not be measured, treating as oversized");
                Verdict::Neutralized { size: None, pages }
            }
            Err(err) => {
                warn!(error = %err, "payload could not be measured, leaving it untouched");
                return Verdict::Unmeasured;
            }
        };

        if pages > self.config.max_pages {
            warn!(
                pages,
                max_pages = self.config.max_pages,
                "book exceeds the host page cap, neutralized copy may still be oversized"
            );
        }
        verdict
    }

    /// Neutralize `payload` in place if it is oversized
    pub fn enforce(&self, payload: &mut Payload) -> Verdict {
        let verdict = self.judge(payload);
        if verdict.is_neutralized() {
            payload.fill(&self.config.placeholder);
        }
        verdict
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            config: GuardConfig::default(),
        }
    }
}

/// Enforce `threshold` on `payload` with the default placeholder and UTF-8 sizing.
///
/// No placeholder validation happens here: a threshold below the placeholder
/// size still produces a stable all-placeholder book.
pub fn enforce(mut payload: Payload, threshold: usize) -> Payload {
    let policy = Policy {
        config: GuardConfig::default().with_threshold(threshold),
    };
    policy.enforce(&mut payload);
    payload
}
