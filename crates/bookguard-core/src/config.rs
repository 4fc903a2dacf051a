//! Guard configuration
//!
//! One configuration is shared by every interception point. A lax threshold
//! on any single path would reopen the save failure for that path.

use crate::{GuardError, GuardResult, TextEncoding};

/// Largest payload, in bytes, that the host is known to save reliably
pub const DEFAULT_THRESHOLD: usize = 28_000;

/// Most pages a host lets a book hold
pub const DEFAULT_MAX_PAGES: usize = 100;

/// Text written to every page of a neutralized book
pub const PLACEHOLDER_PAGE: &str = "Previously saved book content was too big!";

/// Guard configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardConfig {
    /// Payloads strictly larger than this are neutralized
    pub threshold: usize,
    /// Replacement page text
    pub placeholder: String,
    /// Encoding used to measure payloads
    pub encoding: TextEncoding,
    /// Treat a payload that cannot be measured as oversized
    pub fail_closed: bool,
    /// Page cap the host enforces on books
    pub max_pages: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            threshold: DEFAULT_THRESHOLD,
            placeholder: PLACEHOLDER_PAGE.to_string(),
            encoding: TextEncoding::Utf8,
            fail_closed: true,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl GuardConfig {
    /// Measure in modified UTF-8, matching tag-based chunk formats byte for byte
    pub fn modified_utf8() -> Self {
        GuardConfig {
            encoding: TextEncoding::ModifiedUtf8,
            ..GuardConfig::default()
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_fail_closed(mut self, fail_closed: bool) -> Self {
        self.fail_closed = fail_closed;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Largest size a neutralized book can measure, if it fits in `usize`
    pub fn neutralized_bound(&self) -> Option<usize> {
        self.encoding
            .encoded_len(&self.placeholder)?
            .checked_mul(self.max_pages.max(1))
    }

    /// Check that a neutralized book can never itself trip the threshold.
    ///
    /// A book at the page cap with the placeholder on every page must measure
    /// at or below the threshold, otherwise it would be neutralized again on
    /// every interception and still fail to save.
    pub fn validate(&self) -> GuardResult<()> {
        if self.placeholder.is_empty() {
            return Err(GuardError::EmptyPlaceholder);
        }

        let placeholder_bytes = self
            .encoding
            .encoded_len(&self.placeholder)
            .ok_or(GuardError::MeasureOverflow {
                encoding: self.encoding,
            })?;

        let fits = self
            .neutralized_bound()
            .is_some_and(|bound| bound <= self.threshold);
        if !fits {
            return Err(GuardError::PlaceholderTooLarge {
                placeholder_bytes,
                max_pages: self.max_pages,
                threshold: self.threshold,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GuardConfig::default();
        assert_eq!(config.threshold, 28_000);
        assert_eq!(config.placeholder, "Previously saved book content was too big!");
        assert_eq!(config.encoding, TextEncoding::Utf8);
        assert!(config.fail_closed);
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
        assert!(config.validate().is_ok());
        assert_eq!(config.neutralized_bound(), Some(PLACEHOLDER_PAGE.len() * 100));
    }

    #[test]
    fn test_modified_utf8_preset() {
        let config = GuardConfig::modified_utf8();
        assert_eq!(config.encoding, TextEncoding::ModifiedUtf8);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_placeholder_over_threshold() {
        let config = GuardConfig::default().with_threshold(10);
        assert_eq!(
            config.validate(),
            Err(GuardError::PlaceholderTooLarge {
                placeholder_bytes: PLACEHOLDER_PAGE.len(),
                max_pages: DEFAULT_MAX_PAGES,
                threshold: 10,
            })
        );
    }

    #[test]
    fn test_rejects_placeholder_over_threshold_at_page_cap() {
        // One page fits easily, a full book of placeholders does not
        let config = GuardConfig::default().with_max_pages(1_000);
        assert!(PLACEHOLDER_PAGE.len() < config.threshold);
        assert_eq!(
            config.validate(),
            Err(GuardError::PlaceholderTooLarge {
                placeholder_bytes: PLACEHOLDER_PAGE.len(),
                max_pages: 1_000,
                threshold: DEFAULT_THRESHOLD,
            })
        );

        let largest = DEFAULT_THRESHOLD / PLACEHOLDER_PAGE.len();
        assert!(GuardConfig::default().with_max_pages(largest).validate().is_ok());
        assert!(GuardConfig::default()
            .with_max_pages(largest + 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_page_cap_overflow_is_rejected() {
        let config = GuardConfig::default().with_max_pages(usize::MAX);
        assert_eq!(config.neutralized_bound(), None);
        assert!(matches!(
            config.validate(),
            Err(GuardError::PlaceholderTooLarge { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_placeholder() {
        let config = GuardConfig::default().with_placeholder("");
        assert_eq!(config.validate(), Err(GuardError::EmptyPlaceholder));
    }

    #[test]
    fn test_placeholder_exactly_at_threshold() {
        let config = GuardConfig::default()
            .with_placeholder("1234")
            .with_max_pages(1)
            .with_threshold(4);
        assert!(config.validate().is_ok());
    }
}
