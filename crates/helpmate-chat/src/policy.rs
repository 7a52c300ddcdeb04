// SPDX-FileCopyrightText: 2026 Helpmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message limits and the edit window.

use chrono::{DateTime, Duration, Utc};
use helpmate_config::model::ChatConfig;
use helpmate_core::{Attachment, HelpmateError};

#[derive(Debug, Clone)]
pub struct ChatPolicy {
    pub edit_window: Duration,
    pub max_content_len: usize,
    pub max_attachments: usize,
    pub allow_edit_on_inactive_session: bool,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl From<&ChatConfig> for ChatPolicy {
    fn from(config: &ChatConfig) -> Self {
        Self {
            edit_window: Duration::seconds(i64::try_from(config.edit_window_secs).unwrap_or(i64::MAX)),
            max_content_len: config.max_content_len,
            max_attachments: config.max_attachments,
            allow_edit_on_inactive_session: config.allow_edit_on_inactive_session,
        }
    }
}

impl ChatPolicy {
    /// Content must have at least one non-whitespace character and at most
    /// `max_content_len` characters.
    pub fn check_content(&self, content: &str) -> Result<(), HelpmateError> {
        if content.trim().is_empty() {
            return Err(HelpmateError::Validation(
                "message content must not be empty".to_string(),
            ));
        }
        let len = content.chars().count();
        if len > self.max_content_len {
            return Err(HelpmateError::Validation(format!(
                "message content is {len} characters; the limit is {}",
                self.max_content_len
            )));
        }
        Ok(())
    }

    pub fn check_attachments(&self, attachments: &[Attachment]) -> Result<(), HelpmateError> {
        if attachments.len() > self.max_attachments {
            return Err(HelpmateError::Validation(format!(
                "{} attachments exceed the limit of {}",
                attachments.len(),
                self.max_attachments
            )));
        }
        if attachments
            .iter()
            .any(|a| a.url.trim().is_empty() || a.handle.trim().is_empty())
        {
            return Err(HelpmateError::Validation(
                "attachments need both a url and a handle".to_string(),
            ));
        }
        Ok(())
    }

    /// A message may be edited while `now - created_at <= edit_window`.
    pub fn within_edit_window(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - created_at <= self.edit_window
    }

    pub fn window_expired(&self) -> HelpmateError {
        HelpmateError::EditWindowExpired {
            window: self.edit_window.to_std().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpmate_test_utils::fixtures::{attachment, t0};
    use proptest::prelude::*;

    #[test]
    fn window_boundaries() {
        let policy = ChatPolicy::default();
        let sent = t0();
        assert!(policy.within_edit_window(sent, sent + Duration::seconds(299)));
        assert!(policy.within_edit_window(sent, sent + Duration::seconds(300)));
        assert!(!policy.within_edit_window(sent, sent + Duration::seconds(301)));
    }

    #[test]
    fn content_limits() {
        let policy = ChatPolicy {
            max_content_len: 5,
            ..ChatPolicy::default()
        };
        assert!(policy.check_content("hello").is_ok());
        assert!(policy.check_content("héllo").is_ok(), "limit counts characters");
        assert!(matches!(
            policy.check_content("hello!"),
            Err(HelpmateError::Validation(_))
        ));
        assert!(policy.check_content(" \n\t").is_err());
    }

    #[test]
    fn attachment_limits() {
        let policy = ChatPolicy {
            max_attachments: 1,
            ..ChatPolicy::default()
        };
        assert!(policy.check_attachments(&[attachment("a")]).is_ok());
        assert!(policy.check_attachments(&[attachment("a"), attachment("b")]).is_err());

        let mut blank = attachment("c");
        blank.handle = String::new();
        assert!(ChatPolicy::default().check_attachments(&[blank]).is_err());
    }

    #[test]
    fn expired_error_reports_window() {
        let err = ChatPolicy::default().window_expired();
        assert!(matches!(
            err,
            HelpmateError::EditWindowExpired { window } if window.as_secs() == 300
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_edit_window_matches_elapsed(window_secs in 1u64..3600, elapsed_ms in 0i64..7_200_000) {
            let policy = ChatPolicy::from(&ChatConfig {
                edit_window_secs: window_secs,
                ..ChatConfig::default()
            });
            let sent = t0();
            let now = sent + Duration::milliseconds(elapsed_ms);
            let expected = elapsed_ms <= (window_secs as i64) * 1000;
            prop_assert_eq!(policy.within_edit_window(sent, now), expected);
        }
    }
}
