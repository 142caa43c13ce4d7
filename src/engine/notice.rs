use std::time::Duration;

use super::BudgetError;

const SUCCESS_DISPLAY: Duration = Duration::from_secs(3);
const ERROR_DISPLAY: Duration = Duration::from_secs(4);

/// A short-lived confirmation message for the caller to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Notice {
    pub(crate) message: String,
    pub(crate) is_error: bool,
    pub(crate) display_for: Duration,
}

impl Notice {
    pub(crate) fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
            display_for: SUCCESS_DISPLAY,
        }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
            display_for: ERROR_DISPLAY,
        }
    }
}

impl From<&BudgetError> for Notice {
    fn from(err: &BudgetError) -> Self {
        Self::error(err.to_string())
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}
