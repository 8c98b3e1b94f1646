//! Suppress-or-propagate failure policy.

use crate::error::Result;

/// What the client does with a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log the failure and hand back `None`.
    #[default]
    Suppress,
    /// Return the failure to the caller.
    Propagate,
}

impl ErrorPolicy {
    pub fn from_raise_exceptions(raise_exceptions: bool) -> Self {
        if raise_exceptions {
            ErrorPolicy::Propagate
        } else {
            ErrorPolicy::Suppress
        }
    }

    pub fn raises(&self) -> bool {
        matches!(self, ErrorPolicy::Propagate)
    }

    /// Apply the policy to the outcome of one call.
    ///
    /// Under `Suppress` the result is always `Ok`.
    pub fn resolve<T>(&self, result: Result<T>) -> Result<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.raises() => Err(err),
            Err(err) => {
                log::error!("{}", err);
                Ok(None)
            }
        }
    }
}
