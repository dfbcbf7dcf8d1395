use std::fmt;

/// Envelope code for a handler name with no registration (HTTP 406)
pub const NOT_ACCEPTABLE: i32 = 406;

/// Envelope code for a failure caught at the dispatch boundary (HTTP 500)
pub const INTERNAL_SERVER_ERROR: i32 = 500;

/// Failures raised by the dispatch core itself.
///
/// Handler-reported business errors never go through this type; handlers
/// write them straight into their envelope with `set_error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No factory is registered under the requested name
    UnregisteredHandler {
        /// The name the caller asked for
        name: String,
    },
    /// A panic escaped `ready`, `run` or `clean`
    InternalExecution {
        /// The panic payload rendered as a string
        message: String,
    },
    /// The handler's typed output could not be converted to JSON
    OutputSerialization {
        /// The serializer's error message
        message: String,
    },
}

impl DispatchError {
    /// Envelope code surfaced to callers for this error
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            DispatchError::UnregisteredHandler { .. } => NOT_ACCEPTABLE,
            DispatchError::InternalExecution { .. } => INTERNAL_SERVER_ERROR,
            DispatchError::OutputSerialization { .. } => INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnregisteredHandler { name } => {
                write!(f, "unregistered handler: {name}")
            }
            DispatchError::InternalExecution { message } => f.write_str(message),
            DispatchError::OutputSerialization { message } => {
                write!(f, "failed to serialize handler output: {message}")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<DispatchError> for crate::envelope::Envelope {
    fn from(err: DispatchError) -> Self {
        Self::failure(err.code(), err)
    }
}
