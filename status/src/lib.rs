use std::fmt;

mod macros;
pub mod well_known;

/// Category of a failed request, deciding how the failure is reported back
/// to the chat user and how loudly it is logged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Code {
    /// The user supplied malformed input (e.g. a non-numeric amount).
    InvalidArgument,
    /// The actor is not allowed to perform the action.
    PermissionDenied,
    /// The referenced entity does not exist.
    NotFound,
    /// The entity exists but is not in a state that allows the action.
    FailedPrecondition,
    /// Storage or some other dependency failed.
    Internal,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Code::InvalidArgument => "invalid argument",
            Code::PermissionDenied => "permission denied",
            Code::NotFound => "not found",
            Code::FailedPrecondition => "failed precondition",
            Code::Internal => "internal",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(Code::InvalidArgument, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(Code::PermissionDenied, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Code::NotFound, message)
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::new(Code::FailedPrecondition, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the failure was already explained to the user by the handler
    /// that produced it. Internal failures are not, and get a generic reply.
    pub fn is_recovered(&self) -> bool {
        self.code != Code::Internal
    }
}
