use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeorefError {
    #[error("Parse error at offset {offset}: {message}")]
    Parse { message: String, offset: usize },

    #[error("Formatting error: {0}")]
    Formatting(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("No such authority code: {authority}:{code}")]
    NoSuchAuthorityCode { authority: String, code: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Factory error: {0}")]
    Factory(String),
}

impl GeorefError {
    /// Parse failure at a located byte offset in the input text.
    pub fn parse(message: impl Into<String>, offset: usize) -> Self {
        GeorefError::Parse {
            message: message.into(),
            offset,
        }
    }

    pub fn formatting(message: impl Into<String>) -> Self {
        GeorefError::Formatting(message.into())
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        GeorefError::InvalidValue(message.into())
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        GeorefError::InvalidOperation(message.into())
    }

    pub fn no_such_code(authority: impl Into<String>, code: impl Into<String>) -> Self {
        GeorefError::NoSuchAuthorityCode {
            authority: authority.into(),
            code: code.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GeorefError>;
