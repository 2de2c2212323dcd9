//! Common error types used throughout imageforge.
//!
//! The gallery store reports failures with one of three storage kinds
//! (initialization, write, read). The remaining variants cover lookups
//! and validation of caller input.

/// Common error type for imageforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The gallery storage could not be opened or created.
    #[error("Gallery initialization failed: {0}")]
    Initialization(String),

    /// An add or remove transaction failed to commit.
    #[error("Gallery write failed: {0}")]
    Write(String),

    /// A read transaction failed.
    #[error("Gallery read failed: {0}")]
    Read(String),

    /// The requested record was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new Initialization error.
    pub fn initialization<S: Into<String>>(msg: S) -> Self {
        Self::Initialization(msg.into())
    }

    /// Create a new Write error.
    pub fn write<S: Into<String>>(msg: S) -> Self {
        Self::Write(msg.into())
    }

    /// Create a new Read error.
    pub fn read<S: Into<String>>(msg: S) -> Self {
        Self::Read(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::initialization("permission denied");
        assert_eq!(
            err.to_string(),
            "Gallery initialization failed: permission denied"
        );

        let err = Error::write("disk full");
        assert_eq!(err.to_string(), "Gallery write failed: disk full");

        let err = Error::read("database is locked");
        assert_eq!(err.to_string(), "Gallery read failed: database is locked");

        let err = Error::not_found("gallery image 3");
        assert_eq!(err.to_string(), "Not found: gallery image 3");

        let err = Error::invalid_input("bad data url");
        assert_eq!(err.to_string(), "Invalid input: bad data url");
    }

    #[test]
    fn test_error_string_into() {
        let err = Error::write(String::from("commit failed"));
        assert!(matches!(err, Error::Write(ref m) if m == "commit failed"));
    }
}
