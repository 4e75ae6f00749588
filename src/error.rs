use thiserror::Error;

/// Why a well-formed submission was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name must have at least 2 characters")]
    NameTooShort,

    #[error("company must have at least 2 characters")]
    CompanyTooShort,

    #[error("email is not a valid address")]
    InvalidEmail,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
