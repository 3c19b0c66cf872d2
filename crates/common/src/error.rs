use thiserror::Error;

/// Domain failures shared by the rental workflow and the entity handlers.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid customer.")]
    InvalidCustomer,

    #[error("Invalid movie.")]
    InvalidMovie,

    #[error("Movie not in stock.")]
    OutOfStock,

    #[error("Invalid genre.")]
    InvalidGenre,

    #[error("Email already registered.")]
    DuplicateEmail,

    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("Rental transaction failed: {0}")]
    TransactionFailed(anyhow::Error),

    #[error("Storage error: {0}")]
    Storage(anyhow::Error),
}

impl Error {
    /// Whether this failure is caused by the client request rather than the service.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Error::InvalidCustomer
                | Error::InvalidMovie
                | Error::OutOfStock
                | Error::InvalidGenre
                | Error::DuplicateEmail
                | Error::InvalidCredentials
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
