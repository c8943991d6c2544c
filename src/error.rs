//! Error types for range parsing and insertion.

use thiserror::Error;

use crate::key::AddressFamily;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned when a range or address is rejected.
///
/// Every variant describes caller input; none of them are transient, and
/// retrying the same input cannot succeed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A required string was empty or contained only whitespace.
    #[error("{what} cannot be empty")]
    InvalidArgument { what: &'static str },

    /// The input is not of the form `<address>/<prefix>`.
    #[error("invalid CIDR format: {input:?}")]
    InvalidCidrFormat { input: String },

    /// The prefix length is outside `0..=max` for the address family.
    #[error("invalid prefix length {prefix} (expected 0..={max})")]
    InvalidPrefixLength { prefix: i64, max: u32 },

    /// The literal does not parse as an address of the detected family.
    #[error("invalid {family} address: {input:?}")]
    InvalidAddressFormat {
        input: String,
        family: AddressFamily,
    },
}

/// Fieldless discriminant of [`Error`], for matching on the kind alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidCidrFormat,
    InvalidPrefixLength,
    InvalidAddressFormat,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::InvalidCidrFormat { .. } => ErrorKind::InvalidCidrFormat,
            Error::InvalidPrefixLength { .. } => ErrorKind::InvalidPrefixLength,
            Error::InvalidAddressFormat { .. } => ErrorKind::InvalidAddressFormat,
        }
    }

    pub(crate) fn cidr_format(input: &str) -> Self {
        Error::InvalidCidrFormat {
            input: input.to_owned(),
        }
    }

    pub(crate) fn address_format(input: &str, family: AddressFamily) -> Self {
        Error::InvalidAddressFormat {
            input: input.to_owned(),
            family,
        }
    }
}
