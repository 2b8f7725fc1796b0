//! Portable error taxonomy.
//!
//! Every driver adapter reduces its native failures to one of these kinds.
//! Ordinals and names are stable: they are safe to persist or send over the wire.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Driver independent classification of a database failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum ErrorKind {
    /// There was no error.
    NoError = 0,
    /// The query returned no rows.
    NotFound = 1,
    /// A unique constraint or unique index was violated.
    UniqueViolation = 2,
    /// The referenced table does not exist.
    TableNotFound = 3,
    /// The server rejected a value (SQLSTATE class 22).
    DataException = 4,
    /// A serialization failure or optimistic-lock conflict.
    ConcurrentUpdate = 5,
    /// The credentials were rejected.
    AuthenticationFailed = 6,
    /// The server reported an internal error or a program limit.
    InternalError = 7,
    /// A foreign key constraint was violated.
    ForeignKeyViolation = 8,
    /// A not-null, check or exclusion constraint was violated.
    ///
    /// Unique and foreign key violations have their own kinds.
    ConstraintViolation = 9,
    /// Syntax error or invalid identifier.
    InvalidInputSyntax = 10,
    /// The authenticated role lacks a privilege.
    PermissionDenied = 11,
    /// The server ran out of disk space.
    OutOfDisk = 12,
    /// The server ran out of memory.
    OutOfMemory = 13,
    /// The server refused a connection because of its connection limit.
    TooManyConnections = 14,
    /// The transaction was already committed or rolled back.
    TxDone = 15,
    /// A deadline or statement timeout was hit.
    Timeout = 16,
    /// No classification rule matched.
    Unknown = 17,
}

impl ErrorKind {
    /// Every kind, in ordinal order.
    pub const ALL: [ErrorKind; 18] = [
        Self::NoError,
        Self::NotFound,
        Self::UniqueViolation,
        Self::TableNotFound,
        Self::DataException,
        Self::ConcurrentUpdate,
        Self::AuthenticationFailed,
        Self::InternalError,
        Self::ForeignKeyViolation,
        Self::ConstraintViolation,
        Self::InvalidInputSyntax,
        Self::PermissionDenied,
        Self::OutOfDisk,
        Self::OutOfMemory,
        Self::TooManyConnections,
        Self::TxDone,
        Self::Timeout,
        Self::Unknown,
    ];

    /// Canonical name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::NoError => "OK",
            Self::NotFound => "NotFound",
            Self::UniqueViolation => "UniqueViolation",
            Self::TableNotFound => "TableNotFound",
            Self::DataException => "DataException",
            Self::ConcurrentUpdate => "ConcurrentUpdate",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::InternalError => "InternalError",
            Self::ForeignKeyViolation => "ForeignKeyViolation",
            Self::ConstraintViolation => "ConstraintViolation",
            Self::InvalidInputSyntax => "InvalidInputSyntax",
            Self::PermissionDenied => "PermissionDenied",
            Self::OutOfDisk => "OutOfDisk",
            Self::OutOfMemory => "OutOfMemory",
            Self::TooManyConnections => "TooManyConnections",
            Self::TxDone => "TxDone",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
        }
    }

    /// Stable numeric value of this kind.
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    /// Look up a kind by its ordinal.
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// Look up a kind by name, ignoring ASCII case.
    ///
    /// `"NoError"` is accepted as an alias for `"OK"`.
    pub fn from_name(name: &str) -> Result<Self, UnknownErrorKind> {
        if name.eq_ignore_ascii_case("noerror") {
            return Ok(Self::NoError);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownErrorKind(name.to_string()))
    }

    /// True for the three constraint kinds.
    pub fn is_constraint_violation(self) -> bool {
        matches!(
            self,
            Self::UniqueViolation | Self::ForeignKeyViolation | Self::ConstraintViolation
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ErrorKind {
    type Err = UnknownErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for ErrorKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Self::from_name(&name).map_err(serde::de::Error::custom)
    }
}

/// Returned when a name does not match any [`ErrorKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown error kind: {0}")]
pub struct UnknownErrorKind(pub String);
