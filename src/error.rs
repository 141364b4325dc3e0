//! LDAP errors
//!
//! Two error layers coexist: [`LdapError`] reports wire-level decoding
//! problems and integrates with the nom parsing machinery, while
//! [`OperationError`] carries the directory-level failures that map onto LDAP
//! result codes in responses.

use asn1_rs::nom;
use nom::error::{ErrorKind, FromExternalError, ParseError};
use nom::IResult;

use crate::ldap::ResultCode;

/// Holds the result of parsing functions (LDAP)
///
/// Note that this type is also a `Result`, so usual functions (`map`, `unwrap` etc.) are available.
///
/// Note that this type is not named `LdapResult` to avoid conflicts with the LDAP standard type
pub type Result<'a, T> = IResult<&'a [u8], T, LdapError>;

/// An error that can occur while decoding an LDAP message.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LdapError {
    #[error("Invalid LDAP String encoding")]
    InvalidString,

    #[error("Invalid LDAP Authentication Type")]
    InvalidAuthenticationType,

    #[error("Invalid DN encoding")]
    InvalidDN,

    #[error("Invalid Substring Type")]
    InvalidSubstring,

    #[error("Invalid Type for Filter")]
    InvalidFilterType,
    #[error("Invalid Type for Message")]
    InvalidMessageType,

    /// The outer message framing is unusable (wrong outer tag, indefinite or
    /// overlong length). Sessions terminate the connection on this error since
    /// no `messageID` can be recovered.
    #[error("Invalid message framing")]
    InvalidFraming,

    #[error("Unknown error")]
    Unknown,

    #[error("BER error: {0}")]
    Ber(#[from] asn1_rs::Error),
    #[error("nom error: {0:?}")]
    NomError(ErrorKind),
}

impl From<LdapError> for nom::Err<LdapError> {
    fn from(e: LdapError) -> nom::Err<LdapError> {
        nom::Err::Error(e)
    }
}

impl From<ErrorKind> for LdapError {
    fn from(e: ErrorKind) -> LdapError {
        LdapError::NomError(e)
    }
}

impl<I> ParseError<I> for LdapError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        LdapError::NomError(kind)
    }
    fn append(_input: I, kind: ErrorKind, _other: Self) -> Self {
        LdapError::NomError(kind)
    }
}

impl<I, E> FromExternalError<I, E> for LdapError {
    fn from_external_error(_input: I, kind: ErrorKind, _e: E) -> LdapError {
        LdapError::NomError(kind)
    }
}

/// A directory operation failure, surfaced to clients as an LDAP result code.
///
/// Filter evaluation never produces these: schema and data problems there
/// resolve to an Undefined match. Everything else propagates to the session
/// dispatcher, which answers with [`OperationError::result_code`] on the same
/// `messageID`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    #[error("no such object")]
    NoSuchObject,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid attribute syntax")]
    InvalidAttributeSyntax,
    #[error("undefined attribute type")]
    UndefinedAttributeType,
    #[error("inappropriate matching")]
    InappropriateMatching,
    #[error("protocol error")]
    ProtocolError,
    #[error("unavailable critical extension")]
    UnavailableCriticalExtension,
    #[error("insufficient access rights")]
    InsufficientAccessRights,
    #[error("authentication method not supported")]
    AuthMethodNotSupported,
    /// Unhandled library or application fault; also logged.
    #[error("server fault: {0}")]
    Other(String),
}

impl OperationError {
    /// The LDAP result code sent to the client for this error.
    pub fn result_code(&self) -> ResultCode {
        match self {
            OperationError::NoSuchObject => ResultCode::NoSuchObject,
            OperationError::InvalidCredentials => ResultCode::InvalidCredentials,
            OperationError::InvalidAttributeSyntax => ResultCode::InvalidAttributeSyntax,
            OperationError::UndefinedAttributeType => ResultCode::UndefinedAttributeType,
            OperationError::InappropriateMatching => ResultCode::InappropriateMatching,
            OperationError::ProtocolError => ResultCode::ProtocolError,
            OperationError::UnavailableCriticalExtension => {
                ResultCode::UnavailableCriticalExtension
            }
            OperationError::InsufficientAccessRights => ResultCode::InsufficientAccessRights,
            OperationError::AuthMethodNotSupported => ResultCode::AuthMethodNotSupported,
            OperationError::Other(_) => ResultCode::Other,
        }
    }
}

/// An error raised while constructing or merging a [`crate::schema::Schema`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// An OID or name is already bound to a different element.
    #[error("conflicting registration for '{0}'")]
    Conflict(String),
    /// A definition references a syntax, rule or attribute type that is not
    /// part of the schema.
    #[error("unknown reference '{0}'")]
    UnknownReference(String),
    #[error("invalid schema definition: {0}")]
    InvalidDefinition(String),
    /// Definitions that never resolve, either through a missing dependency or
    /// a SUP cycle.
    #[error("unresolvable definitions: {0}")]
    Unresolvable(String),
}

/// An error raised while parsing or constructing distinguished names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DnError {
    #[error("invalid DN syntax: {0}")]
    Invalid(String),
    #[error("unknown attribute type '{0}'")]
    UnknownAttributeType(String),
    #[error("invalid attribute value: {0}")]
    InvalidValue(String),
}

impl From<DnError> for OperationError {
    fn from(e: DnError) -> OperationError {
        match e {
            DnError::UnknownAttributeType(_) => OperationError::UndefinedAttributeType,
            _ => OperationError::InvalidAttributeSyntax,
        }
    }
}
