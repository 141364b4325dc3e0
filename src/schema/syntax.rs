//! LDAP syntaxes (RFC 4517)
//!
//! A [`Syntax`] is the codec between in-memory [`Value`]s and the octet
//! strings carried on the wire. Decoding failures surface as
//! `invalidAttributeSyntax`.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Timelike};

use crate::dn::{Dn, DnWithUid};
use crate::error::OperationError;
use crate::schema::Schema;

/// A decoded attribute value.
///
/// Attribute values are a closed sum over the types the supported syntaxes
/// produce, instead of a dynamically-typed object bag.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    Bool(bool),
    /// An OID or descriptor name (OID syntax).
    Oid(String),
    Dn(Dn),
    DnWithUid(DnWithUid),
    Time(DateTime<FixedOffset>),
    /// Lines of a postal address.
    Lines(Vec<String>),
    /// A rendered schema definition, e.g. `( 2.5.6.0 NAME 'top' ... )`.
    SchemaElement(String),
}

impl Value {
    /// The textual content, for values that are strings at heart.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Oid(s) | Value::SchemaElement(s) => Some(s),
            _ => None,
        }
    }

    /// Equality without string preparation, used by value-comparing rules.
    pub(crate) fn eq_value(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a == b),
            (Value::Bool(a), Value::Bool(b)) => Some(a == b),
            (Value::Time(a), Value::Time(b)) => Some(a == b),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a == b),
            (Value::Dn(a), Value::Dn(b)) => Some(a == b),
            (Value::DnWithUid(a), Value::DnWithUid(b)) => Some(a == b),
            (Value::Text(a), Value::Text(b)) => Some(a == b),
            _ => None,
        }
    }

    /// Ordering for value-comparing rules; `None` for mismatched kinds.
    pub(crate) fn cmp_value(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<Dn> for Value {
    fn from(v: Dn) -> Value {
        Value::Dn(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Value {
        Value::Time(v)
    }
}

/// The decoded form of a SubstringAssertion: `initial*any*...*final`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubstringPattern {
    pub initial: Option<String>,
    pub any: Vec<String>,
    pub final_part: Option<String>,
}

impl SubstringPattern {
    /// Build a pattern from the raw pieces of a wire substring filter.
    pub fn from_wire(
        initial: Option<&[u8]>,
        any: &[&[u8]],
        final_part: Option<&[u8]>,
    ) -> Result<Self, OperationError> {
        let text = |b: &[u8]| {
            std::str::from_utf8(b)
                .map(str::to_string)
                .map_err(|_| OperationError::InvalidAttributeSyntax)
        };
        Ok(SubstringPattern {
            initial: initial.map(text).transpose()?,
            any: any.iter().map(|b| text(b)).collect::<Result<_, _>>()?,
            final_part: final_part.map(text).transpose()?,
        })
    }
}

/// Concrete codec behaviour of a syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxKind {
    DirectoryString,
    Ia5String,
    PrintableString,
    CountryString,
    TelephoneNumber,
    TelexNumber,
    FacsimileTelephoneNumber,
    NumericString,
    OctetString,
    Integer,
    Boolean,
    Oid,
    Dn,
    NameAndOptionalUid,
    GeneralizedTime,
    UtcTime,
    PostalAddress,
    SubstringAssertion,
    BitString,
    /// Rendered schema definitions (attributeTypes, objectClasses, ...).
    SchemaElement,
}

/// An attribute syntax: OID plus value codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub oid: Cow<'static, str>,
    pub desc: Cow<'static, str>,
    pub kind: SyntaxKind,
}

impl Syntax {
    /// A schema-element syntax under a caller-chosen OID.
    pub fn schema_element(oid: &str, desc: &str) -> Syntax {
        Syntax {
            oid: Cow::Owned(oid.to_string()),
            desc: Cow::Owned(desc.to_string()),
            kind: SyntaxKind::SchemaElement,
        }
    }

    /// Decode wire octets into a [`Value`].
    pub fn decode(&self, schema: &Schema, raw: &[u8]) -> Result<Value, OperationError> {
        let text = || {
            std::str::from_utf8(raw).map_err(|_| OperationError::InvalidAttributeSyntax)
        };
        match self.kind {
            SyntaxKind::DirectoryString
            | SyntaxKind::TelephoneNumber
            | SyntaxKind::TelexNumber
            | SyntaxKind::FacsimileTelephoneNumber => Ok(Value::Text(text()?.to_string())),
            SyntaxKind::Ia5String => {
                let s = text()?;
                if !s.is_ascii() {
                    return Err(OperationError::InvalidAttributeSyntax);
                }
                Ok(Value::Text(s.to_string()))
            }
            SyntaxKind::PrintableString | SyntaxKind::CountryString => {
                let s = text()?;
                if !s.chars().all(is_printable_char) {
                    return Err(OperationError::InvalidAttributeSyntax);
                }
                Ok(Value::Text(s.to_string()))
            }
            SyntaxKind::NumericString => {
                let s = text()?;
                if !s.chars().all(|c| c.is_ascii_digit() || c == ' ') {
                    return Err(OperationError::InvalidAttributeSyntax);
                }
                Ok(Value::Text(s.to_string()))
            }
            SyntaxKind::OctetString => Ok(Value::Bytes(raw.to_vec())),
            SyntaxKind::Integer => decode_integer(text()?),
            SyntaxKind::Boolean => match raw {
                b"TRUE" => Ok(Value::Bool(true)),
                b"FALSE" => Ok(Value::Bool(false)),
                _ => Err(OperationError::InvalidAttributeSyntax),
            },
            SyntaxKind::Oid => {
                let s = text()?;
                if !is_oid_or_descriptor(s) {
                    return Err(OperationError::InvalidAttributeSyntax);
                }
                Ok(Value::Oid(s.to_string()))
            }
            SyntaxKind::Dn => {
                let dn = Dn::parse(schema, text()?)
                    .map_err(|_| OperationError::InvalidAttributeSyntax)?;
                Ok(Value::Dn(dn))
            }
            SyntaxKind::NameAndOptionalUid => decode_name_and_optional_uid(schema, text()?),
            SyntaxKind::GeneralizedTime => decode_time(text()?, false).map(Value::Time),
            SyntaxKind::UtcTime => decode_time(text()?, true).map(Value::Time),
            SyntaxKind::PostalAddress => decode_postal_address(text()?),
            SyntaxKind::SubstringAssertion => {
                // kept as its textual form; matching decodes it through
                // decode_substring_assertion
                decode_substring_assertion(raw)?;
                Ok(Value::Text(text()?.to_string()))
            }
            SyntaxKind::BitString => {
                let s = text()?;
                if !is_bit_string(s) {
                    return Err(OperationError::InvalidAttributeSyntax);
                }
                Ok(Value::Text(s.to_string()))
            }
            SyntaxKind::SchemaElement => Ok(Value::SchemaElement(text()?.to_string())),
        }
    }

    /// Encode a [`Value`] into its wire octets.
    pub fn encode(&self, _schema: &Schema, value: &Value) -> Result<Vec<u8>, OperationError> {
        match (self.kind, value) {
            (SyntaxKind::OctetString, Value::Bytes(b)) => Ok(b.clone()),
            (SyntaxKind::OctetString, Value::Text(s)) => Ok(s.as_bytes().to_vec()),
            (SyntaxKind::Integer, Value::Int(v)) => Ok(v.to_string().into_bytes()),
            (SyntaxKind::Boolean, Value::Bool(v)) => {
                Ok(if *v { b"TRUE".to_vec() } else { b"FALSE".to_vec() })
            }
            (SyntaxKind::Oid, Value::Oid(s)) | (SyntaxKind::Oid, Value::Text(s)) => {
                Ok(s.as_bytes().to_vec())
            }
            (SyntaxKind::Dn, Value::Dn(dn)) => Ok(dn.to_string().into_bytes()),
            (SyntaxKind::NameAndOptionalUid, Value::Dn(dn)) => Ok(dn.to_string().into_bytes()),
            (SyntaxKind::NameAndOptionalUid, Value::DnWithUid(d)) => {
                Ok(d.to_string().into_bytes())
            }
            (SyntaxKind::GeneralizedTime, Value::Time(t)) => {
                Ok(encode_time(t, false).into_bytes())
            }
            (SyntaxKind::UtcTime, Value::Time(t)) => Ok(encode_time(t, true).into_bytes()),
            (SyntaxKind::PostalAddress, Value::Lines(lines)) => {
                Ok(encode_postal_address(lines).into_bytes())
            }
            (SyntaxKind::SchemaElement, Value::SchemaElement(s))
            | (SyntaxKind::SchemaElement, Value::Text(s)) => Ok(s.as_bytes().to_vec()),
            (_, Value::Text(s)) => Ok(s.as_bytes().to_vec()),
            (_, Value::Dn(dn)) => Ok(dn.to_string().into_bytes()),
            _ => Err(OperationError::InvalidAttributeSyntax),
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "( {} DESC '{}' )", self.oid, self.desc)
    }
}

fn is_printable_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            '\'' | '(' | ')' | '+' | ',' | '-' | '.' | '/' | ':' | '?' | '=' | ' '
        )
}

fn is_oid_or_descriptor(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let first = s.chars().next().unwrap();
    if first.is_ascii_digit() {
        // numericoid: digit groups separated by dots, no leading zeros
        s.split('.').all(|part| {
            !part.is_empty()
                && part.chars().all(|c| c.is_ascii_digit())
                && (part == "0" || !part.starts_with('0'))
        })
    } else {
        first.is_ascii_alphabetic()
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    }
}

fn is_bit_string(s: &str) -> bool {
    s.len() >= 3
        && s.starts_with('\'')
        && s.ends_with("'B")
        && s[1..s.len() - 2].chars().all(|c| c == '0' || c == '1')
}

// INTEGER: decimal, no leading zeros, no '+', no '-0'
fn decode_integer(s: &str) -> Result<Value, OperationError> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let valid = !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
        && s != "-0";
    if !valid {
        return Err(OperationError::InvalidAttributeSyntax);
    }
    s.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| OperationError::InvalidAttributeSyntax)
}

fn decode_name_and_optional_uid(schema: &Schema, s: &str) -> Result<Value, OperationError> {
    // an unescaped '#' separates the DN from the optional bit-string uid
    let mut escaped = false;
    let mut sep = None;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '#' {
            sep = Some(i);
        }
    }
    if let Some(i) = sep {
        let (dn_part, uid) = (&s[..i], &s[i + 1..]);
        if !is_bit_string(uid) {
            return Err(OperationError::InvalidAttributeSyntax);
        }
        let dn =
            Dn::parse(schema, dn_part).map_err(|_| OperationError::InvalidAttributeSyntax)?;
        Ok(Value::DnWithUid(DnWithUid {
            dn,
            uid: uid.to_string(),
        }))
    } else {
        let dn = Dn::parse(schema, s).map_err(|_| OperationError::InvalidAttributeSyntax)?;
        Ok(Value::Dn(dn))
    }
}

// GeneralizedTime: YYYYMMDDHH[MM[SS]][Z|+-HHMM]
// UTCTime:        YYMMDDHHMM[SS][Z|+-HHMM]
fn decode_time(s: &str, two_digit_year: bool) -> Result<DateTime<FixedOffset>, OperationError> {
    const BAD: OperationError = OperationError::InvalidAttributeSyntax;
    let bytes = s.as_bytes();
    let digits_at = |start: usize, len: usize| -> Result<i32, OperationError> {
        let end = start + len;
        if bytes.len() < end {
            return Err(OperationError::InvalidAttributeSyntax);
        }
        let part = std::str::from_utf8(&bytes[start..end])
            .map_err(|_| OperationError::InvalidAttributeSyntax)?;
        if !part.chars().all(|c| c.is_ascii_digit()) {
            return Err(OperationError::InvalidAttributeSyntax);
        }
        part.parse().map_err(|_| OperationError::InvalidAttributeSyntax)
    };

    let (year, mut pos) = if two_digit_year {
        let yy = digits_at(0, 2)?;
        (if yy < 50 { 2000 + yy } else { 1900 + yy }, 2)
    } else {
        (digits_at(0, 4)?, 4)
    };
    let month = digits_at(pos, 2)? as u32;
    let day = digits_at(pos + 2, 2)? as u32;
    let hour = digits_at(pos + 4, 2)? as u32;
    pos += 6;
    let mut minute = 0;
    let mut second = 0;
    if bytes.len() > pos && bytes[pos].is_ascii_digit() {
        minute = digits_at(pos, 2)? as u32;
        pos += 2;
        if bytes.len() > pos && bytes[pos].is_ascii_digit() {
            second = digits_at(pos, 2)? as u32;
            pos += 2;
        }
    }
    let offset_secs = match bytes.get(pos) {
        None => return Err(BAD),
        Some(b'Z') if pos + 1 == bytes.len() => 0,
        Some(sign @ (b'+' | b'-')) => {
            let hh = digits_at(pos + 1, 2)?;
            let mm = digits_at(pos + 3, 2)?;
            if pos + 5 != bytes.len() {
                return Err(BAD);
            }
            let secs = (hh * 3600 + mm * 60) as i32;
            if *sign == b'-' {
                -secs
            } else {
                secs
            }
        }
        _ => return Err(BAD),
    };

    let offset = FixedOffset::east_opt(offset_secs).ok_or(BAD)?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or(BAD)?;
    offset.from_local_datetime(&naive).single().ok_or(BAD)
}

fn encode_time(t: &DateTime<FixedOffset>, two_digit_year: bool) -> String {
    let mut out = if two_digit_year {
        t.format("%y%m%d%H%M").to_string()
    } else {
        t.format("%Y%m%d%H%M").to_string()
    };
    if t.second() != 0 {
        out.push_str(&format!("{:02}", t.second()));
    }
    let offset = t.offset().local_minus_utc();
    if offset == 0 {
        out.push('Z');
    } else {
        let sign = if offset < 0 { '-' } else { '+' };
        let abs = offset.abs();
        out.push_str(&format!("{}{:02}{:02}", sign, abs / 3600, (abs % 3600) / 60));
    }
    out
}

// PostalAddress: DOLLAR-separated lines; '$' and '\' are escaped as \24 / \5C
fn decode_postal_address(s: &str) -> Result<Value, OperationError> {
    let lines = s
        .split('$')
        .map(unescape_postal_line)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Lines(lines))
}

fn unescape_postal_line(s: &str) -> Result<String, OperationError> {
    unescape_hex_pairs(s)
}

fn encode_postal_address(lines: &[String]) -> String {
    let escaped: Vec<String> = lines
        .iter()
        .map(|l| l.replace('\\', "\\5C").replace('$', "\\24"))
        .collect();
    escaped.join("$")
}

/// Decode a SubstringAssertion value (`initial*any*...*final` with `\2A` and
/// `\5C` escapes) into its pieces.
pub fn decode_substring_assertion(raw: &[u8]) -> Result<SubstringPattern, OperationError> {
    let s = std::str::from_utf8(raw).map_err(|_| OperationError::InvalidAttributeSyntax)?;
    if !s.contains('*') {
        return Err(OperationError::InvalidAttributeSyntax);
    }
    let parts: Vec<&str> = s.split('*').collect();
    let n = parts.len();
    let unescape = |p: &str| unescape_hex_pairs(p);
    let initial = if parts[0].is_empty() {
        None
    } else {
        Some(unescape(parts[0])?)
    };
    let final_part = if parts[n - 1].is_empty() {
        None
    } else {
        Some(unescape(parts[n - 1])?)
    };
    let mut any = Vec::new();
    for p in &parts[1..n - 1] {
        if !p.is_empty() {
            any.push(unescape(p)?);
        }
    }
    Ok(SubstringPattern {
        initial,
        any,
        final_part,
    })
}

// Replace \XX hex escapes by the escaped byte.
fn unescape_hex_pairs(s: &str) -> Result<String, OperationError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            let hex = s
                .get(i + 1..i + 3)
                .ok_or(OperationError::InvalidAttributeSyntax)?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|_| OperationError::InvalidAttributeSyntax)?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| OperationError::InvalidAttributeSyntax)
}
