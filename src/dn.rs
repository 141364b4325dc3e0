//! Distinguished names (RFC 4514)
//!
//! A [`Dn`] is an ordered sequence of [`Rdn`]s from leaf to root; an [`Rdn`]
//! is an unordered set of [`RdnAssertion`]s. Assertion equality and hashing
//! use the value *normalized* through the attribute type's EQUALITY rule, so
//! case, insignificant whitespace and Unicode normalization differences are
//! collapsed. Assertions are immutable once constructed.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Add;

use crate::error::DnError;
use crate::schema::Schema;

/// One `attribute=value` assertion of an RDN.
#[derive(Debug, Clone)]
pub struct RdnAssertion {
    attribute: String,
    oid: String,
    value: String,
    value_normalized: String,
}

impl RdnAssertion {
    pub fn new(schema: &Schema, attribute: &str, value: &str) -> Result<Self, DnError> {
        let at = schema
            .attribute_type(attribute)
            .ok_or_else(|| DnError::UnknownAttributeType(attribute.to_string()))?;
        if value.is_empty() {
            return Err(DnError::Invalid("empty attribute value".to_string()));
        }
        let value_normalized = match at.equality_rule(schema) {
            Some(rule) => rule
                .normalize_text(value)
                .map_err(|e| DnError::InvalidValue(e.to_string()))?,
            None => value.to_string(),
        };
        Ok(RdnAssertion {
            attribute: at.name().to_string(),
            oid: at.oid.clone(),
            value: value.to_string(),
            value_normalized,
        })
    }

    pub fn from_str(schema: &Schema, s: &str) -> Result<Self, DnError> {
        let eq = find_unescaped(s, '=')
            .ok_or_else(|| DnError::Invalid(format!("missing '=' in '{}'", s)))?;
        let (attribute, value) = (&s[..eq], &s[eq + 1..]);
        if attribute.is_empty() {
            return Err(DnError::Invalid("empty attribute type".to_string()));
        }
        if value.starts_with('#') {
            // BER-encoded values are not supported
            return Err(DnError::Invalid(format!("hexstring value in '{}'", s)));
        }
        let value = unescape_value(value)?;
        if value.is_empty() {
            return Err(DnError::Invalid("empty attribute value".to_string()));
        }
        RdnAssertion::new(schema, attribute, &value)
    }

    /// The canonical (first) name of the attribute type.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The numeric OID of the attribute type.
    pub fn attribute_oid(&self) -> &str {
        &self.oid
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn value_normalized(&self) -> &str {
        &self.value_normalized
    }
}

impl PartialEq for RdnAssertion {
    fn eq(&self, other: &Self) -> bool {
        self.oid == other.oid && self.value_normalized == other.value_normalized
    }
}

impl Eq for RdnAssertion {}

impl Hash for RdnAssertion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.oid.hash(state);
        self.value_normalized.hash(state);
    }
}

impl fmt::Display for RdnAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.attribute)?;
        let chars: Vec<char> = self.value.chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            match c {
                '"' | '+' | ',' | ';' | '<' | '>' | '\\' => write!(f, "\\{}", c)?,
                ' ' if i == 0 || i == chars.len() - 1 => write!(f, "\\ ")?,
                '#' if i == 0 => write!(f, "\\#")?,
                c if (c as u32) < 0x20 || c == '\u{7F}' => write!(f, "\\{:02x}", c as u32)?,
                c => write!(f, "{}", c)?,
            }
        }
        Ok(())
    }
}

/// A relative distinguished name: a non-empty set of assertions.
///
/// Equality is insensitive to assertion order.
#[derive(Debug, Clone, Eq)]
pub struct Rdn {
    assertions: Vec<RdnAssertion>,
}

impl Rdn {
    pub fn new(assertions: Vec<RdnAssertion>) -> Result<Self, DnError> {
        if assertions.is_empty() {
            return Err(DnError::Invalid("empty RDN".to_string()));
        }
        Ok(Rdn { assertions })
    }

    /// Convenience constructor for the common single-assertion case.
    pub fn single(schema: &Schema, attribute: &str, value: &str) -> Result<Self, DnError> {
        Ok(Rdn {
            assertions: vec![RdnAssertion::new(schema, attribute, value)?],
        })
    }

    pub fn from_str(schema: &Schema, s: &str) -> Result<Self, DnError> {
        if s.is_empty() {
            return Err(DnError::Invalid("empty RDN".to_string()));
        }
        let mut assertions = Vec::new();
        for part in split_unescaped(s, '+') {
            assertions.push(RdnAssertion::from_str(schema, part)?);
        }
        Rdn::new(assertions)
    }

    pub fn assertions(&self) -> &[RdnAssertion] {
        &self.assertions
    }

    /// The only assertion, if this RDN is single-valued.
    pub fn as_single(&self) -> Option<&RdnAssertion> {
        match self.assertions.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }

    fn sorted(&self) -> Vec<&RdnAssertion> {
        let mut refs: Vec<&RdnAssertion> = self.assertions.iter().collect();
        refs.sort_by(|a, b| {
            (&a.oid, &a.value_normalized).cmp(&(&b.oid, &b.value_normalized))
        });
        refs
    }
}

impl PartialEq for Rdn {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl Hash for Rdn {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for a in self.sorted() {
            a.hash(state);
        }
    }
}

impl fmt::Display for Rdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.assertions.iter().map(|a| a.to_string()).collect();
        write!(f, "{}", parts.join("+"))
    }
}

/// A distinguished name, ordered leaf-first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Dn {
    rdns: Vec<Rdn>,
}

impl Dn {
    /// The empty DN (the root of the tree, also the RootDSE name).
    pub fn root() -> Self {
        Dn { rdns: Vec::new() }
    }

    pub fn new(rdns: Vec<Rdn>) -> Self {
        Dn { rdns }
    }

    /// Parse an RFC 4514 string representation.
    pub fn parse(schema: &Schema, s: &str) -> Result<Self, DnError> {
        if s.is_empty() {
            return Ok(Dn::root());
        }
        let mut rdns = Vec::new();
        for part in split_unescaped(s, ',') {
            rdns.push(Rdn::from_str(schema, part)?);
        }
        Ok(Dn { rdns })
    }

    pub fn is_empty(&self) -> bool {
        self.rdns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rdns.len()
    }

    pub fn rdns(&self) -> &[Rdn] {
        &self.rdns
    }

    /// The leftmost (leaf) RDN.
    pub fn first_rdn(&self) -> Option<&Rdn> {
        self.rdns.first()
    }

    /// The DN with the first `n` RDNs removed.
    pub fn suffix(&self, n: usize) -> Dn {
        Dn {
            rdns: self.rdns.iter().skip(n).cloned().collect(),
        }
    }

    /// The parent of this DN (`None` for the root).
    pub fn parent(&self) -> Option<Dn> {
        if self.rdns.is_empty() {
            None
        } else {
            Some(self.suffix(1))
        }
    }

    pub fn is_direct_child_of(&self, other: &Dn) -> bool {
        self.rdns.len() == other.rdns.len() + 1 && self.suffix(1) == *other
    }

    pub fn in_subtree_of(&self, other: &Dn) -> bool {
        self.rdns.len() >= other.rdns.len()
            && self.suffix(self.rdns.len() - other.rdns.len()) == *other
    }
}

impl fmt::Display for Dn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.rdns.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

impl Add<&Dn> for &Dn {
    type Output = Dn;

    fn add(self, rhs: &Dn) -> Dn {
        let mut rdns = self.rdns.clone();
        rdns.extend(rhs.rdns.iter().cloned());
        Dn { rdns }
    }
}

impl Add<&Rdn> for &Dn {
    type Output = Dn;

    fn add(self, rhs: &Rdn) -> Dn {
        let mut rdns = self.rdns.clone();
        rdns.push(rhs.clone());
        Dn { rdns }
    }
}

impl Add<&Dn> for &Rdn {
    type Output = Dn;

    fn add(self, rhs: &Dn) -> Dn {
        let mut rdns = vec![self.clone()];
        rdns.extend(rhs.rdns.iter().cloned());
        Dn { rdns }
    }
}

impl Add<&Rdn> for &Rdn {
    type Output = Dn;

    fn add(self, rhs: &Rdn) -> Dn {
        Dn {
            rdns: vec![self.clone(), rhs.clone()],
        }
    }
}

/// A DN with an optional bit-string uid, the decoded form of the
/// NameAndOptionalUID syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnWithUid {
    pub dn: Dn,
    pub uid: String,
}

impl fmt::Display for DnWithUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.dn, self.uid)
    }
}

fn find_unescaped(s: &str, needle: char) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == needle {
            return Some(i);
        }
    }
    None
}

fn split_unescaped(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == separator {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

// Unescape an attribute value: '\' followed by a special character stands for
// that character, '\' followed by two hex digits for a raw byte. Escaped byte
// sequences may form multi-byte UTF-8 characters.
fn unescape_value(s: &str) -> Result<String, DnError> {
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }
        let next = *bytes
            .get(i + 1)
            .ok_or_else(|| DnError::Invalid("trailing backslash".to_string()))?;
        match next {
            b' ' | b'"' | b'#' | b'+' | b',' | b';' | b'<' | b'=' | b'>' | b'\\' => {
                out.push(next);
                i += 2;
            }
            _ => {
                let hex = s
                    .get(i + 1..i + 3)
                    .ok_or_else(|| DnError::Invalid("truncated escape".to_string()))?;
                let byte = u8::from_str_radix(hex, 16)
                    .map_err(|_| DnError::Invalid(format!("invalid escape '\\{}'", hex)))?;
                out.push(byte);
                i += 3;
            }
        }
    }
    String::from_utf8(out).map_err(|_| DnError::Invalid("invalid UTF-8 in value".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use std::sync::Arc;

    fn s() -> Arc<Schema> {
        schema::rfc4519()
    }

    fn dn(s_: &Arc<Schema>, text: &str) -> Dn {
        Dn::parse(s_, text).unwrap()
    }

    #[test]
    fn test_equal() {
        let s = s();
        assert_eq!(Dn::root(), Dn::root());
        assert_eq!(
            dn(&s, "uid=jsmith,dc=example,dc=net"),
            dn(&s, "uid=jsmith,dc=example,dc=net")
        );
        assert_ne!(dn(&s, "dc=example,dc=net"), dn(&s, "dc=net,dc=example"));
    }

    #[test]
    fn test_is_direct_child_of() {
        let s = s();
        let child = dn(&s, "uid=jsmith,dc=example,dc=net");
        assert!(child.is_direct_child_of(&dn(&s, "dc=example,dc=net")));
        assert!(!child.is_direct_child_of(&child));
        assert!(!child.is_direct_child_of(&dn(&s, "dc=foobar,dc=net")));
        assert!(!child.is_direct_child_of(&dn(&s, "dc=net")));
        assert!(!child.is_direct_child_of(&dn(&s, "cn=foobar,uid=jsmith,dc=example,dc=net")));
        assert!(!Dn::root().is_direct_child_of(&Dn::root()));
        assert!(dn(&s, "cn=Subschema").is_direct_child_of(&Dn::root()));
    }

    #[test]
    fn test_in_subtree_of() {
        let s = s();
        let child = dn(&s, "uid=jsmith,dc=example,dc=net");
        assert!(child.in_subtree_of(&dn(&s, "dc=example,dc=net")));
        assert!(child.in_subtree_of(&child));
        assert!(!child.in_subtree_of(&dn(&s, "dc=foobar,dc=net")));
        assert!(child.in_subtree_of(&dn(&s, "dc=net")));
        assert!(!child.in_subtree_of(&dn(&s, "cn=foobar,uid=jsmith,dc=example,dc=net")));
        assert!(Dn::root().in_subtree_of(&Dn::root()));
        assert!(dn(&s, "cn=Subschema").in_subtree_of(&Dn::root()));
    }

    #[test]
    fn test_add() {
        let s = s();
        let full = dn(&s, "uid=jsmith,dc=example,dc=net");
        assert_eq!(&full + &Dn::root(), full);
        assert_eq!(&Dn::root() + &full, full);
        let prefix = dn(&s, "uid=jsmith,dc=example");
        let net = Rdn::single(&s, "dc", "net").unwrap();
        assert_eq!(&prefix + &net, full);
        let uid = Rdn::single(&s, "uid", "jsmith").unwrap();
        assert_eq!(&uid + &dn(&s, "dc=example,dc=net"), full);
        let example = Rdn::single(&s, "dc", "example").unwrap();
        assert_eq!(&uid + &(&example + &net), full);
    }

    #[test]
    fn test_encode() {
        let s = s();
        assert_eq!(Dn::root().to_string(), "");
        assert_eq!(
            dn(&s, r"uid=j\,smith,dc=example,dc=net").to_string(),
            r"uid=j\,smith,dc=example,dc=net"
        );
        assert_eq!(
            dn(&s, "uid=jsmith,dc=example,dc=net").to_string(),
            "uid=jsmith,dc=example,dc=net"
        );
        assert_eq!(
            dn(&s, r#"cn=James \"Jim\" Smith\, III,dc=example,dc=net"#).to_string(),
            r#"cn=James \"Jim\" Smith\, III,dc=example,dc=net"#
        );
        assert_eq!(
            dn(&s, r"cn=Before\0dAfter,dc=example,dc=net").to_string(),
            r"cn=Before\0dAfter,dc=example,dc=net"
        );
        assert_eq!(dn(&s, "cn=Lučić").to_string(), "cn=Lučić");
    }

    #[test]
    fn test_decode() {
        let s = s();
        assert_eq!(dn(&s, ""), Dn::root());
        assert_eq!(
            dn(&s, r"uid=j\2csmith,dc=example,dc=net"),
            dn(&s, r"uid=j\,smith,dc=example,dc=net")
        );
        // examples from RFC4514
        assert_eq!(
            dn(&s, r"ou=Sales+cn=J.  Smith,dc=example,dc=net"),
            dn(&s, r"cn=J.  Smith+ou=Sales,dc=example,dc=net")
        );
        assert_eq!(
            dn(&s, r"cn=James \22Jim\22 Smith\2c III,dc=example,dc=net"),
            dn(&s, r#"cn=James \"Jim\" Smith\, III,dc=example,dc=net"#)
        );
        assert_eq!(dn(&s, r"cn=Lu\C4\8Di\C4\87"), dn(&s, "cn=Lučić"));
        assert!(Dn::parse(&s, "invalidAttributeType=foobar,dc=example,dc=net").is_err());
        assert!(Dn::parse(&s, "cn=,dc=example,dc=net").is_err());
        assert!(Dn::parse(&s, ",").is_err());
    }

    #[test]
    fn test_slice() {
        let s = s();
        let full = dn(&s, "uid=jsmith,dc=example,dc=net");
        assert_eq!(full.rdns()[1], Rdn::single(&s, "dc", "example").unwrap());
        assert_eq!(full.suffix(1), dn(&s, "dc=example,dc=net"));
    }

    #[test]
    fn test_rdn_equal() {
        let s = s();
        assert_eq!(
            Rdn::single(&s, "uid", "jsmith").unwrap(),
            Rdn::single(&s, "uid", "Jsmith").unwrap()
        );
        assert_eq!(
            Rdn::single(&s, "uid", "jsmith").unwrap(),
            Rdn::single(&s, "UID", "jsmith").unwrap()
        );
        assert_eq!(
            Rdn::from_str(&s, "ou=Sales+cn=J.  Smith+ou=HR").unwrap(),
            Rdn::from_str(&s, "cn=J.  Smith+ou=HR+ou=Sales").unwrap()
        );
    }

    #[test]
    fn test_rdn_decode() {
        let s = s();
        assert_eq!(
            Rdn::from_str(&s, "cn=foo").unwrap(),
            Rdn::single(&s, "cn", "foo").unwrap()
        );
        assert_eq!(
            Rdn::from_str(&s, r"cn=foo\+bar+ou=bar").unwrap(),
            Rdn::new(vec![
                RdnAssertion::new(&s, "cn", "foo+bar").unwrap(),
                RdnAssertion::new(&s, "ou", "bar").unwrap(),
            ])
            .unwrap()
        );
        assert_eq!(
            Rdn::from_str(&s, r"OU=Sales+CN=J.  Smith").unwrap(),
            Rdn::from_str(&s, r"cn=J.  Smith+ou=Sales").unwrap()
        );
        assert!(Rdn::from_str(&s, "").is_err());
        assert!(Rdn::from_str(&s, "cn").is_err());
        assert!(Rdn::from_str(&s, "cn=").is_err());
        assert!(Rdn::from_str(&s, "cn=foo+ou+dc=bar").is_err());
    }

    #[test]
    fn test_assertion_equal() {
        let s = s();
        // NFD vs NFC of the value
        assert_eq!(
            RdnAssertion::new(&s, "cn", "fooa\u{0308}bar").unwrap(),
            RdnAssertion::new(&s, "CN", "foo\u{00e4}bar").unwrap()
        );
        // case of the value
        assert_eq!(
            RdnAssertion::new(&s, "cn", "foo bar").unwrap(),
            RdnAssertion::new(&s, "cn", "Foo Bar").unwrap()
        );
        assert_eq!(
            RdnAssertion::new(&s, "cn", "ä").unwrap(),
            RdnAssertion::new(&s, "cn", "Ä").unwrap()
        );
        // case of the type
        assert_eq!(
            RdnAssertion::new(&s, "cn", "foo").unwrap(),
            RdnAssertion::new(&s, "CN", "foo").unwrap()
        );
        assert!(RdnAssertion::new(&s, "invalidAttributeType", "foobar").is_err());
    }

    #[test]
    fn test_assertion_encode() {
        let s = s();
        let enc = |attr: &str, value: &str| RdnAssertion::new(&s, attr, value).unwrap().to_string();
        assert_eq!(enc("cn", " foobar"), r"cn=\ foobar");
        assert_eq!(enc("cn", "#foobar"), r"cn=\#foobar");
        assert_eq!(enc("cn", "foobar "), r"cn=foobar\ ");
        assert_eq!(enc("cn", r"foo\bar"), r"cn=foo\\bar");
        assert_eq!(enc("cn", "foo,bar"), r"cn=foo\,bar");
        assert_eq!(enc("cn", "foo+bar"), r"cn=foo\+bar");
        assert_eq!(enc("cn", "foo\x00bar"), r"cn=foo\00bar");
        assert_eq!(enc("cn", "foo\"bar"), r#"cn=foo\"bar"#);
        assert_eq!(enc("cn", "foo;bar"), r"cn=foo\;bar");
        assert_eq!(enc("cn", "foo<bar"), r"cn=foo\<bar");
        assert_eq!(enc("cn", "foo>bar"), r"cn=foo\>bar");
        assert_eq!(enc("cn", "Before\rAfter"), r"cn=Before\0dAfter");
    }

    #[test]
    fn test_assertion_decode() {
        let s = s();
        let a = |text: &str| RdnAssertion::from_str(&s, text).unwrap();
        let n = |attr: &str, value: &str| RdnAssertion::new(&s, attr, value).unwrap();
        assert_eq!(a(r"cn=\ foobar"), n("cn", " foobar"));
        assert_eq!(a(r"cn=\20foobar"), n("cn", " foobar"));
        assert_eq!(a(r"cn=\#foobar"), n("cn", "#foobar"));
        assert_eq!(a(r"cn=foobar\ "), n("cn", "foobar "));
        assert_eq!(a(r"cn=foo\\bar"), n("cn", r"foo\bar"));
        assert_eq!(a(r"cn=foo\5cbar"), n("cn", r"foo\bar"));
        assert_eq!(a(r"cn=foo\,bar"), n("cn", "foo,bar"));
        assert_eq!(a(r"cn=foo\00bar"), n("cn", "foo\x00bar"));
        assert_eq!(a(r"cn=foo#bar"), n("cn", "foo#bar"));
        assert_eq!(a(r"cn=foo bar"), n("cn", "foo bar"));
        assert_eq!(a(r"cn=foo=bar"), n("cn", "foo=bar"));
        assert_eq!(a(r"cn=foo\=bar"), n("cn", "foo=bar"));
        assert_eq!(a(r"CN=Before\0dAfter"), n("cn", "Before\rAfter"));
        assert_eq!(a(r"CN=Lu\C4\8Di\C4\87"), n("cn", "Lučić"));
        assert!(RdnAssertion::from_str(&s, r"1.3.6.1.4.1.1466.0=#04024869").is_err());
        assert!(RdnAssertion::from_str(&s, r"cn=foo\Xbar").is_err());
        assert!(RdnAssertion::from_str(&s, "invalidAttributeType=test").is_err());
        assert!(RdnAssertion::from_str(&s, "cn=").is_err());
        assert!(RdnAssertion::from_str(&s, "=foo").is_err());
        assert!(RdnAssertion::from_str(&s, "").is_err());
        assert!(RdnAssertion::from_str(&s, "foo").is_err());
    }
}
