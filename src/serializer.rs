//! BER serialization of LDAP messages
//!
//! The encoding mirror of the [`crate::parser`] module: every protocol op the
//! server can send (and, for test and client use, the requests as well) is
//! emitted as definite-length BER. Integers use minimal-length two's
//! complement, booleans are emitted as `0xFF`/`0x00`, so the output is also
//! valid DER.

use crate::filter::*;
use crate::ldap::*;
use asn1_rs::{Class, Tag};
use std::borrow::Cow;

/// Serialize a value to BER bytes.
pub trait ToBer {
    fn to_ber(&self) -> Vec<u8>;
}

fn write_tag(out: &mut Vec<u8>, class: Class, constructed: bool, tag: Tag) {
    // low-tag-number form only: every tag in RFC4511 is below 31
    let mut b = (class as u8) << 6;
    if constructed {
        b |= 0x20;
    }
    b |= (tag.0 as u8) & 0x1f;
    out.push(b);
}

fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else {
        let bytes = (len as u64).to_be_bytes();
        let skip = bytes.iter().take_while(|&&b| b == 0).count();
        out.push(0x80 | (8 - skip) as u8);
        out.extend_from_slice(&bytes[skip..]);
    }
}

fn write_tlv(out: &mut Vec<u8>, class: Class, constructed: bool, tag: Tag, content: &[u8]) {
    write_tag(out, class, constructed, tag);
    write_length(out, content.len());
    out.extend_from_slice(content);
}

/// Minimal-length two's complement content octets of an INTEGER.
fn integer_content(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut skip = 0;
    while skip < 7 {
        let b = bytes[skip];
        let next = bytes[skip + 1];
        if (b == 0x00 && next < 0x80) || (b == 0xff && next >= 0x80) {
            skip += 1;
        } else {
            break;
        }
    }
    bytes[skip..].to_vec()
}

fn write_integer(out: &mut Vec<u8>, value: i64) {
    write_tlv(
        out,
        Class::Universal,
        false,
        Tag::Integer,
        &integer_content(value),
    );
}

fn write_enumerated(out: &mut Vec<u8>, value: u32) {
    write_tlv(
        out,
        Class::Universal,
        false,
        Tag::Enumerated,
        &integer_content(i64::from(value)),
    );
}

fn write_octet_string(out: &mut Vec<u8>, content: &[u8]) {
    write_tlv(out, Class::Universal, false, Tag::OctetString, content);
}

fn write_boolean(out: &mut Vec<u8>, value: bool) {
    write_tlv(
        out,
        Class::Universal,
        false,
        Tag::Boolean,
        if value { &[0xff] } else { &[0x00] },
    );
}

fn write_sequence(out: &mut Vec<u8>, content: &[u8]) {
    write_tlv(out, Class::Universal, true, Tag::Sequence, content);
}

fn write_set(out: &mut Vec<u8>, content: &[u8]) {
    write_tlv(out, Class::Universal, true, Tag::Set, content);
}

fn write_application(out: &mut Vec<u8>, tag: u32, constructed: bool, content: &[u8]) {
    write_tlv(out, Class::Application, constructed, Tag(tag), content);
}

fn write_context(out: &mut Vec<u8>, tag: u32, constructed: bool, content: &[u8]) {
    write_tlv(out, Class::ContextSpecific, constructed, Tag(tag), content);
}

// LDAPResult ::= SEQUENCE { resultCode, matchedDN, diagnosticMessage }
// (emitted as COMPONENTS OF inside the implicitly tagged response)
fn ldap_result_content(result: &LdapResult<'_>) -> Vec<u8> {
    let mut out = Vec::new();
    write_enumerated(&mut out, result.result_code.0);
    write_octet_string(&mut out, result.matched_dn.0.as_bytes());
    write_octet_string(&mut out, result.diagnostic_message.0.as_bytes());
    out
}

// AttributeValueAssertion ::= SEQUENCE { attributeDesc, assertionValue }
fn ava_content(ava: &AttributeValueAssertion<'_>) -> Vec<u8> {
    let mut out = Vec::new();
    write_octet_string(&mut out, ava.attribute_desc.0.as_bytes());
    write_octet_string(&mut out, ava.assertion_value.as_ref());
    out
}

// PartialAttribute ::= SEQUENCE { type, vals SET OF AttributeValue }
impl ToBer for PartialAttribute<'_> {
    fn to_ber(&self) -> Vec<u8> {
        let mut content = Vec::new();
        write_octet_string(&mut content, self.attr_type.0.as_bytes());
        let mut vals = Vec::new();
        for v in &self.attr_vals {
            write_octet_string(&mut vals, v.0.as_ref());
        }
        write_set(&mut content, &vals);
        let mut out = Vec::new();
        write_sequence(&mut out, &content);
        out
    }
}

impl ToBer for Attribute<'_> {
    fn to_ber(&self) -> Vec<u8> {
        let mut content = Vec::new();
        write_octet_string(&mut content, self.attr_type.0.as_bytes());
        let mut vals = Vec::new();
        for v in &self.attr_vals {
            write_octet_string(&mut vals, v.0.as_ref());
        }
        write_set(&mut content, &vals);
        let mut out = Vec::new();
        write_sequence(&mut out, &content);
        out
    }
}

// Filter ::= CHOICE { and [0], or [1], not [2], equalityMatch [3],
//      substrings [4], greaterOrEqual [5], lessOrEqual [6], present [7],
//      approxMatch [8], extensibleMatch [9] }
impl ToBer for Filter<'_> {
    fn to_ber(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Filter::And(filters) => {
                let mut content = Vec::new();
                for f in filters {
                    content.extend_from_slice(&f.to_ber());
                }
                write_context(&mut out, 0, true, &content);
            }
            Filter::Or(filters) => {
                let mut content = Vec::new();
                for f in filters {
                    content.extend_from_slice(&f.to_ber());
                }
                write_context(&mut out, 1, true, &content);
            }
            Filter::Not(f) => {
                write_context(&mut out, 2, true, &f.to_ber());
            }
            Filter::EqualityMatch(ava) => {
                write_context(&mut out, 3, true, &ava_content(ava));
            }
            Filter::Substrings(sub) => {
                let mut content = Vec::new();
                write_octet_string(&mut content, sub.filter_type.0.as_bytes());
                let mut pieces = Vec::new();
                for s in &sub.substrings {
                    match s {
                        Substring::Initial(v) => write_context(&mut pieces, 0, false, v.0.as_ref()),
                        Substring::Any(v) => write_context(&mut pieces, 1, false, v.0.as_ref()),
                        Substring::Final(v) => write_context(&mut pieces, 2, false, v.0.as_ref()),
                    }
                }
                write_sequence(&mut content, &pieces);
                write_context(&mut out, 4, true, &content);
            }
            Filter::GreaterOrEqual(ava) => {
                write_context(&mut out, 5, true, &ava_content(ava));
            }
            Filter::LessOrEqual(ava) => {
                write_context(&mut out, 6, true, &ava_content(ava));
            }
            Filter::Present(attr) => {
                write_context(&mut out, 7, false, attr.0.as_bytes());
            }
            Filter::ApproxMatch(ava) => {
                write_context(&mut out, 8, true, &ava_content(ava));
            }
            Filter::ExtensibleMatch(mra) => {
                let mut content = Vec::new();
                if let Some(rule) = &mra.matching_rule {
                    write_context(&mut content, 1, false, rule.0.as_bytes());
                }
                if let Some(attr) = &mra.rule_type {
                    write_context(&mut content, 2, false, attr.0.as_bytes());
                }
                write_context(&mut content, 3, false, mra.assertion_value.0.as_ref());
                if let Some(dn_attributes) = mra.dn_attributes {
                    let b: &[u8] = if dn_attributes { &[0xff] } else { &[0x00] };
                    write_context(&mut content, 4, false, b);
                }
                write_context(&mut out, 9, true, &content);
            }
        }
        out
    }
}

impl ToBer for Control<'_> {
    fn to_ber(&self) -> Vec<u8> {
        let mut content = Vec::new();
        write_octet_string(&mut content, self.control_type.0.as_bytes());
        if self.criticality {
            write_boolean(&mut content, true);
        }
        if let Some(value) = &self.control_value {
            write_octet_string(&mut content, value.as_ref());
        }
        let mut out = Vec::new();
        write_sequence(&mut out, &content);
        out
    }
}

impl ToBer for ProtocolOp<'_> {
    fn to_ber(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            ProtocolOp::BindRequest(req) => {
                let mut content = Vec::new();
                write_integer(&mut content, i64::from(req.version));
                write_octet_string(&mut content, req.name.0.as_bytes());
                match &req.authentication {
                    AuthenticationChoice::Simple(password) => {
                        write_context(&mut content, 0, false, password.as_ref());
                    }
                    AuthenticationChoice::Sasl(creds) => {
                        let mut sasl = Vec::new();
                        write_octet_string(&mut sasl, creds.mechanism.0.as_bytes());
                        if let Some(c) = &creds.credentials {
                            write_octet_string(&mut sasl, c.as_ref());
                        }
                        write_context(&mut content, 3, true, &sasl);
                    }
                }
                write_application(&mut out, 0, true, &content);
            }
            ProtocolOp::BindResponse(resp) => {
                let mut content = ldap_result_content(&resp.result);
                if let Some(creds) = &resp.server_sasl_creds {
                    write_context(&mut content, 7, false, creds.as_ref());
                }
                write_application(&mut out, 1, true, &content);
            }
            ProtocolOp::UnbindRequest => {
                write_application(&mut out, 2, false, &[]);
            }
            ProtocolOp::SearchRequest(req) => {
                let mut content = Vec::new();
                write_octet_string(&mut content, req.base_object.0.as_bytes());
                write_enumerated(&mut content, req.scope.0);
                write_enumerated(&mut content, req.deref_aliases.0);
                write_integer(&mut content, i64::from(req.size_limit));
                write_integer(&mut content, i64::from(req.time_limit));
                write_boolean(&mut content, req.types_only);
                content.extend_from_slice(&req.filter.to_ber());
                let mut attrs = Vec::new();
                for a in &req.attributes {
                    write_octet_string(&mut attrs, a.0.as_bytes());
                }
                write_sequence(&mut content, &attrs);
                write_application(&mut out, 3, true, &content);
            }
            ProtocolOp::SearchResultEntry(entry) => {
                let mut content = Vec::new();
                write_octet_string(&mut content, entry.object_name.0.as_bytes());
                let mut attrs = Vec::new();
                for a in &entry.attributes {
                    attrs.extend_from_slice(&a.to_ber());
                }
                write_sequence(&mut content, &attrs);
                write_application(&mut out, 4, true, &content);
            }
            ProtocolOp::SearchResultDone(result) => {
                write_application(&mut out, 5, true, &ldap_result_content(result));
            }
            ProtocolOp::SearchResultReference(uris) => {
                let mut content = Vec::new();
                for uri in uris {
                    write_octet_string(&mut content, uri.0.as_bytes());
                }
                write_application(&mut out, 19, true, &content);
            }
            ProtocolOp::ModifyRequest(req) => {
                let mut content = Vec::new();
                write_octet_string(&mut content, req.object.0.as_bytes());
                let mut changes = Vec::new();
                for change in &req.changes {
                    let mut c = Vec::new();
                    write_enumerated(&mut c, change.operation.0);
                    c.extend_from_slice(&change.modification.to_ber());
                    write_sequence(&mut changes, &c);
                }
                write_sequence(&mut content, &changes);
                write_application(&mut out, 6, true, &content);
            }
            ProtocolOp::ModifyResponse(resp) => {
                write_application(&mut out, 7, true, &ldap_result_content(&resp.result));
            }
            ProtocolOp::AddRequest(req) => {
                let mut content = Vec::new();
                write_octet_string(&mut content, req.entry.0.as_bytes());
                let mut attrs = Vec::new();
                for a in &req.attributes {
                    attrs.extend_from_slice(&a.to_ber());
                }
                write_sequence(&mut content, &attrs);
                write_application(&mut out, 8, true, &content);
            }
            ProtocolOp::AddResponse(result) => {
                write_application(&mut out, 9, true, &ldap_result_content(result));
            }
            ProtocolOp::DelRequest(dn) => {
                write_application(&mut out, 10, false, dn.0.as_bytes());
            }
            ProtocolOp::DelResponse(result) => {
                write_application(&mut out, 11, true, &ldap_result_content(result));
            }
            ProtocolOp::ModDnRequest(req) => {
                let mut content = Vec::new();
                write_octet_string(&mut content, req.entry.0.as_bytes());
                write_octet_string(&mut content, req.newrdn.0.as_bytes());
                write_boolean(&mut content, req.deleteoldrdn);
                if let Some(sup) = &req.newsuperior {
                    write_context(&mut content, 0, false, sup.0.as_bytes());
                }
                write_application(&mut out, 12, true, &content);
            }
            ProtocolOp::ModDnResponse(result) => {
                write_application(&mut out, 13, true, &ldap_result_content(result));
            }
            ProtocolOp::CompareRequest(req) => {
                let mut content = Vec::new();
                write_octet_string(&mut content, req.entry.0.as_bytes());
                let mut ava = Vec::new();
                write_sequence(&mut ava, &ava_content(&req.ava));
                content.extend_from_slice(&ava);
                write_application(&mut out, 14, true, &content);
            }
            ProtocolOp::CompareResponse(result) => {
                write_application(&mut out, 15, true, &ldap_result_content(result));
            }
            ProtocolOp::AbandonRequest(id) => {
                write_application(&mut out, 16, false, &integer_content(i64::from(id.0)));
            }
            ProtocolOp::ExtendedRequest(req) => {
                let mut content = Vec::new();
                write_context(&mut content, 0, false, req.request_name.0.as_bytes());
                if let Some(value) = &req.request_value {
                    write_context(&mut content, 1, false, value.as_ref());
                }
                write_application(&mut out, 23, true, &content);
            }
            ProtocolOp::ExtendedResponse(resp) => {
                let mut content = ldap_result_content(&resp.result);
                if let Some(name) = &resp.response_name {
                    write_context(&mut content, 10, false, name.0.as_bytes());
                }
                if let Some(value) = &resp.response_value {
                    write_context(&mut content, 11, false, value.as_ref());
                }
                write_application(&mut out, 24, true, &content);
            }
            ProtocolOp::IntermediateResponse(resp) => {
                let mut content = Vec::new();
                if let Some(name) = &resp.response_name {
                    write_context(&mut content, 0, false, name.0.as_bytes());
                }
                if let Some(value) = &resp.response_value {
                    write_context(&mut content, 1, false, value.as_ref());
                }
                write_application(&mut out, 25, true, &content);
            }
        }
        out
    }
}

impl ToBer for LdapMessage<'_> {
    fn to_ber(&self) -> Vec<u8> {
        let mut content = Vec::new();
        write_integer(&mut content, i64::from(self.message_id.0));
        content.extend_from_slice(&self.protocol_op.to_ber());
        if let Some(controls) = &self.controls {
            let mut ctls = Vec::new();
            for c in controls {
                ctls.extend_from_slice(&c.to_ber());
            }
            write_context(&mut content, 0, true, &ctls);
        }
        let mut out = Vec::new();
        write_sequence(&mut out, &content);
        out
    }
}

/// Build an [`AttributeValueAssertion`] with owned contents.
pub fn owned_ava(attribute: &str, value: &[u8]) -> AttributeValueAssertion<'static> {
    AttributeValueAssertion {
        attribute_desc: LdapString(Cow::Owned(attribute.to_string())),
        assertion_value: Cow::Owned(value.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asn1_rs::FromBer;
    use hex_literal::hex;

    #[test]
    fn test_integer_canonical_forms() {
        assert_eq!(integer_content(0), vec![0x00]);
        assert_eq!(integer_content(1), vec![0x01]);
        assert_eq!(integer_content(127), vec![0x7f]);
        assert_eq!(integer_content(128), vec![0x00, 0x80]);
        assert_eq!(integer_content(256), vec![0x01, 0x00]);
        assert_eq!(integer_content(-1), vec![0xff]);
        assert_eq!(integer_content(-128), vec![0x80]);
        assert_eq!(integer_content(-129), vec![0xff, 0x7f]);
        let mut out = Vec::new();
        write_integer(&mut out, 0);
        assert_eq!(out, hex!("02 01 00"));
        let mut out = Vec::new();
        write_integer(&mut out, 128);
        assert_eq!(out, hex!("02 02 00 80"));
        let mut out = Vec::new();
        write_integer(&mut out, -129);
        assert_eq!(out, hex!("02 02 ff 7f"));
    }

    #[test]
    fn test_primitive_forms() {
        let mut out = Vec::new();
        write_octet_string(&mut out, b"foo");
        assert_eq!(out, hex!("04 03 66 6f 6f"));
        let mut out = Vec::new();
        write_octet_string(&mut out, b"");
        assert_eq!(out, hex!("04 00"));
        let mut out = Vec::new();
        write_boolean(&mut out, true);
        assert_eq!(out, hex!("01 01 ff"));
        let mut out = Vec::new();
        write_boolean(&mut out, false);
        assert_eq!(out, hex!("01 01 00"));
        let mut out = Vec::new();
        write_enumerated(&mut out, 0);
        assert_eq!(out, hex!("0a 01 00"));
        let mut out = Vec::new();
        write_enumerated(&mut out, 1);
        assert_eq!(out, hex!("0a 01 01"));
    }

    #[test]
    fn test_long_form_length() {
        let content = vec![0u8; 0x80];
        let mut out = Vec::new();
        write_octet_string(&mut out, &content);
        assert_eq!(&out[..3], &[0x04, 0x81, 0x80]);
        assert_eq!(out.len(), 3 + 0x80);
        let content = vec![0u8; 0x1234];
        let mut out = Vec::new();
        write_octet_string(&mut out, &content);
        assert_eq!(&out[..4], &[0x04, 0x82, 0x12, 0x34]);
    }

    #[test]
    fn test_unbind_encoding() {
        let msg = LdapMessage::response(MessageID(34), ProtocolOp::UnbindRequest);
        assert_eq!(msg.to_ber(), b"0\x05\x02\x01\x22B\x00");
    }

    #[test]
    fn test_search_result_done_roundtrip() {
        let msg = LdapMessage::response(
            MessageID(7),
            ProtocolOp::SearchResultDone(LdapResult::success()),
        );
        let bytes = msg.to_ber();
        let (rem, decoded) = LdapMessage::from_ber(&bytes).expect("parsing failed");
        assert!(rem.is_empty());
        assert_eq!(decoded.message_id, MessageID(7));
        assert_eq!(
            decoded.protocol_op.result().map(|r| r.result_code),
            Some(ResultCode::Success)
        );
    }

    #[test]
    fn test_bind_request_roundtrip() {
        let msg = LdapMessage::response(
            MessageID(30),
            ProtocolOp::BindRequest(BindRequest {
                version: 3,
                name: LdapDN(Cow::Borrowed("cn=service,ou=system,dc=example,dc=com")),
                authentication: AuthenticationChoice::Simple(Cow::Borrowed(b"foobar")),
            }),
        );
        let bytes = msg.to_ber();
        // byte-identical with the capture emitted by other implementations
        assert_eq!(
            bytes,
            &b"08\x02\x01\x1e\x603\x02\x01\x03\x04&cn=service,ou=system,dc=example,dc=com\x80\x06foobar"[..]
        );
    }

    #[test]
    fn test_search_request_roundtrip() {
        let req = SearchRequest::base_object("cn=Subschema");
        let msg = LdapMessage::response(MessageID(2), ProtocolOp::SearchRequest(req.clone()));
        let bytes = msg.to_ber();
        let (rem, decoded) = LdapMessage::from_ber(&bytes).expect("parsing failed");
        assert!(rem.is_empty());
        match decoded.protocol_op {
            ProtocolOp::SearchRequest(d) => {
                assert_eq!(d.base_object.0, "cn=Subschema");
                assert_eq!(d.scope, SearchScope::BaseObject);
                assert_eq!(d.filter, req.filter);
            }
            op => panic!("unexpected op {:?}", op.tag()),
        }
    }

    #[test]
    fn test_filter_roundtrip() {
        let filter = Filter::And(vec![
            Filter::EqualityMatch(owned_ava("objectClass", b"person")),
            Filter::Not(Box::new(Filter::Present(LdapString(Cow::Borrowed("uid"))))),
            Filter::Substrings(SubstringFilter {
                filter_type: LdapString(Cow::Borrowed("cn")),
                substrings: vec![
                    Substring::Initial(AssertionValue(Cow::Borrowed(b"f"))),
                    Substring::Any(AssertionValue(Cow::Borrowed(b"b"))),
                    Substring::Final(AssertionValue(Cow::Borrowed(b"r"))),
                ],
            }),
        ]);
        let bytes = filter.to_ber();
        let (rem, decoded) = Filter::from_ber(&bytes).expect("parsing failed");
        assert!(rem.is_empty());
        assert_eq!(decoded, filter);
    }

    #[test]
    fn test_search_result_entry_roundtrip() {
        let entry = SearchResultEntry {
            object_name: LdapDN(Cow::Borrowed("cn=foo,dc=example,dc=com")),
            attributes: vec![PartialAttribute {
                attr_type: LdapString(Cow::Borrowed("cn")),
                attr_vals: vec![
                    AttributeValue(Cow::Borrowed(b"foo")),
                    AttributeValue(Cow::Borrowed(b"bar")),
                ],
            }],
        };
        let msg = LdapMessage::response(MessageID(3), ProtocolOp::SearchResultEntry(entry.clone()));
        let bytes = msg.to_ber();
        let (rem, decoded) = LdapMessage::from_ber(&bytes).expect("parsing failed");
        assert!(rem.is_empty());
        match decoded.protocol_op {
            ProtocolOp::SearchResultEntry(d) => assert_eq!(d, entry),
            op => panic!("unexpected op {:?}", op.tag()),
        }
    }
}
