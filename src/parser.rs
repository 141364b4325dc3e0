// DEFINITIONS
// IMPLICIT TAGS
// EXTENSIBILITY IMPLIED

use crate::error::*;
use crate::filter::*;
use crate::ldap::*;
use asn1_rs::nom;
use asn1_rs::{
    Class, Enumerated, FromBer, Header, Implicit, OptTaggedParser, ParseResult, Sequence, Tag,
    TaggedParser, TaggedValue,
};
use nom::bytes::streaming::take;
use nom::combinator::{complete, map, opt, verify};
use nom::multi::{many0, many1};
use nom::{Err, Needed};
use std::borrow::Cow;

/// Hard upper bound on a single LDAP message.
///
/// A declared length beyond this is treated as framing corruption, not as a
/// request to buffer.
pub const MAX_MESSAGE_SIZE: usize = 8 * 1024 * 1024;

/// Determine the total length of the LDAP message starting at `input`.
///
/// Returns `Ok(None)` while not enough bytes are available to know, and
/// [`LdapError::InvalidFraming`] when the stream cannot contain a message at
/// all (wrong outer tag, indefinite length, oversized or overlong length).
/// Sessions use this to cut frames out of the inbound byte stream before any
/// real decoding happens.
pub fn ldap_message_frame_length(input: &[u8]) -> std::result::Result<Option<usize>, LdapError> {
    if input.is_empty() {
        return Ok(None);
    }
    // LDAPMessage is always a universal constructed SEQUENCE
    if input[0] != 0x30 {
        return Err(LdapError::InvalidFraming);
    }
    if input.len() < 2 {
        return Ok(None);
    }
    let first = input[1];
    if first == 0x80 {
        // indefinite length is forbidden by RFC4511 section 5.1
        return Err(LdapError::InvalidFraming);
    }
    if first < 0x80 {
        return Ok(Some(2 + first as usize));
    }
    let num_octets = (first & 0x7f) as usize;
    if num_octets > 4 {
        return Err(LdapError::InvalidFraming);
    }
    if input.len() < 2 + num_octets {
        return Ok(None);
    }
    let mut len = 0usize;
    for &b in &input[2..2 + num_octets] {
        len = (len << 8) | b as usize;
    }
    if len > MAX_MESSAGE_SIZE {
        return Err(LdapError::InvalidFraming);
    }
    Ok(Some(2 + num_octets + len))
}

// MessageID ::= INTEGER (0 ..  maxInt)
impl<'a> FromBer<'a, LdapError> for MessageID {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        map(u32::from_ber, MessageID)(bytes).map_err(Err::convert)
    }
}

// LDAPString ::= OCTET STRING -- UTF-8 encoded,
//                             -- [ISO10646] characters
impl<'a> FromBer<'a, LdapError> for LdapString<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        let (i, b) = parse_ldap_octet_string_as_slice(bytes)?;
        // convert to UTF-8
        let s = std::str::from_utf8(b).or(Err(Err::Error(LdapError::InvalidString)))?;
        Ok((i, LdapString(Cow::Borrowed(s))))
    }
}

#[inline]
pub(crate) fn parse_ldap_octet_string_as_slice(i: &[u8]) -> Result<'_, &[u8]> {
    <&[u8]>::from_ber(i).map_err(Err::convert)
}

#[inline]
fn parse_ldap_int_as_u32(i: &[u8]) -> Result<'_, u32> {
    <u32>::from_ber(i).map_err(Err::convert)
}

#[inline]
fn parse_ldap_enum_as_u32(i: &[u8]) -> Result<'_, u32> {
    let (i, obj) = Enumerated::from_ber(i).map_err(Err::convert)?;
    Ok((i, obj.0))
}

// LDAPDN ::= LDAPString -- Constrained to <distinguishedName> [RFC4514]
impl<'a> FromBer<'a, LdapError> for LdapDN<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        let (i, b) = <&[u8]>::from_ber(bytes).map_err(Err::convert)?;
        let s = std::str::from_utf8(b).or(Err(Err::Error(LdapError::InvalidDN)))?;
        Ok((i, LdapDN(Cow::Borrowed(s))))
    }
}

// RelativeLDAPDN ::= LDAPString -- Constrained to <name-component> [RFC4514]
impl<'a> FromBer<'a, LdapError> for RelativeLdapDN<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        let (i, b) = <&[u8]>::from_ber(bytes).map_err(Err::convert)?;
        let s = std::str::from_utf8(b).or(Err(Err::Error(LdapError::InvalidDN)))?;
        Ok((i, RelativeLdapDN(Cow::Borrowed(s))))
    }
}

// LDAPOID ::= OCTET STRING -- Constrained to <numericoid> [RFC4512]
impl<'a> FromBer<'a, LdapError> for LdapOID<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        let (i, b) = <&[u8]>::from_ber(bytes).map_err(Err::convert)?;
        let s = std::str::from_utf8(b).or(Err(Err::Error(LdapError::InvalidDN)))?;
        Ok((i, LdapOID(Cow::Borrowed(s))))
    }
}

// URI ::= LDAPString -- limited to characters permitted in URIs
#[inline]
fn parse_ldap_uri(i: &[u8]) -> Result<'_, LdapString<'_>> {
    LdapString::from_ber(i)
}

// LDAPResult ::= SEQUENCE {
//      resultCode         ENUMERATED { ... },
//      matchedDN          LDAPDN,
//      diagnosticMessage  LDAPString,
//      referral           [3] Referral OPTIONAL }
fn parse_ldap_result_content(i: &[u8]) -> Result<'_, LdapResult<'_>> {
    let (i, result_code) = map(parse_ldap_enum_as_u32, ResultCode)(i)?;
    let (i, matched_dn) = LdapDN::from_ber(i)?;
    let (i, diagnostic_message) = LdapString::from_ber(i)?;
    // TODO: referral
    let result = LdapResult {
        result_code,
        matched_dn,
        diagnostic_message,
    };
    Ok((i, result))
}

// LDAPMessage ::= SEQUENCE {
//      messageID       MessageID,
//      protocolOp      CHOICE { ... },
//      controls       [0] Controls OPTIONAL }
impl<'a> FromBer<'a, LdapError> for LdapMessage<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        Sequence::from_ber_and_then(bytes, |i| {
            let (i, message_id) = MessageID::from_ber(i)?;
            // read header of next element and look tag value
            let (_, header) = Header::from_ber(i).map_err(Err::convert)?;
            let (i, protocol_op) = match header.tag().0 {
                0 => map(BindRequest::from_ber, ProtocolOp::BindRequest)(i),
                1 => map(BindResponse::from_ber, ProtocolOp::BindResponse)(i),
                2 => parse_ldap_unbind_request(i),
                3 => map(SearchRequest::from_ber, ProtocolOp::SearchRequest)(i),
                4 => map(SearchResultEntry::from_ber, ProtocolOp::SearchResultEntry)(i),
                5 => map(parse_ldap_search_result_done, ProtocolOp::SearchResultDone)(i),
                6 => map(ModifyRequest::from_ber, ProtocolOp::ModifyRequest)(i),
                7 => map(parse_ldap_modify_response, ProtocolOp::ModifyResponse)(i),
                8 => map(AddRequest::from_ber, ProtocolOp::AddRequest)(i),
                9 => map(parse_ldap_add_response, ProtocolOp::AddResponse)(i),
                10 => map(parse_ldap_del_request, ProtocolOp::DelRequest)(i),
                11 => map(parse_ldap_del_response, ProtocolOp::DelResponse)(i),
                12 => map(ModDnRequest::from_ber, ProtocolOp::ModDnRequest)(i),
                13 => map(parse_ldap_moddn_response, ProtocolOp::ModDnResponse)(i),
                14 => map(CompareRequest::from_ber, ProtocolOp::CompareRequest)(i),
                15 => map(parse_ldap_compare_response, ProtocolOp::CompareResponse)(i),
                16 => map(parse_ldap_abandon_request, ProtocolOp::AbandonRequest)(i),
                19 => map(
                    parse_ldap_search_result_ref,
                    ProtocolOp::SearchResultReference,
                )(i),
                23 => map(ExtendedRequest::from_ber, ProtocolOp::ExtendedRequest)(i),
                24 => map(ExtendedResponse::from_ber, ProtocolOp::ExtendedResponse)(i),
                25 => map(
                    IntermediateResponse::from_ber,
                    ProtocolOp::IntermediateResponse,
                )(i),
                _ => Err(Err::Error(LdapError::InvalidMessageType)),
            }?;
            let (i, controls) = OptTaggedParser::new(Class::ContextSpecific, Tag(0))
                .parse_ber(i, |_, i| many0(complete(Control::from_ber))(i))?;
            let msg = LdapMessage {
                message_id,
                protocol_op,
                controls,
            };
            Ok((i, msg))
        })
    }
}

// Shallow decoding: identify messageID and the protocolOp tag only, keeping
// the raw message bytes for the second, full decoding phase.
impl<'a> FromBer<'a, LdapError> for ShallowLdapMessage<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        let (after_header, header) = Header::from_ber(bytes).map_err(Err::convert)?;
        if header.tag() != Tag::Sequence || !header.constructed() {
            return Err(Err::Error(LdapError::InvalidFraming));
        }
        let content_len = header
            .length()
            .definite()
            .map_err(|_| Err::Error(LdapError::InvalidFraming))?;
        if after_header.len() < content_len {
            return Err(Err::Incomplete(Needed::new(content_len - after_header.len())));
        }
        let header_len = bytes.len() - after_header.len();
        let message = &bytes[..header_len + content_len];
        let rem = &bytes[header_len + content_len..];
        let content = &after_header[..content_len];
        let (content, message_id) = MessageID::from_ber(content)?;
        let (_, op_header) = Header::from_ber(content).map_err(Err::convert)?;
        if op_header.class() != Class::Application {
            return Err(Err::Error(LdapError::InvalidMessageType));
        }
        let msg = ShallowLdapMessage {
            message_id,
            op_tag: ProtocolOpTag(op_header.tag().0),
            message,
        };
        Ok((rem, msg))
    }
}

/// Parse a list of LDAP messages and return structures borrowing fields from the input buffer
// Note: we don't use the trait because Vec<_>::from_ber forces the Error type
pub fn parse_ldap_messages(i: &[u8]) -> Result<'_, Vec<LdapMessage<'_>>> {
    many1(complete(LdapMessage::from_ber))(i)
}

// BindRequest ::= [APPLICATION 0] SEQUENCE {
//      version                 INTEGER (1 ..  127),
//      name                    LDAPDN,
//      authentication          AuthenticationChoice }
impl<'a> FromBer<'a, LdapError> for BindRequest<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 0, bytes, |i| {
            let (i, version) = verify(u8::from_ber, |&n| n < 128)(i).map_err(Err::convert)?;
            let (i, name) = LdapDN::from_ber(i)?;
            let (i, authentication) = AuthenticationChoice::from_ber(i)?;
            let req = BindRequest {
                version,
                name,
                authentication,
            };
            Ok((i, req))
        })
    }
}

// BindResponse ::= [APPLICATION 1] SEQUENCE {
//      COMPONENTS OF LDAPResult,
//      serverSaslCreds    [7] OCTET STRING OPTIONAL }
impl<'a> FromBer<'a, LdapError> for BindResponse<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 1, bytes, |i| {
            let (i, result) = parse_ldap_result_content(i)?;
            let (i, server_sasl_creds) = OptTaggedParser::new(Class::ContextSpecific, Tag(7))
                .parse_ber(i, |_, data| Ok((&b""[..], Cow::Borrowed(data))))?;
            let req = BindResponse {
                result,
                server_sasl_creds,
            };
            Ok((i, req))
        })
    }
}

// UnbindRequest ::= [APPLICATION 2] NULL
fn parse_ldap_unbind_request(bytes: &[u8]) -> Result<'_, ProtocolOp<'_>> {
    TaggedParser::from_ber_and_then(Class::Application, 2, bytes, |i| {
        // accept empty input, otherwise expect NULL
        if !i.is_empty() {
            let (_, _) = <()>::from_ber(i).map_err(Err::convert)?;
        }
        Ok((i, ProtocolOp::UnbindRequest))
    })
}

// SearchRequest ::= [APPLICATION 3] SEQUENCE {
//      baseObject      LDAPDN,
//      scope           ENUMERATED { baseObject (0), singleLevel (1), wholeSubtree (2), ... },
//      derefAliases    ENUMERATED { ... },
//      sizeLimit       INTEGER (0 ..  maxInt),
//      timeLimit       INTEGER (0 ..  maxInt),
//      typesOnly       BOOLEAN,
//      filter          Filter,
//      attributes      AttributeSelection }
impl<'a> FromBer<'a, LdapError> for SearchRequest<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 3, bytes, |i| {
            let (i, base_object) = LdapDN::from_ber(i)?;
            // unknown enumerated values are a protocol error
            let (i, scope) = map(verify(parse_ldap_enum_as_u32, |&v| v <= 2), SearchScope)(i)?;
            let (i, deref_aliases) =
                map(verify(parse_ldap_enum_as_u32, |&v| v <= 3), DerefAliases)(i)?;
            let (i, size_limit) = parse_ldap_int_as_u32(i)?;
            let (i, time_limit) = parse_ldap_int_as_u32(i)?;
            let (i, types_only) = <bool>::from_ber(i).map_err(Err::convert)?;
            let (i, filter) = Filter::from_ber(i)?;
            let (i, attributes) = parse_attribute_selection(i)?;
            let req = SearchRequest {
                base_object,
                scope,
                deref_aliases,
                size_limit,
                time_limit,
                types_only,
                filter,
                attributes,
            };
            Ok((i, req))
        })
    }
}

// SearchResultEntry ::= [APPLICATION 4] SEQUENCE {
//     objectName      LDAPDN,
//     attributes      PartialAttributeList }
impl<'a> FromBer<'a, LdapError> for SearchResultEntry<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 4, bytes, |i| {
            let (i, object_name) = LdapDN::from_ber(i)?;
            let (i, attributes) = parse_partial_attribute_list(i)?;
            let res = SearchResultEntry {
                object_name,
                attributes,
            };
            Ok((i, res))
        })
    }
}

// SearchResultDone ::= [APPLICATION 5] LDAPResult
fn parse_ldap_search_result_done(bytes: &[u8]) -> Result<'_, LdapResult<'_>> {
    TaggedParser::from_ber_and_then(Class::Application, 5, bytes, parse_ldap_result_content)
}

// ModifyRequest ::= [APPLICATION 6] SEQUENCE {
//     object          LDAPDN,
//     changes         SEQUENCE OF change SEQUENCE {
//          operation       ENUMERATED { add (0), delete (1), replace (2), ... },
//          modification    PartialAttribute } }
impl<'a> FromBer<'a, LdapError> for ModifyRequest<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 6, bytes, |i| {
            let (i, object) = LdapDN::from_ber(i)?;
            let (i, changes) = Sequence::from_ber_and_then(i, many1(complete(Change::from_ber)))?;
            let res = ModifyRequest { object, changes };
            Ok((i, res))
        })
    }
}

// ModifyResponse ::= [APPLICATION 7] LDAPResult
fn parse_ldap_modify_response(bytes: &[u8]) -> Result<'_, ModifyResponse<'_>> {
    TaggedParser::from_ber_and_then(Class::Application, 7, bytes, |i| {
        let (i, result) = parse_ldap_result_content(i)?;
        let res = ModifyResponse { result };
        Ok((i, res))
    })
}

// AddRequest ::= [APPLICATION 8] SEQUENCE {
//     entry           LDAPDN,
//     attributes      AttributeList }
impl<'a> FromBer<'a, LdapError> for AddRequest<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 8, bytes, |i| {
            let (i, entry) = LdapDN::from_ber(i)?;
            let (i, attributes) = parse_attribute_list(i)?;
            let res = AddRequest { entry, attributes };
            Ok((i, res))
        })
    }
}

// AddResponse ::= [APPLICATION 9] LDAPResult
fn parse_ldap_add_response(bytes: &[u8]) -> Result<'_, LdapResult<'_>> {
    TaggedParser::from_ber_and_then(Class::Application, 9, bytes, parse_ldap_result_content)
}

// DelRequest ::= [APPLICATION 10] LDAPDN
fn parse_ldap_del_request(bytes: &[u8]) -> Result<'_, LdapDN<'_>> {
    TaggedParser::from_ber_and_then(Class::Application, 10, bytes, |i| {
        let s = std::str::from_utf8(i).or(Err(Err::Error(LdapError::InvalidDN)))?;
        let dn = LdapDN(Cow::Borrowed(s));
        Ok((&b""[..], dn))
    })
}

// DelResponse ::= [APPLICATION 11] LDAPResult
fn parse_ldap_del_response(bytes: &[u8]) -> Result<'_, LdapResult<'_>> {
    TaggedParser::from_ber_and_then(Class::Application, 11, bytes, parse_ldap_result_content)
}

// ModifyDNRequest ::= [APPLICATION 12] SEQUENCE {
//     entry           LDAPDN,
//     newrdn          RelativeLDAPDN,
//     deleteoldrdn    BOOLEAN,
//     newSuperior     [0] LDAPDN OPTIONAL }
impl<'a> FromBer<'a, LdapError> for ModDnRequest<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 12, bytes, |i| {
            let (i, entry) = LdapDN::from_ber(i)?;
            let (i, newrdn) = RelativeLdapDN::from_ber(i)?;
            let (i, deleteoldrdn) = <bool>::from_ber(i).map_err(Err::convert)?;
            let (i, newsuperior) =
                OptTaggedParser::new(Class::ContextSpecific, Tag(0)).parse_ber(i, |_, i| {
                    let s = std::str::from_utf8(i).or(Err(Err::Error(LdapError::InvalidDN)))?;
                    let dn = LdapDN(Cow::Borrowed(s));
                    Ok((&b""[..], dn))
                })?;
            let res = ModDnRequest {
                entry,
                newrdn,
                deleteoldrdn,
                newsuperior,
            };
            Ok((i, res))
        })
    }
}

// ModifyDNResponse ::= [APPLICATION 13] LDAPResult
fn parse_ldap_moddn_response(bytes: &[u8]) -> Result<'_, LdapResult<'_>> {
    TaggedParser::from_ber_and_then(Class::Application, 13, bytes, parse_ldap_result_content)
}

// CompareRequest ::= [APPLICATION 14] SEQUENCE {
//     entry           LDAPDN,
//     ava             AttributeValueAssertion }
impl<'a> FromBer<'a, LdapError> for CompareRequest<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 14, bytes, |i| {
            let (i, entry) = LdapDN::from_ber(i)?;
            let (i, ava) = AttributeValueAssertion::from_ber(i)?;
            let res = CompareRequest { entry, ava };
            Ok((i, res))
        })
    }
}

// CompareResponse ::= [APPLICATION 15] LDAPResult
fn parse_ldap_compare_response(bytes: &[u8]) -> Result<'_, LdapResult<'_>> {
    TaggedParser::from_ber_and_then(Class::Application, 15, bytes, parse_ldap_result_content)
}

// AbandonRequest ::= [APPLICATION 16] MessageID
fn parse_ldap_abandon_request(bytes: &[u8]) -> Result<'_, MessageID> {
    let (rem, id) = TaggedValue::<u32, _, Implicit, { Class::APPLICATION }, 16>::from_ber(bytes)
        .map_err(Err::convert)?;
    Ok((rem, MessageID(id.into_inner())))
}

// SearchResultReference ::= [APPLICATION 19] SEQUENCE
//                                   SIZE (1..MAX) OF uri URI
fn parse_ldap_search_result_ref(bytes: &[u8]) -> Result<'_, Vec<LdapString<'_>>> {
    TaggedParser::from_ber_and_then(
        Class::Application,
        19,
        bytes,
        many1(complete(parse_ldap_uri)),
    )
}

// ExtendedRequest ::= [APPLICATION 23] SEQUENCE {
//     requestName      [0] LDAPOID,
//     requestValue     [1] OCTET STRING OPTIONAL }
impl<'a> FromBer<'a, LdapError> for ExtendedRequest<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 23, bytes, |i| {
            let (i, request_name) =
                TaggedParser::from_ber_and_then(Class::ContextSpecific, 0, i, |i| {
                    let s = std::str::from_utf8(i).or(Err(Err::Error(LdapError::InvalidDN)))?;
                    let oid = LdapOID(Cow::Borrowed(s));
                    Ok((&b""[..], oid))
                })?;
            let (i, request_value) = OptTaggedParser::new(Class::ContextSpecific, Tag(1))
                .parse_ber(i, |_, data| Ok((&b""[..], Cow::Borrowed(data))))?;
            let req = ExtendedRequest {
                request_name,
                request_value,
            };
            Ok((i, req))
        })
    }
}

// ExtendedResponse ::= [APPLICATION 24] SEQUENCE {
//     COMPONENTS OF LDAPResult,
//     responseName     [10] LDAPOID OPTIONAL,
//     responseValue    [11] OCTET STRING OPTIONAL }
impl<'a> FromBer<'a, LdapError> for ExtendedResponse<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 24, bytes, |i| {
            let (i, result) = parse_ldap_result_content(i)?;
            let (i, response_name) = OptTaggedParser::new(Class::ContextSpecific, Tag(10))
                .parse_ber(i, |_, i| {
                    let s = std::str::from_utf8(i).or(Err(Err::Error(LdapError::InvalidDN)))?;
                    let oid = LdapOID(Cow::Borrowed(s));
                    Ok((&b""[..], oid))
                })?;
            let (i, response_value) = OptTaggedParser::new(Class::ContextSpecific, Tag(11))
                .parse_ber(i, |_, data| Ok((&b""[..], Cow::Borrowed(data))))?;
            let resp = ExtendedResponse {
                result,
                response_name,
                response_value,
            };
            Ok((i, resp))
        })
    }
}

// IntermediateResponse ::= [APPLICATION 25] SEQUENCE {
//      responseName     [0] LDAPOID OPTIONAL,
//      responseValue    [1] OCTET STRING OPTIONAL }
impl<'a> FromBer<'a, LdapError> for IntermediateResponse<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        TaggedParser::from_ber_and_then(Class::Application, 25, bytes, |i| {
            let (i, response_name) = OptTaggedParser::new(Class::ContextSpecific, Tag(0))
                .parse_ber(i, |_, i| {
                    let s = std::str::from_utf8(i).or(Err(Err::Error(LdapError::InvalidDN)))?;
                    let oid = LdapOID(Cow::Borrowed(s));
                    Ok((&b""[..], oid))
                })?;
            let (i, response_value) = OptTaggedParser::new(Class::ContextSpecific, Tag(1))
                .parse_ber(i, |_, data| Ok((&b""[..], Cow::Borrowed(data))))?;
            let resp = IntermediateResponse {
                response_name,
                response_value,
            };
            Ok((i, resp))
        })
    }
}

// AuthenticationChoice ::= CHOICE {
//      simple                  [0] OCTET STRING,
//                              -- 1 and 2 reserved
//      sasl                    [3] SaslCredentials,
//      ...  }
impl<'a> FromBer<'a, LdapError> for AuthenticationChoice<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        let (rem, header) = Header::from_ber(bytes).map_err(Err::convert)?;
        match header.tag().0 {
            0 => {
                // assume len is primitive, and just take bytes
                let sz = header
                    .length()
                    .definite()
                    .map_err(|e| Err::Error(LdapError::Ber(e)))?;
                let (i, b) = take(sz)(rem)?;
                Ok((i, AuthenticationChoice::Simple(Cow::Borrowed(b))))
            }
            3 => map(parse_sasl_credentials, AuthenticationChoice::Sasl)(rem),
            _ => Err(Err::Error(LdapError::InvalidAuthenticationType)),
        }
    }
}

// SaslCredentials ::= SEQUENCE {
//      mechanism               LDAPString,
//      credentials             OCTET STRING OPTIONAL }
fn parse_sasl_credentials(i: &[u8]) -> Result<'_, SaslCredentials<'_>> {
    let (i, mechanism) = LdapString::from_ber(i)?;
    let (i, credentials) = opt(complete(map(
        parse_ldap_octet_string_as_slice,
        Cow::Borrowed,
    )))(i)?;
    let credentials = SaslCredentials {
        mechanism,
        credentials,
    };
    Ok((i, credentials))
}

// AttributeSelection ::= SEQUENCE OF selector LDAPString
//      -- The LDAPString is constrained to
//      -- <attributeSelector> in Section 4.5.1.8
fn parse_attribute_selection(bytes: &[u8]) -> Result<'_, Vec<LdapString<'_>>> {
    Sequence::from_ber_and_then(bytes, many0(complete(LdapString::from_ber)))
}

// PartialAttributeList ::= SEQUENCE OF partialAttribute PartialAttribute
fn parse_partial_attribute_list(bytes: &[u8]) -> Result<'_, Vec<PartialAttribute<'_>>> {
    Sequence::from_ber_and_then(bytes, many0(complete(PartialAttribute::from_ber)))
}

// AttributeList ::= SEQUENCE OF attribute Attribute
fn parse_attribute_list(bytes: &[u8]) -> Result<'_, Vec<Attribute<'_>>> {
    Sequence::from_ber_and_then(bytes, many0(complete(Attribute::from_ber)))
}

// change SEQUENCE {
//          operation       ENUMERATED { add (0), delete (1), replace (2), ... },
//          modification    PartialAttribute }
impl<'a> FromBer<'a, LdapError> for Change<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        Sequence::from_ber_and_then(bytes, |i| {
            let (i, operation) = map(parse_ldap_enum_as_u32, Operation)(i)?;
            let (i, modification) = PartialAttribute::from_ber(i)?;
            let change = Change {
                operation,
                modification,
            };
            Ok((i, change))
        })
    }
}

// Control ::= SEQUENCE {
//     controlType             LDAPOID,
//     criticality             BOOLEAN DEFAULT FALSE,
//     controlValue            OCTET STRING OPTIONAL }
impl<'a> FromBer<'a, LdapError> for Control<'a> {
    fn from_ber(bytes: &'a [u8]) -> ParseResult<'a, Self, LdapError> {
        Sequence::from_ber_and_then(bytes, |i| {
            let (i, control_type) = LdapOID::from_ber(i)?;
            let (i, maybe_critical) = <Option<bool>>::from_ber(i).map_err(Err::convert)?;
            let criticality = maybe_critical.unwrap_or(false);
            let (i, control_value) = opt(complete(map(
                parse_ldap_octet_string_as_slice,
                Cow::Borrowed,
            )))(i)?;
            let control = Control {
                control_type,
                criticality,
                control_value,
            };
            Ok((i, control))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // BindRequest for cn=service,ou=system,dc=example,dc=com / "foobar"
    const BIND_SIMPLE: &[u8] =
        b"08\x02\x01\x1e\x603\x02\x01\x03\x04&cn=service,ou=system,dc=example,dc=com\x80\x06foobar";

    // SearchRequest base "" baseObject (objectClass=*) attrs subschemaSubentry,+
    const SEARCH_ROOTDSE: &[u8] =
        b"0;\x02\x01\x1fc6\x04\x00\n\x01\x00\n\x01\x03\x02\x01\x00\x02\x01\x00\x01\x01\x00\x87\x0bobjectClass0\x16\x04\x11subschemaSubentry\x04\x01+";

    // SearchRequest with an AND filter over equality assertions
    const SEARCH_AND_FILTER: &[u8] =
        b"0c\x02\x01\x02c^\x04\x00\n\x01\x02\n\x01\x00\x02\x01\x00\x02\x01\x00\x01\x01\x00\xa0I\xa3\x15\x04\x0bobjectClass\x04\x06person\xa30\x04\x08memberof\x04$cn=users,ou=groups,dc=example,dc=com0\x00";

    // SearchRequest with a critical ManageDsaIT control attached
    const SEARCH_CRITICAL_CONTROL: &[u8] =
        b"0E\x02\x01\x02c \x04\x00\n\x01\x02\n\x01\x00\x02\x01\x00\x02\x01\x00\x01\x01\x00\x87\x0bobjectClass0\x00\xa0\x1e0\x1c\x04\x172.16.840.1.113730.3.4.2\x01\x01\xff";

    const UNBIND: &[u8] = b"0\x05\x02\x01\x22B\x00";

    const SASL_PLAIN_BIND: &[u8] =
        b"0+\x02\x01\x02`&\x02\x01\x03\x04\x00\xa3\x1f\x04\x05PLAIN\x04\x16service\x00service\x00foobar";

    #[test]
    fn test_frame_length() {
        assert_eq!(ldap_message_frame_length(b""), Ok(None));
        assert_eq!(ldap_message_frame_length(b"0"), Ok(None));
        assert_eq!(ldap_message_frame_length(UNBIND), Ok(Some(7)));
        assert_eq!(ldap_message_frame_length(BIND_SIMPLE), Ok(Some(58)));
        // long-form length
        assert_eq!(
            ldap_message_frame_length(&[0x30, 0x81, 0x80]),
            Ok(Some(3 + 0x80))
        );
        assert_eq!(
            ldap_message_frame_length(&[0x30, 0x82, 0x01]),
            Ok(None)
        );
        // not a SEQUENCE
        assert_eq!(
            ldap_message_frame_length(&[0x00, 0xff]),
            Err(LdapError::InvalidFraming)
        );
        // indefinite length
        assert_eq!(
            ldap_message_frame_length(&[0x30, 0x80, 0x00]),
            Err(LdapError::InvalidFraming)
        );
    }

    #[test]
    fn test_parse_bind_request_simple() {
        let (rem, msg) = LdapMessage::from_ber(BIND_SIMPLE).expect("parsing failed");
        assert!(rem.is_empty());
        assert_eq!(msg.message_id, MessageID(30));
        match msg.protocol_op {
            ProtocolOp::BindRequest(req) => {
                assert_eq!(req.version, 3);
                assert_eq!(&req.name.0, "cn=service,ou=system,dc=example,dc=com");
                assert_eq!(
                    req.authentication,
                    AuthenticationChoice::Simple(Cow::Borrowed(b"foobar"))
                );
            }
            op => panic!("unexpected op {:?}", op.tag()),
        }
    }

    #[test]
    fn test_parse_bind_request_sasl_plain() {
        let (rem, msg) = LdapMessage::from_ber(SASL_PLAIN_BIND).expect("parsing failed");
        assert!(rem.is_empty());
        match msg.protocol_op {
            ProtocolOp::BindRequest(req) => {
                assert_eq!(&req.name.0, "");
                match req.authentication {
                    AuthenticationChoice::Sasl(creds) => {
                        assert_eq!(&creds.mechanism.0, "PLAIN");
                        assert_eq!(
                            creds.credentials.as_deref(),
                            Some(&b"service\x00service\x00foobar"[..])
                        );
                    }
                    _ => panic!("wrong authentication type"),
                }
            }
            op => panic!("unexpected op {:?}", op.tag()),
        }
    }

    #[test]
    fn test_parse_search_request() {
        let (rem, msg) = LdapMessage::from_ber(SEARCH_ROOTDSE).expect("parsing failed");
        assert!(rem.is_empty());
        assert_eq!(msg.message_id, MessageID(31));
        match msg.protocol_op {
            ProtocolOp::SearchRequest(req) => {
                assert_eq!(&req.base_object.0, "");
                assert_eq!(req.scope, SearchScope::BaseObject);
                assert!(!req.types_only);
                assert!(matches!(req.filter, Filter::Present(_)));
                assert_eq!(req.attributes.len(), 2);
                assert_eq!(&req.attributes[0].0, "subschemaSubentry");
                assert_eq!(&req.attributes[1].0, "+");
            }
            op => panic!("unexpected op {:?}", op.tag()),
        }
    }

    #[test]
    fn test_parse_search_request_and_filter() {
        let (rem, msg) = LdapMessage::from_ber(SEARCH_AND_FILTER).expect("parsing failed");
        assert!(rem.is_empty());
        match msg.protocol_op {
            ProtocolOp::SearchRequest(req) => {
                assert_eq!(req.scope, SearchScope::WholeSubtree);
                match req.filter {
                    Filter::And(sub) => {
                        assert_eq!(sub.len(), 2);
                        match &sub[0] {
                            Filter::EqualityMatch(ava) => {
                                assert_eq!(&ava.attribute_desc.0, "objectClass");
                                assert_eq!(ava.assertion_value.as_ref(), b"person");
                            }
                            f => panic!("unexpected filter {:?}", f),
                        }
                    }
                    f => panic!("unexpected filter {:?}", f),
                }
            }
            op => panic!("unexpected op {:?}", op.tag()),
        }
    }

    #[test]
    fn test_parse_critical_control() {
        let (rem, msg) = LdapMessage::from_ber(SEARCH_CRITICAL_CONTROL).expect("parsing failed");
        assert!(rem.is_empty());
        let controls = msg.controls.expect("controls missing");
        assert_eq!(controls.len(), 1);
        assert_eq!(&controls[0].control_type.0, "2.16.840.1.113730.3.4.2");
        assert!(controls[0].criticality);
    }

    #[test]
    fn test_parse_unbind() {
        let (rem, msg) = LdapMessage::from_ber(UNBIND).expect("parsing failed");
        assert!(rem.is_empty());
        assert_eq!(msg.message_id, MessageID(34));
        assert_eq!(msg.protocol_op, ProtocolOp::UnbindRequest);
    }

    #[test]
    fn test_parse_abandon() {
        const DATA: &[u8] = &[0x30, 0x06, 0x02, 0x01, 0x06, 0x50, 0x01, 0x05];
        let (rem, msg) = LdapMessage::from_ber(DATA).expect("parsing failed");
        assert!(rem.is_empty());
        assert_eq!(msg.message_id, MessageID(6));
        assert!(matches!(
            msg.protocol_op,
            ProtocolOp::AbandonRequest(MessageID(5))
        ))
    }

    #[test]
    fn test_shallow_parse() {
        let (rem, shallow) = ShallowLdapMessage::from_ber(BIND_SIMPLE).expect("parsing failed");
        assert!(rem.is_empty());
        assert_eq!(shallow.message_id, MessageID(30));
        assert_eq!(shallow.op_tag, ProtocolOpTag::BindRequest);
        assert_eq!(shallow.message, BIND_SIMPLE);
        let (_, full) = shallow.parse().expect("full parse failed");
        assert!(matches!(full.protocol_op, ProtocolOp::BindRequest(_)));
    }

    #[test]
    fn test_shallow_parse_reports_id_for_malformed_op() {
        // corrupt a byte inside the search request payload: the shallow phase
        // still identifies message id and op tag, the full parse fails
        let mut corrupted = SEARCH_ROOTDSE.to_vec();
        corrupted[7] = 0xab;
        let (_, shallow) = ShallowLdapMessage::from_ber(&corrupted).expect("parsing failed");
        assert_eq!(shallow.message_id, MessageID(31));
        assert_eq!(shallow.op_tag, ProtocolOpTag::SearchRequest);
        assert!(shallow.parse().is_err());
    }

    #[test]
    fn test_parse_two_concatenated_messages() {
        let mut stream = Vec::new();
        stream.extend_from_slice(SEARCH_ROOTDSE);
        stream.extend_from_slice(UNBIND);
        let (rem, msgs) = parse_ldap_messages(&stream).expect("parsing failed");
        assert!(rem.is_empty());
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].protocol_op.tag(), ProtocolOpTag::SearchRequest);
        assert_eq!(msgs[1].protocol_op.tag(), ProtocolOpTag::UnbindRequest);
    }
}
