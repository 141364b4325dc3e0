use ldap_server::ldap::{LdapMessage, MessageID, ProtocolOp, SearchScope};
use ldap_server::serializer::ToBer;
use ldap_server::FromBer;

#[test]
fn test_malformed_empty() {
    const DATA: &[u8] = &[0x30, 0x00];

    LdapMessage::from_ber(DATA).expect_err("expected error");
}

#[test]
fn test_parse_msg_search_request() {
    // SearchRequest captured from an ldapsearch run against the subschema
    const DATA: &[u8] = b"0\x81\xe4\x02\x01 c\x81\xde\x04\x0ccn=Subschema\n\x01\x00\n\x01\x03\x02\x01\x00\x02\x01\x00\x01\x01\x00\xa3\x18\x04\x0bobjectClass\x04\tsubschema0\x81\xa4\x04\robjectClasses\x04\x0eattributeTypes\x04\x0cldapSyntaxes\x04\rmatchingRules\x04\x0fmatchingRuleUse\x04\x0fdITContentRules\x04\x11dITStructureRules\x04\tnameForms\x04\x0fcreateTimestamp\x04\x0fmodifyTimestamp\x04\x01*\x04\x01+";
    let (rem, msg) = LdapMessage::from_ber(DATA).expect("parsing failed");
    assert!(rem.is_empty());
    assert_eq!(msg.message_id, MessageID(32));
    if let ProtocolOp::SearchRequest(req) = msg.protocol_op {
        assert_eq!(&req.base_object.0, "cn=Subschema");
        assert_eq!(req.scope, SearchScope::BaseObject);
        assert_eq!(req.attributes.len(), 12);
    } else {
        panic!("unexpected operation");
    }
}

#[test]
fn test_reencode_parsed_message() {
    const DATA: &[u8] =
        b"08\x02\x01\x1e\x603\x02\x01\x03\x04&cn=service,ou=system,dc=example,dc=com\x80\x06foobar";
    let (rem, msg) = LdapMessage::from_ber(DATA).expect("parsing failed");
    assert!(rem.is_empty());
    assert_eq!(msg.to_ber(), DATA);
}
