//! End-to-end session tests over a mock byte stream: framing independence
//! from read chunking, the bind-then-search flow, and connection teardown on
//! unrecoverable corruption.

use std::io::{Read, Write};
use std::sync::Arc;

use ldap_server::error::OperationError;
use ldap_server::ldap::{LdapMessage, MessageID, ProtocolOp, ResultCode, SearchRequest};
use ldap_server::parser::parse_ldap_messages;
use ldap_server::schema::{rfc4519, Schema};
use ldap_server::serializer::ToBer;
use ldap_server::session::{LdapSession, RequestHandler};

struct MockStream {
    input: Vec<u8>,
    position: usize,
    chunk_size: usize,
    output: Vec<u8>,
}

impl MockStream {
    fn new(input: &[u8], chunk_size: usize) -> Self {
        MockStream {
            input: input.to_vec(),
            position: 0,
            chunk_size,
            output: Vec::new(),
        }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let remaining = self.input.len() - self.position;
        let n = remaining.min(self.chunk_size).min(buf.len());
        buf[..n].copy_from_slice(&self.input[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

struct StaticHandler;

impl RequestHandler for StaticHandler {
    fn schema(&self) -> Arc<Schema> {
        rfc4519()
    }

    fn do_bind_simple_authenticated(
        &mut self,
        dn: &str,
        password: &[u8],
    ) -> Result<bool, OperationError> {
        Ok(dn == "cn=service,ou=system,dc=example,dc=com" && password == b"foobar")
    }
}

fn search_message(id: u32) -> Vec<u8> {
    LdapMessage::response(
        MessageID(id),
        ProtocolOp::SearchRequest(SearchRequest::base_object("")),
    )
    .to_ber()
}

fn run(input: &[u8], chunk_size: usize) -> std::io::Result<Vec<u8>> {
    let mut session = LdapSession::new(StaticHandler).unwrap();
    let mut stream = MockStream::new(input, chunk_size);
    session.handle(&mut stream)?;
    Ok(stream.output)
}

#[test]
fn test_chunked_reads_produce_identical_output() {
    let mut request = search_message(1);
    let message_len = request.len();
    request.extend_from_slice(&search_message(2));

    let reference = run(&request, 4096).unwrap();
    assert!(!reference.is_empty());
    for chunk_size in [1, 15, message_len] {
        let output = run(&request, chunk_size).unwrap();
        assert_eq!(output, reference, "chunk size {}", chunk_size);
    }

    // entry + done per request, in order, tagged with the request ids
    let (rem, messages) = parse_ldap_messages(&reference).expect("responses unparsable");
    assert!(rem.is_empty());
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0].message_id, MessageID(1));
    assert!(matches!(messages[0].protocol_op, ProtocolOp::SearchResultEntry(_)));
    assert_eq!(messages[1].message_id, MessageID(1));
    assert_eq!(
        messages[1].protocol_op.result().map(|r| r.result_code),
        Some(ResultCode::Success)
    );
    assert_eq!(messages[2].message_id, MessageID(2));
    assert!(matches!(messages[2].protocol_op, ProtocolOp::SearchResultEntry(_)));
    assert_eq!(
        messages[3].protocol_op.result().map(|r| r.result_code),
        Some(ResultCode::Success)
    );
}

#[test]
fn test_no_data_produces_no_output() {
    let output = run(b"", 4096).unwrap();
    assert!(output.is_empty());
}

#[test]
fn test_incomplete_trailing_message_is_dropped() {
    let mut request = search_message(1);
    let mut truncated = search_message(2);
    truncated.pop();
    request.extend_from_slice(&truncated);

    let reference = run(&search_message(1), 4096).unwrap();
    let output = run(&request, 4096).unwrap();
    assert_eq!(output, reference);
}

#[test]
fn test_unrecoverable_corruption_aborts() {
    assert!(run(b"\x00\xff", 4096).is_err());
}

#[test]
fn test_bind_then_search_subschema_pointer() {
    // bind, then fetch subschemaSubentry off the root DSE
    let mut input =
        b"08\x02\x01\x1e\x603\x02\x01\x03\x04&cn=service,ou=system,dc=example,dc=com\x80\x06foobar"
            .to_vec();
    let search = LdapMessage::response(MessageID(31), {
        let mut request = SearchRequest::base_object("");
        request.attributes = vec![ldap_server::ldap::LdapString(std::borrow::Cow::Borrowed(
            "subschemaSubentry",
        ))];
        ProtocolOp::SearchRequest(request)
    })
    .to_ber();
    input.extend_from_slice(&search);
    input.extend_from_slice(&LdapMessage::response(MessageID(32), ProtocolOp::UnbindRequest).to_ber());

    let output = run(&input, 4096).unwrap();
    let (rem, messages) = parse_ldap_messages(&output).expect("responses unparsable");
    assert!(rem.is_empty());
    assert_eq!(messages.len(), 3);
    assert_eq!(
        messages[0].protocol_op.result().map(|r| r.result_code),
        Some(ResultCode::Success)
    );
    match &messages[1].protocol_op {
        ProtocolOp::SearchResultEntry(entry) => {
            assert_eq!(&entry.object_name.0, "");
            assert_eq!(entry.attributes.len(), 1);
            assert_eq!(&entry.attributes[0].attr_type.0, "subschemaSubentry");
            assert_eq!(entry.attributes[0].attr_vals[0].0.as_ref(), b"cn=Subschema");
        }
        op => panic!("unexpected op {:?}", op.tag()),
    }
    assert_eq!(
        messages[2].protocol_op.result().map(|r| r.result_code),
        Some(ResultCode::Success)
    );
}

#[test]
fn test_shallow_two_phase_error_reporting() {
    // corrupt the inner payload of a framed search request: the session must
    // answer protocolError on the same message id instead of disconnecting
    let mut request = search_message(7);
    request[7] = 0xab;
    let output = run(&request, 4096).unwrap();
    let (_, messages) = parse_ldap_messages(&output).expect("responses unparsable");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].message_id, MessageID(7));
    assert_eq!(
        messages[0].protocol_op.result().map(|r| r.result_code),
        Some(ResultCode::ProtocolError)
    );
}
