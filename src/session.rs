//! Per-connection session handling
//!
//! A [`LdapSession`] drives one connection: it cuts BER frames out of the
//! inbound byte stream, decodes them in two phases (shallow, then full),
//! dispatches on the protocol op and writes back the responses. Applications
//! plug in through [`RequestHandler`]; the session itself contributes the
//! RootDSE and the subschema subentry to every search.
//!
//! Recoverable decode failures answer `protocolError` on the offending
//! `messageID`; framing corruption that prevents reading any `messageID`
//! terminates the connection.

use std::collections::HashSet;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;

use asn1_rs::FromBer;
use log::{debug, warn};

use crate::entries::{DirectoryEntry, RootDse, SubschemaSubentry};
use crate::error::OperationError;
use crate::filter::Filter;
use crate::ldap::{
    AddRequest, AuthenticationChoice, BindRequest, BindResponse, CompareRequest,
    ExtendedRequest, ExtendedResponse, LdapMessage, LdapResult, MessageID, ModDnRequest,
    ModifyRequest, ProtocolOp, ProtocolOpTag, ResultCode, SearchRequest, SearchScope,
    ShallowLdapMessage,
};
use crate::parser::ldap_message_frame_length;
use crate::schema::{Schema, Value};
use crate::serializer::ToBer;

/// Application callbacks for authentication, search and the write operations.
///
/// Every method has a default: anonymous binds succeed, authenticated binds
/// are rejected, searches yield no additional entries, and write operations
/// answer `insufficientAccessRights`.
pub trait RequestHandler {
    /// The schema served by this handler (shared, immutable).
    fn schema(&self) -> Arc<Schema>;

    /// DN of the subschema subentry the session publishes.
    fn subschema_dn(&self) -> &str {
        "cn=Subschema"
    }

    /// Advertise and accept SASL PLAIN binds.
    fn supports_sasl_plain(&self) -> bool {
        false
    }

    /// OIDs of controls the handler understands; anything critical outside
    /// this list answers `unavailableCriticalExtension`.
    fn supported_controls(&self) -> Vec<String> {
        Vec::new()
    }

    fn do_bind_anonymous(&mut self) -> Result<bool, OperationError> {
        Ok(true)
    }

    fn do_bind_unauthenticated(&mut self, _dn: &str) -> Result<bool, OperationError> {
        Ok(false)
    }

    fn do_bind_simple_authenticated(
        &mut self,
        _dn: &str,
        _password: &[u8],
    ) -> Result<bool, OperationError> {
        Ok(false)
    }

    fn do_bind_sasl_plain(
        &mut self,
        _identity: &str,
        _password: &str,
        _authzid: Option<&str>,
    ) -> Result<bool, OperationError> {
        Ok(false)
    }

    /// Entry sources for a search; the session prepends the RootDSE and the
    /// subschema subentry.
    fn do_search(
        &mut self,
        _base: &str,
        _scope: SearchScope,
        _filter: &Filter<'_>,
    ) -> Result<Vec<Arc<dyn DirectoryEntry>>, OperationError> {
        Ok(Vec::new())
    }

    fn do_add(&mut self, _request: &AddRequest<'_>) -> Result<(), OperationError> {
        Err(OperationError::InsufficientAccessRights)
    }

    fn do_modify(&mut self, _request: &ModifyRequest<'_>) -> Result<(), OperationError> {
        Err(OperationError::InsufficientAccessRights)
    }

    fn do_delete(&mut self, _dn: &str) -> Result<(), OperationError> {
        Err(OperationError::InsufficientAccessRights)
    }

    fn do_modify_dn(&mut self, _request: &ModDnRequest<'_>) -> Result<(), OperationError> {
        Err(OperationError::InsufficientAccessRights)
    }

    fn do_extended(
        &mut self,
        _request: &ExtendedRequest<'_>,
    ) -> Result<ExtendedResponse<'static>, OperationError> {
        Err(OperationError::ProtocolError)
    }
}

/// The authorization state of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindState {
    Anonymous,
    Simple(String),
    SaslPlain(String),
}

/// Per-connection state machine.
pub struct LdapSession<H: RequestHandler> {
    handler: H,
    root_dse: Arc<RootDse>,
    subschema: Arc<SubschemaSubentry>,
    bind_state: BindState,
    // messageIDs marked by Abandon; consumed by the targeted operation or
    // superseded when a new request reuses the id
    abandoned: HashSet<u32>,
}

impl<H: RequestHandler> std::fmt::Debug for LdapSession<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapSession")
            .field("bind_state", &self.bind_state)
            .field("abandoned", &self.abandoned)
            .finish()
    }
}

impl<H: RequestHandler> LdapSession<H> {
    pub fn new(handler: H) -> Result<Self, OperationError> {
        let schema = handler.schema();
        let subschema = SubschemaSubentry::new(schema, handler.subschema_dn())
            .map_err(OperationError::from)?;
        let mut root_dse = subschema.root_dse();
        root_dse.set("objectClass", vec![Value::Oid("top".to_string())])?;
        root_dse.set("supportedLDAPVersion", vec![Value::Int(3)])?;
        if handler.supports_sasl_plain() {
            root_dse.set("supportedSASLMechanisms", vec![Value::from("PLAIN")])?;
        }
        Ok(LdapSession {
            handler,
            root_dse: Arc::new(root_dse),
            subschema: Arc::new(subschema),
            bind_state: BindState::Anonymous,
            abandoned: HashSet::new(),
        })
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn bind_state(&self) -> &BindState {
        &self.bind_state
    }

    pub fn subschema(&self) -> &Arc<SubschemaSubentry> {
        &self.subschema
    }

    /// Run the message loop until the peer unbinds or hangs up.
    ///
    /// Frames are cut out of the stream regardless of read chunking; an
    /// incomplete trailing message at EOF is dropped silently.
    pub fn handle<S: Read + Write>(&mut self, stream: &mut S) -> std::io::Result<()> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            loop {
                let frame_len = match ldap_message_frame_length(&buffer) {
                    Ok(Some(len)) if buffer.len() >= len => len,
                    Ok(_) => break,
                    Err(e) => {
                        warn!("terminating connection: {}", e);
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "unrecoverable LDAP framing corruption",
                        ));
                    }
                };
                let frame: Vec<u8> = buffer.drain(..frame_len).collect();
                let shallow = match ShallowLdapMessage::from_ber(&frame) {
                    Ok((_, shallow)) => shallow,
                    Err(e) => {
                        warn!("terminating connection: {:?}", e);
                        return Err(std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "unrecoverable LDAP message corruption",
                        ));
                    }
                };
                let (responses, close) = self.handle_message(&shallow);
                for response in &responses {
                    stream.write_all(&response.to_ber())?;
                }
                if close {
                    return Ok(());
                }
            }
            let n = stream.read(&mut chunk)?;
            if n == 0 {
                return Ok(());
            }
            buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Dispatch one shallow-decoded message; returns the responses and
    /// whether the connection should close.
    pub fn handle_message(
        &mut self,
        shallow: &ShallowLdapMessage<'_>,
    ) -> (Vec<LdapMessage<'static>>, bool) {
        let id = shallow.message_id;
        // a new message reusing an abandoned messageID is a fresh operation;
        // the stale mark must not poison it
        self.abandoned.remove(&id.0);
        let message = match shallow.parse() {
            Ok((_, message)) => message,
            Err(e) => {
                debug!("message {} undecodable: {}", id.0, e);
                // the shallow phase recovered the message id, so this is
                // answerable
                let result = LdapResult::new(ResultCode::ProtocolError);
                return match ProtocolOp::result_response(shallow.op_tag, result) {
                    Some(op) => (vec![LdapMessage::response(id, op)], false),
                    None => (
                        Vec::new(),
                        shallow.op_tag == ProtocolOpTag::UnbindRequest,
                    ),
                };
            }
        };

        if let Some(controls) = &message.controls {
            let supported = self.handler.supported_controls();
            let unsupported_critical = controls
                .iter()
                .any(|c| c.criticality && !supported.iter().any(|s| s == c.control_type.0.as_ref()));
            if unsupported_critical {
                let result = LdapResult::new(ResultCode::UnavailableCriticalExtension);
                return match ProtocolOp::result_response(shallow.op_tag, result) {
                    Some(op) => (vec![LdapMessage::response(id, op)], false),
                    None => (Vec::new(), false),
                };
            }
        }

        match &message.protocol_op {
            ProtocolOp::BindRequest(request) => (self.handle_bind(id, request), false),
            ProtocolOp::UnbindRequest => (Vec::new(), true),
            ProtocolOp::SearchRequest(request) => (self.handle_search(id, request), false),
            ProtocolOp::CompareRequest(request) => (self.handle_compare(id, request), false),
            ProtocolOp::AbandonRequest(target) => {
                // binds are not cancellable; searches check this flag
                self.abandoned.insert(target.0);
                (Vec::new(), false)
            }
            ProtocolOp::AddRequest(request) => {
                let outcome = self.handler.do_add(request);
                (self.result_only(id, ProtocolOpTag::AddRequest, outcome), false)
            }
            ProtocolOp::ModifyRequest(request) => {
                let outcome = self.handler.do_modify(request);
                (self.result_only(id, ProtocolOpTag::ModifyRequest, outcome), false)
            }
            ProtocolOp::DelRequest(dn) => {
                let outcome = self.handler.do_delete(dn.0.as_ref());
                (self.result_only(id, ProtocolOpTag::DelRequest, outcome), false)
            }
            ProtocolOp::ModDnRequest(request) => {
                let outcome = self.handler.do_modify_dn(request);
                (self.result_only(id, ProtocolOpTag::ModDnRequest, outcome), false)
            }
            ProtocolOp::ExtendedRequest(request) => {
                let response = match self.handler.do_extended(request) {
                    Ok(response) => response,
                    Err(e) => ExtendedResponse::new(e.result_code()),
                };
                (
                    vec![LdapMessage::response(id, ProtocolOp::ExtendedResponse(response))],
                    false,
                )
            }
            // a client must not send response ops; ignore them
            _ => (Vec::new(), false),
        }
    }

    fn result_only(
        &self,
        id: MessageID,
        tag: ProtocolOpTag,
        outcome: Result<(), OperationError>,
    ) -> Vec<LdapMessage<'static>> {
        let code = match outcome {
            Ok(()) => ResultCode::Success,
            Err(e) => e.result_code(),
        };
        match ProtocolOp::result_response(tag, LdapResult::new(code)) {
            Some(op) => vec![LdapMessage::response(id, op)],
            None => Vec::new(),
        }
    }

    fn handle_bind(
        &mut self,
        id: MessageID,
        request: &BindRequest<'_>,
    ) -> Vec<LdapMessage<'static>> {
        // a new bind resets any prior bound state
        self.bind_state = BindState::Anonymous;
        if request.version != 3 {
            return vec![bind_response(id, ResultCode::ProtocolError)];
        }
        let outcome = match &request.authentication {
            AuthenticationChoice::Simple(password) => {
                let dn = request.name.0.as_ref();
                if dn.is_empty() && password.is_empty() {
                    self.handler
                        .do_bind_anonymous()
                        .map(|granted| (granted, BindState::Anonymous))
                } else if password.is_empty() {
                    self.handler
                        .do_bind_unauthenticated(dn)
                        .map(|granted| (granted, BindState::Anonymous))
                } else {
                    self.handler
                        .do_bind_simple_authenticated(dn, password)
                        .map(|granted| (granted, BindState::Simple(dn.to_string())))
                }
            }
            AuthenticationChoice::Sasl(credentials) => {
                if credentials.mechanism.0 != "PLAIN" || !self.handler.supports_sasl_plain() {
                    return vec![bind_response(id, ResultCode::AuthMethodNotSupported)];
                }
                match parse_sasl_plain(credentials.credentials.as_deref().unwrap_or(&[])) {
                    Some((authzid, authcid, password)) => self
                        .handler
                        .do_bind_sasl_plain(authcid, password, authzid)
                        .map(|granted| (granted, BindState::SaslPlain(authcid.to_string()))),
                    None => return vec![bind_response(id, ResultCode::ProtocolError)],
                }
            }
        };
        match outcome {
            Ok((true, state)) => {
                debug!("bind granted: {:?}", state);
                self.bind_state = state;
                vec![bind_response(id, ResultCode::Success)]
            }
            Ok((false, _)) => vec![bind_response(id, ResultCode::InvalidCredentials)],
            Err(e) => vec![bind_response(id, e.result_code())],
        }
    }

    fn handle_search(
        &mut self,
        id: MessageID,
        request: &SearchRequest<'_>,
    ) -> Vec<LdapMessage<'static>> {
        let base = request.base_object.0.as_ref();
        let attributes: Vec<&str> = request.attributes.iter().map(|a| a.0.as_ref()).collect();
        let mut candidates: Vec<Arc<dyn DirectoryEntry>> = Vec::new();
        candidates.push(self.root_dse.clone());
        candidates.push(self.subschema.clone());
        match self.handler.do_search(base, request.scope, &request.filter) {
            Ok(more) => candidates.extend(more),
            Err(e) => return vec![done(id, e.result_code())],
        }

        let base_known = candidates.iter().any(|e| e.covers_base(base));
        let started = Instant::now();
        let mut responses = Vec::new();
        let mut count: u32 = 0;
        for entry in candidates {
            // an abandoned search stops without a SearchResultDone; the mark
            // is consumed so a later request may reuse the messageID
            if self.abandoned.remove(&id.0) {
                return responses;
            }
            if request.time_limit > 0
                && started.elapsed().as_secs() >= u64::from(request.time_limit)
            {
                responses.push(done(id, ResultCode::TimeLimitExceeded));
                return responses;
            }
            match entry.search(
                base,
                request.scope,
                &request.filter,
                &attributes,
                request.types_only,
            ) {
                Ok(Some(found)) => {
                    count += 1;
                    if request.size_limit > 0 && count > request.size_limit {
                        responses.push(done(id, ResultCode::SizeLimitExceeded));
                        return responses;
                    }
                    responses
                        .push(LdapMessage::response(id, ProtocolOp::SearchResultEntry(found)));
                }
                Ok(None) => {}
                Err(e) => {
                    responses.push(done(id, e.result_code()));
                    return responses;
                }
            }
        }
        if base_known {
            responses.push(done(id, ResultCode::Success));
        } else {
            responses.push(done(id, ResultCode::NoSuchObject));
        }
        responses
    }

    fn handle_compare(
        &mut self,
        id: MessageID,
        request: &CompareRequest<'_>,
    ) -> Vec<LdapMessage<'static>> {
        let dn = request.entry.0.as_ref();
        let attribute = request.ava.attribute_desc.0.as_ref();
        let value = request.ava.assertion_value.as_ref();
        let filter = Filter::Present(crate::ldap::LdapString(std::borrow::Cow::Borrowed(
            "objectClass",
        )));
        let mut candidates: Vec<Arc<dyn DirectoryEntry>> = Vec::new();
        candidates.push(self.root_dse.clone());
        candidates.push(self.subschema.clone());
        match self.handler.do_search(dn, SearchScope::BaseObject, &filter) {
            Ok(more) => candidates.extend(more),
            Err(e) => return vec![compare_response(id, e.result_code())],
        }
        for entry in candidates {
            match entry.compare(dn, attribute, value) {
                // this entry is not the target; keep looking
                Err(OperationError::NoSuchObject) => continue,
                Ok(true) => return vec![compare_response(id, ResultCode::CompareTrue)],
                Ok(false) => return vec![compare_response(id, ResultCode::CompareFalse)],
                Err(e) => return vec![compare_response(id, e.result_code())],
            }
        }
        vec![compare_response(id, ResultCode::NoSuchObject)]
    }
}

fn bind_response(id: MessageID, code: ResultCode) -> LdapMessage<'static> {
    LdapMessage::response(id, ProtocolOp::BindResponse(BindResponse::new(code)))
}

fn done(id: MessageID, code: ResultCode) -> LdapMessage<'static> {
    LdapMessage::response(id, ProtocolOp::SearchResultDone(LdapResult::new(code)))
}

fn compare_response(id: MessageID, code: ResultCode) -> LdapMessage<'static> {
    LdapMessage::response(id, ProtocolOp::CompareResponse(LdapResult::new(code)))
}

// PLAIN carries authzid NUL authcid NUL password (RFC 4616); an empty authzid
// means "derive from authcid".
fn parse_sasl_plain(credentials: &[u8]) -> Option<(Option<&str>, &str, &str)> {
    let text = std::str::from_utf8(credentials).ok()?;
    let mut parts = text.splitn(3, '\0');
    let authzid = parts.next()?;
    let authcid = parts.next()?;
    let password = parts.next()?;
    let authzid = if authzid.is_empty() {
        None
    } else {
        Some(authzid)
    };
    Some((authzid, authcid, password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::rfc4519;

    struct TestHandler {
        sasl: bool,
    }

    impl RequestHandler for TestHandler {
        fn schema(&self) -> Arc<Schema> {
            rfc4519()
        }

        fn supports_sasl_plain(&self) -> bool {
            self.sasl
        }

        fn do_bind_simple_authenticated(
            &mut self,
            dn: &str,
            password: &[u8],
        ) -> Result<bool, OperationError> {
            Ok(dn == "cn=service,ou=system,dc=example,dc=com" && password == b"foobar")
        }

        fn do_bind_sasl_plain(
            &mut self,
            identity: &str,
            password: &str,
            authzid: Option<&str>,
        ) -> Result<bool, OperationError> {
            Ok(identity == "service"
                && password == "foobar"
                && authzid.map_or(true, |a| a == "service"))
        }
    }

    fn session(sasl: bool) -> LdapSession<TestHandler> {
        LdapSession::new(TestHandler { sasl }).unwrap()
    }

    fn feed<H: RequestHandler>(
        session: &mut LdapSession<H>,
        frame: &[u8],
    ) -> Vec<LdapMessage<'static>> {
        let (_, shallow) = ShallowLdapMessage::from_ber(frame).expect("framing failed");
        let (responses, _) = session.handle_message(&shallow);
        responses
    }

    fn result_code(message: &LdapMessage<'_>) -> ResultCode {
        message
            .protocol_op
            .result()
            .expect("response without result")
            .result_code
    }

    #[test]
    fn test_session_simple_bind_and_searches() {
        let mut session = session(false);

        // simple bind as cn=service,ou=system,dc=example,dc=com / foobar
        let resps = feed(
            &mut session,
            b"08\x02\x01\x1e\x603\x02\x01\x03\x04&cn=service,ou=system,dc=example,dc=com\x80\x06foobar",
        );
        assert_eq!(resps.len(), 1);
        assert!(matches!(resps[0].protocol_op, ProtocolOp::BindResponse(_)));
        assert_eq!(result_code(&resps[0]), ResultCode::Success);
        assert_eq!(
            session.bind_state(),
            &BindState::Simple("cn=service,ou=system,dc=example,dc=com".to_string())
        );

        // root DSE fetch: base "", baseObject, (objectClass=*), subschemaSubentry + '+'
        let resps = feed(
            &mut session,
            b"0;\x02\x01\x1fc6\x04\x00\n\x01\x00\n\x01\x03\x02\x01\x00\x02\x01\x00\x01\x01\x00\x87\x0bobjectClass0\x16\x04\x11subschemaSubentry\x04\x01+",
        );
        assert_eq!(resps.len(), 2);
        match &resps[0].protocol_op {
            ProtocolOp::SearchResultEntry(entry) => {
                assert_eq!(&entry.object_name.0, "");
                assert!(entry
                    .attributes
                    .iter()
                    .any(|a| a.attr_type.0 == "subschemaSubentry"
                        && a.attr_vals.iter().any(|v| v.0.as_ref() == b"cn=Subschema")));
            }
            op => panic!("unexpected op {:?}", op.tag()),
        }
        assert_eq!(result_code(&resps[1]), ResultCode::Success);

        // subschema fetch at cn=Subschema
        let resps = feed(
            &mut session,
            b"0\x81\xe4\x02\x01 c\x81\xde\x04\x0ccn=Subschema\n\x01\x00\n\x01\x03\x02\x01\x00\x02\x01\x00\x01\x01\x00\xa3\x18\x04\x0bobjectClass\x04\tsubschema0\x81\xa4\x04\robjectClasses\x04\x0eattributeTypes\x04\x0cldapSyntaxes\x04\rmatchingRules\x04\x0fmatchingRuleUse\x04\x0fdITContentRules\x04\x11dITStructureRules\x04\tnameForms\x04\x0fcreateTimestamp\x04\x0fmodifyTimestamp\x04\x01*\x04\x01+",
        );
        assert_eq!(resps.len(), 2);
        match &resps[0].protocol_op {
            ProtocolOp::SearchResultEntry(entry) => {
                assert_eq!(&entry.object_name.0, "cn=Subschema");
                let object_classes = entry
                    .attributes
                    .iter()
                    .find(|a| a.attr_type.0 == "objectClasses")
                    .expect("objectClasses not published");
                assert!(object_classes.attr_vals.iter().any(|v| v.0.as_ref()
                    == b"( 2.5.6.0 NAME 'top' ABSTRACT MUST objectClass )".as_ref()));
            }
            op => panic!("unexpected op {:?}", op.tag()),
        }
        assert_eq!(result_code(&resps[1]), ResultCode::Success);

        // search below an unknown base answers noSuchObject
        let resps = feed(
            &mut session,
            b"0F\x02\x01!cA\x04\x1aou=users,dc=example,dc=com\n\x01\x02\n\x01\x03\x02\x01\x00\x02\x01\x00\x01\x01\x00\xa3\x0f\x04\x03uid\x04\x08testuser0\x03\x04\x01*",
        );
        assert_eq!(resps.len(), 1);
        assert!(matches!(resps[0].protocol_op, ProtocolOp::SearchResultDone(_)));
        assert_eq!(result_code(&resps[0]), ResultCode::NoSuchObject);

        // unbind produces nothing and closes
        let (_, shallow) = ShallowLdapMessage::from_ber(b"0\x05\x02\x01\x22B\x00").unwrap();
        let (resps, close) = session.handle_message(&shallow);
        assert!(resps.is_empty());
        assert!(close);
    }

    #[test]
    fn test_session_critical_control() {
        let mut session = session(false);
        let resps = feed(
            &mut session,
            b"0\x0c\x02\x01\x01`\x07\x02\x01\x03\x04\x00\x80\x00",
        );
        assert_eq!(result_code(&resps[0]), ResultCode::Success);
        // ManageDsaIT marked critical is not supported
        let resps = feed(
            &mut session,
            b"0E\x02\x01\x02c \x04\x00\n\x01\x02\n\x01\x00\x02\x01\x00\x02\x01\x00\x01\x01\x00\x87\x0bobjectClass0\x00\xa0\x1e0\x1c\x04\x172.16.840.1.113730.3.4.2\x01\x01\xff",
        );
        assert_eq!(resps.len(), 1);
        assert!(matches!(resps[0].protocol_op, ProtocolOp::SearchResultDone(_)));
        assert_eq!(
            result_code(&resps[0]),
            ResultCode::UnavailableCriticalExtension
        );
    }

    #[test]
    fn test_session_sasl_plain() {
        let mut session = session(true);
        // anonymous bind
        let resps = feed(
            &mut session,
            b"0\x0c\x02\x01\x01`\x07\x02\x01\x03\x04\x00\x80\x00",
        );
        assert_eq!(result_code(&resps[0]), ResultCode::Success);
        assert_eq!(session.bind_state(), &BindState::Anonymous);

        // supportedSASLMechanisms on the root DSE
        let resps = feed(
            &mut session,
            b"0>\x02\x01\x01c9\x04\x00\n\x01\x00\n\x01\x00\x02\x01\x00\x02\x01\x00\x01\x01\x00\x87\x0bobjectclass0\x19\x04\x17supportedSASLMechanisms",
        );
        assert_eq!(resps.len(), 2);
        match &resps[0].protocol_op {
            ProtocolOp::SearchResultEntry(entry) => {
                let mechanisms = entry
                    .attributes
                    .iter()
                    .find(|a| a.attr_type.0 == "supportedSASLMechanisms")
                    .expect("mechanisms not advertised");
                assert!(mechanisms.attr_vals.iter().any(|v| v.0.as_ref() == b"PLAIN"));
            }
            op => panic!("unexpected op {:?}", op.tag()),
        }

        // SASL PLAIN bind: authzid=service authcid=service password=foobar
        let resps = feed(
            &mut session,
            b"0+\x02\x01\x02`&\x02\x01\x03\x04\x00\xa3\x1f\x04\x05PLAIN\x04\x16service\x00service\x00foobar",
        );
        assert_eq!(resps.len(), 1);
        assert_eq!(result_code(&resps[0]), ResultCode::Success);
        assert_eq!(
            session.bind_state(),
            &BindState::SaslPlain("service".to_string())
        );
    }

    #[test]
    fn test_session_sasl_rejected_without_support() {
        let mut session = session(false);
        let resps = feed(
            &mut session,
            b"0+\x02\x01\x02`&\x02\x01\x03\x04\x00\xa3\x1f\x04\x05PLAIN\x04\x16service\x00service\x00foobar",
        );
        assert_eq!(result_code(&resps[0]), ResultCode::AuthMethodNotSupported);
    }

    #[test]
    fn test_session_bad_credentials() {
        let mut session = session(false);
        let resps = feed(
            &mut session,
            b"08\x02\x01\x1e\x603\x02\x01\x03\x04&cn=service,ou=system,dc=example,dc=com\x80\x06barfoo",
        );
        assert_eq!(result_code(&resps[0]), ResultCode::InvalidCredentials);
        assert_eq!(session.bind_state(), &BindState::Anonymous);
    }

    #[test]
    fn test_session_malformed_op_answers_protocol_error() {
        let mut session = session(false);
        let mut corrupted =
            b"0;\x02\x01\x1fc6\x04\x00\n\x01\x00\n\x01\x03\x02\x01\x00\x02\x01\x00\x01\x01\x00\x87\x0bobjectClass0\x16\x04\x11subschemaSubentry\x04\x01+"
                .to_vec();
        corrupted[7] = 0xab;
        let resps = feed(&mut session, &corrupted);
        assert_eq!(resps.len(), 1);
        assert_eq!(resps[0].message_id, MessageID(31));
        assert!(matches!(resps[0].protocol_op, ProtocolOp::SearchResultDone(_)));
        assert_eq!(result_code(&resps[0]), ResultCode::ProtocolError);
    }

    #[test]
    fn test_session_write_ops_refused() {
        let mut session = session(false);
        // DelRequest for cn=foo
        let frame = LdapMessage::response(
            MessageID(9),
            ProtocolOp::DelRequest(crate::ldap::LdapDN(std::borrow::Cow::Borrowed("cn=foo"))),
        )
        .to_ber();
        let resps = feed(&mut session, &frame);
        assert_eq!(resps.len(), 1);
        assert!(matches!(resps[0].protocol_op, ProtocolOp::DelResponse(_)));
        assert_eq!(result_code(&resps[0]), ResultCode::InsufficientAccessRights);
    }

    #[test]
    fn test_session_abandon_is_silent() {
        let mut session = session(false);
        let frame = LdapMessage::response(
            MessageID(6),
            ProtocolOp::AbandonRequest(MessageID(5)),
        )
        .to_ber();
        let resps = feed(&mut session, &frame);
        assert!(resps.is_empty());
        assert!(session.abandoned.contains(&5));
    }

    #[test]
    fn test_session_abandoned_id_can_be_reused() {
        let mut session = session(false);
        // abandon a messageID whose operation has long finished
        let frame = LdapMessage::response(
            MessageID(6),
            ProtocolOp::AbandonRequest(MessageID(5)),
        )
        .to_ber();
        feed(&mut session, &frame);
        assert!(session.abandoned.contains(&5));

        // a later search reusing the id is a fresh operation and still gets
        // its terminal SearchResultDone
        let search = LdapMessage::response(
            MessageID(5),
            ProtocolOp::SearchRequest(SearchRequest::base_object("")),
        )
        .to_ber();
        let resps = feed(&mut session, &search);
        assert_eq!(resps.len(), 2);
        assert!(matches!(resps[0].protocol_op, ProtocolOp::SearchResultEntry(_)));
        assert!(matches!(resps[1].protocol_op, ProtocolOp::SearchResultDone(_)));
        assert_eq!(result_code(&resps[1]), ResultCode::Success);
        assert!(!session.abandoned.contains(&5));
    }

    #[test]
    fn test_session_delegated_bind_tri_state() {
        use crate::auth::{
            AuthDelegate, AuthOutcome, CacheConfig, CachingAuthDelegate, CredentialCache,
            DelegatedBindHandler,
        };
        use std::borrow::Cow;

        struct StaticDelegate;

        impl AuthDelegate for StaticDelegate {
            fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
                match (username, password) {
                    ("cn=service,ou=system,dc=example,dc=com", "foobar") => AuthOutcome::Granted,
                    ("cn=down,dc=example,dc=com", _) => AuthOutcome::TransientFailure,
                    _ => AuthOutcome::Denied,
                }
            }
        }

        fn bind_frame(id: u32, dn: &str, password: &[u8]) -> Vec<u8> {
            LdapMessage::response(
                MessageID(id),
                ProtocolOp::BindRequest(BindRequest {
                    version: 3,
                    name: crate::ldap::LdapDN(Cow::Owned(dn.to_string())),
                    authentication: AuthenticationChoice::Simple(Cow::Owned(password.to_vec())),
                }),
            )
            .to_ber()
        }

        let handler = DelegatedBindHandler::new(
            rfc4519(),
            CachingAuthDelegate::new(StaticDelegate, CredentialCache::new(CacheConfig::default())),
        );
        let mut session = LdapSession::new(handler).unwrap();

        let resps = feed(
            &mut session,
            &bind_frame(1, "cn=service,ou=system,dc=example,dc=com", b"foobar"),
        );
        assert_eq!(resps.len(), 1);
        assert_eq!(result_code(&resps[0]), ResultCode::Success);
        assert_eq!(
            session.bind_state(),
            &BindState::Simple("cn=service,ou=system,dc=example,dc=com".to_string())
        );

        // Denied answers invalidCredentials
        let resps = feed(
            &mut session,
            &bind_frame(2, "cn=service,ou=system,dc=example,dc=com", b"barfoo"),
        );
        assert_eq!(result_code(&resps[0]), ResultCode::InvalidCredentials);
        assert_eq!(session.bind_state(), &BindState::Anonymous);

        // TransientFailure answers other
        let resps = feed(
            &mut session,
            &bind_frame(3, "cn=down,dc=example,dc=com", b"foobar"),
        );
        assert_eq!(result_code(&resps[0]), ResultCode::Other);
        assert_eq!(session.bind_state(), &BindState::Anonymous);
    }
}
