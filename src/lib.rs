//! # LDAP Server
//!
//! An embedded Lightweight Directory Access Protocol (LDAPv3, [RFC4511]) server
//! library. The BER layer is implemented with the
//! [nom](https://github.com/Geal/nom) parser combinator framework through
//! [asn1-rs](https://github.com/rusticata/asn1-rs); the directory semantics
//! (schema, distinguished names, filter evaluation, session handling) are built
//! on top of it.
//!
//! It is written in pure Rust and makes extensive use of zero-copy on the
//! decoding path. A lot of care is taken to ensure security and safety of this
//! crate, including design (defensive framing checks, recoverable protocol
//! errors), and tests. It also aims to be panic-free.
//!
//! The crate is an *embedded* server: applications supply directory entries and
//! authentication callbacks through [`session::RequestHandler`], and the
//! library turns a byte stream into LDAP response bytes. The TCP listener in
//! [`net`] and the `ldap-serverd` binary are thin optional glue.
//!
//! [RFC4511]: https://tools.ietf.org/html/rfc4511

#![deny(unstable_features, unused_import_braces, unused_qualifications)]
#![warn(missing_debug_implementations, unreachable_pub)]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod filter_parser;
pub mod auth;
pub mod config;
pub mod dn;
pub mod entries;
pub mod error;
pub mod filter;
pub mod ldap;
pub mod net;
pub mod parser;
pub mod schema;
pub mod serializer;
pub mod session;
pub mod stringprep;

pub use asn1_rs::nom;
pub use asn1_rs::nom::{Err, IResult};
pub use asn1_rs::FromBer;

pub use dn::{Dn, Rdn, RdnAssertion};
pub use entries::{
    AttributeDict, DirectoryEntry, EntryTemplate, ObjectEntry, RootDse, SubschemaSubentry,
    TemplateValue,
};
pub use error::{LdapError, OperationError};
pub use schema::{Schema, Value};
pub use serializer::ToBer;
pub use session::{LdapSession, RequestHandler};
