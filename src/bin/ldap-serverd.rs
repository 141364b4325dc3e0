//! Standalone LDAP server
//!
//! Environment-driven (`listen`, `port`, `log`, ...), subcommand-less. It
//! serves the RootDSE and the subschema subentry; binds run through the
//! credential cache and the authentication delegate. The standalone binary
//! has no web-auth backend wired in, so its delegate reports every attempt
//! as a transient failure (`other` on the bind response) while anonymous
//! reads keep working; real deployments embed the library and supply their
//! own delegate.
//!
//! Exit codes: 0 on normal termination, 2 on configuration errors, 3 when
//! the listen socket cannot be bound.

use std::net::TcpListener;
use std::process::exit;
use std::sync::Arc;
use std::time::Duration;

use ldap_server::auth::{
    AuthDelegate, AuthOutcome, CachingAuthDelegate, CredentialCache, DelegatedBindHandler,
};
use ldap_server::config::Config;
use ldap_server::net;
use ldap_server::schema;

struct UnconfiguredBackend;

impl AuthDelegate for UnconfiguredBackend {
    fn authenticate(&self, _username: &str, _password: &str) -> AuthOutcome {
        AuthOutcome::TransientFailure
    }
}

fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            exit(2);
        }
    };
    env_logger::Builder::new()
        .parse_filters(&config.log)
        .init();

    let address = format!("{}:{}", config.listen, config.port);
    let listener = match TcpListener::bind(&address) {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("cannot listen on {}: {}", address, e);
            exit(3);
        }
    };
    log::info!("listening on {}", address);

    let schema = schema::rfc4519();
    // one cache shared by every connection's handler
    let auth = Arc::new(CachingAuthDelegate::new(
        UnconfiguredBackend,
        CredentialCache::open(config.cache_config()),
    ));
    let result = net::serve(listener, Some(Duration::from_secs(300)), move || {
        DelegatedBindHandler::new(schema.clone(), auth.clone())
    });
    if let Err(e) = result {
        eprintln!("server terminated: {}", e);
        exit(3);
    }
}
