//! Threaded TCP server glue
//!
//! One thread per accepted connection; within a connection message handling
//! is sequential. The schema is shared immutably across threads, entry
//! stores and caches are the handler factory's business.

use std::io;
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::session::{LdapSession, RequestHandler};

/// Accept connections forever, handling each on its own thread.
///
/// `make_handler` is invoked once per connection so handlers may keep
/// per-connection state; shared state belongs behind `Arc` inside the
/// factory.
pub fn serve<H, F>(
    listener: TcpListener,
    read_timeout: Option<Duration>,
    make_handler: F,
) -> io::Result<()>
where
    H: RequestHandler + Send + 'static,
    F: Fn() -> H + Send + Sync + 'static,
{
    let make_handler = Arc::new(make_handler);
    loop {
        let (mut stream, peer) = listener.accept()?;
        let make_handler = make_handler.clone();
        thread::spawn(move || {
            debug!("connection from {}", peer);
            if let Err(e) = stream.set_read_timeout(read_timeout) {
                warn!("{}: cannot set read timeout: {}", peer, e);
                return;
            }
            let mut session = match LdapSession::new(make_handler()) {
                Ok(session) => session,
                Err(e) => {
                    warn!("{}: session setup failed: {}", peer, e);
                    return;
                }
            };
            match session.handle(&mut stream) {
                Ok(()) => debug!("{}: connection closed", peer),
                Err(e) => warn!("{}: connection aborted: {}", peer, e),
            }
        });
    }
}
