//! External authentication delegate and credential cache
//!
//! Bind validation is delegated to an opaque [`AuthDelegate`] callback. A
//! bounded, TTL-limited [`CredentialCache`] sits in front of it so repeated
//! binds short-circuit the (potentially slow) delegate. Only positive
//! results are cached; usernames and passwords are stored as salted,
//! key-stretched hashes, never in clear.
//!
//! The cache persists to disk between runs in a version-tagged file; files
//! with an unknown version are discarded whole, never partially loaded.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::error::OperationError;
use crate::schema::Schema;
use crate::session::RequestHandler;

/// Tri-state result of an external authentication attempt.
///
/// `Denied` maps to `invalidCredentials`; `TransientFailure` (backend down,
/// timeout) maps to `other` and is never cached.
/// [`AuthOutcome::into_bind_result`] performs that mapping for the bind
/// callbacks of [`RequestHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted,
    Denied,
    TransientFailure,
}

impl AuthOutcome {
    /// Turn the delegate's answer into a bind-callback result.
    ///
    /// `Denied` surfaces as `invalidCredentials` and `TransientFailure` as
    /// `other` on the bind response.
    pub fn into_bind_result(self) -> Result<bool, OperationError> {
        match self {
            AuthOutcome::Granted => Ok(true),
            AuthOutcome::Denied => Err(OperationError::InvalidCredentials),
            AuthOutcome::TransientFailure => Err(OperationError::Other(
                "authentication backend unavailable".to_string(),
            )),
        }
    }
}

/// The application's opaque bind validator.
pub trait AuthDelegate: Send + Sync {
    fn authenticate(&self, username: &str, password: &str) -> AuthOutcome;
}

impl<D: AuthDelegate + ?Sized> AuthDelegate for Arc<D> {
    fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        (**self).authenticate(username, password)
    }
}

/// Default time to live of cached credentials: 12 hours.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Default upper bound on cached credential pairs.
pub const DEFAULT_CACHE_SIZE: usize = 2345;

const CACHE_FORMAT_VERSION: u32 = 1;
const STRETCH_ROUNDS: u32 = 4096;

/// Cache parameters; the salt is process-wide configuration, not a secret
/// per entry.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
    pub salt: Vec<u8>,
    /// Cache file; `None` disables persistence.
    pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl: DEFAULT_CACHE_TTL,
            capacity: DEFAULT_CACHE_SIZE,
            salt: Vec::new(),
            path: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    user: String,
    secret: String,
    expires_at: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    entries: Vec<StoredEntry>,
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<String, (String, SystemTime)>,
    // insertion order, for eviction once expiry alone is not enough
    order: VecDeque<String>,
}

/// Thread-safe, bounded, persistent credential cache.
///
/// Keys and values are salted hashes of username and password; entries
/// expire after the configured TTL and the oldest insertions are evicted
/// once the cache is full.
#[derive(Debug)]
pub struct CredentialCache {
    config: CacheConfig,
    inner: Mutex<CacheInner>,
}

impl CredentialCache {
    pub fn new(config: CacheConfig) -> Self {
        CredentialCache {
            config,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Create a cache, loading the persisted state if the configured file
    /// exists and carries the current format version.
    pub fn open(config: CacheConfig) -> Self {
        let cache = CredentialCache::new(config);
        if let Some(path) = cache.config.path.clone() {
            if let Err(e) = cache.load_from(&path) {
                debug!("credential cache not loaded from {:?}: {}", path, e);
            }
        }
        cache
    }

    fn load_from(&self, path: &Path) -> io::Result<()> {
        let raw = std::fs::read(path)?;
        let file: CacheFile = match serde_json::from_slice(&raw) {
            Ok(file) => file,
            Err(e) => {
                warn!("discarding unreadable credential cache {:?}: {}", path, e);
                return Ok(());
            }
        };
        if file.version != CACHE_FORMAT_VERSION {
            warn!(
                "discarding credential cache {:?} with unknown version {}",
                path, file.version
            );
            return Ok(());
        }
        let now = SystemTime::now();
        let mut inner = self.lock();
        for entry in file.entries {
            let expires_at = UNIX_EPOCH + Duration::from_secs(entry.expires_at);
            if expires_at <= now {
                continue;
            }
            if !inner.map.contains_key(&entry.user) {
                inner.order.push_back(entry.user.clone());
            }
            inner.map.insert(entry.user, (entry.secret, expires_at));
        }
        debug!("credential cache loaded with {} entries", inner.map.len());
        Ok(())
    }

    /// Serialize to the configured file, atomically (write then rename).
    pub fn persist(&self) -> io::Result<()> {
        let path = match &self.config.path {
            Some(path) => path.clone(),
            None => return Ok(()),
        };
        let inner = self.lock();
        let entries: Vec<StoredEntry> = inner
            .map
            .iter()
            .filter_map(|(user, (secret, expires_at))| {
                expires_at
                    .duration_since(UNIX_EPOCH)
                    .ok()
                    .map(|d| StoredEntry {
                        user: user.clone(),
                        secret: secret.clone(),
                        expires_at: d.as_secs(),
                    })
            })
            .collect();
        drop(inner);
        let file = CacheFile {
            version: CACHE_FORMAT_VERSION,
            entries,
        };
        let serialized = serde_json::to_vec(&file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(directory)?;
        io::Write::write_all(&mut temp, &serialized)?;
        temp.persist(&path).map_err(|e| e.error)?;
        debug!("credential cache persisted to {:?}", path);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // a poisoned cache lock only ever guards plain data
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Salted, iterated hash of a username or password.
    pub fn credential_hash(&self, input: &str) -> String {
        let mut digest = Sha1::new();
        digest.update(&self.config.salt);
        digest.update(input.as_bytes());
        let mut state = digest.finalize();
        for _ in 1..STRETCH_ROUNDS {
            let mut next = Sha1::new();
            next.update(&self.config.salt);
            next.update(&state);
            state = next.finalize();
        }
        hex_encode(&state)
    }

    /// Whether this exact username/password pair is cached and fresh.
    pub fn check(&self, username: &str, password: &str) -> bool {
        let user = self.credential_hash(username);
        let secret = self.credential_hash(password);
        let now = SystemTime::now();
        let inner = self.lock();
        match inner.map.get(&user) {
            Some((stored, expires_at)) => *expires_at > now && *stored == secret,
            None => false,
        }
    }

    /// Insert the pair, replacing any previous password hash.
    pub fn insert(&self, username: &str, password: &str) {
        let user = self.credential_hash(username);
        let secret = self.credential_hash(password);
        let expires_at = SystemTime::now() + self.config.ttl;
        let mut inner = self.lock();
        Self::evict(&mut inner, self.config.capacity);
        if !inner.map.contains_key(&user) {
            inner.order.push_back(user.clone());
        }
        inner.map.insert(user, (secret, expires_at));
    }

    /// Atomically insert the pair unless the username is already cached;
    /// returns whether an insert happened.
    pub fn put_if_absent(&self, username: &str, password: &str) -> bool {
        let user = self.credential_hash(username);
        let secret = self.credential_hash(password);
        let now = SystemTime::now();
        let expires_at = now + self.config.ttl;
        let mut inner = self.lock();
        let fresh = matches!(inner.map.get(&user), Some((_, e)) if *e > now);
        if fresh {
            return false;
        }
        Self::evict(&mut inner, self.config.capacity);
        if !inner.map.contains_key(&user) {
            inner.order.push_back(user.clone());
        }
        inner.map.insert(user, (secret, expires_at));
        true
    }

    pub fn len(&self) -> usize {
        let now = SystemTime::now();
        self.lock().map.values().filter(|(_, e)| *e > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.map.clear();
        inner.order.clear();
    }

    // Expired entries go first; insertion order decides once the cache is
    // still full.
    fn evict(inner: &mut CacheInner, capacity: usize) {
        let now = SystemTime::now();
        if inner.map.len() < capacity {
            return;
        }
        let CacheInner { map, order } = inner;
        let expired: Vec<String> = map
            .iter()
            .filter(|(_, (_, e))| *e <= now)
            .map(|(k, _)| k.clone())
            .collect();
        for key in expired {
            map.remove(&key);
        }
        order.retain(|k| map.contains_key(k));
        while map.len() >= capacity {
            match order.pop_front() {
                Some(oldest) => {
                    map.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

/// An [`AuthDelegate`] wrapper that consults the cache before the delegate
/// and caches positive answers.
pub struct CachingAuthDelegate<D> {
    delegate: D,
    cache: CredentialCache,
}

impl<D: AuthDelegate> CachingAuthDelegate<D> {
    pub fn new(delegate: D, cache: CredentialCache) -> Self {
        CachingAuthDelegate { delegate, cache }
    }

    pub fn cache(&self) -> &CredentialCache {
        &self.cache
    }
}

impl<D: AuthDelegate> AuthDelegate for CachingAuthDelegate<D> {
    fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
        if self.cache.check(username, password) {
            debug!("credential cache hit");
            return AuthOutcome::Granted;
        }
        let outcome = self.delegate.authenticate(username, password);
        if outcome == AuthOutcome::Granted {
            self.cache.put_if_absent(username, password);
        }
        outcome
    }
}

/// A [`RequestHandler`] that routes authenticated binds through an
/// [`AuthDelegate`].
///
/// Simple binds pass the bind DN as the username, SASL PLAIN binds the
/// authentication identity (an authorization identity, when present, must
/// equal it). The delegate's tri-state maps onto the bind response through
/// [`AuthOutcome::into_bind_result`]: `Denied` answers `invalidCredentials`,
/// `TransientFailure` answers `other`. Anonymous binds stay accepted.
pub struct DelegatedBindHandler<D> {
    schema: Arc<Schema>,
    delegate: D,
}

impl<D: AuthDelegate> DelegatedBindHandler<D> {
    pub fn new(schema: Arc<Schema>, delegate: D) -> Self {
        DelegatedBindHandler { schema, delegate }
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }
}

impl<D: AuthDelegate> RequestHandler for DelegatedBindHandler<D> {
    fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }

    fn supports_sasl_plain(&self) -> bool {
        true
    }

    fn do_bind_simple_authenticated(
        &mut self,
        dn: &str,
        password: &[u8],
    ) -> Result<bool, OperationError> {
        let password = std::str::from_utf8(password)
            .map_err(|_| OperationError::InvalidCredentials)?;
        self.delegate.authenticate(dn, password).into_bind_result()
    }

    fn do_bind_sasl_plain(
        &mut self,
        identity: &str,
        password: &str,
        authzid: Option<&str>,
    ) -> Result<bool, OperationError> {
        if let Some(authzid) = authzid {
            if authzid != identity {
                return Err(OperationError::InvalidCredentials);
            }
        }
        self.delegate.authenticate(identity, password).into_bind_result()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn config() -> CacheConfig {
        CacheConfig {
            salt: b"pepper".to_vec(),
            ..CacheConfig::default()
        }
    }

    #[test]
    fn test_into_bind_result() {
        assert_eq!(AuthOutcome::Granted.into_bind_result(), Ok(true));
        assert_eq!(
            AuthOutcome::Denied.into_bind_result(),
            Err(OperationError::InvalidCredentials)
        );
        assert!(matches!(
            AuthOutcome::TransientFailure.into_bind_result(),
            Err(OperationError::Other(_))
        ));
    }

    #[test]
    fn test_hashing_is_salted_and_stable() {
        let cache = CredentialCache::new(config());
        let h1 = cache.credential_hash("alice");
        assert_eq!(h1, cache.credential_hash("alice"));
        assert_ne!(h1, cache.credential_hash("bob"));
        let other = CredentialCache::new(CacheConfig {
            salt: b"different".to_vec(),
            ..CacheConfig::default()
        });
        assert_ne!(h1, other.credential_hash("alice"));
    }

    #[test]
    fn test_check_and_insert() {
        let cache = CredentialCache::new(config());
        assert!(!cache.check("alice", "secret"));
        cache.insert("alice", "secret");
        assert!(cache.check("alice", "secret"));
        assert!(!cache.check("alice", "wrong"));
        assert!(!cache.check("bob", "secret"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_if_absent() {
        let cache = CredentialCache::new(config());
        assert!(cache.put_if_absent("alice", "secret"));
        assert!(!cache.put_if_absent("alice", "other"));
        // the original secret stays
        assert!(cache.check("alice", "secret"));
        assert!(!cache.check("alice", "other"));
    }

    #[test]
    fn test_ttl_expiry() {
        let cache = CredentialCache::new(CacheConfig {
            ttl: Duration::from_secs(0),
            ..config()
        });
        cache.insert("alice", "secret");
        assert!(!cache.check("alice", "secret"));
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_eviction_by_insertion_order() {
        let cache = CredentialCache::new(CacheConfig {
            capacity: 2,
            ..config()
        });
        cache.insert("a", "1");
        cache.insert("b", "2");
        cache.insert("c", "3");
        assert!(!cache.check("a", "1"));
        assert!(cache.check("b", "2"));
        assert!(cache.check("c", "3"));
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.cache");
        let mut cfg = config();
        cfg.path = Some(path.clone());
        let cache = CredentialCache::open(cfg.clone());
        cache.insert("alice", "secret");
        cache.persist().unwrap();

        let reloaded = CredentialCache::open(cfg.clone());
        assert!(reloaded.check("alice", "secret"));

        // unknown versions are discarded whole
        std::fs::write(&path, br#"{"version":99,"entries":[{"user":"x","secret":"y","expires_at":99999999999}]}"#).unwrap();
        let discarded = CredentialCache::open(cfg);
        assert_eq!(discarded.len(), 0);
    }

    #[test]
    fn test_caching_delegate() {
        struct CountingDelegate {
            calls: AtomicUsize,
        }
        impl AuthDelegate for CountingDelegate {
            fn authenticate(&self, username: &str, password: &str) -> AuthOutcome {
                self.calls.fetch_add(1, Ordering::SeqCst);
                match (username, password) {
                    ("alice", "secret") => AuthOutcome::Granted,
                    ("down", _) => AuthOutcome::TransientFailure,
                    _ => AuthOutcome::Denied,
                }
            }
        }
        let delegate = CachingAuthDelegate::new(
            CountingDelegate {
                calls: AtomicUsize::new(0),
            },
            CredentialCache::new(config()),
        );
        assert_eq!(delegate.authenticate("alice", "secret"), AuthOutcome::Granted);
        // the second bind is served from the cache
        assert_eq!(delegate.authenticate("alice", "secret"), AuthOutcome::Granted);
        assert_eq!(delegate.delegate.calls.load(Ordering::SeqCst), 1);
        assert_eq!(delegate.authenticate("alice", "wrong"), AuthOutcome::Denied);
        // transient failures are not cached
        assert_eq!(
            delegate.authenticate("down", "secret"),
            AuthOutcome::TransientFailure
        );
        assert_eq!(
            delegate.authenticate("down", "secret"),
            AuthOutcome::TransientFailure
        );
    }
}
