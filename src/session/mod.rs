//! Session persistence for loaded captures.
//!
//! A session is the index of one capture plus its aggregate stats, stored
//! as a small JSON descriptor so that separate process invocations (a CLI
//! call, then an agent call) share state without re-indexing:
//! - Descriptors never contain bodies or headers
//! - Writes are atomic (temp file + rename)
//! - Staleness is detected by re-hashing the source file on every access
//! - Expired descriptors are removed best-effort
//!
//! Raw content is re-parsed from the capture on demand via
//! [`SessionManager::open`].

mod stats;

pub use stats::CaptureStats;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::SessionConfig;
use crate::error::{HarError, Result};
use crate::model::{Har, IndexedEntry};
use crate::parser::{build_index, CaptureParser};
use crate::util::{atomic_write, content_hash};

/// Extension of descriptor files.
const DESCRIPTOR_EXT: &str = "json";

/// Name of the file recording which descriptor is active.
const ACTIVE_POINTER: &str = "active";

/// Number of hash characters used to name a session.
const SESSION_ID_LEN: usize = 16;

/// A loaded-and-indexed capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Absolute path of the capture file.
    pub source_file: PathBuf,
    /// Hex SHA-256 of the capture file at load time.
    pub source_hash: String,
    /// Aggregate statistics.
    pub stats: CaptureStats,
    /// Per-entry index in file order.
    pub entries: Vec<IndexedEntry>,
    /// When the capture was loaded.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from an already parsed capture.
    pub fn from_capture(source_file: PathBuf, source_hash: String, har: &Har) -> Self {
        let entries = build_index(har);
        let stats = CaptureStats::from_entries(&entries);
        Self {
            source_file,
            source_hash,
            stats,
            entries,
            created_at: Utc::now(),
        }
    }

    /// Short identifier derived from the content hash.
    pub fn id(&self) -> &str {
        let end = SESSION_ID_LEN.min(self.source_hash.len());
        &self.source_hash[..end]
    }

    /// Look up an indexed entry.
    pub fn entry(&self, index: usize) -> Option<&IndexedEntry> {
        self.entries.get(index)
    }
}

/// Listing information about a persisted descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Session id.
    pub id: String,
    /// Capture file.
    pub source_file: PathBuf,
    /// Number of entries.
    pub entries: usize,
    /// Load time.
    pub created_at: DateTime<Utc>,
    /// Whether this is the active session.
    pub active: bool,
}

/// Owns the sessions directory.
#[derive(Debug, Clone)]
pub struct SessionManager {
    /// Directory holding descriptors.
    dir: PathBuf,
    /// Descriptor lifetime.
    ttl: Duration,
    /// Parser used for loads and lazy re-parses.
    parser: CaptureParser,
}

impl SessionManager {
    /// Create a manager over `dir` with the given descriptor lifetime.
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            parser: CaptureParser::new(),
        }
    }

    /// Create a manager from configuration.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        let dir = match &config.directory {
            Some(dir) => dir.clone(),
            None => crate::config::default_sessions_dir()?,
        };
        Ok(Self::new(dir, Duration::from_secs(config.ttl_seconds))
            .with_parser(CaptureParser::new().with_max_file_size(config.max_file_size)))
    }

    /// Use a custom parser.
    #[must_use]
    pub fn with_parser(mut self, parser: CaptureParser) -> Self {
        self.parser = parser;
        self
    }

    /// The sessions directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn descriptor_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{DESCRIPTOR_EXT}"))
    }

    fn active_path(&self) -> PathBuf {
        self.dir.join(ACTIVE_POINTER)
    }

    /// Load and index a capture, persist its descriptor and make it active.
    #[instrument(skip(self, file), fields(path = %file.as_ref().display()))]
    pub fn create_session(&self, file: impl AsRef<Path>) -> Result<Session> {
        let file = file.as_ref();
        let source_file = absolute(file);

        let bytes = self.parser.read_file(&source_file)?;
        let source_hash = content_hash(&bytes);
        let har = self.parser.parse_slice(&bytes, &source_file)?;
        drop(bytes);

        let session = Session::from_capture(source_file, source_hash, &har);

        let removed = self.clean_expired_sessions();
        if removed > 0 {
            debug!(removed, "Removed expired session descriptors");
        }

        self.persist(&session)?;
        info!(
            id = session.id(),
            entries = session.entries.len(),
            "Session created"
        );
        Ok(session)
    }

    /// Write a session descriptor and point `active` at it.
    fn persist(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_vec(session).map_err(|e| HarError::Serialization {
            context: "Failed to serialize session descriptor".to_string(),
            source: e,
        })?;
        atomic_write(self.descriptor_path(session.id()), &json)?;
        atomic_write(self.active_path(), session.id().as_bytes())?;
        Ok(())
    }

    /// Id of the active session, if any.
    pub fn active_id(&self) -> Option<String> {
        let id = fs::read_to_string(self.active_path()).ok()?;
        let id = id.trim();
        (!id.is_empty()).then(|| id.to_string())
    }

    /// Load the active (or named) session without re-parsing its capture.
    ///
    /// Fails with [`HarError::StaleSession`] when the capture changed on
    /// disk since it was indexed.
    #[instrument(skip(self), level = "debug")]
    pub fn load_session(&self, name: Option<&str>) -> Result<Session> {
        let session = self.read_descriptor(name)?;
        let bytes = self.read_source(&session)?;
        ensure_fresh(&session, &bytes)?;
        Ok(session)
    }

    /// Load the active (or named) session together with its raw capture.
    ///
    /// The capture is read once; the same bytes are hashed for the
    /// staleness check and parsed.
    #[instrument(skip(self), level = "debug")]
    pub fn open(&self, name: Option<&str>) -> Result<(Session, Har)> {
        let session = self.read_descriptor(name)?;
        let har = self.load_capture(&session)?;
        Ok((session, har))
    }

    /// Re-parse the raw capture behind a session.
    pub fn load_capture(&self, session: &Session) -> Result<Har> {
        let bytes = self.read_source(session)?;
        ensure_fresh(session, &bytes)?;
        self.parser.parse_slice(&bytes, &session.source_file)
    }

    fn read_source(&self, session: &Session) -> Result<Vec<u8>> {
        self.parser.read_file(&session.source_file)
    }

    /// Read a descriptor by name (id or id prefix), or the active one.
    fn read_descriptor(&self, name: Option<&str>) -> Result<Session> {
        let id = match name {
            Some(name) => self.resolve_name(name)?,
            None => self.active_id().ok_or(HarError::NoSession)?,
        };

        let path = self.descriptor_path(&id);
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(if name.is_some() {
                    HarError::SessionNotFound { name: id }
                } else {
                    HarError::NoSession
                });
            }
            Err(e) => {
                return Err(HarError::io(
                    format!("Failed to read session descriptor {}", path.display()),
                    e,
                ))
            }
        };

        serde_json::from_slice(&content).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Unreadable session descriptor");
            HarError::Serialization {
                context: format!("Corrupt session descriptor {}", path.display()),
                source: e,
            }
        })
    }

    fn resolve_name(&self, name: &str) -> Result<String> {
        let name = name.trim().trim_end_matches(".json");
        if self.descriptor_path(name).exists() {
            return Ok(name.to_string());
        }

        let mut matches: Vec<String> = self
            .descriptor_ids()
            .into_iter()
            .filter(|id| id.starts_with(name))
            .collect();
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(HarError::SessionNotFound {
                name: name.to_string(),
            }),
            _ => Err(HarError::invalid_argument(
                "session",
                name,
                "prefix matches more than one session",
            )),
        }
    }

    fn descriptor_ids(&self) -> Vec<String> {
        let Ok(read_dir) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        read_dir
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == DESCRIPTOR_EXT))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect()
    }

    /// Summaries of every readable descriptor, newest first.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let active = self.active_id();
        let mut summaries: Vec<SessionSummary> = self
            .descriptor_ids()
            .into_iter()
            .filter_map(|id| {
                let content = fs::read(self.descriptor_path(&id)).ok()?;
                let session: Session = serde_json::from_slice(&content).ok()?;
                Some(SessionSummary {
                    active: active.as_deref() == Some(session.id()),
                    id: session.id().to_string(),
                    source_file: session.source_file,
                    entries: session.entries.len(),
                    created_at: session.created_at,
                })
            })
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Remove descriptors older than the TTL. Returns how many were removed.
    ///
    /// Best-effort: unreadable entries and failed removals are skipped.
    pub fn clean_expired_sessions(&self) -> usize {
        let Ok(read_dir) = fs::read_dir(&self.dir) else {
            return 0;
        };
        let now = SystemTime::now();
        let mut removed = 0;

        for path in read_dir.filter_map(|e| e.ok()).map(|e| e.path()) {
            if !path.extension().is_some_and(|ext| ext == DESCRIPTOR_EXT) {
                continue;
            }
            let expired = fs::metadata(&path)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > self.ttl);
            if !expired {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Failed to remove expired session");
                }
            }
        }
        removed
    }
}

fn ensure_fresh(session: &Session, bytes: &[u8]) -> Result<()> {
    if content_hash(bytes) == session.source_hash {
        Ok(())
    } else {
        warn!(path = %session.source_file.display(), "Capture changed since load");
        Err(HarError::StaleSession {
            path: session.source_file.clone(),
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CAPTURE: &str = r#"{"log":{"entries":[
        {"time":5,"request":{"method":"GET","url":"https://a.com/x"},"response":{"status":200}},
        {"time":7,"request":{"method":"GET","url":"https://b.com/y"},"response":{"status":404}}
    ]}}"#;

    fn setup() -> (TempDir, SessionManager, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let manager = SessionManager::new(dir.path().join("sessions"), Duration::from_secs(3600));
        let capture = dir.path().join("capture.har");
        fs::write(&capture, CAPTURE).unwrap();
        (dir, manager, capture)
    }

    #[test]
    fn test_no_session_before_load() {
        let (_dir, manager, _) = setup();
        assert!(matches!(manager.load_session(None), Err(HarError::NoSession)));
    }

    #[test]
    fn test_create_then_load() {
        let (_dir, manager, capture) = setup();
        let created = manager.create_session(&capture).unwrap();
        assert_eq!(created.entries.len(), 2);
        assert_eq!(created.stats.error_count, 1);

        let loaded = manager.load_session(None).unwrap();
        assert_eq!(loaded.source_hash, created.source_hash);
        assert_eq!(loaded.entries, created.entries);

        let by_prefix = manager.load_session(Some(&created.id()[..6])).unwrap();
        assert_eq!(by_prefix.id(), created.id());
    }

    #[test]
    fn test_create_session_from_str_and_string_paths() {
        let (_dir, manager, capture) = setup();
        let as_str = capture.to_str().unwrap();

        let first = manager.create_session(as_str).unwrap();
        let second = manager.create_session(as_str.to_string()).unwrap();
        assert_eq!(first.source_hash, second.source_hash);
        assert_eq!(manager.load_session(None).unwrap().entries.len(), 2);
    }

    #[test]
    fn test_descriptor_has_no_bodies() {
        let (_dir, manager, capture) = setup();
        let session = manager.create_session(&capture).unwrap();
        let json = fs::read_to_string(manager.descriptor_path(session.id())).unwrap();
        assert!(json.contains("\"sourceFile\""));
        assert!(json.contains("\"sourceHash\""));
        assert!(json.contains("\"createdAt\""));
        assert!(!json.contains("\"request\""));
    }

    #[test]
    fn test_stale_session_detected() {
        let (_dir, manager, capture) = setup();
        manager.create_session(&capture).unwrap();

        fs::write(&capture, CAPTURE.replace("404", "500")).unwrap();

        assert!(matches!(
            manager.load_session(None),
            Err(HarError::StaleSession { .. })
        ));
        assert!(matches!(manager.open(None), Err(HarError::StaleSession { .. })));
    }

    #[test]
    fn test_reload_replaces_active() {
        let (dir, manager, capture) = setup();
        let first = manager.create_session(&capture).unwrap();

        let other = dir.path().join("other.har");
        fs::write(&other, CAPTURE.replace("b.com", "c.com")).unwrap();
        let second = manager.create_session(&other).unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(manager.load_session(None).unwrap().id(), second.id());
        assert_eq!(manager.list_sessions().len(), 2);
        assert!(manager.list_sessions().iter().any(|s| s.active && s.id == second.id()));
    }

    #[test]
    fn test_open_returns_capture() {
        let (_dir, manager, capture) = setup();
        manager.create_session(&capture).unwrap();
        let (session, har) = manager.open(None).unwrap();
        assert_eq!(session.entries.len(), har.entries().len());
    }

    #[test]
    fn test_clean_expired_sessions() {
        let (_dir, manager, capture) = setup();
        manager.create_session(&capture).unwrap();

        let keep = SessionManager::new(manager.dir(), Duration::from_secs(3600));
        assert_eq!(keep.clean_expired_sessions(), 0);

        std::thread::sleep(Duration::from_millis(20));
        let expire = SessionManager::new(manager.dir(), Duration::from_millis(1));
        assert_eq!(expire.clean_expired_sessions(), 1);
        assert!(matches!(expire.load_session(None), Err(HarError::NoSession)));
    }

    #[test]
    fn test_clean_missing_dir_is_silent() {
        let manager = SessionManager::new("/nonexistent/harscope/sessions", Duration::from_secs(1));
        assert_eq!(manager.clean_expired_sessions(), 0);
    }

    #[test]
    fn test_unknown_session_name() {
        let (_dir, manager, capture) = setup();
        manager.create_session(&capture).unwrap();
        assert!(matches!(
            manager.load_session(Some("ffffffffffffffff")),
            Err(HarError::SessionNotFound { .. })
        ));
    }
}
