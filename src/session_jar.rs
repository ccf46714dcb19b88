//! On-disk cookie storage, one file per session name.

use crate::errors::{Result, YapiError};
use cookie_store::{CookieError, CookieStore};
use reqwest_cookie_store::CookieStoreMutex;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Default location of a session's jar: `<cache dir>/yapi/<session>.jar.json`.
pub fn default_jar_path(session: &str) -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("yapi").join(format!("{}.jar.json", session)))
}

/// The cookie store shared with the HTTP client, plus where to persist it.
///
/// A jar without a path lives in memory only.
pub struct SessionJar {
    session: String,
    path: Option<PathBuf>,
    store: Arc<CookieStoreMutex>,
}

impl SessionJar {
    pub fn in_memory() -> SessionJar {
        SessionJar {
            session: String::new(),
            path: None,
            store: Arc::new(CookieStoreMutex::default()),
        }
    }

    /// Opens the jar for `session` at `path`.
    ///
    /// A missing or unreadable file starts an empty jar; the file is only a
    /// cache and is overwritten on the next save.
    pub fn open(session: &str, path: PathBuf) -> SessionJar {
        let store = match load_store(&path) {
            Ok(Some(store)) => {
                debug!("loaded session `{}` from {}", session, path.display());
                store
            }
            Ok(None) => CookieStore::default(),
            Err(reason) => {
                warn!(
                    "discarding unreadable session `{}` at {}: {}",
                    session,
                    path.display(),
                    reason
                );
                CookieStore::default()
            }
        };
        SessionJar {
            session: session.to_string(),
            path: Some(path),
            store: Arc::new(CookieStoreMutex::new(store)),
        }
    }

    pub fn store(&self) -> Arc<CookieStoreMutex> {
        Arc::clone(&self.store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Writes the jar to disk. Does nothing for in-memory jars.
    pub fn save(&self) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };
        self.write_to(path).map_err(|reason| YapiError::Session {
            session: self.session.clone(),
            path: path.clone(),
            reason,
        })?;
        debug!("saved session `{}` to {}", self.session, path.display());
        Ok(())
    }

    fn write_to(&self, path: &Path) -> std::result::Result<(), String> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| e.to_string())?;

        let mut file = NamedTempFile::new_in(dir).map_err(|e| e.to_string())?;
        {
            let store = self
                .store
                .lock()
                .map_err(|_| "cookie store lock poisoned".to_string())?;
            // session cookies are kept, expired ones dropped
            let live = CookieStore::from_cookies(
                store.iter_unexpired().map(|c| Ok::<_, CookieError>(c.clone())),
                false,
            )
            .map_err(|e| e.to_string())?;
            let mut writer = BufWriter::new(file.as_file_mut());
            live.save_incl_expired_and_nonpersistent_json(&mut writer)
                .map_err(|e| e.to_string())?;
            writer.flush().map_err(|e| e.to_string())?;
        }
        file.persist(path).map_err(|e| e.error.to_string())?;
        Ok(())
    }
}

fn load_store(path: &Path) -> std::result::Result<Option<CookieStore>, String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };
    CookieStore::load_json_all(BufReader::new(file))
        .map(Some)
        .map_err(|e| e.to_string())
}
