//! Loading of yapi config files.
//!
//! A config file is a single YAML mapping. A handful of top-level keys
//! configure the tool itself, every other top-level key names a request.

use crate::errors::{Result, YapiError};
use crate::http_request::{resolve, ResolvedRequest};
use crate::request_locator::find_request_name;
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level keys that configure yapi rather than name a request.
pub const RESERVED_KEYS: [&str; 4] = ["root", "headers", "output", "session"];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Read access to a loaded config, independent of where it came from.
pub trait Config {
    fn display_headers(&self) -> bool;
    fn request_names(&self) -> Vec<String>;
    fn find_request_name(&self, line: usize) -> Result<String>;
    fn new_request(&self, name: &str) -> Result<ResolvedRequest>;
    fn session_name(&self) -> &str;
}

/// The settings part of a config file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(deserialize_with = "null_as_default")]
    pub root: String,
    #[serde(deserialize_with = "null_as_default")]
    pub headers: BTreeMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub output: BTreeMap<String, bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub session: String,
}

// `headers:` with nothing after it parses as null
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A config backed by a YAML document.
///
/// Holds two views of the same document: the typed [`Settings`] and the raw
/// top-level mapping the requests are looked up in. The source text is kept
/// for line based lookups.
#[derive(Debug, Clone)]
pub struct YamlConfig {
    path: PathBuf,
    settings: Settings,
    requests: Mapping,
    source: String,
}

impl YamlConfig {
    pub fn load(path: &Path) -> Result<YamlConfig> {
        let source =
            fs::read_to_string(path).map_err(|e| YapiError::parse(path.display().to_string(), e))?;
        let config = YamlConfig::from_source(path, source)?;
        debug!(
            "loaded {} with {} requests",
            path.display(),
            config.request_names().len()
        );
        Ok(config)
    }

    pub fn from_source(path: &Path, source: String) -> Result<YamlConfig> {
        let parse_error = |reason: String| YapiError::parse(path.display().to_string(), reason);

        let mut document: Value =
            serde_yaml::from_str(&source).map_err(|e| parse_error(e.to_string()))?;
        // `<<: *anchor` merge keys
        document
            .apply_merge()
            .map_err(|e| parse_error(e.to_string()))?;
        let requests = match document {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            _ => return Err(parse_error("expected a mapping at the top level".to_string())),
        };
        if let Some(key) = requests.keys().find(|k| !k.is_string()) {
            return Err(parse_error(format!(
                "top-level key {} is not a string",
                describe(key)
            )));
        }
        let settings: Settings = serde_yaml::from_value(Value::Mapping(requests.clone()))
            .map_err(|e| parse_error(e.to_string()))?;

        Ok(YamlConfig {
            path: path.to_path_buf(),
            settings,
            requests,
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

impl Config for YamlConfig {
    fn display_headers(&self) -> bool {
        self.settings.output.get("headers").copied().unwrap_or(false)
    }

    fn request_names(&self) -> Vec<String> {
        self.requests
            .keys()
            .filter_map(Value::as_str)
            .filter(|key| !is_reserved_key(key))
            .map(str::to_string)
            .collect()
    }

    fn find_request_name(&self, line: usize) -> Result<String> {
        find_request_name(&self.source, line)
    }

    fn new_request(&self, name: &str) -> Result<ResolvedRequest> {
        resolve(&self.settings, &self.requests, name)
    }

    fn session_name(&self) -> &str {
        &self.settings.session
    }
}

/// Short human readable description of a YAML value's kind.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean `{}`", b),
        Value::Number(n) => format!("number `{}`", n),
        Value::String(s) => format!("string `{}`", s),
        Value::Sequence(_) => "a sequence".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(t) => format!("tagged value `{}`", t.tag),
    }
}
