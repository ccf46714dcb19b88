use crate::config::{describe, is_reserved_key, Settings};
use crate::errors::{Result, YapiError};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// A request as written in the config file, before any defaults apply.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestDefinition {
    pub path: String,
    pub method: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub body: Option<String>,
}

/// A request with the config's root URL and shared headers applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub name: String,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub body: String,
}

// A field of a request definition, keyed by its lowercase name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Path,
    Method,
    Headers,
    Params,
    Body,
}

impl Field {
    fn from_key(key: &str) -> Option<Field> {
        match key.to_lowercase().as_str() {
            "path" => Some(Field::Path),
            "method" => Some(Field::Method),
            "headers" => Some(Field::Headers),
            "params" => Some(Field::Params),
            "body" => Some(Field::Body),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Field::Path => "path",
            Field::Method => "method",
            Field::Headers => "headers",
            Field::Params => "params",
            Field::Body => "body",
        }
    }
}

impl RequestDefinition {
    /// Decodes the raw YAML value stored under `name`.
    ///
    /// Field names are matched case-insensitively and unknown fields are
    /// ignored. Values are never coerced: a number where a string is
    /// expected is an error naming the field.
    pub fn decode(name: &str, value: &Value) -> Result<RequestDefinition> {
        let mapping = match value {
            Value::Null => return Err(YapiError::decode(name, "missing field `path`")),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(YapiError::decode(
                    name,
                    format!("expected a mapping, found {}", describe(other)),
                ))
            }
        };

        let mut path = None;
        let mut definition = RequestDefinition::default();
        for (key, value) in mapping {
            let field = match key.as_str().and_then(Field::from_key) {
                Some(field) => field,
                None => continue,
            };
            match field {
                Field::Path => path = decode_string(name, field, value)?,
                Field::Method => definition.method = decode_string(name, field, value)?,
                Field::Body => definition.body = decode_string(name, field, value)?,
                Field::Headers => definition.headers = decode_string_map(name, field, value)?,
                Field::Params => definition.params = decode_string_map(name, field, value)?,
            }
        }
        definition.path = path.ok_or_else(|| YapiError::decode(name, "missing field `path`"))?;
        Ok(definition)
    }
}

fn decode_string(request: &str, field: Field, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        other => Err(YapiError::decode(
            request,
            format!(
                "field `{}` must be a string, found {}",
                field.name(),
                describe(other)
            ),
        )),
    }
}

fn decode_string_map(
    request: &str,
    field: Field,
    value: &Value,
) -> Result<BTreeMap<String, String>> {
    let mapping = match value {
        Value::Null => return Ok(BTreeMap::new()),
        Value::Mapping(mapping) => mapping,
        other => {
            return Err(YapiError::decode(
                request,
                format!(
                    "field `{}` must be a mapping, found {}",
                    field.name(),
                    describe(other)
                ),
            ))
        }
    };

    let mut map = BTreeMap::new();
    for (key, value) in mapping {
        let key = key.as_str().ok_or_else(|| {
            YapiError::decode(
                request,
                format!(
                    "field `{}` has non-string key {}",
                    field.name(),
                    describe(key)
                ),
            )
        })?;
        let value = value.as_str().ok_or_else(|| {
            YapiError::decode(
                request,
                format!(
                    "field `{}.{}` must be a string, found {}",
                    field.name(),
                    key,
                    describe(value)
                ),
            )
        })?;
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}

/// Builds the request named `name` from its definition and the settings.
pub fn resolve(settings: &Settings, requests: &Mapping, name: &str) -> Result<ResolvedRequest> {
    let raw = if is_reserved_key(name) {
        None
    } else {
        requests.get(name)
    };
    let raw = raw.ok_or_else(|| {
        YapiError::NotFound(format!("unable to find request named `{}`", name))
    })?;
    let definition = RequestDefinition::decode(name, raw)?;

    let method = match definition.method {
        Some(method) if !method.is_empty() => method,
        _ => "GET".to_string(),
    };

    let mut headers = definition.headers;
    for (key, value) in &settings.headers {
        headers.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Ok(ResolvedRequest {
        name: name.to_string(),
        method,
        url: format!("{}{}", settings.root, definition.path),
        headers,
        params: definition.params,
        body: definition.body.unwrap_or_default(),
    })
}
