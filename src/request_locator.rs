use crate::config::is_reserved_key;
use crate::errors::{Result, YapiError};
use regex::Regex;
use std::sync::OnceLock;

// An unindented `key:` line, i.e. a top-level YAML key without inline value
fn top_level_key() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\S.*):$").unwrap())
}

/// Finds the request whose block encloses `line` (zero based) in `source`.
///
/// Walks upward from `line` to the nearest top-level key that is not a
/// settings key. The first line of the file is never considered.
pub fn find_request_name(source: &str, line: usize) -> Result<String> {
    let lines: Vec<&str> = source
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    if line >= lines.len() {
        return Err(YapiError::OutOfRange(line));
    }

    let re = top_level_key();
    for row in (1..=line).rev() {
        if let Some(caps) = re.captures(lines[row]) {
            let key = &caps[1];
            if !is_reserved_key(key) {
                return Ok(key.to_string());
            }
        }
    }
    Err(YapiError::NotFound(format!(
        "unable to find request near line {}",
        line
    )))
}
