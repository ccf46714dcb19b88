use crate::errors::{Result, YapiError};
use crate::http_request_executor::HttpResponse;
use serde::de::IgnoredAny;
use std::io::Write;

const INDENT: &[u8] = b"  ";

/// Writes `res` the way yapi shows it on the terminal.
///
/// Status line, optionally the headers, then the body. JSON bodies (any
/// content type containing `application/json`) are re-indented without
/// touching their tokens; a body that claims to be JSON but does not parse
/// is an error.
pub fn print_response<W: Write>(
    out: &mut W,
    res: &HttpResponse,
    display_headers: bool,
) -> Result<()> {
    writeln!(out, "{}", status_line(res))?;
    writeln!(out)?;

    if display_headers {
        for (name, value) in &res.headers {
            writeln!(
                out,
                "{}: {}",
                canonical_header_name(name.as_str()),
                String::from_utf8_lossy(value.as_bytes())
            )?;
        }
        writeln!(out)?;
    }

    if res.content_type().contains("application/json") {
        out.write_all(&indent_json(&res.body)?)?;
        writeln!(out)?;
    } else {
        out.write_all(&res.body)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Re-indents a JSON document with two spaces per level.
///
/// Only whitespace between tokens changes. Numbers, string escapes and
/// duplicate keys come out exactly as the server sent them.
pub fn indent_json(src: &[u8]) -> Result<Vec<u8>> {
    serde_json::from_slice::<IgnoredAny>(src)
        .map_err(|e| YapiError::parse("json response body", e))?;

    let mut dst = Vec::with_capacity(src.len() * 2);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    // an opening bracket whose newline waits on the next token, so that
    // empty `{}` and `[]` stay on one line
    let mut open_pending = false;

    for &c in src {
        if in_string {
            dst.push(c);
            if escaped {
                escaped = false;
            } else if c == b'\\' {
                escaped = true;
            } else if c == b'"' {
                in_string = false;
            }
            continue;
        }
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => {}
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if !open_pending {
                    newline(&mut dst, depth);
                }
                open_pending = false;
                dst.push(c);
            }
            _ => {
                if open_pending {
                    newline(&mut dst, depth);
                    open_pending = false;
                }
                dst.push(c);
                match c {
                    b'{' | b'[' => {
                        depth += 1;
                        open_pending = true;
                    }
                    b',' => newline(&mut dst, depth),
                    b':' => dst.push(b' '),
                    b'"' => in_string = true,
                    _ => {}
                }
            }
        }
    }
    Ok(dst)
}

fn newline(dst: &mut Vec<u8>, depth: usize) {
    dst.push(b'\n');
    for _ in 0..depth {
        dst.extend_from_slice(INDENT);
    }
}

fn status_line(res: &HttpResponse) -> String {
    match res.status.canonical_reason() {
        Some(reason) => format!("{} {}", res.status.as_u16(), reason),
        None => res.status.as_u16().to_string(),
    }
}

/// `content-type` -> `Content-Type`
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}
