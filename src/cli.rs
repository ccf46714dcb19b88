use crate::config::{Config, YamlConfig};
use crate::errors::YapiError;
use crate::execute::{fetch, list};
use crate::http_request_executor::{ExecutionContext, SaveFailurePolicy};
use anyhow::{Context, Result};
use clap::{arg, command, value_parser, ArgAction, ArgMatches, Command};
use regex::Regex;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

const EXAMPLES: &str = "\
EXAMPLES
  Run a route:
      yapi --name route path/to/my.yapi.yml
      yapi path/to/my.yapi.yml:10

  List available routes:
      yapi --list path/to/my.yapi.yml

The route nearest above the given line is run. Without a line number the
--name flag is required.

Set YAPI_LOG=debug to trace what yapi does.";

pub fn command() -> Command {
    command!("yapi")
        .about("run http requests defined in a yaml file")
        .after_help(EXAMPLES)
        .arg(
            arg!(<SOURCE_FILE> "config file, optionally suffixed with :<line>")
                .value_parser(value_parser!(String))
                .action(ArgAction::Set),
        )
        .arg(arg!(--list "List available route names").action(ArgAction::SetTrue))
        .arg(
            arg!(--name <ROUTE_NAME> "Run the named route")
                .value_parser(value_parser!(String))
                .action(ArgAction::Set),
        )
        .arg(
            arg!(--"strict-session" "Fail when the session cookies cannot be saved")
                .action(ArgAction::SetTrue),
        )
}

// `<path>:<line>`, the line being the digits after the last colon
fn line_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*):(\d+)$").unwrap())
}

/// The positional argument split into a file path and an optional line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceArg {
    pub path: PathBuf,
    pub line: Option<usize>,
}

/// Splits `path/to/file.yml:12` into the path and line 12.
///
/// Only a run of digits after the last colon counts as a line number;
/// anything else is part of the path.
pub fn parse_source_arg(arg: &str) -> std::result::Result<SourceArg, YapiError> {
    let (path, line) = match line_suffix().captures(arg) {
        Some(caps) => {
            let line = caps[2].parse::<usize>().map_err(|e| {
                YapiError::Argument(format!("invalid line number `{}`: {}", &caps[2], e))
            })?;
            (caps[1].to_string(), Some(line))
        }
        None => (arg.to_string(), None),
    };
    if path.is_empty() {
        return Err(YapiError::Argument("no source file provided".to_string()));
    }
    Ok(SourceArg {
        path: PathBuf::from(path),
        line,
    })
}

/// Runs the invocation described by `matches`, printing to `out`.
pub fn run<W: Write>(matches: &ArgMatches, out: &mut W) -> Result<()> {
    let source = matches
        .get_one::<String>("SOURCE_FILE")
        .ok_or_else(|| YapiError::Argument("no source file provided".to_string()))?;
    let source = parse_source_arg(source)?;

    let config = YamlConfig::load(&source.path)?;
    if matches.get_flag("list") {
        list(&config, out)?;
        return Ok(());
    }

    let name = match (matches.get_one::<String>("name"), source.line) {
        (Some(name), _) => name.clone(),
        (None, Some(line)) => config.find_request_name(line).with_context(|| {
            format!("while looking up line {} of {}", line, source.path.display())
        })?,
        (None, None) => {
            return Err(YapiError::Argument("no line or route name specified".to_string()).into())
        }
    };

    let policy = if matches.get_flag("strict-session") {
        SaveFailurePolicy::FailFast
    } else {
        SaveFailurePolicy::BestEffort
    };
    let context = ExecutionContext::new(config.session_name(), policy)?;
    fetch(&config, &name, &context, out).with_context(|| format!("while running `{}`", name))?;
    Ok(())
}
