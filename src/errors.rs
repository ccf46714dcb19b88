use std::path::PathBuf;
use thiserror::Error;

/// Every way a single yapi invocation can fail.
///
/// All of them are terminal: the binary prints the message and exits.
#[derive(Error, Debug)]
pub enum YapiError {
    /// Malformed or missing command line input.
    #[error("{0}")]
    Argument(String),

    /// Malformed input: a config file that is unreadable or not valid YAML,
    /// or a response body that claims to be JSON but is not.
    #[error("couldn't parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("{0}")]
    NotFound(String),

    /// A request definition whose fields have the wrong shape.
    #[error("request `{request}`: {reason}")]
    Decode { request: String, reason: String },

    #[error("couldn't build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("file has no line {0}")]
    OutOfRange(usize),

    /// The session cookie jar could not be written.
    #[error("couldn't save session `{session}` to {}: {reason}", path.display())]
    Session {
        session: String,
        path: PathBuf,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl YapiError {
    pub fn parse(what: impl Into<String>, reason: impl ToString) -> YapiError {
        YapiError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(request: &str, reason: impl Into<String>) -> YapiError {
        YapiError::Decode {
            request: request.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, YapiError>;
