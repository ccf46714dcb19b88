pub mod cli;
pub mod config;
pub mod errors;
pub mod execute;
pub mod http_request;
pub mod http_request_executor;
pub mod request_locator;
pub mod response_printer;
pub mod session_jar;

pub use config::{Config, YamlConfig};
pub use errors::YapiError;
