use crate::config::Config;
use crate::errors::Result;
use crate::http_request_executor::ExecutionContext;
use crate::response_printer::print_response;
use std::io::Write;
use tracing::debug;

/// Writes every request name in `config`, one per line.
pub fn list<W: Write>(config: &dyn Config, out: &mut W) -> Result<()> {
    for name in config.request_names() {
        writeln!(out, "    {}", name)?;
    }
    Ok(())
}

/// Resolves, sends and prints the request called `name`.
pub fn fetch<W: Write>(
    config: &dyn Config,
    name: &str,
    context: &ExecutionContext,
    out: &mut W,
) -> Result<()> {
    let request = config.new_request(name)?;
    debug!("running `{}`", request.name);
    let res = context.execute(&request)?;
    print_response(out, &res, config.display_headers())
}
