mod styling;
mod tables;

use anyhow::Result;
use bkpipe::config::OutputFormat;
use bkpipe::PipelineState;

pub use styling::{bright_green, bright_yellow, dim, magenta_bold};

/// Prints the `bkpipe` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("bkpipe"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Buildkite pipeline reconciler")
    );
}

/// Renders the observed state to stdout.
pub fn print_state(state: &PipelineState, format: OutputFormat, pretty: bool) -> Result<()> {
    match format {
        OutputFormat::Json if pretty => println!("{}", serde_json::to_string_pretty(state)?),
        OutputFormat::Json => println!("{}", serde_json::to_string(state)?),
        OutputFormat::Table => {
            println!("{}", tables::state_table(state)?);
            if !state.is_complete() {
                eprintln!(
                    "{}",
                    bright_yellow("Pipeline only partially observed; re-run `bkpipe update` or `bkpipe read`")
                );
            }
        }
    }

    Ok(())
}
