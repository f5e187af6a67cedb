//! catalyst cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the region stacks would be created in
    Region(RegionCommand),

    /// Merge template documents and print the result
    Template(TemplateCommand),

    /// Print the create-stack request for a template and configuration
    ///
    /// Nothing is sent to the control-plane.
    Request(RequestCommand),
}

#[derive(Parser, Debug)]
pub struct RegionCommand {
    /// Timeout for the instance metadata lookup
    #[clap(long = "metadata-timeout-ms", default_value_t = 1000)]
    pub metadata_timeout_ms: u64,
}

#[derive(Parser, Debug)]
pub struct TemplateCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct RequestCommand {
    /// Stack name
    #[clap(short = 'n', long = "name")]
    pub name: String,

    /// Parameter as KEY=VALUE, or KEY alone to keep the previous value
    #[clap(short = 'p', long = "parameter")]
    pub parameters: Vec<String>,

    /// Tag as KEY=VALUE
    #[clap(short = 't', long = "tag", value_parser = parse_key_value)]
    pub tags: Vec<(String, String)>,

    /// Capability to acknowledge, e.g. CAPABILITY_IAM
    #[clap(short = 'c', long = "capability")]
    pub capabilities: Vec<String>,

    /// Send every parameter as UsePreviousValue
    #[clap(long = "carry-over")]
    pub carry_over: bool,

    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a template file (.json, .yaml, .yml)
    #[clap(short = 'f', long = "input-file")]
    pub files: Vec<PathBuf>,

    /// Load all template files from given directory
    #[clap(short = 'd', long = "input-dir")]
    pub directories: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {input:?}"))
}
