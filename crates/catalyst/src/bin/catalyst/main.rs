mod cli;

use catalyst::remote::{
    ClientError, CloudFormation, CreateStackRequest, RemoteStack, UpdateStackRequest,
};
use catalyst::template::Template;
use serde::Serialize;
use std::time::Duration;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("CATALYST_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Region(region_cli) => region(region_cli),
        cli::Command::Template(template_cli) => template(template_cli),
        cli::Command::Request(request_cli) => request(request_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn region(cli: cli::RegionCommand) -> anyhow::Result<()> {
    let resolver = catalyst::region::RegionResolver::new(
        catalyst::region::ProfileSession::from_env(),
        Duration::from_millis(cli.metadata_timeout_ms),
    );

    println!("{}", catalyst::region::require_region(&resolver)?);
    Ok(())
}

pub fn template(cli: cli::TemplateCommand) -> anyhow::Result<()> {
    let template = load(&cli.input)?;
    output(&cli.output, template.body())
}

/// Run `create` against a client that prints the request instead of sending it
pub fn request(cli: cli::RequestCommand) -> anyhow::Result<()> {
    let template = load(&cli.input)?;

    let mut stack = catalyst::stack::Stack::new(&cli.name, DryRun(cli.output));
    for parameter in &cli.parameters {
        match parameter.split_once('=') {
            Some((key, value)) => stack.with_parameter(key, value),
            None => stack.with_previous_parameter(parameter),
        };
    }
    for (key, value) in &cli.tags {
        stack.with_tag(key, value);
    }
    for capability in &cli.capabilities {
        stack.with_capability(capability);
    }
    if cli.carry_over {
        stack.carry_over_parameters();
    }

    stack.create(template.render()?)?;
    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Template> {
    let mut template = Template::new();

    if input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        template.with_documents([stdin])?;
        return Ok(template);
    }

    for file_path in &input.files {
        template.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        template.load_directory(dir_path)?;
    }

    Ok(template)
}

fn output(output: &cli::OutputArgs, value: &impl Serialize) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => {
            serde_json::to_writer_pretty(std::io::stdout(), value)?;
            println!();
        }
    };

    Ok(())
}

struct DryRun(cli::OutputArgs);

struct DryRunStack;

impl CloudFormation for DryRun {
    type Stack = DryRunStack;

    fn create_stack(&self, request: &CreateStackRequest) -> Result<DryRunStack, ClientError> {
        output(&self.0, request).map_err(|e| ClientError::Transport(e.into()))?;
        Ok(DryRunStack)
    }
}

impl RemoteStack for DryRunStack {
    fn update(&self, _request: &UpdateStackRequest) -> Result<(), ClientError> {
        Ok(())
    }

    fn delete(&self) -> Result<(), ClientError> {
        Ok(())
    }
}
