mod config;
mod inputs;
mod logging;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use config::{ConfigError, Overrides, Settings, load_settings};
use fanout_core::TargetRegistry;
use fanout_generate::{GenerationEngine, GenerationError, write_targets};
use fanout_spec::{
    IssueSeverity, ManifestSet, SpecError, SpecOptions, ValidatedSpec, ValidationIssue,
    application_set_json_schema,
};
use inputs::read_sources;
use logging::{LogFormat, init_logging};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Input(#[from] SpecError),
    #[error("{0}")]
    Generation(#[from] GenerationError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("{0} specification(s) failed validation")]
    Invalid(usize),
    #[error("logging setup failed: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(
    name = "fanout",
    version,
    about = "Preview the targets a generator tree expands into"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand specifications into target definitions.
    Generate(GenerateArgs),
    /// Validate specifications and report every issue.
    Validate(ValidateArgs),
    /// Print the JSON Schema of specification manifests.
    Schema,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Manifest sources (specifications and cluster secrets); stdin when empty.
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,
    /// Registry sources holding cluster secrets.
    #[arg(long, value_name = "PATH", value_delimiter = ',')]
    registry: Vec<PathBuf>,
    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Namespace for targets whose template and specification set none.
    #[arg(long, value_name = "NS")]
    default_namespace: Option<String>,
    /// Skip failing specifications instead of aborting.
    #[arg(long, default_value_t = false)]
    continue_on_error: bool,
    /// Output file; stdout when omitted.
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Manifest sources; stdin when empty.
    #[arg(value_name = "INPUT")]
    inputs: Vec<PathBuf>,
    /// TOML configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = init_logging(cli.verbose, cli.log_format)
        .map_err(CliError::Logging)
        .and_then(|()| match cli.command {
            Command::Generate(args) => run_generate(args),
            Command::Validate(args) => run_validate(args),
            Command::Schema => run_schema(),
        });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let settings = load_optional_settings(args.config.as_ref())?;
    let options = settings.generate_options(&Overrides {
        default_namespace: args.default_namespace,
        continue_on_error: args.continue_on_error,
    });

    let mut manifests = read_sources(&args.inputs)?;
    if !args.registry.is_empty() {
        manifests.extend(read_sources(&args.registry)?);
    }

    let specs = validate_all(&manifests, &settings.spec_options(), |label, issue| {
        match issue.severity {
            IssueSeverity::Error => {
                eprintln!("{label}: {}", format_issue(issue));
            }
            IssueSeverity::Warning => {
                warn!(source = %label, code = %issue.code, path = %issue.path, "{}", issue.message);
            }
        }
    })?;

    let registry = if args.registry.is_empty() && manifests.secrets.is_empty() {
        None
    } else {
        Some(manifests.registry()?)
    };

    info!(
        specs = specs.len(),
        records = registry.as_ref().map_or(0, |registry| registry.len()),
        non_specs = manifests.secrets.len() + manifests.skipped,
        ignored_secrets = manifests.non_cluster_secrets(),
        "processing inputs"
    );

    let engine = GenerationEngine::new(options);
    let result = engine.run(
        &specs,
        registry
            .as_ref()
            .map(|registry| registry as &dyn TargetRegistry),
    )?;

    for failure in &result.report.failures {
        eprintln!("skipped {}: {}", failure.spec, failure.message);
    }

    match &args.out {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            write_targets(writer, &result.targets)?;
            info!(path = %path.display(), targets = result.targets.len(), "targets written");
        }
        None => {
            let stdout = io::stdout();
            write_targets(stdout.lock(), &result.targets)?;
        }
    }

    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let settings = load_optional_settings(args.config.as_ref())?;
    let manifests = read_sources(&args.inputs)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut printed: Result<(), io::Error> = Ok(());
    let specs = validate_all(&manifests, &settings.spec_options(), |label, issue| {
        if printed.is_ok() {
            printed = writeln!(out, "{label}: {}", format_issue(issue));
        }
    });
    printed?;
    let specs = specs?;

    writeln!(
        out,
        "{} specification(s) valid, {} secret(s), {} skipped document(s)",
        specs.len(),
        manifests.secrets.len(),
        manifests.skipped
    )?;
    Ok(())
}

fn run_schema() -> Result<(), CliError> {
    let schema = application_set_json_schema();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &schema)?;
    writeln!(out)?;
    Ok(())
}

fn load_optional_settings(path: Option<&PathBuf>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Ok(load_settings(path)?),
        None => Ok(Settings::default()),
    }
}

/// Validate every specification document, reporting each issue through
/// `report`. Fails when any document has errors.
fn validate_all(
    manifests: &ManifestSet,
    options: &SpecOptions,
    mut report: impl FnMut(&str, &ValidationIssue),
) -> Result<Vec<ValidatedSpec>, CliError> {
    let schema = serde_json::to_value(application_set_json_schema())?;
    let mut specs = Vec::with_capacity(manifests.specs.len());
    let mut invalid = 0;

    for document in &manifests.specs {
        let label = document.label();
        match document.validate(&schema, options) {
            Ok(spec) => {
                for issue in &spec.warnings {
                    report(&label, issue);
                }
                specs.push(spec);
            }
            Err(issues) => {
                invalid += 1;
                for issue in issues.errors.iter().chain(issues.warnings.iter()) {
                    report(&label, issue);
                }
            }
        }
    }

    if invalid > 0 {
        return Err(CliError::Invalid(invalid));
    }
    Ok(specs)
}

fn format_issue(issue: &ValidationIssue) -> String {
    let severity = match issue.severity {
        IssueSeverity::Error => "error",
        IssueSeverity::Warning => "warning",
    };
    let mut line = format!("{severity} {} {}: {}", issue.code, issue.path, issue.message);
    if let Some(hint) = &issue.hint {
        line.push_str("\n  hint: ");
        line.push_str(hint);
    }
    line
}
