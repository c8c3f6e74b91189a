use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ivglue_contracts::{IVGLUE_DIAG_SCHEMA_VERSION, IVGLUE_REPORT_SCHEMA_VERSION, MIDDLEWARE_ID};
use ivglue_core::config::{load_config, BackendKind, GenerateOptions};
use ivglue_core::diagnostics::{all_codes, render_diagnostics_md, Diagnostic};
use ivglue_core::model_json::load_model;
use ivglue_core::output::{commit, CommittedFile, OutputMode, OutputRoot};
use ivglue_core::{generate_system, GlueError, ModelError};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ivglue")]
#[command(about = "Ada/PolyORB-HI glue generator for interface views.", long_about = None)]
struct Cli {
    /// Log routing decisions and session activity to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate wrapper packages and user skeletons for every function of a model.
    Generate(GenerateArgs),
    /// Print the diagnostics catalog.
    Diagnostics {
        /// Emit JSON instead of Markdown.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Interface model (`ivglue.model@0.1.0` JSON).
    #[arg(long)]
    model: PathBuf,
    /// Tool configuration (`ivglue.config@0.1.0` JSON).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output root (writes <out>/<function>/...). Defaults to the config's `output`, then `.`.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    only_cv: bool,
    #[arg(long, default_value_t = false)]
    polyorb_hi_c: bool,
    /// Restrict generation to these backends (repeatable).
    #[arg(long = "backend", value_parser = parse_backend)]
    backends: Vec<BackendKind>,
    /// If set, fail if any output differs; do not write.
    #[arg(long, default_value_t = false)]
    check: bool,
    /// Print a machine-readable report on stdout.
    #[arg(long, default_value_t = false)]
    report_json: bool,
}

#[derive(Debug, Serialize)]
struct GenerateReport {
    schema_version: &'static str,
    command: &'static str,
    ok: bool,
    exit_code: u8,
    middleware: &'static str,
    mode: OutputMode,
    files: Vec<CommittedFile>,
    diagnostics: Vec<Diagnostic>,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Generate(args) => cmd_generate(args),
        Command::Diagnostics { json } => cmd_diagnostics(json),
    }
}

fn init_tracing(verbose: u8) {
    let filter = if verbose > 0 {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_diagnostics(json: bool) -> Result<ExitCode> {
    if !json {
        print!("{}", render_diagnostics_md());
        return Ok(ExitCode::SUCCESS);
    }
    let codes: Vec<serde_json::Value> = all_codes()
        .iter()
        .map(|code| {
            serde_json::json!({
                "code": code.code_str(),
                "stage": code.stage(),
                "severity": code.severity(),
                "message": code.default_message(),
                "help": code.default_help(),
            })
        })
        .collect();
    let doc = serde_json::json!({
        "schema_version": IVGLUE_DIAG_SCHEMA_VERSION,
        "codes": codes,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(ExitCode::SUCCESS)
}

fn cmd_generate(args: GenerateArgs) -> Result<ExitCode> {
    let (options, out_root) = resolve_options(&args)?;
    let mode = if args.check {
        OutputMode::Check
    } else {
        OutputMode::Write
    };

    let mut report = GenerateReport {
        schema_version: IVGLUE_REPORT_SCHEMA_VERSION,
        command: "generate",
        ok: true,
        exit_code: 0,
        middleware: MIDDLEWARE_ID,
        mode,
        files: Vec::new(),
        diagnostics: Vec::new(),
    };

    // Model validation failures are reported like generation errors; I/O and decoding
    // failures are not.
    let generated = match load_model(&args.model) {
        Ok(system) => generate_system(&system, &options, &OutputRoot::new(&out_root)),
        Err(err) => match err.downcast_ref::<ModelError>() {
            Some(model_err) => Err(GlueError::from(model_err.clone())),
            None => return Err(err),
        },
    };

    match generated {
        Ok(generated) => {
            report.diagnostics = generated.diagnostics;
            report.files = commit(&generated.files, &out_root, mode)?;
            debug!(
                out = %out_root.display(),
                files = report.files.len(),
                "committed generated sources"
            );
        }
        Err(err) => {
            let diagnostic = Diagnostic::from(&err);
            if !args.report_json {
                eprintln!("{diagnostic}");
            }
            report.ok = false;
            report.exit_code = 2;
            report.diagnostics.push(diagnostic);
        }
    }

    if args.report_json {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(ExitCode::from(report.exit_code))
}

fn parse_backend(s: &str) -> Result<BackendKind, String> {
    s.parse::<BackendKind>().map_err(|err| err.to_string())
}

/// Config file values first, then command-line flags on top.
fn resolve_options(args: &GenerateArgs) -> Result<(GenerateOptions, PathBuf)> {
    let mut options = GenerateOptions::default();
    let mut out_root = None;

    if let Some(path) = &args.config {
        let cfg = load_config(path)?;
        options = cfg
            .to_options()
            .with_context(|| format!("config: {}", path.display()))?;
        out_root = cfg.output_dir(path);
    }

    options.only_cv |= args.only_cv;
    options.polyorb_hi_c |= args.polyorb_hi_c;
    if !args.backends.is_empty() {
        options.backends.clear();
        for kind in &args.backends {
            if !options.backends.contains(kind) {
                options.backends.push(*kind);
            }
        }
    }

    let out_root = args
        .out
        .clone()
        .or(out_root)
        .unwrap_or_else(|| Path::new(".").to_path_buf());
    Ok((options, out_root))
}
