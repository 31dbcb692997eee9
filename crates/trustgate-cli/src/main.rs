//! CLI entry point for trustgate.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, and exit codes.
//! All business logic lives in the `trustgate-app` crate.

mod logging;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use trustgate_app::{
    EvaluateInput, SimulateInput, decision_exit_code, format_explain, load_config,
    render_markdown, render_summary, run_compile, run_evaluate, run_explain, run_simulate,
    serialize_json, write_text,
};
use trustgate_settings::{Overrides, ResolvedConfig};

#[derive(Parser, Debug)]
#[command(
    name = "trustgate",
    version,
    about = "Fail-closed evaluation of visually authored trust policies"
)]
struct Cli {
    /// Path to trustgate config TOML. A missing file means defaults.
    #[arg(long, default_value = "trustgate.toml", global = true)]
    config: Utf8PathBuf,

    /// Override profile (standard|uncached|result-cache).
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Override log format (pretty|compact|json). Logs always go to stderr.
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Override log filter (e.g. "debug" or "trustgate_app=trace").
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a stored policy against a context. Exit code: 0 allow, 2 deny, 3 throttle.
    Evaluate {
        /// Directory of stored policy documents (`*.json`).
        #[arg(long, default_value = "policies")]
        policies: Utf8PathBuf,

        /// Id of the policy to evaluate.
        #[arg(long)]
        policy: String,

        /// Evaluation context JSON file (`-` for stdin).
        #[arg(long)]
        context: Utf8PathBuf,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        /// Where to write the output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// What-if evaluation of an unsaved policy document, ignoring its status.
    Simulate {
        /// Policy document JSON file.
        #[arg(long)]
        policy: Utf8PathBuf,

        /// Evaluation context JSON file (`-` for stdin).
        #[arg(long)]
        context: Utf8PathBuf,

        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Compile a visual graph document into ordered expressions.
    Compile {
        /// Graph document JSON file (`-` for stdin).
        #[arg(long)]
        graph: Utf8PathBuf,

        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Explain a reason code or operator.
    Explain {
        /// The reason (e.g., "no_match") or operator (e.g., "greaterThan") to explain.
        identifier: String,
    },
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("trustgate error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    if let Commands::Explain { identifier } = &cli.cmd {
        return Ok(cmd_explain(identifier));
    }

    let config = resolve(&cli)?;
    logging::init_logging(&config.logging)?;

    match cli.cmd {
        Commands::Evaluate {
            policies,
            policy,
            context,
            format,
            output,
        } => {
            let context_text = read_input(&context).context("read context")?;
            let decision = run_evaluate(EvaluateInput {
                policies_dir: &policies,
                policy_id: &policy,
                context_text: &context_text,
                config: &config,
            })?;
            tracing::info!(policy = %policy, "{}", render_summary(&decision));
            let text = match format {
                OutputFormat::Json => serialize_json(&decision)?,
                OutputFormat::Markdown => render_markdown(&decision),
            };
            emit(output.as_deref(), &text)?;
            Ok(decision_exit_code(&decision))
        }
        Commands::Simulate {
            policy,
            context,
            format,
            output,
        } => {
            let policy_text = read_input(&policy).context("read policy")?;
            let context_text = read_input(&context).context("read context")?;
            let simulation = run_simulate(SimulateInput {
                policy_text: &policy_text,
                context_text: &context_text,
                config: &config,
            })?;
            tracing::info!("simulated: {}", render_summary(&simulation.decision));
            let text = match format {
                OutputFormat::Json => serialize_json(&simulation)?,
                OutputFormat::Markdown => render_markdown(&simulation.decision),
            };
            emit(output.as_deref(), &text)?;
            Ok(decision_exit_code(&simulation.decision))
        }
        Commands::Compile { graph, output } => {
            let graph_text = read_input(&graph).context("read graph")?;
            let compiled = run_compile(&graph_text, &config)?;
            emit(output.as_deref(), &serialize_json(&compiled)?)?;
            Ok(0)
        }
        Commands::Explain { .. } => Ok(0),
    }
}

fn resolve(cli: &Cli) -> anyhow::Result<ResolvedConfig> {
    let config_text = if cli.config.exists() {
        Some(
            std::fs::read_to_string(&cli.config)
                .with_context(|| format!("read config: {}", cli.config))?,
        )
    } else {
        None
    };
    let overrides = Overrides {
        profile: cli.profile.clone(),
        log_format: cli.log_format.clone(),
        log_filter: cli.log_filter.clone(),
    };
    load_config(config_text.as_deref(), overrides)
}

fn read_input(path: &Utf8Path) -> anyhow::Result<String> {
    if path.as_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("read {}", path))
}

fn emit(output: Option<&Utf8Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => write_text(path, text).context("write output"),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn cmd_explain(identifier: &str) -> i32 {
    let output = run_explain(identifier);
    let text = format_explain(&output);
    if output.is_found() {
        print!("{text}");
        0
    } else {
        eprint!("{text}");
        1
    }
}
