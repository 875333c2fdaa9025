//! stb CLI — driving adapter for the stb display-rule engine.
//!
//! Subcommands:
//! - `eval <site>    [--context key=value...]` — matched and shown box ids
//! - `payload <site> [--context key=value...]` — client-side configuration
//! - `render <site>  [--context key=value...]` — box markup
//! - `explain <site> [--context key=value...]` — per-rule evaluation trace
//! - `check <site>` — validate rules without evaluating them

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stb::prelude::*;
use stb::{trace_box, ConditionKind, ConfigError, Expr};
use stb_test::ContextError;

#[derive(Parser)]
#[command(name = "stb")]
#[command(version, about = "Decide which scroll-triggered boxes a page view shows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log engine decisions (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print matched and shown box ids
    Eval(RequestArgs),

    /// Print the client-side payload
    Payload {
        #[command(flatten)]
        request: RequestArgs,

        /// Print bare JSON instead of a script assignment
        #[arg(long)]
        json: bool,
    },

    /// Print the box markup
    Render(RequestArgs),

    /// Explain every box decision rule by rule
    Explain(RequestArgs),

    /// Validate conditions and manual expressions
    Check {
        /// Site file (.yaml, .yml or .json)
        site: PathBuf,
    },
}

#[derive(clap::Args)]
struct RequestArgs {
    /// Site file (.yaml, .yml or .json)
    site: PathBuf,

    /// Page view as key=value pairs (type, id, slug, title, post_type, path, flags)
    #[arg(long, num_args = 1.., value_parser = parse_pair)]
    context: Vec<(String, String)>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("failed to serialize payload: {0}")]
    Payload(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "stb=debug" } else { "stb=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

fn run(command: Commands) -> Result<ExitCode, CliError> {
    match command {
        Commands::Eval(request) => cmd_eval(&request),
        Commands::Payload { request, json } => cmd_payload(&request, json),
        Commands::Render(request) => cmd_render(&request),
        Commands::Explain(request) => cmd_explain(&request),
        Commands::Check { site } => cmd_check(&SiteConfig::load(site)?),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_eval(request: &RequestArgs) -> Result<ExitCode, CliError> {
    let loaded = Loaded::new(request)?;
    let scope = loaded.scope();

    println!("matched: {}", format_ids(scope.matched_ids().iter()));
    println!(
        "shown:   {}",
        format_ids(scope.matched_boxes().iter().map(|m| m.post.id))
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_payload(request: &RequestArgs, json: bool) -> Result<ExitCode, CliError> {
    let loaded = Loaded::new(request)?;
    let payload = loaded.scope().payload();

    if json {
        println!("{}", payload.to_json()?);
    } else {
        println!("{}", payload.to_script(&loaded.site.settings.script_var)?);
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_render(request: &RequestArgs) -> Result<ExitCode, CliError> {
    let loaded = Loaded::new(request)?;
    let markup = loaded.scope().render();
    if !markup.is_empty() {
        println!("{markup}");
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_explain(request: &RequestArgs) -> Result<ExitCode, CliError> {
    let loaded = Loaded::new(request)?;
    for record in &loaded.site.boxes {
        let trace = trace_box(record.id, &record.rules, &loaded.page, &loaded.hooks);
        println!("{trace}");
        if !record.status.is_published() {
            println!("  (status {}, never shown)", record.status.as_str());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_check(site: &SiteConfig) -> Result<ExitCode, CliError> {
    let problems = check_site(site);
    if problems.is_empty() {
        println!("Site valid: {} boxes", site.boxes.len());
        return Ok(ExitCode::SUCCESS);
    }
    for problem in &problems {
        println!("{problem}");
    }
    Ok(ExitCode::from(2))
}

/// Every rule that can never match because it is malformed.
fn check_site(site: &SiteConfig) -> Vec<String> {
    let mut problems = Vec::new();
    for record in &site.boxes {
        for (i, rule) in record.rules.rules().iter().enumerate() {
            match &rule.condition {
                ConditionKind::Unknown(name) => {
                    problems.push(format!("box {} rule {i}: unknown condition `{name}`", record.id));
                }
                ConditionKind::Manual => {
                    if let Err(e) = Expr::parse(rule.value.trim()) {
                        problems.push(format!("box {} rule {i}: {e}", record.id));
                    }
                }
                _ => {}
            }
        }
    }
    problems
}

// ═══════════════════════════════════════════════════════════════════════════════
// Composition root
// ═══════════════════════════════════════════════════════════════════════════════

/// A loaded site, wired up for one page view.
struct Loaded {
    site: SiteConfig,
    store: MemoryStore,
    hooks: Hooks,
    page: PageView,
}

impl Loaded {
    fn new(request: &RequestArgs) -> Result<Self, CliError> {
        let site = SiteConfig::load(&request.site)?;
        let page = stb_test::page_view(request.context.iter().map(|(k, v)| (k, v)))?;
        debug!(path = %request.site.display(), boxes = site.boxes.len(), "site loaded");
        Ok(Self {
            store: MemoryStore::from(&site),
            hooks: HooksBuilder::standard(ShortcodeRegistry::new()).build(),
            site,
            page,
        })
    }

    fn scope(&self) -> RequestScope<'_> {
        RequestScope::new(&self.page, &self.store, &self.hooks, &self.site.settings)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Argument parsing
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_pair(pair: &str) -> Result<(String, String), String> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| format!("invalid context pair \"{pair}\", expected key=value"))?;
    Ok((key.to_owned(), value.to_owned()))
}

fn format_ids(ids: impl Iterator<Item = BoxId>) -> String {
    let ids: Vec<String> = ids.map(|id| id.to_string()).collect();
    if ids.is_empty() {
        "(none)".to_string()
    } else {
        ids.join(", ")
    }
}
