//! flowhand - declarative browser workflow runner
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use flowhand::browser::AgentBrowserFactory;
use flowhand::core::{Config, Environment, FlowError};
use flowhand::runner;
use flowhand::workflow::{builtin, ErrorInfo, Variables, Workflow, WorkflowResult};
use tracing_subscriber::EnvFilter;

/// flowhand - run a browser workflow once
#[derive(Parser, Debug)]
#[command(name = "flowhand")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Workflow definition (.toml or .json); defaults to the built-in purchase flow
    #[arg(long, short = 'w')]
    workflow: Option<PathBuf>,

    /// Override a workflow variable (KEY=VALUE, repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,

    /// Session environment (local or remote)
    #[arg(long)]
    env: Option<String>,

    /// Model identifier, e.g. google/gemini-2.5-flash or ollama/qwen3:8b
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// CDP endpoint for remote browsers
    #[arg(long)]
    cdp: Option<String>,

    /// Run in headed browser mode (visible window)
    #[arg(long)]
    headed: bool,

    /// Increase log verbosity (repeatable)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate the workflow and list its steps without opening a browser
    #[arg(long)]
    check: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("flowhand={}", level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn apply_overrides(config: &mut Config, args: &Args) -> flowhand::Result<()> {
    if let Some(ref env) = args.env {
        config.capability.environment = env.parse::<Environment>()?;
    }

    if let Some(ref model) = args.model {
        config.capability.model = model.clone();
    }

    if let Some(ref cdp) = args.cdp {
        config.browser.cdp_url = Some(cdp.clone());
    }

    if args.headed {
        config.browser.headed = true;
    }

    if args.verbose > 0 {
        config.capability.verbosity = args.verbose;
    }

    Ok(())
}

fn load_workflow(args: &Args) -> flowhand::Result<Workflow> {
    let mut workflow = match &args.workflow {
        Some(path) => Workflow::from_file(path)?,
        None => builtin::purchase_flow(),
    };

    let overrides = args
        .vars
        .iter()
        .map(|raw| Variables::parse_assignment(raw))
        .collect::<flowhand::Result<Variables>>()?;
    workflow.variables.merge(&overrides);

    Ok(workflow)
}

fn report(result: &WorkflowResult) -> ! {
    println!("{}", runner::summary_line(result));
    std::process::exit(runner::exit_code(result));
}

fn setup_failure(error: FlowError) -> WorkflowResult {
    tracing::error!("Workflow failed: {}", error);
    WorkflowResult::failed(ErrorInfo::from_error(&error, None))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            init_logging(args.verbose.max(1));
            report(&setup_failure(e));
        }
    };
    if let Err(e) = apply_overrides(&mut config, &args) {
        init_logging(config.capability.verbosity);
        report(&setup_failure(e));
    }
    init_logging(config.capability.verbosity);

    if args.print_config {
        println!("{}", config.to_display_toml());
        return Ok(());
    }

    let workflow = match load_workflow(&args) {
        Ok(workflow) => workflow,
        Err(e) => report(&setup_failure(e)),
    };

    // Validation only
    if args.check {
        let steps = match workflow.resolve() {
            Ok(steps) => steps,
            Err(e) => report(&setup_failure(e)),
        };
        println!("{}: {} steps", workflow.label(), steps.len());
        for (i, (step, resolved)) in workflow.steps.iter().zip(&steps).enumerate() {
            let uses = step.references().unwrap_or_default();
            if uses.is_empty() {
                println!("  {}. {}", i + 1, resolved.describe());
            } else {
                println!("  {}. {} (uses {})", i + 1, resolved.describe(), uses.join(", "));
            }
        }
        return Ok(());
    }

    let factory = match AgentBrowserFactory::from_config(&config) {
        Ok(factory) => factory,
        Err(e) => report(&setup_failure(e)),
    };

    let result = runner::run_once(&workflow, Arc::new(factory)).await;
    report(&result)
}
