//! Sitestack - static website infrastructure on AWS
//!
//! This is the main entry point for the Sitestack CLI.

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::output::OutputFormatter;
use cli::{Cli, Commands};
use sitestack::config::SiteConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Display version if verbose
    if cli.verbosity() >= 2 {
        eprintln!("Sitestack v{} by {}", VERSION, AUTHORS);
    }

    // Load configuration
    let config = match SiteConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::new(!cli.no_color, cli.is_json(), cli.verbosity())
                .error(&e.to_string());
            std::process::exit(e.exit_code());
        }
    };

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let result = match &cli.command {
        Commands::Synth(args) => args.execute(&mut ctx).await,
        Commands::Deploy(args) => args.execute(&mut ctx).await,
        Commands::Destroy(args) => args.execute(&mut ctx).await,
        Commands::Diff(args) => args.execute(&mut ctx).await,
        Commands::List(args) => args.execute(&mut ctx).await,
        Commands::Graph(args) => args.execute(&mut ctx).await,
        Commands::Context(args) => args.execute(&mut ctx).await,
        Commands::Completions(args) => args.execute(&mut ctx).await,
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => report_error(&ctx, &e),
    };

    ctx.output.flush();
    std::process::exit(exit_code);
}

/// Print a command failure and map it to an exit code
fn report_error(ctx: &CommandContext, err: &anyhow::Error) -> i32 {
    ctx.output.error(&format!("{:#}", err));

    match err.downcast_ref::<sitestack::error::Error>() {
        Some(e) => {
            match e {
                sitestack::error::Error::LookupsDisabled { .. } => ctx
                    .output
                    .hint("Run once without --no-lookups to populate the context file"),
                sitestack::error::Error::ZoneNotFound { .. } => ctx
                    .output
                    .hint("The root domain needs an existing public hosted zone in Route 53"),
                _ => {}
            }
            e.exit_code()
        }
        None => 1,
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbosity >= 3))
        .with(env_filter)
        .init();
}
