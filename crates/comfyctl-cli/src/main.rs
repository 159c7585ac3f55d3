use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use comfyctl_core::{CommandContext, GlobalOptions, SystemEffects};
use tracing_subscriber::EnvFilter;

mod cli;
mod dispatch;
mod output;
mod style;

use cli::ComfyCli;
use dispatch::dispatch_command;
use output::{emit_output, OutputOptions};

fn main() -> Result<()> {
    color_eyre::install()?;

    // Usage errors exit 1 like every other failure; help and version still exit 0.
    let cli = match ComfyCli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            let _ = err.print();
            std::process::exit(1);
        }
    };
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    let global = GlobalOptions {
        dry_run: cli.dry_run,
    };

    let ctx = match CommandContext::new(&global, Arc::new(SystemEffects::new())) {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "command failed");
            std::process::exit(1);
        }
    };

    let (info, outcome) = dispatch_command(&ctx, &cli.command);
    let options = OutputOptions {
        quiet: cli.quiet,
        json: cli.json,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };
    let code = emit_output(&options, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_env("COMFYCTL_LOG").unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "comfyctl={level},comfyctl_cli={level},comfyctl_core={level}"
        ))
    });
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
