use clap::Parser;
use form_autofill::cli::commands::{cmd_detect, cmd_fill};
use form_autofill::cli::config::{Cli, Clock, Commands};
use form_autofill::config::load_config;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Detect { page, format } => {
            cmd_detect(&page, format, config, Clock::Real.scheduler()).await?;
        }
        Commands::Fill {
            page,
            values,
            format,
            no_delay,
        } => {
            let scheduler = Clock::from_no_delay(no_delay).scheduler();
            let filled_any = cmd_fill(&page, &values, format, config, scheduler).await?;
            if !filled_any {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise -v raises the level from warn.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("form_autofill={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
