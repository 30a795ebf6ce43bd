use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use planety::devtools::{load_page, load_performance_sample, SessionScript};
use planety::{ConfigLoader, DevTools, TelemetryRecorder};

#[derive(Parser)]
#[command(name = "planety", version, about = "Landing page QA tools and session telemetry")]
struct Args {
    /// Config file (JSON). Falls back to $PLANETY_CONFIG, then ./planety.json.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy, links, CTAs, legal and metadata review
    Content { page: PathBuf },
    /// WCAG accessibility checks
    A11y { page: PathBuf },
    /// Link classification summary
    Links { page: PathBuf },
    /// Form structure check
    Forms { page: PathBuf },
    /// Performance snapshot from a captured sample
    Perf { sample: PathBuf },
    /// Every check above
    All {
        page: PathBuf,
        #[arg(long)]
        perf: Option<PathBuf>,
    },
    /// Replay a scripted session through the recorder
    Session {
        script: PathBuf,
        /// Directory for the analytics export
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.parse().unwrap_or_default()),
        )
        .init();

    let config = ConfigLoader::load(args.config.as_deref()).context("loading configuration")?;
    let recorder = TelemetryRecorder::from_config(&config, Vec::new());
    let tools = DevTools::new(recorder.clone(), config.audit.clone());

    match args.command {
        Command::Content { page } => {
            let page = load_page(&page)?;
            println!("{}", tools.run_content_review(&page).report);
        }
        Command::A11y { page } => {
            let page = load_page(&page)?;
            println!("{}", tools.run_accessibility_tests(&page).report);
        }
        Command::Links { page } => {
            let page = load_page(&page)?;
            println!("{}", tools.check_links(&page)?.render());
        }
        Command::Forms { page } => {
            let page = load_page(&page)?;
            println!("{}", tools.validate_forms(&page)?.render());
        }
        Command::Perf { sample } => {
            let sample = load_performance_sample(&sample)?;
            println!("{}", tools.test_performance(&sample).render());
        }
        Command::All { page, perf } => {
            let page = load_page(&page)?;
            let sample = perf.as_deref().map(load_performance_sample).transpose()?;
            println!("{}", tools.run_all_tests(&page, sample.as_ref())?.render());
        }
        Command::Session { script, export } => {
            let script = SessionScript::load(&script)?;
            script.replay(&recorder);
            recorder.page_exit();

            println!("{}", serde_json::to_string_pretty(&recorder.snapshot())?);
            if let Some(dir) = export {
                let (_, path) = tools.export_analytics(&dir)?;
                info!(path = %path.display(), "session exported");
            }
        }
    }

    recorder.flush().await;
    Ok(())
}
