//! sipoc-bot: guided Six Sigma charter and SIPOC collection from the terminal.
//!
//! Usage:
//!   sipoc-bot run [--answers-out session.json]
//!   sipoc-bot export --session session.json
//!   sipoc-bot questions
//!   sipoc-bot diagram --session session.json --format png --output sipoc.png

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use prettytable::{Table, row};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use sipoc_bot::config::{Config, RuntimeConfig};
use sipoc_bot::export::review_markdown;
use sipoc_bot::render::{DiagramRenderer, GraphvizRenderer, ImageFormat};
use sipoc_bot::{Exporter, Session, SipocDiagram, Stage};

#[derive(Parser)]
#[command(name = "sipoc-bot")]
#[command(about = "Collect a Six Sigma project charter and SIPOC, then export it", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer the charter and SIPOC questions interactively, then export
    Run {
        /// Save the finalized session as JSON
        #[arg(long)]
        answers_out: Option<PathBuf>,
        /// Stop after the review instead of writing export files
        #[arg(long)]
        no_export: bool,
    },
    /// Re-export a saved session
    Export {
        #[arg(long)]
        session: PathBuf,
    },
    /// Print the configured question sets
    Questions,
    /// Print the SIPOC diagram of a saved session
    Diagram {
        #[arg(long)]
        session: PathBuf,
        #[arg(long, value_enum, default_value_t = DiagramFormat::Dot)]
        format: DiagramFormat,
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DiagramFormat {
    Dot,
    Png,
    Svg,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(RuntimeConfig::load_from_env().log_level))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load().context("Failed to load configuration")?;

    match cli.command {
        Commands::Run {
            answers_out,
            no_export,
        } => run(&config, answers_out.as_deref(), no_export),
        Commands::Export { session } => {
            let session = sipoc_bot::load_session(&session)
                .with_context(|| format!("Failed to load session {}", session.display()))?;
            export(&config, &session)
        }
        Commands::Questions => {
            print_questions(&config)?;
            Ok(())
        }
        Commands::Diagram {
            session,
            format,
            output,
        } => diagram(&config, &session, format, output.as_deref()),
    }
}

fn run(config: &Config, answers_out: Option<&Path>, no_export: bool) -> Result<()> {
    let mut session = config.new_session()?;
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stage = None;

    while let Some(question) = session.current_question() {
        if stage != Some(session.stage()) {
            stage = Some(session.stage());
            println!(
                "\n== {} ==",
                match session.stage() {
                    Stage::CollectingCharter => "Project Charter",
                    _ => "SIPOC",
                }
            );
        }

        println!(
            "\n[{}/{}] {}",
            session.answered() + 1,
            session.total_questions(),
            question.prompt
        );
        println!("  (press Enter for: {})", question.resolve_default(session.today()));
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else {
            anyhow::bail!("Input closed before all questions were answered");
        };
        let line = line?;

        match session.submit_answer(&line) {
            Ok(_) => {}
            Err(err) if err.is_recoverable() => println!("  {}. Please try again.", err),
            Err(err) => return Err(err.into()),
        }
    }

    println!("\n{}", review_markdown(&session, &config.export.list_separator));

    if let Some(path) = answers_out {
        sipoc_bot::save_session(&session, path)?;
        info!(path = %path.display(), "session saved");
        println!("Session saved to {}", path.display());
    }

    if no_export {
        return Ok(());
    }
    export(config, &session)
}

fn export(config: &Config, session: &Session) -> Result<()> {
    let exporter = Exporter::from_config(&config.export);
    let today = chrono::Local::now().date_naive();
    let bundle = exporter.export(session, today)?;

    for path in bundle.write_to(&config.export.output_dir)? {
        println!("Wrote {}", path.display());
    }
    if let Some(warning) = &bundle.diagram_warning {
        println!("Printable export has no diagram page: {}", warning);
    }
    Ok(())
}

fn print_questions(config: &Config) -> sipoc_bot::Result<()> {
    let mut table = Table::new();
    table.add_row(row!["Stage", "Key", "Prompt", "Default"]);
    for (stage, set) in [
        ("Charter", config.charter_questions()?),
        ("SIPOC", config.sipoc_questions()?),
    ] {
        for q in set.iter() {
            table.add_row(row![stage, q.key, q.prompt, q.default_answer]);
        }
    }
    table.printstd();
    Ok(())
}

fn diagram(
    config: &Config,
    session_path: &Path,
    format: DiagramFormat,
    output: Option<&Path>,
) -> Result<()> {
    let session = sipoc_bot::load_session(session_path)?;
    let diagram = SipocDiagram::build(session.sipoc());

    let bytes = match format {
        DiagramFormat::Dot => diagram.to_dot().into_bytes(),
        DiagramFormat::Png | DiagramFormat::Svg => {
            let image_format = if matches!(format, DiagramFormat::Png) {
                ImageFormat::Png
            } else {
                ImageFormat::Svg
            };
            GraphvizRenderer::new(config.export.dot_binary.clone()).render(&diagram, image_format)?
        }
    };

    match output {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}
