use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

mod app;
mod ui;

use app::App;
use listing_wizard::config::Config;
use listing_wizard::gate::{Decision, GateCheck, GateOutcome};
use listing_wizard::logging;
use listing_wizard::notice::StderrNotifier;
use listing_wizard::session::{submitter_from_config, WizardSession};

#[derive(Parser)]
#[command(name = "listing-wizard")]
#[command(about = "Step-by-step product listing wizard with saved drafts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which steps are complete
    Status,

    /// List the steps and their fields
    Steps {
        /// Show every field of every step
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the saved draft for a step as JSON
    Draft {
        /// Step key (e.g., step3)
        step: String,
    },

    /// Discard all drafts and completion state
    Reset {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Submit the listing once every step is complete
    Submit {
        /// Save without asking
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    // No subcommand means the TUI owns the terminal
    let is_tui_mode = cli.command.is_none();

    let logging_handle = logging::init_logging(&config, is_tui_mode, cli.debug)?;

    match cli.command {
        Some(Commands::Status) => cmd_status(&config)?,
        Some(Commands::Steps { verbose }) => cmd_steps(&config, verbose)?,
        Some(Commands::Draft { step }) => cmd_draft(&config, &step)?,
        Some(Commands::Reset { yes }) => cmd_reset(&config, yes)?,
        Some(Commands::Submit { yes }) => cmd_submit(&config, yes).await?,
        None => run_tui(config, logging_handle.log_file_path).await?,
    }

    Ok(())
}

async fn run_tui(config: Config, log_file_path: Option<PathBuf>) -> Result<()> {
    ui::install_panic_hook();

    let mut app = App::new(config)?;
    let result = app.run().await;

    // Print log file path on exit if logs were written
    if let Some(log_path) = log_file_path {
        if let Ok(metadata) = log_path.metadata() {
            if metadata.len() > 0 {
                eprintln!("Session log: {}", log_path.display());
            }
        }
    }

    result
}

/// Ask a question on stdin; returns the trimmed, lowercased answer
fn prompt(question: &str) -> Result<String> {
    print!("{question} ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(answer.trim().to_lowercase())
}

fn cmd_status(config: &Config) -> Result<()> {
    let session = WizardSession::open(config)?;
    let report = session.progress.all_complete();

    println!("{} ({})", session.definition.name, session.origin());
    println!("{}", "─".repeat(60));

    for (i, step) in session.definition.steps.iter().enumerate() {
        let mark = if session.progress.is_complete(&step.key) {
            "✔"
        } else {
            "✖"
        };
        let saved = if session.drafts.contains(&step.key) {
            ""
        } else {
            "  (no draft)"
        };
        println!("{mark} {}. {}{saved}", i + 1, step.title);
    }

    println!();
    if report.complete {
        println!("All steps complete, ready to submit");
    } else {
        println!(
            "{} of {} steps complete",
            session.progress.completed_count(),
            session.definition.len()
        );
    }
    Ok(())
}

fn cmd_steps(config: &Config, verbose: bool) -> Result<()> {
    let definition = WizardSession::open(config)?.definition;

    for (i, step) in definition.steps.iter().enumerate() {
        println!("{}. {} [{}]", i + 1, step.title, step.key);
        if !verbose {
            continue;
        }
        for field in &step.fields {
            let required = if field.required { "*" } else { " " };
            let mut constraints = Vec::new();
            if let Some(length) = field.length {
                constraints.push(format!("{}-{} chars", length.min, length.max));
                if !length.allow_paste {
                    constraints.push("no paste".to_string());
                }
            }
            if let Some(group) = &field.group {
                constraints.push(format!("min {} -> {}", group.min_checked, group.record_key));
            }
            if let Some(custom) = &field.custom_value {
                constraints.push(format!("'{}' reveals {}", custom.sentinel, custom.field));
            }
            println!(
                "   {required} {:<24} {:<15} {}",
                field.name,
                format!("{:?}", field.kind).to_lowercase(),
                constraints.join(", ")
            );
        }
    }
    Ok(())
}

fn cmd_draft(config: &Config, step: &str) -> Result<()> {
    let session = WizardSession::open(config)?;
    if session.definition.step(step).is_none() {
        bail!(
            "Unknown step '{step}'. Known steps: {}",
            session.definition.step_keys().join(", ")
        );
    }

    let draft = session.drafts.get(step);
    println!("{}", serde_json::to_string_pretty(&draft)?);
    Ok(())
}

fn cmd_reset(config: &Config, skip_confirm: bool) -> Result<()> {
    let mut session = WizardSession::open(config)?;

    if !skip_confirm {
        let answer = prompt("Discard every draft and start over? [y/N]")?;
        if answer != "y" && answer != "yes" {
            println!("Cancelled");
            return Ok(());
        }
    }

    session.reset().context("Failed to reset wizard state")?;
    println!("Drafts and progress cleared");
    Ok(())
}

async fn cmd_submit(config: &Config, skip_confirm: bool) -> Result<()> {
    let mut session = WizardSession::open(config)?;
    let submitter = submitter_from_config(config)?;
    let gate = session.gate();
    let mut notifier = StderrNotifier;

    if let GateCheck::Incomplete { missing } = gate.check(&session.progress, &mut notifier) {
        bail!("{} step(s) incomplete", missing.len());
    }

    let decision = if skip_confirm {
        Decision::Save
    } else {
        match prompt("Do you want to save the changes? [s]ave / [d]on't save / [c]ancel")?.as_str()
        {
            "s" | "save" | "y" | "yes" => Decision::Save,
            "d" | "n" | "no" => Decision::Discard,
            _ => Decision::Cancel,
        }
    };

    let outcome = gate
        .resolve(
            decision,
            &mut session.progress,
            &session.drafts,
            submitter.as_ref(),
            &mut notifier,
        )
        .await;

    match outcome {
        GateOutcome::Submitted(receipt) => {
            println!("Listing {} submitted (HTTP {})", receipt.id, receipt.status);
        }
        GateOutcome::NotCleared { receipt, error } => {
            println!("Listing {} submitted (HTTP {})", receipt.id, receipt.status);
            bail!("Saved steps could not be cleared: {error}");
        }
        GateOutcome::Discarded | GateOutcome::Cancelled => println!("Nothing submitted"),
        GateOutcome::Incomplete { missing } => bail!("{} step(s) incomplete", missing.len()),
        GateOutcome::Failed { error } => bail!("Submission failed: {error}"),
    }
    Ok(())
}
