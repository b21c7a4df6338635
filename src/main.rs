mod app;
mod commands;
mod config;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use app::App;
use config::Config;

/// Postcard editor with undo/redo, SVG export and share links
#[derive(Parser, Debug)]
#[command(name = "cardling")]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file (defaults to $XDG_CONFIG_HOME/cardling/config.json)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Edit a postcard by running commands from a script, or stdin
    Edit {
        #[arg(value_name = "SCRIPT")]
        script: Option<PathBuf>,
    },
    /// Open a share link and show the postcard it carries
    View {
        #[arg(value_name = "LINK")]
        link: String,

        /// Write the image to a file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "cardling=debug,cardling_history=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match args.command {
        CliCommand::Edit { script } => run_edit(&config, script.as_deref()).await,
        CliCommand::View { link, out } => run_view(&link, out.as_deref()),
    }
}

/// Run editing commands line by line, reporting errors and carrying on
async fn run_edit(config: &Config, script: Option<&Path>) -> Result<()> {
    let input: Box<dyn BufRead> = match script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("open script: {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut app = App::new(config)?;
    let mut stdout = io::stdout().lock();
    let mut failures = 0;

    for (index, line) in input.lines().enumerate() {
        let line = line.context("read command")?;
        let number = index + 1;

        let command = match commands::parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                failures += 1;
                eprintln!("line {number}: {e:#}");
                continue;
            }
        };

        match app.execute(command).await {
            Ok(output) => {
                if let Some(status) = app.take_status() {
                    writeln!(stdout, "{status}")?;
                }
                if let Some(output) = output {
                    writeln!(stdout, "{output}")?;
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("line {number}: {e:#}");
            }
        }
    }

    writeln!(stdout, "{}", app.status_line())?;
    if failures > 0 {
        bail!("{failures} command(s) failed");
    }
    Ok(())
}

/// Decode a share link and print or save the postcard image
fn run_view(link: &str, out: Option<&Path>) -> Result<()> {
    let envelope = cardling_export::open_link(link)?;
    let (mime, bytes) = envelope.image()?;
    debug!(%mime, len = bytes.len(), "postcard decoded");

    match out {
        Some(path) => {
            std::fs::write(path, &bytes).with_context(|| format!("write {}", path.display()))?;
            eprintln!("Wrote {mime} to {}", path.display());
        }
        None if mime == "image/svg+xml" => {
            io::stdout().write_all(&bytes)?;
        }
        None => bail!("postcard is {mime}, use --out to save it"),
    }
    Ok(())
}
