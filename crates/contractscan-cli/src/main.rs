//! `contractscan`: scan a real-estate contract PDF, confirm its effective
//! date and print the resulting transaction data as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use contractscan_analyze::AnalyzeClient;
use contractscan_core::Upload;
use contractscan_scan::{ActiveScan, Completion, Pacing, Scanner, file_url};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{Level, info};

mod display;

#[derive(Parser, Debug)]
#[command(name = "contractscan", version, about = "Scan a contract PDF and set up its timeline")]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a contract, confirm its effective date, print the result as JSON
    Scan(ScanArgs),
    /// List the scan steps in order
    Steps,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Contract PDF to scan
    pdf: PathBuf,

    /// Base URL of the contract analysis backend
    #[arg(long, env = "CONTRACTSCAN_ANALYZE_URL", default_value = "http://localhost:3000")]
    analyze_url: String,

    /// Timeout for the analysis request, in seconds
    #[arg(long, env = "CONTRACTSCAN_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,

    /// Directory for the temporary preview copy
    #[arg(long, env = "CONTRACTSCAN_PREVIEW_DIR")]
    preview_dir: Option<PathBuf>,

    /// Skip the simulated step delays
    #[arg(long)]
    instant: bool,

    /// Effective date to confirm (YYYY-MM-DD) instead of prompting
    #[arg(long, value_name = "YYYY-MM-DD")]
    date: Option<String>,

    /// Accept the detected effective date without prompting
    #[arg(short, long)]
    yes: bool,

    /// Keep the preview copy at this path instead of deleting it
    #[arg(long, value_name = "PATH")]
    keep_preview: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();
    info!("contractscan v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Scan(args) => run_scan(args).await,
        Command::Steps => {
            display::print_steps();
            Ok(())
        }
    }
}

async fn run_scan(args: ScanArgs) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&args.pdf)
        .await
        .with_context(|| format!("reading {}", args.pdf.display()))?;
    let upload = Upload {
        file_name: args
            .pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        bytes,
    };

    let client = AnalyzeClient::with_timeout(
        args.analyze_url.clone(),
        Duration::from_secs(args.timeout_secs),
    )
    .context("building analysis client")?;
    let pacing = if args.instant {
        Pacing::immediate()
    } else {
        Pacing::default()
    };
    let mut scanner = Scanner::new(client)
        .with_pacing(pacing)
        .with_observer(Arc::new(display::ProgressPrinter::default()));
    if let Some(dir) = &args.preview_dir {
        scanner = scanner.with_preview_dir(dir);
    }

    display::print_document(&upload);
    let mut scan = tokio::select! {
        started = scanner.start(upload) => started.context("starting scan")?,
        _ = tokio::signal::ctrl_c() => bail!("cancelled"),
    };

    if let Some(failure) = scan.session().failure().cloned() {
        scan.close();
        bail!("scan halted at step {}: {}", failure.step, failure.reason);
    }

    let completion = if args.yes || args.date.is_some() {
        confirm_unattended(&mut scan, args.date.as_deref()).await?
    } else {
        confirm_interactive(&mut scan).await?
    };

    let mut payload = completion.to_json();
    if let Some(dest) = &args.keep_preview {
        let kept = completion
            .persist_preview(dest)
            .with_context(|| format!("keeping preview at {}", dest.display()))?;
        let url = file_url(&kept).context("building URL for kept preview")?;
        payload["contractUrl"] = serde_json::Value::String(url);
    }
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

async fn confirm_unattended(
    scan: &mut ActiveScan<'_, AnalyzeClient>,
    date: Option<&str>,
) -> anyhow::Result<Completion> {
    if let Some(date) = date {
        scan.set_effective_date(date)?;
    }
    match scan.confirm_effective_date().await? {
        Some(completion) => Ok(completion),
        None => bail!("no effective date detected in the contract; pass --date YYYY-MM-DD"),
    }
}

/// Prompt on stdin until the user confirms. An empty line confirms the
/// shown date; anything else replaces it.
async fn confirm_interactive(
    scan: &mut ActiveScan<'_, AnalyzeClient>,
) -> anyhow::Result<Completion> {
    let mut lines: Lines<BufReader<Stdin>> = BufReader::new(tokio::io::stdin()).lines();
    loop {
        display::print_gate(scan.session().gate());
        eprint!("Effective date (YYYY-MM-DD, Enter to confirm): ");

        let line = tokio::select! {
            line = lines.next_line() => line.context("reading stdin")?,
            _ = tokio::signal::ctrl_c() => bail!("cancelled at date confirmation"),
        };
        let Some(line) = line else {
            bail!("stdin closed before the effective date was confirmed");
        };

        if !line.trim().is_empty() {
            if let Err(e) = scan.set_effective_date(&line) {
                eprintln!("  {e}");
            }
            continue;
        }
        match scan.confirm_effective_date().await? {
            Some(completion) => return Ok(completion),
            None => eprintln!("  An effective date is required."),
        }
    }
}
