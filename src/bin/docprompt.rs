//! CLI binary for docprompt.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, drives one `Pipeline` invocation and prints the text.

use anyhow::{Context, Result};
use clap::Parser;
use docprompt::pipeline::input::resolve_input;
use docprompt::pipeline::llm::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use docprompt::{
    inspect, Credential, Notice, NoticeLevel, Pipeline, PipelineConfig, PipelineObserver,
    PipelineState,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── Terminal observer ────────────────────────────────────────────────────────

/// Shows a spinner while a request is in flight and prints notices to stderr.
struct CliObserver {
    /// `None` when progress output is disabled.
    spinner: Option<ProgressBar>,
    quiet: bool,
}

impl CliObserver {
    fn new(show_progress: bool, quiet: bool) -> Self {
        let spinner = show_progress.then(|| {
            let bar = ProgressBar::hidden();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner())
                    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            bar
        });
        Self { spinner, quiet }
    }
}

impl PipelineObserver for CliObserver {
    fn on_state_change(&self, state: PipelineState) {
        let Some(ref bar) = self.spinner else {
            return;
        };
        match state {
            PipelineState::InFlight => {
                bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
                bar.set_message("Processing…");
                bar.enable_steady_tick(Duration::from_millis(80));
            }
            PipelineState::Completed | PipelineState::Errored => bar.finish_and_clear(),
            PipelineState::Idle => {}
        }
    }

    fn on_notice(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Error => eprintln!("{} {}", red("✗"), notice.message),
            NoticeLevel::Success if !self.quiet => {
                eprintln!("{} {}", green("✓"), dim(&notice.message))
            }
            NoticeLevel::Success => {}
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Ask about a PDF
  docprompt invoice.pdf --prompt "What is the total amount due?"

  # Spreadsheets are flattened to CSV before sending
  docprompt budget.xlsx -p "Which month had the highest spend?"

  # Images work too, and so do URLs
  docprompt https://example.com/receipt.jpg -p "List the line items"

  # Long prompt from a file
  docprompt report.pdf --prompt-file questions.txt

  # Check a file is accepted (no API key needed)
  docprompt --inspect-only budget.xlsx

ACCEPTED FILES:
  application/pdf, image/*, and Excel workbooks (.xlsx)

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Gemini API key (never logged)
  DOCPROMPT_MODEL         Override model ID
  DOCPROMPT_API_BASE_URL  Override API origin
"#;

/// Ask Gemini about a PDF, image or spreadsheet.
#[derive(Parser, Debug)]
#[command(
    name = "docprompt",
    version,
    about = "Ask Gemini about a PDF, image or spreadsheet",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file path or HTTP/HTTPS URL.
    input: String,

    /// Instruction for the model, sent verbatim.
    #[arg(short, long, env = "DOCPROMPT_PROMPT", conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// Read the instruction from a text file.
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model ID.
    #[arg(long, env = "DOCPROMPT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// API origin.
    #[arg(long, env = "DOCPROMPT_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Generation call timeout in seconds.
    #[arg(long, env = "DOCPROMPT_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCPROMPT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print document details only, no generation.
    #[arg(long)]
    inspect_only: bool,

    /// With --inspect-only: print details as JSON.
    #[arg(long, requires = "inspect_only")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "DOCPROMPT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCPROMPT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "DOCPROMPT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let show_progress = !cli.quiet && !cli.no_progress;
    let observer = CliObserver::new(show_progress, cli.quiet);

    let config = PipelineConfig::builder()
        .model(&cli.model)
        .api_base_url(&cli.api_base_url)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .observer(std::sync::Arc::new(observer))
        .build()
        .context("Invalid configuration")?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let info = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect document")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("Failed to serialize details")?
            );
        } else {
            println!("File:       {}", info.name);
            println!("MIME type:  {}", info.mime_type);
            println!("Size:       {} bytes", info.size_bytes);
            match info.kind {
                Some(kind) => println!("Accepted:   yes ({kind:?})"),
                None => println!("Accepted:   no"),
            }
            if !info.sheet_names.is_empty() {
                println!("Sheets:     {}", info.sheet_names.join(", "));
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    let instruction = match (&cli.prompt, &cli.prompt_file) {
        (Some(p), _) => p.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt from {:?}", path))?,
        (None, None) => String::new(),
    };

    // ── Select ───────────────────────────────────────────────────────────
    let doc = match resolve_input(
        &cli.input,
        config.download_timeout_secs,
        config.max_document_bytes,
    )
    .await
    {
        Ok(doc) => doc,
        Err(e) => {
            warn!("{}", e);
            eprintln!("{} {}", red("✗"), e.user_notice());
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut pipeline = Pipeline::new(&config).context("Failed to initialise pipeline")?;
    if pipeline.select(doc).is_err() {
        // The observer already showed the notice.
        return Ok(ExitCode::from(2));
    }

    // ── Invoke ───────────────────────────────────────────────────────────
    let credential = Credential::new(cli.api_key.clone().unwrap_or_default());
    match pipeline.invoke(credential, &instruction).await {
        Ok(_) => {
            write_result(&mut io::stdout().lock(), pipeline.result().unwrap_or_default())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_validation() => {
            eprintln!("{} {}", red("✗"), e.user_notice());
            Ok(ExitCode::from(2))
        }
        // Processing failures were already reported by the observer.
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

/// Print the model's text, ending with exactly one trailing newline.
fn write_result(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        out.write_all(b"\n").context("Failed to write to stdout")?;
    }
    out.flush().context("Failed to write to stdout")
}
