#![allow(clippy::uninlined_format_args)]

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use formprobe::config::{ConflictTable, DEFAULT_TARGET_URL, RadioConfig, WaitConfig};
use formprobe::errors::exit_code_for;
use formprobe::resolver::read_value;
use formprobe::{
    Browser, BrowserType, Config, Element, FieldResolver, OutputFormat, RadioDisambiguator,
    Session, SessionConfig, ViewportSize, Waiter, WebDriverConnector, default_suite, run_suite,
};

// Exit codes
const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "formprobe")]
#[command(about = "Label-based form field resolution for WebDriver tests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Page to open for every session
    #[arg(long, global = true, default_value = DEFAULT_TARGET_URL)]
    url: String,

    /// Browser to use
    #[arg(short, long, global = true, default_value = "chrome")]
    browser: String,

    /// WebDriver endpoint (defaults to the browser's standard port)
    #[arg(long, global = true)]
    webdriver_url: Option<String>,

    /// Run browser in visible mode (disables headless)
    #[arg(long = "no-headless", global = true)]
    no_headless: bool,

    /// Set viewport size (WIDTHxHEIGHT, e.g., 1920x1080)
    #[arg(long, global = true, default_value = "1280x800")]
    viewport: String,

    /// Per-strategy wait timeout in milliseconds
    #[arg(long, global = true, default_value = "5000")]
    timeout_ms: u64,

    /// Polling interval in milliseconds
    #[arg(long, global = true, default_value = "500")]
    poll_ms: u64,

    /// Pause before verifying a radio selection, in milliseconds
    #[arg(long, global = true, default_value = "500")]
    settle_ms: u64,

    /// Pause after page load, in milliseconds
    #[arg(long, global = true, default_value = "2000")]
    load_delay_ms: u64,

    /// Extra conflicting radio tokens (TOKEN=CONFLICT, repeatable)
    #[arg(long = "conflict", global = true)]
    conflicts: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in scenarios, each in its own browser session
    Run {
        /// Only run the named scenario(s)
        #[arg(long)]
        only: Vec<String>,

        /// Output format
        #[arg(short, long, default_value = "simple")]
        format: OutputFormat,
    },

    /// Fill a field found by its label and verify the value
    Fill {
        /// Label, placeholder or nearby text of the field
        label: String,

        /// Text to write
        text: String,
    },

    /// Select a radio button by token
    SelectRadio {
        /// Token to look for in the radio's text and attributes
        token: String,
    },

    /// Report which lookup strategy finds a label
    Resolve {
        /// Label, placeholder or nearby text of the field
        label: String,
    },
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let browser: BrowserType = self.browser.parse()?;
        let viewport = ViewportSize::parse(&self.viewport)?;

        let mut conflicts = ConflictTable::default();
        for pair in &self.conflicts {
            conflicts.insert_pair(pair)?;
        }

        let session = SessionConfig {
            browser,
            webdriver_url: self.webdriver_url.clone(),
            headless: !self.no_headless,
            viewport,
            target_url: self.url.clone(),
            load_delay: Duration::from_millis(self.load_delay_ms),
        };
        session.validate()?;

        Ok(Config {
            session,
            wait: WaitConfig {
                timeout: Duration::from_millis(self.timeout_ms),
                poll_interval: Duration::from_millis(self.poll_ms),
            },
            radio: RadioConfig::new(Duration::from_millis(self.settle_ms), conflicts),
        })
    }
}

#[tokio::main]
async fn main() {
    let result = run().await;

    // Handle exit codes based on error type
    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let exit_code = exit_code_for(&err);

            // Output JSON error to stdout for programmatic consumption
            let error_json = json!({
                "error": true,
                "message": format!("{:#}", err),
                "exit_code": exit_code
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&error_json).unwrap_or_else(|_| error_json.to_string())
            );

            std::process::exit(exit_code);
        }
    }
}

async fn run() -> Result<i32> {
    // Initialize tracing to stderr (so JSON output to stdout remains clean)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formprobe=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr) // Output logs to stderr
                .with_target(false), // Don't show target module in logs
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    match cli.command {
        Commands::Run { only, format } => {
            let mut scenarios = default_suite();
            if !only.is_empty() {
                scenarios.retain(|s| only.contains(&s.name));
                if scenarios.is_empty() {
                    anyhow::bail!("No scenario named {}", only.join(", "));
                }
            }

            let report = run_suite(&WebDriverConnector, &config, &scenarios).await;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Simple => print!("{}", report.render_simple()),
            }
            Ok(report.exit_code())
        }

        Commands::Fill { label, text } => {
            with_session(&config, &Action::Fill { label, text }).await
        }

        Commands::SelectRadio { token } => {
            with_session(&config, &Action::SelectRadio { token }).await
        }

        Commands::Resolve { label } => with_session(&config, &Action::Resolve { label }).await,
    }
}

/// Single-session commands
enum Action {
    Fill { label: String, text: String },
    SelectRadio { token: String },
    Resolve { label: String },
}

async fn perform(page: &Browser, config: &Config, action: &Action) -> Result<serde_json::Value> {
    match action {
        Action::Fill { label, text } => {
            let resolver = FieldResolver::new(page, Waiter::new(config.wait));
            let element = resolver.fill_field(label, text).await?;
            let value = read_value(&element).await?;
            Ok(json!({ "label": label, "value": value }))
        }
        Action::SelectRadio { token } => {
            let selection = RadioDisambiguator::new(page, config.radio.clone())
                .select(token)
                .await?;
            Ok(json!({
                "token": token,
                "index": selection.index,
                "evidence": selection.evidence,
                "clicked": selection.clicked,
                "selected": true
            }))
        }
        Action::Resolve { label } => {
            let resolved = FieldResolver::new(page, Waiter::new(config.wait))
                .resolve_with_strategy(label)
                .await?;
            let id = resolved.element.attribute("id").await?;
            Ok(json!({
                "label": label,
                "strategy": resolved.strategy,
                "tier": resolved.strategy.tier(),
                "id": id
            }))
        }
    }
}

/// Open one session, perform `action`, print its JSON result, and always
/// tear the session down
async fn with_session(config: &Config, action: &Action) -> Result<i32> {
    let mut session = Session::setup(&WebDriverConnector, &config.session)
        .await
        .context("Failed to start browser session")?;

    let result = match session.page() {
        Some(page) => perform(page, config, action).await,
        None => Err(anyhow::anyhow!("Browser session closed unexpectedly")),
    };
    session.teardown().await;

    let value = result?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(EXIT_SUCCESS)
}
