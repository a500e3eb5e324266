//! TradeGuard: compliance gate for AI-generated adverts in regulated UK trades.
//!
//! Command-line front end over the scanner, the certification engine, the
//! rule validator and the approval gate. Results are printed as JSON on
//! stdout; logs go to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tradeguard_compliance::{
    CertificationRequirementEngine, ComplianceRuleValidator, ContentComplianceScanner,
    ValidationSummary,
};
use tradeguard_core::event_bus::{StaticActor, TracingSink};
use tradeguard_core::{AppConfig, UserCertifications};
use tradeguard_management::{preflight, Campaign, ComplianceGate};

#[derive(Parser, Debug)]
#[command(name = "tradeguard")]
#[command(about = "Compliance gate for AI-generated trade adverts")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (environment overrides still apply)
    #[arg(long, env = "TRADEGUARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan advert copy for banned and cautionary phrases
    Scan(TextArgs),
    /// Print the copy with every replaceable banned phrase substituted
    Sanitize(TextArgs),
    /// Check which services may be advertised with the given certifications
    Eligibility {
        /// Comma-separated service ids, e.g. boiler_repair,rewiring
        #[arg(long, value_delimiter = ',', required = true)]
        services: Vec<String>,
        /// JSON file of certification records keyed by certification kind
        #[arg(long)]
        certs: PathBuf,
    },
    /// Run the rule catalogue and pre-approval checks over a campaign
    Validate {
        #[arg(long)]
        campaign: PathBuf,
    },
    /// Run the full compliance gate over a campaign
    Screen {
        #[arg(long)]
        campaign: PathBuf,
        #[arg(long)]
        certs: PathBuf,
        /// Identity recorded on emitted audit events
        #[arg(long, env = "TRADEGUARD_ACTOR", default_value = "cli")]
        actor: String,
    },
}

#[derive(clap::Args, Debug)]
struct TextArgs {
    /// Copy to check
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    text: Option<String>,
    /// Read the copy from a file instead
    #[arg(long)]
    file: Option<PathBuf>,
}

impl TextArgs {
    fn read(&self) -> anyhow::Result<String> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display())),
            (None, None) => anyhow::bail!("either --text or --file is required"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = AppConfig::load(cli.config.as_deref());
    let filter = loaded
        .as_ref()
        .map(|c| c.logging.filter.clone())
        .unwrap_or_else(|_| AppConfig::default().logging.filter);
    let json_logs = loaded.as_ref().map(|c| c.logging.json).unwrap_or(false);
    init_tracing(&filter, json_logs);

    let config = loaded.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    info!(
        max_content_bytes = config.scanner.max_content_bytes,
        fault_policy = ?config.scanner.fault_policy,
        "Configuration loaded"
    );

    let blocked = run(cli.command, &config)?;
    if blocked {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(filter: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Execute one subcommand. Returns `true` when the verdict blocks.
fn run(command: Command, config: &AppConfig) -> anyhow::Result<bool> {
    match command {
        Command::Scan(args) => {
            let scanner = ContentComplianceScanner::uk_trades(config.scanner.max_content_bytes)?;
            let result = scanner.check(&args.read()?)?;
            print_json(&result)?;
            Ok(!result.approved)
        }
        Command::Sanitize(args) => {
            let scanner = ContentComplianceScanner::uk_trades(config.scanner.max_content_bytes)?;
            println!("{}", scanner.apply_safe_replacements(&args.read()?)?);
            Ok(false)
        }
        Command::Eligibility { services, certs } => {
            let certs: UserCertifications = read_json(&certs)?;
            let result = CertificationRequirementEngine::default().check_eligibility(&services, &certs);
            print_json(&result)?;
            Ok(!result.can_advertise)
        }
        Command::Validate { campaign } => {
            let campaign: Campaign = read_json(&campaign)?;
            let checks = ComplianceRuleValidator::uk_trades().validate(&campaign.to_campaign_data());
            let summary = ValidationSummary::from_checks(&checks);
            let approval = preflight::validate_for_approval(&campaign, &config.approval);
            print_json(&serde_json::json!({
                "checks": checks,
                "summary": summary,
                "approval": approval,
            }))?;
            Ok(!summary.is_compliant())
        }
        Command::Screen {
            campaign,
            certs,
            actor,
        } => {
            let campaign: Campaign = read_json(&campaign)?;
            let certs: UserCertifications = read_json(&certs)?;
            let gate = ComplianceGate::new(config, Arc::new(TracingSink), Arc::new(StaticActor(actor)))?;
            let report = gate.screen(&campaign, &certs)?;
            print_json(&report)?;
            Ok(!report.can_approve())
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
