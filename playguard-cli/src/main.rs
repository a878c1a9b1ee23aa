//! Playguard CLI - validate jungle-gym designs from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use playguard::catalog::{CatalogSource, FileCatalogSource, HttpCatalogSource};
use playguard::{
    AcceptanceAction, AcceptanceGate, Catalog, Design, PlayguardCore, Rule, RuleRegistry, Severity,
    ValidationEngine, ValidationOptions, ValidationReport, ValidationRuleResult,
};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "playguard")]
#[command(about = "Jungle-gym design validation tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct CatalogArgs {
    /// Path to a catalog JSON file
    #[arg(
        long,
        value_name = "FILE",
        required_unless_present = "catalog_url",
        conflicts_with = "catalog_url"
    )]
    catalog: Option<PathBuf>,

    /// Base URL of a catalog service exposing /components
    #[arg(long, value_name = "URL")]
    catalog_url: Option<String>,

    /// Validation options JSON file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a design file
    Check {
        /// Path to the design JSON file
        #[arg(value_name = "DESIGN")]
        design: PathBuf,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if findings exist at this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,
    },

    /// Run the acceptance gate used before saving or quoting a design
    Accept {
        /// Path to the design JSON file
        #[arg(value_name = "DESIGN")]
        design: PathBuf,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Action being accepted
        #[arg(long, value_enum, default_value = "save")]
        action: ActionArg,
    },

    /// List available validation rules
    Rules {
        /// Show detailed rule descriptions
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Error,
    Warning,
}

#[derive(Clone, ValueEnum)]
enum ActionArg {
    Save,
    Quote,
}

impl From<ActionArg> for AcceptanceAction {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Save => AcceptanceAction::SaveDesign,
            ActionArg::Quote => AcceptanceAction::SubmitQuote,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let outcome = match cli.command {
        Commands::Check {
            design,
            catalog,
            format,
            fail_on,
        } => handle_check(&design, &catalog, format, fail_on).await,
        Commands::Accept {
            design,
            catalog,
            action,
        } => handle_accept(&design, &catalog, action.into()).await,
        Commands::Rules { verbose } => {
            handle_rules(verbose);
            Ok(0)
        }
    };

    let exit_code = match outcome {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

async fn load_inputs(
    design: &Path,
    args: &CatalogArgs,
) -> Result<(Design, Catalog, ValidationOptions)> {
    let design_record = PlayguardCore::load_design(design)
        .with_context(|| format!("failed to load design {}", design.display()))?;

    let source: Box<dyn CatalogSource> = match (&args.catalog, &args.catalog_url) {
        (Some(path), _) => Box::new(FileCatalogSource::new(path)),
        (None, Some(url)) => Box::new(HttpCatalogSource::new(url.clone())),
        (None, None) => anyhow::bail!("either --catalog or --catalog-url is required"),
    };
    let catalog = source
        .fetch()
        .await
        .with_context(|| format!("failed to load catalog from {}", source.name()))?;

    let options = match &args.config {
        Some(path) => ValidationOptions::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ValidationOptions::default(),
    };

    tracing::debug!(
        "Loaded {} components and {} catalog entries",
        design_record.components.len(),
        catalog.len()
    );
    Ok((design_record, catalog, options))
}

async fn handle_check(
    design_path: &Path,
    args: &CatalogArgs,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
) -> Result<i32> {
    let (design, catalog, options) = load_inputs(design_path, args).await?;
    let report = ValidationEngine::with_options(options).validate_or_report(&design, &catalog);

    output_report(design_path, &report, &format)?;

    if report.malformed {
        return Ok(1);
    }
    if let Some(severity) = fail_on {
        if should_fail(&report, &severity) {
            return Ok(1);
        }
    }
    Ok(0)
}

async fn handle_accept(
    design_path: &Path,
    args: &CatalogArgs,
    action: AcceptanceAction,
) -> Result<i32> {
    let (design, catalog, options) = load_inputs(design_path, args).await?;
    let gate = AcceptanceGate::new(ValidationEngine::with_options(options));

    match gate.check(action, &design, &catalog) {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(0)
        }
        Err(rejection) => {
            println!("{}", serde_json::to_string_pretty(&rejection)?);
            eprintln!("{}", rejection);
            Ok(1)
        }
    }
}

fn should_fail(report: &ValidationReport, severity: &FailOnSeverity) -> bool {
    match severity {
        FailOnSeverity::Error => report.stats.errors > 0,
        FailOnSeverity::Warning => report.total() > 0,
    }
}

fn output_report(design: &Path, report: &ValidationReport, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => output_human(design, report),
        OutputFormat::Json => output_json(design, report)?,
        OutputFormat::Github => output_github(design, report),
    }
    Ok(())
}

fn print_finding(finding: &ValidationRuleResult) {
    println!("    - [{}] {}", finding.code, finding.message);
    if !finding.instance_ids.is_empty() {
        println!("      Components: {}", finding.instance_ids.join(", "));
    }
    if let Some(ref suggestion) = finding.suggestion {
        println!("      Suggestion: {}", suggestion);
    }
}

fn output_human(design: &Path, report: &ValidationReport) {
    println!("\nDesign: {}", design.display());
    println!("{}", "─".repeat(60));

    if report.total() == 0 {
        println!("  No issues found");
        return;
    }

    if report.malformed {
        println!("\n  MALFORMED DESIGN:");
        for finding in &report.results {
            print_finding(finding);
        }
        return;
    }

    let errors: Vec<_> = report.errors().collect();
    let warnings: Vec<_> = report.warnings().collect();

    if !errors.is_empty() {
        println!("\n  ERRORS:");
        for finding in errors {
            print_finding(finding);
        }
    }
    if !warnings.is_empty() {
        println!("\n  WARNINGS:");
        for finding in warnings {
            print_finding(finding);
        }
    }

    println!("\n  Summary:");
    println!("    Errors:        {}", report.stats.errors);
    println!("    Warnings:      {}", report.stats.warnings);
    println!("    Structural:    {}", report.stats.structural);
    println!("    Compatibility: {}", report.stats.compatibility);
    println!("    Safety:        {}", report.stats.safety);
}

fn output_json(design: &Path, report: &ValidationReport) -> Result<()> {
    let output = serde_json::json!({
        "design": design.display().to_string(),
        "generatedAt": chrono::Utc::now(),
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn severity_to_github(finding: &ValidationRuleResult) -> &'static str {
    match finding.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    }
}

fn output_github(design: &Path, report: &ValidationReport) {
    for finding in &report.results {
        println!(
            "::{} file={},title={}::{}",
            severity_to_github(finding),
            design.display(),
            finding.code,
            finding.message.replace('\n', " ")
        );
    }
}

fn handle_rules(verbose: bool) {
    println!("Available validation rules:\n");

    let registry = RuleRegistry::with_default_rules();
    for rule in registry.rules() {
        println!("  {}", rule.code());
        println!("    {} ({}, {})", rule.name(), rule.category(), rule.severity());
        if verbose && !rule.description().is_empty() {
            println!("    {}", rule.description());
        }
        println!();
    }
}
