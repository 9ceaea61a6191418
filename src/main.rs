use anyhow::Context;
use clap::{Args, ColorChoice, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use faunasense::ClassificationEngine;
use faunasense::config::ResolverConfig;
use faunasense::detector::StaticDetector;
use faunasense::features::FeatureSignature;
use faunasense::knowledge::{FileKnowledgeSource, KnowledgeRepository, SharedKnowledge};
use faunasense::schema::{
    BoundingBox, ClassificationReport, MatchResult, MatchType, ResolutionStatus,
};
use std::io::{IsTerminal, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives
const LOG_ENV_VAR: &str = "FAUNASENSE_LOG";

#[derive(Parser)]
#[command(
    name = "faunasense",
    about = "Reconcile animal detections with a knowledge base and image features",
    arg_required_else_help = true
)]
struct Cli {
    /// Disable color
    #[arg(long = "no-color", global = true)]
    no_color: bool,

    /// Config file (defaults to $FAUNASENSE_CONFIG or the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify detector candidates for an image
    Classify(ClassifyArgs),
    /// Show the feature signature of an image region
    Features(FeaturesArgs),
    /// Match a label against a knowledge file
    Match(MatchArgs),
    /// List the active correction rules in priority order
    Rules(RulesArgs),
    /// Print the JSON schema of the classification report
    Schema,
}

#[derive(Args, Clone)]
struct ClassifyArgs {
    /// Image file (PNG or JPEG)
    #[arg(long, value_name = "FILE")]
    image: PathBuf,

    /// JSON array of detector candidates
    #[arg(long, value_name = "FILE")]
    detections: PathBuf,

    /// Knowledge base (.toml or .json)
    #[arg(long, value_name = "FILE")]
    knowledge: Option<PathBuf>,

    /// Output JSON (stable schema)
    #[arg(long)]
    json: bool,

    /// Plain text without colors/headers
    #[arg(long)]
    raw: bool,
}

#[derive(Args, Clone)]
struct FeaturesArgs {
    /// Image file (PNG or JPEG)
    #[arg(long, value_name = "FILE")]
    image: PathBuf,

    /// Region as x,y,width,height (whole image when omitted)
    #[arg(long = "box", value_name = "x,y,w,h", allow_hyphen_values = true)]
    bounding_box: Option<BoundingBox>,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct MatchArgs {
    /// Label to match
    label: String,

    /// Knowledge base (.toml or .json)
    #[arg(long, value_name = "FILE")]
    knowledge: PathBuf,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Clone)]
struct RulesArgs {
    /// Output JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn detect_color_choice() -> ColorChoice {
    // Scan args before clap so help/errors honor `--no-color`.
    // Mirror clap's parsing by stopping at `--` which terminates flags.
    let mut args = std::env::args_os();
    args.next();
    let mut flag = false;
    for arg in args {
        if arg == "--" {
            break;
        }
        if arg == "--no-color" {
            flag = true;
            break;
        }
    }
    if flag || std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()) {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn want_color(color: ColorChoice) -> bool {
    stdout().is_terminal() && !matches!(color, ColorChoice::Never)
}

fn input_error(error: anyhow::Error) -> i32 {
    eprintln!("Error: {:#}", error);
    2
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), i32> {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: failed to serialize output: {}", e);
            Err(3)
        }
    }
}

fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().cyan().to_string()
    } else {
        text.to_string()
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ResolverConfig> {
    match path {
        Some(path) => ResolverConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ResolverConfig::load()),
    }
}

fn load_image(path: &Path) -> anyhow::Result<image::RgbImage> {
    let image = image::open(path).with_context(|| format!("reading image {}", path.display()))?;
    Ok(image.to_rgb8())
}

fn load_knowledge(path: Option<&Path>) -> anyhow::Result<Arc<dyn KnowledgeRepository>> {
    match path {
        Some(path) => {
            let knowledge = SharedKnowledge::new(FileKnowledgeSource::new(path))
                .with_context(|| format!("loading knowledge {}", path.display()))?;
            Ok(Arc::new(knowledge))
        }
        None => Ok(Arc::new(SharedKnowledge::empty())),
    }
}

fn load_detections(path: &Path) -> anyhow::Result<StaticDetector> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading detections {}", path.display()))?;
    StaticDetector::from_json_str(&content)
        .with_context(|| format!("parsing detections {}", path.display()))
}

fn build_report(
    args: &ClassifyArgs,
    config: Option<&Path>,
) -> anyhow::Result<ClassificationReport> {
    let config = load_config(config)?;
    let knowledge = load_knowledge(args.knowledge.as_deref())?;
    let image = load_image(&args.image)?;
    let detector = load_detections(&args.detections)?;

    let engine = ClassificationEngine::with_config(knowledge, config);
    let report = engine.classify_with_detector(&image, &detector)?;
    Ok(report)
}

fn status_text(status: ResolutionStatus) -> &'static str {
    match status {
        ResolutionStatus::Resolved => "resolved",
        ResolutionStatus::Unresolved => "unresolved",
        ResolutionStatus::NoDetections => "no detections",
    }
}

fn render_report(report: &ClassificationReport, color: bool, raw: bool) -> String {
    let mut lines = Vec::new();
    if raw {
        for result in &report.results {
            lines.push(format!(
                "{} = {:.3}",
                result.final_label, result.final_confidence
            ));
        }
        return lines.join("\n");
    }

    let status = status_text(report.status);
    let status = match (color, report.status) {
        (false, _) => status.to_string(),
        (true, ResolutionStatus::Resolved) => status.green().to_string(),
        (true, _) => status.red().to_string(),
    };
    lines.push(format!("{} {}", heading("Status:", color), status));

    for (i, result) in report.results.iter().enumerate() {
        let label = if color && i == 0 {
            result.final_label.bold().to_string()
        } else {
            result.final_label.clone()
        };
        let mut notes = vec![result.match_type.as_str().to_string()];
        if let Some(rule) = &result.correction_rule {
            notes.push(format!("corrected by {}", rule));
        }
        lines.push(format!(
            "  {}. {} {:.3} ({})",
            i + 1,
            label,
            result.final_confidence,
            notes.join(", ")
        ));
        lines.push(format!(
            "     detected = {}, category = {}",
            result.detected_label, result.category
        ));
    }
    lines.join("\n")
}

fn run_classify(args: ClassifyArgs, config: Option<&Path>, color: ColorChoice) -> Result<(), i32> {
    let report = build_report(&args, config).map_err(input_error)?;
    if args.json {
        return print_json(&report);
    }
    println!("{}", render_report(&report, want_color(color), args.raw));
    Ok(())
}

fn format_option(value: Option<f32>, color: bool) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None if color => "unknown".red().to_string(),
        None => "unknown".to_string(),
    }
}

fn format_class(value: &str, color: bool) -> String {
    if color && value == "unknown" {
        value.red().to_string()
    } else {
        value.to_string()
    }
}

fn render_signature(signature: &FeatureSignature, color: bool) -> String {
    let rows = [
        ("aspect_ratio", format_option(signature.aspect_ratio, color)),
        (
            "dominant_hue",
            format_class(signature.dominant_hue_bucket.as_str(), color),
        ),
        ("blue_ratio", format_option(signature.blue_ratio, color)),
        ("edge_variance", format_option(signature.edge_variance, color)),
        (
            "blob_pattern",
            format_class(signature.blob_pattern_class.as_str(), color),
        ),
        (
            "environment",
            format_class(signature.environment_class.as_str(), color),
        ),
    ];

    let mut out = heading("Features:", color);
    for (key, value) in rows {
        out.push_str(&format!("\n  {} = {}", key, value));
    }
    out
}

fn run_features(args: FeaturesArgs, config: Option<&Path>, color: ColorChoice) -> Result<(), i32> {
    let config = load_config(config).map_err(input_error)?;
    let image = load_image(&args.image).map_err(input_error)?;

    let engine = ClassificationEngine::with_config(Arc::new(SharedKnowledge::empty()), config);
    let signature = engine.analyze(&image, args.bounding_box.as_ref());
    if args.json {
        return print_json(&signature);
    }
    println!("{}", render_signature(&signature, want_color(color)));
    Ok(())
}

fn render_match(label: &str, result: &MatchResult, color: bool) -> String {
    match &result.entry {
        Some(entry) => {
            let name = if color {
                entry.canonical_name.green().to_string()
            } else {
                entry.canonical_name.clone()
            };
            format!(
                "{} -> {} ({}, +{:.2})",
                label,
                name,
                result.match_type.as_str(),
                result.boost
            )
        }
        None => {
            let none = MatchType::None.as_str();
            let none = if color { none.red().to_string() } else { none.to_string() };
            format!("{} -> {}", label, none)
        }
    }
}

fn run_match(args: MatchArgs, config: Option<&Path>, color: ColorChoice) -> Result<(), i32> {
    let config = load_config(config).map_err(input_error)?;
    let knowledge = load_knowledge(Some(args.knowledge.as_path())).map_err(input_error)?;

    let engine = ClassificationEngine::with_config(knowledge, config);
    let result = engine.match_label(&args.label);
    if args.json {
        return print_json(&result);
    }
    println!("{}", render_match(&args.label, &result, want_color(color)));
    Ok(())
}

fn run_rules(args: RulesArgs, config: Option<&Path>, color: ColorChoice) -> Result<(), i32> {
    let config = load_config(config).map_err(input_error)?;
    let rules = config.correction_rules();
    if args.json {
        return print_json(&rules);
    }

    let color = want_color(color);
    let mut out = heading("Rules:", color);
    for (i, rule) in rules.iter().enumerate() {
        let id = if color { rule.id.bold().to_string() } else { rule.id.clone() };
        out.push_str(&format!(
            "\n  {}. {}: {} -> {} (+{:.2})",
            i + 1,
            id,
            rule.condition(),
            rule.rewrite_to,
            rule.strength
        ));
    }
    println!("{}", out);
    Ok(())
}

fn run_schema() -> Result<(), i32> {
    let schema = schemars::schema_for!(ClassificationReport);
    print_json(&schema)
}

fn main() {
    init_tracing();
    let color = detect_color_choice();
    let matches = Cli::command().color(color).get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());
    let config = cli.config.as_deref();

    let outcome = match cli.command {
        Some(Commands::Classify(args)) => run_classify(args, config, color),
        Some(Commands::Features(args)) => run_features(args, config, color),
        Some(Commands::Match(args)) => run_match(args, config, color),
        Some(Commands::Rules(args)) => run_rules(args, config, color),
        Some(Commands::Schema) => run_schema(),
        None => Ok(()),
    };

    if let Err(code) = outcome {
        std::process::exit(code);
    }
}
