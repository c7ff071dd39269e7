mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use lumilens_ai::{ChatCompletionsOracle, OracleConfig, Pipeline, PipelineOptions};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lumilens")]
#[command(about = "Extract and score the legal reasoning in a case decision", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    oracle: OracleArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct OracleArgs {
    /// API key for the chat-completions endpoint
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model name
    #[arg(long, env = "OPENAI_MODEL", global = true)]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Per-call deadline in seconds
    #[arg(long, env = "LUMILENS_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    /// Token budget per oracle call
    #[arg(long, env = "LUMILENS_MAX_TOKENS", global = true)]
    max_tokens: Option<u32>,
}

impl OracleArgs {
    fn into_config(self) -> anyhow::Result<OracleConfig> {
        let defaults = OracleConfig::default();
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .context("no API key: set OPENAI_API_KEY or pass --api-key")?;
        Ok(OracleConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            api_key,
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
        })
    }
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Decision text file
    input: PathBuf,

    /// Precomputed reasoning Q&A for facts/procedural/substantive (skips stage 0)
    #[arg(long)]
    qa: Option<PathBuf>,

    /// Filter substantive rules out of the procedural list
    #[arg(long)]
    refine: bool,

    /// Reduce the decision to its pre-appeal content first
    #[arg(long)]
    redact: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    /// Text card (score only)
    Card,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Structured reasoning Q&A
    Qa(RunArgs),
    /// Key facts with relevancy and contestability
    Facts(RunArgs),
    /// Procedural rules and their effects
    Procedural(RunArgs),
    /// Substantive law, applicability, and relevance
    Substantive(RunArgs),
    /// Facts and both rule lists
    Extract(RunArgs),
    /// Admissibility scores for the procedural rules
    Admissibility(RunArgs),
    /// Relevance scores for the substantive rules
    Relevance(RunArgs),
    /// Full analysis with normalized scores and totals
    Score(RunArgs),
    /// Pre-appeal version of the decision
    Redact(RunArgs),
}

impl Command {
    fn args(&self) -> &RunArgs {
        match self {
            Self::Qa(a)
            | Self::Facts(a)
            | Self::Procedural(a)
            | Self::Substantive(a)
            | Self::Extract(a)
            | Self::Admissibility(a)
            | Self::Relevance(a)
            | Self::Score(a)
            | Self::Redact(a) => a,
        }
    }

    /// Reject flags the command would otherwise ignore.
    fn check_flags(&self) -> anyhow::Result<()> {
        let args = self.args();
        if args.format == OutputFormat::Card && !matches!(self, Self::Score(_)) {
            anyhow::bail!("--format card is only available for `score`");
        }
        if args.qa.is_some()
            && !matches!(self, Self::Facts(_) | Self::Procedural(_) | Self::Substantive(_))
        {
            anyhow::bail!("--qa is only available for `facts`, `procedural` and `substantive`");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("lumilens v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    cli.command.check_flags()?;
    let config = cli.oracle.into_config()?;
    tracing::debug!(?config, "oracle configured");

    let args = cli.command.args();
    let pipeline = Pipeline::new(Arc::new(ChatCompletionsOracle::new(&config)), &config)
        .with_options(PipelineOptions {
            refine_procedural: args.refine,
            redact_pre_appeal: args.redact,
        });

    let text = read_text(&args.input)?;
    let qa = args.qa.as_deref().map(read_text).transpose()?;
    let qa = qa.as_deref();

    match &cli.command {
        Command::Qa(_) => println!("{}", pipeline.reasoning_qa(&text).await?),
        Command::Redact(_) => println!("{}", pipeline.redact_pre_appeal(&text).await?),
        Command::Facts(_) => print_json(&pipeline.facts(&text, qa).await?)?,
        Command::Procedural(_) => print_json(&pipeline.procedural_rules(&text, qa).await?)?,
        Command::Substantive(_) => print_json(&pipeline.substantive_rules(&text, qa).await?)?,
        Command::Extract(_) => print_json(&pipeline.extract(&text).await?)?,
        Command::Admissibility(_) => print_json(&pipeline.admissibility(&text).await?)?,
        Command::Relevance(_) => print_json(&pipeline.relevance(&text).await?)?,
        Command::Score(a) => {
            let analysis = pipeline.score(&text).await?;
            match a.format {
                OutputFormat::Json => print_json(&analysis)?,
                OutputFormat::Card => {
                    let title = a
                        .input
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    display::print_analysis_card(&title, &analysis);
                }
            }
        }
    }

    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(argv: &[&str]) -> Command {
        Cli::try_parse_from(argv).unwrap().command
    }

    #[test]
    fn qa_file_accepted_for_single_extractions() {
        for sub in ["facts", "procedural", "substantive"] {
            let cmd = command(&["lumilens", sub, "decision.md", "--qa", "qa.txt"]);
            assert!(cmd.check_flags().is_ok(), "{sub}");
        }
    }

    #[test]
    fn qa_file_rejected_where_it_would_be_ignored() {
        for sub in ["qa", "extract", "admissibility", "relevance", "score", "redact"] {
            let cmd = command(&["lumilens", sub, "decision.md", "--qa", "qa.txt"]);
            let err = cmd.check_flags().unwrap_err();
            assert!(err.to_string().starts_with("--qa is only available"), "{sub}: {err}");
        }
    }

    #[test]
    fn card_format_only_for_score() {
        assert!(command(&["lumilens", "score", "d.md", "--format", "card"]).check_flags().is_ok());
        let err = command(&["lumilens", "extract", "d.md", "--format", "card"])
            .check_flags()
            .unwrap_err();
        assert!(err.to_string().contains("only available for `score`"));
    }
}
