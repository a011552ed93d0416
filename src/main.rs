use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use repoinsight::export::ExportRenderer;
use repoinsight::server::{self, AppState};
use repoinsight::{
    Analysis, AnalysisMode, AnalysisPipeline, AnalysisStatus, Config, ExportFormat, ExportStore,
    GeminiProvider, GitHubClient, InsightGenerator, LLMProvider, PipelineConfig, Storage,
};

const DEFAULT_LOG_FILTER: &str = "repoinsight=info,reqwest=warn,tower_http=info";

#[derive(Parser, Debug)]
#[command(name = "repoinsight")]
#[command(version)]
#[command(about = "Analyze GitHub repositories and export AI-assisted reports")]
struct Args {
    /// SQLite database path (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Address to listen on (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Analyze a repository, reusing a completed analysis when one exists
    Analyze {
        url: String,
        /// Discard earlier analyses and start over
        #[arg(long)]
        fresh: bool,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Delete earlier analyses of a repository and analyze it again
    Reanalyze {
        url: String,
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List stored analyses, newest first
    List {
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// processing, completed or failed
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Write an export of a completed analysis to disk
    Export {
        id: uuid::Uuid,
        /// md, txt, pdf or docx
        format: String,
        /// Output file (defaults to the export's own filename)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(database) = args.database {
        config.database_path = database;
    }

    match args.command {
        Command::Serve { bind } => {
            let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            let pipeline = build_pipeline(&config, true).await?;
            if pipeline.model().is_none() {
                tracing::warn!(
                    "Serving without a language model; insights will use local heuristics"
                );
            }
            server::serve(&bind_addr, AppState::new(pipeline)).await?;
        }
        Command::Analyze { url, fresh, format } => {
            let mode = if fresh { AnalysisMode::Fresh } else { AnalysisMode::Reuse };
            let spinner = spinner()?;
            let pipeline = build_pipeline(&config, true).await?.with_progress(spinner.clone());
            let analysis = pipeline.analyze(&url, mode).await;
            spinner.finish_and_clear();
            print_analysis(&analysis?, format)?;
        }
        Command::Reanalyze { url, format } => {
            let spinner = spinner()?;
            let pipeline = build_pipeline(&config, true).await?.with_progress(spinner.clone());
            let analysis = pipeline.reanalyze(&url).await;
            spinner.finish_and_clear();
            print_analysis(&analysis?, format)?;
        }
        Command::List { limit, status } => {
            let status = status.map(|s| s.parse::<AnalysisStatus>()).transpose()?;
            let pipeline = build_pipeline(&config, false).await?;
            let (analyses, count) = pipeline.list(Some(limit), status)?;
            for analysis in &analyses {
                println!(
                    "{}  {:<10}  {:<40}  {}",
                    analysis.id,
                    analysis.status,
                    analysis.full_name(),
                    analysis.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
            println!("\n{} of {} analyses", analyses.len(), count);
        }
        Command::Export { id, format, output } => {
            let format: ExportFormat = format.parse()?;
            let pipeline = build_pipeline(&config, false).await?;
            let download = pipeline.download(id, format).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(&download.export.filename));
            std::fs::write(&path, &download.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} ({} bytes)", path.display(), download.bytes.len());
        }
    }

    Ok(())
}

fn spinner() -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

/// Wire the pipeline from configuration. Commands that only read stored
/// analyses skip the model probe.
async fn build_pipeline(config: &Config, connect_model: bool) -> anyhow::Result<AnalysisPipeline> {
    let storage = Storage::new(&config.database_path)
        .with_context(|| format!("opening database {}", config.database_path))?;

    let github = GitHubClient::new(
        config.github_token.as_deref(),
        Duration::from_secs(config.request_timeout_secs),
    )?
    .with_base_url(&config.github_api_url);
    if !github.is_authenticated() {
        tracing::info!("GITHUB_TOKEN not set; using unauthenticated GitHub API access");
    }

    let llm: Option<Arc<dyn LLMProvider>> = if connect_model {
        match GeminiProvider::connect(
            &config.gemini_api_key,
            &config.gemini_models,
            &config.gemini_api_url,
            Duration::from_secs(config.model_timeout_secs),
        )
        .await
        {
            Ok(provider) => Some(Arc::new(provider)),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    } else {
        None
    };

    Ok(AnalysisPipeline::new(
        Arc::new(github),
        InsightGenerator::new(llm),
        storage,
        ExportStore::new(&config.export_dir),
        PipelineConfig::from(config),
    ))
}

fn print_analysis(analysis: &Analysis, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(analysis)?),
        OutputFormat::Text => {
            let rendered = ExportRenderer::new().render(analysis, ExportFormat::Text)?;
            println!("{}", String::from_utf8_lossy(&rendered.bytes));
            println!("Analysis id: {}", analysis.id);
        }
    }
    Ok(())
}
