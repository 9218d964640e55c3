use anyhow::{Context, Result};
use artifact_store::{ArtifactBundle, ArtifactStore, StoreError};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::LoadReport;
use pipeline::{ExtractionReport, OfflinePipeline, PipelineConfig, Precision};
use poster_client::{NoPosters, PosterClient, PosterConfig, PosterSource};
use server::{
    RecommendationResponse, RecommendationService, Recommender, ServiceCaches, ServiceConfig,
    ServiceError,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

/// movie-recs - Content-based movie recommender
#[derive(Parser)]
#[command(name = "movie-recs")]
#[command(about = "Recommend movies similar to one you liked, from TMDB metadata", long_about = None)]
struct Cli {
    /// Directory holding the precomputed artifacts
    #[arg(short, long, global = true, default_value = "artifacts")]
    artifacts_dir: PathBuf,

    #[command(flatten)]
    posters: PosterArgs,

    #[command(flatten)]
    caches: CacheArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PosterArgs {
    /// TMDB API key; posters are disabled without one
    #[arg(long, global = true, env = "TMDB_API_KEY", hide_env_values = true)]
    tmdb_api_key: Option<String>,

    /// TMDB details API base URL
    #[arg(long, global = true, env = "TMDB_API_URL", default_value = "https://api.themoviedb.org")]
    tmdb_api_url: String,

    /// Prefix for poster image URLs
    #[arg(long, global = true, env = "TMDB_IMAGE_URL", default_value = "https://image.tmdb.org/t/p/w500")]
    tmdb_image_url: String,

    /// Timeout for one poster request, in seconds
    #[arg(long, global = true, default_value = "10")]
    poster_timeout_secs: u64,

    /// Attempts per poster, including the first
    #[arg(long, global = true, default_value = "3")]
    poster_attempts: usize,
}

#[derive(Args)]
struct CacheArgs {
    /// Titles whose recommendations are kept in memory
    #[arg(long, global = true, default_value = "256")]
    recommendation_cache: usize,

    /// Poster URLs kept in memory
    #[arg(long, global = true, default_value = "1024")]
    poster_cache: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the artifacts from the TMDB CSV files
    Build {
        /// Path to tmdb_5000_movies.csv
        #[arg(long, default_value = "data/tmdb_5000_movies.csv")]
        movies: PathBuf,

        /// Path to tmdb_5000_credits.csv
        #[arg(long, default_value = "data/tmdb_5000_credits.csv")]
        credits: PathBuf,

        /// Vocabulary size cap
        #[arg(long, default_value = "5000")]
        max_features: usize,

        /// Storage precision of the similarity matrix (single or double)
        #[arg(long, default_value = "single")]
        precision: Precision,

        /// How many genres, keywords and cast members become tags
        #[arg(long, default_value = "3")]
        top_entries: usize,
    },

    /// Recommend five movies similar to a title
    Recommend {
        /// Exact movie title, as listed by `titles`
        #[arg(long)]
        title: String,

        /// Skip poster lookups
        #[arg(long)]
        no_posters: bool,
    },

    /// List known titles
    Titles {
        /// Only titles containing this text (case-insensitive)
        #[arg(long)]
        filter: Option<String>,
    },

    /// Read titles from stdin, one per line, and recommend for each
    Interactive {
        /// Skip poster lookups
        #[arg(long)]
        no_posters: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        if let Some(dir) = missing_artifacts(&err) {
            eprintln!(
                "{} Model artifacts not found in {}. Please run `movie-recs build` first to generate them.",
                "✗".red(),
                dir
            );
            std::process::exit(2);
        }
        return Err(err);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        artifacts_dir,
        posters,
        caches,
        command,
    } = cli;

    match command {
        Commands::Build {
            movies,
            credits,
            max_features,
            precision,
            top_entries,
        } => {
            let config = PipelineConfig {
                max_features,
                precision,
                top_entries,
            };
            handle_build(config, movies, credits, artifacts_dir).await
        }
        Commands::Recommend { title, no_posters } => {
            let service = load_service(&artifacts_dir, &posters, &caches, no_posters)?;
            let response = service.recommend(&title).await;
            print_response(&response);
            Ok(())
        }
        Commands::Titles { filter } => handle_titles(&artifacts_dir, filter),
        Commands::Interactive { no_posters } => {
            let service = load_service(&artifacts_dir, &posters, &caches, no_posters)?;
            handle_interactive(service).await
        }
    }
}

/// Handle the 'build' command
async fn handle_build(
    config: PipelineConfig,
    movies: PathBuf,
    credits: PathBuf,
    artifacts_dir: PathBuf,
) -> Result<()> {
    println!(
        "Building artifacts from {} and {}...",
        movies.display(),
        credits.display()
    );
    let start = Instant::now();

    // The whole build is CPU-bound
    let (load_report, extraction_report, bundle) = tokio::task::spawn_blocking(move || {
        let pipeline = OfflinePipeline::new(config).context("Invalid build settings")?;
        let output = pipeline
            .run(&movies, &credits)
            .context("Failed to preprocess the TMDB dataset")?;
        let load_report = output.load_report;
        let extraction_report = output.extraction_report.clone();
        let bundle = ArtifactBundle::from_pipeline(output, config.max_features)
            .context("Pipeline produced a misaligned bundle")?;
        ArtifactStore::new(&artifacts_dir)
            .save(&bundle)
            .with_context(|| format!("Failed to save artifacts to {}", artifacts_dir.display()))?;
        Ok::<_, anyhow::Error>((load_report, extraction_report, bundle))
    })
    .await
    .context("Build task panicked")??;

    print_build_summary(&load_report, &extraction_report, &bundle);
    println!("{} Built artifacts in {:.2?}", "✓".green(), start.elapsed());
    Ok(())
}

/// Handle the 'titles' command
fn handle_titles(artifacts_dir: &Path, filter: Option<String>) -> Result<()> {
    let recommender = Recommender::from_store(&ArtifactStore::new(artifacts_dir))?;

    let titles: Vec<&str> = match &filter {
        Some(needle) => recommender
            .search(needle)
            .into_iter()
            .map(|m| m.title.as_str())
            .collect(),
        None => recommender.titles(),
    };

    for title in &titles {
        println!("{}", title);
    }
    println!(
        "{}",
        format!("{} of {} titles", titles.len(), recommender.len()).dimmed()
    );
    Ok(())
}

/// Handle the 'interactive' command
async fn handle_interactive(service: RecommendationService) -> Result<()> {
    println!(
        "{}",
        format!(
            "Loaded {} movies. Type a title and press Enter (empty line or Ctrl-D to quit).",
            service.recommender().len()
        )
        .bold()
        .blue()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };
        let Some(title) = title_from_line(&line) else {
            break;
        };
        let response = service.recommend(title).await;
        print_response(&response);
    }
    Ok(())
}

/// Strip the line ending only; titles are matched byte for byte.
/// An empty line ends the session.
fn title_from_line(line: &str) -> Option<&str> {
    let title = line.trim_end_matches(['\r', '\n']);
    (!title.is_empty()).then_some(title)
}

/// Load artifacts and wire up posters and caches
fn load_service(
    artifacts_dir: &Path,
    posters: &PosterArgs,
    caches: &CacheArgs,
    no_posters: bool,
) -> Result<RecommendationService> {
    let start = Instant::now();
    let recommender = Recommender::from_store(&ArtifactStore::new(artifacts_dir))?;
    println!(
        "{} Loaded {} movies in {:.2?}",
        "✓".green(),
        recommender.len(),
        start.elapsed()
    );

    let caches = ServiceCaches::new(&ServiceConfig {
        recommendation_cache_capacity: caches.recommendation_cache,
        poster_cache_capacity: caches.poster_cache,
    })
    .context("Invalid cache settings")?;

    Ok(RecommendationService::new(
        recommender,
        poster_source(posters, no_posters)?,
        caches,
    ))
}

fn poster_source(args: &PosterArgs, disabled: bool) -> Result<Arc<dyn PosterSource>> {
    let api_key = args
        .tmdb_api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty());

    match api_key {
        Some(api_key) if !disabled => {
            let client = PosterClient::new(PosterConfig {
                api_key: api_key.to_string(),
                api_url: args.tmdb_api_url.clone(),
                image_base_url: args.tmdb_image_url.clone(),
                timeout: Duration::from_secs(args.poster_timeout_secs),
                max_attempts: args.poster_attempts,
                ..PosterConfig::default()
            })
            .context("Failed to configure the TMDB poster client")?;
            Ok(Arc::new(client))
        }
        _ => {
            info!("Posters disabled");
            Ok(Arc::new(NoPosters))
        }
    }
}

/// The artifact directory, when `err` means "nothing has been built yet"
fn missing_artifacts(err: &anyhow::Error) -> Option<&str> {
    match err.downcast_ref::<ServiceError>()? {
        ServiceError::Store(StoreError::ArtifactsMissing { dir }) => Some(dir.as_str()),
        _ => None,
    }
}

fn print_build_summary(load: &LoadReport, extraction: &ExtractionReport, bundle: &ArtifactBundle) {
    println!("{}", "Build summary:".bold().blue());
    println!(
        "{}Rows: {} movies, {} credits, {} joined",
        "• ".green(),
        load.movie_rows,
        load.credit_rows,
        load.joined_rows
    );
    println!(
        "{}Dropped {} incomplete rows, kept {}",
        "• ".green(),
        load.dropped_incomplete,
        load.kept()
    );
    if extraction.malformed_fields() > 0 {
        for (field, count) in &extraction.malformed_by_field {
            println!(
                "{}{} movies had malformed {}",
                "• ".yellow(),
                count,
                field
            );
        }
    }
    println!(
        "{}Vocabulary: {} terms (cap {})",
        "• ".cyan(),
        bundle.manifest.vocabulary_size,
        bundle.manifest.max_features
    );
    println!(
        "{}Similarity: {}x{} ({} precision)",
        "• ".cyan(),
        bundle.similarity.dimension(),
        bundle.similarity.dimension(),
        bundle.manifest.precision
    );
}

fn print_response(response: &RecommendationResponse) {
    if !response.found {
        println!("{}", "Movie not found in the dataset.".yellow());
        return;
    }
    if response.items.is_empty() {
        println!("No other movies to recommend.");
        return;
    }

    println!(
        "{}",
        format!("Because you liked {}:", response.query).bold().blue()
    );
    for (i, movie) in response.items.iter().enumerate() {
        println!(
            "{}. {} (similarity {:.2})",
            (i + 1).to_string().green(),
            movie.title,
            movie.score
        );
        match &movie.poster_url {
            Some(url) => println!("   {}", url),
            None => println!("   {}", "Poster not available".dimmed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_interactive_line_keeps_title_bytes() {
        assert_eq!(title_from_line(" The Host \r\n"), Some(" The Host "));
        assert_eq!(title_from_line("Avatar"), Some("Avatar"));
        assert_eq!(title_from_line("\r"), None);
        assert_eq!(title_from_line(""), None);
    }

    #[test]
    fn test_missing_artifacts_is_recognised() {
        let err: anyhow::Error = ServiceError::Store(StoreError::ArtifactsMissing {
            dir: "artifacts".to_string(),
        })
        .into();
        assert_eq!(missing_artifacts(&err), Some("artifacts"));

        let other: anyhow::Error = ServiceError::InvalidConfig("bad".to_string()).into();
        assert_eq!(missing_artifacts(&other), None);
    }

    #[test]
    fn test_build_arguments_parse() {
        let cli = Cli::parse_from([
            "movie-recs",
            "--artifacts-dir",
            "out",
            "build",
            "--precision",
            "double",
            "--max-features",
            "100",
        ]);

        assert_eq!(cli.artifacts_dir, PathBuf::from("out"));
        match cli.command {
            Commands::Build {
                precision,
                max_features,
                ..
            } => {
                assert_eq!(precision, Precision::Double);
                assert_eq!(max_features, 100);
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_poster_source_without_key_is_disabled() {
        let cli = Cli::parse_from(["movie-recs", "titles"]);
        let mut args = cli.posters;
        args.tmdb_api_key = Some("   ".to_string());
        assert!(poster_source(&args, false).is_ok());
    }
}
