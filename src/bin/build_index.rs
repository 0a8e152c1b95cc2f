use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marquee_api::index::{ArtifactPaths, IdfWeighting, Indexer};

/// Builds the catalog and similarity artifacts from a CSV source
#[derive(Debug, Parser)]
#[command(name = "build-index", version)]
struct Args {
    /// CSV file with `title`, `genre` and `desc` columns
    #[arg(short, long)]
    input: PathBuf,

    /// Directory receiving movies.json and similarity.json
    #[arg(short, long, default_value = "data")]
    out_dir: PathBuf,

    /// IDF formula
    #[arg(long, value_enum, env = "IDF_WEIGHTING", default_value_t = IdfWeighting::Standard)]
    idf: IdfWeighting,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "marquee_api=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();
    let paths = ArtifactPaths::in_dir(&args.out_dir);

    let manifest = Indexer::new(args.idf)
        .build(&args.input, &paths)
        .with_context(|| format!("Failed to build index from {}", args.input.display()))?;

    tracing::info!(
        movies = manifest.movie_count,
        vocabulary = manifest.vocabulary_size,
        out_dir = %args.out_dir.display(),
        "Index build complete"
    );

    Ok(())
}
