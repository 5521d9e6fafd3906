use anyhow::{bail, Context, Result};
use clap::Parser;
use gramdex::{ingest, CompressionMode, EngineConfig, Gramdex, IndexSettings, JsonLinesSource};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "gramdex")]
#[command(about = "N-gram full-text indexer and search", long_about = None)]
struct Args {
    /// Data directory for the index store
    #[arg(long, env = "GRAMDEX_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// JSON-lines dump to index ({"title": ..., "body": ...} per line)
    #[arg(short = 'x', long, env = "GRAMDEX_INDEX")]
    index: Option<PathBuf>,

    /// Maximum number of documents to index (0 for no limit)
    #[arg(short = 'm', long, env = "GRAMDEX_MAX_DOCS", default_value_t = gramdex::config::DEFAULT_MAX_DOCUMENTS)]
    max_docs: usize,

    /// Query to run after indexing
    #[arg(short = 'q', long, env = "GRAMDEX_QUERY")]
    query: Option<String>,

    /// N-gram length
    #[arg(long, env = "GRAMDEX_TOKEN_LEN")]
    token_len: Option<usize>,

    /// Distinct buffered tokens before a flush
    #[arg(long, env = "GRAMDEX_THRESHOLD")]
    threshold: Option<usize>,

    /// Postings compression (none, delta)
    #[arg(long, env = "GRAMDEX_COMPRESS")]
    compress: Option<String>,

    /// JSON file with index settings; flags override its values
    #[arg(long, env = "GRAMDEX_SETTINGS")]
    settings: Option<PathBuf>,

    /// Keep the index in memory instead of on disk
    #[arg(long, env = "GRAMDEX_IN_MEMORY")]
    in_memory: bool,
}

fn build_settings(args: &Args) -> Result<IndexSettings> {
    let mut settings = match &args.settings {
        Some(path) => IndexSettings::from_json_file(path)
            .with_context(|| format!("loading settings from {:?}", path))?,
        None => IndexSettings::default(),
    };
    if let Some(token_len) = args.token_len {
        settings = settings.with_token_len(token_len);
    }
    if let Some(threshold) = args.threshold {
        settings = settings.with_buffer_update_threshold(threshold);
    }
    if let Some(compress) = &args.compress {
        settings = settings.with_compression(compress.parse::<CompressionMode>()?);
    }
    settings.validate()?;
    Ok(settings)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    if args.index.is_none() && args.query.is_none() {
        bail!("nothing to do: pass --index and/or --query");
    }

    info!("Starting gramdex v{}", gramdex::VERSION);
    let settings = build_settings(&args)?;

    let engine = if args.in_memory {
        Gramdex::in_memory(settings)?
    } else {
        Gramdex::open(&EngineConfig::new(args.data_dir.clone()).with_settings(settings))?
    };

    if let Some(path) = &args.index {
        let source = JsonLinesSource::open(path)
            .with_context(|| format!("opening dump {:?}", path))?;
        let max_documents = (args.max_docs > 0).then_some(args.max_docs);
        let mut session = engine.session()?;
        let report = ingest(&mut session, source, max_documents)?;
        println!(
            "Indexed {} documents ({} skipped, {} flushes)",
            report.indexed, report.skipped, report.flushes
        );
    }

    if let Some(query) = &args.query {
        let hits = engine.search_hits(query)?;
        println!("Total {} documents are found!", hits.len());
        for hit in &hits {
            print!(
                "document_id: {} title: {} score: {:.6}",
                hit.document_id,
                hit.display_title(),
                hit.score
            );
            match &hit.lookup_error {
                Some(e) => println!(" ({})", e),
                None => println!(),
            }
        }
    }

    Ok(())
}
