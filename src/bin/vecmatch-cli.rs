//! vecmatch CLI
//!
//! Index documents into the vector store, search it, and score documents
//! against target descriptions. Embeddings come from the local hash embedder.

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use vecmatch::scoring::DEFAULT_SEMANTIC_WEIGHT;
use vecmatch::{
    Config, HashEmbedder, MatchReport, MatchScorer, Matcher, TermMatchMode, VectorStore,
    VocabularyExtractor, DEFAULT_DIMENSION,
};

/// vecmatch - hybrid semantic + keyword document matching
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Vector store file (metadata is written next to it)
    #[arg(short, long, default_value = "./data/vecmatch.vdx")]
    index: PathBuf,

    /// Embedding dimension
    #[arg(short, long, default_value_t = DEFAULT_DIMENSION)]
    dimension: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Embed a document and append it to the store
    Insert {
        /// External document id
        #[arg(long)]
        id: i64,

        #[command(flatten)]
        input: TextInput,
    },

    /// Find the stored documents nearest to a text
    Search {
        #[command(flatten)]
        input: TextInput,

        /// Number of neighbors
        #[arg(short, default_value_t = 5)]
        k: usize,
    },

    /// Score a document against a target description
    Score {
        /// Document text file
        #[arg(long)]
        document: PathBuf,

        /// Target description file
        #[arg(long)]
        target: PathBuf,

        /// Keyword vocabulary, one term per line
        #[arg(long)]
        vocabulary: PathBuf,

        /// Share of semantic similarity in the score
        #[arg(long, default_value_t = DEFAULT_SEMANTIC_WEIGHT)]
        semantic_weight: f64,

        /// Match terms on whole tokens instead of substrings
        #[arg(long)]
        whole_token: bool,

        /// Also store the document embedding under this id
        #[arg(long)]
        store_id: Option<i64>,
    },

    /// Show store statistics
    Stats,
}

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
struct TextInput {
    /// Inline text
    #[arg(long)]
    text: Option<String>,

    /// Read the text from a file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl TextInput {
    fn read(&self) -> anyhow::Result<String> {
        match (&self.text, &self.file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => {
                fs::read_to_string(path).with_context(|| format!("reading {:?}", path))
            }
            (None, None) => anyhow::bail!("either --text or --file is required"),
        }
    }
}

fn print_report(report: &MatchReport) {
    let result = &report.result;
    println!("Match:          {:.2}%", result.match_percentage);
    println!("Semantic:       {:.2}%", result.semantic_score);
    println!("Term overlap:   {:.2}%", result.skill_overlap_score);
    println!("Matched terms:  {}", result.matched_terms.join(", "));
    println!("Missing terms:  {}", result.missing_terms.join(", "));
    if let Some(slot) = report.slot_id {
        println!("Stored at slot: {}", slot);
    }
    println!();
    println!("{}", report.explanation);
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("vecmatch=info".parse()?))
        .init();

    let args = Args::parse();

    let config = Config::default()
        .with_index_path(&args.index)
        .with_dimension(args.dimension);
    config.validate()?;

    let embedder = HashEmbedder::new(config.dimension)?;

    match args.command {
        Command::Insert { id, input } => {
            let text = input.read()?;
            let matcher = Matcher::open(&config, embedder, VocabularyExtractor::default())
                .with_context(|| format!("opening store {:?}", config.index_path))?;
            let slot = matcher.index_document(id, &text)?;
            println!("Stored document {} at slot {}", id, slot);
            info!("{}", matcher.metrics().summary());
        }

        Command::Search { input, k } => {
            let text = input.read()?;
            let matcher = Matcher::open(&config, embedder, VocabularyExtractor::default())
                .with_context(|| format!("opening store {:?}", config.index_path))?;
            let hits = matcher.similar_documents(&text, k)?;
            if hits.is_empty() {
                println!("(no documents)");
            }
            for hit in hits {
                println!("{}\t{}\t{:.6}", hit.external_id, hit.slot_id, hit.distance);
            }
            info!("{}", matcher.metrics().summary());
        }

        Command::Score {
            document,
            target,
            vocabulary,
            semantic_weight,
            whole_token,
            store_id,
        } => {
            let document_text = fs::read_to_string(&document)
                .with_context(|| format!("reading {:?}", document))?;
            let target_text =
                fs::read_to_string(&target).with_context(|| format!("reading {:?}", target))?;
            let extractor = VocabularyExtractor::from_file(&vocabulary)
                .with_context(|| format!("loading vocabulary {:?}", vocabulary))?;
            info!("Loaded {} vocabulary terms", extractor.len());

            let term_match = if whole_token {
                TermMatchMode::WholeToken
            } else {
                TermMatchMode::Substring
            };
            let config = config
                .with_semantic_weight(semantic_weight)
                .with_term_match(term_match);
            config.validate()?;

            let (report, summary) = match store_id {
                Some(id) => {
                    let matcher = Matcher::open(&config, embedder, extractor)?;
                    let report = matcher.match_document(id, &document_text, &target_text)?;
                    (report, matcher.metrics().summary())
                }
                None => {
                    // Scoring only; nothing touches the index file
                    let store = Arc::new(VectorStore::new(config.dimension)?);
                    let scorer = MatchScorer::new(config.scorer_config())?;
                    let matcher = Matcher::new(embedder, extractor, scorer, store)?;
                    let report = matcher.score_texts(&document_text, &target_text)?;
                    (report, matcher.metrics().summary())
                }
            };
            print_report(&report);
            info!("{}", summary);
        }

        Command::Stats => {
            let store = VectorStore::open(&config.index_path, config.dimension)
                .with_context(|| format!("opening store {:?}", config.index_path))?;
            println!("Path:       {:?}", config.index_path);
            println!("Dimension:  {}", store.dimension());
            println!("Vectors:    {}", store.count());
            println!("Generation: {}", store.generation());
        }
    }

    Ok(())
}
