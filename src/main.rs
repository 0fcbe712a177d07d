use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use zoning_qa::{
    config::Config,
    indexing::IndexingService,
    loader::{self, DEFAULT_CHUNK_SIZE},
    logging,
    query::{
        AnswerService, LlmDecomposer, OpenAiCompatChat, QueryDecomposer, RetrievalService,
        NO_INFORMATION_MESSAGE,
    },
};

#[derive(Parser)]
#[command(
    name = "zoning-qa",
    about = "Index zoning by-law documents into Qdrant and answer questions against them"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk, embed, and index a document text export.
    Index {
        /// Path to the UTF-8 text export of the document.
        #[arg(long)]
        file: PathBuf,
    },
    /// Answer a single question against the indexed document.
    Ask {
        /// The question to answer.
        query: String,
        /// Skip query decomposition and search the query as-is.
        #[arg(long)]
        no_decompose: bool,
        /// Print the fused retrieval context alongside the answer.
        #[arg(long)]
        show_context: bool,
    },
    /// Interactive question loop; type `exit` to quit.
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    logging::init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Index { file } => index(&config, &file).await,
        Command::Ask {
            query,
            no_decompose,
            show_context,
        } => ask(&config, &query, no_decompose, show_context).await,
        Command::Chat => chat(&config).await,
    }
}

async fn index(config: &Config, file: &PathBuf) -> Result<()> {
    let chunk_size = config.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
    let chunks = loader::load_document(file, chunk_size, config.chunk_overlap)?;
    println!("Loaded {} chunks from {}", chunks.len(), file.display());

    let service = IndexingService::from_config(config)?;
    let summary = service.index_document(&chunks).await?;

    if summary.is_complete() {
        println!(
            "Indexed {} records into '{}' ({} degraded embeddings)",
            summary.upserted, config.collection, summary.degraded
        );
    } else {
        println!(
            "Partial indexing: {}/{} records reached '{}' ({} degraded embeddings)",
            summary.upserted, summary.expected, config.collection, summary.degraded
        );
    }
    Ok(())
}

async fn ask(config: &Config, query: &str, no_decompose: bool, show_context: bool) -> Result<()> {
    let retrieval = RetrievalService::from_config(config)?;
    if !retrieval.collection_status().await?.has_data() {
        println!(
            "Collection '{}' has no data yet. Run `zoning-qa index --file <document>` first.",
            config.collection
        );
        return Ok(());
    }

    let decomposition = if no_decompose {
        None
    } else {
        let decomposer = LlmDecomposer::new(Box::new(OpenAiCompatChat::from_config(config)?));
        Some(decomposer.decompose(query).await)
    };

    let context = retrieval.retrieve(query, decomposition.as_ref()).await;
    if show_context {
        println!("{}", context.render());
    }

    if context.is_empty() {
        println!("{NO_INFORMATION_MESSAGE}");
        return Ok(());
    }

    let answerer = AnswerService::new(Box::new(OpenAiCompatChat::from_config(config)?));
    let answer = answerer.answer(query, &context).await?;
    println!("{answer}");
    Ok(())
}

async fn chat(config: &Config) -> Result<()> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let query = line?;
        let query = query.trim();
        if query.is_empty() {
            continue;
        }
        if query == "exit" {
            break;
        }
        ask(config, query, false, false).await?;
    }
    Ok(())
}
