//! Vectorizer CLI binary: run the embedding server or embed texts from the command line.
//!
//! Subcommands: `serve` (WebSocket server), `embed` (embed texts, print JSON), `lookup`
//! (catalog details for one model type), `models` (list the catalog).

use clap::{Parser, Subcommand};
use futures::StreamExt;
use std::io::Write;

use config::Settings;
use vectorizer::{catalog, EmbedOptions, ModelType};

type CliResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "vectorizer")]
#[command(about = "Vectorizer: concurrency-bounded text embedding service")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run the WebSocket server (ws://127.0.0.1:8080 unless VECTORIZER_ADDR or --addr)
    Serve(ServeArgs),
    /// Embed texts with the configured backend and print the vectors as JSON
    Embed(EmbedArgs),
    /// Show catalog details for one model type (e.g. E5_BASE_V2)
    Lookup(LookupArgs),
    /// List the model types in the catalog
    Models,
}

#[derive(clap::Args, Debug, Clone)]
struct ServeArgs {
    /// WebSocket listen address, overrides VECTORIZER_ADDR
    #[arg(long, value_name = "ADDR")]
    addr: Option<std::net::SocketAddr>,
    /// Exit after the first connection closes
    #[arg(long)]
    once: bool,
}

#[derive(clap::Args, Debug, Clone)]
struct EmbedArgs {
    /// Catalog model type to use instead of the default model
    #[arg(long, value_name = "TYPE")]
    model: Option<String>,
    /// Model source URL (or local `.zip`) to use instead of the default model
    #[arg(long, value_name = "URL", conflicts_with = "model")]
    model_url: Option<String>,
    /// Print one JSON line per text as soon as it is ready (completion order)
    #[arg(long)]
    stream: bool,
    /// Texts to embed
    #[arg(required = true, value_name = "TEXT")]
    texts: Vec<String>,
}

#[derive(clap::Args, Debug, Clone)]
struct LookupArgs {
    /// Model type identifier
    model_type: String,
}

fn print_json(value: &serde_json::Value) -> CliResult {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", serde_json::to_string(value)?)?;
    out.flush()?;
    Ok(())
}

fn lookup(args: &LookupArgs) -> CliResult {
    let d = catalog::lookup(&args.model_type)?;
    print_json(&serde_json::json!({
        "model_type": d.identifier,
        "model_name": d.display_name,
        "url": d.source_uri,
    }))
}

fn models() -> CliResult {
    let mut out = std::io::stdout().lock();
    for d in catalog::descriptors() {
        writeln!(out, "{}\t{}\t{}", d.identifier, d.display_name, d.source_uri)?;
    }
    Ok(())
}

async fn embed_texts(settings: &Settings, args: EmbedArgs) -> CliResult {
    let mut options = EmbedOptions::default();
    if let Some(m) = &args.model {
        options = options.with_model(m.parse::<ModelType>()?);
    }
    if let Some(url) = &args.model_url {
        options = options.with_model_url(url.as_str());
    }
    let service = serve::build_service(settings).await?;

    if !args.stream {
        let vectors = service.embed_many_with(args.texts, &options).await?;
        return print_json(&serde_json::json!(vectors));
    }

    let mut stream = service.embed_many_streaming_with(args.texts, &options).await?;
    let mut failed = 0;
    while let Some(item) = stream.next().await {
        let line = match item.result {
            Ok(v) => serde_json::json!({ "index": item.index, "embedding": v }),
            Err(e) => {
                failed += 1;
                serde_json::json!({ "index": item.index, "kind": e.kind(), "error": e.to_string() })
            }
        };
        print_json(&line)?;
    }
    if failed > 0 {
        return Err(format!("{} of {} texts failed", failed, stream.total()).into());
    }
    Ok(())
}

async fn run_server(settings: &Settings, args: ServeArgs) -> CliResult {
    let service = serve::build_service(settings).await?;
    let addr = args.addr.unwrap_or(settings.addr);
    serve::run_serve(addr, service, args.once).await
}

async fn run(args: Args) -> CliResult {
    // Catalog commands need neither settings nor a backend.
    match &args.cmd {
        Command::Lookup(a) => return lookup(a),
        Command::Models => return models(),
        _ => {}
    }

    let settings = Settings::from_env()?;
    let _guard = config::tracing_init::init(settings.log_dir.as_deref())?;
    tracing::debug!(?settings, "settings loaded");

    match args.cmd {
        Command::Serve(a) => run_server(&settings, a).await,
        Command::Embed(a) => embed_texts(&settings, a).await,
        Command::Lookup(_) | Command::Models => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = config::load_and_apply("vectorizer", None) {
        eprintln!("vectorizer: config: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = run(args).await {
        eprintln!("vectorizer: {}", e);
        std::process::exit(1);
    }
}
