use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use bytepair::config::{CorpusConfig, TrainerConfig};
use bytepair::corpus::load_text_corpus;
use bytepair::serialization::{load_table, save_table};
use bytepair::{Decoder, Encoder, MergeRuleTable, TokenId, Trainer};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::Env;
use log::info;
use serde_json::{json, Value};

const DEFAULT_OUTPUT: &str = "merges.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Byte-level BPE tokenizer toolkit", long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (-q, -qq)
    #[arg(short = 'q', long, global = true, action = ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a merge table from text inputs
    Train(TrainArgs),
    /// Encode text with a trained merge table
    Encode(EncodeArgs),
    /// Decode token ids back into text
    Decode(DecodeArgs),
    /// Inspect a trained merge table
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Files or directories of UTF-8 text to ingest
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output path for the merge list
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Target vocabulary size including the 256 byte tokens
    #[arg(long, value_name = "SIZE", default_value_t = 512)]
    vocab_size: usize,

    /// Minimum frequency for merges
    #[arg(long, value_name = "COUNT")]
    min_frequency: Option<usize>,

    /// Maximum merge iterations
    #[arg(long, value_name = "COUNT")]
    max_merge_iterations: Option<usize>,

    /// Wall-clock training deadline in seconds
    #[arg(long, value_name = "SECS")]
    time_limit_secs: Option<u64>,

    /// Disable per-iteration logging
    #[arg(long)]
    no_progress: bool,

    /// Emit pretty JSON
    #[arg(long)]
    pretty: bool,

    /// Disable recursive directory traversal
    #[arg(long)]
    no_recursive: bool,

    /// Follow symlinks during traversal
    #[arg(long)]
    follow_symlinks: bool,
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Merge list to load
    #[arg(short = 'm', long, value_name = "PATH")]
    merges: PathBuf,

    /// Text file to encode
    #[arg(required_unless_present = "text")]
    input: Option<PathBuf>,

    /// Encode a literal string instead of a file
    #[arg(long, value_name = "STRING", conflicts_with = "input")]
    text: Option<String>,

    /// Emit a JSON object instead of space-separated ids
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Merge list to load
    #[arg(short = 'm', long, value_name = "PATH")]
    merges: PathBuf,

    /// Token ids to decode; when omitted, a JSON array (or `encode --json`
    /// output) is read from stdin
    tokens: Vec<TokenId>,

    /// Write decoded text to a file instead of stdout
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Merge list to load
    #[arg(short = 'm', long, value_name = "PATH")]
    merges: PathBuf,

    /// Number of learned tokens to render
    #[arg(long, value_name = "COUNT", default_value_t = 16)]
    sample: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Encode(args) => run_encode(args),
        Commands::Decode(args) => run_decode(args),
        Commands::Info(args) => run_info(args),
    }
}

fn init_logging(verbose: u8, quiet: u8) {
    let default_level = match i16::from(verbose) - i16::from(quiet) {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

fn run_train(args: TrainArgs) -> Result<()> {
    let corpus_cfg = CorpusConfig::builder()
        .recursive(!args.no_recursive)
        .follow_symlinks(args.follow_symlinks)
        .build();
    let text = load_text_corpus(&args.inputs, &corpus_cfg).context("loading training corpus")?;
    info!("loaded {} bytes of training text", text.len());

    let mut builder = TrainerConfig::builder()
        .target_vocab_size(args.vocab_size)
        .show_progress(!args.no_progress)
        .max_merge_iterations(args.max_merge_iterations)
        .time_limit(args.time_limit_secs.map(Duration::from_secs));
    if let Some(min_frequency) = args.min_frequency {
        builder = builder.min_frequency(min_frequency);
    }
    let cfg = builder.build().context("invalid trainer configuration")?;

    let artifacts = Trainer::new(cfg).train(&text).context("training failed")?;
    print!("{artifacts}");

    save_table(&artifacts.table, &args.output, args.pretty)
        .with_context(|| format!("writing merge list to {}", args.output.display()))?;
    info!("wrote {} rules to {}", artifacts.table.len(), args.output.display());
    Ok(())
}

fn run_encode(args: EncodeArgs) -> Result<()> {
    let table = load_merges(&args.merges)?;
    let text = match (&args.text, &args.input) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("reading input {}", path.display()))?,
        (None, None) => bail!("either an input file or --text is required"),
    };

    let tokens = Encoder::new(&table).encode(&text);
    if args.json {
        let payload = json!({
            "tokens": tokens,
            "input_bytes": text.len(),
            "token_count": tokens.len(),
        });
        println!("{payload}");
    } else {
        let rendered: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        println!("{}", rendered.join(" "));
    }
    Ok(())
}

fn run_decode(args: DecodeArgs) -> Result<()> {
    let table = load_merges(&args.merges)?;
    let tokens = if args.tokens.is_empty() {
        read_stdin_tokens()?
    } else {
        args.tokens
    };
    let text = Decoder::new(&table).decode(&tokens);
    match args.output {
        Some(path) => {
            let mut file = fs::File::create(&path)
                .with_context(|| format!("creating output {}", path.display()))?;
            file.write_all(text.as_bytes())
                .with_context(|| format!("writing output {}", path.display()))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn run_info(args: InfoArgs) -> Result<()> {
    let table = load_merges(&args.merges)?;
    println!("Merge rules: {}", table.len());
    println!("Vocab size: {}", table.vocab_size());
    println!("Next token id: {}", table.next_id());

    let decoder = Decoder::new(&table);
    for &(pair, new_id) in table.rules().iter().take(args.sample) {
        let rendered = decoder.decode(&[new_id]);
        println!("  {new_id} <- ({}, {}) {rendered:?}", pair.0, pair.1);
    }
    if table.len() > args.sample {
        println!("  ... {} more", table.len() - args.sample);
    }
    Ok(())
}

/// Reads token ids from stdin as either a bare JSON array or the object
/// emitted by `encode --json`, so the two subcommands pipe together.
fn read_stdin_tokens() -> Result<Vec<TokenId>> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("reading token ids from stdin")?;
    let value: Value =
        serde_json::from_str(buffer.trim()).context("parsing stdin as JSON token ids")?;
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .get("tokens")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("JSON object on stdin is missing a \"tokens\" array"))?,
        _ => bail!("expected a JSON array of token ids on stdin"),
    };
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .and_then(|id| TokenId::try_from(id).ok())
                .ok_or_else(|| anyhow!("token id {item} is not an unsigned 32-bit integer"))
        })
        .collect()
}

fn load_merges(path: &PathBuf) -> Result<MergeRuleTable> {
    load_table(path).with_context(|| format!("loading merge list from {}", path.display()))
}
