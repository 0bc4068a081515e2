use std::{fs, path::PathBuf, process};

use clap::Parser;
use rdfns::{logging, CompletionTool, Config};

/// Look up RDF namespace prefixes and the terms of their vocabularies.
#[derive(Parser)]
#[command(name = "rdfns", version, about)]
struct Cli {
    /// Prefix to resolve.
    #[arg(default_value = "schema")]
    prefix: String,

    /// Cache directory [default: $RDF_VOCAB_CACHE or ~/rdf-vocab-cache].
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Complete inside this buffer instead of listing the prefix terms.
    #[arg(long, value_name = "FILE", requires = "context")]
    buffer: Option<PathBuf>,

    /// Token under the cursor, e.g. `foaf:Pe` or `@prefix fo`.
    #[arg(long, value_name = "TOKEN")]
    context: Option<String>,

    /// Word being completed.
    #[arg(long, value_name = "WORD", default_value = "")]
    partial: String,

    /// More logging, repeat for more.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json_logs);

    if let Err(e) = run(cli) {
        eprintln!("rdfns: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = match cli.cache_dir {
        Some(dir) => Config::default().with_base_dir(dir),
        None => Config::from_env(),
    };
    let mut tool = CompletionTool::new(&config)?;

    if let Some(context) = cli.context {
        let buffer = match cli.buffer {
            Some(path) => fs::read_to_string(path)?,
            None => String::new(),
        };
        let lines: Vec<&str> = buffer.lines().collect();
        let candidates = tool.complete(&lines, &context, &cli.partial)?;
        println!("{}", serde_json::to_string(&candidates)?);
        return Ok(());
    }

    let Some(uri) = tool.lookup(&cli.prefix) else {
        println!("{}: ", cli.prefix);
        return Ok(());
    };

    println!("{}: {}", cli.prefix, uri);
    for term in tool.vocab_terms(&uri)? {
        println!("    {}", term);
    }
    Ok(())
}
