mod report;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nota_config::Config;
use nota_engine::{
    BlockRef, LocalStore, NoteIndex, NoteStore, ParsedNote, io, parse_many, parse_str,
};

use report::Reporter;

#[derive(Parser)]
#[command(name = "nota", version, about = "Parse and query free-form notes")]
struct Cli {
    /// Notes directory (defaults to the config file, then $NOTA_HOME, then ~/.nota)
    #[arg(long, global = true)]
    notes: Option<PathBuf>,

    /// Only consider notes whose id starts with this prefix
    #[arg(long, global = true)]
    scope: Option<String>,

    /// Disable colored diagnostic output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List note ids
    List,

    /// Parse one note and print its outline
    Parse {
        /// Note id, e.g. tools/git
        note: String,

        /// Print the parse result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Parse every note and report diagnostics (exit 1 on errors)
    Check,

    /// Top-level blocks of one note
    Blocks { note: String },

    /// Blocks containing a hashtag
    Tag { name: String },

    /// Blocks using a term, with per-note counts
    Term { name: String },

    /// Case-insensitive text search
    Search { query: String },

    /// Ranked keyword lookup
    Find { query: String },
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let notes_path = match &cli.notes {
        Some(path) => path.clone(),
        None => {
            let config = Config::resolve()?;
            log::debug!("notes directory from {}", config.source);
            config.notes_path
        }
    };
    io::validate_notes_dir(&notes_path).with_context(|| {
        format!(
            "Pass --notes or set notes_path in {}",
            Config::config_path().display()
        )
    })?;
    log::debug!("notes directory: {}", notes_path.display());
    let store = LocalStore::open(&notes_path)?;
    let scope = cli.scope.as_deref();

    match &cli.command {
        Command::List => {
            for file in store.list()? {
                if scope.is_none_or(|p| file.id().starts_with(p)) {
                    println!("{}", file.id());
                }
            }
        }
        Command::Parse { note, json } => {
            let text = store.read(note)?;
            let parsed = parse_str(&text, Some(note.as_str()));
            if *json {
                println!("{}", serde_json::to_string_pretty(&parsed)?);
            } else {
                print!("{}", parsed.outline());
                Reporter::new(cli.no_color).emit(note, &parsed);
            }
        }
        Command::Check => {
            let notes = load(&store, scope)?;
            let mut reporter = Reporter::new(cli.no_color);
            let errors: usize = notes
                .iter()
                .map(|(id, note)| reporter.emit(id, note))
                .sum();
            let warnings: usize = notes
                .values()
                .map(|n| n.diagnostics.len())
                .sum::<usize>()
                - errors;
            let failing = notes.values().filter(|n| n.has_errors()).count();
            log::info!(
                "checked {} notes ({failing} failing): {errors} errors, {warnings} warnings",
                notes.len()
            );
            if errors > 0 {
                process::exit(1);
            }
        }
        Command::Blocks { note } => {
            let notes = load(&store, Some(note.as_str()))?;
            let index = NoteIndex::from_map(&notes);
            print_blocks(&index.top_level_blocks(note)?);
        }
        Command::Tag { name } => {
            let notes = load(&store, scope)?;
            let index = NoteIndex::from_map(&notes);
            print_blocks(&index.blocks_with_hashtag(name, scope));
        }
        Command::Term { name } => {
            let notes = load(&store, scope)?;
            let index = NoteIndex::from_map(&notes);
            let matches = index.blocks_with_term(name, scope);
            print_blocks(&matches.blocks);
            for (document, count) in &matches.counts {
                println!("{document}: {count}");
            }
        }
        Command::Search { query } => {
            let notes = load(&store, scope)?;
            let index = NoteIndex::from_map(&notes);
            for hit in index.search(query, scope) {
                println!("{}\t{}\t{}", hit.document, hit.path, hit.excerpt);
            }
        }
        Command::Find { query } => {
            let notes = load(&store, scope)?;
            let index = NoteIndex::from_map(&notes);
            for m in index.find(query, scope) {
                println!(
                    "{:.1}\t{}\t{}",
                    m.score, m.entry.document, m.entry.original
                );
            }
        }
    }

    Ok(())
}

/// Reads and parses every note under `scope`.
fn load(store: &LocalStore, scope: Option<&str>) -> Result<BTreeMap<String, ParsedNote>> {
    let texts: Vec<(String, String)> = store
        .load_all()?
        .into_iter()
        .filter(|(id, _)| scope.is_none_or(|p| id.starts_with(p)))
        .collect();
    log::debug!("parsing {} notes", texts.len());
    Ok(parse_many(texts))
}

fn print_blocks(blocks: &[BlockRef<'_>]) {
    for block in blocks {
        println!(
            "{}\t{}\t{}..{}",
            block.document, block.path, block.span.start, block.span.end
        );
    }
}
