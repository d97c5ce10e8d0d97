//! tagframe CLI Client
//!
//! Command-line interface for a tag store held in a local file or behind a
//! tagframe server.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tagframe::{Config, FileStorage, RemoteStorage, Result, Storage, TagMap, TagStore};

/// tagframe CLI
#[derive(Parser, Debug)]
#[command(name = "tagframe-cli")]
#[command(about = "CLI for tagframe tag stores")]
#[command(version)]
struct Args {
    /// Local store file
    #[arg(short, long, conflicts_with = "server")]
    file: Option<PathBuf>,

    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7411")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a value, replacing any existing one under the tag
    Put {
        /// The tag to set
        tag: String,

        /// The value to set
        value: String,
    },

    /// Get a value by tag
    Get {
        /// The tag to get
        tag: String,
    },

    /// Delete a tag
    Del {
        /// The tag to delete
        tag: String,
    },

    /// Check whether a tag is present
    Exists {
        /// The tag to look for
        tag: String,
    },

    /// List every tag in insertion order
    Tags,
}

fn open(args: &Args) -> Result<Box<dyn Storage>> {
    match &args.file {
        Some(path) => Ok(Box::new(FileStorage::open(path)?)),
        None => Ok(Box::new(RemoteStorage::connect(
            args.server.as_str(),
            &Config::default(),
        )?)),
    }
}

fn execute(args: &Args) -> Result<bool> {
    let mut store = TagStore::new(open(args)?);

    let found = match &args.command {
        Commands::Put { tag, value } => {
            if store.put(tag, value.as_bytes())? {
                println!("OK (replaced)");
            } else {
                println!("OK");
            }
            true
        }
        Commands::Get { tag } => match store.get(tag)? {
            Some(value) => {
                println!("{}", String::from_utf8_lossy(&value));
                true
            }
            None => {
                println!("(nil)");
                false
            }
        },
        Commands::Del { tag } => match store.delete(tag)? {
            Some(_) => {
                println!("(deleted)");
                true
            }
            None => {
                println!("(nil)");
                false
            }
        },
        Commands::Exists { tag } => {
            let exists = store.exists(tag)?;
            println!("{}", exists);
            exists
        }
        Commands::Tags => {
            for tag in store.all_tags()? {
                println!("{}", tag);
            }
            true
        }
    };

    store.close()?;
    Ok(found)
}

fn main() -> ExitCode {
    let args = Args::parse();

    match execute(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("(error) {}", e);
            ExitCode::from(2)
        }
    }
}
