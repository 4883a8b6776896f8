#![deny(unsafe_code)]

mod commands;
mod config;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use seekgits_core::config::ConfigStore;
use seekgits_core::gpg::GpgProvider;
use seekgits_core::repo::find_repo_root;
use seekgits_core::Lifecycle;

use crate::config::LocalConfig;

/// Deterministic, per-file encrypted secrets for git repositories.
#[derive(Parser)]
#[command(name = "seekgits")]
#[command(author, version)]
#[command(propagate_version = true)]
#[command(after_help = "EXAMPLES:
    # Register the git filter in the current repository
    seekgits init

    # Start tracking a secret, encrypted to your default gpg identity
    seekgits encrypt config/secrets.env

    # Grant a teammate access to an already-tracked file
    seekgits share config/secrets.env bob@example.com

    # Stop tracking a file (removes the plaintext working copy)
    seekgits remove config/secrets.env

    # Show recipients and access for every tracked file
    seekgits status
")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register the git clean/smudge/textconv filter and create the manifest
    Init,

    /// Start tracking a path: generate and wrap a fresh file key
    Encrypt {
        /// Repository-relative path to track
        path: String,
        /// Recipient to wrap the new file key to (default: your default gpg identity)
        #[arg(long)]
        recipient: Option<String>,
    },

    /// Grant an additional recipient access to an already-tracked path
    Share {
        /// Repository-relative path
        path: String,
        /// Recipient to grant access to
        recipient: String,
    },

    /// Stop tracking a path and delete its plaintext working copy
    Remove {
        /// Repository-relative path
        path: String,
    },

    /// Report recipients and access for one or all tracked paths
    Status {
        /// Repository-relative path (all tracked paths if omitted)
        path: Option<String>,
    },

    /// Streaming content filter invoked by git (not meant to be run by hand)
    Filter {
        #[command(subcommand)]
        action: FilterAction,
    },
}

#[derive(Subcommand)]
enum FilterAction {
    /// Clean: encrypt plaintext on `git add` (reads stdin unless `tmpfile` is given)
    Encrypt {
        /// Logical path, as passed by git's `%f`
        path: String,
        /// Optional path to read content from instead of stdin
        tmpfile: Option<PathBuf>,
    },
    /// Smudge/textconv: decrypt on checkout or diff (reads stdin unless `tmpfile` is given)
    Decrypt {
        /// Logical path, as passed by git's `%f`
        path: String,
        /// Optional path to read content from instead of stdin
        tmpfile: Option<PathBuf>,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let local_config = LocalConfig::load();
    let cwd = env::current_dir().context("failed to read current directory")?;
    let repo_root = find_repo_root(&cwd).context("seekgits must be run inside a git repository")?;
    let mut gpg = match local_config.gpg_binary {
        Some(binary) => GpgProvider::with_binary(binary),
        None => GpgProvider::default(),
    };
    if let Some(trust_model) = local_config.trust_model {
        gpg = gpg.with_trust_model(trust_model);
    }

    match cli.command {
        Commands::Init => {
            let binary_path = env::current_exe().context("failed to resolve this binary's absolute path")?;
            let lifecycle = Lifecycle::new(&repo_root, gpg);
            commands::init::execute(&lifecycle, &binary_path)
        }
        Commands::Encrypt { path, recipient } => {
            let lifecycle = Lifecycle::new(&repo_root, gpg);
            commands::start_tracking::execute(&lifecycle, &path, recipient.as_deref())
        }
        Commands::Share { path, recipient } => {
            let lifecycle = Lifecycle::new(&repo_root, gpg);
            commands::share::execute(&lifecycle, &path, &recipient)
        }
        Commands::Remove { path } => {
            let lifecycle = Lifecycle::new(&repo_root, gpg);
            commands::remove::execute(&lifecycle, &path)
        }
        Commands::Status { path } => {
            let lifecycle = Lifecycle::new(&repo_root, gpg);
            commands::status::execute(&lifecycle, path.as_deref())
        }
        Commands::Filter { action } => {
            let config = ConfigStore::new(&repo_root, gpg);
            match action {
                FilterAction::Encrypt { path, tmpfile } => {
                    commands::filter::encrypt(&config, &path, tmpfile.as_deref())
                }
                FilterAction::Decrypt { path, tmpfile } => {
                    commands::filter::decrypt(&config, &path, tmpfile.as_deref())
                }
            }
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:?}");
            ExitCode::FAILURE
        }
    }
}
