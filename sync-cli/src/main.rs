//! fbsync - command-line client for a FileBrowser service.
//!
//! Usage:
//!   fbsync init --url <url> --username <name>   Write the configuration file
//!   fbsync status                                Show the effective configuration
//!   fbsync login                                 Check credentials
//!   fbsync ls [path]                             List a remote directory
//!   fbsync upload <local> <remote>               Upload one file
//!   fbsync download <remote> <local>             Download one file
//!   fbsync push [dir]                            Upload every file of a directory
//!   fbsync pull                                  List the remote base
//!   fbsync mount                                 Mount the configured shares

use anyhow::Result;
use clap::{Parser, Subcommand};
use fbsync_types::TransferRequest;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// Sync files with a FileBrowser service
#[derive(Parser)]
#[command(name = "fbsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, env = "FBSYNC_CONFIG", default_value = "fbsync.toml")]
    config: PathBuf,

    /// Account password (overrides the configuration file)
    #[arg(long, global = true, env = "FBSYNC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a configuration file
    Init {
        /// Base URL of the service
        #[arg(long)]
        url: String,

        /// Account name
        #[arg(short, long)]
        username: String,

        /// Local directory to sync (default: /sdcard)
        #[arg(long)]
        mount_point: Option<PathBuf>,

        /// Remote directory for pushes and pulls (default: /)
        #[arg(long)]
        remote_base: Option<String>,

        /// Share to mount; repeat for several, in order
        #[arg(long = "share")]
        shares: Vec<String>,

        /// Transfer chunk size in bytes
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Network timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Store the password in the file (prompts if none was given)
        #[arg(long)]
        save_password: bool,

        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Status,

    /// Log in and report the result
    Login,

    /// List a remote directory
    Ls {
        /// Remote path
        #[arg(default_value = "/")]
        path: String,
    },

    /// Show metadata for a remote path
    Info {
        /// Remote path
        path: String,
    },

    /// Upload one file
    Upload {
        /// Local file
        local: PathBuf,
        /// Remote destination path
        remote: String,
    },

    /// Download one file
    Download {
        /// Remote file
        remote: String,
        /// Local destination path
        local: PathBuf,
    },

    /// Delete a remote file or directory
    Rm {
        /// Remote path
        path: String,
    },

    /// Rename or move a remote path
    Mv {
        /// Current remote path
        from: String,
        /// New remote path
        to: String,
    },

    /// Create a remote directory
    Mkdir {
        /// Remote path
        path: String,
    },

    /// Upload every regular file of a directory to the remote base
    Push {
        /// Local directory (default: the configured mount point)
        dir: Option<PathBuf>,
    },

    /// List the remote base
    Pull,

    /// Mount the configured shares
    Mount,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.config.as_path();
    let password = cli.password.as_deref();

    match cli.command {
        Commands::Init {
            url,
            username,
            mount_point,
            remote_base,
            shares,
            chunk_size,
            timeout_ms,
            save_password,
            force,
        } => {
            let password = match (save_password, password) {
                (false, _) => None,
                (true, Some(password)) => Some(password.to_string()),
                (true, None) => Some(commands::init::prompt_password(&username)?),
            };
            let options = commands::init::InitOptions {
                base_url: url,
                username,
                password,
                mount_point,
                remote_base,
                shares,
                chunk_size,
                timeout_ms,
                force,
            };
            commands::init::run(config_path, options).await?;
        }
        Commands::Status => {
            commands::status::run(config_path, password).await?;
        }
        Commands::Login => {
            commands::login::run(config_path, password).await?;
        }
        Commands::Ls { path } => {
            commands::remote::run(config_path, password, TransferRequest::list(&path)).await?;
        }
        Commands::Info { path } => {
            commands::remote::run(config_path, password, TransferRequest::info(&path)).await?;
        }
        Commands::Upload { local, remote } => {
            let request = TransferRequest::upload(absolute(&local)?, &remote);
            commands::remote::run(config_path, password, request).await?;
        }
        Commands::Download { remote, local } => {
            let request = TransferRequest::download(&remote, absolute(&local)?);
            commands::remote::run(config_path, password, request).await?;
        }
        Commands::Rm { path } => {
            commands::remote::run(config_path, password, TransferRequest::delete(&path)).await?;
        }
        Commands::Mv { from, to } => {
            let request = TransferRequest::rename(&from, &to);
            commands::remote::run(config_path, password, request).await?;
        }
        Commands::Mkdir { path } => {
            commands::remote::run(config_path, password, TransferRequest::mkdir(&path)).await?;
        }
        Commands::Push { dir } => {
            let dir = dir.map(|d| absolute(&d)).transpose()?;
            commands::push::run(config_path, password, dir).await?;
        }
        Commands::Pull => {
            commands::pull::run(config_path, password).await?;
        }
        Commands::Mount => {
            commands::mount::run(config_path, password).await?;
        }
    }

    Ok(())
}

/// Log to stderr so command output on stdout stays clean.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Paths given on the command line are relative to the working directory,
// not to the store's mount point.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}
