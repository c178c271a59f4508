//! mfs-explorer CLI - Command line interface for mfs_explorer
//!
//! Provides the file-manager operations against a running node.
//! Prints the JSON response envelope, so it can be wrapped by other tools.

use clap::{Parser, Subcommand};
use mfs_explorer::{ClientConfig, Explorer, UploadFile};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mfs-explorer")]
#[command(about = "A file manager for an IPFS node's Mutable File System")]
#[command(version)]
struct Cli {
    /// RPC API base URL (overrides config file and IPFS_API_URL)
    #[arg(short, long)]
    api: Option<String>,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the node version
    Version,

    /// Show the resolved configuration
    Config {
        /// Write the resolved configuration to the config file
        #[arg(long)]
        save: bool,
    },

    // === Read Commands ===
    /// List a directory
    Ls {
        /// Directory path
        #[arg(default_value = "/")]
        path: String,
    },

    /// Show entry metadata
    Stat {
        /// Entry path
        path: String,
    },

    /// Download a file
    Get {
        /// File path
        path: String,
        /// Write to this local file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    // === Write Commands ===
    /// Create a directory inside a parent directory
    Mkdir {
        /// Parent directory
        path: String,
        /// Name of the new directory
        name: String,
    },

    /// Remove entries from a directory
    Rm {
        /// Directory holding the entries
        path: String,
        /// Entry names
        #[arg(required = true)]
        names: Vec<String>,
        /// Refuse to remove non-empty directories
        #[arg(long)]
        no_recursive: bool,
    },

    /// Copy entries into another directory
    Cp {
        /// Directory holding the entries
        path: String,
        /// Target directory
        destination: String,
        /// Entry names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Move entries into another directory
    Mv {
        /// Directory holding the entries
        path: String,
        /// Target directory
        destination: String,
        /// Entry names
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// Rename an entry within its directory
    Rename {
        /// Entry path
        path: String,
        /// New name
        new_name: String,
    },

    /// Upload local files into a directory
    Upload {
        /// Target directory (created when missing)
        path: String,
        /// Local files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    mfs_explorer::logging::init(cli.verbose);

    let format = cli.format;
    if let Err(e) = run(cli) {
        tracing::debug!(error = ?e, "command failed");
        output(
            &format,
            &serde_json::json!({
                "status": "error",
                "message": format!("{:#}", e)
            }),
        );
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(&cli)?;

    if let Commands::Config { save } = cli.command {
        if save {
            let path = match &cli.config {
                Some(p) => p.clone(),
                None => ClientConfig::default_path()?,
            };
            config.save(&path)?;
        }
        output(&cli.format, &serde_json::to_value(&config)?);
        return Ok(());
    }

    let explorer = Explorer::start(&config)?;

    match cli.command {
        Commands::Config { .. } => {}

        Commands::Version => {
            let version = explorer.version()?;
            output(&cli.format, &serde_json::to_value(&version)?);
        }

        Commands::Ls { path } => {
            let response = explorer.list(&path)?;
            output(&cli.format, &serde_json::to_value(&response)?);
        }

        Commands::Stat { path } => {
            let stat = explorer.stat(&path)?;
            output(&cli.format, &serde_json::to_value(&stat)?);
        }

        Commands::Get { path, output: target } => {
            let response = explorer.get_file_content(&path)?;
            match target {
                Some(target) => {
                    let blob = response
                        .blob
                        .as_ref()
                        .ok_or_else(|| anyhow::anyhow!("No content returned for {}", path))?;
                    std::fs::write(&target, blob.content())?;
                    output(&cli.format, &serde_json::to_value(&response)?);
                }
                None => {
                    let blob = response
                        .blob
                        .ok_or_else(|| anyhow::anyhow!("No content returned for {}", path))?;
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(blob.content())?;
                    stdout.flush()?;
                }
            }
        }

        Commands::Mkdir { path, name } => {
            let response = explorer.create_directory(&path, &name)?;
            output(&cli.format, &serde_json::to_value(&response)?);
        }

        Commands::Rm {
            path,
            names,
            no_recursive,
        } => {
            let response = explorer.remove(&path, &names, !no_recursive)?;
            output(&cli.format, &serde_json::to_value(&response)?);
        }

        Commands::Cp {
            path,
            destination,
            names,
        } => {
            let response = explorer.copy(&path, &destination, &names)?;
            output(&cli.format, &serde_json::to_value(&response)?);
        }

        Commands::Mv {
            path,
            destination,
            names,
        } => {
            let response = explorer.move_files(&path, &destination, &names)?;
            output(&cli.format, &serde_json::to_value(&response)?);
        }

        Commands::Rename { path, new_name } => {
            let response = explorer.rename(&path, &new_name)?;
            output(&cli.format, &serde_json::to_value(&response)?);
        }

        Commands::Upload { path, files } => {
            let uploads = files
                .iter()
                .map(|f| UploadFile::from_path(f))
                .collect::<mfs_explorer::Result<Vec<_>>>()?;
            let response = explorer.upload(&path, &uploads)?;
            output(&cli.format, &serde_json::to_value(&response)?);
        }
    }

    Ok(())
}

/// Config file, then environment, then `--api`
fn resolve_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::resolve(cli.config.as_deref())?;
    if let Some(api) = &cli.api {
        config.api_url = api.clone();
        config.validate()?;
    }
    Ok(config)
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("failed to render output: {}", e),
    }
}
