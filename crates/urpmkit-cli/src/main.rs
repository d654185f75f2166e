//! urpmkit control CLI
//!
//! Runs one backend verb against the urpmd service and prints the emitted
//! job events. Stands in for a frontend during development and manual
//! testing.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use clap::{Parser, Subcommand};

use urpmkit_backend::{Backend, JobSink};
use urpmkit_types::{DetailRecord, ErrorKind, FilterSet, InfoKind, StatusKind};

/// urpm backend control CLI
#[derive(Parser)]
#[command(name = "urpmkit")]
#[command(about = "Run urpm backend operations against the urpmd service")]
#[command(version)]
struct Cli {
    /// Service socket path (default: $URPMD_SOCKET or /run/urpmd/urpmd.sock)
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Only installed packages
    #[arg(long)]
    installed: bool,

    /// Only packages that are not installed
    #[arg(long)]
    not_installed: bool,
}

impl FilterArgs {
    fn filters(&self) -> FilterSet {
        FilterSet {
            installed: self.installed,
            not_installed: self.not_installed,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search packages by name
    Search {
        #[command(flatten)]
        filters: FilterArgs,
        values: Vec<String>,
    },

    /// Search package descriptions
    SearchDetails {
        #[command(flatten)]
        filters: FilterArgs,
        values: Vec<String>,
    },

    /// Find packages owning files matching a pattern
    SearchFiles { values: Vec<String> },

    /// Find packages providing a capability
    WhatProvides {
        #[command(flatten)]
        filters: FilterArgs,
        values: Vec<String>,
    },

    /// Resolve names or package ids to full records
    Resolve {
        #[command(flatten)]
        filters: FilterArgs,
        targets: Vec<String>,
    },

    /// List available upgrades
    GetUpdates,

    /// Emit update details for package ids
    GetUpdateDetail { targets: Vec<String> },

    /// List installed packages
    GetPackages {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show description/url/license/size for package ids
    GetDetails { targets: Vec<String> },

    /// List files owned by package ids
    GetFiles { targets: Vec<String> },

    /// List packages a target pulls in
    DependsOn {
        #[arg(long)]
        recursive: bool,
        targets: Vec<String>,
    },

    /// List packages requiring a target
    RequiredBy {
        #[arg(long)]
        recursive: bool,
        targets: Vec<String>,
    },

    /// Refresh the service metadata cache
    Refresh,

    /// Install packages
    Install {
        /// Preview only; do not change the system
        #[arg(long)]
        simulate: bool,
        targets: Vec<String>,
    },

    /// Remove packages
    Remove {
        /// Report what would be removed without removing
        #[arg(long)]
        simulate: bool,
        targets: Vec<String>,
    },

    /// Update packages (full-system upgrade unless simulating)
    Update {
        /// Report what would be updated without updating
        #[arg(long)]
        simulate: bool,
        targets: Vec<String>,
    },

    /// Download package archives without installing
    Download {
        #[arg(long, default_value = ".")]
        directory: String,
        targets: Vec<String>,
    },

    /// Install local package files
    InstallFiles {
        /// Only check the files exist
        #[arg(long)]
        simulate: bool,
        paths: Vec<String>,
    },

    /// Ask the service to cancel the running operation
    Cancel,
}

/// Sink that prints each event to stdout and remembers failures.
#[derive(Default)]
struct PrintSink {
    failed: AtomicBool,
}

impl JobSink for PrintSink {
    fn set_status(&self, status: StatusKind) {
        println!("status     {status}");
    }

    fn set_percentage(&self, percentage: u32) {
        if percentage <= 100 {
            println!("progress   {percentage}%");
        }
    }

    fn package(&self, info: InfoKind, package_id: &str, summary: &str) {
        if summary.is_empty() {
            println!("package    [{info}] {package_id}");
        } else {
            println!("package    [{info}] {package_id}  {summary}");
        }
    }

    fn details(&self, package_id: &str, detail: &DetailRecord) {
        println!("details    {package_id}");
        println!("  license: {}", detail.license);
        println!("  url:     {}", detail.url);
        println!("  size:    {}", detail.size);
        println!("  {}", detail.description);
    }

    fn files(&self, package_id: &str, paths: &[String]) {
        println!("files      {package_id}");
        for path in paths {
            println!("  {path}");
        }
    }

    fn update_detail(&self, package_id: &str, text: &str) {
        println!("update     {package_id}  {text}");
    }

    fn error_code(&self, kind: ErrorKind, message: &str) {
        self.failed.store(true, Ordering::SeqCst);
        eprintln!("error      [{kind}] {message}");
    }

    fn finished(&self) {
        println!("finished");
    }
}

async fn run(cli: Cli) -> bool {
    let backend = match cli.socket {
        Some(path) => Backend::with_socket(path),
        None => Backend::new(),
    };
    let sink = PrintSink::default();

    match cli.command {
        Commands::Search { filters, values } => {
            backend.search(&sink, filters.filters(), &values, false).await;
        }
        Commands::SearchDetails { filters, values } => {
            backend.search_details(&sink, filters.filters(), &values).await;
        }
        Commands::SearchFiles { values } => {
            backend.search_files(&sink, &values).await;
        }
        Commands::WhatProvides { filters, values } => {
            backend.what_provides(&sink, filters.filters(), &values).await;
        }
        Commands::Resolve { filters, targets } => {
            backend.resolve(&sink, filters.filters(), &targets).await;
        }
        Commands::GetUpdates => {
            backend.get_updates(&sink).await;
        }
        Commands::GetUpdateDetail { targets } => {
            backend.get_update_detail(&sink, &targets).await;
        }
        Commands::GetPackages { filters } => {
            backend.get_packages(&sink, filters.filters()).await;
        }
        Commands::GetDetails { targets } => {
            backend.get_details(&sink, &targets).await;
        }
        Commands::GetFiles { targets } => {
            backend.get_files(&sink, &targets).await;
        }
        Commands::DependsOn { recursive, targets } => {
            backend.depends_on(&sink, &targets, recursive).await;
        }
        Commands::RequiredBy { recursive, targets } => {
            backend.required_by(&sink, &targets, recursive).await;
        }
        Commands::Refresh => {
            backend.refresh_cache(&sink).await;
        }
        Commands::Install { simulate, targets } => {
            backend.install_packages(&sink, simulate, &targets).await;
        }
        Commands::Remove { simulate, targets } => {
            backend.remove_packages(&sink, simulate, &targets).await;
        }
        Commands::Update { simulate, targets } => {
            backend.update_packages(&sink, simulate, &targets).await;
        }
        Commands::Download { directory, targets } => {
            backend.download_packages(&sink, &targets, &directory).await;
        }
        Commands::InstallFiles { simulate, paths } => {
            backend.install_files(&sink, simulate, &paths).await;
        }
        Commands::Cancel => {
            backend.cancel(&sink).await;
        }
    }

    sink.failed.load(Ordering::SeqCst)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    let cli = Cli::parse();
    let failed = run(cli).await;
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
