/*!
Command-line interface for backing up and restoring Jenkins configuration.
*/

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use jenkins_backup_core::{
    inspect_archive, BackupEngine, BackupOptions, HttpGateway, Outcome, OverwritePolicy,
    RestoreReport, ServerConfig,
};
use tabled::{Table, Tabled};
use tracing::info;

#[derive(Parser)]
#[command(name = "jenkins-backup")]
#[command(about = "Backup and restore Jenkins job and view configuration")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ServerArgs {
    /// Jenkins server host name or address
    #[arg(long, env = "JENKINS_SERVER", global = true, default_value = "localhost")]
    server: String,

    /// Jenkins HTTP port
    #[arg(long, env = "JENKINS_PORT", global = true, default_value_t = 8080)]
    port: u16,

    /// User name for basic auth
    #[arg(long, env = "JENKINS_USERNAME", global = true, default_value = "")]
    username: String,

    /// Password or API token for basic auth (JENKINS_PASSWORD_BASE64 is
    /// honored as an encoded fallback)
    #[arg(long, env = "JENKINS_PASSWORD", global = true, default_value = "")]
    password: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Snapshot the server's jobs and views into an archive
    Backup {
        /// Base name of the archive, producing <NAME>-<timestamp>.tar.gz
        #[arg(default_value = "jenkins")]
        name: String,

        /// Directory the archive is written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Replay an archive against the server
    Restore {
        /// Archive produced by a previous backup
        archive: PathBuf,

        /// Replace jobs that already exist on the target
        #[arg(long)]
        overwrite_jobs: bool,

        /// Replace views that already exist on the target
        #[arg(long)]
        overwrite_views: bool,
    },
    /// Print the snapshot metadata stored in an archive
    Show {
        /// Archive produced by a previous backup
        archive: PathBuf,
    },
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Backup { name, output_dir } => {
            let engine = connect(&cli.server)?;
            let path = engine.backup(&BackupOptions {
                base_name: name,
                output_dir,
            })?;
            println!("Backup complete: {}", path.display());
        }
        Commands::Restore {
            archive,
            overwrite_jobs,
            overwrite_views,
        } => {
            let engine = connect(&cli.server)?;
            let report = engine.restore(
                &archive,
                OverwritePolicy {
                    jobs: overwrite_jobs,
                    views: overwrite_views,
                },
            )?;
            print_report(&report);
        }
        Commands::Show { archive } => show_archive(&archive)?,
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"))
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn connect(args: &ServerArgs) -> Result<BackupEngine<HttpGateway>, anyhow::Error> {
    let config = ServerConfig {
        host: args.server.clone(),
        port: args.port,
        username: args.username.clone(),
        password: args.password.clone(),
    }
    .resolve_password()?;
    info!(server = config.host.as_str(), port = config.port, "connecting");
    Ok(BackupEngine::connect(&config)?)
}

fn print_report(report: &RestoreReport) {
    let rows: Vec<OutcomeRow> = report
        .items
        .iter()
        .map(|item| OutcomeRow {
            kind: item.kind.to_string(),
            name: item.name.clone(),
            outcome: item.outcome.to_string(),
        })
        .collect();

    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }
    let replaced = report
        .items
        .iter()
        .filter(|i| i.outcome == Outcome::Replaced)
        .count();
    println!(
        "Applied: {} ({} replaced), skipped: {}, view memberships added: {}",
        report.applied(),
        replaced,
        report.skipped(),
        report.memberships_added
    );
}

fn show_archive(archive: &PathBuf) -> Result<(), anyhow::Error> {
    let snapshot = inspect_archive(archive)?;

    println!("Snapshot details:");
    println!("  Captured: {}", snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Created by: {}", snapshot.created_by);
    println!(
        "  Server: {}:{}",
        snapshot.server_address, snapshot.server_port
    );
    println!("  Tool version: {}", snapshot.tool_version);
    println!("  Jobs: {}", snapshot.jobs.count);
    for job in &snapshot.jobs.names {
        println!("    {job}");
    }
    println!("  Views: {}", snapshot.views.len());
    for view in &snapshot.views {
        let regex = view.regex.as_deref().unwrap_or("-");
        println!(
            "    {} (regex: {}, explicit jobs: {})",
            view.name,
            regex,
            view.explicit_jobs.len()
        );
    }

    Ok(())
}
