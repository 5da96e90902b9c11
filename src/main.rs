use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use backup_tool::audit::{AuditLogger, TracingSink};
use backup_tool::config::{env::load_dotenv, Config};
use backup_tool::logging::init_tracing;
use backup_tool::producers::SystemTools;
use backup_tool::runner::BackupRunner;

#[derive(Parser)]
#[command(
    name = "backup-tool",
    version,
    about = "Scheduled backups with retention cleanup",
    long_about = "Archives configured directories, files, logs and databases into \
                  timestamped tar.gz files, uploads them to an SMB share and removes \
                  archives older than each target's lifetime, locally and remotely.\n\n\
                  Exit status is non-zero only when the configuration cannot be loaded or \
                  the backup root cannot be created. Failed targets, uploads and cleanups \
                  are logged and counted in the summary; the run still exits 0."
)]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "BACKUP_TOOL_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Environment file loaded before the configuration
    #[arg(short, long, default_value = ".env")]
    env: PathBuf,

    /// Report what cleanup would delete without archiving, uploading or deleting
    #[arg(long)]
    dry_run: bool,

    /// Debug logging unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded first so RUST_LOG may come from the file
    let env_loaded = load_dotenv(&cli.env);
    init_tracing(cli.verbose);
    match env_loaded {
        Ok(true) => {}
        Ok(false) => tracing::debug!(path = %cli.env.display(), "no environment file"),
        Err(e) => tracing::warn!(error = %e, "ignoring environment file"),
    }

    let config = Config::load(&cli.config)
        .with_context(|| format!("loading configuration {}", cli.config.display()))?;

    let sink = (TracingSink, config.audit_log.as_ref().map(AuditLogger::new));
    if cli.dry_run {
        tracing::info!("dry run: nothing will be archived, uploaded or deleted");
    }

    let summary = BackupRunner::new(&config, &SystemTools, &sink)
        .dry_run(cli.dry_run)
        .run()
        .context("backup run failed")?;

    if !summary.is_success() {
        tracing::warn!("run finished with errors");
    }
    println!("{}", summary);

    Ok(())
}
