//! Manage schema revisions: write scripts, move the database along the
//! revision graph, and inspect where it stands.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mockable::{DefaultClock, DefaultEnv};
use tokio::runtime::Builder;
use tracing_subscriber::{EnvFilter, fmt};

use crud_backend::domain::migrations::{CreatedRevision, Target};
use crud_backend::outbound::migrations::{
    FileRevisionSource, OfflineMigrationRunner, OfflineMigrationStore, PgMigrationRunner,
};
use crud_backend::outbound::persistence::{DbPool, DieselMigrationStore, PoolConfig};
use crud_backend::settings::{database_url_from_env, migrations_dir_from_env};

/// `migrate` command arguments.
#[derive(Debug, Parser)]
#[command(
    name = "migrate",
    about = "Manage database schema revisions",
    version
)]
struct Cli {
    /// Database connection URL. Falls back to `DATABASE_URL`, then the
    /// `POSTGRES_*` variables.
    #[arg(long = "database-url", value_name = "url", global = true)]
    database_url: Option<String>,
    /// Directory holding revision scripts. Falls back to `MIGRATIONS_DIR`,
    /// then `migrations`.
    #[arg(long = "migrations-dir", value_name = "path", global = true)]
    migrations_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a new revision script on top of the current head.
    Revision {
        /// Short description, also used for the file name.
        #[arg(short, long)]
        message: String,
        /// Parent revision when the graph has several heads.
        #[arg(long, value_name = "revision")]
        head: Option<String>,
        /// Leave the upgrade and downgrade sections blank.
        #[arg(long)]
        empty: bool,
    },
    /// Apply revisions up to a target.
    Upgrade {
        /// `head`, `heads`, a revision id or prefix, or `+N`.
        #[arg(default_value = "head", allow_negative_numbers = true)]
        target: String,
        #[command(flatten)]
        offline: OfflineArgs,
    },
    /// Revert revisions down to a target.
    Downgrade {
        /// `base`, a revision id or prefix, or `-N`.
        #[arg(allow_negative_numbers = true)]
        target: String,
        #[command(flatten)]
        offline: OfflineArgs,
    },
    /// Show the revisions stamped in the database.
    Current,
    /// List every revision, newest first.
    History,
    /// List the heads of the revision graph.
    Heads,
    /// Write a revision joining several heads.
    Merge {
        #[arg(short, long)]
        message: String,
        /// Revisions to join; every head when omitted.
        revisions: Vec<String>,
    },
    /// Record a revision as applied without running it.
    Stamp {
        /// `head`, `heads`, `base` or a revision id or prefix.
        #[arg(allow_negative_numbers = true)]
        target: String,
    },
    /// Bring any database to head, stamping untracked existing schemas.
    Auto,
}

#[derive(Debug, Clone, clap::Args)]
struct OfflineArgs {
    /// Print the SQL instead of running it.
    #[arg(long)]
    sql: bool,
    /// Revision the offline script starts from.
    #[arg(long, value_name = "revision", requires = "sql")]
    from: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("tracing init failed: {e}");
    }

    let result = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))
        .and_then(|runtime| runtime.block_on(run(cli)));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> io::Result<()> {
    let migrations_dir = cli
        .migrations_dir
        .unwrap_or_else(|| migrations_dir_from_env(&DefaultEnv::new()));
    let source = Arc::new(FileRevisionSource::new(migrations_dir));
    let offline = OfflineMigrationRunner::new(
        Arc::new(OfflineMigrationStore),
        source.clone(),
        Arc::new(DefaultClock),
    );

    match cli.command {
        Command::Revision {
            message,
            head,
            empty,
        } => {
            let created = offline
                .revision(&message, head.as_deref(), empty)
                .map_err(failure)?;
            print_created(&created);
        }
        Command::Merge { message, revisions } => {
            let created = offline.merge(&message, &revisions).map_err(failure)?;
            print_created(&created);
        }
        Command::Heads => {
            for head in offline.heads().map_err(failure)? {
                println!("{head} (head)");
            }
        }
        Command::Upgrade {
            target,
            offline: OfflineArgs { sql: true, from },
        } => {
            let target = parse_target(&target)?;
            print!(
                "{}",
                offline.upgrade_sql(&target, from.as_deref()).map_err(failure)?
            );
        }
        Command::Downgrade {
            target,
            offline: OfflineArgs { sql: true, from },
        } => {
            let target = parse_target(&target)?;
            print!(
                "{}",
                offline.downgrade_sql(&target, from.as_deref()).map_err(failure)?
            );
        }
        command => {
            let runner = connect(cli.database_url, source).await?;
            run_online(&runner, command).await?;
        }
    }
    Ok(())
}

async fn run_online(runner: &PgMigrationRunner, command: Command) -> io::Result<()> {
    match command {
        Command::Upgrade { target, .. } => {
            let applied = runner
                .upgrade(&parse_target(&target)?)
                .await
                .map_err(failure)?;
            report_steps("upgraded", &applied);
        }
        Command::Downgrade { target, .. } => {
            let reverted = runner
                .downgrade(&parse_target(&target)?)
                .await
                .map_err(failure)?;
            report_steps("downgraded", &reverted);
        }
        Command::Current => {
            let rows = runner.current().await.map_err(failure)?;
            if rows.is_empty() {
                println!("<base> (no revision stamped)");
            }
            for row in rows {
                let note = match (row.known, row.is_head) {
                    (false, _) => " (unknown revision)",
                    (true, true) => " (head)",
                    (true, false) => "",
                };
                println!("{}{note}", row.id);
            }
        }
        Command::History => {
            for entry in runner.history().await.map_err(failure)? {
                println!("{entry}");
            }
        }
        Command::Stamp { target } => {
            let stamped = runner
                .stamp(&parse_target(&target)?)
                .await
                .map_err(failure)?;
            if stamped.is_empty() {
                println!("stamped base");
            }
            for id in stamped {
                println!("stamped {id}");
            }
        }
        Command::Auto => {
            let outcome = runner.auto().await.map_err(failure)?;
            println!("branch={}", outcome.branch.as_str());
            report_steps("upgraded", &outcome.applied);
        }
        Command::Revision { .. } | Command::Merge { .. } | Command::Heads => {}
    }
    Ok(())
}

async fn connect(
    explicit_url: Option<String>,
    source: Arc<FileRevisionSource>,
) -> io::Result<PgMigrationRunner> {
    let database_url = resolve_database_url(explicit_url)?;
    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(2))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;
    Ok(PgMigrationRunner::new(
        Arc::new(DieselMigrationStore::new(pool)),
        source,
        Arc::new(DefaultClock),
    ))
}

fn resolve_database_url(explicit: Option<String>) -> io::Result<String> {
    match explicit {
        Some(value) if value.trim().is_empty() => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "--database-url must not be empty when provided",
        )),
        Some(value) => Ok(value),
        None => database_url_from_env(&DefaultEnv::new())
            .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error.to_string())),
    }
}

fn parse_target(raw: &str) -> io::Result<Target> {
    raw.parse()
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, format!("{error}")))
}

fn failure(error: impl std::fmt::Display) -> io::Error {
    io::Error::other(error.to_string())
}

fn print_created(created: &CreatedRevision) {
    println!("Generated {} ({})", created.path, created.id);
}

fn report_steps(verb: &str, ids: &[impl std::fmt::Display]) {
    if ids.is_empty() {
        println!("nothing to do");
    }
    for id in ids {
        println!("{verb} {id}");
    }
}
