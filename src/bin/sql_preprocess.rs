//! Print the native SQL and parameter slot map a backend would produce for a statement.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use sql_dblib::prelude::*;
use sql_dblib::translation::PreprocessedSql;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(
    name = "sql-preprocess",
    about = "Rewrite portable placeholders into a backend's native SQL"
)]
struct Args {
    /// Target backend
    #[arg(long, value_enum, default_value_t = DatabaseType::Postgres)]
    db_type: DatabaseType,

    /// Keep placeholders as written
    #[arg(long)]
    native: bool,

    /// Maximum log level
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,

    /// Read the statement from a file
    #[arg(long, conflicts_with = "sql")]
    file: Option<PathBuf>,

    /// Statement text
    sql: Option<String>,
}

fn run(db_type: DatabaseType, sql: &str, native: bool) -> Result<PreprocessedSql, DbLibError> {
    match db_type {
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => {
            use sql_dblib::postgres::PgActions;
            Ok(preprocess(sql, native, PgActions::SUPPORTS_INDEXED_PARAM_COALESCING, &PgActions))
        }
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => {
            use sql_dblib::sqlite::SqliteActions;
            Ok(preprocess(
                sql,
                native,
                SqliteActions::SUPPORTS_INDEXED_PARAM_COALESCING,
                &SqliteActions,
            ))
        }
        #[cfg(feature = "mssql")]
        DatabaseType::Mssql => {
            use sql_dblib::mssql::MssqlActions;
            Ok(preprocess(
                sql,
                native,
                MssqlActions::SUPPORTS_INDEXED_PARAM_COALESCING,
                &MssqlActions,
            ))
        }
        #[allow(unreachable_patterns)]
        other => Err(DbLibError::Unimplemented(format!(
            "{other} support is not compiled in"
        ))),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    let sql = match (&args.sql, &args.file) {
        (Some(sql), _) => sql.clone(),
        (None, Some(path)) => match fs::read_to_string(path) {
            Ok(sql) => sql,
            Err(e) => {
                error!(path = %path.display(), error = %e, "cannot read statement");
                return ExitCode::FAILURE;
            }
        },
        (None, None) => {
            error!("no statement given; pass it as an argument or with --file");
            return ExitCode::from(2);
        }
    };
    debug!(db_type = %args.db_type, native = args.native, "preprocessing");

    match run(args.db_type, &sql, args.native) {
        Ok(out) => {
            let params: Vec<_> = out
                .params
                .iter()
                .map(|(param, slots)| json!({ "param": param.to_string(), "slots": slots }))
                .collect();
            let report = json!({
                "sql": out.sql,
                "native_count": out.params.native_count(),
                "params": params,
            });
            match serde_json::to_string_pretty(&report) {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "cannot encode report");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            error!(error = %e, "preprocessing failed");
            ExitCode::FAILURE
        }
    }
}
