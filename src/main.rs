use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value as JsonValue, json};
use tracing::error;

use ipdb_mirror::infrastructure::init_logging_with_config;
use ipdb_mirror::{AppConfig, ConfigManager, FieldEntry, IpDatabase, SyncError};

#[derive(Parser)]
#[command(
    name = "ipdb-mirror",
    version,
    about = "Mirror the remote IP database listing into SQLite"
)]
struct Cli {
    /// Configuration file (JSON); defaults to the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the SQLite URL from the configuration
    #[arg(long, global = true)]
    database: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk every category of the listing and mirror it
    Sync(SyncArgs),
    /// Print fields of one record as a JSON array of `{field, value}`
    Get(GetArgs),
    /// Write caller-owned fields of one record
    Set(SetArgs),
    /// Print every stored identifier (JSON)
    List,
    /// Write the default configuration file if none exists
    InitConfig,
}

#[derive(Args)]
struct SyncArgs {
    /// Only insert or update this identifier
    #[arg(long)]
    ip: Option<String>,
}

#[derive(Args)]
struct GetArgs {
    ip: String,
    /// Field names; all fields when omitted
    fields: Vec<String>,
}

#[derive(Args)]
struct SetArgs {
    ip: String,
    /// Assignment in `field=value` form; repeatable
    #[arg(long = "field", value_name = "FIELD=VALUE", required = true)]
    assignments: Vec<String>,
}

fn config_manager(cli: &Cli) -> Result<ConfigManager> {
    match &cli.config {
        Some(path) => Ok(ConfigManager::with_path(path)),
        None => ConfigManager::new(),
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = config_manager(cli)?.load()?;
    if let Some(url) = &cli.database {
        config.database.url.clone_from(url);
    }
    Ok(config)
}

fn split_assignments(assignments: &[String]) -> Result<(Vec<String>, Vec<String>)> {
    let mut fields = Vec::with_capacity(assignments.len());
    let mut values = Vec::with_capacity(assignments.len());
    for assignment in assignments {
        let Some((field, value)) = assignment.split_once('=') else {
            bail!("Expected FIELD=VALUE, got '{assignment}'");
        };
        fields.push(field.trim().to_string());
        values.push(value.to_string());
    }
    Ok((fields, values))
}

fn print_json(value: &JsonValue) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    if matches!(cli.command, Commands::InitConfig) {
        let manager = config_manager(&cli)?;
        manager.initialize_on_first_run().await?;
        return print_json(&json!({ "config_path": manager.config_path() }));
    }

    let config = load_config(&cli)?;
    init_logging_with_config(&config.logging)?;
    let database = IpDatabase::from_config(config).context("Failed to set up the mirror")?;

    match cli.command {
        Commands::Sync(args) => {
            let report = database.sync_all(args.ip.as_deref()).await?;
            print_json(&serde_json::to_value(&report)?)
        }
        Commands::Get(args) => {
            let values = database.get_fields(&args.ip, args.fields.as_slice()).await?;
            let entries: Vec<FieldEntry> = values.into_iter().map(FieldEntry::from).collect();
            print_json(&serde_json::to_value(&entries)?)
        }
        Commands::Set(args) => {
            let (fields, values) = split_assignments(&args.assignments)?;
            database.set_fields(&args.ip, fields.as_slice(), values.as_slice()).await?;
            print_json(&json!({ "updated": args.ip, "fields": fields }))
        }
        Commands::List => {
            let identifiers = database.list_all_identifiers().await?;
            print_json(&json!(identifiers))
        }
        Commands::InitConfig => Ok(()),
    }
}

/// 2 for rejected arguments or unknown records, 1 for everything else
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<SyncError>() {
        Some(e) if e.is_caller_error() => 2,
        _ => 1,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors_exit_with_2() {
        let err = anyhow::Error::from(SyncError::NotFound("10.0.0.1".into()));
        assert_eq!(exit_code(&err), 2);

        let err = anyhow::Error::from(SyncError::InvalidField("bogus".into()));
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_other_errors_exit_with_1() {
        let err = anyhow::Error::from(SyncError::Fetch {
            query: "index.php".into(),
            reason: "timed out".into(),
        });
        assert_eq!(exit_code(&err), 1);
        assert_eq!(exit_code(&anyhow::anyhow!("config missing")), 1);
    }

    #[test]
    fn test_assignments_split_on_first_equals() {
        let (fields, values) =
            split_assignments(&["cpu=2.4 GHz".to_string(), "lastlog=a=b".to_string()]).unwrap();
        assert_eq!(fields, vec!["cpu", "lastlog"]);
        assert_eq!(values, vec!["2.4 GHz", "a=b"]);
        assert!(split_assignments(&["cpu".to_string()]).is_err());
    }

    #[test]
    fn test_get_keeps_field_order() {
        let cli = Cli::try_parse_from(["ipdb-mirror", "get", "10.0.0.1", "page", "name", "page"])
            .unwrap();
        let Commands::Get(args) = cli.command else {
            panic!("expected get");
        };
        assert_eq!(args.fields, vec!["page", "name", "page"]);
    }
}
