//! jiradump CLI - export Jira issues to CSV.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use jiradump_core::{Config, CustomFieldSpec};
use jiradump_jira::{write_multi_project_issues, Credentials, FetchOptions, JiraClient};
use jiradump_pipeline::DescriptionPolicy;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jiradump")]
#[command(author, version, about = "Export Jira issues to CSV", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the issues of one or more projects to a CSV file
    WriteIssues(WriteIssuesArgs),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Default)]
struct WriteIssuesArgs {
    /// Jira host (e.g., jira.example.com)
    #[arg(long)]
    jira_url: Option<String>,

    /// Jira username
    #[arg(long)]
    username: Option<String>,

    /// Jira password
    #[arg(long)]
    password: Option<String>,

    /// Personal access token, used instead of username and password
    #[arg(long, conflicts_with = "password")]
    token: Option<String>,

    /// Project keys to export
    #[arg(long, num_args = 1..)]
    project_ids: Vec<String>,

    /// JSON file mapping custom field identifiers to column names
    #[arg(long, conflicts_with = "custom_field_names")]
    custom_field_names_json: Option<PathBuf>,

    /// Custom fields as "customfield_XXXXX: column_name"
    #[arg(long, num_args = 1..)]
    custom_field_names: Vec<String>,

    /// Output directory
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Only export issues of this type (e.g., Story)
    #[arg(long)]
    issue_type: Option<String>,

    /// Page size of each search request
    #[arg(long)]
    max_results: Option<u32>,

    /// Keep the description column (markdown stripped)
    #[arg(long)]
    include_description: bool,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set a configuration value (e.g., `jira.url`, `export.projects`)
    Set { key: String, value: String },

    /// Get a configuration value
    Get { key: String },

    /// Show current configuration
    Show,
}

/// Everything needed for one export run.
#[derive(Debug)]
struct ExportSettings {
    jira_url: String,
    credentials: Credentials,
    project_ids: Vec<String>,
    spec: CustomFieldSpec,
    options: FetchOptions,
    policy: DescriptionPolicy,
    outdir: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::WriteIssues(args) => {
            let settings = resolve_settings(args, config)?;
            if settings.project_ids.is_empty() {
                tracing::warn!("No projects given, nothing to export");
            }

            let client = JiraClient::new(&settings.jira_url, settings.credentials)?;
            let path = write_multi_project_issues(
                &client,
                &settings.project_ids,
                &settings.spec,
                &settings.options,
                settings.policy,
                &settings.outdir,
            )
            .await?;

            println!("{}", export_summary(&path));
        }
        Commands::Config { command } => match command {
            ConfigCommands::Set { key, value } => {
                config.set(&key, &value)?;
                match cli.config.as_deref() {
                    Some(path) => config.save_to(path)?,
                    None => config.save()?,
                }
                tracing::info!("Set {} = {}", key, value);
            }
            ConfigCommands::Get { key } => match config.get(&key)? {
                Some(value) => println!("{}", value),
                None => println!("(not set)"),
            },
            ConfigCommands::Show => {
                let contents =
                    toml::to_string_pretty(&config).context("Failed to render configuration")?;
                println!("{}", contents);
            }
        },
    }

    Ok(())
}

/// Line reported once the export finished.
fn export_summary(path: &Path) -> String {
    if path.exists() {
        format!("Jira issues written in file {}", path.display())
    } else {
        format!("No issues found, nothing written to {}", path.display())
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Merge command-line arguments over the config file.
fn resolve_settings(args: WriteIssuesArgs, config: Config) -> anyhow::Result<ExportSettings> {
    let jira = config.jira;

    let Some(jira_url) = args
        .jira_url
        .or_else(|| jira.as_ref().map(|j| j.url.clone()))
    else {
        bail!("Jira URL is required (--jira-url or jira.url in the config file)");
    };

    let credentials = match args.token {
        Some(token) => Credentials::Bearer(token),
        None => {
            let Some(username) = args
                .username
                .or_else(|| jira.as_ref().and_then(|j| j.username.clone()))
            else {
                bail!("Username is required (--username or jira.username in the config file)");
            };
            let Some(password) = args.password else {
                bail!("--password is required");
            };
            Credentials::basic(username, password)
        }
    };

    let spec = match args.custom_field_names_json {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            CustomFieldSpec::from_json_str(&json)
                .with_context(|| format!("Invalid custom field names in {}", path.display()))?
        }
        None if !args.custom_field_names.is_empty() => {
            CustomFieldSpec::parse_pairs(&args.custom_field_names)?
        }
        None => config.custom_fields,
    };

    let project_ids = if args.project_ids.is_empty() {
        config.export.projects
    } else {
        args.project_ids
    };

    let options = FetchOptions {
        max_results: args.max_results.unwrap_or(config.export.max_results),
        issue_type: args.issue_type.or(config.export.issue_type),
        ..FetchOptions::default()
    };

    let policy = DescriptionPolicy::from_include(
        args.include_description || config.export.include_description,
    );

    let outdir = args
        .outdir
        .or(config.export.outdir)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(ExportSettings {
        jira_url,
        credentials,
        project_ids,
        spec,
        options,
        policy,
        outdir,
    })
}
