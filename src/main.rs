use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Input;
use localscraper::{
    config::{Config, ConfigLayer},
    fetch::SerpApiClient,
    pipeline::{self, RunOptions, RunOutcome},
    query::build_query,
    sheets::{ServiceAccount, SheetsConnector},
};
use reqwest::Client;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Pull local business listings for a search and add new ones to a Google Sheet.
#[derive(Parser, Debug)]
#[command(name = "localscraper", version)]
struct Args {
    /// Kind of business to search for, e.g. "dentist". Prompted for when omitted.
    #[arg(long)]
    business_type: Option<String>,

    /// Where to search, e.g. "Austin, TX". Prompted for when omitted.
    #[arg(long)]
    location: Option<String>,

    /// YAML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Spreadsheet id or URL
    #[arg(long)]
    sheet: Option<String>,

    /// Service-account key file
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// SerpApi key
    #[arg(long)]
    api_key: Option<String>,

    /// Number of results to request
    #[arg(long)]
    num: Option<u32>,

    /// Report what would be appended without writing
    #[arg(long)]
    dry_run: bool,
}

impl Args {
    fn config_layer(&self) -> ConfigLayer {
        ConfigLayer {
            serpapi_key: self.api_key.clone(),
            result_count: self.num,
            sheet_id: self.sheet.clone(),
            credentials_path: self.credentials.clone(),
            ..Default::default()
        }
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut layer = ConfigLayer::default();
    if let Some(path) = &args.config {
        layer = layer.merge(ConfigLayer::from_yaml_file(path)?);
    }
    layer = layer.merge(ConfigLayer::from_env()?);
    layer = layer.merge(args.config_layer());
    Config::from_layer(layer)
}

fn prompt(given: Option<String>, label: &str) -> Result<String> {
    match given {
        Some(v) => Ok(v),
        None => Input::<String>::new()
            .with_prompt(label)
            .allow_empty(true)
            .interact_text()
            .with_context(|| format!("reading {}", label)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let business_type = prompt(args.business_type.clone(), "Enter Business Type")?;
    let location = prompt(args.location.clone(), "Enter Location")?;
    let query = build_query(&business_type, &location);

    let account = ServiceAccount::from_file(&config.credentials_path)?;
    info!(account = %account.client_email, sheet = %config.sheet_id, "configuration loaded");

    let http = Client::new();
    let source = SerpApiClient::new(http.clone(), &config)?;
    let connector = SheetsConnector::new(http, account, &config);

    let outcome = pipeline::run(
        &source,
        &connector,
        &query,
        RunOptions {
            dry_run: args.dry_run,
        },
    )
    .await?;

    match outcome {
        RunOutcome::StoreUnavailable => info!("stopped early; nothing was written"),
        other => info!(outcome = ?other, "finished the job"),
    }
    Ok(())
}
