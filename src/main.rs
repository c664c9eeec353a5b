use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wp_rest_client::config::Config;
use wp_rest_client::{Fetched, Filters, Importer, PostTypes, SqlitePostStore, WpClient};

#[derive(Parser)]
#[command(name = "wp-rest-client")]
#[command(about = "Copy posts between WordPress sites over the REST API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the listing URL for the given types and filters
    Url(ListingArgs),
    /// Fetch the listing and print the response body
    Fetch {
        #[command(flatten)]
        listing: ListingArgs,
        /// Print the body as received instead of re-encoded JSON
        #[arg(long)]
        raw: bool,
    },
    /// Fetch the listing and import every post into the local store
    Import(ListingArgs),
    /// Push a post read from a JSON file to a remote site
    Push {
        /// JSON file holding one post object
        file: PathBuf,
        /// Target URL (default: the configured listing endpoint)
        #[arg(long)]
        url: Option<String>,
        /// Authorization header value (default: WP_AUTH_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },
}

#[derive(Args)]
struct ListingArgs {
    /// Post type to list; repeat for several
    #[arg(long = "type", value_name = "TYPE")]
    types: Vec<String>,
    /// Listing filter as key=value; repeat for several
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
    /// Root URL of the site (default: WP_ROOT_URL)
    #[arg(long)]
    root: Option<String>,
}

impl ListingArgs {
    fn post_types(&self) -> PostTypes {
        if self.types.is_empty() {
            PostTypes::default()
        } else {
            self.types.clone().into()
        }
    }

    fn filters(&self) -> Option<Filters> {
        (!self.filters.is_empty()).then(|| self.filters.iter().cloned().collect())
    }
}

fn parse_filter(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got '{value}'"))
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let client = WpClient::new(config.clone())?;

    match cli.command {
        Command::Url(listing) => {
            let url = client.listing_url(
                listing.post_types(),
                listing.filters().as_ref(),
                listing.root.as_deref(),
            )?;
            println!("{url}");
        }
        Command::Fetch { listing, raw } => {
            let url = client.listing_url(
                listing.post_types(),
                listing.filters().as_ref(),
                listing.root.as_deref(),
            )?;
            match client.fetch(&url, None, !raw).await? {
                Fetched::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Fetched::Raw(body) => println!("{body}"),
            }
        }
        Command::Import(listing) => {
            let url = client.listing_url(
                listing.post_types(),
                listing.filters().as_ref(),
                listing.root.as_deref(),
            )?;
            let listing = client
                .fetch(&url, None, true)
                .await?
                .into_json()
                .context("Listing was not decoded")?;

            if let Some(parent) = config.database_path.parent() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
            let store = Arc::new(SqlitePostStore::new(&config.database_path).await?);
            let importer =
                Importer::new(store.clone(), config.import_id_policy).with_listener(store.clone());

            let results = importer.import_all(listing).await;
            let mut failed = 0usize;
            for result in &results {
                match result {
                    Ok(id) => println!("imported {id}"),
                    Err(e) => {
                        failed += 1;
                        println!("failed: {e}");
                    }
                }
            }
            info!(
                imported = results.len() - failed,
                failed,
                total = store.count_posts().await?,
                "Import finished"
            );
        }
        Command::Push { file, url, token } => {
            let contents = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let post: serde_json::Value = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;

            let token = token
                .or_else(|| config.auth_token.clone())
                .context("No auth token: pass --token or set WP_AUTH_TOKEN")?;
            let url = url.unwrap_or_else(|| config.default_push_url());

            let response = client.push(&post, &token, &url, None).await?;
            println!("{} {}", response.status, response.body);
            if !response.is_success() {
                anyhow::bail!("Remote site answered {}", response.status);
            }
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,wp_rest_client=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Logs go to stderr; stdout carries command output
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}
