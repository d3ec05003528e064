//! Thin binary wrapper around the `glyphsvg` library.
//!
//! Commands:
//! - `glyphsvg serve` runs the HTTP service (the default when no command is given)
//! - `glyphsvg sync-catalog --api-key KEY` refreshes the font-list snapshot
//!
//! Every `serve` flag also reads a `GLYPHSVG_*` environment variable. `RUST_LOG` controls logging.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use glyphsvg::ServiceConfig;
use glyphsvg::catalog::sync::{GOOGLE_FONTS_API, sync_catalog};
use glyphsvg::config::{CachePolicy, CatalogSource};

#[derive(Parser)]
#[command(name = "glyphsvg")]
#[command(author, version, about = "Render text as SVG glyph paths over HTTP", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// `serve` flags, used when no command is given
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP service
    Serve(ServeArgs),

    /// Download the Google Fonts list and write it as a snapshot
    SyncCatalog {
        /// Google Fonts developer API key
        #[arg(long, env = "GLYPHSVG_GOOGLE_FONTS_API_KEY")]
        api_key: String,

        /// Output file; repeat to write several copies
        #[arg(long = "out", default_value = "data/font-list.json")]
        outputs: Vec<PathBuf>,

        /// Font list API endpoint
        #[arg(long, default_value = GOOGLE_FONTS_API)]
        api_url: String,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout_secs: u64,
    },
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "GLYPHSVG_BIND", default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// `snapshot:<path>` or `remote:<base-url>`
    #[arg(long, env = "GLYPHSVG_CATALOG", default_value_t = CatalogSource::default())]
    catalog: CatalogSource,

    /// Directory for downloaded font files [default: <tmp>/glyphsvg-fonts]
    #[arg(long, env = "GLYPHSVG_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Persist the download cache to this JSON file
    #[arg(long, env = "GLYPHSVG_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Timeout for outgoing HTTP requests, seconds
    #[arg(long, env = "GLYPHSVG_HTTP_TIMEOUT", default_value_t = 30)]
    http_timeout_secs: u64,

    /// Fail fast for this many seconds after a failed download (0 retries immediately)
    #[arg(long, env = "GLYPHSVG_FAILURE_COOLDOWN", default_value_t = 0)]
    failure_cooldown_secs: u64,

    /// Cache-Control s-maxage, seconds
    #[arg(long, env = "GLYPHSVG_MAX_AGE", default_value_t = 3600)]
    max_age: u64,

    /// Cache-Control stale-while-revalidate, seconds
    #[arg(long, env = "GLYPHSVG_STALE_WHILE_REVALIDATE", default_value_t = 3900)]
    stale_while_revalidate: u64,

    /// Send `Access-Control-Allow-Origin: *`
    #[arg(long, env = "GLYPHSVG_CORS", default_value_t = true, action = ArgAction::Set)]
    cors: bool,
}

impl ServeArgs {
    fn into_config(self) -> ServiceConfig {
        let defaults = ServiceConfig::default();
        ServiceConfig {
            bind: self.bind,
            catalog: self.catalog,
            cache_dir: self.cache_dir.unwrap_or(defaults.cache_dir),
            manifest: self.manifest,
            http_timeout: Duration::from_secs(self.http_timeout_secs),
            failure_cooldown: Duration::from_secs(self.failure_cooldown_secs),
            cache_policy: CachePolicy {
                s_maxage: self.max_age,
                stale_while_revalidate: self.stale_while_revalidate,
            },
            cors: self.cors,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Keep logging setup in the binary so the library remains unopinionated.
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Serve(args)) => serve(args.into_config()).await,
        None => serve(cli.serve.into_config()).await,
        Some(Command::SyncCatalog {
            api_key,
            outputs,
            api_url,
            timeout_secs,
        }) => {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()?;
            let count = sync_catalog(&client, &api_url, &api_key, &outputs).await?;
            log::info!("{count} font families synced");
            Ok(())
        }
    }
}

async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let service = config.build()?;
    glyphsvg::server::serve(service, &config).await
}
