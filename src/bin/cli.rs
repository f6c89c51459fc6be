use std::collections::HashMap;

use anyhow::Result;
use archiver::{
    domain::archiver::ArchiverConfig,
    drivers::{
        event::EventConfig,
        update::{UpdateConfig, UpdateTarget},
    },
};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[arg(short, long, help = "Cli config path file", env = "CLI_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Clone)]
pub struct UpdateArgs {
    /// Archive only this resource id
    #[arg(long, conflicts_with = "package")]
    pub resource: Option<String>,

    /// Archive every resource of this package id
    #[arg(long)]
    pub package: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Queue archive tasks for stored resources
    Update(UpdateArgs),

    /// Consume host notifications and queue archive tasks
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .with_env_var("RUST_LOG")
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(env_filter)
        .init();

    let cli = Cli::parse();
    let config = Config::new(&cli.config)?;

    match cli.command {
        Commands::Update(args) => {
            let target = match (args.resource, args.package) {
                (Some(id), _) => UpdateTarget::Resource(id),
                (None, Some(package_id)) => UpdateTarget::Package(package_id),
                (None, None) => UpdateTarget::All,
            };

            archiver::drivers::update::run(config.into(), target).await?;
        }
        Commands::Sync => {
            info!("subscribing to host notifications");
            archiver::drivers::event::subscribe(config.try_into()?).await?;
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
struct Config {
    db_path: String,
    broker_url: String,
    topic: Option<String>,
    #[serde(default)]
    kafka: HashMap<String, String>,
    #[serde(default)]
    ckan: HashMap<String, String>,
}
impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(true))
            .add_source(config::Environment::with_prefix("cli").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

impl From<Config> for UpdateConfig {
    fn from(value: Config) -> Self {
        Self {
            db_path: value.db_path,
            broker_url: value.broker_url,
            archiver: ArchiverConfig::from_host(&value.ckan),
        }
    }
}

impl TryFrom<Config> for EventConfig {
    type Error = anyhow::Error;

    fn try_from(value: Config) -> Result<Self, Self::Error> {
        let Some(topic) = value.topic else {
            anyhow::bail!("topic is required to sync notifications");
        };

        Ok(Self {
            db_path: value.db_path,
            broker_url: value.broker_url,
            topic,
            kafka: value.kafka,
            archiver: ArchiverConfig::from_host(&value.ckan),
        })
    }
}
