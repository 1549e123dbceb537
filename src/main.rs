use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use novastream_core::{
    Catalog, Category, ContentApi, ContentItem, ContentRepository, Episode, FileStore, HttpTransport, ItemPatch, LoadStatus,
    NewItem,
};

mod config;
mod helpers;
mod logger;
mod models;

use config::{config_file_path, load_config, save_config};
use helpers::{data_dir, item_line, mask_secret, parse_category};
use models::Config;

#[derive(Debug, Parser)]
#[command(name = "novastream", version, about = "Manage the NovaStream film and series catalog")]
struct Cli {
    /// Base URL of the remote store (overrides the config file)
    #[arg(long, env = "NOVASTREAM_REMOTE_URL", global = true)]
    url: Option<String>,
    /// Access key of the remote store (overrides the config file)
    #[arg(long, env = "NOVASTREAM_REMOTE_KEY", hide_env_values = true, global = true)]
    key: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Catalog(CatalogCommand),
    /// Show the effective configuration
    Config {
        /// Write it to the config file as well
        #[arg(long)]
        save: bool,
    },
}

/// Commands that work on the loaded catalog.
#[derive(Debug, Subcommand)]
enum CatalogCommand {
    /// List films, series or both
    List {
        #[arg(value_parser = parse_category)]
        category: Option<Category>,
    },
    /// Print one item as JSON
    Show {
        #[arg(value_parser = parse_category)]
        category: Category,
        id: String,
    },
    /// Create an item
    Add {
        #[arg(value_parser = parse_category)]
        category: Category,
        #[command(flatten)]
        fields: ItemFields,
    },
    /// Change some fields of an item
    Update {
        #[arg(value_parser = parse_category)]
        category: Category,
        id: String,
        #[command(flatten)]
        fields: ItemFields,
    },
    /// Remove an item
    Delete {
        #[arg(value_parser = parse_category)]
        category: Category,
        id: String,
    },
}

#[derive(Debug, Args)]
struct ItemFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    image: Option<String>,
    #[arg(long)]
    video_url: Option<String>,
    #[arg(long)]
    duration: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    /// Episode list as JSON, e.g. '[{"season":1,"title":"Pilot","videoUrl":"..."}]'
    #[arg(long)]
    episodes_json: Option<String>,
}

impl ItemFields {
    fn episodes(&self) -> Result<Option<Vec<Episode>>, serde_json::Error> {
        self.episodes_json.as_deref().map(serde_json::from_str).transpose()
    }

    fn into_new_item(self) -> Result<NewItem, Box<dyn Error>> {
        let episodes = self.episodes()?;
        let title = self.title.ok_or("--title is required when adding")?;
        Ok(NewItem {
            title,
            description: self.description,
            image: self.image,
            video_url: self.video_url,
            duration: self.duration,
            year: self.year,
            genre: self.genre,
            episodes,
        })
    }

    /// An update has to change something.
    fn into_patch(self) -> Result<ItemPatch, Box<dyn Error>> {
        let episodes = self.episodes()?;
        let patch = ItemPatch {
            title: self.title,
            description: self.description,
            image: self.image,
            video_url: self.video_url,
            duration: self.duration,
            year: self.year,
            genre: self.genre,
            episodes,
        };
        if patch.is_empty() {
            return Err("nothing to update".into());
        }
        Ok(patch)
    }
}

impl Cli {
    /// Command-line values (or their environment variables) win over the file.
    fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(url) = &self.url { cfg.remote_url = url.clone(); }
        if let Some(key) = &self.key { cfg.remote_key = key.clone(); }
    }
}

/// Items of the catalog in list order, films first.
fn listed_items(catalog: &Catalog, category: Option<Category>) -> Vec<ContentItem> {
    let films = catalog.films.iter().cloned().map(ContentItem::Film);
    let series = catalog.series.iter().cloned().map(ContentItem::Serie);
    match category {
        Some(Category::Film) => films.collect(),
        Some(Category::Serie) => series.collect(),
        None => films.chain(series).collect(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("⚠️ Could not read {}: {}", config_file_path().display(), e);
            Config::default()
        }
    };
    cli.apply_overrides(&mut cfg);
    logger::init(&cfg.log_level);

    match run(cli.command, &cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_repository(cfg: &Config) -> Result<ContentRepository, Box<dyn Error>> {
    let transport = HttpTransport::new(Duration::from_secs(cfg.request_timeout_secs))?;
    let api = ContentApi::new(cfg.remote(), Arc::new(transport));
    Ok(ContentRepository::new(api, FileStore::new(data_dir())))
}

async fn run(command: Command, cfg: &Config) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Config { save } => {
            if save {
                save_config(cfg)?;
                println!("✅ Saved {}", config_file_path().display());
            }
            print_config(cfg);
            Ok(())
        }
        Command::Catalog(command) => run_catalog(command, cfg).await,
    }
}

async fn run_catalog(command: CatalogCommand, cfg: &Config) -> Result<(), Box<dyn Error>> {
    let mut repo = open_repository(cfg)?;
    let report = repo.load().await;
    match (report.status, &report.error) {
        (LoadStatus::Fallback, Some(e)) => eprintln!("⚠️ Remote store unavailable ({}), showing local catalog", e),
        (LoadStatus::Stale, Some(e)) => eprintln!("⚠️ Local catalog unreadable: {}", e),
        _ => {}
    }

    match command {
        CatalogCommand::List { category } => {
            for item in listed_items(repo.catalog(), category) {
                println!("{}", item_line(&item));
            }
        }
        CatalogCommand::Show { category, id } => {
            let item = repo.get_item(category, &id).ok_or_else(|| format!("no {} with id {}", category, id))?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        CatalogCommand::Add { category, fields } => {
            let created = repo.add_item(category, fields.into_new_item()?).await?;
            println!("✅ Added {} {}", category, created.id());
        }
        CatalogCommand::Update { category, id, fields } => {
            if !repo.update_item(category, &id, fields.into_patch()?).await? {
                return Err(format!("no {} with id {}", category, id).into());
            }
            println!("✅ Updated {} {}", category, id);
        }
        CatalogCommand::Delete { category, id } => {
            repo.delete_item(category, &id).await?;
            println!("🗑️ Deleted {} {}", category, id);
        }
    }
    Ok(())
}

fn print_config(cfg: &Config) {
    println!("config file:     {}", config_file_path().display());
    println!("data directory:  {}", data_dir().display());
    println!("log file:        {}", logger::log_path().display());
    println!("remote url:      {}", if cfg.remote_url.is_empty() { "(not set)" } else { cfg.remote_url.as_str() });
    println!("remote key:      {}", if cfg.remote_key.is_empty() { "(not set)".to_string() } else { mask_secret(&cfg.remote_key) });
    println!("remote enabled:  {}", cfg.remote().is_configured());
    println!("timeout:         {}s", cfg.request_timeout_secs);
    println!("log level:       {}", cfg.log_level);
}
