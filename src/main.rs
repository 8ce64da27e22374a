use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use ualflix::config::AppConfig;
use ualflix::models::{FileCandidate, MetadataCandidate, VideoEdit, VideoFile, VideoId};
use ualflix::services::{DeleteOutcome, PlayOutcome, RefreshOutcome};
use ualflix::CatalogClient;

#[derive(Parser)]
#[command(version, about = "Upload, browse and administer the video catalog", long_about = None)]
struct Cli {
    /// Extra config file layered over config/{RUN_MODE}
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog
    List,
    /// Upload a video file
    Upload {
        file: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "")]
        genre: String,
    },
    /// Add a catalog entry for an already hosted video
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        url: String,
        #[arg(long)]
        duration: f64,
        #[arg(long, default_value = "")]
        genre: String,
    },
    /// Edit title, description or genre of an entry
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        genre: Option<String>,
    },
    /// Delete an entry
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Watch a video once, counting one view
    Play { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    log::debug!("Using services {:?}", config.services);

    let client = CatalogClient::from_config(&config).context("Failed to build HTTP client")?;
    run(&client, cli.command).await
}

async fn run(client: &CatalogClient, command: Command) -> Result<()> {
    match command {
        Command::List => {
            refresh(client).await?;
            let videos = client.catalog().videos();
            if videos.is_empty() {
                println!("No videos available in the catalog yet.");
            }
            for video in videos.iter() {
                let uploaded = video
                    .timestamp
                    .map(|t| t.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!(
                    "{}\t{}\t{}\t{} views\t{}\t{}",
                    video.id,
                    video.title,
                    video.genre.as_deref().unwrap_or("-"),
                    video.views,
                    uploaded,
                    video.video_url
                );
            }
        }
        Command::Upload {
            file,
            title,
            description,
            genre,
        } => {
            let video = VideoFile::load(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let mut candidate = FileCandidate {
                title,
                description,
                genre,
                file: None,
            };
            client.select_file(&mut candidate, video)?;
            let submitted = client.upload(&mut candidate).await?;
            println!("{}", submitted.message);
        }
        Command::Add {
            title,
            description,
            url,
            duration,
            genre,
        } => {
            let mut candidate = MetadataCandidate {
                title,
                description,
                genre,
                duration,
                video_url: url,
            };
            let submitted = client.admin().add(&mut candidate).await?;
            println!("{}", submitted.message);
        }
        Command::Edit {
            id,
            title,
            description,
            genre,
        } => {
            refresh(client).await?;
            let id = VideoId::new(id);
            let Some(current) = client.catalog().cache().get(&id) else {
                bail!("No video with id {} in the catalog", id);
            };
            let mut edit = VideoEdit::from(&current);
            if let Some(title) = title {
                edit.title = title;
            }
            if let Some(description) = description {
                edit.description = description;
            }
            if let Some(genre) = genre {
                edit.genre = genre;
            }
            let updated = client.admin().edit(&id, &edit).await?;
            println!("Updated {}: {}", updated.id, updated.title);
        }
        Command::Delete { id, yes } => {
            let id = VideoId::new(id);
            let outcome = client
                .admin()
                .delete(&id, |id| yes || confirm(&format!("Delete video {}?", id)))
                .await?;
            match outcome {
                DeleteOutcome::Deleted => println!("Deleted {}", id),
                DeleteOutcome::Cancelled => println!("Cancelled"),
            }
        }
        Command::Play { id } => {
            refresh(client).await?;
            let id = VideoId::new(id);
            let outcome = client.views().on_play(&id).await;
            client.views().on_end(&id);
            if outcome == PlayOutcome::CountFailed {
                log::warn!("View of {} was not recorded", id);
            }
            match client.catalog().cache().get(&id) {
                Some(video) => println!("{}: {} views", video.title, video.views),
                None => println!("{} is not in the catalog", id),
            }
        }
    }
    Ok(())
}

async fn refresh(client: &CatalogClient) -> Result<()> {
    match client.refresh().await {
        RefreshOutcome::Failed(err) => bail!("Error loading videos: {}", err),
        RefreshOutcome::Loaded(_) | RefreshOutcome::Superseded => Ok(()),
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
