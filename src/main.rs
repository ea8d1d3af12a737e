use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use transfer_sh_client::commands::{self, AppContext, UploadEvent, UploadStatus};
use transfer_sh_client::config::{self, AppConfig};
use transfer_sh_client::file_info::format_bytes;
use transfer_sh_client::markdown;
use transfer_sh_client::preview::language_for_filename;
use transfer_sh_client::uploader::progress_tracker::status_counts;
use transfer_sh_client::uploader::transfer_client::UploadOptions;
use transfer_sh_client::usage::{feature_summary, usage_examples};

#[derive(Debug, Parser)]
#[command(name = "transfer", version, about = "Share files through a transfer.sh instance")]
struct Cli {
    /// Instance to use instead of the configured one
    #[arg(long, global = true)]
    web_address: Option<String>,

    /// Settings file to use instead of the one in the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload files, all at once
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Delete each file after this many downloads
        #[arg(long)]
        max_downloads: Option<u32>,

        /// Delete each file after this many days
        #[arg(long)]
        max_days: Option<u32>,
    },
    /// Delete an uploaded file with its deletion token
    Delete { download_url: String, token: String },
    /// Print the content of an uploaded text file
    Preview {
        url: String,

        /// File name used to pick the highlighting language
        #[arg(long)]
        filename: Option<String>,

        /// Render the content as markdown
        #[arg(long)]
        markdown: bool,
    },
    /// Render a local markdown file to HTML
    Render { file: PathBuf },
    /// Show command-line usage examples for the instance
    Examples,
    /// Show the current settings
    Config {
        /// Restore the default settings first
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut app_config = match &cli.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config()?,
    };
    if let Some(web_address) = &cli.web_address {
        app_config = app_config.with_web_address(web_address)?;
    }

    match cli.command {
        Command::Upload {
            files,
            max_downloads,
            max_days,
        } => {
            let options = UploadOptions {
                max_downloads,
                max_days,
            };
            upload(app_config, files, options).await
        }
        Command::Delete {
            download_url,
            token,
        } => {
            let ctx = AppContext::new(app_config)?;
            commands::delete_file(&ctx, &download_url, &token).await?;
            println!("File deleted successfully");
            Ok(())
        }
        Command::Preview {
            url,
            filename,
            markdown,
        } => {
            let ctx = AppContext::new(app_config)?;
            let name = filename.unwrap_or_else(|| url.rsplit('/').next().unwrap_or_default().to_string());
            let language = language_for_filename(&name);

            if markdown || language == "markdown" {
                println!("{}", commands::render_markdown_preview(&ctx, &url).await?);
            } else {
                log::info!("Showing {} as {}", name, language);
                print!("{}", commands::fetch_preview(&ctx, &url).await?);
            }
            Ok(())
        }
        Command::Render { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("{}", markdown::render_markdown(&raw));
            Ok(())
        }
        Command::Examples => {
            println!("{}", app_config.hostname);
            for line in feature_summary(&app_config) {
                println!("  {}", line);
            }
            for example in usage_examples(&app_config) {
                println!();
                println!("{}", example.title);
                if let Some(comment) = &example.comment {
                    println!("  # {}", comment);
                }
                for command in &example.commands {
                    println!("  $ {}", command);
                }
            }
            Ok(())
        }
        Command::Config { reset } => {
            let shown = if reset {
                match &cli.config {
                    Some(path) => {
                        config::save_config_to(path, &AppConfig::default())?;
                        AppConfig::default()
                    }
                    None => config::reset_config()?,
                }
            } else {
                app_config
            };
            println!("{}", serde_json::to_string_pretty(&shown)?);
            Ok(())
        }
    }
}

async fn upload(app_config: AppConfig, files: Vec<PathBuf>, options: UploadOptions) -> Result<()> {
    let ctx = AppContext::new(app_config)?;
    let mut settle_events = ctx.subscribe();
    let mut progress_events = ctx.subscribe();

    let printer_ctx = ctx.clone();
    let printer = tokio::spawn(async move {
        while let Some(event) = commands::next_upload_event(&mut progress_events).await {
            if let UploadEvent::Progress { id, progress } = event {
                if let Some(record) = commands::get_upload_record(&printer_ctx, &id) {
                    eprintln!("{}: {}%", record.name, progress);
                }
            }
        }
    });

    let ids = commands::upload_files(&ctx, files, options);
    commands::wait_for_uploads(&ctx, &ids, &mut settle_events).await;
    printer.abort();

    let records = commands::get_upload_records(&ctx);
    for record in &records {
        match &record.status {
            UploadStatus::Complete {
                url,
                deletion_token,
            } => {
                println!("{}", url);
                if let Some(token) = deletion_token {
                    println!("  deletion token: {}", token);
                }
            }
            UploadStatus::Error { message } => {
                eprintln!("{} ({}): {}", record.name, format_bytes(record.size), message);
            }
            UploadStatus::Uploading => {}
        }
    }

    if let Some(links) = commands::get_bulk_links(&ctx) {
        println!("Download all as ZIP:    {}", links.zip);
        println!("Download all as TAR.GZ: {}", links.tar_gz);
    }

    let (_, _, failed) = status_counts(&records);
    if failed > 0 {
        bail!("{} of {} upload(s) failed", failed, records.len());
    }

    Ok(())
}
