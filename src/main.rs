mod cli;

use imageforge::{
    config::{self, Config},
    controller::AppController,
    server,
    service::{GeminiImageClient, ImageService},
};
use imageforge_common::{AspectRatio, EncodedImage, GalleryImageId};
use imageforge_db::store::GalleryStore;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, GalleryCommands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Build the controller over the configured gallery and image service.
fn build_controller(config: &Config, config_path: Option<&Path>) -> Result<Arc<AppController>> {
    let data_dir = config::resolve_data_dir(config, config_path);
    let store = Arc::new(GalleryStore::open(data_dir));

    let client = GeminiImageClient::from_config(&config.image_service)
        .context("Failed to create image service client")?;
    if !client.has_api_key() {
        tracing::warn!(
            "No image service API key configured; set image_service.api_key or {}",
            config::API_KEY_ENV_VARS.join(" / ")
        );
    }
    let service: Arc<dyn ImageService> = Arc::new(client);

    Ok(Arc::new(AppController::new(store, service)))
}

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting Imageforge server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let controller = build_controller(&config, config_path)?;

    // Open the gallery eagerly so problems show up in the log at startup.
    // The server still runs without it; gallery routes report it unavailable.
    if let Err(e) = controller.store().initialize().await {
        tracing::warn!("Gallery unavailable: {}", e);
    }

    server::start_server(config, controller).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "imageforge=trace,imageforge_db=debug,imageforge_common=debug,tower_http=debug"
                .to_string()
        } else {
            "imageforge=info,imageforge_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Generate {
            prompt,
            aspect_ratio,
            output,
            save,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(generate(
                &prompt,
                &aspect_ratio,
                output,
                save,
                cli.config.as_deref(),
            ))
        }
        Commands::Gallery { command } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(gallery(command, cli.config.as_deref()))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("imageforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn generate(
    prompt: &str,
    aspect_ratio: &str,
    output: Option<PathBuf>,
    save: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let aspect_ratio: AspectRatio = aspect_ratio.parse()?;
    let config = config::load_config_or_default(config_path)?;
    let controller = build_controller(&config, config_path)?;

    tracing::info!("Generating {} image for prompt: {}", aspect_ratio, prompt);
    let image = controller
        .generate(prompt, aspect_ratio)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("generated.{}", image.extension())));
    write_image(&image, &output)?;
    println!("Wrote {}", output.display());

    if save {
        let outcome = controller
            .save(&image)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
        if outcome.is_duplicate() {
            println!("Already in gallery as #{}", outcome.id());
        } else {
            println!("Saved to gallery as #{}", outcome.id());
        }
    }

    Ok(())
}

async fn gallery(command: GalleryCommands, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let controller = build_controller(&config, config_path)?;

    match command {
        GalleryCommands::List { json } => {
            let images = controller
                .gallery()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&images)?);
                return Ok(());
            }

            if images.is_empty() {
                println!("No images in the gallery");
                return Ok(());
            }

            println!("{:<6} {:<26} {:<12} SIZE", "ID", "CREATED", "TYPE");
            for record in &images {
                let (mime, size) = match EncodedImage::parse(&record.image_data) {
                    Ok(image) => (
                        image.mime_type().to_string(),
                        image.base64_data().len() * 3 / 4,
                    ),
                    Err(_) => ("invalid".to_string(), record.image_data.len()),
                };
                println!(
                    "{:<6} {:<26} {:<12} {}",
                    record.id.to_string(),
                    record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                    mime,
                    format_size(size)
                );
            }
            println!("\n{} image(s)", images.len());
        }
        GalleryCommands::Add { file } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read image file: {:?}", file))?;
            let image = EncodedImage::sniff(&bytes)
                .with_context(|| format!("Not a PNG, JPEG, GIF or WebP image: {:?}", file))?;

            let outcome = controller
                .save(&image)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            if outcome.is_duplicate() {
                println!("Already in gallery as #{}", outcome.id());
            } else {
                println!("Saved to gallery as #{}", outcome.id());
            }
        }
        GalleryCommands::Remove { id } => {
            let id: GalleryImageId = id.parse()?;
            controller
                .delete(id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Removed #{}", id);
        }
        GalleryCommands::Export { id, output } => {
            let id: GalleryImageId = id.parse()?;
            let record = controller
                .gallery_image(id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            let image = EncodedImage::parse(&record.image_data)?;
            write_image(&image, &output)?;
            println!("Wrote #{} to {}", id, output.display());
        }
    }

    Ok(())
}

fn write_image(image: &EncodedImage, path: &Path) -> Result<()> {
    let bytes = image.decode()?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write image: {:?}", path))
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Model: {}", config.image_service.model);
            println!(
                "  API key: {}",
                if config.image_service.resolve_api_key().is_some() {
                    "configured"
                } else {
                    "missing"
                }
            );
            println!(
                "  Gallery: {}",
                config::resolve_data_dir(&config, Some(p)).display()
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            println!("  Model: {}", config.image_service.model);
        }
    }

    Ok(())
}
