use std::env;
#[cfg(feature = "openapi")]
use std::fs;
use std::path::PathBuf;

use anyhow::anyhow;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use quickcards::{ServerConfig, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Handle CLI commands
    let mut config_path: Option<PathBuf> = None;
    let mut args = env::args();
    let _ = args.next();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config_path = Some(PathBuf::from(path));
            }
            #[cfg(feature = "openapi")]
            "openapi" => {
                let mut format = "yaml".to_string();
                let mut output: Option<PathBuf> = None;

                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "-f" | "--format" => {
                            format = args
                                .next()
                                .ok_or_else(|| anyhow!("--format requires a value (yaml or json)"))?;
                            if format != "yaml" && format != "json" {
                                anyhow::bail!("Invalid format '{format}'. Must be 'yaml' or 'json'");
                            }
                        }
                        "-o" | "--output" => {
                            let path = args
                                .next()
                                .ok_or_else(|| anyhow!("--output requires a file path"))?;
                            output = Some(PathBuf::from(path));
                        }
                        other => {
                            anyhow::bail!(
                                "Unknown option '{other}'. Use --format (yaml|json) or --output <file>"
                            );
                        }
                    }
                }

                let spec_content = if format == "json" {
                    quickcards::docs::openapi::spec_json()
                        .map_err(|e| anyhow!("Failed to generate OpenAPI JSON: {e}"))?
                } else {
                    quickcards::docs::openapi::spec_yaml()
                        .map_err(|e| anyhow!("Failed to generate OpenAPI YAML: {e}"))?
                };

                if let Some(output_path) = output {
                    fs::write(&output_path, &spec_content).map_err(|e| {
                        anyhow!("Failed to write to {}: {e}", output_path.display())
                    })?;
                    println!("OpenAPI spec written to {}", output_path.display());
                } else {
                    println!("{spec_content}");
                }

                return Ok(());
            }
            other => {
                #[cfg(feature = "openapi")]
                {
                    anyhow::bail!(
                        "Unknown argument '{other}'. Supported: --config <file>, openapi"
                    );
                }
                #[cfg(not(feature = "openapi"))]
                {
                    anyhow::bail!("Unknown argument '{other}'. Supported: --config <file>");
                }
            }
        }
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => {
            // .env still feeds the environment values the YAML file leaves out
            let _ = dotenvy::dotenv();
            ServerConfig::from_file(path)
        }
        None => ServerConfig::from_env(),
    }
    .map_err(|e| anyhow!(e.to_string()))?;

    let address = config.address();
    let cors = routes::cors_layer(&config.frontend_url)
        .map_err(|e| anyhow!("Invalid FRONTEND_URL '{}': {e}", config.frontend_url))?;
    info!("Allowing CORS requests from {}", config.frontend_url);

    // Create application state
    let app_state = AppState::new(config).map_err(|e| anyhow!(e.to_string()))?;

    let app = routes::api::create_api_router();
    #[cfg(feature = "openapi")]
    let app = app.merge(quickcards::docs::openapi::router());
    let app = app.layer(cors).with_state(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;
    info!("Server listening on {address}");

    axum::serve(listener, app).await?;

    Ok(())
}
