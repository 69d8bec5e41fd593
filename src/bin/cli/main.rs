use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use object_store_adapter::{
    AppBuilder, AppConfig, ObjectSource, ObjectStoreAdapter, ResponseOverrides, StorageBackend,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "object-store-cli")]
#[command(about = "CLI for bucket and object operations on an S3-compatible store", long_about = None)]
struct Cli {
    /// Storage backend type
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value = "memory")]
    backend: BackendKind,

    /// S3 endpoint host
    #[arg(long, env = "S3_ENDPOINT", default_value = "s3.amazonaws.com")]
    endpoint: String,

    /// S3 region
    #[arg(long, env = "S3_REGION")]
    region: Option<String>,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Use https for the endpoint
    #[arg(
        long,
        env = "S3_USE_SSL",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    use_ssl: bool,

    /// Provider host the endpoint must match (defaults to s3.amazonaws.com)
    #[arg(long, env = "S3_PROVIDER_HOST")]
    provider_host: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum BackendKind {
    Memory,
    S3,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage buckets
    Bucket {
        #[command(subcommand)]
        command: BucketCommands,
    },

    /// Manage bucket CORS configuration
    Cors {
        #[command(subcommand)]
        command: CorsCommands,
    },

    /// Upload a file
    Put {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// File path to upload
        file: PathBuf,
        /// Content type stored with the object
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },

    /// Download an object
    Get {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete an object
    Delete {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },

    /// Check whether any object starts with the given key
    Exists {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },

    /// Copy an object server-side
    Copy {
        source_bucket: String,
        source_key: String,
        destination_bucket: String,
        destination_key: String,
    },

    /// Generate presigned URLs
    Presign {
        #[command(subcommand)]
        command: PresignCommands,
    },
}

#[derive(Subcommand, Debug)]
enum BucketCommands {
    /// Check whether a bucket exists
    Exists { bucket: String },
    /// Create a bucket
    Create { bucket: String },
    /// Delete an empty bucket
    Delete { bucket: String },
}

#[derive(Subcommand, Debug)]
enum CorsCommands {
    /// Replace the CORS configuration with a single PUT rule
    Set {
        bucket: String,
        /// Allowed origin (any origin when omitted)
        #[arg(long)]
        origin: Option<String>,
    },
    /// Print the CORS rules as JSON
    Get { bucket: String },
}

#[derive(Subcommand, Debug)]
enum PresignCommands {
    /// URL for an unauthenticated upload
    Put {
        bucket: String,
        key: String,
        /// Validity in seconds
        #[arg(long, default_value_t = 3600)]
        expires: u64,
    },
    /// URL for an unauthenticated download
    Get {
        bucket: String,
        key: String,
        /// Validity in seconds
        #[arg(long, default_value_t = 3600)]
        expires: u64,
        /// Override the response Content-Type
        #[arg(long)]
        content_type: Option<String>,
        /// Override the response Cache-Control
        #[arg(long)]
        cache_control: Option<String>,
        /// Override the response Content-Disposition
        #[arg(long)]
        content_disposition: Option<String>,
        /// Override the response Expires header (RFC 3339)
        #[arg(long)]
        response_expires: Option<DateTime<Utc>>,
    },
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        let storage_backend = match self.backend {
            BackendKind::Memory => StorageBackend::InMemory,
            BackendKind::S3 => StorageBackend::S3 {
                endpoint: self.endpoint.clone(),
                region: self.region.clone(),
                access_key: self
                    .access_key
                    .clone()
                    .context("S3_ACCESS_KEY is required for the S3 backend")?,
                secret_key: self
                    .secret_key
                    .clone()
                    .context("S3_SECRET_KEY is required for the S3 backend")?,
                use_ssl: self.use_ssl,
                provider_host: self.provider_host.clone(),
            },
        };

        Ok(AppConfig { storage_backend })
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = EnvFilter::try_new(&self.log_level)
            .with_context(|| format!("Invalid log level: {}", self.log_level))?;

        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(env_filter)
            .init();

        Ok(())
    }
}

async fn run(adapter: &ObjectStoreAdapter, command: Commands) -> Result<()> {
    match command {
        Commands::Bucket { command } => match command {
            BucketCommands::Exists { bucket } => {
                println!("{}", adapter.bucket_exists(&bucket).await?);
            }
            BucketCommands::Create { bucket } => {
                adapter.make_bucket(&bucket).await?;
                info!("Created bucket {}", bucket);
            }
            BucketCommands::Delete { bucket } => {
                adapter.remove_bucket(&bucket).await?;
                info!("Deleted bucket {}", bucket);
            }
        },
        Commands::Cors { command } => match command {
            CorsCommands::Set { bucket, origin } => {
                adapter.set_cors_rule(&bucket, origin.as_deref()).await?;
                info!("Updated CORS configuration of {}", bucket);
            }
            CorsCommands::Get { bucket } => {
                let rules = adapter.retrieve_cors_rule(&bucket).await?;
                println!("{}", serde_json::to_string_pretty(&rules)?);
            }
        },
        Commands::Put {
            bucket,
            key,
            file,
            content_type,
        } => {
            adapter
                .put_object(&bucket, &key, ObjectSource::from_path(&file), &content_type)
                .await?;
            info!("Uploaded {} to {}/{}", file.display(), bucket, key);
        }
        Commands::Get {
            bucket,
            key,
            output,
        } => {
            let mut download = adapter.get_object(&bucket, &key).await?;
            match output {
                Some(path) => {
                    let mut file = tokio::fs::File::create(&path)
                        .await
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let written = tokio::io::copy(&mut download, &mut file).await?;
                    info!("Wrote {} bytes to {}", written, path.display());
                }
                None => {
                    tokio::io::copy(&mut download, &mut tokio::io::stdout()).await?;
                }
            }
        }
        Commands::Delete { bucket, key } => {
            adapter.remove_object(&bucket, &key).await?;
            info!("Deleted {}/{}", bucket, key);
        }
        Commands::Exists { bucket, key } => {
            println!("{}", adapter.object_exists(&bucket, &key).await?);
        }
        Commands::Copy {
            source_bucket,
            source_key,
            destination_bucket,
            destination_key,
        } => {
            adapter
                .copy_object(
                    &source_bucket,
                    &source_key,
                    &destination_bucket,
                    &destination_key,
                )
                .await?;
            info!(
                "Copied {}/{} to {}/{}",
                source_bucket, source_key, destination_bucket, destination_key
            );
        }
        Commands::Presign { command } => {
            let presigned = match command {
                PresignCommands::Put {
                    bucket,
                    key,
                    expires,
                } => adapter.presigned_put_url(&bucket, &key, expires).await?,
                PresignCommands::Get {
                    bucket,
                    key,
                    expires,
                    content_type,
                    cache_control,
                    content_disposition,
                    response_expires,
                } => {
                    let overrides = ResponseOverrides {
                        expires: response_expires,
                        content_type,
                        cache_control,
                        content_disposition,
                    };
                    adapter
                        .presigned_get_url(&bucket, &key, expires, Some(&overrides))
                        .await?
                }
            };

            info!("{} URL expires at {}", presigned.method, presigned.expires_at);
            println!("{}", presigned.url);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging()?;

    let config = cli.to_app_config()?;
    let adapter = AppBuilder::new()
        .with_config(config)
        .build_connected()
        .await
        .context("Failed to build object store adapter")?;

    run(&adapter, cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "object-store-cli",
            "--backend",
            "s3",
            "--endpoint",
            "localhost:9000",
            "--access-key",
            "minioadmin",
            "--secret-key",
            "minioadmin",
            "--use-ssl",
            "false",
            "--provider-host",
            "localhost:9000",
            "cors",
            "set",
            "uploads",
            "--origin",
            "https://example.com",
        ]);

        assert_eq!(cli.backend, BackendKind::S3);
        assert!(!cli.use_ssl);
        assert!(matches!(
            cli.command,
            Commands::Cors {
                command: CorsCommands::Set { ref origin, .. }
            } if origin.as_deref() == Some("https://example.com")
        ));

        let config = cli.to_app_config().unwrap();
        let server_config = config.storage_backend.server_config();
        assert_eq!(server_config.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    fn test_s3_backend_requires_credentials() {
        let mut cli = Cli::parse_from([
            "object-store-cli",
            "--backend",
            "s3",
            "bucket",
            "exists",
            "photos",
        ]);

        // Values may have been picked up from S3_* variables
        cli.access_key = None;
        cli.secret_key = Some("secret".to_string());
        let err = cli.to_app_config().unwrap_err();
        assert!(err.to_string().contains("S3_ACCESS_KEY"));

        cli.access_key = Some("access".to_string());
        cli.secret_key = None;
        let err = cli.to_app_config().unwrap_err();
        assert!(err.to_string().contains("S3_SECRET_KEY"));
    }

    #[test]
    fn test_use_ssl_accepts_boolish_values() {
        for (value, expected) in [("0", false), ("no", false), ("off", false), ("1", true), ("yes", true)] {
            let cli = Cli::parse_from([
                "object-store-cli",
                "--use-ssl",
                value,
                "exists",
                "b",
                "k",
            ]);
            assert_eq!(cli.use_ssl, expected, "--use-ssl {}", value);
        }
    }

    #[test]
    fn test_backend_defaults_to_memory() {
        let cli = Cli::parse_from(["object-store-cli", "exists", "b", "k"]);

        if std::env::var_os("STORAGE_BACKEND").is_none() {
            assert_eq!(cli.backend, BackendKind::Memory);
        }
    }

    #[test]
    fn test_memory_config() {
        let cli = Cli::parse_from(["object-store-cli", "--backend", "memory", "exists", "b", "k"]);

        let config = cli.to_app_config().unwrap();
        match config.storage_backend {
            StorageBackend::InMemory => (),
            _ => panic!("Expected InMemory backend"),
        }
    }
}
