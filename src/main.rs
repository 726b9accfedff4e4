//! action-log service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request id ─▶ trace span ─▶ timeout ─▶ controller router
//!                                                                 │
//!                                                                 ▼
//!                                              ┌───────────────────────────────┐
//!                                              │      ActionFilterLayer        │
//!                                              │  markers ─▶ ServiceProvider   │
//!                                              │  before-hooks                 │
//!                                              │  action handler               │
//!                                              │  after-hooks                  │
//!                                              └───────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use action_log::config::{read_config, validation::validate_config, ConfigError, ServiceConfig};
use action_log::controllers;
use action_log::observability::init_logging;
use action_log::services::ServiceCollection;
use action_log::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "action-log")]
#[command(about = "HTTP service logging action entry and exit through filter markers", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level.
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Cli {
    /// File values, then flag overrides, then one validation pass.
    fn into_config(self) -> Result<ServiceConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;
    init_logging(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let mut services = ServiceCollection::new();
    controllers::register_services(&mut services);
    let services = services.build();

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = action_log::lifecycle::wait_for_signal().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signals");
        }
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(config, services);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_bind_flag_overrides_invalid_file_value() {
        let file = config_file("[listener]\nbind_address = \"nowhere\"\n");
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            bind: Some("127.0.0.1:8080".into()),
            log_level: None,
        };

        let config = cli.into_config().unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:8080");
    }

    #[test]
    fn test_log_level_flag_overrides_file_value() {
        let file = config_file("[observability]\nlog_level = \"action_log=loud\"\n");
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            bind: None,
            log_level: Some("debug".into()),
        };

        let config = cli.into_config().unwrap();
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_invalid_value_without_override_fails() {
        let file = config_file("[timeouts]\nrequest_secs = 0\n");
        let cli = Cli {
            config: Some(file.path().to_path_buf()),
            bind: None,
            log_level: None,
        };

        let err = cli.into_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from(["action-log", "--bind", "0.0.0.0:9000", "-l", "info"]).unwrap();
        let config = cli.into_config().unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.observability.log_level, "info");
    }
}
