use axum::Router;
use tokio::{net::TcpListener, sync::watch};
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::ServerConfig;
use crate::firmware::FirmwareImage;

pub struct UpdateServer {
    config: ServerConfig,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
}

impl UpdateServer {
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let firmware = FirmwareImage::new(&config.firmware_path)?;
        let state = AppState::new(firmware, config.target_version.as_str());
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            state,
            shutdown_tx,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Binds the configured address and serves until a shutdown signal.
    pub async fn start(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;

        // The image only has to exist when a device asks for it.
        let deployed = tokio::fs::metadata(&self.config.firmware_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !deployed {
            warn!(
                "Firmware image {} not found, updates will fail until it is deployed",
                self.config.firmware_path.display()
            );
        }

        info!(
            target_version = %self.config.target_version,
            "Update server listening on {}", addr
        );

        let shutdown_rx = self.shutdown_tx.subscribe();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(Self::shutdown_signal(shutdown_rx))
            .await?;

        info!("Update server stopped");
        Ok(())
    }

    async fn shutdown_signal(mut shutdown: watch::Receiver<bool>) {
        tokio::select! {
            _ = Self::terminate() => {
                info!("Received SIGTERM, starting graceful shutdown");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, starting graceful shutdown");
            }
            // Also resolves when shutdown() ran before this receiver existed.
            _ = shutdown.wait_for(|stop| *stop) => {
                info!("Shutdown requested");
            }
        }
    }

    #[cfg(unix)]
    async fn terminate() {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            // Without the handler only SIGINT or shutdown() stop the server.
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    async fn terminate() {
        std::future::pending::<()>().await;
    }

    /// Stops a running server, or one whose `serve` has not started yet.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}
