use crate::config::Config;
use crate::core_acl::{IpMaskCache, UserCache};
use crate::core_control::CancelReason;
use crate::core_db::Pool;
use crate::core_ftpcommand::handlers::{site_registry, standard_registry};
use crate::core_ftpcommand::CommandRegistry;
use crate::core_network::network;
use crate::core_network::ClientRegistry;
use crate::core_tls::TlsConnection;
use crate::core_vfs::Vfs;
use crate::helpers::{load_banner, log_config};
use anyhow::{Context, Result};
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Everything sessions share: configuration, caches, registries.
pub struct ServerContext {
    pub config: Config,
    pub pool: Pool,
    pub users: UserCache,
    pub ipmasks: IpMaskCache,
    pub vfs: Vfs,
    pub tls: Option<TlsConnection>,
    pub banner: Option<String>,
    pub clients: ClientRegistry,
    pub commands: CommandRegistry,
    pub site_commands: CommandRegistry,
}

impl ServerContext {
    /// Starts the database worker and loads users, masks, TLS and the banner.
    pub async fn build(config: Config) -> Result<Arc<Self>> {
        let pool = Pool::start(&config.server.data_dir);

        let users = UserCache::new(pool.clone(), config.server.bcrypt_cost);
        users.initialize().await.context("Failed to load users")?;

        let ipmasks = IpMaskCache::new(pool.clone());
        ipmasks
            .initialize()
            .await
            .context("Failed to load ip masks")?;

        let tls = if config.tls.enabled {
            config.tls.validate()?;
            let tls = TlsConnection::from_config(&config.tls)
                .context("Failed to initialise TLS")?;
            info!("TLS enabled with certificate {:?}", config.tls.cert_file);
            Some(tls)
        } else {
            None
        };

        let banner = match &config.server.banner_file {
            Some(path) => match load_banner(path) {
                Ok(banner) => Some(banner),
                Err(e) => {
                    warn!("Continuing without banner: {:#}", e);
                    None
                }
            },
            None => None,
        };

        let vfs = Vfs::from_config(
            &config.server.chroot_dir,
            &config.server.min_homedir,
            config.path_rules.clone(),
        );

        Ok(Arc::new(Self {
            pool,
            users,
            ipmasks,
            vfs,
            tls,
            banner,
            clients: ClientRegistry::new(),
            commands: standard_registry()?,
            site_commands: site_registry()?,
            config,
        }))
    }

    /// Cancels every session, waits for them to drain, then stops the pool.
    pub async fn shutdown(&self) {
        self.clients.cancel_all(CancelReason::Shutdown).await;
        let grace = Duration::from_secs(self.config.server.shutdown_grace_secs);
        if !self.clients.wait_until_empty(grace).await {
            warn!(
                "{} session(s) still open after {:?}",
                self.clients.len().await,
                grace
            );
        }
        self.pool.shutdown().await;
    }
}

/// Runs the FTP server until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    log_config(&config);

    let address = format!(
        "{}:{}",
        config.server.listen_address, config.server.listen_port
    );
    let context = ServerContext::build(config).await?;
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Server listening on {}", address);

    let (stop_tx, stop_rx) = watch::channel(false);
    let accept_loop = tokio::spawn(network::accept_loop(
        listener,
        Arc::clone(&context),
        stop_rx,
    ));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    let _ = stop_tx.send(true);
    match accept_loop.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Accept loop failed: {}", e),
        Err(e) => error!("Accept loop panicked: {}", e),
    }

    context.shutdown().await;
    info!("Server stopped");
    Ok(())
}
