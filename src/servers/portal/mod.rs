//! Account portal
//!
//! HTTP front for players: log in with game credentials, see characters,
//! change the account password.
//!
//! Layout:
//! - `account.rs`: the operations (login, character list, password change)
//! - `db.rs`: statements against `tbl_user` / `tbl_character`
//! - `routes.rs`: axum router, cookie handling

pub mod account;
pub mod db;
pub mod routes;

use anyhow::{Context, Result};
use axum::extract::FromRef;
use tokio::net::TcpListener;

use crate::auth::AuthGuard;
use crate::charset::CharsetBridge;
use crate::config::ServerConfig;
use crate::database::{Datastore, QueryGateway};
use crate::projector::RecordProjector;

/// Shared by every request. Cloning is cheap; the pool is behind an `Arc`.
pub struct PortalState<D: Datastore> {
    pub gateway: QueryGateway<D>,
    pub guard: AuthGuard,
    pub projector: RecordProjector,
    pub secure_cookie: bool,
}

impl<D: Datastore> Clone for PortalState<D> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            guard: self.guard.clone(),
            projector: self.projector,
            secure_cookie: self.secure_cookie,
        }
    }
}

impl<D: Datastore> FromRef<PortalState<D>> for AuthGuard {
    fn from_ref(state: &PortalState<D>) -> Self {
        state.guard.clone()
    }
}

impl<D: Datastore> PortalState<D> {
    pub fn new(gateway: QueryGateway<D>, guard: AuthGuard, secure_cookie: bool) -> Self {
        Self {
            gateway,
            guard,
            projector: RecordProjector::new(),
            secure_cookie,
        }
    }

    /// Wrap `store` with the bridge and guard described by `config`.
    pub fn from_config(store: D, config: &ServerConfig) -> Result<Self> {
        let bridge = CharsetBridge::for_label(&config.sql_charset)
            .with_context(|| format!("Unknown sql_charset: {}", config.sql_charset))?;
        Ok(Self::new(
            QueryGateway::new(store, bridge),
            AuthGuard::from_config(config),
            config.secure_cookie,
        ))
    }

    /// Serve until Ctrl-C, then close the pool.
    pub async fn run(self, bind_addr: &str) -> Result<()> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Cannot bind {}", bind_addr))?;
        tracing::info!("[portal] [ready] addr={}", bind_addr);

        let store = self.gateway.store().clone();
        axum::serve(listener, routes::router(self))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Datastore::close(&store).await;
        tracing::info!("[portal] [stopped]");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[portal] [signal_failed] {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[portal] [shutdown] Ctrl-C received");
}
