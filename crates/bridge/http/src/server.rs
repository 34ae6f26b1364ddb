//! Loopback listener serving the bridge router

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use nfc_bridge_core::Bridge;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::ServerError;
use crate::routes::router;

/// Port the bridge API listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 3333;

/// Builder for [`BridgeServer`]
#[derive(Debug, Clone)]
pub struct BridgeServerBuilder {
    host: Ipv4Addr,
    port: u16,
}

impl Default for BridgeServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeServerBuilder {
    /// Listen on `127.0.0.1:3333`
    pub const fn new() -> Self {
        Self {
            host: Ipv4Addr::LOCALHOST,
            port: DEFAULT_PORT,
        }
    }

    /// Set the listening port; `0` picks a free one
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the listening address
    pub const fn host(mut self, host: Ipv4Addr) -> Self {
        self.host = host;
        self
    }

    /// Finish the builder
    ///
    /// Fails with [`ServerError::NotLoopback`] for any host other than a
    /// loopback address.
    pub fn build(self, bridge: Arc<Bridge>) -> Result<BridgeServer, ServerError> {
        let addr = SocketAddr::from((self.host, self.port));
        if !self.host.is_loopback() {
            return Err(ServerError::NotLoopback(addr));
        }
        Ok(BridgeServer { addr, bridge })
    }
}

/// HTTP server exposing a [`Bridge`]
#[derive(Debug)]
pub struct BridgeServer {
    addr: SocketAddr,
    bridge: Arc<Bridge>,
}

impl BridgeServer {
    /// Address the server will bind
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind the listening socket
    pub async fn bind(self) -> Result<BoundServer, ServerError> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        Ok(BoundServer {
            router: router(self.bridge, local_addr.port()),
            listener,
            local_addr,
        })
    }

    /// Bind and serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.bind().await?.serve(shutdown).await
    }
}

/// Server whose socket is bound but not yet accepting
#[derive(Debug)]
pub struct BoundServer {
    router: Router,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl BoundServer {
    /// Address actually bound
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = %self.local_addr, "bridge api listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("bridge api stopped");
        Ok(())
    }
}
