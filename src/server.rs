use crate::{
    config::{RegistryAddress, RegistryMode, ServerConfig},
    contract::PingService,
    error::StartupError,
    export::Exported,
    net::EndpointRef,
    registry::{RegistryClient, RegistryHost},
};
use std::{fmt::Display, future::Future, sync::Arc};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Only seen in the transition log: [`ServerEndpoint::start`] returns an
    /// endpoint that is already `Bound`.
    Created,
    /// Exported and registered; calls are already being accepted.
    Bound,
    Serving,
    Stopped,
}

/// A [`PingService`] published in a registry under a name.
///
/// Built by [`start`](Self::start), released by [`stop`](Self::stop).
pub struct ServerEndpoint {
    state: ServerState,
    binding_name: String,
    registry: RegistryClient,
    registry_host: Option<RegistryHost>,
    exported: Exported,
}

impl ServerEndpoint {
    /// Create (or locate) the registry, export `service` and bind it under
    /// the configured name.
    pub async fn start<S>(config: &ServerConfig, service: S) -> Result<Self, StartupError>
    where
        S: PingService + Send + Sync + 'static,
        S::Error: Display,
    {
        let mut state = ServerState::Created;

        let (registry, registry_host) = match config.registry_mode {
            RegistryMode::Create => {
                let host = RegistryHost::create(&config.registry).await.map_err(|source| {
                    StartupError::CreateRegistry {
                        addr: config.registry.to_string(),
                        source,
                    }
                })?;
                (host.client(), Some(host))
            }
            RegistryMode::Locate => {
                let client = RegistryClient::locate(&config.registry)
                    .await
                    .map_err(StartupError::LocateRegistry)?;
                (client, None)
            }
        };

        let mut exported = Exported::export(Arc::new(service), &config.export_host)
            .await
            .map_err(StartupError::Export)?;

        if let Err(e) = registry
            .bind(&config.binding_name, *exported.endpoint())
            .await
        {
            _ = exported.unexport().await;
            return Err(StartupError::Bind(e));
        }

        state = transition(state, ServerState::Bound);
        info!(
            "Endpoint bound as `{}` in registry {}",
            config.binding_name,
            registry.address()
        );

        Ok(Self {
            state,
            binding_name: config.binding_name.clone(),
            registry,
            registry_host,
            exported,
        })
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn binding_name(&self) -> &str {
        &self.binding_name
    }

    pub fn endpoint(&self) -> &EndpointRef {
        self.exported.endpoint()
    }

    /// Address of the registry this endpoint is bound in, with the actual
    /// port when the registry was created on port 0.
    pub fn registry_address(&self) -> &RegistryAddress {
        self.registry.address()
    }

    /// Serve calls until `stop_signal` completes.
    pub async fn serve<F: Future>(&mut self, stop_signal: F) -> F::Output {
        self.state = transition(self.state, ServerState::Serving);
        stop_signal.await
    }

    /// Unexport and unbind. Failures are logged, never returned.
    ///
    /// Hands back the registry this endpoint created, if any, so the caller
    /// decides how long it outlives the endpoint.
    pub async fn stop(mut self) -> Option<RegistryHost> {
        if let Err(e) = self.exported.unexport().await {
            warn!("Error while unexporting object: {e}");
        }
        if let Err(e) = self.registry.unbind(&self.binding_name).await {
            warn!("Error while unbinding object: {e}");
        }
        self.state = transition(self.state, ServerState::Stopped);
        self.registry_host.take()
    }
}

fn transition(from: ServerState, to: ServerState) -> ServerState {
    info!("Server endpoint {from:?} -> {to:?}");
    to
}
