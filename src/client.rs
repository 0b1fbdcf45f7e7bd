use crate::{
    config::RegistryAddress,
    contract::PingService,
    error::{CommunicationError, ResolutionError},
    net::{self, CallRequest, CallResponse, EndpointRef},
    registry::RegistryClient,
    BoxFuture,
};
use std::time::Duration;
use tracing::debug;

/// A handle on a remote [`PingService`], resolved through a registry.
///
/// The handle stays usable only as long as the server keeps its endpoint
/// exported. Calls made afterwards fail; resolve again with
/// [`connect`](Self::connect) to pick up a new endpoint.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: EndpointRef,
    call_timeout: Option<Duration>,
}

impl Client {
    pub async fn connect(
        registry: &RegistryAddress,
        binding_name: &str,
    ) -> Result<Self, ResolutionError> {
        let registry = RegistryClient::locate(registry)
            .await
            .map_err(ResolutionError::LocateRegistry)?;
        let endpoint =
            registry
                .lookup(binding_name)
                .await
                .map_err(|source| ResolutionError::Lookup {
                    name: binding_name.to_owned(),
                    source,
                })?;
        debug!("Resolved `{binding_name}` to {endpoint}");

        Ok(Self {
            endpoint,
            call_timeout: None,
        })
    }

    /// Bound every call by `timeout`. The default, `None`, waits forever.
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &EndpointRef {
        &self.endpoint
    }

    pub async fn call_ping(&self, name: &str) -> Result<String, CommunicationError> {
        let req = CallRequest::Ping {
            object_id: self.endpoint.object_id(),
            client_name: name.to_owned(),
        };
        let call = net::exchange(self.endpoint.addr(), req);
        let resp = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| CommunicationError::Timeout(limit))??,
            None => call.await?,
        };

        match resp {
            CallResponse::Pong(reply) => Ok(reply),
            CallResponse::NoSuchObject(object_id) => {
                Err(CommunicationError::NoSuchObject(object_id))
            }
            CallResponse::Failed(msg) => Err(CommunicationError::Remote(msg)),
        }
    }
}

impl PingService for Client {
    type Error = CommunicationError;

    fn ping(&self, client_name: String) -> BoxFuture<'_, Result<String, CommunicationError>> {
        Box::pin(async move { self.call_ping(&client_name).await })
    }
}
