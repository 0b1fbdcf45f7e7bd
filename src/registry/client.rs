use super::{RegistryRequest, RegistryResponse};
use crate::{
    config::RegistryAddress,
    error::{RegistryCallError, TransportError},
    net::{self, EndpointRef},
};

/// Stub for a registry reachable at a known address. Holds no connection;
/// each operation is its own exchange.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    address: RegistryAddress,
}

impl RegistryClient {
    /// Obtain a stub for the registry at `address`, failing if nothing
    /// answers there.
    pub async fn locate(address: &RegistryAddress) -> Result<Self, TransportError> {
        let client = Self::new(address.clone());
        client.ping().await?;
        Ok(client)
    }

    pub(crate) fn new(address: RegistryAddress) -> Self {
        Self { address }
    }

    pub fn address(&self) -> &RegistryAddress {
        &self.address
    }

    async fn send_recv(&self, req: RegistryRequest) -> Result<RegistryResponse, TransportError> {
        net::exchange(self.address.to_socket_addrs(), req).await
    }

    pub async fn ping(&self) -> Result<(), TransportError> {
        match self.send_recv(RegistryRequest::Ping).await? {
            RegistryResponse::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Fails with [`RegistryError::AlreadyBound`](crate::RegistryError) if
    /// `name` already has a binding.
    pub async fn bind(&self, name: &str, endpoint: EndpointRef) -> Result<(), RegistryCallError> {
        let req = RegistryRequest::Bind {
            name: name.to_owned(),
            endpoint,
        };
        self.done(req).await
    }

    /// Bind `name`, replacing any existing binding.
    pub async fn rebind(&self, name: &str, endpoint: EndpointRef) -> Result<(), RegistryCallError> {
        let req = RegistryRequest::Rebind {
            name: name.to_owned(),
            endpoint,
        };
        self.done(req).await
    }

    pub async fn lookup(&self, name: &str) -> Result<EndpointRef, RegistryCallError> {
        let req = RegistryRequest::Lookup {
            name: name.to_owned(),
        };
        match self.send_recv(req).await? {
            RegistryResponse::Found(found) => Ok(found?),
            other => Err(unexpected(other).into()),
        }
    }

    pub async fn unbind(&self, name: &str) -> Result<(), RegistryCallError> {
        let req = RegistryRequest::Unbind {
            name: name.to_owned(),
        };
        self.done(req).await
    }

    pub async fn list(&self) -> Result<Vec<String>, RegistryCallError> {
        match self.send_recv(RegistryRequest::List).await? {
            RegistryResponse::Names(names) => Ok(names),
            other => Err(unexpected(other).into()),
        }
    }

    async fn done(&self, req: RegistryRequest) -> Result<(), RegistryCallError> {
        match self.send_recv(req).await? {
            RegistryResponse::Done(result) => Ok(result?),
            other => Err(unexpected(other).into()),
        }
    }
}

fn unexpected(resp: RegistryResponse) -> TransportError {
    TransportError::UnexpectedResponse(format!("{resp:?}"))
}
