use super::{RegistryClient, RegistryRequest, RegistryResponse};
use crate::{config::RegistryAddress, error::RegistryError, net, net::EndpointRef};
use futures::{SinkExt, StreamExt};
use std::{
    collections::{hash_map::Entry, HashMap},
    io,
    net::SocketAddr,
    sync::Arc,
};
use tokio::{net::TcpListener, sync::RwLock, task, task::JoinHandle};
use tracing::{debug, error, info, warn};

type Bindings = Arc<RwLock<HashMap<String, EndpointRef>>>;

/// A running registry. It serves until dropped; dropping it discards every
/// binding it holds.
pub struct RegistryHost {
    address: RegistryAddress,
    local_addr: SocketAddr,
    bindings: Bindings,
    task: JoinHandle<()>,
}

impl RegistryHost {
    /// Start a registry listening on `address`. Fails if the address is
    /// already in use. Port 0 picks a free port; see [`address`](Self::address).
    pub async fn create(address: &RegistryAddress) -> io::Result<Self> {
        let listener = TcpListener::bind(address.to_socket_addrs()).await?;
        let local_addr = listener.local_addr()?;
        let bindings = Bindings::default();
        let task = task::spawn(serve(listener, bindings.clone()));
        info!("Registry listening on {local_addr}");

        Ok(Self {
            address: RegistryAddress::new(address.host.clone(), local_addr.port()),
            local_addr,
            bindings,
            task,
        })
    }

    /// The address clients should use, with the actual port filled in.
    pub fn address(&self) -> &RegistryAddress {
        &self.address
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// A stub talking to this registry over the network.
    pub fn client(&self) -> RegistryClient {
        RegistryClient::new(self.address.clone())
    }

    /// Currently bound names, sorted.
    pub async fn names(&self) -> Vec<String> {
        sorted_names(&*self.bindings.read().await)
    }
}

impl Drop for RegistryHost {
    fn drop(&mut self) {
        debug!("Registry on {} shutting down", self.local_addr);
        self.task.abort();
    }
}

async fn serve(listener: TcpListener, bindings: Bindings) {
    loop {
        let (sock, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Registry accept error: {e}");
                tokio::time::sleep(net::ACCEPT_BACKOFF).await;
                continue;
            }
        };
        let bindings = bindings.clone();

        task::spawn(async move {
            let mut sock = net::frame::<RegistryRequest, RegistryResponse>(sock);
            match sock.next().await {
                Some(Ok(request)) => {
                    debug!("Registry request from {peer}: {request:?}");
                    let response = handle_request(&bindings, request).await;
                    if let Err(e) = sock.send(response).await {
                        warn!("Registry response to {peer} not delivered: {e}");
                    }
                }
                Some(Err(e)) => warn!("Malformed registry request from {peer}: {e}"),
                None => debug!("{peer} closed without sending a request"),
            }
        });
    }
}

async fn handle_request(bindings: &Bindings, request: RegistryRequest) -> RegistryResponse {
    use RegistryResponse::*;
    match request {
        RegistryRequest::Ping => Pong,
        RegistryRequest::Bind { name, endpoint } => match bindings.write().await.entry(name) {
            Entry::Occupied(entry) => Done(Err(RegistryError::AlreadyBound(entry.key().clone()))),
            Entry::Vacant(entry) => {
                info!("Bound `{}` to {endpoint}", entry.key());
                entry.insert(endpoint);
                Done(Ok(()))
            }
        },
        RegistryRequest::Rebind { name, endpoint } => {
            info!("Rebound `{name}` to {endpoint}");
            bindings.write().await.insert(name, endpoint);
            Done(Ok(()))
        }
        RegistryRequest::Lookup { name } => {
            let found = bindings.read().await.get(&name).copied();
            Found(found.ok_or(RegistryError::NotBound(name)))
        }
        RegistryRequest::Unbind { name } => match bindings.write().await.remove(&name) {
            Some(endpoint) => {
                info!("Unbound `{name}` from {endpoint}");
                Done(Ok(()))
            }
            None => Done(Err(RegistryError::NotBound(name))),
        },
        RegistryRequest::List => Names(sorted_names(&*bindings.read().await)),
    }
}

fn sorted_names(bindings: &HashMap<String, EndpointRef>) -> Vec<String> {
    let mut names: Vec<String> = bindings.keys().cloned().collect();
    names.sort();
    names
}
