use crate::{
    contract::PingService,
    error::UnexportError,
    net::{self, CallRequest, CallResponse, EndpointRef},
    BoxFuture,
};
use futures::{SinkExt, StreamExt};
use std::{fmt::Display, io, sync::Arc};
use tokio::{net::TcpListener, net::TcpStream, task, task::JoinHandle};
use tracing::{debug, error, info, warn};

/// A type-erased [`PingService`], so the accept loop need not be generic.
pub(crate) trait DynamicPingService: Send + Sync {
    fn ping(&self, client_name: String) -> BoxFuture<'_, Result<String, String>>;
}

impl<S> DynamicPingService for S
where
    S: PingService + Send + Sync,
    S::Error: Display,
{
    fn ping(&self, client_name: String) -> BoxFuture<'_, Result<String, String>> {
        let call = PingService::ping(self, client_name);
        Box::pin(async move { call.await.map_err(|e| e.to_string()) })
    }
}

/// A service listening on its own port under a random object id.
pub(crate) struct Exported {
    endpoint: EndpointRef,
    accept_loop: Option<JoinHandle<()>>,
}

impl Exported {
    pub(crate) async fn export(
        service: Arc<dyn DynamicPingService>,
        host: &str,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind((host, 0)).await?;
        let endpoint = EndpointRef::new(listener.local_addr()?, rand::random());
        let accept_loop = task::spawn(accept_loop(listener, service, endpoint.object_id()));
        info!("Exported endpoint {endpoint}");

        Ok(Self {
            endpoint,
            accept_loop: Some(accept_loop),
        })
    }

    pub(crate) fn endpoint(&self) -> &EndpointRef {
        &self.endpoint
    }

    /// Stop accepting calls. Calls already accepted run to completion.
    pub(crate) async fn unexport(&mut self) -> Result<(), UnexportError> {
        let accept_loop = self.accept_loop.take().ok_or(UnexportError::NotExported)?;
        accept_loop.abort();
        // Wait for the listener to actually close.
        _ = accept_loop.await;
        info!("Unexported endpoint {}", self.endpoint);
        Ok(())
    }
}

impl Drop for Exported {
    fn drop(&mut self) {
        if let Some(accept_loop) = self.accept_loop.take() {
            accept_loop.abort();
        }
    }
}

async fn accept_loop(listener: TcpListener, service: Arc<dyn DynamicPingService>, object_id: u64) {
    loop {
        let (sock, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Endpoint accept error: {e}");
                tokio::time::sleep(net::ACCEPT_BACKOFF).await;
                continue;
            }
        };
        debug!("Call connection from {peer}");
        let service = service.clone();
        task::spawn(async move {
            if let Err(e) = handle_call(sock, &*service, object_id).await {
                warn!("Call from {peer} failed: {e}");
            }
        });
    }
}

async fn handle_call(
    sock: TcpStream,
    service: &dyn DynamicPingService,
    object_id: u64,
) -> Result<(), String> {
    let mut sock = net::frame::<CallRequest, CallResponse>(sock);
    let request = match sock.next().await {
        Some(request) => request.map_err(|e| e.to_string())?,
        None => return Ok(()),
    };

    let response = match request {
        CallRequest::Ping {
            object_id: requested,
            ..
        } if requested != object_id => CallResponse::NoSuchObject(requested),
        CallRequest::Ping { client_name, .. } => match service.ping(client_name).await {
            Ok(reply) => CallResponse::Pong(reply),
            Err(e) => CallResponse::Failed(e),
        },
    };
    sock.send(response).await.map_err(|e| e.to_string())
}
