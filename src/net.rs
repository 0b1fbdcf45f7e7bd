//! Framing shared by the registry and endpoint protocols.
//!
//! Every exchange is one connection carrying one bincode-framed request and
//! one framed response.

use crate::error::TransportError;
use async_bincode::{tokio::AsyncBincodeStream, AsyncDestination};
use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{fmt, net::SocketAddr, time::Duration};
use tokio::{
    io::BufStream,
    net::{TcpStream, ToSocketAddrs},
};

/// Pause after a failed `accept` so a lasting error (e.g. out of file
/// descriptors) does not spin the loop.
pub(crate) const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub(crate) type Framed<In, Out> =
    AsyncBincodeStream<BufStream<TcpStream>, In, Out, AsyncDestination>;

pub(crate) fn frame<In, Out>(sock: TcpStream) -> Framed<In, Out> {
    AsyncBincodeStream::from(BufStream::new(sock)).for_async()
}

/// Connect, send `req`, wait for exactly one response.
pub(crate) async fn exchange<A, Req, Resp>(addr: A, req: Req) -> Result<Resp, TransportError>
where
    A: ToSocketAddrs,
    Req: Serialize + Unpin,
    Resp: DeserializeOwned + Unpin,
{
    let sock = TcpStream::connect(addr).await?;
    let mut sock = frame::<Resp, Req>(sock);
    sock.send(req).await.map_err(TransportError::codec)?;
    sock.next()
        .await
        .ok_or(TransportError::Closed)?
        .map_err(TransportError::codec)
}

/// Where an exported object can be called. This is what the registry stores.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EndpointRef {
    addr: SocketAddr,
    object_id: u64,
}

impl EndpointRef {
    pub(crate) fn new(addr: SocketAddr, object_id: u64) -> Self {
        Self { addr, object_id }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn object_id(&self) -> u64 {
        self.object_id
    }
}

impl fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}#{:016x}", self.addr, self.object_id)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum CallRequest {
    Ping { object_id: u64, client_name: String },
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum CallResponse {
    Pong(String),
    NoSuchObject(u64),
    Failed(String),
}
