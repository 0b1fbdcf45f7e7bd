//! The discovery registry: a name → [`EndpointRef`] map served over TCP.
//!
//! [`RegistryHost`] owns the map and answers requests; [`RegistryClient`] is
//! the stub servers bind through and clients look names up through.

mod client;
mod host;

pub use client::RegistryClient;
pub use host::RegistryHost;

use crate::{error::RegistryError, net::EndpointRef};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum RegistryRequest {
    Ping,
    Bind { name: String, endpoint: EndpointRef },
    Rebind { name: String, endpoint: EndpointRef },
    Lookup { name: String },
    Unbind { name: String },
    List,
}

#[derive(Serialize, Deserialize, Debug)]
pub(crate) enum RegistryResponse {
    Pong,
    Done(Result<(), RegistryError>),
    Found(Result<EndpointRef, RegistryError>),
    Names(Vec<String>),
}
