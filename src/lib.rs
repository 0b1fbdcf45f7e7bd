//! A single remote operation, `ping`, published under a name in a discovery
//! registry and called from another process.
//!
//! The server side is [`ServerEndpoint`]: it exports a [`PingService`] on its
//! own TCP port and binds a reference to that port in a [`RegistryHost`].
//! The client side is [`Client`]: it resolves the name through a
//! [`RegistryClient`] and then calls the endpoint directly.

pub mod client;
pub mod config;
pub mod console;
pub mod contract;
pub mod error;
mod export;
pub mod logging;
mod net;
pub mod registry;
pub mod server;

pub use client::Client;
pub use config::{ClientConfig, RegistryAddress, RegistryMode, ServerConfig};
pub use contract::{PingService, Ponger};
pub use error::{
    CommunicationError, ConfigError, RegistryCallError, RegistryError, ResolutionError,
    StartupError, TransportError, UnexportError,
};
pub use futures::future::BoxFuture;
pub use net::EndpointRef;
pub use registry::{RegistryClient, RegistryHost};
pub use server::{ServerEndpoint, ServerState};
