//! Error types, grouped by the phase in which they occur.
//!
//! Startup and resolution errors end the process or session that hit them.
//! Communication errors end a single call. Shutdown errors are only logged.

use serde::{Deserialize, Serialize};
use std::{io, path::PathBuf, time::Duration};
use thiserror::Error;

/// Logical failures reported by the registry itself. These cross the wire.
#[derive(Serialize, Deserialize, Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("name `{0}` is already bound")]
    AlreadyBound(String),

    #[error("name `{0}` is not bound")]
    NotBound(String),
}

/// A request/response exchange that could not complete.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o: {0}")]
    Io(#[from] io::Error),

    #[error("codec: {0}")]
    Codec(String),

    #[error("connection closed before a response arrived")]
    Closed,

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl TransportError {
    pub(crate) fn codec(err: impl std::fmt::Display) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Outcome of an operation on a [`RegistryClient`](crate::RegistryClient).
#[derive(Debug, Error)]
pub enum RegistryCallError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("registry unreachable: {0}")]
    Transport(#[from] TransportError),
}

impl RegistryCallError {
    pub fn is_not_bound(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::NotBound(_)))
    }

    pub fn is_already_bound(&self) -> bool {
        matches!(self, Self::Registry(RegistryError::AlreadyBound(_)))
    }
}

/// The server could not reach its serving state.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("creating registry at {addr}: {source}")]
    CreateRegistry {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("locating registry: {0}")]
    LocateRegistry(#[source] TransportError),

    #[error("exporting endpoint: {0}")]
    Export(#[source] io::Error),

    #[error("binding endpoint: {0}")]
    Bind(#[source] RegistryCallError),
}

/// The client could not turn a binding name into a handle.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("locating registry: {0}")]
    LocateRegistry(#[source] TransportError),

    #[error("looking up `{name}`: {source}")]
    Lookup {
        name: String,
        #[source]
        source: RegistryCallError,
    },
}

impl ResolutionError {
    pub fn is_not_bound(&self) -> bool {
        matches!(self, Self::Lookup { source, .. } if source.is_not_bound())
    }
}

/// A single call on a resolved handle failed.
#[derive(Debug, Error)]
pub enum CommunicationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("no such object: {0:#018x}")]
    NoSuchObject(u64),

    #[error("remote call failed: {0}")]
    Remote(String),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnexportError {
    #[error("object is not exported")]
    NotExported,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parsing {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
