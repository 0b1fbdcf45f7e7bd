use crate::BoxFuture;
use futures::FutureExt;
use std::convert::Infallible;
use tracing::info;

/// The whole remote surface: one call taking the caller's name and answering
/// with a string.
///
/// The serving side implements this to do the work; [`Client`](crate::Client)
/// implements it to forward the call over the network. `Error` is whatever
/// can go wrong on the way, which for a local implementation is usually
/// nothing at all.
pub trait PingService {
    type Error;

    fn ping(&self, client_name: String) -> BoxFuture<'_, Result<String, Self::Error>>;
}

/// The reply every `ping` produces.
pub fn pong(client_name: &str) -> String {
    format!("!pong {client_name}")
}

/// The stock server-side implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ponger;

impl PingService for Ponger {
    type Error = Infallible;

    fn ping(&self, client_name: String) -> BoxFuture<'_, Result<String, Infallible>> {
        info!("Received request from Client: {client_name}");
        futures::future::ready(Ok(pong(&client_name))).boxed()
    }
}
