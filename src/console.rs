//! Line-oriented consoles for both binaries.
//!
//! Input and output are injected so the loops can be driven from memory.

use crate::contract::PingService;
use std::{fmt::Display, io};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Ping,
    Stop,
    Unknown,
}

impl Command {
    /// Commands are recognised by prefix, so `!pingpong` is still a ping.
    pub fn parse(line: &str) -> Self {
        if line.starts_with("!stop") {
            Command::Stop
        } else if line.starts_with("!ping") {
            Command::Ping
        } else {
            Command::Unknown
        }
    }
}

/// Read commands until `!stop` or end of input, calling `service` for each
/// `!ping`. A failed call is reported and the loop goes on.
pub async fn run_client<S, R, W>(service: &S, name: &str, input: R, mut output: W) -> io::Result<()>
where
    S: PingService,
    S::Error: Display,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    write_line(&mut output, &format!("Client: {name} is up! Enter command.")).await?;

    while let Some(line) = lines.next_line().await? {
        let reply = match Command::parse(&line) {
            Command::Stop => break,
            Command::Ping => match service.ping(name.to_owned()).await {
                Ok(response) => format!("Received response from Server: {response}"),
                Err(e) => format!("An error occurred while communicating with the server: {e}"),
            },
            Command::Unknown => "Command not known!".to_owned(),
        };
        write_line(&mut output, &reply).await?;
    }

    debug!("Client console closed");
    Ok(())
}

/// Resolves once a line (any line) or end of input arrives.
pub async fn wait_for_stop<R: AsyncBufRead + Unpin>(input: R) {
    if let Err(e) = input.lines().next_line().await {
        debug!("Console read failed, stopping anyway: {e}");
    }
}

async fn write_line<W: AsyncWrite + Unpin>(output: &mut W, line: &str) -> io::Result<()> {
    output.write_all(line.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await
}
