use futures::future::join_all;
use pingrpc::{
    console, contract::pong, BoxFuture, Client, CommunicationError, PingService, Ponger,
    RegistryAddress, RegistryHost, RegistryMode, ResolutionError, ServerConfig, ServerEndpoint,
    ServerState, StartupError,
};
use std::{convert::Infallible, time::Duration};
use tokio::sync::Barrier;

fn local_config(binding_name: &str) -> ServerConfig {
    ServerConfig {
        registry: RegistryAddress::new("127.0.0.1", 0),
        binding_name: binding_name.to_owned(),
        export_host: "127.0.0.1".to_owned(),
        registry_mode: RegistryMode::Create,
    }
}

#[tokio::test]
async fn ping_then_stop() {
    let mut server = ServerEndpoint::start(&local_config("server"), Ponger)
        .await
        .unwrap();
    assert_eq!(server.state(), ServerState::Bound);
    let registry = server.registry_address().clone();

    assert_eq!(server.binding_name(), "server");
    let client = Client::connect(&registry, "server").await.unwrap();
    assert_eq!(client.endpoint(), server.endpoint());
    let reply = server
        .serve(async { client.call_ping("alice").await.unwrap() })
        .await;
    assert_eq!(reply, "!pong alice");
    assert_eq!(server.state(), ServerState::Serving);

    let host = server.stop().await.expect("server created the registry");

    let err = tokio::time::timeout(Duration::from_secs(10), client.call_ping("alice"))
        .await
        .expect("call after stop hung")
        .unwrap_err();
    assert!(matches!(err, CommunicationError::Transport(_)), "{err}");

    let err = host.client().lookup("server").await.unwrap_err();
    assert!(err.is_not_bound(), "{err}");

    let err = Client::connect(&registry, "server").await.unwrap_err();
    assert!(err.is_not_bound(), "{err}");
}

#[tokio::test]
async fn second_bind_under_same_name_fails() {
    let first = ServerEndpoint::start(&local_config("server"), Ponger)
        .await
        .unwrap();

    let second_config = ServerConfig {
        registry: first.registry_address().clone(),
        registry_mode: RegistryMode::Locate,
        ..local_config("server")
    };
    match ServerEndpoint::start(&second_config, Ponger).await {
        Err(StartupError::Bind(e)) => assert!(e.is_already_bound(), "{e}"),
        Err(e) => panic!("unexpected startup error: {e}"),
        Ok(_) => panic!("second bind succeeded"),
    }

    // The first binding is untouched.
    let client = Client::connect(first.registry_address(), "server")
        .await
        .unwrap();
    assert_eq!(client.call_ping("carol").await.unwrap(), "!pong carol");

    // Once released, the name can be bound again.
    let host = first.stop().await.unwrap();
    let third = ServerEndpoint::start(&second_config, Ponger).await.unwrap();
    assert_eq!(host.names().await, vec!["server".to_owned()]);
    third.stop().await;
    assert!(host.names().await.is_empty());
}

#[tokio::test]
async fn registry_operations() {
    let host = RegistryHost::create(&RegistryAddress::new("127.0.0.1", 0))
        .await
        .unwrap();
    assert_eq!(host.local_addr().port(), host.address().port);
    assert_ne!(host.address().port, 0);
    let registry = pingrpc::RegistryClient::locate(host.address())
        .await
        .unwrap();

    let err = registry.lookup("nobody").await.unwrap_err();
    assert!(err.is_not_bound());
    let err = registry.unbind("nobody").await.unwrap_err();
    assert!(err.is_not_bound());

    let server = ServerEndpoint::start(
        &ServerConfig {
            registry: host.address().clone(),
            registry_mode: RegistryMode::Locate,
            ..local_config("a")
        },
        Ponger,
    )
    .await
    .unwrap();
    let endpoint = *server.endpoint();

    assert_eq!(registry.lookup("a").await.unwrap(), endpoint);
    assert!(registry.bind("a", endpoint).await.unwrap_err().is_already_bound());

    registry.rebind("b", endpoint).await.unwrap();
    registry.rebind("b", endpoint).await.unwrap();
    assert_eq!(registry.list().await.unwrap(), vec!["a", "b"]);

    // A handle resolved through the alias reaches the same object.
    let client = Client::connect(host.address(), "b").await.unwrap();
    assert_eq!(client.call_ping("dave").await.unwrap(), "!pong dave");

    assert!(server.stop().await.is_none());
    assert_eq!(registry.list().await.unwrap(), vec!["b"]);
    registry.unbind("b").await.unwrap();
    assert!(registry.unbind("b").await.unwrap_err().is_not_bound());
}

#[tokio::test]
async fn occupied_registry_port_is_a_startup_error() {
    let host = RegistryHost::create(&RegistryAddress::new("127.0.0.1", 0))
        .await
        .unwrap();
    let config = ServerConfig {
        registry: host.address().clone(),
        ..local_config("server")
    };
    match ServerEndpoint::start(&config, Ponger).await {
        Err(StartupError::CreateRegistry { .. }) => {}
        Err(e) => panic!("unexpected startup error: {e}"),
        Ok(_) => panic!("created a registry on an occupied port"),
    }
}

#[tokio::test]
async fn unreachable_registry() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let address = RegistryAddress::new("127.0.0.1", port);

    let err = Client::connect(&address, "server").await.unwrap_err();
    assert!(matches!(err, ResolutionError::LocateRegistry(_)), "{err}");

    let config = ServerConfig {
        registry: address,
        registry_mode: RegistryMode::Locate,
        ..local_config("server")
    };
    let err = ServerEndpoint::start(&config, Ponger).await.err().unwrap();
    assert!(matches!(err, StartupError::LocateRegistry(_)), "{err}");
}

#[tokio::test]
async fn concurrent_clients_get_their_own_replies() {
    let server = ServerEndpoint::start(&local_config("server"), Ponger)
        .await
        .unwrap();
    let registry = server.registry_address().clone();

    let names: Vec<String> = (0..16)
        .map(|i| format!("client-{i}-{:08x}", rand::random::<u32>()))
        .collect();
    let calls = names.iter().map(|name| {
        let registry = registry.clone();
        async move {
            let client = Client::connect(&registry, "server").await.unwrap();
            client.call_ping(name).await.unwrap()
        }
    });
    let replies = join_all(calls).await;

    for (name, reply) in names.iter().zip(replies) {
        assert_eq!(reply, format!("!pong {name}"));
    }
    server.stop().await;
}

/// Replies only once `n` calls are in flight at the same time.
struct Gathering {
    barrier: Barrier,
}

impl PingService for Gathering {
    type Error = Infallible;

    fn ping(&self, client_name: String) -> BoxFuture<'_, Result<String, Infallible>> {
        Box::pin(async move {
            self.barrier.wait().await;
            Ok(pong(&client_name))
        })
    }
}

#[tokio::test]
async fn calls_do_not_block_each_other() {
    const N: usize = 8;
    let service = Gathering {
        barrier: Barrier::new(N),
    };
    let server = ServerEndpoint::start(&local_config("server"), service)
        .await
        .unwrap();
    let client = Client::connect(server.registry_address(), "server")
        .await
        .unwrap();

    let names: Vec<String> = (0..N).map(|i| format!("c{i}")).collect();
    let calls = join_all(names.iter().map(|name| client.call_ping(name)));
    let replies = tokio::time::timeout(Duration::from_secs(10), calls)
        .await
        .expect("calls were serialized");

    for (name, reply) in names.iter().zip(replies) {
        assert_eq!(reply.unwrap(), format!("!pong {name}"));
    }
    server.stop().await;
}

struct Refusing;

impl PingService for Refusing {
    type Error = String;

    fn ping(&self, client_name: String) -> BoxFuture<'_, Result<String, String>> {
        Box::pin(async move { Err(format!("not talking to {client_name}")) })
    }
}

#[tokio::test]
async fn failing_call_only_fails_that_caller() {
    let server = ServerEndpoint::start(&local_config("server"), Refusing)
        .await
        .unwrap();
    let client = Client::connect(server.registry_address(), "server")
        .await
        .unwrap();

    for _ in 0..2 {
        match client.call_ping("eve").await {
            Err(CommunicationError::Remote(msg)) => assert_eq!(msg, "not talking to eve"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
    server.stop().await;
}

/// Panics on the name `"boom"`, answers normally otherwise.
struct Touchy;

impl PingService for Touchy {
    type Error = Infallible;

    fn ping(&self, client_name: String) -> BoxFuture<'_, Result<String, Infallible>> {
        Box::pin(async move {
            if client_name == "boom" {
                panic!("cannot handle {client_name}");
            }
            Ok(pong(&client_name))
        })
    }
}

#[tokio::test]
async fn a_panicking_call_only_fails_that_caller() {
    let server = ServerEndpoint::start(&local_config("server"), Touchy)
        .await
        .unwrap();
    let client = Client::connect(server.registry_address(), "server")
        .await
        .unwrap();

    let err = client.call_ping("boom").await.unwrap_err();
    assert!(matches!(err, CommunicationError::Transport(_)), "{err}");
    assert_eq!(client.call_ping("ok").await.unwrap(), "!pong ok");
    server.stop().await;
}

#[tokio::test]
async fn stop_completes_when_name_already_unbound() {
    let server = ServerEndpoint::start(&local_config("server"), Ponger)
        .await
        .unwrap();
    let registry = pingrpc::RegistryClient::locate(server.registry_address())
        .await
        .unwrap();
    registry.unbind("server").await.unwrap();

    let host = server.stop().await.expect("server created the registry");
    assert!(host.names().await.is_empty());
    assert!(registry.list().await.unwrap().is_empty());
}

struct Silent;

impl PingService for Silent {
    type Error = Infallible;

    fn ping(&self, _client_name: String) -> BoxFuture<'_, Result<String, Infallible>> {
        Box::pin(futures::future::pending())
    }
}

#[tokio::test]
async fn optional_call_timeout() {
    let server = ServerEndpoint::start(&local_config("server"), Silent)
        .await
        .unwrap();
    let limit = Duration::from_millis(100);
    let client = Client::connect(server.registry_address(), "server")
        .await
        .unwrap()
        .with_call_timeout(Some(limit));

    match client.call_ping("frank").await {
        Err(CommunicationError::Timeout(t)) => assert_eq!(t, limit),
        other => panic!("unexpected result: {other:?}"),
    }
    server.stop().await;
}

#[tokio::test]
async fn console_against_live_server() {
    let server = ServerEndpoint::start(&local_config("server"), Ponger)
        .await
        .unwrap();
    let client = Client::connect(server.registry_address(), "server")
        .await
        .unwrap();

    let mut output = Vec::new();
    console::run_client(&client, "grace", &b"!ping\n?\n!stop\n"[..], &mut output)
        .await
        .unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "Client: grace is up! Enter command.\n\
         Received response from Server: !pong grace\n\
         Command not known!\n"
    );

    server.stop().await;
    let mut output = Vec::new();
    console::run_client(&client, "grace", &b"!ping\n"[..], &mut output)
        .await
        .unwrap();
    let output = String::from_utf8(output).unwrap();
    assert!(
        output.contains("An error occurred while communicating with the server: "),
        "{output}"
    );
}
