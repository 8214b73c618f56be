//! Surface ↔ host round trips through `HostRuntime`.
//!
//! Each test opens real surfaces (bridge + pump task) and talks to the host
//! loop over the same queues the CLI uses.

use parking_lot::Mutex;
use serde_json::{json, Value};
use shellbus_event::{Channel, ListenerError, Stage};
use shellbus_runtime::bridge::{ClientSubscription, DispatchMode};
use shellbus_runtime::engine::Subscription;
use shellbus_runtime::{BusConfig, BusError, HostRuntime, SurfaceSession};
use shellbus_types::Owner;
use std::sync::Arc;
use std::time::Duration;

type Seen = Arc<Mutex<Vec<Value>>>;

fn channel(name: &str) -> Channel {
    Channel::parse(name).expect("test channel names are valid")
}

fn watch(session: &SurfaceSession, name: &str) -> (ClientSubscription, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sub = session
        .bridge()
        .create_subscription(
            channel(name),
            Arc::clone(&seen),
            |seen: &Mutex<Vec<Value>>, p: &Value| {
                seen.lock().push(p.clone());
                Ok(Value::Null)
            },
            None,
        )
        .expect("surface subscription");
    (sub, seen)
}

async fn wait_for(seen: &Seen, count: usize) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while seen.lock().len() < count {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("expected deliveries did not arrive");
}

fn serve_ping(runtime: &HostRuntime) {
    runtime
        .bus()
        .register(Subscription::new(
            channel("ipc-ping"),
            Owner::service("pinger"),
            |p: &Value| Ok(json!({"pong": p})),
        ))
        .expect("register ping service");
}

#[tokio::test]
async fn echo_reaches_host_and_every_surface() {
    let runtime = HostRuntime::start(BusConfig::default());
    let host_seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&host_seen);
    runtime
        .bus()
        .register(Subscription::new(
            channel("ipc-note"),
            Owner::service("host"),
            move |p: &Value| {
                sink.lock().push(p.clone());
                Ok(Value::Null)
            },
        ))
        .expect("register host listener");

    let a = runtime.open_surface("a");
    let b = runtime.open_surface("b");
    let (sender, a_seen) = watch(&a, "ipc-note");
    let (_receiver, b_seen) = watch(&b, "ipc-note");

    let receipt = sender
        .dispatch(json!({"text": "hi"}), DispatchMode::Echo)
        .await
        .expect("echo sent");
    assert!(receipt.response.is_none());

    wait_for(&a_seen, 1).await;
    wait_for(&b_seen, 1).await;
    assert_eq!(*host_seen.lock(), vec![json!({"text": "hi"})]);
    assert_eq!(*b_seen.lock(), vec![json!({"text": "hi"})]);

    runtime.shutdown().await;
}

#[tokio::test]
async fn direct_post_reaches_host_listeners() {
    let runtime = HostRuntime::start(BusConfig::default());
    let surface = runtime.open_surface("main");
    let (sub, seen) = watch(&surface, "ipc-direct");

    sub.dispatch(json!(9), DispatchMode::Direct)
        .await
        .expect("post sent");

    // The fan-out after the host dispatch brings it back to the surface.
    wait_for(&seen, 1).await;
    assert_eq!(*seen.lock(), vec![json!(9)]);
    runtime.shutdown().await;
}

#[tokio::test]
async fn blocking_dispatch_returns_host_answer() {
    let runtime = HostRuntime::start(BusConfig::default());
    serve_ping(&runtime);
    let surface = runtime.open_surface("main");
    let (sub, _seen) = watch(&surface, "ipc-ping");

    let receipt = sub
        .dispatch(json!(3), DispatchMode::Blocking)
        .await
        .expect("host answers");

    assert_eq!(receipt.response, Some(json!({"pong": 3})));
    assert_eq!(receipt.local, Some(Ok(Value::Null)));
    assert_eq!(surface.bridge().pending_count(), 0);
    runtime.shutdown().await;
}

#[tokio::test]
async fn blocking_dispatch_without_listener_is_empty_response() {
    let runtime = HostRuntime::start(BusConfig::default());
    let surface = runtime.open_surface("main");

    let err = surface
        .bridge()
        .invoke(&channel("ipc-nobody"), json!(1))
        .await
        .unwrap_err();

    assert!(matches!(err, BusError::EmptyResponse(c) if c == channel("ipc-nobody")));
    runtime.shutdown().await;
}

#[tokio::test]
async fn blocking_dispatch_surfaces_host_failure() {
    let runtime = HostRuntime::start(BusConfig::default());
    runtime
        .bus()
        .register(Subscription::new(
            channel("ipc-fail"),
            Owner::service("flaky"),
            |_: &Value| Err(ListenerError::new("ServiceDown", "try later")),
        ))
        .expect("register failing service");
    let surface = runtime.open_surface("main");

    let err = surface
        .bridge()
        .invoke(&channel("ipc-fail"), Value::Null)
        .await
        .unwrap_err();

    let BusError::Remote(envelope) = err else {
        panic!("expected a remote failure, got {err:?}");
    };
    assert_eq!(envelope.name, "ServiceDown");
    assert_eq!(envelope.stage, Stage::Callback);
    runtime.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_host_listener_times_out_the_caller() {
    let runtime = HostRuntime::start(BusConfig {
        request_timeout_ms: 30,
        ..BusConfig::default()
    });
    runtime
        .bus()
        .register(Subscription::new(
            channel("ipc-slow"),
            Owner::service("slow"),
            |_: &Value| {
                std::thread::sleep(Duration::from_millis(300));
                Ok(json!("too late"))
            },
        ))
        .expect("register slow service");
    let surface = runtime.open_surface("main");

    let err = surface
        .bridge()
        .invoke(&channel("ipc-slow"), Value::Null)
        .await
        .unwrap_err();
    assert!(matches!(err, BusError::Timeout(_)));
    assert_eq!(surface.bridge().pending_count(), 0);

    // The late answer is dropped without disturbing the bridge.
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(surface.bridge().pending_count(), 0);
    runtime.shutdown().await;
}

#[tokio::test]
async fn stopped_host_fails_fast() {
    let runtime = HostRuntime::start(BusConfig::default());
    let surface = runtime.open_surface("main");
    let bridge = surface.bridge().clone();
    runtime.shutdown().await;

    let err = bridge.invoke(&channel("ipc-ping"), json!(1)).await.unwrap_err();
    assert!(matches!(err, BusError::LinkClosed));
    assert_eq!(bridge.pending_count(), 0);
}

#[tokio::test]
async fn async_reply_reaches_surface_reply_listener() {
    let runtime = HostRuntime::start(BusConfig::default());
    runtime
        .bus()
        .register(
            Subscription::new(channel("ipc-greet"), Owner::service("greeter"), |p: &Value| {
                Ok(json!(format!("hello {}", p.as_str().unwrap_or("?"))))
            })
            .asynchronous(),
        )
        .expect("register greeter");

    let surface = runtime.open_surface("main");
    let replies: Seen = Arc::new(Mutex::new(Vec::new()));
    let sub = surface
        .bridge()
        .create_subscription(
            channel("ipc-greet"),
            Arc::clone(&replies),
            |_: &Mutex<Vec<Value>>, _: &Value| Ok(Value::Null),
            Some(Box::new(|seen: &Mutex<Vec<Value>>, p: &Value| {
                seen.lock().push(p.clone());
                Ok(Value::Null)
            })),
        )
        .expect("surface subscription");

    sub.dispatch(json!("Ann"), DispatchMode::Echo)
        .await
        .expect("echo sent");

    wait_for(&replies, 1).await;
    assert_eq!(*replies.lock(), vec![json!("hello Ann")]);
    runtime.shutdown().await;
}

#[tokio::test]
async fn closing_a_surface_stops_its_deliveries() {
    let runtime = HostRuntime::start(BusConfig::default());
    let keep = runtime.open_surface("keep");
    let gone = runtime.open_surface("gone");
    let (_keep_sub, keep_seen) = watch(&keep, "ipc-sync");
    let (_gone_sub, gone_seen) = watch(&gone, "ipc-sync");

    assert!(runtime.close_surface(gone.id()));
    gone.closed().await;
    runtime.bus().dispatch(&channel("ipc-sync"), &json!(1));

    wait_for(&keep_seen, 1).await;
    assert!(gone_seen.lock().is_empty());
    assert_eq!(runtime.surfaces(), vec![keep.id().clone()]);
    runtime.shutdown().await;
}
