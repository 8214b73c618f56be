//! Host runtime wiring.
//!
//! ```text
//!            ┌───────────── inbound (SurfaceId, frame) ◄── ChannelLink (per surface)
//!            ▼
//!     host loop ── HostBus::accept ──► response ──► SurfaceSet::get(origin)
//!                        │
//!                  dispatch + fan-out ──► every ChannelTransport ──► ClientBridge::pump
//! ```

use crate::bridge::{ChannelLink, ClientBridge};
use crate::config::BusConfig;
use crate::engine::HostBus;
use crate::surface::{ChannelTransport, SurfaceDirectory, SurfaceSet};
use shellbus_event::{HostFrame, WindowStateEvent, WindowStateTopic};
use shellbus_types::{ErrorCode, Owner, SurfaceId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Inbound = (SurfaceId, String);

/// A surface opened by [`HostRuntime::open_surface`].
#[derive(Debug)]
pub struct SurfaceSession {
    bridge: ClientBridge,
    pump: JoinHandle<()>,
}

impl SurfaceSession {
    #[must_use]
    pub fn id(&self) -> &SurfaceId {
        self.bridge.surface()
    }

    #[must_use]
    pub fn bridge(&self) -> &ClientBridge {
        &self.bridge
    }

    /// Waits until the host stops delivering to this surface.
    pub async fn closed(self) {
        if let Err(err) = self.pump.await {
            warn!(error = %err, "surface pump failed");
        }
    }
}

/// Owns a [`HostBus`], the open surfaces and the task serving their frames.
///
/// Must be started inside a tokio runtime.
pub struct HostRuntime {
    bus: HostBus,
    surfaces: Arc<SurfaceSet>,
    inbound: mpsc::UnboundedSender<Inbound>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl HostRuntime {
    /// Creates the bus and spawns the host loop.
    #[must_use]
    pub fn start(config: BusConfig) -> Self {
        let surfaces = Arc::new(SurfaceSet::new());
        let directory: Arc<dyn SurfaceDirectory> = Arc::clone(&surfaces) as _;
        let bus = HostBus::with_surfaces(config, directory);
        let (inbound, rx) = mpsc::unbounded_channel();
        let (shutdown, stop) = oneshot::channel();

        let task = tokio::spawn(serve(bus.clone(), Arc::clone(&surfaces), rx, stop));
        info!("host runtime started");

        Self {
            bus,
            surfaces,
            inbound,
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    #[must_use]
    pub fn bus(&self) -> &HostBus {
        &self.bus
    }

    /// Ids of the open surfaces, in opening order.
    #[must_use]
    pub fn surfaces(&self) -> Vec<SurfaceId> {
        self.surfaces.ids()
    }

    /// Opens a surface: registers its transport for fan-out, gives it a
    /// bridge linked to the host loop and announces it on the window-state
    /// channel.
    pub fn open_surface(&self, label: impl Into<String>) -> SurfaceSession {
        let surface = SurfaceId::new(label);
        let (transport, rx) = ChannelTransport::new(surface.clone());
        self.surfaces.insert(Arc::new(transport));

        let link = ChannelLink::new(surface.clone(), self.inbound.clone());
        let bridge = ClientBridge::new(surface.clone(), Arc::new(link), self.bus.config().clone());
        let pump = tokio::spawn(bridge.clone().pump(rx));

        info!(surface = %surface, "surface opened");
        self.announce(WindowStateEvent::Opened { surface });
        SurfaceSession { bridge, pump }
    }

    /// Closes a surface: stops fan-out to it, drops every host subscription
    /// it owns and announces the close. Returns `false` for an unknown id.
    pub fn close_surface(&self, id: &SurfaceId) -> bool {
        if self.surfaces.remove(id).is_none() {
            return false;
        }
        let removed = self.bus.remove_owned_by(&Owner::Surface(id.clone()));
        info!(surface = %id, removed, "surface closed");
        self.announce(WindowStateEvent::Closed {
            surface: id.clone(),
        });
        true
    }

    fn announce(&self, event: WindowStateEvent) {
        if let Err(err) = self.bus.publish::<WindowStateTopic>(&event) {
            warn!(error = %err, code = err.code(), "window state not published");
        }
    }

    /// Stops the host loop and waits for it to finish.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.shutdown.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "host loop failed");
            }
        }
        info!("host runtime stopped");
    }
}

impl std::fmt::Debug for HostRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostRuntime")
            .field("bus", &self.bus)
            .field("surfaces", &self.surfaces.ids())
            .finish_non_exhaustive()
    }
}

async fn serve(
    bus: HostBus,
    surfaces: Arc<SurfaceSet>,
    mut inbound: mpsc::UnboundedReceiver<Inbound>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            next = inbound.recv() => match next {
                Some((origin, raw)) => handle(&bus, &surfaces, &origin, &raw),
                None => break,
            },
        }
    }
    debug!("host loop finished");
}

fn handle(bus: &HostBus, surfaces: &SurfaceSet, origin: &SurfaceId, raw: &str) {
    match bus.accept(origin, raw) {
        Ok(Some(response)) => respond(surfaces, origin, &response),
        Ok(None) => {}
        Err(err) => debug!(surface = %origin, code = err.code(), "frame not handled"),
    }
}

fn respond(surfaces: &SurfaceSet, origin: &SurfaceId, frame: &HostFrame) {
    let Some(transport) = surfaces.get(origin) else {
        debug!(surface = %origin, "response for closed surface dropped");
        return;
    };
    let sent = frame
        .encode()
        .map_err(|err| err.to_string())
        .and_then(|raw| transport.send(&raw).map_err(|err| err.to_string()));
    if let Err(error) = sent {
        warn!(surface = %origin, %error, "response not delivered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::DispatchMode;
    use crate::engine::Subscription;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use shellbus_event::{Channel, ListenerError};
    use std::time::Duration;

    async fn eventually<F: Fn() -> bool>(check: F) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn window_state_is_announced() {
        let runtime = HostRuntime::start(BusConfig::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        runtime
            .bus()
            .subscribe::<WindowStateTopic, _>(
                Owner::service("shell"),
                move |event: WindowStateEvent| {
                    sink.lock().push(event);
                    Ok(())
                },
            )
            .unwrap();

        let session = runtime.open_surface("main");
        let id = session.id().clone();
        assert_eq!(runtime.surfaces(), vec![id.clone()]);
        assert!(runtime.close_surface(&id));
        assert!(!runtime.close_surface(&id));

        assert_eq!(
            *seen.lock(),
            vec![
                WindowStateEvent::Opened { surface: id.clone() },
                WindowStateEvent::Closed { surface: id },
            ]
        );
        session.closed().await;
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn blocking_call_reaches_host_listener() {
        let runtime = HostRuntime::start(BusConfig::default());
        runtime
            .bus()
            .register(Subscription::new(
                Channel::parse("ipc-ping").unwrap(),
                Owner::service("pinger"),
                |p: &Value| Ok(json!({"pong": p})),
            ))
            .unwrap();

        let session = runtime.open_surface("main");
        let answer = session
            .bridge()
            .invoke(&Channel::parse("ipc-ping").unwrap(), json!(3))
            .await
            .unwrap();
        assert_eq!(answer, json!({"pong": 3}));
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn closing_a_surface_drops_what_it_owns() {
        let runtime = HostRuntime::start(BusConfig::default());
        let session = runtime.open_surface("main");
        runtime
            .bus()
            .register(Subscription::new(
                Channel::parse("ipc-ping").unwrap(),
                Owner::Surface(session.id().clone()),
                |_: &Value| Err(ListenerError::msg("stale")),
            ))
            .unwrap();
        assert_eq!(runtime.bus().subscription_count(), 1);

        runtime.close_surface(session.id());
        assert_eq!(runtime.bus().subscription_count(), 0);
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn echo_reaches_other_surfaces() {
        let runtime = HostRuntime::start(BusConfig::default());
        let sender = runtime.open_surface("a");
        let receiver = runtime.open_surface("b");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let _sub = receiver
            .bridge()
            .create_subscription(
                Channel::parse("ipc-note").unwrap(),
                Arc::clone(&seen),
                |seen: &Mutex<Vec<Value>>, p: &Value| {
                    seen.lock().push(p.clone());
                    Ok(Value::Null)
                },
                None,
            )
            .unwrap();
        let outgoing = sender
            .bridge()
            .create_subscription(
                Channel::parse("ipc-note").unwrap(),
                Arc::new(()),
                |_: &(), _: &Value| Ok(Value::Null),
                None,
            )
            .unwrap();

        outgoing.dispatch(json!("hi"), DispatchMode::Echo).await.unwrap();
        eventually(|| !seen.lock().is_empty()).await;
        assert_eq!(*seen.lock(), vec![json!("hi")]);
        runtime.shutdown().await;
    }
}
