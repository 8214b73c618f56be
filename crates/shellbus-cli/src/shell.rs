//! Demo host: a `HostRuntime` with a couple of services and numbered
//! surfaces driven from stdin.

use crate::command::{Command, Via};
use serde_json::{json, Value};
use shellbus_event::{Channel, ListenerError, WindowStateEvent, WindowStateTopic};
use shellbus_runtime::bridge::ClientSubscription;
use shellbus_runtime::config::ShellbusConfig;
use shellbus_runtime::engine::{HostBus, Subscription};
use shellbus_runtime::{BusError, HostRuntime, SurfaceSession};
use shellbus_types::{ErrorCode, Owner};
use std::sync::Arc;
use tracing::info;

/// Async service: answers with its payload, replies `{"pong": payload}`.
pub const PING_CHANNEL: &str = "ipc-ping";
/// Always fails, to show failure isolation.
pub const FAIL_CHANNEL: &str = "ipc-fail";

struct Watcher {
    label: String,
}

struct OpenSurface {
    number: usize,
    session: SurfaceSession,
    _ping: ClientSubscription,
}

impl OpenSurface {
    fn label(&self) -> &str {
        self.session.id().label()
    }
}

pub struct Shell {
    runtime: HostRuntime,
    surfaces: Vec<OpenSurface>,
    opened: usize,
}

impl Shell {
    /// Starts the host, installs the demo services and opens
    /// `surfaces.initial` surfaces.
    pub fn start(config: &ShellbusConfig) -> Result<Self, BusError> {
        let runtime = HostRuntime::start(config.bus.clone());
        install_services(runtime.bus())?;

        let mut shell = Self {
            runtime,
            surfaces: Vec::new(),
            opened: 0,
        };
        for _ in 0..config.surfaces.initial {
            shell.open()?;
        }
        Ok(shell)
    }

    /// Runs one command. Returns `false` when the shell should exit.
    pub async fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => {
                println!("bye");
                return false;
            }
            Command::Dispatch { channel, payload } => self.dispatch(&channel, &payload),
            Command::Surface {
                via,
                surface,
                channel,
                payload,
            } => self.send(via, surface, &channel, payload).await,
            Command::Open => {
                if let Err(err) = self.open() {
                    report(&err);
                }
            }
            Command::Close(number) => self.close(number).await,
            Command::Surfaces => self.list(),
        }
        true
    }

    fn dispatch(&self, channel: &Channel, payload: &Value) {
        let report = self.runtime.bus().dispatch_report(channel, payload);
        let failed = report.outcomes.iter().filter(|o| o.is_failure()).count();
        println!(
            "dispatched {channel}: {} ok, {failed} failed, {} surface(s)",
            report.outcomes.len() - failed,
            report.fanout.delivered.len()
        );
    }

    async fn send(&self, via: Via, number: usize, channel: &Channel, payload: Value) {
        let Some(surface) = self.surfaces.iter().find(|s| s.number == number) else {
            println!("error: no surface {number}");
            return;
        };
        let bridge = surface.session.bridge();
        let label = surface.label();

        let result = match via {
            Via::Echo => bridge
                .echo(channel, payload)
                .map(|id| println!("[{label}] echo {id} on {channel}")),
            Via::Post => bridge
                .post(channel, payload)
                .map(|()| println!("[{label}] posted on {channel}")),
            Via::Invoke => bridge
                .invoke(channel, payload)
                .await
                .map(|response| println!("[{label}] response {response}")),
        };
        if let Err(err) = result {
            report(&err);
        }
    }

    fn open(&mut self) -> Result<(), BusError> {
        self.opened += 1;
        let number = self.opened;
        let session = self.runtime.open_surface(format!("surface-{number}"));

        let watcher = Arc::new(Watcher {
            label: session.id().label().to_string(),
        });
        let ping = session.bridge().create_subscription(
            Channel::parse(PING_CHANNEL)?,
            watcher,
            |w: &Watcher, payload: &Value| {
                println!("[{}] {PING_CHANNEL} {payload}", w.label);
                Ok(Value::Null)
            },
            Some(Box::new(|w: &Watcher, payload: &Value| {
                println!("[{}] {PING_CHANNEL}-reply {payload}", w.label);
                Ok(Value::Null)
            })),
        )?;

        println!("opened {} ({})", session.id().label(), session.id());
        self.surfaces.push(OpenSurface {
            number,
            session,
            _ping: ping,
        });
        Ok(())
    }

    async fn close(&mut self, number: usize) {
        let Some(index) = self.surfaces.iter().position(|s| s.number == number) else {
            println!("error: no surface {number}");
            return;
        };
        let surface = self.surfaces.remove(index);
        self.runtime.close_surface(surface.session.id());
        println!("closed {}", surface.label());
        surface.session.closed().await;
    }

    fn list(&self) {
        if self.surfaces.is_empty() {
            println!("no open surfaces");
        }
        for surface in &self.surfaces {
            println!("{}  {}", surface.number, surface.session.id());
        }
    }

    /// Closes every surface, waits for their queues to drain and stops the
    /// host loop.
    pub async fn shutdown(mut self) {
        for surface in std::mem::take(&mut self.surfaces) {
            self.runtime.close_surface(surface.session.id());
            surface.session.closed().await;
        }
        self.runtime.shutdown().await;
    }
}

fn install_services(bus: &HostBus) -> Result<(), BusError> {
    let owner = Owner::service("shell");

    bus.register(
        Subscription::new(Channel::parse(PING_CHANNEL)?, owner.clone(), |p: &Value| {
            Ok(p.clone())
        })
        .with_reply(|p: &Value| Ok(json!({ "pong": p })))
        .asynchronous(),
    )?;
    bus.register(Subscription::new(
        Channel::parse(FAIL_CHANNEL)?,
        owner.clone(),
        |_: &Value| Err(ListenerError::new("ServiceError", "ipc-fail always fails")),
    ))?;
    bus.subscribe::<WindowStateTopic, _>(owner, |event: WindowStateEvent| {
        info!(surface = %event.surface(), ?event, "window state changed");
        Ok(())
    })?;
    Ok(())
}

fn report(err: &BusError) {
    println!("error [{}]: {err}", err.code());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(initial: usize) -> ShellbusConfig {
        let mut config = ShellbusConfig::default();
        config.surfaces.initial = initial;
        config
    }

    #[tokio::test]
    async fn opens_initial_surfaces_and_services() {
        let shell = Shell::start(&config(2)).expect("shell starts");

        assert_eq!(shell.surfaces.len(), 2);
        assert_eq!(shell.runtime.surfaces().len(), 2);
        // ping (message + reply share one registration), fail, window state
        assert_eq!(shell.runtime.bus().subscription_count(), 3);
        shell.shutdown().await;
    }

    #[tokio::test]
    async fn numbers_are_not_reused_after_close() {
        let mut shell = Shell::start(&config(1)).expect("shell starts");

        assert!(shell.execute(Command::Close(1)).await);
        assert!(shell.execute(Command::Open).await);

        let numbers: Vec<usize> = shell.surfaces.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![2]);
        shell.shutdown().await;
    }

    #[tokio::test]
    async fn quit_stops_the_loop() {
        let mut shell = Shell::start(&config(0)).expect("shell starts");
        assert!(!shell.execute(Command::Quit).await);
        shell.shutdown().await;
    }
}
