//! Surface-side bus adapter.

use super::HostLink;
use crate::config::BusConfig;
use crate::engine::{bind, guard, BusError, Dispatcher, Handler, ScopedHandler, Subscription};
use parking_lot::Mutex;
use serde_json::Value;
use shellbus_event::{
    Channel, ClientFrame, EchoEnvelope, Envelope, ErrorEnvelope, HostFrame, ListenerError, Stage,
};
use shellbus_types::{EnvelopeId, Owner, SubscriptionId, SurfaceId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

/// How a [`ClientSubscription`] sends a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// Through the echo relay: every host listener and every surface sees it.
    #[default]
    Echo,
    /// Straight to host listeners on the channel, fire-and-forget.
    Direct,
    /// Host listeners answer; the surface waits up to the request timeout.
    Blocking,
}

/// What a [`ClientSubscription::dispatch`] produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchReceipt {
    /// Wire id of the echo or invoke envelope. A direct post carries none.
    pub id: Option<EnvelopeId>,
    pub mode: DispatchMode,
    /// The host's answer. Only set for [`DispatchMode::Blocking`].
    pub response: Option<Value>,
    /// The subscription's own listener run on `response`.
    pub local: Option<Result<Value, ErrorEnvelope>>,
}

struct BridgeInner {
    surface: SurfaceId,
    link: Arc<dyn HostLink>,
    dispatcher: Dispatcher,
    pending: Mutex<HashMap<EnvelopeId, oneshot::Sender<Value>>>,
}

/// One surface's end of the bus.
///
/// Keeps a local registry for the surface's own subscriptions, sends
/// frames to the host through a [`HostLink`] and matches blocking
/// responses to their callers. Cheap to clone.
#[derive(Clone)]
pub struct ClientBridge {
    inner: Arc<BridgeInner>,
}

impl ClientBridge {
    #[must_use]
    pub fn new(surface: SurfaceId, link: Arc<dyn HostLink>, config: BusConfig) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                surface,
                link,
                dispatcher: Dispatcher::new(config),
                pending: Mutex::new(HashMap::new()),
            }),
        }
    }

    #[must_use]
    pub fn surface(&self) -> &SurfaceId {
        &self.inner.surface
    }

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        self.inner.dispatcher.config()
    }

    /// Blocking calls still waiting for the host.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Number of live local subscriptions.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.dispatcher.registry().len()
    }

    /// Registers `on_message` on `channel` and, if given, `on_reply` on its
    /// reply channel. Both are bound to `scope` and owned by this surface.
    ///
    /// # Errors
    ///
    /// Same rules as [`HostBus::register`](crate::engine::HostBus::register).
    /// Nothing stays registered on error.
    pub fn create_subscription<S, M>(
        &self,
        channel: Channel,
        scope: Arc<S>,
        on_message: M,
        on_reply: Option<ScopedHandler<S>>,
    ) -> Result<ClientSubscription, BusError>
    where
        S: Send + Sync + 'static,
        M: Fn(&S, &Value) -> Result<Value, ListenerError> + Send + Sync + 'static,
    {
        let owner = Owner::Surface(self.inner.surface.clone());
        let dispatcher = &self.inner.dispatcher;

        let on_message = bind(Arc::clone(&scope), on_message);
        let message = dispatcher.register(Subscription::from_handler(
            channel.clone(),
            owner.clone(),
            Arc::clone(&on_message),
        ))?;

        let reply = match on_reply {
            Some(on_reply) => {
                let subscription =
                    Subscription::from_handler(channel.reply(), owner, bind(scope, on_reply));
                match dispatcher.register(subscription) {
                    Ok(id) => Some(id),
                    Err(err) => {
                        dispatcher.unregister(message);
                        return Err(err);
                    }
                }
            }
            None => None,
        };

        Ok(ClientSubscription {
            bridge: self.clone(),
            channel,
            on_message,
            message,
            reply,
            removed: false,
        })
    }

    /// Posts `payload` to host listeners on `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::LinkClosed`] when the host is gone.
    pub fn post(&self, channel: &Channel, payload: Value) -> Result<(), BusError> {
        self.inner.link.send(&ClientFrame::Post {
            channel: channel.clone(),
            payload,
        })
    }

    /// Wraps `payload` in an echo envelope and posts it on the relay
    /// channel, so the host re-dispatches it to everyone.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::LinkClosed`] when the host is gone.
    pub fn echo(&self, channel: &Channel, payload: Value) -> Result<EnvelopeId, BusError> {
        let id = EnvelopeId::new();
        let echo = EchoEnvelope::new(channel.clone(), payload)
            .with_id(id)
            .encode()?;
        self.post(&Channel::Sonar, Value::String(echo))?;
        Ok(id)
    }

    /// Sends a blocking request and waits for the host's answer.
    ///
    /// # Errors
    ///
    /// - [`BusError::Timeout`] if no answer arrives within
    ///   `request_timeout_ms`
    /// - [`BusError::Remote`] if the answer is an error envelope
    /// - [`BusError::EmptyResponse`] if no host listener returned a value
    /// - [`BusError::LinkClosed`] if the link went away first
    pub async fn invoke(&self, channel: &Channel, payload: Value) -> Result<Value, BusError> {
        let (_, response) = self.request(Envelope::new(channel.clone(), payload)).await?;
        Ok(response)
    }

    async fn request(&self, envelope: Envelope) -> Result<(EnvelopeId, Value), BusError> {
        let id = envelope.id;
        let channel = envelope.channel.clone();
        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().insert(id, tx);

        if let Err(err) = self.inner.link.send(&ClientFrame::Invoke(envelope)) {
            self.inner.pending.lock().remove(&id);
            return Err(err);
        }

        let limit = Duration::from_millis(self.config().request_timeout_ms);
        let response = match tokio::time::timeout(limit, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(BusError::LinkClosed),
            Err(_) => {
                self.inner.pending.lock().remove(&id);
                warn!(surface = %self.surface(), channel = %channel, id = %id, "request timed out");
                return Err(BusError::Timeout(id));
            }
        };

        if let Some(envelope) = ErrorEnvelope::detect(&response) {
            return Err(BusError::Remote(Box::new(envelope)));
        }
        if response.is_null() {
            return Err(BusError::EmptyResponse(channel));
        }
        Ok((id, response))
    }

    /// Handles one frame from the host.
    ///
    /// Events run the local listeners for their channel. A response wakes
    /// the matching blocking caller; a response nobody waits for any more
    /// (it timed out) is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Event`] if the frame does not decode.
    pub fn receive(&self, raw: &str) -> Result<(), BusError> {
        match HostFrame::decode(raw)? {
            HostFrame::Event { channel, payload } => {
                let dispatched = self.inner.dispatcher.run(&channel, &payload);
                trace!(
                    surface = %self.surface(),
                    channel = %channel,
                    listeners = dispatched.outcomes.len(),
                    "event delivered"
                );
            }
            HostFrame::Response { id, payload } => {
                let waiter = self.inner.pending.lock().remove(&id);
                match waiter {
                    Some(waiter) => {
                        if waiter.send(payload).is_err() {
                            debug!(surface = %self.surface(), id = %id, "caller gone");
                        }
                    }
                    None => debug!(surface = %self.surface(), id = %id, "unmatched response"),
                }
            }
        }
        Ok(())
    }

    /// Feeds host frames into [`ClientBridge::receive`] until the host side
    /// closes, then fails any caller still waiting.
    pub async fn pump(self, mut inbound: mpsc::UnboundedReceiver<String>) {
        while let Some(raw) = inbound.recv().await {
            if let Err(err) = self.receive(&raw) {
                warn!(surface = %self.surface(), error = %err, "dropped host frame");
            }
        }
        let abandoned = {
            let mut pending = self.inner.pending.lock();
            let count = pending.len();
            pending.clear();
            count
        };
        debug!(surface = %self.surface(), abandoned, "surface link closed");
    }
}

impl std::fmt::Debug for ClientBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBridge")
            .field("surface", &self.inner.surface)
            .field("subscriptions", &self.subscription_count())
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// A surface component's registration, returned by
/// [`ClientBridge::create_subscription`].
///
/// Dropping it unregisters both the message and reply listeners.
pub struct ClientSubscription {
    bridge: ClientBridge,
    channel: Channel,
    on_message: Handler,
    message: SubscriptionId,
    reply: Option<SubscriptionId>,
    removed: bool,
}

impl ClientSubscription {
    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.message
    }

    #[must_use]
    pub fn reply_id(&self) -> Option<SubscriptionId> {
        self.reply
    }

    /// Sends `payload` on this subscription's channel.
    ///
    /// In [`DispatchMode::Blocking`] the host's answer is also handed to
    /// this subscription's own listener, and the receipt carries both.
    ///
    /// # Errors
    ///
    /// See [`ClientBridge::post`], [`ClientBridge::echo`] and
    /// [`ClientBridge::invoke`].
    pub async fn dispatch(
        &self,
        payload: Value,
        mode: DispatchMode,
    ) -> Result<DispatchReceipt, BusError> {
        match mode {
            DispatchMode::Echo => {
                let id = self.bridge.echo(&self.channel, payload)?;
                Ok(DispatchReceipt::sent(Some(id), mode))
            }
            DispatchMode::Direct => {
                self.bridge.post(&self.channel, payload)?;
                Ok(DispatchReceipt::sent(None, mode))
            }
            DispatchMode::Blocking => {
                let envelope = Envelope::new(self.channel.clone(), payload);
                let (id, response) = self.bridge.request(envelope).await?;
                let local = guard::invoke(
                    &self.on_message,
                    &response,
                    &self.channel,
                    Stage::Callback,
                    self.bridge.config().catch_panics,
                );
                Ok(DispatchReceipt {
                    id: Some(id),
                    mode,
                    response: Some(response),
                    local: Some(local),
                })
            }
        }
    }

    /// Unregisters both listeners now.
    pub fn remove(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if self.removed {
            return;
        }
        self.removed = true;
        let dispatcher = &self.bridge.inner.dispatcher;
        dispatcher.unregister(self.message);
        if let Some(reply) = self.reply {
            dispatcher.unregister(reply);
        }
    }
}

impl Drop for ClientSubscription {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for ClientSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSubscription")
            .field("surface", self.bridge.surface())
            .field("channel", &self.channel)
            .field("message", &self.message)
            .field("reply", &self.reply)
            .finish_non_exhaustive()
    }
}

impl DispatchReceipt {
    fn sent(id: Option<EnvelopeId>, mode: DispatchMode) -> Self {
        Self {
            id,
            mode,
            response: None,
            local: None,
        }
    }
}
