//! Surface side of the bus.
//!
//! A surface talks to the host only through frames:
//!
//! ```text
//! ClientSubscription::dispatch
//!        │ Echo      post(ipc-sonar, encoded echo)
//!        │ Direct    post(channel, payload)
//!        │ Blocking  invoke(envelope) ──► waits for response(id)
//!        ▼
//!   HostLink ═══════════════════════► host runtime
//!                                          │
//!   ClientBridge::receive ◄═══ event / response frames
//!        │
//!   local listeners for the channel
//! ```

mod client;
mod link;

pub use client::{ClientBridge, ClientSubscription, DispatchMode, DispatchReceipt};
pub use link::{ChannelLink, HostLink};
