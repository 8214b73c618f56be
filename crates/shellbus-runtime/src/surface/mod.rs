//! UI surfaces as seen from the host: transports, the open-surface
//! directory and fan-out.
//!
//! ```text
//! HostBus::dispatch ──► fan_out ──► encode HostFrame::Event once
//!                                      │
//!                     ┌────────────────┼────────────────┐
//!                     ▼                ▼                ▼
//!                surface A        surface B        surface C
//!                 (ok)           (closed: logged)    (ok)
//! ```

mod error;
mod fanout;
mod transport;

pub use error::TransportError;
pub use fanout::{fan_out, FanoutReport};
pub use transport::{ChannelTransport, SurfaceDirectory, SurfaceSet, SurfaceTransport};
