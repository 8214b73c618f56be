//! In-process host: the bus, its surface directory and the loop that
//! serves surface frames.

mod runtime;

pub use runtime::{HostRuntime, SurfaceSession};
