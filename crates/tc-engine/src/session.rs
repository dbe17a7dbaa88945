//! The synchronous protocol session.
//!
//! One session is one connection to one engine process.  Every call blocks
//! until the engine answers; there is never more than one request in flight.
//! When the engine process is restarted the old session is dead and a new
//! one is obtained from a [`Connector`].

use std::thread;
use std::time::Duration;

use tracing::debug;

use tc_core::{RouteId, SignalId, VehicleId};

use crate::command::Command;
use crate::fields::{StepSnapshot, VehicleVar};
use crate::{EngineError, EngineResult};

/// Client side of the engine protocol.
pub trait ProtocolSession {
    /// Register per-vehicle telemetry.  Subscriptions last for the lifetime
    /// of the session, or until the vehicle leaves the network.
    fn subscribe(&mut self, id: &VehicleId, vars: &[VehicleVar]) -> EngineResult<()>;

    /// Register leader telemetry with a search distance in metres.
    fn subscribe_leader(&mut self, id: &VehicleId, lookahead: f64) -> EngineResult<()>;

    /// Register the departed / arrived / teleport-starting id lists.
    fn subscribe_lifecycle(&mut self) -> EngineResult<()>;

    fn subscribe_signal(&mut self, id: &SignalId) -> EngineResult<()>;

    fn issue(&mut self, id: &VehicleId, command: Command) -> EngineResult<()>;

    fn issue_signal(&mut self, id: &SignalId, state: &str) -> EngineResult<()>;

    /// Perform exactly one simulation tick.
    fn advance(&mut self) -> EngineResult<()>;

    /// Latest subscribed values plus the lifecycle events of the last tick.
    ///
    /// Calling `collect` twice without an `advance` in between returns the
    /// same events both times.
    fn collect(&mut self) -> EngineResult<StepSnapshot>;

    /// Vehicles that departed during the last tick.
    fn departed_count(&mut self) -> EngineResult<usize>;

    /// Ids of every vehicle currently on the network.
    fn vehicle_ids(&mut self) -> EngineResult<Vec<VehicleId>>;

    fn signal_ids(&mut self) -> EngineResult<Vec<SignalId>>;

    /// Named route the vehicle was inserted with.
    fn route_id(&mut self, id: &VehicleId) -> EngineResult<RouteId>;

    /// Release the connection.  Calling `close` on a closed session is a
    /// no-op.
    fn close(&mut self);
}

/// Opens sessions against an engine listening on a port.
pub trait Connector {
    type Session: ProtocolSession;

    fn connect(&mut self, port: u16) -> EngineResult<Self::Session>;
}

/// Try `connector.connect(port)` up to `retries` times, sleeping `delay`
/// between attempts.
///
/// Returns [`EngineError::Connection`] carrying the last failure once the
/// budget is spent.
pub fn connect_with_retries<C: Connector>(
    connector: &mut C,
    port: u16,
    retries: u32,
    delay: Duration,
) -> EngineResult<C::Session> {
    let mut last = String::from("no connection attempts were made");
    for attempt in 1..=retries {
        match connector.connect(port) {
            Ok(session) => {
                debug!(port, attempt, "connected to engine");
                return Ok(session);
            }
            Err(e) => {
                debug!(port, attempt, error = %e, "connect attempt failed");
                last = e.to_string();
                if attempt < retries {
                    thread::sleep(delay);
                }
            }
        }
    }
    Err(EngineError::Connection { port, attempts: retries, reason: last })
}
