//! In-process engine double for tests and demos.
//!
//! [`MockEngine`] implements [`Connector`]; every successful `connect` starts
//! a fresh world from the [`MockScenario`] template, exactly like a newly
//! launched engine process.  Sessions from an earlier connection answer
//! [`EngineError::Closed`].
//!
//! Kinematics are deliberately simple: a vehicle moves `speed * step_length`
//! metres per tick along its route, a slow-down command sets its speed at
//! once and a lane change is clamped to the edge's lanes.  Protocol timing
//! follows the real engine:
//!
//! - an added vehicle departs on the next tick,
//! - a removed vehicle is reported as arrived on the next tick and loses its
//!   subscriptions,
//! - a vehicle that runs off the end of its route arrives,
//! - lifecycle ids are only returned once the lifecycle channel is
//!   subscribed.
//!
//! Failures are scripted through the `MockEngine` handle: refused
//! connections, rejected inserts, withheld departures and teleports.
//! [`MockLauncher`] stands in for process spawning.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rustc_hash::{FxHashMap, FxHashSet};

use tc_core::{EdgeId, RouteId, SignalId, VehicleId, VehicleTypeId};
use tc_scenario::{EdgeNetwork, ScenarioResult, ScenarioView};

use crate::command::{Command, VehicleSpawn};
use crate::fields::{Leader, LifecycleEvents, SignalFields, StepSnapshot, VehicleFields, VehicleVar};
use crate::process::{EngineCommand, EngineHandle, Launcher};
use crate::session::{Connector, ProtocolSession};
use crate::{EngineError, EngineResult};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── MockScenario ──────────────────────────────────────────────────────────────

/// Template every mock connection starts from.
#[derive(Clone)]
pub struct MockScenario {
    network:        Arc<EdgeNetwork>,
    routes:         FxHashMap<RouteId, Vec<EdgeId>>,
    step_length:    f64,
    vehicle_length: f64,
    wrap_routes:    bool,
    vehicles:       Vec<(VehicleId, VehicleSpawn)>,
    signals:        Vec<(SignalId, SignalFields)>,
}

impl MockScenario {
    /// Named routes are taken from the network: the route starting on edge
    /// `x` is known as `route<x>`.
    pub fn new(network: Arc<EdgeNetwork>, step_length: f64) -> Self {
        let routes = network
            .edges()
            .filter_map(|e| network.route_from(e).map(|r| (RouteId::for_edge(e), r.to_vec())))
            .collect();
        Self {
            network,
            routes,
            step_length,
            vehicle_length: 5.0,
            wrap_routes: false,
            vehicles: Vec::new(),
            signals: Vec::new(),
        }
    }

    /// Add a vehicle that departs on the handshake tick of every connection.
    pub fn with_vehicle(mut self, id: impl Into<VehicleId>, spawn: VehicleSpawn) -> Self {
        self.vehicles.push((id.into(), spawn));
        self
    }

    /// Place `roster` evenly over the network, all at `speed`.
    pub fn with_evenly_spaced(
        mut self,
        roster: &[(VehicleId, VehicleTypeId)],
        speed: f64,
    ) -> ScenarioResult<Self> {
        let slots = self.network.generate_starting_positions(roster.len(), 0.0)?;
        for ((id, type_id), slot) in roster.iter().zip(slots) {
            self.vehicles.push((id.clone(), VehicleSpawn {
                route: RouteId::for_edge(&slot.edge),
                type_id: type_id.clone(),
                lane: slot.lane,
                position: slot.position,
                speed,
            }));
        }
        Ok(self)
    }

    pub fn with_signal(
        mut self,
        id: impl Into<SignalId>,
        state: impl Into<String>,
        program: impl Into<String>,
    ) -> Self {
        self.signals.push((id.into(), SignalFields { state: state.into(), program: program.into() }));
        self
    }

    /// Restart a vehicle's route from the top instead of arriving at its end.
    pub fn wrap_routes(mut self, wrap: bool) -> Self {
        self.wrap_routes = wrap;
        self
    }

    pub fn vehicle_length(mut self, length: f64) -> Self {
        self.vehicle_length = length;
        self
    }

    pub fn network(&self) -> &Arc<EdgeNetwork> {
        &self.network
    }

    fn spawn(&self, id: &VehicleId, spawn: &VehicleSpawn) -> EngineResult<MockVehicle> {
        let route = self
            .routes
            .get(&spawn.route)
            .ok_or_else(|| EngineError::rejected(id, format!("unknown route {}", spawn.route)))?;
        Ok(MockVehicle {
            id:          id.clone(),
            type_id:     spawn.type_id.clone(),
            route_id:    spawn.route.clone(),
            route:       route.clone(),
            route_index: 0,
            lane:        spawn.lane,
            pos:         spawn.position,
            speed:       spawn.speed.max(0.0),
            length:      self.vehicle_length,
        })
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct MockVehicle {
    id:          VehicleId,
    type_id:     VehicleTypeId,
    route_id:    RouteId,
    route:       Vec<EdgeId>,
    route_index: usize,
    lane:        usize,
    pos:         f64,
    speed:       f64,
    length:      f64,
}

impl MockVehicle {
    fn edge(&self) -> &EdgeId {
        &self.route[self.route_index]
    }
}

#[derive(Default)]
struct World {
    tick:        u64,
    vehicles:    Vec<MockVehicle>,
    pending:     Vec<MockVehicle>,
    removed:     Vec<VehicleId>,
    signals:     Vec<(SignalId, SignalFields)>,
    subs:        FxHashSet<VehicleId>,
    leader_subs: FxHashMap<VehicleId, f64>,
    signal_subs: FxHashSet<SignalId>,
    lifecycle:   bool,
    events:      LifecycleEvents,
    teleporting: FxHashSet<VehicleId>,
}

impl World {
    fn position(&self, id: &VehicleId) -> Option<usize> {
        self.vehicles.iter().position(|v| &v.id == id)
    }

    fn exists(&self, id: &VehicleId) -> bool {
        self.position(id).is_some() || self.pending.iter().any(|v| &v.id == id)
    }

    fn unsubscribe(&mut self, id: &VehicleId) {
        self.subs.remove(id);
        self.leader_subs.remove(id);
    }

    fn leader_of(&self, v: &MockVehicle, lookahead: f64, net: &EdgeNetwork) -> Option<Leader> {
        let total = net.length();
        let x = net.absolute_position(v.edge(), v.pos)?;
        self.vehicles
            .iter()
            .filter(|o| o.id != v.id && o.lane == v.lane && !self.teleporting.contains(&o.id))
            .filter_map(|o| {
                let xo = net.absolute_position(o.edge(), o.pos)?;
                let d = (xo - x).rem_euclid(total);
                (d > 0.0 && d <= lookahead).then_some((d, o))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(d, o)| Leader { id: o.id.clone(), gap: d - o.length })
    }
}

// ── Shared state ──────────────────────────────────────────────────────────────

struct MockShared {
    template:          MockScenario,
    world:             Option<World>,
    generation:        u64,
    connects:          u32,
    closes:            u32,
    failing_connects:  u32,
    failing_advances:  u32,
    withheld:          usize,
    add_failures:      FxHashMap<VehicleId, u32>,
    teleports:         Vec<(u64, VehicleId)>,
    log:               Vec<(VehicleId, Command)>,
    signal_log:        Vec<(SignalId, String)>,
}

impl MockShared {
    fn instantiate(&self) -> EngineResult<World> {
        let keep = self.template.vehicles.len().saturating_sub(self.withheld);
        let mut world = World { signals: self.template.signals.clone(), ..World::default() };
        for (id, spawn) in self.template.vehicles.iter().take(keep) {
            world.pending.push(self.template.spawn(id, spawn)?);
        }
        Ok(world)
    }

    fn advance(&mut self) -> EngineResult<()> {
        let net = Arc::clone(&self.template.network);
        let dt = self.template.step_length;
        let wrap = self.template.wrap_routes;
        let world = self.world.as_mut().ok_or(EngineError::Closed)?;

        world.tick += 1;
        world.teleporting.clear();
        let mut events = LifecycleEvents::default();

        let mut arrived = Vec::new();
        for v in world.vehicles.iter_mut() {
            v.pos += v.speed * dt;
            loop {
                let Some(len) = net.edge_length(v.edge()) else {
                    arrived.push(v.id.clone());
                    break;
                };
                if v.pos < len {
                    break;
                }
                v.pos -= len;
                v.route_index += 1;
                if v.route_index >= v.route.len() {
                    if wrap {
                        v.route_index = 0;
                    } else {
                        v.route_index = v.route.len() - 1;
                        arrived.push(v.id.clone());
                        break;
                    }
                }
            }
        }
        world.vehicles.retain(|v| !arrived.contains(&v.id));
        for id in &arrived {
            world.unsubscribe(id);
        }
        events.arrived = arrived;
        events.arrived.append(&mut world.removed);

        for mut v in world.pending.drain(..) {
            let lanes = net.num_lanes(v.edge()).unwrap_or(1);
            v.lane = v.lane.min(lanes.saturating_sub(1));
            events.departed.push(v.id.clone());
            world.vehicles.push(v);
        }

        let tick = world.tick;
        let (due, later): (Vec<_>, Vec<_>) =
            self.teleports.drain(..).partition(|(t, _)| *t == tick);
        self.teleports = later;
        for (_, id) in due {
            if world.position(&id).is_some() {
                world.teleporting.insert(id.clone());
                events.teleport_starting.push(id);
            }
        }

        world.events = events;
        Ok(())
    }

    fn issue(&mut self, id: &VehicleId, command: Command) -> EngineResult<()> {
        let net = Arc::clone(&self.template.network);
        let world = self.world.as_mut().ok_or(EngineError::Closed)?;

        match &command {
            Command::Add(spawn) => {
                if world.exists(id) {
                    return Err(EngineError::rejected(id, "vehicle already exists"));
                }
                if let Some(left) = self.add_failures.get_mut(id).filter(|n| **n > 0) {
                    *left -= 1;
                    return Err(EngineError::rejected(id, "insertion refused"));
                }
                let vehicle = self.template.spawn(id, spawn)?;
                world.pending.push(vehicle);
            }
            Command::Remove => {
                if let Some(i) = world.position(id) {
                    world.vehicles.remove(i);
                    world.removed.push(id.clone());
                    world.unsubscribe(id);
                } else if let Some(i) = world.pending.iter().position(|v| &v.id == id) {
                    world.pending.remove(i);
                } else {
                    return Err(EngineError::rejected(id, "no such vehicle"));
                }
            }
            other => {
                let i = world
                    .position(id)
                    .ok_or_else(|| EngineError::rejected(id, "no such vehicle"))?;
                let v = &mut world.vehicles[i];
                match other {
                    Command::SlowDown { speed, .. } => v.speed = speed.max(0.0),
                    Command::ChangeLane { lane, .. } => {
                        let lanes = net.num_lanes(v.edge()).unwrap_or(1);
                        v.lane = (*lane).min(lanes.saturating_sub(1));
                    }
                    Command::SetRoute { edges } => {
                        if edges.first() != Some(v.edge()) {
                            return Err(EngineError::rejected(id, "route must start on current edge"));
                        }
                        v.route = edges.clone();
                        v.route_index = 0;
                    }
                    Command::Add(_) | Command::Remove => {}
                }
            }
        }
        self.log.push((id.clone(), command));
        Ok(())
    }

    fn collect(&self) -> EngineResult<StepSnapshot> {
        let net = &self.template.network;
        let world = self.world.as_ref().ok_or(EngineError::Closed)?;
        let mut snap = StepSnapshot::default();
        for v in world.vehicles.iter().filter(|v| world.subs.contains(&v.id)) {
            let off = world.teleporting.contains(&v.id);
            let leader = world
                .leader_subs
                .get(&v.id)
                .filter(|_| !off)
                .and_then(|&look| world.leader_of(v, look, net));
            snap.vehicles.insert(v.id.clone(), VehicleFields {
                type_id:       v.type_id.clone(),
                edge:          (!off).then(|| v.edge().clone()),
                lane:          v.lane,
                lane_position: v.pos,
                speed:         v.speed,
                length:        v.length,
                route:         v.route.clone(),
                leader,
            });
        }
        for (id, fields) in world.signals.iter().filter(|(id, _)| world.signal_subs.contains(id)) {
            snap.signals.insert(id.clone(), fields.clone());
        }
        if world.lifecycle {
            snap.events = world.events.clone();
        }
        Ok(snap)
    }
}

// ── MockEngine ────────────────────────────────────────────────────────────────

/// Handle to a mock engine.  Clones share the same engine, so a test can keep
/// one clone for inspection while the control loop owns another.
#[derive(Clone)]
pub struct MockEngine {
    shared: Arc<Mutex<MockShared>>,
}

impl MockEngine {
    pub fn new(template: MockScenario) -> Self {
        Self {
            shared: Arc::new(Mutex::new(MockShared {
                template,
                world: None,
                generation: 0,
                connects: 0,
                closes: 0,
                failing_connects: 0,
                failing_advances: 0,
                withheld: 0,
                add_failures: FxHashMap::default(),
                teleports: Vec::new(),
                log: Vec::new(),
                signal_log: Vec::new(),
            })),
        }
    }

    /// Successful connections so far.
    pub fn connect_count(&self) -> u32 {
        lock(&self.shared).connects
    }

    pub fn close_count(&self) -> u32 {
        lock(&self.shared).closes
    }

    /// Refuse the next `n` connection attempts.
    pub fn fail_next_connects(&self, n: u32) {
        lock(&self.shared).failing_connects = n;
    }

    /// Fail the next `n` ticks with a protocol error.
    pub fn fail_next_advances(&self, n: u32) {
        lock(&self.shared).failing_advances = n;
    }

    /// Reject the next `times` insertions of `id`.
    pub fn fail_add(&self, id: impl Into<VehicleId>, times: u32) {
        lock(&self.shared).add_failures.insert(id.into(), times);
    }

    /// Make `id` start teleporting at world tick `tick` of the current or
    /// next connection.
    pub fn teleport_at(&self, tick: u64, id: impl Into<VehicleId>) {
        lock(&self.shared).teleports.push((tick, id.into()));
    }

    /// Keep the last `n` template vehicles from departing on every future
    /// connection.
    pub fn withhold_departures(&self, n: usize) {
        lock(&self.shared).withheld = n;
    }

    /// Accepted vehicle commands, oldest first.
    pub fn commands(&self) -> Vec<(VehicleId, Command)> {
        lock(&self.shared).log.clone()
    }

    pub fn clear_commands(&self) {
        lock(&self.shared).log.clear();
    }

    pub fn signal_commands(&self) -> Vec<(SignalId, String)> {
        lock(&self.shared).signal_log.clone()
    }

    /// Ticks performed by the current connection.
    pub fn tick(&self) -> u64 {
        lock(&self.shared).world.as_ref().map_or(0, |w| w.tick)
    }

    /// Vehicles currently on the network.
    pub fn vehicle_count(&self) -> usize {
        lock(&self.shared).world.as_ref().map_or(0, |w| w.vehicles.len())
    }
}

impl Connector for MockEngine {
    type Session = MockSession;

    fn connect(&mut self, port: u16) -> EngineResult<MockSession> {
        let mut shared = lock(&self.shared);
        if shared.failing_connects > 0 {
            shared.failing_connects -= 1;
            return Err(EngineError::Protocol(format!("connection refused on port {port}")));
        }
        let world = shared.instantiate()?;
        shared.world = Some(world);
        shared.generation += 1;
        shared.connects += 1;
        Ok(MockSession {
            shared: Arc::clone(&self.shared),
            generation: shared.generation,
            closed: false,
        })
    }
}

// ── MockSession ───────────────────────────────────────────────────────────────

/// A session bound to one mock connection.
pub struct MockSession {
    shared:     Arc<Mutex<MockShared>>,
    generation: u64,
    closed:     bool,
}

impl MockSession {
    fn live(&self) -> EngineResult<MutexGuard<'_, MockShared>> {
        let shared = lock(&self.shared);
        if self.closed || shared.generation != self.generation || shared.world.is_none() {
            return Err(EngineError::Closed);
        }
        Ok(shared)
    }

    fn world<R>(&self, f: impl FnOnce(&mut World) -> EngineResult<R>) -> EngineResult<R> {
        let mut shared = self.live()?;
        let world = shared.world.as_mut().ok_or(EngineError::Closed)?;
        f(world)
    }
}

impl ProtocolSession for MockSession {
    fn subscribe(&mut self, id: &VehicleId, _vars: &[VehicleVar]) -> EngineResult<()> {
        self.world(|w| {
            if w.position(id).is_none() {
                return Err(EngineError::rejected(id, "cannot subscribe to unknown vehicle"));
            }
            w.subs.insert(id.clone());
            Ok(())
        })
    }

    fn subscribe_leader(&mut self, id: &VehicleId, lookahead: f64) -> EngineResult<()> {
        self.world(|w| {
            if w.position(id).is_none() {
                return Err(EngineError::rejected(id, "cannot subscribe to unknown vehicle"));
            }
            w.leader_subs.insert(id.clone(), lookahead);
            Ok(())
        })
    }

    fn subscribe_lifecycle(&mut self) -> EngineResult<()> {
        self.world(|w| {
            w.lifecycle = true;
            Ok(())
        })
    }

    fn subscribe_signal(&mut self, id: &SignalId) -> EngineResult<()> {
        self.world(|w| {
            if !w.signals.iter().any(|(s, _)| s == id) {
                return Err(EngineError::rejected(id, "unknown traffic signal"));
            }
            w.signal_subs.insert(id.clone());
            Ok(())
        })
    }

    fn issue(&mut self, id: &VehicleId, command: Command) -> EngineResult<()> {
        self.live()?.issue(id, command)
    }

    fn issue_signal(&mut self, id: &SignalId, state: &str) -> EngineResult<()> {
        let mut shared = self.live()?;
        let world = shared.world.as_mut().ok_or(EngineError::Closed)?;
        let (_, fields) = world
            .signals
            .iter_mut()
            .find(|(s, _)| s == id)
            .ok_or_else(|| EngineError::rejected(id, "unknown traffic signal"))?;
        fields.state = state.to_string();
        shared.signal_log.push((id.clone(), state.to_string()));
        Ok(())
    }

    fn advance(&mut self) -> EngineResult<()> {
        let mut shared = self.live()?;
        if shared.failing_advances > 0 {
            shared.failing_advances -= 1;
            return Err(EngineError::Protocol("tick failed".into()));
        }
        shared.advance()
    }

    fn collect(&mut self) -> EngineResult<StepSnapshot> {
        self.live()?.collect()
    }

    fn departed_count(&mut self) -> EngineResult<usize> {
        self.world(|w| Ok(w.events.departed.len()))
    }

    fn vehicle_ids(&mut self) -> EngineResult<Vec<VehicleId>> {
        self.world(|w| Ok(w.vehicles.iter().map(|v| v.id.clone()).collect()))
    }

    fn signal_ids(&mut self) -> EngineResult<Vec<SignalId>> {
        self.world(|w| Ok(w.signals.iter().map(|(id, _)| id.clone()).collect()))
    }

    fn route_id(&mut self, id: &VehicleId) -> EngineResult<RouteId> {
        self.world(|w| {
            w.vehicles
                .iter()
                .chain(w.pending.iter())
                .find(|v| &v.id == id)
                .map(|v| v.route_id.clone())
                .ok_or_else(|| EngineError::rejected(id, "no such vehicle"))
        })
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        lock(&self.shared).closes += 1;
    }
}

// ── MockLauncher ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct LauncherStats {
    spawns:        u32,
    terminates:    u32,
    failing:       u32,
    failing_ports: u32,
    last_command:  Option<EngineCommand>,
}

/// A [`Launcher`] that records launches instead of spawning processes.
/// Clones share their counters.
#[derive(Clone, Default)]
pub struct MockLauncher {
    stats: Arc<Mutex<LauncherStats>>,
}

impl MockLauncher {
    pub fn spawns(&self) -> u32 {
        lock(&self.stats).spawns
    }

    pub fn terminates(&self) -> u32 {
        lock(&self.stats).terminates
    }

    /// Fail the next `n` spawns.
    pub fn fail_next_spawns(&self, n: u32) {
        lock(&self.stats).failing = n;
    }

    /// Fail the next `n` port reservations.
    pub fn fail_next_ports(&self, n: u32) {
        lock(&self.stats).failing_ports = n;
    }

    pub fn last_command(&self) -> Option<EngineCommand> {
        lock(&self.stats).last_command.clone()
    }
}

impl Launcher for MockLauncher {
    fn reserve_port(&mut self) -> EngineResult<u16> {
        let mut stats = lock(&self.stats);
        if stats.failing_ports > 0 {
            stats.failing_ports -= 1;
            return Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                "no port available",
            )));
        }
        drop(stats);
        crate::process::free_port()
    }

    fn spawn(&mut self, command: &EngineCommand) -> EngineResult<EngineHandle> {
        let mut stats = lock(&self.stats);
        stats.last_command = Some(command.clone());
        if stats.failing > 0 {
            stats.failing -= 1;
            return Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "engine binary not found",
            )));
        }
        stats.spawns += 1;
        Ok(EngineHandle::detached(10_000 + stats.spawns, command.port))
    }

    fn terminate(&mut self, _handle: &mut EngineHandle) {
        lock(&self.stats).terminates += 1;
    }
}
