//! In-memory edge network.
//!
//! # Data layout
//!
//! Edges are stored in insertion order.  The 1-D coordinate of an edge's
//! start is the sum of the lengths of all edges added before it, so a ring
//! built edge by edge maps onto `[0, length)` without gaps:
//!
//! ```text
//! x(edge, pos) = edge_start[edge] + pos
//! ```
//!
//! Routes are keyed by their first edge, matching the engine convention of
//! one named route per starting edge.

use rustc_hash::FxHashMap;

use tc_core::EdgeId;

use crate::view::{ScenarioView, StartSlot, StartingPositions};
use crate::{ScenarioError, ScenarioResult};

struct EdgeInfo {
    id:     EdgeId,
    length: f64,
    lanes:  usize,
    start:  f64,
}

// ── EdgeNetwork ───────────────────────────────────────────────────────────────

/// A set of edges laid end to end in a 1-D coordinate space, plus named
/// routes.  Build with [`EdgeNetworkBuilder`].
pub struct EdgeNetwork {
    name:   String,
    edges:  Vec<EdgeInfo>,
    index:  FxHashMap<EdgeId, usize>,
    routes: FxHashMap<EdgeId, Vec<EdgeId>>,
    length: f64,
}

impl EdgeNetwork {
    /// A closed ring of `edge_count` equal edges named `e0`, `e1`, ….
    ///
    /// Each edge gets a route that goes once around the ring starting on it.
    pub fn ring(
        name: impl Into<String>,
        edge_count: usize,
        edge_length: f64,
        lanes: usize,
    ) -> ScenarioResult<Self> {
        let ids: Vec<EdgeId> = (0..edge_count).map(|i| EdgeId::new(format!("e{i}"))).collect();
        let mut b = EdgeNetworkBuilder::new(name);
        for id in &ids {
            b = b.add_edge(id.clone(), edge_length, lanes);
        }
        for i in 0..ids.len() {
            let route: Vec<EdgeId> =
                ids[i..].iter().chain(ids[..i].iter()).cloned().collect();
            b = b.add_route(ids[i].clone(), route);
        }
        b.build()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edge ids in 1-D order.
    pub fn edges(&self) -> impl Iterator<Item = &EdgeId> + '_ {
        self.edges.iter().map(|e| &e.id)
    }

    /// Inverse of `absolute_position`: the edge and lane-relative position
    /// of 1-D coordinate `x`, wrapped into `[0, length)`.
    pub fn locate(&self, x: f64) -> Option<(&EdgeId, f64)> {
        if self.edges.is_empty() || self.length <= 0.0 {
            return None;
        }
        let x = x.rem_euclid(self.length);
        // Last edge whose start is <= x.
        let i = self.edges.partition_point(|e| e.start <= x).saturating_sub(1);
        let e = &self.edges[i];
        Some((&e.id, (x - e.start).min(e.length)))
    }

    fn info(&self, edge: &EdgeId) -> Option<&EdgeInfo> {
        self.index.get(edge).map(|&i| &self.edges[i])
    }
}

impl ScenarioView for EdgeNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn length(&self) -> f64 {
        self.length
    }

    fn edge_length(&self, edge: &EdgeId) -> Option<f64> {
        self.info(edge).map(|e| e.length)
    }

    fn num_lanes(&self, edge: &EdgeId) -> Option<usize> {
        self.info(edge).map(|e| e.lanes)
    }

    fn absolute_position(&self, edge: &EdgeId, position: f64) -> Option<f64> {
        self.info(edge).map(|e| e.start + position)
    }

    /// Even spacing over the whole network.
    ///
    /// Vehicles fill the lanes of a slot before moving on to the next slot,
    /// using the smallest lane count of any edge so every slot is valid on
    /// whichever edge it lands.
    fn generate_starting_positions(
        &self,
        count: usize,
        x0: f64,
    ) -> ScenarioResult<StartingPositions> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if self.edges.is_empty() || self.length <= 0.0 {
            return Err(ScenarioError::EmptyNetwork(count));
        }
        let lanes = self.edges.iter().map(|e| e.lanes).min().unwrap_or(1).max(1);
        let per_lane = count.div_ceil(lanes);
        let spacing = self.length / per_lane as f64;

        let mut slots = Vec::with_capacity(count);
        for i in 0..count {
            let x = x0 + (i / lanes) as f64 * spacing;
            let Some((edge, position)) = self.locate(x) else {
                return Err(ScenarioError::EmptyNetwork(count));
            };
            slots.push(StartSlot { edge: edge.clone(), position, lane: i % lanes });
        }
        Ok(slots)
    }

    fn route_from(&self, edge: &EdgeId) -> Option<&[EdgeId]> {
        self.routes.get(edge).map(Vec::as_slice)
    }
}

// ── EdgeNetworkBuilder ────────────────────────────────────────────────────────

/// Construct an [`EdgeNetwork`], then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use tc_core::EdgeId;
/// use tc_scenario::{EdgeNetworkBuilder, ScenarioView};
///
/// let net = EdgeNetworkBuilder::new("line")
///     .add_edge("a", 100.0, 2)
///     .add_edge("b", 50.0, 1)
///     .add_route("a", ["a", "b"])
///     .build()
///     .unwrap();
/// assert_eq!(net.length(), 150.0);
/// assert_eq!(net.absolute_position(&EdgeId::from("b"), 10.0), Some(110.0));
/// ```
pub struct EdgeNetworkBuilder {
    name:   String,
    edges:  Vec<(EdgeId, f64, usize)>,
    routes: Vec<(EdgeId, Vec<EdgeId>)>,
}

impl EdgeNetworkBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), edges: Vec::new(), routes: Vec::new() }
    }

    /// Append an edge of `length` metres with `lanes` lanes.
    pub fn add_edge(mut self, id: impl Into<EdgeId>, length: f64, lanes: usize) -> Self {
        self.edges.push((id.into(), length, lanes));
        self
    }

    /// Register the named route starting on `edge`.
    pub fn add_route<I, E>(mut self, edge: impl Into<EdgeId>, route: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EdgeId>,
    {
        self.routes.push((edge.into(), route.into_iter().map(Into::into).collect()));
        self
    }

    /// Validate and lay out the network.
    ///
    /// Fails on duplicate edges, non-positive lengths, zero-lane edges, and
    /// routes that reference unknown edges or do not start on their key edge.
    pub fn build(self) -> ScenarioResult<EdgeNetwork> {
        let mut edges = Vec::with_capacity(self.edges.len());
        let mut index = FxHashMap::default();
        let mut length = 0.0;

        for (id, edge_len, lanes) in self.edges {
            if !(edge_len > 0.0) {
                return Err(ScenarioError::InvalidEdge {
                    edge:   id,
                    reason: format!("length must be positive, got {edge_len}"),
                });
            }
            if lanes == 0 {
                return Err(ScenarioError::InvalidEdge {
                    edge:   id,
                    reason: "needs at least one lane".into(),
                });
            }
            if index.contains_key(&id) {
                return Err(ScenarioError::DuplicateEdge(id));
            }
            index.insert(id.clone(), edges.len());
            edges.push(EdgeInfo { id, length: edge_len, lanes, start: length });
            length += edge_len;
        }

        let mut routes = FxHashMap::default();
        for (key, route) in self.routes {
            if route.first() != Some(&key) {
                return Err(ScenarioError::RouteStart(key));
            }
            if let Some(bad) = route.iter().find(|e| !index.contains_key(*e)) {
                return Err(ScenarioError::UnknownEdge(bad.clone()));
            }
            routes.insert(key, route);
        }

        Ok(EdgeNetwork { name: self.name, edges, index, routes, length })
    }
}
