//! The network arena: named ownership hierarchy, typed connector binding,
//! vertex/arc wiring and the all-or-nothing event commit protocol.
use indexmap::IndexMap;
use itertools::Itertools;
use smallvec::SmallVec;
use thiserror::Error;

use crate::net::ids::NodeId;
use crate::net::index_vec::IndexVec;
use crate::net::search::{Event, Flow};
use crate::net::structure::{
    ArcKind, Bounds, Connector, Domains, FiringRule, Members, Node, NodeKind, Place, Role, Weight,
};

#[derive(Debug, Error)]
pub enum NetError {
    #[error("duplicate name {name:?} under {parent:?}")]
    DuplicateName { parent: String, name: String },
    #[error("{child:?} is not a child of {parent:?}")]
    NotOwned { parent: String, child: String },
    #[error("no node at path {path:?}")]
    NotFound { path: String },
    #[error("connector {connector:?} is already bound")]
    AlreadyConnected { connector: String },
    #[error("connector {connector:?} is not bound")]
    NotConnected { connector: String },
    #[error("cannot bind {left} to {right}")]
    TypeMismatch { left: String, right: String },
    #[error("marking at {place:?} would become {tokens}, breaching its bounds")]
    CapacityViolation { place: String, tokens: Weight },
    #[error("pull of {amount} exceeds {tokens} tokens at {place:?}")]
    Underflow {
        place: String,
        amount: Weight,
        tokens: Weight,
    },
    #[error("flow of {total} cannot be conserved by outputs demanding {demand}")]
    FlowConservation { total: Weight, demand: Bounds },
    #[error("batch demands {demand} tokens from {place:?} holding {tokens}")]
    Conflict {
        place: String,
        demand: Weight,
        tokens: Weight,
    },
}

/// A hierarchical token-flow network.
///
/// Every entity — place, transition, arc, connector, nested network — is a
/// [`Node`] in one arena, addressed by [`NodeId`] and by dotted path.
/// Identifiers stay valid for the lifetime of the `Net`; detaching a node
/// only severs its ownership link.
pub struct Net {
    nodes: IndexVec<NodeId, Node>,
    root: NodeId,
}

/// Validated token movement of one or more events, ready to commit.
struct Batch {
    pulls: IndexMap<NodeId, Weight>,
    pushes: IndexMap<NodeId, Weight>,
    outputs: Vec<Event>,
}

impl Net {
    pub fn new(name: impl Into<String>) -> Self {
        let mut nodes = IndexVec::new();
        let root = nodes.push(Node::new(name, NodeKind::Network(Members::default())));
        Self { nodes, root }
    }

    /// The outermost network.
    pub fn root(&self) -> NodeId {
        self.root
    }

    // ------------------------------------------------------------------
    // Namespace
    // ------------------------------------------------------------------

    pub fn name(&self, node: NodeId) -> &str {
        &self.nodes[node].name
    }

    pub fn role(&self, node: NodeId) -> Role {
        self.nodes[node].role()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    /// Dot-joined names from the root down to `node`; globally unique and
    /// always consistent with the current ownership chain.
    pub fn path(&self, node: NodeId) -> String {
        let mut segments: SmallVec<[&str; 8]> = SmallVec::new();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let entry = &self.nodes[id];
            if !entry.name.is_empty() {
                segments.push(entry.name.as_str());
            }
            cursor = entry.parent;
        }
        segments.iter().rev().join(".")
    }

    /// Resolves a dot-separated path by descending through children of
    /// `scope`.
    pub fn find(&self, scope: NodeId, path: &str) -> Result<NodeId, NetError> {
        let mut cursor = scope;
        if path.is_empty() {
            return Err(NetError::NotFound { path: path.into() });
        }
        for segment in path.split('.') {
            cursor = *self.nodes[cursor].children.get(segment).ok_or_else(|| {
                NetError::NotFound { path: path.into() }
            })?;
        }
        Ok(cursor)
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[node].children.values().copied()
    }

    fn attach(&mut self, parent: NodeId, child: NodeId) -> Result<(), NetError> {
        let name = self.nodes[child].name.clone();
        if self.nodes[parent].children.contains_key(&name) {
            return Err(NetError::DuplicateName {
                parent: self.path(parent),
                name,
            });
        }
        self.nodes[parent].children.insert(name, child);
        self.nodes[child].parent = Some(parent);
        self.classify(parent, child, true);
        Ok(())
    }

    /// Detaches `child` from `parent`, clearing ownership. The node itself
    /// stays alive in the arena and may be re-attached.
    pub fn remove(&mut self, parent: NodeId, child: NodeId) -> Result<(), NetError> {
        let name = self.nodes[child].name.clone();
        if self.nodes[parent].children.get(&name) != Some(&child) {
            return Err(NetError::NotOwned {
                parent: self.path(parent),
                child: name,
            });
        }
        self.nodes[parent].children.shift_remove(&name);
        self.nodes[child].parent = None;
        self.classify(parent, child, false);
        Ok(())
    }

    fn classify(&mut self, parent: NodeId, child: NodeId, added: bool) {
        let role = self.nodes[child].role();
        let NodeKind::Network(members) = &mut self.nodes[parent].kind else {
            return;
        };
        let set = match role {
            Role::Place => &mut members.places,
            Role::Transition => &mut members.transitions,
            Role::Arc => &mut members.arcs,
            Role::Network => &mut members.networks,
            Role::Connector | Role::Vertex => return,
        };
        if added {
            set.insert(child);
        } else {
            set.shift_remove(&child);
        }
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn add_network(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId, NetError> {
        let id = self
            .nodes
            .push(Node::new(name, NodeKind::Network(Members::default())));
        self.attach(parent, id)?;
        Ok(id)
    }

    pub fn add_place(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        place: Place,
    ) -> Result<NodeId, NetError> {
        let id = self.nodes.push(Node::new(name, NodeKind::Place(place)));
        self.attach(parent, id)?;
        Ok(id)
    }

    pub fn add_transition(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        rule: FiringRule,
    ) -> Result<NodeId, NetError> {
        let id = self.nodes.push(Node::new(name, NodeKind::Transition(rule)));
        self.attach(parent, id)?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Connectors
    // ------------------------------------------------------------------

    fn connector(&self, id: NodeId) -> Option<&Connector> {
        match &self.nodes[id].kind {
            NodeKind::Connector(connector) => Some(connector),
            _ => None,
        }
    }

    fn connector_mut(&mut self, id: NodeId) -> &mut Connector {
        match &mut self.nodes[id].kind {
            NodeKind::Connector(connector) => connector,
            _ => panic!("node is not a connector"),
        }
    }

    pub fn peer(&self, connector: NodeId) -> Option<NodeId> {
        self.connector(connector).and_then(|c| c.peer)
    }

    /// Creates (or reuses) a typed port on `vertex` scoped to `arc_name`.
    /// An input port receives flow from an arc; an output port feeds one.
    pub fn open(
        &mut self,
        vertex: NodeId,
        arc_name: &str,
        input: bool,
    ) -> Result<NodeId, NetError> {
        if let Some(&existing) = self.nodes[vertex].children.get(arc_name) {
            return match self.nodes[existing].kind {
                NodeKind::Connector(_) => Ok(existing),
                _ => Err(NetError::DuplicateName {
                    parent: self.path(vertex),
                    name: arc_name.into(),
                }),
            };
        }
        let role = self.role(vertex);
        let domains = if input {
            Domains(Role::Arc, role)
        } else {
            Domains(role, Role::Arc)
        };
        let port = self.nodes.push(Node::new(
            arc_name,
            NodeKind::Connector(Connector::new(domains)),
        ));
        self.attach(vertex, port)?;
        Ok(port)
    }

    /// Whether the free side of `connector` accepts the owner of `peer`:
    /// the owner's actual kind must be a subtype of the kind declared for
    /// that side.
    fn accepts(&self, connector: NodeId, peer: NodeId) -> bool {
        let Some(c) = self.connector(connector) else {
            return false;
        };
        let (Some(owner), Some(peer_owner)) = (self.parent(connector), self.parent(peer)) else {
            return false;
        };
        let expected = if self.role(owner).is_a(c.domains.0) {
            c.domains.1
        } else {
            c.domains.0
        };
        self.role(peer_owner).is_a(expected)
    }

    /// Symmetrically binds two connectors. Each side's actual kind must
    /// satisfy the other side's declared domain pair; the check runs in
    /// both directions, and both peers are updated together or not at all.
    pub fn bind(&mut self, a: NodeId, b: NodeId) -> Result<(), NetError> {
        let describe = |net: &Net, id: NodeId| match net.connector(id) {
            Some(c) => format!("{} {}", net.path(id), c.domains),
            None => format!("{} ({})", net.path(id), net.role(id)),
        };
        let (Some(ca), Some(cb)) = (self.connector(a), self.connector(b)) else {
            return Err(NetError::TypeMismatch {
                left: describe(self, a),
                right: describe(self, b),
            });
        };
        for (id, c) in [(a, ca), (b, cb)] {
            if c.connected() {
                return Err(NetError::AlreadyConnected {
                    connector: self.path(id),
                });
            }
        }
        if !(ca.domains.compatible(cb.domains)
            && cb.domains.compatible(ca.domains)
            && self.accepts(a, b)
            && self.accepts(b, a))
        {
            return Err(NetError::TypeMismatch {
                left: describe(self, a),
                right: describe(self, b),
            });
        }
        self.connector_mut(a).peer = Some(b);
        self.connector_mut(b).peer = Some(a);
        Ok(())
    }

    /// Severs a peering from either side; both connectors return to the
    /// unbound state.
    pub fn unbind(&mut self, connector: NodeId) -> Result<(), NetError> {
        let Some(peer) = self.peer(connector) else {
            return Err(NetError::NotConnected {
                connector: self.path(connector),
            });
        };
        self.connector_mut(connector).peer = None;
        self.connector_mut(peer).peer = None;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Wiring
    // ------------------------------------------------------------------

    /// Builds (or reuses) an arc from `source` to `sink` inside `network`,
    /// opening ports on both endpoints as needed. Endpoints must form a
    /// bipartite pair: one place, one transition.
    pub fn connect(
        &mut self,
        network: NodeId,
        source: NodeId,
        sink: NodeId,
        kind: ArcKind,
    ) -> Result<NodeId, NetError> {
        let source_role = self.role(source);
        let sink_role = self.role(sink);
        let bipartite = matches!(
            (source_role, sink_role),
            (Role::Place, Role::Transition) | (Role::Transition, Role::Place)
        );
        if !bipartite {
            return Err(NetError::TypeMismatch {
                left: format!("{} ({})", self.path(source), source_role),
                right: format!("{} ({})", self.path(sink), sink_role),
            });
        }
        if let Some(existing) = self.arc_between(network, source, sink) {
            return Ok(existing);
        }

        let name = format!(
            "{}->{}",
            self.scoped_name(network, source),
            self.scoped_name(network, sink)
        );
        let arc = self.nodes.push(Node::new(name.clone(), NodeKind::Arc(kind)));
        self.attach(network, arc)?;
        let head = self.nodes.push(Node::new(
            "0",
            NodeKind::Connector(Connector::new(Domains(source_role, Role::Arc))),
        ));
        self.attach(arc, head)?;
        let tail = self.nodes.push(Node::new(
            "1",
            NodeKind::Connector(Connector::new(Domains(Role::Arc, sink_role))),
        ));
        self.attach(arc, tail)?;

        let source_port = self.open(source, &name, false)?;
        let sink_port = self.open(sink, &name, true)?;
        self.bind(head, source_port)?;
        self.bind(tail, sink_port)?;
        log::debug!(
            "connected {} -> {} via {}",
            self.path(source),
            self.path(sink),
            self.path(arc)
        );
        Ok(arc)
    }

    /// Unbinds both sides of `arc` and detaches it from `network`. The
    /// endpoint ports stay open for rewiring.
    pub fn disconnect(&mut self, network: NodeId, arc: NodeId) -> Result<(), NetError> {
        let owned = self
            .members(network)
            .is_some_and(|members| members.arcs.contains(&arc));
        if !owned {
            return Err(NetError::NotOwned {
                parent: self.path(network),
                child: self.path(arc),
            });
        }
        for side in ["0", "1"] {
            if let Some(&connector) = self.nodes[arc].children.get(side) {
                if self.peer(connector).is_some() {
                    self.unbind(connector)?;
                }
            }
        }
        self.remove(network, arc)
    }

    /// Name of `node` relative to `network`, with `:` in place of the path
    /// separator so generated arc names stay addressable by `find`.
    fn scoped_name(&self, network: NodeId, node: NodeId) -> String {
        let mut segments: SmallVec<[&str; 8]> = SmallVec::new();
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == network {
                break;
            }
            let entry = &self.nodes[id];
            if !entry.name.is_empty() {
                segments.push(entry.name.as_str());
            }
            cursor = entry.parent;
        }
        segments.iter().rev().join(":")
    }

    fn arc_between(&self, network: NodeId, source: NodeId, sink: NodeId) -> Option<NodeId> {
        self.arcs(network).find(|&arc| {
            self.source(arc) == Some(source) && self.sink(arc) == Some(sink)
        })
    }

    // ------------------------------------------------------------------
    // Derived queries
    // ------------------------------------------------------------------

    pub fn members(&self, network: NodeId) -> Option<&Members> {
        match &self.nodes[network].kind {
            NodeKind::Network(members) => Some(members),
            _ => None,
        }
    }

    pub fn places(&self, network: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.members(network)
            .into_iter()
            .flat_map(|members| members.places.iter().copied())
    }

    pub fn transitions(&self, network: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.members(network)
            .into_iter()
            .flat_map(|members| members.transitions.iter().copied())
    }

    pub fn arcs(&self, network: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.members(network)
            .into_iter()
            .flat_map(|members| members.arcs.iter().copied())
    }

    pub fn networks(&self, network: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.members(network)
            .into_iter()
            .flat_map(|members| members.networks.iter().copied())
    }

    pub fn arc_kind(&self, arc: NodeId) -> Option<ArcKind> {
        match self.nodes[arc].kind {
            NodeKind::Arc(kind) => Some(kind),
            _ => None,
        }
    }

    pub fn rule(&self, transition: NodeId) -> Option<FiringRule> {
        match self.nodes[transition].kind {
            NodeKind::Transition(rule) => Some(rule),
            _ => None,
        }
    }

    fn endpoint(&self, arc: NodeId, side: &str) -> Option<NodeId> {
        let connector = *self.nodes[arc].children.get(side)?;
        let peer = self.peer(connector)?;
        self.parent(peer)
    }

    /// The vertex feeding `arc`, if its input side is bound.
    pub fn source(&self, arc: NodeId) -> Option<NodeId> {
        self.endpoint(arc, "0")
    }

    /// The vertex fed by `arc`, if its output side is bound.
    pub fn sink(&self, arc: NodeId) -> Option<NodeId> {
        self.endpoint(arc, "1")
    }

    pub fn arc_connected(&self, arc: NodeId) -> bool {
        self.source(arc).is_some() && self.sink(arc).is_some()
    }

    fn ports(&self, vertex: NodeId, output: bool) -> SmallVec<[NodeId; 4]> {
        let role = self.role(vertex);
        let mut arcs = SmallVec::new();
        for &child in self.nodes[vertex].children.values() {
            let NodeKind::Connector(connector) = &self.nodes[child].kind else {
                continue;
            };
            // An attached connector is an output port when the vertex
            // matches its source domain.
            if role.is_a(connector.domains.0) != output {
                continue;
            }
            let Some(peer) = connector.peer else {
                continue;
            };
            if let Some(arc) = self.parent(peer) {
                if self.role(arc) == Role::Arc {
                    arcs.push(arc);
                }
            }
        }
        arcs
    }

    /// Arcs currently feeding `vertex`, in port insertion order.
    pub fn inputs(&self, vertex: NodeId) -> SmallVec<[NodeId; 4]> {
        self.ports(vertex, false)
    }

    /// Arcs currently fed by `vertex`, in port insertion order.
    pub fn outputs(&self, vertex: NodeId) -> SmallVec<[NodeId; 4]> {
        self.ports(vertex, true)
    }

    pub(crate) fn collect_transitions(&self, scope: NodeId, out: &mut Vec<NodeId>) {
        if let Some(members) = self.members(scope) {
            out.extend(members.transitions.iter().copied());
            for &sub in &members.networks {
                self.collect_transitions(sub, out);
            }
        }
    }

    // ------------------------------------------------------------------
    // Marking
    // ------------------------------------------------------------------

    pub fn place(&self, id: NodeId) -> Option<&Place> {
        match &self.nodes[id].kind {
            NodeKind::Place(place) => Some(place),
            _ => None,
        }
    }

    fn place_data(&self, id: NodeId) -> Place {
        *self.place(id).expect("node is not a place")
    }

    pub fn tokens(&self, place: NodeId) -> Weight {
        self.place_data(place).tokens
    }

    /// Seeds the marking of a place during network construction.
    pub fn set_tokens(&mut self, place: NodeId, tokens: Weight) -> Result<(), NetError> {
        let data = self.place_data(place);
        if !data.in_bounds(tokens) {
            return Err(NetError::CapacityViolation {
                place: self.path(place),
                tokens,
            });
        }
        match &mut self.nodes[place].kind {
            NodeKind::Place(data) => data.tokens = tokens,
            _ => unreachable!(),
        }
        Ok(())
    }

    pub(crate) fn push_tokens(&mut self, place: NodeId, amount: Weight) -> Result<(), NetError> {
        let data = self.place_data(place);
        let next = data
            .tokens
            .checked_add(amount)
            .filter(|&next| data.in_bounds(next))
            .ok_or_else(|| NetError::CapacityViolation {
                place: self.path(place),
                tokens: data.tokens.saturating_add(amount),
            })?;
        match &mut self.nodes[place].kind {
            NodeKind::Place(data) => data.tokens = next,
            _ => unreachable!(),
        }
        Ok(())
    }

    pub(crate) fn pull_tokens(&mut self, place: NodeId, amount: Weight) -> Result<(), NetError> {
        let data = self.place_data(place);
        if amount > data.tokens {
            return Err(NetError::Underflow {
                place: self.path(place),
                amount,
                tokens: data.tokens,
            });
        }
        let next = data.tokens - amount;
        if !data.in_bounds(next) {
            return Err(NetError::CapacityViolation {
                place: self.path(place),
                tokens: next,
            });
        }
        match &mut self.nodes[place].kind {
            NodeKind::Place(data) => data.tokens = next,
            _ => unreachable!(),
        }
        Ok(())
    }

    /// Whether the proposed flows can all be satisfied from `place` at once.
    pub fn disjoint<'a>(&self, place: NodeId, flows: impl IntoIterator<Item = &'a Flow>) -> bool {
        let demand: Weight = flows
            .into_iter()
            .filter(|flow| flow.source == place)
            .map(|flow| flow.amount)
            .sum();
        demand <= self.tokens(place)
    }

    // ------------------------------------------------------------------
    // Commit protocol
    // ------------------------------------------------------------------

    /// Commits a single event: pulls every input flow, computes the output
    /// flows per the transition's rule, pushes them, and returns the output
    /// event. The whole movement is validated before any marking changes.
    pub fn fire(&mut self, event: &Event) -> Result<Event, NetError> {
        let batch = self.prepare(std::slice::from_ref(event))?;
        let mut outputs = self.commit(batch);
        Ok(outputs.pop().expect("one planned event"))
    }

    /// Batch commit with conflict detection: if any place referenced by more
    /// than one event is oversubscribed the whole batch is rejected and no
    /// marking changes. Otherwise every pull happens before any push.
    pub fn step(&mut self, events: &[Event]) -> Result<Vec<Event>, NetError> {
        let batch = self.prepare(events)?;
        Ok(self.commit(batch))
    }

    fn prepare(&self, events: &[Event]) -> Result<Batch, NetError> {
        // Disjointness first: a place drawn on by more than one event must
        // cover the combined demand, or the whole batch is rejected.
        let mut sharing: IndexMap<NodeId, (Vec<&Flow>, usize)> = IndexMap::new();
        for event in events {
            let mut seen: SmallVec<[NodeId; 4]> = SmallVec::new();
            for flow in event.flows() {
                let entry = sharing.entry(flow.source).or_insert_with(|| (Vec::new(), 0));
                entry.0.push(flow);
                if !seen.contains(&flow.source) {
                    seen.push(flow.source);
                    entry.1 += 1;
                }
            }
        }
        for (&place, (flows, holders)) in &sharing {
            if *holders < 2 {
                continue;
            }
            if !self.disjoint(place, flows.iter().copied()) {
                let demand: Weight = flows.iter().map(|flow| flow.amount).sum();
                let tokens = self.tokens(place);
                log::warn!(
                    "rejecting batch: {demand} demanded from {} holding {tokens}",
                    self.path(place)
                );
                return Err(NetError::Conflict {
                    place: self.path(place),
                    demand,
                    tokens,
                });
            }
        }

        let mut pulls: IndexMap<NodeId, Weight> = IndexMap::new();
        let mut pushes: IndexMap<NodeId, Weight> = IndexMap::new();
        let mut outputs = Vec::with_capacity(events.len());
        for event in events {
            self.check_event(event)?;
            let output = self.produce(event)?;
            for flow in event.flows() {
                *pulls.entry(flow.source).or_default() += flow.amount;
            }
            for flow in output.flows() {
                *pushes.entry(flow.sink).or_default() += flow.amount;
            }
            outputs.push(output);
        }

        for &place in pulls.keys().chain(pushes.keys()).unique() {
            let data = self.place_data(place);
            let pulled = pulls.get(&place).copied().unwrap_or(0);
            let pushed = pushes.get(&place).copied().unwrap_or(0);
            if pulled > data.tokens {
                return Err(NetError::Underflow {
                    place: self.path(place),
                    amount: pulled,
                    tokens: data.tokens,
                });
            }
            // Pulls all land before pushes, so the low-water mark is real.
            let low = data.tokens - pulled;
            if pulled > 0 && low < data.floor() {
                return Err(NetError::CapacityViolation {
                    place: self.path(place),
                    tokens: low,
                });
            }
            let high = low.saturating_add(pushed);
            if pushed > 0 && !data.in_bounds(high) {
                return Err(NetError::CapacityViolation {
                    place: self.path(place),
                    tokens: high,
                });
            }
        }

        Ok(Batch {
            pulls,
            pushes,
            outputs,
        })
    }

    fn check_event(&self, event: &Event) -> Result<(), NetError> {
        if self.rule(event.transition).is_none() {
            return Err(NetError::TypeMismatch {
                left: format!("{} ({})", self.path(event.transition), self.role(event.transition)),
                right: "transition".into(),
            });
        }
        for flow in event.flows() {
            if self.source(flow.arc) != Some(flow.source)
                || self.sink(flow.arc) != Some(flow.sink)
                || self.role(flow.source) != Role::Place
            {
                return Err(NetError::NotConnected {
                    connector: self.path(flow.arc),
                });
            }
            let tokens = self.tokens(flow.source);
            if flow.amount > tokens {
                return Err(NetError::Underflow {
                    place: self.path(flow.source),
                    amount: flow.amount,
                    tokens,
                });
            }
        }
        Ok(())
    }

    /// Computes the output event for one firing: the inflow is distributed
    /// across the connected output arcs according to their demands, in port
    /// insertion order.
    pub(crate) fn produce(&self, event: &Event) -> Result<Event, NetError> {
        let transition = event.transition;
        let inflow = event.total();
        let connected: SmallVec<[NodeId; 4]> = self
            .outputs(transition)
            .into_iter()
            .filter(|&arc| {
                self.arc_connected(arc)
                    && self.sink(arc).is_some_and(|sink| self.role(sink) == Role::Place)
            })
            .collect();
        let demands: SmallVec<[Bounds; 4]> = connected
            .iter()
            .map(|&arc| self.arc_demand(arc))
            .collect();
        let amounts = crate::net::flow::assign(inflow, &demands).inspect_err(|_| {
            log::warn!(
                "{} cannot conserve an inflow of {inflow}",
                self.path(transition)
            );
        })?;
        let mut output = Event::new(transition);
        for (&arc, &amount) in connected.iter().zip(amounts.iter()) {
            if amount == 0 {
                continue;
            }
            let sink = self.sink(arc).expect("connected arc has a sink");
            output.push(Flow {
                arc,
                source: transition,
                sink,
                amount,
            });
        }
        Ok(output)
    }

    fn commit(&mut self, batch: Batch) -> Vec<Event> {
        for (&place, &amount) in &batch.pulls {
            self.pull_tokens(place, amount)
                .expect("pre-validated pull cannot fail");
        }
        for (&place, &amount) in &batch.pushes {
            self.push_tokens(place, amount)
                .expect("pre-validated push cannot fail");
        }
        for event in &batch.outputs {
            log::debug!(
                "fired {} moving {} tokens",
                self.path(event.transition),
                event.total()
            );
        }
        batch.outputs
    }
}
