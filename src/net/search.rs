//! Enabling search: flows, events, and the lazy combinatorial generator
//! that enumerates a transition's candidate firings.
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::net::core::Net;
use crate::net::ids::NodeId;
use crate::net::structure::{ArcKind, FiringRule, Role, Weight};

/// One proposed token movement across one arc, resolved source to sink.
/// Immutable and transient: discarded unless committed as part of an
/// [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow {
    pub arc: NodeId,
    pub source: NodeId,
    pub sink: NodeId,
    pub amount: Weight,
}

/// The flows of one transition firing, keyed by originating arc. Produced
/// transiently by search; becomes a state mutation only when committed via
/// [`Net::fire`] or [`Net::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub transition: NodeId,
    flows: IndexMap<NodeId, Flow>,
}

impl Event {
    pub fn new(transition: NodeId) -> Self {
        Self {
            transition,
            flows: IndexMap::new(),
        }
    }

    pub fn push(&mut self, flow: Flow) {
        self.flows.insert(flow.arc, flow);
    }

    pub fn flow(&self, arc: NodeId) -> Option<&Flow> {
        self.flows.get(&arc)
    }

    pub fn flows(&self) -> impl Iterator<Item = &Flow> {
        self.flows.values()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Total number of tokens this event moves.
    pub fn total(&self) -> Weight {
        self.flows.values().map(|flow| flow.amount).sum()
    }
}

impl Net {
    /// Candidate amounts `arc` could carry right now, largest first: a
    /// weighted arc offers exactly its weight when the source place can
    /// cover it, an elastic arc offers every pullable amount.
    pub fn candidates(&self, arc: NodeId) -> SmallVec<[Weight; 8]> {
        let (Some(kind), Some(source)) = (self.arc_kind(arc), self.source(arc)) else {
            return SmallVec::new();
        };
        if self.sink(arc).is_none() || self.role(source) != Role::Place {
            return SmallVec::new();
        }
        let available = self
            .place(source)
            .map(|place| place.available())
            .unwrap_or(0);
        match kind {
            ArcKind::Weighted(weight) => {
                if weight > 0 && available >= weight {
                    SmallVec::from_slice(&[weight])
                } else {
                    SmallVec::new()
                }
            }
            ArcKind::Elastic => (1..=available).rev().collect(),
        }
    }

    /// Pure enabling predicate; never mutates and never errors — an event
    /// that does not satisfy the rule is simply not enabled.
    pub fn enabled(&self, transition: NodeId, event: &Event) -> bool {
        if event.is_empty() {
            return false;
        }
        match self.rule(transition) {
            None => false,
            // An AND-join needs every connected input arc in the event.
            Some(FiringRule::Join) => {
                let connected = self
                    .inputs(transition)
                    .into_iter()
                    .filter(|&arc| self.arc_connected(arc))
                    .count();
                event.len() == connected
            }
            Some(FiringRule::Conserve) => self.demand(transition).admits(event.total()),
        }
    }

    /// Lazy enumeration of the enabling events of one transition.
    pub fn transition_search(&self, transition: NodeId) -> Search<'_> {
        Search::new(self, transition)
    }

    /// Every event obtainable from any transition under `scope`, nested
    /// sub-networks included. Repeated calls against an unchanged network
    /// yield equivalent sequences.
    pub fn search(&self, scope: NodeId) -> impl Iterator<Item = Event> + '_ {
        let mut transitions = Vec::new();
        self.collect_transitions(scope, &mut transitions);
        transitions
            .into_iter()
            .flat_map(move |transition| self.transition_search(transition))
    }
}

/// Iterator over the candidate events of one transition: every way of
/// picking exactly one candidate flow per arc, for every non-empty subset
/// of the input arcs, filtered by the enabling predicate. Combinations are
/// generated on demand; nothing is materialized beyond the per-arc
/// candidate rows, and iteration never mutates the network.
pub struct Search<'net> {
    net: &'net Net,
    transition: NodeId,
    arcs: SmallVec<[NodeId; 4]>,
    rows: SmallVec<[SmallVec<[Weight; 8]>; 4]>,
    mask: u64,
    picks: SmallVec<[usize; 8]>,
}

impl<'net> Search<'net> {
    fn new(net: &'net Net, transition: NodeId) -> Self {
        let mut arcs: SmallVec<[NodeId; 4]> = SmallVec::new();
        let mut rows: SmallVec<[SmallVec<[Weight; 8]>; 4]> = SmallVec::new();
        for arc in net.inputs(transition) {
            if !net.arc_connected(arc) {
                continue;
            }
            let row = net.candidates(arc);
            if row.is_empty() {
                continue;
            }
            arcs.push(arc);
            rows.push(row);
        }
        if arcs.len() > 63 {
            log::warn!(
                "enabling search over {} truncated to 63 input arcs",
                net.path(transition)
            );
            arcs.truncate(63);
            rows.truncate(63);
        }
        Self {
            net,
            transition,
            arcs,
            rows,
            mask: 0,
            picks: SmallVec::new(),
        }
    }

    fn reset_picks(&mut self) {
        self.picks.clear();
        self.picks.resize(self.mask.count_ones() as usize, 0);
    }

    /// Moves to the next selection; returns false once the space is spent.
    fn advance(&mut self) -> bool {
        let limit = 1u64 << self.arcs.len();
        if self.mask == 0 {
            if self.arcs.is_empty() {
                return false;
            }
            self.mask = 1;
            self.reset_picks();
            return true;
        }
        // Odometer over the candidate rows selected by the current mask.
        let mut slot = 0;
        for (idx, row) in self.rows.iter().enumerate() {
            if self.mask & (1 << idx) == 0 {
                continue;
            }
            if self.picks[slot] + 1 < row.len() {
                self.picks[slot] += 1;
                for lower in &mut self.picks[..slot] {
                    *lower = 0;
                }
                return true;
            }
            slot += 1;
        }
        self.mask += 1;
        if self.mask >= limit {
            return false;
        }
        self.reset_picks();
        true
    }

    fn current(&self) -> Event {
        let mut event = Event::new(self.transition);
        let mut slot = 0;
        for (idx, &arc) in self.arcs.iter().enumerate() {
            if self.mask & (1 << idx) == 0 {
                continue;
            }
            let amount = self.rows[idx][self.picks[slot]];
            slot += 1;
            let source = self.net.source(arc).expect("searched arc is connected");
            let sink = self.net.sink(arc).expect("searched arc is connected");
            event.push(Flow {
                arc,
                source,
                sink,
                amount,
            });
        }
        event
    }
}

impl Iterator for Search<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        while self.advance() {
            let event = self.current();
            if self.net.enabled(self.transition, &event) {
                return Some(event);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::{ArcKind, FiringRule, Place};

    fn conserve_pair(tokens: Weight) -> (Net, NodeId) {
        let mut net = Net::new("net");
        let root = net.root();
        let a = net.add_place(root, "a", Place::with_tokens(tokens)).unwrap();
        let b = net.add_place(root, "b", Place::with_tokens(tokens)).unwrap();
        let out = net.add_place(root, "out", Place::new()).unwrap();
        let t = net.add_transition(root, "t", FiringRule::Conserve).unwrap();
        net.connect(root, a, t, ArcKind::Elastic).unwrap();
        net.connect(root, b, t, ArcKind::Elastic).unwrap();
        net.connect(root, t, out, ArcKind::Elastic).unwrap();
        (net, t)
    }

    #[test]
    fn search_spans_all_selections() {
        // One candidate per arc: the three non-empty subsets of {a, b}.
        let (net, t) = conserve_pair(1);
        assert_eq!(net.transition_search(t).count(), 3);

        // Two candidates per arc: 2 + 2 + 4 selections.
        let (net, t) = conserve_pair(2);
        assert_eq!(net.transition_search(t).count(), 8);
    }

    #[test]
    fn search_is_idempotent() {
        let (net, t) = conserve_pair(2);
        let first: Vec<Event> = net.transition_search(t).collect();
        let second: Vec<Event> = net.transition_search(t).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn elastic_candidates_descend() {
        let (net, t) = conserve_pair(3);
        let arc = net.inputs(t)[0];
        assert_eq!(net.candidates(arc).as_slice(), &[3, 2, 1]);
    }

    #[test]
    fn bounded_floor_limits_candidates() {
        let mut net = Net::new("net");
        let root = net.root();
        let a = net
            .add_place(root, "a", Place::bounded(3, Some(2), None))
            .unwrap();
        let t = net.add_transition(root, "t", FiringRule::Conserve).unwrap();
        let arc = net.connect(root, a, t, ArcKind::Elastic).unwrap();
        assert_eq!(net.candidates(arc).as_slice(), &[1]);
    }

    #[test]
    fn join_requires_full_coverage() {
        let mut net = Net::new("net");
        let root = net.root();
        let a = net.add_place(root, "a", Place::with_tokens(1)).unwrap();
        let b = net.add_place(root, "b", Place::new()).unwrap();
        let c = net.add_place(root, "c", Place::new()).unwrap();
        let t = net.add_transition(root, "t", FiringRule::Join).unwrap();
        net.connect(root, a, t, ArcKind::Weighted(1)).unwrap();
        net.connect(root, b, t, ArcKind::Weighted(1)).unwrap();
        net.connect(root, t, c, ArcKind::Weighted(2)).unwrap();

        // `b` is empty, so no selection can cover both input arcs.
        assert_eq!(net.transition_search(t).count(), 0);

        net.set_tokens(b, 1).unwrap();
        let events: Vec<Event> = net.transition_search(t).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].len(), 2);
        assert_eq!(events[0].total(), 2);
    }

    #[test]
    fn conserve_filters_by_demand() {
        let mut net = Net::new("net");
        let root = net.root();
        let a = net.add_place(root, "a", Place::with_tokens(5)).unwrap();
        let out = net
            .add_place(root, "out", Place::bounded(0, None, Some(2)))
            .unwrap();
        let t = net.add_transition(root, "t", FiringRule::Conserve).unwrap();
        net.connect(root, a, t, ArcKind::Elastic).unwrap();
        net.connect(root, t, out, ArcKind::Elastic).unwrap();

        // Demand is 0..2, so inflows of 5, 4 and 3 are not enabling.
        let totals: Vec<Weight> = net
            .transition_search(t)
            .map(|event| event.total())
            .collect();
        assert_eq!(totals, vec![2, 1]);
    }

    #[test]
    fn search_skips_disconnected_arcs() {
        let mut net = Net::new("net");
        let root = net.root();
        let a = net.add_place(root, "a", Place::with_tokens(1)).unwrap();
        let b = net.add_place(root, "b", Place::new()).unwrap();
        let t = net.add_transition(root, "t", FiringRule::Join).unwrap();
        let arc = net.connect(root, a, t, ArcKind::Weighted(1)).unwrap();
        net.connect(root, t, b, ArcKind::Weighted(1)).unwrap();

        net.disconnect(root, arc).unwrap();
        assert_eq!(net.transition_search(t).count(), 0);
    }
}
