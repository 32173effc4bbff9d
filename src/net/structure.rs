//! Static structure of a token-flow network: roles, domains, places,
//! transitions, arcs, connectors and the node arena entry.
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::net::ids::NodeId;

pub type Weight = u64;

/// Classification of a node, forming a small subtype lattice: `Place`,
/// `Transition` and `Network` are all kinds of `Vertex`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Vertex,
    Place,
    Transition,
    Network,
    Arc,
    Connector,
}

impl Role {
    /// Subtype-or-equal test used by connector domain checks.
    pub fn is_a(self, other: Role) -> bool {
        self == other
            || (other == Role::Vertex
                && matches!(self, Role::Place | Role::Transition | Role::Network))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Vertex => "vertex",
            Role::Place => "place",
            Role::Transition => "transition",
            Role::Network => "network",
            Role::Arc => "arc",
            Role::Connector => "connector",
        };
        f.write_str(label)
    }
}

/// Declared `(source kind, sink kind)` pair of a connector: the directed
/// link it participates in accepts exactly these roles on its two ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domains(pub Role, pub Role);

impl Domains {
    /// Bidirectional compatibility: our source side must satisfy theirs and
    /// their sink side must satisfy ours.
    pub fn compatible(self, other: Domains) -> bool {
        self.0.is_a(other.0) && other.1.is_a(self.1)
    }
}

impl fmt::Display for Domains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

/// An inclusive lower bound and optional upper bound on a token quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub minimum: Weight,
    pub maximum: Option<Weight>,
}

impl Bounds {
    pub fn new(minimum: Weight, maximum: Option<Weight>) -> Self {
        Self { minimum, maximum }
    }

    /// Bounds admitting exactly one quantity.
    pub fn exact(amount: Weight) -> Self {
        Self {
            minimum: amount,
            maximum: Some(amount),
        }
    }

    pub fn admits(&self, amount: Weight) -> bool {
        amount >= self.minimum && self.maximum.is_none_or(|max| amount <= max)
    }

    /// Componentwise sum; an unbounded side stays unbounded.
    pub fn widen(&self, other: Bounds) -> Bounds {
        Bounds {
            minimum: self.minimum + other.minimum,
            maximum: match (self.maximum, other.maximum) {
                (Some(a), Some(b)) => Some(a + b),
                _ => None,
            },
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.maximum {
            Some(max) => write!(f, "{}..{}", self.minimum, max),
            None => write!(f, "{}..", self.minimum),
        }
    }
}

/// Token store of a place. Classic places leave both bounds unset; the
/// flow-conservation variant sets one or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Place {
    pub tokens: Weight,
    pub minimum: Option<Weight>,
    pub maximum: Option<Weight>,
}

impl Place {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: Weight) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn bounded(tokens: Weight, minimum: Option<Weight>, maximum: Option<Weight>) -> Self {
        Self {
            tokens,
            minimum,
            maximum,
        }
    }

    pub fn floor(&self) -> Weight {
        self.minimum.unwrap_or(0)
    }

    /// Tokens that may still be pulled without breaching the lower bound.
    pub fn available(&self) -> Weight {
        self.tokens.saturating_sub(self.floor())
    }

    /// Residual demand of this place seen from an incoming elastic arc:
    /// at least enough to reach the lower bound, at most up to the upper.
    pub fn residual(&self) -> Bounds {
        Bounds {
            minimum: self.floor().saturating_sub(self.tokens),
            maximum: self.maximum.map(|max| max.saturating_sub(self.tokens)),
        }
    }

    pub fn in_bounds(&self, tokens: Weight) -> bool {
        tokens >= self.floor() && self.maximum.is_none_or(|max| tokens <= max)
    }
}

/// Firing discipline of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiringRule {
    /// Fire only when every input arc supplies its weight; each output arc
    /// receives its weight, and inflow must equal outflow exactly.
    Join,
    /// Fire when the inflow fits the aggregate residual demand of the
    /// outputs; the inflow is then distributed across them in order.
    Conserve,
}

/// Flow capacity discipline of an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcKind {
    /// Fixed flow: every traversal moves exactly this many tokens.
    Weighted(Weight),
    /// Demand-driven flow, bounded by the residuals of the sink place.
    Elastic,
}

/// One half of a peering between two nodes. Never owns its peer.
#[derive(Debug, Clone)]
pub struct Connector {
    pub domains: Domains,
    pub peer: Option<NodeId>,
}

impl Connector {
    pub fn new(domains: Domains) -> Self {
        Self {
            domains,
            peer: None,
        }
    }

    pub fn connected(&self) -> bool {
        self.peer.is_some()
    }
}

/// Classified membership of a network, maintained incrementally as children
/// are added and removed. Sets are insertion-ordered; that order is the
/// deterministic iteration order of every derived query.
#[derive(Debug, Clone, Default)]
pub struct Members {
    pub places: IndexSet<NodeId>,
    pub transitions: IndexSet<NodeId>,
    pub arcs: IndexSet<NodeId>,
    pub networks: IndexSet<NodeId>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Place(Place),
    Transition(FiringRule),
    Arc(ArcKind),
    Connector(Connector),
    Network(Members),
}

impl NodeKind {
    pub fn role(&self) -> Role {
        match self {
            NodeKind::Place(_) => Role::Place,
            NodeKind::Transition(_) => Role::Transition,
            NodeKind::Arc(_) => Role::Arc,
            NodeKind::Connector(_) => Role::Connector,
            NodeKind::Network(_) => Role::Network,
        }
    }
}

/// Arena entry: a named node with an optional owner and insertion-ordered
/// children, classified by [`NodeKind`].
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: IndexMap<String, NodeId>,
    pub kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: IndexMap::new(),
            kind,
        }
    }

    pub fn role(&self) -> Role {
        self.kind.role()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_lattice() {
        assert!(Role::Place.is_a(Role::Vertex));
        assert!(Role::Transition.is_a(Role::Vertex));
        assert!(Role::Network.is_a(Role::Vertex));
        assert!(Role::Arc.is_a(Role::Arc));
        assert!(!Role::Arc.is_a(Role::Vertex));
        assert!(!Role::Vertex.is_a(Role::Place));
    }

    #[test]
    fn domain_compatibility_is_directional() {
        let port = Domains(Role::Place, Role::Arc);
        let arc_side = Domains(Role::Place, Role::Arc);
        assert!(port.compatible(arc_side));

        let wrong = Domains(Role::Transition, Role::Arc);
        assert!(!wrong.compatible(arc_side));
        assert!(!arc_side.compatible(wrong));
    }

    #[test]
    fn residual_tracks_marking() {
        let place = Place::bounded(1, Some(1), Some(3));
        assert_eq!(place.residual(), Bounds::new(0, Some(2)));
        assert_eq!(place.available(), 0);

        let empty = Place::bounded(0, Some(1), None);
        assert_eq!(empty.residual(), Bounds::new(1, None));
    }

    #[test]
    fn bounds_widen_propagates_unbounded() {
        let a = Bounds::new(1, Some(2));
        let b = Bounds::new(0, None);
        assert_eq!(a.widen(b), Bounds::new(1, None));
        assert_eq!(a.widen(Bounds::exact(3)), Bounds::new(4, Some(5)));
        assert_eq!(format!("{}", a.widen(b)), "1..");
    }
}
