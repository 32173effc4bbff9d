//! petriflow is a discrete-event execution engine for token-flow networks
//! (Petri nets): hierarchical, name-addressable graphs of token-holding
//! places and token-moving transitions, with a combinatorial enabling
//! search, an all-or-nothing commit protocol, and a capacity-bounded
//! flow-conservation variant.
//!
//! The engine lives in [`net`]; [`graph`] derives a renderable node/edge
//! view from a live network through the read-only inspection surface.

pub mod graph;
pub mod net;

pub use net::{
    ArcKind, Bounds, Event, FiringRule, Flow, Net, NetError, NodeId, Place, Role, Weight,
};
