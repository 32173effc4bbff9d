//! # Token-flow network core
//!
//! A network is a bipartite graph of places `P` and transitions `T`, wired
//! by directed arcs and organized in a name-addressable ownership tree
//! (networks may nest). For a marking `M ∈ ℕ^{|P|}`:
//!
//! * an **event** of a transition `t ∈ T` selects one candidate flow per
//!   arc over some non-empty subset of `t`'s input arcs; it is **enabling**
//!   when `t`'s rule admits it — a `Join` requires the full input set at
//!   each arc's weight, a `Conserve` requires the inflow to fit the
//!   aggregate residual demand of the outputs;
//! * **firing** an event pulls every input flow from its source place,
//!   distributes the inflow over the output arcs (exact weights, or ordered
//!   round-robin assignment under residual bounds), and pushes the results,
//!   as one atomic, pre-validated movement;
//! * a **batch step** additionally rejects event sets whose combined demand
//!   oversubscribes any shared place, and runs every pull before any push.
//!
//! Execution is single-threaded and synchronous; simultaneity of enabled
//! events is a property of the model, not of the runtime. Selection among
//! them is the caller's policy (see [`sim`]).
//!
//! ## Example
//!
//! ```rust
//! use petriflow::net::{ArcKind, FiringRule, Net, Place};
//!
//! let mut net = Net::new("demo");
//! let root = net.root();
//! let a = net.add_place(root, "a", Place::with_tokens(1)).unwrap();
//! let b = net.add_place(root, "b", Place::new()).unwrap();
//! let t = net.add_transition(root, "t", FiringRule::Join).unwrap();
//! net.connect(root, a, t, ArcKind::Weighted(1)).unwrap();
//! net.connect(root, t, b, ArcKind::Weighted(1)).unwrap();
//!
//! let events: Vec<_> = net.search(root).collect();
//! assert_eq!(events.len(), 1);
//! net.fire(&events[0]).unwrap();
//! assert_eq!((net.tokens(a), net.tokens(b)), (0, 1));
//! ```

pub mod core;
pub mod flow;
pub mod ids;
pub mod index_vec;
pub mod io;
pub mod search;
pub mod sim;
pub mod structure;

pub use self::core::{Net, NetError};
pub use flow::assign;
pub use ids::NodeId;
pub use index_vec::{Idx, IndexVec};
pub use io::{IoError, Snapshot, SnapshotEdge, SnapshotNode};
pub use search::{Event, Flow, Search};
pub use structure::{
    ArcKind, Bounds, Connector, Domains, FiringRule, Members, Node, NodeKind, Place, Role, Weight,
};
