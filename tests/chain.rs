//! Linear pipeline: one token walks a chain of places until the network
//! exhausts itself.
use anyhow::Result;

use petriflow::net::{ArcKind, Event, FiringRule, Net, Place};

#[test]
fn token_walks_the_chain_to_exhaustion() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut net = Net::new("chain");
    let root = net.root();
    let a = net.add_place(root, "a", Place::with_tokens(1))?;
    let b = net.add_place(root, "b", Place::new())?;
    let c = net.add_place(root, "c", Place::new())?;
    let t1 = net.add_transition(root, "t1", FiringRule::Join)?;
    let t2 = net.add_transition(root, "t2", FiringRule::Join)?;
    for (source, sink) in [(a, t1), (t1, b), (b, t2), (t2, c)] {
        net.connect(root, source, sink, ArcKind::Weighted(1))?;
    }

    // First fire: a -> b.
    let events: Vec<Event> = net.search(root).collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].transition, t1);
    let output = net.fire(&events[0])?;
    assert_eq!(output.total(), 1);
    assert_eq!((net.tokens(a), net.tokens(b), net.tokens(c)), (0, 1, 0));

    // Second fire: b -> c.
    let events: Vec<Event> = net.search(root).collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].transition, t2);
    net.fire(&events[0])?;
    assert_eq!((net.tokens(a), net.tokens(b), net.tokens(c)), (0, 0, 1));

    // The exhausted network searches empty, and stays empty.
    assert_eq!(net.search(root).count(), 0);
    assert_eq!(net.search(root).count(), 0);
    Ok(())
}
