//! Flow-conservation scenarios: demand-driven distribution across bounded
//! counters, admission control, and the conservation law.
use anyhow::Result;

use petriflow::net::{ArcKind, Event, FiringRule, Net, NodeId, Place, Weight};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn assert_in_bounds(net: &Net, place: NodeId) {
    let data = net.place(place).expect("place");
    assert!(data.tokens >= data.minimum.unwrap_or(0));
    if let Some(max) = data.maximum {
        assert!(data.tokens <= max);
    }
}

#[test]
fn inflow_is_distributed_minimums_first_in_order() -> Result<()> {
    init_logging();
    let mut net = Net::new("flow");
    let root = net.root();
    let source = net.add_place(root, "source", Place::with_tokens(4))?;
    let narrow = net.add_place(root, "narrow", Place::bounded(0, None, Some(3)))?;
    let hungry = net.add_place(root, "hungry", Place::bounded(0, Some(1), None))?;
    let gate = net.add_transition(root, "gate", FiringRule::Conserve)?;
    net.connect(root, source, gate, ArcKind::Elastic)?;
    net.connect(root, gate, narrow, ArcKind::Elastic)?;
    net.connect(root, gate, hungry, ArcKind::Elastic)?;

    // Candidates descend, so the first enabled event moves all four tokens.
    let event = net.search(root).next().expect("an enabled event");
    assert_eq!(event.total(), 4);
    let output = net.fire(&event)?;

    // Conservation: everything pulled was pushed.
    let produced: Weight = output.flows().map(|flow| flow.amount).sum();
    assert_eq!(produced, 4);
    assert_eq!(net.tokens(source), 0);
    assert_eq!(net.tokens(narrow), 3);
    assert_eq!(net.tokens(hungry), 1);
    for place in [source, narrow, hungry] {
        assert_in_bounds(&net, place);
    }
    Ok(())
}

#[test]
fn full_sinks_quiesce_the_gate() -> Result<()> {
    init_logging();
    let mut net = Net::new("flow");
    let root = net.root();
    let source = net.add_place(root, "source", Place::with_tokens(5))?;
    let sink = net.add_place(root, "sink", Place::bounded(0, None, Some(2)))?;
    let gate = net.add_transition(root, "gate", FiringRule::Conserve)?;
    net.connect(root, source, gate, ArcKind::Elastic)?;
    net.connect(root, gate, sink, ArcKind::Elastic)?;

    // Only inflows the sink can absorb are enabling.
    let totals: Vec<Weight> = net.search(root).map(|event| event.total()).collect();
    assert_eq!(totals, vec![2, 1]);

    let event = net.search(root).next().expect("an enabled event");
    net.fire(&event)?;
    assert_eq!(net.tokens(sink), 2);
    assert_eq!(net.tokens(source), 3);

    // The sink is full; the leftover supply has nowhere to go.
    assert_eq!(net.search(root).count(), 0);
    Ok(())
}

#[test]
fn stale_events_cannot_break_conservation() -> Result<()> {
    init_logging();
    let mut net = Net::new("flow");
    let root = net.root();
    let source = net.add_place(root, "source", Place::with_tokens(3))?;
    let sink = net.add_place(root, "sink", Place::bounded(0, None, Some(3)))?;
    let gate = net.add_transition(root, "gate", FiringRule::Conserve)?;
    net.connect(root, source, gate, ArcKind::Elastic)?;
    net.connect(root, gate, sink, ArcKind::Elastic)?;

    let events: Vec<Event> = net.search(root).collect();
    let biggest = &events[0];
    assert_eq!(biggest.total(), 3);

    // The sink fills up after the search; the stale event no longer fits
    // and must be rejected without touching the source.
    net.set_tokens(sink, 3)?;
    assert!(net.fire(biggest).is_err());
    assert_eq!(net.tokens(source), 3);
    assert_eq!(net.tokens(sink), 3);
    Ok(())
}

#[test]
fn counters_refill_to_their_floor() -> Result<()> {
    init_logging();
    let mut net = Net::new("flow");
    let root = net.root();
    let source = net.add_place(root, "source", Place::with_tokens(2))?;
    // Below its floor: the place demands at least one token before
    // anything else may top it up further.
    let depleted = net.add_place(root, "depleted", Place::bounded(0, Some(1), Some(2)))?;
    let gate = net.add_transition(root, "gate", FiringRule::Conserve)?;
    net.connect(root, source, gate, ArcKind::Elastic)?;
    net.connect(root, gate, depleted, ArcKind::Elastic)?;

    let event = net.search(root).next().expect("an enabled event");
    assert_eq!(event.total(), 2);
    net.fire(&event)?;
    assert_eq!(net.tokens(depleted), 2);
    assert_in_bounds(&net, depleted);
    Ok(())
}
