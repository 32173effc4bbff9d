//! Caller-side firing policies. Which enabled event fires when several are
//! available is not the engine's decision (§5 of the module docs); these
//! helpers implement the common random policy over an explicit RNG so runs
//! stay reproducible under a seeded generator.
use rand::Rng;

use crate::net::core::{Net, NetError};
use crate::net::ids::NodeId;
use crate::net::search::Event;

/// Fires one randomly chosen enabled event under `scope`. Returns the
/// produced output event, or `None` when the network is quiescent.
pub fn fire_random<R: Rng + ?Sized>(
    net: &mut Net,
    scope: NodeId,
    rng: &mut R,
) -> Result<Option<Event>, NetError> {
    let events: Vec<Event> = net.search(scope).collect();
    if events.is_empty() {
        return Ok(None);
    }
    let pick = rng.random_range(0..events.len());
    net.fire(&events[pick]).map(Some)
}

/// Runs the random policy until quiescence or `limit` firings, returning
/// the number of events fired.
pub fn run_random<R: Rng + ?Sized>(
    net: &mut Net,
    scope: NodeId,
    rng: &mut R,
    limit: usize,
) -> Result<usize, NetError> {
    for fired in 0..limit {
        if fire_random(net, scope, rng)?.is_none() {
            log::debug!("network quiescent after {fired} firings");
            return Ok(fired);
        }
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::structure::{ArcKind, FiringRule, Place};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_policy_drains_a_chain() {
        let mut net = Net::new("net");
        let root = net.root();
        let a = net.add_place(root, "a", Place::with_tokens(1)).unwrap();
        let b = net.add_place(root, "b", Place::new()).unwrap();
        let c = net.add_place(root, "c", Place::new()).unwrap();
        let t1 = net.add_transition(root, "t1", FiringRule::Join).unwrap();
        let t2 = net.add_transition(root, "t2", FiringRule::Join).unwrap();
        net.connect(root, a, t1, ArcKind::Weighted(1)).unwrap();
        net.connect(root, t1, b, ArcKind::Weighted(1)).unwrap();
        net.connect(root, b, t2, ArcKind::Weighted(1)).unwrap();
        net.connect(root, t2, c, ArcKind::Weighted(1)).unwrap();

        let mut rng = StdRng::seed_from_u64(7);
        let fired = run_random(&mut net, root, &mut rng, 16).unwrap();
        assert_eq!(fired, 2);
        assert_eq!(net.tokens(c), 1);
    }
}
