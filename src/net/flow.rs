//! Flow conservation: arc demand bounds and the ordered assignment of an
//! inflow across a transition's outputs.
use smallvec::SmallVec;

use crate::net::core::{Net, NetError};
use crate::net::ids::NodeId;
use crate::net::structure::{ArcKind, Bounds, Weight};

impl Net {
    /// Demand bounds of one arc: a weighted arc insists on exactly its
    /// weight; an elastic arc takes whatever its sink place still accepts.
    pub fn arc_demand(&self, arc: NodeId) -> Bounds {
        match self.arc_kind(arc) {
            Some(ArcKind::Weighted(weight)) => Bounds::exact(weight),
            Some(ArcKind::Elastic) => self
                .sink(arc)
                .and_then(|sink| self.place(sink))
                .map(|place| place.residual())
                .unwrap_or(Bounds::exact(0)),
            None => Bounds::exact(0),
        }
    }

    /// Aggregate demand of a transition's connected outputs; one unbounded
    /// output makes the whole demand unbounded above.
    pub fn demand(&self, transition: NodeId) -> Bounds {
        self.outputs(transition)
            .into_iter()
            .filter(|&arc| self.arc_connected(arc))
            .map(|arc| self.arc_demand(arc))
            .fold(Bounds::exact(0), |acc, demand| acc.widen(demand))
    }
}

/// Distributes `total` tokens over `outputs` in order: every minimum is
/// reserved first, then the remainder is handed out greedily until it runs
/// dry. Fails when the minimums cannot be met, or when tokens are left over
/// after every output is full. The caller's output order decides who
/// receives the remainder, so it must be deterministic.
pub fn assign(total: Weight, outputs: &[Bounds]) -> Result<SmallVec<[Weight; 4]>, NetError> {
    let demand = outputs
        .iter()
        .fold(Bounds::exact(0), |acc, bounds| acc.widen(*bounds));
    let mut assigned: SmallVec<[Weight; 4]> =
        outputs.iter().map(|bounds| bounds.minimum).collect();
    let reserved: Weight = assigned.iter().sum();
    if reserved > total {
        return Err(NetError::FlowConservation { total, demand });
    }
    let mut remaining = total - reserved;
    for (slot, bounds) in assigned.iter_mut().zip(outputs) {
        if remaining == 0 {
            break;
        }
        let take = match bounds.maximum {
            None => remaining,
            Some(max) => remaining.min(max.saturating_sub(*slot)),
        };
        *slot += take;
        remaining -= take;
    }
    if remaining != 0 {
        return Err(NetError::FlowConservation { total, demand });
    }
    Ok(assigned)
}
