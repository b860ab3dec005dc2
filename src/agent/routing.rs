//! Distance-vector routing table.
//!
//! One entry per destination ever heard of. Entries are never deleted: a
//! lost destination becomes a tombstone (no next hop, cost 0) that only a
//! claim from the same or a newer epoch can replace. Counters on an entry
//! never decrease.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::address::NodeId;
use crate::message::{AdvertisedRoute, CutRoute, UpdateCounter};
use crate::topology::graph::Weight;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingEntry {
    /// `None` marks a tombstone
    pub next_hop: Option<NodeId>,
    pub cost: Weight,
    pub counter: UpdateCounter,
}

impl RoutingEntry {
    pub fn route(next_hop: NodeId, cost: Weight, counter: UpdateCounter) -> Self {
        RoutingEntry {
            next_hop: Some(next_hop),
            cost,
            counter,
        }
    }

    pub fn tombstone(counter: UpdateCounter) -> Self {
        RoutingEntry {
            next_hop: None,
            cost: 0,
            counter,
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.next_hop.is_none()
    }

    pub fn is_valid(&self) -> bool {
        self.next_hop.is_some()
    }
}

/// Outcome of offering a route to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChange {
    Rejected,
    /// The destination was unknown or revoked and is reachable again
    Established,
    /// A valid entry was replaced within the same epoch
    Updated,
    /// A valid entry was replaced by a newer epoch
    Renewed,
}

impl RouteChange {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, RouteChange::Rejected)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoutingTable {
    entries: BTreeMap<NodeId, RoutingEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a flooded route claim.
    ///
    /// Accepted when the destination is unknown, the claim carries a newer
    /// counter, the entry is a tombstone at the same or an older counter,
    /// or the counters match and the claim is strictly cheaper.
    pub fn offer(
        &mut self,
        destination: NodeId,
        via: NodeId,
        cost: Weight,
        counter: UpdateCounter,
    ) -> RouteChange {
        let change = match self.entries.get(&destination) {
            None => RouteChange::Established,
            Some(entry) if entry.is_tombstone() && entry.counter <= counter => {
                RouteChange::Established
            }
            Some(entry) if entry.is_valid() && counter > entry.counter => RouteChange::Renewed,
            Some(entry) if entry.is_valid() && counter == entry.counter && cost < entry.cost => {
                RouteChange::Updated
            }
            Some(_) => RouteChange::Rejected,
        };

        if change.is_accepted() {
            self.store(destination, RoutingEntry::route(via, cost, counter));
        }
        change
    }

    /// Offer a row of a neighbor's distance vector.
    ///
    /// Only newly reachable destinations, strictly shorter paths, or a
    /// newer epoch at no extra cost are taken, and never from an older
    /// epoch than the one held.
    pub fn offer_merge(
        &mut self,
        destination: NodeId,
        via: NodeId,
        cost: Weight,
        counter: UpdateCounter,
    ) -> RouteChange {
        let change = match self.entries.get(&destination) {
            None => RouteChange::Established,
            Some(entry) if entry.is_tombstone() && entry.counter <= counter => {
                RouteChange::Established
            }
            Some(entry) if entry.is_valid() && counter > entry.counter && cost <= entry.cost => {
                RouteChange::Renewed
            }
            Some(entry) if entry.is_valid() && counter == entry.counter && cost < entry.cost => {
                RouteChange::Updated
            }
            Some(_) => RouteChange::Rejected,
        };

        if change.is_accepted() {
            self.store(destination, RoutingEntry::route(via, cost, counter));
        }
        change
    }

    /// Install the direct route to a new neighbor when it beats what is held
    pub fn install_direct(&mut self, neighbor: NodeId, weight: Weight) -> RouteChange {
        let (change, counter) = match self.entries.get(&neighbor) {
            None => (RouteChange::Established, 0),
            Some(entry) if entry.is_tombstone() => (RouteChange::Established, entry.counter),
            Some(entry) if weight < entry.cost => (RouteChange::Updated, entry.counter),
            Some(_) => (RouteChange::Rejected, 0),
        };

        if change.is_accepted() {
            self.store(neighbor, RoutingEntry::route(neighbor, weight, counter));
        }
        change
    }

    /// Tombstone every valid entry whose next hop was lost.
    ///
    /// Returns the revoked destinations with the counters they held.
    pub fn cut_via(&mut self, lost: &BTreeSet<NodeId>) -> Vec<CutRoute> {
        let revoked: Vec<CutRoute> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.next_hop.map_or(false, |hop| lost.contains(&hop)))
            .map(|(destination, entry)| CutRoute {
                destination: *destination,
                counter: entry.counter,
            })
            .collect();

        for cut in &revoked {
            self.store(cut.destination, RoutingEntry::tombstone(cut.counter + 1));
        }
        revoked
    }

    /// Apply a cut reported by a neighbor.
    ///
    /// Only entries routed through `reporter` at an epoch no newer than the
    /// revoked one are tombstoned. Returns the subset actually revoked.
    pub fn cut_reported(&mut self, reporter: NodeId, routes: &[CutRoute]) -> Vec<CutRoute> {
        let mut revoked = Vec::new();
        for route in routes {
            let Some(entry) = self.entries.get(&route.destination) else {
                continue;
            };
            if entry.next_hop == Some(reporter) && entry.counter <= route.counter {
                revoked.push(CutRoute {
                    destination: route.destination,
                    counter: entry.counter,
                });
            }
        }

        for cut in &revoked {
            self.store(cut.destination, RoutingEntry::tombstone(cut.counter + 1));
        }
        revoked
    }

    pub fn entry(&self, destination: NodeId) -> Option<&RoutingEntry> {
        self.entries.get(&destination)
    }

    pub fn next_hop(&self, destination: NodeId) -> Option<NodeId> {
        self.entries.get(&destination).and_then(|entry| entry.next_hop)
    }

    /// Cost of a valid route
    pub fn cost(&self, destination: NodeId) -> Option<Weight> {
        self.entries
            .get(&destination)
            .filter(|entry| entry.is_valid())
            .map(|entry| entry.cost)
    }

    pub fn is_reachable(&self, destination: NodeId) -> bool {
        self.next_hop(destination).is_some()
    }

    /// Destinations with a valid route, in id order
    pub fn reachable(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_valid())
            .map(|(destination, _)| *destination)
    }

    /// Longest valid route, 0 when nothing is reachable
    pub fn eccentricity(&self) -> Weight {
        self.entries
            .values()
            .filter(|entry| entry.is_valid())
            .map(|entry| entry.cost)
            .max()
            .unwrap_or(0)
    }

    /// Revoked destinations with their tombstone counters
    pub fn tombstones(&self) -> Vec<CutRoute> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_tombstone())
            .map(|(destination, entry)| CutRoute {
                destination: *destination,
                counter: entry.counter,
            })
            .collect()
    }

    pub fn has_tombstones(&self) -> bool {
        self.entries.values().any(|entry| entry.is_tombstone())
    }

    /// Valid routes as a distance vector
    pub fn advertise(&self) -> Vec<AdvertisedRoute> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_valid())
            .map(|(destination, entry)| AdvertisedRoute {
                destination: *destination,
                cost: entry.cost,
                counter: entry.counter,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &RoutingEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn store(&mut self, destination: NodeId, entry: RoutingEntry) {
        debug_assert!(
            self.entries
                .get(&destination)
                .map_or(true, |old| old.counter <= entry.counter),
            "update counter for {} went backwards",
            destination
        );
        self.entries.insert(destination, entry);
    }
}
