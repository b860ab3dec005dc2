//! Per-node protocol state machine.
//!
//! A [`RoutingAgent`] reacts to two kinds of events: a delivered envelope
//! ([`RoutingAgent::process`]) and a detection tick
//! ([`RoutingAgent::detect`]). Both run to completion and leave their
//! sends in the [`Context`] outbox.
//!
//! Route knowledge spreads three ways:
//!
//! - **Discovery floods** carry a claim about their source. Every accepted
//!   claim is relayed to all neighbors except the one it came from.
//! - **Routes-cut** messages walk down the next-hop tree of a lost link and
//!   tombstone the routes that used it.
//! - **Table merges** push a distance vector across a new link, right
//!   behind a discovery flood announcing the endpoint's new epoch, and
//!   ripple outward only while they improve something.
//!
//! Eccentricity estimates ride on top of the routing table as unicast
//! packets to every reachable destination.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, trace};
use serde::Serialize;

use crate::address::NodeId;
use crate::agent::context::Context;
use crate::agent::election::EccentricityTable;
use crate::agent::routing::{RouteChange, RoutingTable};
use crate::message::{
    AdvertisedRoute, CutRoute, Envelope, Observation, Packet, Payload, Time, UpdateCounter,
};
use crate::topology::graph::Weight;

/// Per-agent counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    /// Envelopes delivered to this agent
    pub processed: u64,
    /// Envelopes ignored as stale, duplicate or undeliverable
    pub dropped: u64,
    /// Unicast packets passed on toward another node
    pub forwarded: u64,
    /// Discovery floods started by this agent
    pub floods: u64,
}

/// Routing-table effects of one event
#[derive(Debug, Default)]
struct Outcome {
    changed: bool,
    /// Nodes that should hear this agent's current estimate directly
    introduce: BTreeSet<NodeId>,
}

impl Outcome {
    fn note(&mut self, destination: NodeId, change: RouteChange) {
        match change {
            RouteChange::Rejected => {}
            RouteChange::Updated => self.changed = true,
            RouteChange::Established | RouteChange::Renewed => {
                self.changed = true;
                self.introduce.insert(destination);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoutingAgent {
    id: NodeId,
    routes: RoutingTable,
    eccentricities: EccentricityTable,
    leaders: BTreeSet<NodeId>,
    counter: UpdateCounter,
    /// Orders this agent's own eccentricity observations
    revision: u64,
    /// Eccentricity last gossiped to every destination
    announced: Option<Weight>,
    /// Neighbor snapshot taken at the previous detection tick
    neighbors: BTreeMap<NodeId, Weight>,
    /// Highest counter per source whose rediscovery request was answered
    answered: BTreeMap<NodeId, UpdateCounter>,
    stats: AgentStats,
}

impl RoutingAgent {
    pub fn new(id: NodeId) -> Self {
        RoutingAgent {
            id,
            routes: RoutingTable::new(),
            eccentricities: EccentricityTable::new(),
            leaders: BTreeSet::new(),
            counter: 0,
            revision: 0,
            announced: None,
            neighbors: BTreeMap::new(),
            answered: BTreeMap::new(),
            stats: AgentStats::default(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn eccentricities(&self) -> &EccentricityTable {
        &self.eccentricities
    }

    /// Own eccentricity estimate
    pub fn eccentricity(&self) -> Weight {
        self.routes.eccentricity()
    }

    /// Nodes currently believed to be the graph center
    pub fn leaders(&self) -> &BTreeSet<NodeId> {
        &self.leaders
    }

    /// Single leader picked from the set, the highest id wins ties
    pub fn elected(&self) -> Option<NodeId> {
        self.leaders.iter().next_back().copied()
    }

    pub fn counter(&self) -> UpdateCounter {
        self.counter
    }

    pub fn known_neighbors(&self) -> &BTreeMap<NodeId, Weight> {
        &self.neighbors
    }

    pub fn stats(&self) -> AgentStats {
        self.stats
    }

    /// Take the first neighbor snapshot and flood the initial discovery
    pub fn setup(&mut self, ctx: &mut Context<'_>) {
        self.neighbors = ctx.neighbors().clone();
        self.announce(ctx, Vec::<NodeId>::new());

        let packet = ctx.broadcast(Payload::Discovery { revoked: Vec::new() }, self.id, self.counter);
        for neighbor in ctx.neighbors().keys() {
            ctx.send(*neighbor, packet.clone());
        }
        self.elect();
    }

    /// Handle one delivered envelope
    pub fn process(&mut self, ctx: &mut Context<'_>, envelope: &Envelope) {
        self.stats.processed += 1;
        let packet = &envelope.packet;

        if packet.source() == self.id {
            self.drop_packet(packet, "own packet echoed back");
            return;
        }

        if let Some(target) = packet.target() {
            if target != self.id {
                self.forward(ctx, packet, target);
                return;
            }
        }

        let outcome = match packet.payload() {
            Payload::Discovery { revoked } => self.on_discovery(ctx, envelope.from, packet, revoked),
            Payload::Eccentricity { value, observed } => {
                self.on_eccentricity(packet, *value, *observed)
            }
            Payload::RoutesCut { routes, cut_at } => {
                self.on_routes_cut(ctx, envelope.from, packet, routes, *cut_at)
            }
            Payload::TableMerge { routes } => self.on_table_merge(ctx, envelope.from, packet, routes),
        };

        self.settle(ctx, outcome);
    }

    /// Compare the current neighborhood with the last snapshot and repair.
    ///
    /// A neighbor whose edge weight changed counts as lost and regained.
    pub fn detect(&mut self, ctx: &mut Context<'_>) {
        let current = ctx.neighbors();
        let lost: BTreeSet<NodeId> = self
            .neighbors
            .iter()
            .filter(|(neighbor, weight)| current.get(*neighbor) != Some(*weight))
            .map(|(neighbor, _)| *neighbor)
            .collect();
        let gained: BTreeMap<NodeId, Weight> = current
            .iter()
            .filter(|(neighbor, weight)| self.neighbors.get(*neighbor) != Some(*weight))
            .map(|(neighbor, weight)| (*neighbor, *weight))
            .collect();
        self.neighbors = current.clone();

        if lost.is_empty() && gained.is_empty() {
            return;
        }
        debug!(
            "Node {} detected lost neighbors {:?} and new neighbors {:?} at t={}",
            self.id,
            lost,
            gained.keys().collect::<Vec<_>>(),
            ctx.now()
        );

        let mut outcome = Outcome::default();

        if !lost.is_empty() {
            let revoked = self.routes.cut_via(&lost);
            if !revoked.is_empty() {
                debug!("Node {} revoked {} routes", self.id, revoked.len());
                outcome.changed = true;
                for cut in &revoked {
                    self.eccentricities.forget(cut.destination);
                }
                let cut_at = ctx.now();
                for neighbor in current.keys() {
                    self.send_cut(ctx, *neighbor, revoked.clone(), cut_at);
                }
            }
        }

        let mut improved = Vec::new();
        for (neighbor, weight) in &gained {
            let change = self.routes.install_direct(*neighbor, *weight);
            if change.is_accepted() {
                let counter = self.routes.entry(*neighbor).map_or(0, |entry| entry.counter);
                improved.push(AdvertisedRoute {
                    destination: *neighbor,
                    cost: *weight,
                    counter,
                });
            }
            outcome.note(*neighbor, change);
        }

        // Every node hears the new epoch before any merge row carrying it
        self.flood_discovery(ctx);

        if !gained.is_empty() {
            let mut table = self.routes.advertise();
            table.push(AdvertisedRoute {
                destination: self.id,
                cost: 0,
                counter: self.counter,
            });
            for neighbor in gained.keys() {
                self.send_merge(ctx, *neighbor, table.clone());
            }

            if !improved.is_empty() {
                for neighbor in current.keys().filter(|n| !gained.contains_key(*n)) {
                    self.send_merge(ctx, *neighbor, improved.clone());
                }
            }
        }

        self.settle(ctx, outcome);
    }

    fn on_discovery(
        &mut self,
        ctx: &mut Context<'_>,
        from: NodeId,
        packet: &Packet,
        revoked: &[CutRoute],
    ) -> Outcome {
        let mut outcome = Outcome::default();
        let source = packet.source();

        let change = self
            .routes
            .offer(source, from, packet.transit(), packet.counter());
        if !change.is_accepted() {
            self.drop_packet(packet, "stale or longer route claim");
            return outcome;
        }
        trace!(
            "Node {} routes to {} via {} at cost {} (counter {})",
            self.id,
            source,
            from,
            packet.transit(),
            packet.counter()
        );
        outcome.note(source, change);

        for neighbor in ctx.neighbors().keys() {
            if *neighbor != from {
                ctx.send(*neighbor, packet.clone());
            }
        }

        if let Some(request) = revoked.iter().find(|cut| cut.destination == self.id) {
            let unanswered = self
                .answered
                .get(&source)
                .map_or(true, |seen| *seen < packet.counter());
            if unanswered {
                debug!(
                    "Node {} answers rediscovery request from {} (counter {})",
                    self.id,
                    source,
                    packet.counter()
                );
                self.answered.insert(source, packet.counter());
                self.counter = self.counter.max(request.counter);
                self.flood_discovery(ctx);
                outcome.introduce.insert(source);
            }
        }

        outcome
    }

    fn on_eccentricity(&mut self, packet: &Packet, value: Weight, observed: Observation) -> Outcome {
        if self.eccentricities.record(packet.source(), value, observed) {
            trace!(
                "Node {} learned eccentricity {} of {}",
                self.id,
                value,
                packet.source()
            );
        } else {
            self.drop_packet(packet, "outdated eccentricity");
        }
        Outcome::default()
    }

    fn on_routes_cut(
        &mut self,
        ctx: &mut Context<'_>,
        from: NodeId,
        packet: &Packet,
        routes: &[CutRoute],
        cut_at: Time,
    ) -> Outcome {
        let revoked = self.routes.cut_reported(from, routes);
        if revoked.is_empty() {
            self.drop_packet(packet, "no route used the reporter");
            return Outcome::default();
        }
        debug!(
            "Node {} revoked {} routes reported by {} (cut at t={})",
            self.id,
            revoked.len(),
            from,
            cut_at
        );

        for cut in &revoked {
            self.eccentricities.forget(cut.destination);
        }
        for neighbor in ctx.neighbors().keys() {
            if *neighbor != from {
                self.send_cut(ctx, *neighbor, revoked.clone(), cut_at);
            }
        }
        self.flood_discovery(ctx);

        Outcome {
            changed: true,
            introduce: BTreeSet::new(),
        }
    }

    fn on_table_merge(
        &mut self,
        ctx: &mut Context<'_>,
        from: NodeId,
        packet: &Packet,
        routes: &[AdvertisedRoute],
    ) -> Outcome {
        let mut outcome = Outcome::default();
        let Some(link) = ctx.weight_to(from) else {
            self.drop_packet(packet, "merge from a non-neighbor");
            return outcome;
        };

        let mut improved = Vec::new();
        for route in routes {
            if route.destination == self.id {
                continue;
            }
            let cost = route.cost.saturating_add(link);
            let change = self
                .routes
                .offer_merge(route.destination, from, cost, route.counter);
            if change.is_accepted() {
                improved.push(AdvertisedRoute {
                    destination: route.destination,
                    cost,
                    counter: route.counter,
                });
            }
            outcome.note(route.destination, change);
        }

        if improved.is_empty() {
            self.drop_packet(packet, "merge improved nothing");
            return outcome;
        }
        trace!(
            "Node {} merged {} routes from {}",
            self.id,
            improved.len(),
            from
        );

        for neighbor in ctx.neighbors().keys() {
            if *neighbor != from {
                self.send_merge(ctx, *neighbor, improved.clone());
            }
        }
        outcome
    }

    fn forward(&mut self, ctx: &mut Context<'_>, packet: &Packet, target: NodeId) {
        if packet.hops() >= ctx.hop_limit() {
            self.drop_packet(packet, "hop limit reached");
            return;
        }
        match self.routes.next_hop(target) {
            Some(hop) if ctx.is_neighbor(hop) => {
                self.stats.forwarded += 1;
                ctx.send(hop, packet.clone());
            }
            _ => self.drop_packet(packet, "no route toward target"),
        }
    }

    /// Bump the counter and flood a discovery naming every tombstone
    fn flood_discovery(&mut self, ctx: &mut Context<'_>) {
        self.counter += 1;
        self.stats.floods += 1;
        let revoked = self.routes.tombstones();
        let packet = ctx.broadcast(Payload::Discovery { revoked }, self.id, self.counter);
        for neighbor in ctx.neighbors().keys() {
            ctx.send(*neighbor, packet.clone());
        }
    }

    fn send_cut(&mut self, ctx: &mut Context<'_>, to: NodeId, routes: Vec<CutRoute>, cut_at: Time) {
        let packet = ctx.unicast(Payload::RoutesCut { routes, cut_at }, self.id, to, self.counter);
        ctx.send(to, packet);
    }

    fn send_merge(&mut self, ctx: &mut Context<'_>, to: NodeId, routes: Vec<AdvertisedRoute>) {
        let packet = ctx.unicast(Payload::TableMerge { routes }, self.id, to, self.counter);
        ctx.send(to, packet);
    }

    /// Gossip the estimate after routing changes
    fn settle(&mut self, ctx: &mut Context<'_>, outcome: Outcome) {
        let value = self.routes.eccentricity();
        if outcome.changed && self.announced != Some(value) {
            let everyone: Vec<NodeId> = self.routes.reachable().collect();
            self.announce(ctx, everyone);
        } else if !outcome.introduce.is_empty() {
            self.announce(ctx, outcome.introduce);
        }
        self.elect();
    }

    /// Record a fresh own estimate and unicast it to `targets`
    fn announce<I>(&mut self, ctx: &mut Context<'_>, targets: I)
    where
        I: IntoIterator<Item = NodeId>,
    {
        let value = self.routes.eccentricity();
        self.revision += 1;
        let observed = Observation {
            time: ctx.now(),
            revision: self.revision,
        };
        self.eccentricities.record(self.id, value, observed);
        self.announced = Some(value);

        for target in targets {
            let Some(hop) = self.routes.next_hop(target) else {
                continue;
            };
            if !ctx.is_neighbor(hop) {
                continue;
            }
            let packet = ctx.unicast(
                Payload::Eccentricity { value, observed },
                self.id,
                target,
                self.counter,
            );
            ctx.send(hop, packet);
        }
    }

    fn elect(&mut self) {
        let id = self.id;
        let routes = &self.routes;
        self.leaders = self
            .eccentricities
            .leaders(|node| node == id || routes.is_reachable(node));
    }

    fn drop_packet(&mut self, packet: &Packet, reason: &str) {
        self.stats.dropped += 1;
        trace!(
            "Node {} dropped {} {} from {}: {}",
            self.id,
            packet.payload().kind(),
            packet.sequence(),
            packet.source(),
            reason
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::PacketIdGenerator;

    fn id(value: u64) -> NodeId {
        NodeId::new(value)
    }

    fn neighbors(pairs: &[(u64, Weight)]) -> BTreeMap<NodeId, Weight> {
        pairs.iter().map(|(n, w)| (id(*n), *w)).collect()
    }

    fn discovery(ids: &mut PacketIdGenerator, source: u64, transit: Weight, counter: u64) -> Packet {
        let packet = Packet::broadcast(
            ids.next_id(),
            Payload::Discovery { revoked: vec![] },
            id(source),
            counter,
        );
        packet.relayed(ids.next_id(), transit)
    }

    #[test]
    fn test_setup_floods_discovery() {
        let mut ids = PacketIdGenerator::new();
        let around = neighbors(&[(1, 2), (2, 5)]);
        let mut agent = RoutingAgent::new(id(0));

        let mut ctx = Context::new(0, &around, 8, &mut ids);
        agent.setup(&mut ctx);
        let outbox = ctx.into_outbox();

        assert_eq!(outbox.len(), 2);
        assert!(outbox
            .iter()
            .all(|out| matches!(out.packet.payload(), Payload::Discovery { .. })));
        assert_eq!(agent.counter(), 0);
        assert_eq!(agent.leaders(), &BTreeSet::from([id(0)]));
    }

    #[test]
    fn test_discovery_accepted_and_relayed() {
        let mut ids = PacketIdGenerator::new();
        let around = neighbors(&[(1, 1), (2, 1), (3, 1)]);
        let mut agent = RoutingAgent::new(id(0));
        let packet = discovery(&mut ids, 9, 4, 0);
        let envelope = Envelope::new(packet, id(1), id(0), 4);

        let mut ctx = Context::new(4, &around, 8, &mut ids);
        agent.process(&mut ctx, &envelope);
        let outbox = ctx.into_outbox();

        assert_eq!(agent.routes().cost(id(9)), Some(4));
        assert_eq!(agent.routes().next_hop(id(9)), Some(id(1)));

        let relayed_to: Vec<NodeId> = outbox
            .iter()
            .filter(|out| matches!(out.packet.payload(), Payload::Discovery { .. }))
            .map(|out| out.to)
            .collect();
        assert_eq!(relayed_to, vec![id(2), id(3)]);

        // New reachable destination hears the estimate
        assert!(outbox.iter().any(|out| out.to == id(1)
            && matches!(out.packet.payload(), Payload::Eccentricity { value: 4, .. })));
    }

    #[test]
    fn test_duplicate_delivery_is_idempotent() {
        let mut ids = PacketIdGenerator::new();
        let around = neighbors(&[(1, 1), (2, 1)]);
        let mut agent = RoutingAgent::new(id(0));
        let envelope = Envelope::new(discovery(&mut ids, 7, 3, 2), id(1), id(0), 3);

        let mut ctx = Context::new(3, &around, 8, &mut ids);
        agent.process(&mut ctx, &envelope);
        drop(ctx.into_outbox());

        let routes_before = agent.routes().clone();
        let eccentricities_before = agent.eccentricities().clone();
        let leaders_before = agent.leaders().clone();

        let mut ctx = Context::new(5, &around, 8, &mut ids);
        agent.process(&mut ctx, &envelope);
        let outbox = ctx.into_outbox();

        assert!(outbox.is_empty());
        assert_eq!(agent.routes(), &routes_before);
        assert_eq!(agent.eccentricities(), &eccentricities_before);
        assert_eq!(agent.leaders(), &leaders_before);
        assert_eq!(agent.stats().dropped, 1);
    }

    #[test]
    fn test_duplicate_eccentricity_is_idempotent() {
        let mut ids = PacketIdGenerator::new();
        let around = neighbors(&[(1, 1)]);
        let mut agent = RoutingAgent::new(id(0));

        let route = Envelope::new(discovery(&mut ids, 1, 1, 0), id(1), id(0), 1);
        let mut ctx = Context::new(1, &around, 8, &mut ids);
        agent.process(&mut ctx, &route);
        drop(ctx.into_outbox());

        let gossip = Packet::unicast(
            ids.next_id(),
            Payload::Eccentricity {
                value: 1,
                observed: Observation { time: 1, revision: 3 },
            },
            id(1),
            id(0),
            0,
        );
        let envelope = Envelope::new(gossip, id(1), id(0), 2);

        for now in [2, 3] {
            let mut ctx = Context::new(now, &around, 8, &mut ids);
            agent.process(&mut ctx, &envelope);
            assert!(ctx.into_outbox().is_empty());
        }
        assert_eq!(agent.eccentricities().get(id(1)).unwrap().eccentricity, 1);
        assert_eq!(agent.leaders(), &BTreeSet::from([id(0), id(1)]));
    }

    #[test]
    fn test_own_echo_ignored() {
        let mut ids = PacketIdGenerator::new();
        let around = neighbors(&[(1, 1)]);
        let mut agent = RoutingAgent::new(id(0));
        let envelope = Envelope::new(discovery(&mut ids, 0, 2, 0), id(1), id(0), 2);

        let mut ctx = Context::new(2, &around, 8, &mut ids);
        agent.process(&mut ctx, &envelope);
        assert!(ctx.into_outbox().is_empty());
        assert!(agent.routes().is_empty());
    }

    #[test]
    fn test_lost_neighbor_tombstones_before_rediscovery() {
        let mut ids = PacketIdGenerator::new();
        let before = neighbors(&[(1, 1), (2, 1)]);
        let mut agent = RoutingAgent::new(id(0));

        let mut ctx = Context::new(0, &before, 8, &mut ids);
        agent.setup(&mut ctx);
        drop(ctx.into_outbox());

        for (source, via, transit) in [(1, 1, 1), (3, 1, 2), (2, 2, 1)] {
            let envelope = Envelope::new(discovery(&mut ids, source, transit, 0), id(via), id(0), 2);
            let mut ctx = Context::new(2, &before, 8, &mut ids);
            agent.process(&mut ctx, &envelope);
            drop(ctx.into_outbox());
        }
        assert_eq!(agent.routes().cost(id(3)), Some(2));

        // Link to 1 disappears
        let after = neighbors(&[(2, 1)]);
        let mut ctx = Context::new(5, &after, 8, &mut ids);
        agent.detect(&mut ctx);
        let outbox = ctx.into_outbox();

        for lost in [1, 3] {
            let entry = agent.routes().entry(id(lost)).unwrap();
            assert!(entry.is_tombstone());
            assert_eq!(entry.counter, 1);
            assert!(agent.eccentricities().get(id(lost)).is_none());
        }
        assert!(agent.routes().is_reachable(id(2)));
        assert_eq!(agent.counter(), 1);

        assert!(outbox.iter().any(|out| out.to == id(2)
            && matches!(out.packet.payload(), Payload::RoutesCut { routes, .. } if routes.len() == 2)));
        let flood = outbox
            .iter()
            .find(|out| matches!(out.packet.payload(), Payload::Discovery { .. }))
            .unwrap();
        assert_eq!(flood.packet.counter(), 1);
        match flood.packet.payload() {
            Payload::Discovery { revoked } => assert_eq!(revoked.len(), 2),
            other => panic!("unexpected payload {:?}", other),
        }

        // A stale claim from the revoked epoch is refused
        let stale = Envelope::new(discovery(&mut ids, 3, 2, 0), id(2), id(0), 6);
        let mut ctx = Context::new(6, &after, 8, &mut ids);
        agent.process(&mut ctx, &stale);
        assert!(ctx.into_outbox().is_empty());
        assert!(agent.routes().entry(id(3)).unwrap().is_tombstone());

        // The next epoch rediscovers it
        let fresh = Envelope::new(discovery(&mut ids, 3, 4, 1), id(2), id(0), 7);
        let mut ctx = Context::new(7, &after, 8, &mut ids);
        agent.process(&mut ctx, &fresh);
        drop(ctx.into_outbox());
        assert_eq!(agent.routes().cost(id(3)), Some(4));
        assert_eq!(agent.routes().next_hop(id(3)), Some(id(2)));
    }

    #[test]
    fn test_new_neighbor_gets_table() {
        let mut ids = PacketIdGenerator::new();
        let before = neighbors(&[(1, 1)]);
        let mut agent = RoutingAgent::new(id(0));

        let mut ctx = Context::new(0, &before, 8, &mut ids);
        agent.setup(&mut ctx);
        drop(ctx.into_outbox());

        let envelope = Envelope::new(discovery(&mut ids, 1, 1, 0), id(1), id(0), 1);
        let mut ctx = Context::new(1, &before, 8, &mut ids);
        agent.process(&mut ctx, &envelope);
        drop(ctx.into_outbox());

        let after = neighbors(&[(1, 1), (4, 3)]);
        let mut ctx = Context::new(2, &after, 8, &mut ids);
        agent.detect(&mut ctx);
        let outbox = ctx.into_outbox();

        assert_eq!(agent.routes().cost(id(4)), Some(3));
        assert_eq!(agent.counter(), 1);

        let pushed = outbox
            .iter()
            .find(|out| out.to == id(4) && matches!(out.packet.payload(), Payload::TableMerge { .. }))
            .unwrap();
        match pushed.packet.payload() {
            Payload::TableMerge { routes } => {
                let destinations: Vec<NodeId> = routes.iter().map(|r| r.destination).collect();
                assert_eq!(destinations, vec![id(1), id(4), id(0)]);
                assert_eq!(routes[2].counter, 1);
            }
            other => panic!("unexpected payload {:?}", other),
        }

        // The old neighbor only hears about the improvement
        assert!(outbox.iter().any(|out| out.to == id(1)
            && matches!(out.packet.payload(), Payload::TableMerge { routes } if routes.len() == 1)));

        // The new epoch is flooded ahead of the merge on the same link
        let to_newcomer: Vec<&str> = outbox
            .iter()
            .filter(|out| out.to == id(4))
            .map(|out| out.packet.payload().kind())
            .collect();
        let flood = to_newcomer.iter().position(|kind| *kind == "discovery").unwrap();
        let merge = to_newcomer.iter().position(|kind| *kind == "table-merge").unwrap();
        assert!(flood < merge);
        assert!(outbox.iter().any(|out| out.to == id(1)
            && out.packet.counter() == 1
            && matches!(out.packet.payload(), Payload::Discovery { .. })));
    }

    #[test]
    fn test_forward_respects_hop_limit() {
        let mut ids = PacketIdGenerator::new();
        let around = neighbors(&[(1, 1), (2, 1)]);
        let mut agent = RoutingAgent::new(id(0));

        let route = Envelope::new(discovery(&mut ids, 5, 2, 0), id(2), id(0), 2);
        let mut ctx = Context::new(2, &around, 3, &mut ids);
        agent.process(&mut ctx, &route);
        drop(ctx.into_outbox());

        let gossip = Packet::unicast(
            ids.next_id(),
            Payload::Eccentricity {
                value: 2,
                observed: Observation { time: 0, revision: 1 },
            },
            id(1),
            id(5),
            0,
        );
        let one_hop = gossip.relayed(ids.next_id(), 1);
        let mut ctx = Context::new(3, &around, 3, &mut ids);
        agent.process(&mut ctx, &Envelope::new(one_hop.clone(), id(1), id(0), 3));
        let outbox = ctx.into_outbox();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, id(2));

        let worn_out = one_hop
            .relayed(ids.next_id(), 1)
            .relayed(ids.next_id(), 1);
        let mut ctx = Context::new(4, &around, 3, &mut ids);
        agent.process(&mut ctx, &Envelope::new(worn_out, id(1), id(0), 4));
        assert!(ctx.into_outbox().is_empty());
        assert_eq!(agent.stats().forwarded, 1);
    }
}
