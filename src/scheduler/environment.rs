//! Timed environment driving the simulation.
//!
//! This file owns the adjacency matrix, the address table, every agent and
//! the event queue. Delivering an envelope advances a logical clock to its
//! arrival time; detection ticks advance it by one unit and let every
//! attached agent compare its neighborhood with the last snapshot.
//!
//! Runs are deterministic: agents are visited in ascending id order and
//! equal arrival times are delivered in insertion order.

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::Serialize;

use crate::address::{AddressTable, NodeId};
use crate::agent::{Context, Outgoing, RoutingAgent};
use crate::message::{Envelope, Packet, PacketIdGenerator, Time};
use crate::scheduler::error::ProtocolError;
use crate::scheduler::queue::EventQueue;
use crate::topology::graph::{AdjacencyMatrix, Weight};

/// Deliveries allowed per drain before the run is declared divergent
pub const DEFAULT_MAX_EVENTS: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    pub max_events: u64,
    /// Unicast hop limit; the number of attached nodes when unset
    pub hop_limit: Option<u32>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS,
            hop_limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Idle,
    Draining,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    pub sent: u64,
    pub delivered: u64,
    /// Envelopes addressed to nodes removed from the matrix
    pub discarded: u64,
    pub detection_ticks: u64,
    /// Packet ids handed out, relayed copies included
    pub packets_issued: u64,
}

pub struct TimedEnvironment {
    pub(crate) matrix: AdjacencyMatrix,
    pub(crate) addresses: AddressTable,
    /// Every agent ever created; removed nodes stay here detached
    pub(crate) agents: BTreeMap<NodeId, RoutingAgent>,
    queue: EventQueue,
    clock: Time,
    packet_ids: PacketIdGenerator,
    state: SchedulerState,
    config: EnvironmentConfig,
    stats: SimulationStats,
}

impl TimedEnvironment {
    /// One agent per matrix row, with ids equal to the initial indices
    pub fn new(matrix: AdjacencyMatrix, config: EnvironmentConfig) -> Self {
        let addresses = AddressTable::new(matrix.len());
        let agents = addresses
            .ids()
            .iter()
            .map(|id| (*id, RoutingAgent::new(*id)))
            .collect();

        TimedEnvironment {
            matrix,
            addresses,
            agents,
            queue: EventQueue::new(),
            clock: 0,
            packet_ids: PacketIdGenerator::new(),
            state: SchedulerState::Idle,
            config,
            stats: SimulationStats::default(),
        }
    }

    /// Let every agent take its first snapshot and flood its discovery
    pub fn setup(&mut self) -> Result<(), ProtocolError> {
        for id in self.attached_ids() {
            self.run_agent(id, |agent, ctx| agent.setup(ctx))?;
        }
        debug!(
            "Set up {} agents, {} envelopes queued",
            self.addresses.len(),
            self.queue.len()
        );
        Ok(())
    }

    /// Enqueue a copy of `packet` on the edge between two nodes
    pub fn send(&mut self, from: NodeId, to: NodeId, packet: &Packet) -> Result<(), ProtocolError> {
        if from == to {
            return Err(ProtocolError::SelfSend(from));
        }
        let u = self.addresses.index_of(from)?;
        let v = self.addresses.index_of(to)?;
        let weight = self.matrix.weight(u, v);
        if weight == 0 {
            return Err(ProtocolError::MissingEdge { from, to });
        }

        let copy = packet.relayed(self.packet_ids.next_id(), weight);
        let arrival = self.clock.saturating_add(weight);
        trace!(
            "t={} {} {} -> {} arrives t={}",
            self.clock,
            copy.payload().kind(),
            from,
            to,
            arrival
        );
        self.queue.push(Envelope::new(copy, from, to, arrival));
        self.stats.sent += 1;
        Ok(())
    }

    /// Deliver the earliest envelope.
    ///
    /// Returns the clock after delivery, or `None` once the queue is empty.
    pub fn step(&mut self) -> Result<Option<Time>, ProtocolError> {
        let Some(envelope) = self.queue.pop() else {
            self.state = SchedulerState::Idle;
            return Ok(None);
        };
        self.state = SchedulerState::Draining;
        self.clock = self.clock.max(envelope.arrival);

        if !self.addresses.contains(envelope.to) {
            debug!(
                "Discarding {} for detached node {}",
                envelope.packet.payload().kind(),
                envelope.to
            );
            self.stats.discarded += 1;
            return Ok(Some(self.clock));
        }

        let to = envelope.to;
        self.run_agent(to, |agent, ctx| agent.process(ctx, &envelope))?;
        self.stats.delivered += 1;
        Ok(Some(self.clock))
    }

    /// Advance the clock by one unit and run every attached agent's detection
    pub fn detect_tick(&mut self) -> Result<(), ProtocolError> {
        self.clock += 1;
        self.stats.detection_ticks += 1;
        for id in self.attached_ids() {
            self.run_agent(id, |agent, ctx| agent.detect(ctx))?;
        }
        Ok(())
    }

    /// Step until the queue is empty, returning the number of deliveries
    pub fn drain(&mut self) -> Result<u64, ProtocolError> {
        let mut delivered = 0;
        loop {
            if delivered >= self.config.max_events && !self.queue.is_empty() {
                return Err(ProtocolError::EventBudgetExhausted(self.config.max_events));
            }
            match self.step()? {
                Some(_) => delivered += 1,
                None => break,
            }
        }
        debug!("Drained {} events, clock now t={}", delivered, self.clock);
        Ok(delivered)
    }

    /// Detection tick followed by a full drain
    pub fn recalibrate(&mut self) -> Result<u64, ProtocolError> {
        self.detect_tick()?;
        self.drain()
    }

    /// Current neighbors of an attached node with their edge weights
    pub fn neighbors_of(&self, id: NodeId) -> Result<BTreeMap<NodeId, Weight>, ProtocolError> {
        let index = self.addresses.index_of(id)?;
        let mut neighbors = BTreeMap::new();
        for (other, weight) in self.matrix.neighbors(index) {
            neighbors.insert(self.addresses.id_of(other)?, weight);
        }
        Ok(neighbors)
    }

    pub fn hop_limit(&self) -> u32 {
        let fallback = u32::try_from(self.addresses.len()).unwrap_or(u32::MAX);
        self.config.hop_limit.unwrap_or(fallback).max(1)
    }

    pub fn clock(&self) -> Time {
        self.clock
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            packets_issued: self.packet_ids.issued(),
            ..self.stats
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn matrix(&self) -> &AdjacencyMatrix {
        &self.matrix
    }

    pub fn addresses(&self) -> &AddressTable {
        &self.addresses
    }

    pub fn agent(&self, id: NodeId) -> Option<&RoutingAgent> {
        self.agents.get(&id)
    }

    /// All agents ever created, attached or not, in id order
    pub fn agents(&self) -> impl Iterator<Item = &RoutingAgent> {
        self.agents.values()
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.addresses.contains(id)
    }

    fn attached_ids(&self) -> Vec<NodeId> {
        let mut ids = self.addresses.ids().to_vec();
        ids.sort_unstable();
        ids
    }

    /// Run one agent handler and dispatch whatever it sent
    pub(crate) fn run_agent<F>(&mut self, id: NodeId, handler: F) -> Result<(), ProtocolError>
    where
        F: FnOnce(&mut RoutingAgent, &mut Context<'_>),
    {
        let neighbors = self.neighbors_of(id)?;
        let hop_limit = self.hop_limit();
        let agent = self
            .agents
            .get_mut(&id)
            .ok_or(ProtocolError::MissingAgent(id))?;
        let mut ctx = Context::new(self.clock, &neighbors, hop_limit, &mut self.packet_ids);
        handler(agent, &mut ctx);
        let outbox = ctx.into_outbox();
        self.dispatch(id, outbox)
    }

    fn dispatch(&mut self, from: NodeId, outbox: Vec<Outgoing>) -> Result<(), ProtocolError> {
        for outgoing in outbox {
            self.send(from, outgoing.to, &outgoing.packet)?;
        }
        Ok(())
    }
}
