// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generation-checked storage for node instances.
//!
//! A removed slot bumps its generation before reuse, so a stale [`NodeId`]
//! never resolves to the node that later took its place.

use crate::graph::GraphError;
use crate::node::{NodeId, NodeInstance};

/// Unlisted slots a restored arena may contain
pub const MAX_SLOT_GAP: usize = 4096;

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    node: Option<NodeInstance>,
}

/// Arena of node instances addressed by [`NodeId`]
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve an id and store the node built for it
    pub fn insert_with(&mut self, build: impl FnOnce(NodeId) -> NodeInstance) -> NodeId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };

        let slot = &mut self.slots[index as usize];
        let id = NodeId::from_parts(index, slot.generation);
        slot.node = Some(build(id));
        self.len += 1;
        id
    }

    /// Rebuild an arena from stored nodes and the ids their vacant slots
    /// would hand out next.
    ///
    /// Indices may leave at most [`MAX_SLOT_GAP`] unlisted slots, which bounds
    /// the allocation by the size of the input. Unlisted slots start past
    /// every stored generation so no earlier id is issued again.
    pub fn restore(nodes: Vec<NodeInstance>, vacant: &[NodeId]) -> Result<Self, GraphError> {
        let limit = nodes.len() + vacant.len() + MAX_SLOT_GAP;
        let ids = || nodes.iter().map(|node| node.id).chain(vacant.iter().copied());

        if let Some(id) = ids().find(|id| id.index() as usize >= limit) {
            return Err(GraphError::NodeIndexOutOfRange { node: id, limit });
        }
        let slot_count = ids().map(|id| id.index() as usize + 1).max().unwrap_or(0);
        let floor = ids()
            .map(|id| id.generation().saturating_add(1))
            .max()
            .unwrap_or(0);

        let mut slots: Vec<Slot> = Vec::with_capacity(slot_count);
        slots.resize_with(slot_count, Slot::default);
        let mut listed = vec![false; slot_count];
        let mut len = 0;

        for node in nodes {
            let index = node.id.index() as usize;
            if listed[index] {
                return Err(GraphError::DuplicateNode(node.id));
            }
            listed[index] = true;
            slots[index].generation = node.id.generation();
            slots[index].node = Some(node);
            len += 1;
        }

        for id in vacant {
            let index = id.index() as usize;
            if !listed[index] {
                listed[index] = true;
                slots[index].generation = id.generation();
            }
        }

        // Highest index first so the lowest vacant slot is reused first
        let mut free = Vec::new();
        for (index, slot) in slots.iter_mut().enumerate().rev() {
            if slot.node.is_some() {
                continue;
            }
            if !listed[index] {
                slot.generation = floor;
            }
            free.push(index as u32);
        }

        Ok(Self { slots, free, len })
    }

    /// Vacant slots, as the id each would hand out next
    pub fn vacancies(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.node.is_none())
            .map(|(index, slot)| NodeId::from_parts(index as u32, slot.generation))
    }

    pub fn remove(&mut self, id: NodeId) -> Option<NodeInstance> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }

        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index());
        self.len -= 1;
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeInstance> {
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeInstance> {
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Live nodes in slot order
    pub fn iter(&self) -> impl Iterator<Item = &NodeInstance> {
        self.slots.iter().filter_map(|slot| slot.node.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NodeInstance> {
        self.slots.iter_mut().filter_map(|slot| slot.node.as_mut())
    }

    pub fn len(&self) -> usize {
        self.len
    }
}
