use std::collections::BTreeSet;

use fxhash::FxHashMap;

use crate::NodeId;

/// Frontier ordering key. Ties on `key` go to the node queued first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) struct Priority {
    pub key: u32,
    pub seq: u64,
}

/// Priority frontier with membership lookup.
///
/// `order` and `members` always hold exactly the same nodes: every push, pop and
/// reprioritisation touches both.
#[derive(Debug, Default)]
pub(super) struct OpenList {
    order: BTreeSet<(Priority, NodeId)>,
    members: FxHashMap<NodeId, Priority>,
}

impl OpenList {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains_key(&id)
    }

    pub fn push(&mut self, id: NodeId, priority: Priority) {
        if let Some(old) = self.members.insert(id, priority) {
            self.order.remove(&(old, id));
        }
        self.order.insert((priority, id));
    }

    pub fn pop(&mut self) -> Option<NodeId> {
        let (_, id) = self.order.pop_first()?;
        self.members.remove(&id);
        Some(id)
    }

    /// Moves a queued node to a new position. Returns `false` if it is not queued.
    pub fn reprioritize(&mut self, id: NodeId, priority: Priority) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.push(id, priority);
        true
    }

    #[cfg(test)]
    fn is_synchronized(&self) -> bool {
        self.order.len() == self.members.len()
            && self
                .order
                .iter()
                .all(|(priority, id)| self.members.get(id) == Some(priority))
    }
}
