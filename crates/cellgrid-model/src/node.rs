//! Backing storage for the XML `<c>` elements of a row.
//!
//! The model keeps two views of a row's cells: the logical column-ordered map
//! in [`crate::Row`], and the physically ordered node sequence held here. The
//! two may drift apart between mutations; [`crate::Row::sync_nodes`] brings
//! them back in line before the row is externalized.
//!
//! Nodes are addressed through stable [`NodeId`] handles resolved by an arena,
//! so a logical cell keeps pointing at the same node even when the node's
//! physical position changes.

use serde::{Deserialize, Serialize};

/// Stable handle to a cell node within one row's [`NodeStore`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// The serialized face of one cell: the fields of a `<c>` element.
///
/// The model reads and writes only these fields; anything else an input file
/// carried in the element is outside this layer's contract.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CellNode {
    /// The `r` attribute (A1 reference), if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a1_ref: Option<String>,
    /// The `t` attribute (cell type tag: `n`, `s`, `b`, `e`, `str`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    /// The `<v>` child, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<String>,
    /// The `<f>` child (formula text), verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// The `s` attribute (style table index).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<u32>,
}

impl CellNode {
    /// Clear all fields in place, keeping the node's identity.
    ///
    /// Equivalent to replacing the element with a freshly created one.
    pub fn reset(&mut self) {
        *self = CellNode::default();
    }
}

/// Arena of cell nodes plus their current physical order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStore {
    slots: Vec<Option<CellNode>>,
    order: Vec<NodeId>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from parsed nodes, preserving their file order.
    pub fn from_nodes(nodes: Vec<CellNode>) -> Self {
        let mut store = Self::new();
        for node in nodes {
            store.append(node);
        }
        store
    }

    /// Append a node at the end of the physical sequence.
    pub fn append(&mut self, node: CellNode) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Some(node));
        self.order.push(id);
        id
    }

    /// Remove the most recently appended node.
    ///
    /// Used to roll back a structural append when validation of the new cell
    /// fails afterwards.
    pub fn remove_last(&mut self) {
        if let Some(id) = self.order.pop() {
            self.slots[id.index()] = None;
        }
    }

    /// Remove the node `id` from whatever physical position it currently
    /// occupies. Returns `false` if the node is not present.
    pub fn remove(&mut self, id: NodeId) -> bool {
        let Some(pos) = self.order.iter().position(|&n| n == id) else {
            return false;
        };
        self.order.remove(pos);
        self.slots[id.index()] = None;
        true
    }

    pub fn get(&self, id: NodeId) -> Option<&CellNode> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut CellNode> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Current physical order of node handles.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Number of physically present nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Replace the physical order wholesale and drop every slot that is no
    /// longer referenced. The caller guarantees `new_order` holds live,
    /// distinct handles.
    pub fn reorder(&mut self, new_order: Vec<NodeId>) {
        debug_assert!(new_order.iter().all(|id| self.get(*id).is_some()));
        for slot_index in 0..self.slots.len() {
            let id = NodeId(slot_index as u32);
            if self.slots[slot_index].is_some() && !new_order.contains(&id) {
                self.slots[slot_index] = None;
            }
        }
        self.order = new_order;
    }

    /// Iterate nodes in physical order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CellNode)> {
        self.order.iter().map(move |&id| {
            let node = self
                .get(id)
                .unwrap_or_else(|| unreachable!("order references a freed slot"));
            (id, node)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_stay_valid_across_removal_of_neighbors() {
        let mut store = NodeStore::new();
        let a = store.append(CellNode {
            a1_ref: Some("A1".into()),
            ..CellNode::default()
        });
        let b = store.append(CellNode {
            a1_ref: Some("B1".into()),
            ..CellNode::default()
        });
        let c = store.append(CellNode {
            a1_ref: Some("C1".into()),
            ..CellNode::default()
        });

        assert!(store.remove(b));
        assert_eq!(store.order(), &[a, c]);
        assert_eq!(store.get(a).unwrap().a1_ref.as_deref(), Some("A1"));
        assert_eq!(store.get(c).unwrap().a1_ref.as_deref(), Some("C1"));
        assert_eq!(store.get(b), None);
    }

    #[test]
    fn reorder_frees_unreferenced_slots() {
        let mut store = NodeStore::new();
        let a = store.append(CellNode::default());
        let b = store.append(CellNode::default());
        let c = store.append(CellNode::default());

        store.reorder(vec![c, a]);
        assert_eq!(store.order(), &[c, a]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(b), None);
    }

    #[test]
    fn remove_last_rolls_back_an_append() {
        let mut store = NodeStore::new();
        let a = store.append(CellNode::default());
        store.append(CellNode::default());
        store.remove_last();
        assert_eq!(store.order(), &[a]);
    }
}
