//! Free-variable partitioning tokens.
//!
//! The value-refinement machinery tags values with the partition nodes they
//! were refined under. The lattice never interprets the tokens; it only
//! carries them through joins.

use sable_util::{Join, PersistentSet};

/// One partition node, allocated by the embedding analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionToken(pub u32);

/// The set of partition nodes a value has been refined under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FreeVariablePartitioning {
    nodes: PersistentSet<PartitionToken>,
}

impl FreeVariablePartitioning {
    pub fn new(nodes: PersistentSet<PartitionToken>) -> Self {
        Self { nodes }
    }

    pub fn unit(token: PartitionToken) -> Self {
        Self {
            nodes: PersistentSet::unit(token),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, token: &PartitionToken) -> bool {
        self.nodes.contains(token)
    }
}

impl Join for FreeVariablePartitioning {
    fn join(&self, other: &Self) -> Self {
        Self {
            nodes: self.nodes.union(&other.nodes),
        }
    }
}
