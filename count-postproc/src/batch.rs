use count_store::{GraphId, TypeId};
use serde::{Deserialize, Serialize};

/// Net change in instance count for one type caused by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDelta {
    pub type_id: TypeId,
    pub delta: i64,
}

impl InstanceDelta {
    pub fn new(type_id: impl Into<TypeId>, delta: i64) -> Self {
        Self {
            type_id: type_id.into(),
            delta,
        }
    }
}

/// Deltas of one committed transaction against one graph.
///
/// The same type may appear more than once; entries carry no ordering
/// meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitBatch {
    pub graph: GraphId,
    #[serde(default)]
    pub deltas: Vec<InstanceDelta>,
}

impl CommitBatch {
    pub fn new(graph: impl Into<GraphId>) -> Self {
        Self {
            graph: graph.into(),
            deltas: Vec::new(),
        }
    }

    pub fn with_delta(
        mut self,
        type_id: impl Into<TypeId>,
        delta: i64,
    ) -> Self {
        self.deltas.push(InstanceDelta::new(type_id, delta));
        self
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }
}

impl<T: Into<TypeId>> Extend<(T, i64)> for CommitBatch {
    fn extend<I: IntoIterator<Item = (T, i64)>>(&mut self, iter: I) {
        self.deltas.extend(
            iter.into_iter()
                .map(|(type_id, delta)| InstanceDelta::new(type_id, delta)),
        );
    }
}
