// Per-stage unique index: composite key -> rule id.
//
// The index is derived state. Every entry is a pure function of the rule
// store at rebuild time, computed by running each rule's reference example
// through the same composite builder incoming requests use.
//
// Memory Model:
// - Each stage partition is an immutable `Arc<StageIndex>`
// - Rebuilds assemble a complete new partition off to the side, then swap
//   it in with a single pointer replacement
// - Readers cloning the `Arc` see either the old or the new partition,
//   never a half-built one

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::composite::{build_composite, CompositeKey};
use crate::rule::{Rule, RuleId};
use crate::rule_store::RuleStore;
use crate::stage::Stage;

// ============================================================================
// Core Types
// ============================================================================

/// Two rules produced the same composite key; `replacement` won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub stage: Stage,
    pub composite: CompositeKey,
    pub previous: RuleId,
    pub replacement: RuleId,
}

/// One stage's immutable key -> rule map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageIndex {
    entries: BTreeMap<CompositeKey, RuleId>,
}

impl StageIndex {
    pub fn get(&self, key: &CompositeKey) -> Option<&RuleId> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CompositeKey, &RuleId)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert with last-wins semantics, reporting any displaced rule.
    fn insert(&mut self, stage: Stage, key: CompositeKey, id: RuleId) -> Option<Collision> {
        match self.entries.insert(key.clone(), id.clone()) {
            Some(previous) if previous != id => Some(Collision {
                stage,
                composite: key,
                previous,
                replacement: id,
            }),
            _ => None,
        }
    }
}

/// Unique index over all stages.
#[derive(Debug, Clone, Default)]
pub struct UniqueIndex {
    stages: HashMap<Stage, Arc<StageIndex>>,
}

impl PartialEq for UniqueIndex {
    fn eq(&self, other: &Self) -> bool {
        let non_empty = |index: &UniqueIndex| {
            index
                .stages
                .iter()
                .filter(|(_, partition)| !partition.is_empty())
                .map(|(stage, partition)| (*stage, partition.as_ref().clone()))
                .collect::<BTreeMap<_, _>>()
        };
        non_empty(self) == non_empty(other)
    }
}

// ============================================================================
// Maintenance
// ============================================================================

impl UniqueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild one stage from the rule store.
    ///
    /// Rules are visited in store order; a later rule with the same key
    /// replaces an earlier one and the replacement is reported. A stage
    /// without fields ends up with an empty partition. Idempotent for the
    /// same store contents.
    pub fn rebuild_stage(
        &mut self,
        stage: Stage,
        fields: Option<&[String]>,
        store: &RuleStore,
    ) -> Vec<Collision> {
        let mut partition = StageIndex::default();
        let mut collisions = Vec::new();

        if let Some(fields) = fields {
            for rule in store.iter_stage(stage) {
                if let Some(key) = build_composite(&rule.reference_example, fields) {
                    collisions.extend(partition.insert(stage, key, rule.id.clone()));
                }
            }
        }

        self.stages.insert(stage, Arc::new(partition));
        collisions
    }

    /// Index a single freshly created rule without rebuilding its stage.
    ///
    /// Same overwrite semantics as a rebuild. Returns the collision, if the
    /// key was already held by a different rule.
    pub fn index_single_rule(&mut self, rule: &Rule, fields: Option<&[String]>) -> Option<Collision> {
        let key = build_composite(&rule.reference_example, fields?)?;
        let current = self.stages.get(&rule.stage).cloned().unwrap_or_default();

        let mut partition = current.as_ref().clone();
        let collision = partition.insert(rule.stage, key, rule.id.clone());
        self.stages.insert(rule.stage, Arc::new(partition));
        collision
    }

    pub fn lookup(&self, stage: Stage, key: &CompositeKey) -> Option<&RuleId> {
        self.stages.get(&stage)?.get(key)
    }

    /// Snapshot of one stage's partition.
    pub fn stage(&self, stage: Stage) -> Option<Arc<StageIndex>> {
        self.stages.get(&stage).cloned()
    }

    /// All partitions, stages in workflow order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, &StageIndex)> {
        Stage::ALL
            .into_iter()
            .filter_map(move |stage| self.stages.get(&stage).map(|p| (stage, p.as_ref())))
    }

    pub fn len(&self) -> usize {
        self.stages.values().map(|partition| partition.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.stages.clear();
    }
}
