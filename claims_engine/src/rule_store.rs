//! Insertion-ordered rule storage.
//!
//! Index rebuilds walk rules in insertion order, which is what makes
//! collisions resolve last-indexed-wins. Replacing a rule keeps its slot.

use std::collections::HashMap;

use crate::rule::{Rule, RuleId};
use crate::stage::Stage;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleStore {
    rules: HashMap<RuleId, Rule>,
    order: Vec<RuleId>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous rule under the same id.
    pub fn insert(&mut self, rule: Rule) -> Option<Rule> {
        let id = rule.id.clone();
        let previous = self.rules.insert(id.clone(), rule);
        if previous.is_none() {
            self.order.push(id);
        }
        previous
    }

    pub fn get(&self, id: &RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn get_mut(&mut self, id: &RuleId) -> Option<&mut Rule> {
        self.rules.get_mut(id)
    }

    pub fn remove(&mut self, id: &RuleId) -> Option<Rule> {
        let removed = self.rules.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(removed)
    }

    /// All rules in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.order.iter().filter_map(move |id| self.rules.get(id))
    }

    /// Rules of one stage in insertion order.
    pub fn iter_stage(&self, stage: Stage) -> impl Iterator<Item = &Rule> {
        self.iter().filter(move |rule| rule.stage == stage)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::RuleDraft;
    use chrono::Utc;
    use serde_json::json;

    fn rule(id: &str, stage: Stage) -> Rule {
        Rule::from_draft(RuleId::from(id), RuleDraft::new(stage), Utc::now())
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = RuleStore::new();
        store.insert(rule("RULE-b", Stage::Eligibility));
        store.insert(rule("RULE-a", Stage::Reconciliation));
        store.insert(rule("RULE-c", Stage::Eligibility));

        let ids: Vec<_> = store.iter().map(|r| r.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["RULE-b", "RULE-a", "RULE-c"]);

        let eligibility: Vec<_> = store
            .iter_stage(Stage::Eligibility)
            .map(|r| r.id.as_str().to_string())
            .collect();
        assert_eq!(eligibility, vec!["RULE-b", "RULE-c"]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut store = RuleStore::new();
        store.insert(rule("RULE-a", Stage::Eligibility));
        store.insert(rule("RULE-b", Stage::Eligibility));

        let mut replacement = rule("RULE-a", Stage::Eligibility);
        replacement.outcome.insert("outcome_code".into(), json!("ELG_OK"));
        assert!(store.insert(replacement).is_some());

        assert_eq!(store.len(), 2);
        assert_eq!(store.iter().next().unwrap().id.as_str(), "RULE-a");
    }

    #[test]
    fn test_remove() {
        let mut store = RuleStore::new();
        store.insert(rule("RULE-a", Stage::Eligibility));
        assert!(store.remove(&RuleId::from("RULE-a")).is_some());
        assert!(store.remove(&RuleId::from("RULE-a")).is_none());
        assert!(store.is_empty());
    }
}
