// Append-only audit log for resolutions and index maintenance.
// This module provides:
// 1. Audit events with sequence numbers and UTC timestamps
// 2. Provenance hashes for tamper detection
// 3. A builder so call sites only name what they know
// 4. Bounded tail queries over an unbounded in-process log
//
// Events are never updated or deleted; a reseed replaces the whole log.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::stage::Stage;

/// Unique sequence number for audit events
pub type SequenceNumber = u64;

/// Resolution and request traffic.
pub const ACTOR_GATEWAY: &str = "gateway";
/// Index maintenance and seeding.
pub const ACTOR_SYSTEM: &str = "system";
/// Rule CRUD.
pub const ACTOR_ADMIN: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Warning,
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    Match,
    IndexMiss,
    MissingFields,
    StageNotConfigured,
    IndexCollision,
    IndexCollisionSingle,
    SeedRuleSkipped,
    RuleCreated,
    RuleUpdated,
    RuleDeleted,
    Seeded,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::Match => "match",
            AuditEventType::IndexMiss => "index_miss",
            AuditEventType::MissingFields => "missing_fields",
            AuditEventType::StageNotConfigured => "stage_not_configured",
            AuditEventType::IndexCollision => "index_collision",
            AuditEventType::IndexCollisionSingle => "index_collision_single",
            AuditEventType::SeedRuleSkipped => "seed_rule_skipped",
            AuditEventType::RuleCreated => "rule_created",
            AuditEventType::RuleUpdated => "rule_updated",
            AuditEventType::RuleDeleted => "rule_deleted",
            AuditEventType::Seeded => "seeded",
        }
    }

    /// Level used when the caller does not override it.
    pub fn default_level(&self) -> AuditLevel {
        match self {
            AuditEventType::IndexCollision
            | AuditEventType::IndexCollisionSingle
            | AuditEventType::SeedRuleSkipped => AuditLevel::Warning,
            _ => AuditLevel::Info,
        }
    }
}

/// A single immutable audit event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Sequence number (monotonically increasing)
    pub seq: SequenceNumber,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub stage: Option<Stage>,
    pub event_type: AuditEventType,
    pub level: AuditLevel,
    /// Freeform diagnostics; never shown to resolution callers
    pub payload_summary: Map<String, Value>,
    pub reference_ids: BTreeMap<String, String>,
    pub provenance_hash: String,
}

impl AuditEvent {
    pub fn builder(actor: &str, event_type: AuditEventType) -> AuditEventBuilder {
        AuditEventBuilder::new(actor, event_type)
    }

    /// Compute provenance hash for tamper detection
    pub fn compute_provenance_hash(
        seq: SequenceNumber,
        actor: &str,
        stage: Option<Stage>,
        event_type: AuditEventType,
        timestamp: &DateTime<Utc>,
    ) -> String {
        let mut hasher = Sha256::new();

        hasher.update(seq.to_le_bytes());
        hasher.update(actor.as_bytes());
        hasher.update(stage.map(|s| s.as_str()).unwrap_or("").as_bytes());
        hasher.update(event_type.as_str().as_bytes());
        hasher.update(
            timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, true)
                .as_bytes(),
        );

        format!("{:x}", hasher.finalize())
    }

    /// Verify the provenance hash
    pub fn verify_provenance(&self) -> bool {
        let computed = Self::compute_provenance_hash(
            self.seq,
            &self.actor,
            self.stage,
            self.event_type,
            &self.timestamp,
        );
        computed == self.provenance_hash
    }
}

/// Collects event fields until the log assigns sequence and hash.
#[derive(Debug, Clone)]
pub struct AuditEventBuilder {
    actor: String,
    stage: Option<Stage>,
    event_type: AuditEventType,
    level: AuditLevel,
    payload_summary: Map<String, Value>,
    reference_ids: BTreeMap<String, String>,
}

impl AuditEventBuilder {
    pub fn new(actor: &str, event_type: AuditEventType) -> Self {
        Self {
            actor: actor.to_string(),
            stage: None,
            event_type,
            level: event_type.default_level(),
            payload_summary: Map::new(),
            reference_ids: BTreeMap::new(),
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn level(mut self, level: AuditLevel) -> Self {
        self.level = level;
        self
    }

    pub fn payload(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload_summary.insert(key.to_string(), value.into());
        self
    }

    pub fn reference(mut self, key: &str, id: impl Into<String>) -> Self {
        self.reference_ids.insert(key.to_string(), id.into());
        self
    }

    fn build(self, seq: SequenceNumber, timestamp: DateTime<Utc>) -> AuditEvent {
        let provenance_hash = AuditEvent::compute_provenance_hash(
            seq,
            &self.actor,
            self.stage,
            self.event_type,
            &timestamp,
        );

        AuditEvent {
            seq,
            timestamp,
            actor: self.actor,
            stage: self.stage,
            event_type: self.event_type,
            level: self.level,
            payload_summary: self.payload_summary,
            reference_ids: self.reference_ids,
            provenance_hash,
        }
    }
}

/// In-process audit log.
#[derive(Debug, Default)]
pub struct AuditLog {
    next_seq: SequenceNumber,
    events: Vec<AuditEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and append an event, returning its sequence number.
    pub fn append(&mut self, builder: AuditEventBuilder) -> SequenceNumber {
        let seq = self.next_seq;
        self.next_seq += 1;

        let event = builder.build(seq, Utc::now());
        match event.level {
            AuditLevel::Warning => log::warn!(
                "audit {} stage={} {:?}",
                event.event_type.as_str(),
                event.stage.map(|s| s.as_str()).unwrap_or("-"),
                event.reference_ids
            ),
            AuditLevel::Info => log::debug!(
                "audit {} stage={}",
                event.event_type.as_str(),
                event.stage.map(|s| s.as_str()).unwrap_or("-")
            ),
        }
        self.events.push(event);
        seq
    }

    /// The most recent `limit` events, oldest first.
    pub fn tail(&self, limit: usize) -> Vec<AuditEvent> {
        let start = self.events.len().saturating_sub(limit);
        self.events[start..].to_vec()
    }

    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
