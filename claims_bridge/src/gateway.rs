// Transport-neutral gateway in front of the simulator.
//
// Design:
// - Every stage request is parsed, resolved and turned into a reply that a
//   transport (HTTP handler, CLI) can emit without further decisions.
// - A single unmatched request is `NotFound`; batches are always `Ok` with
//   positional bodies.
// - The composite diagnostic header carries the JSON-encoded incoming
//   composite (single) or the JSON array of composites (batch).
// - Eligibility fetches never leak why they failed: a missing collection,
//   an unreadable export or an empty result are all the generic unmatched
//   reply.

use log::{debug, warn};
use serde_json::Value;
use std::sync::Arc;

use claims_engine::{ClaimsSimulator, CompositeKey, Resolution, ResolutionOutcome, Stage};

use crate::config::BridgeConfig;
use crate::document_source::DocumentSource;
use crate::error::BridgeResult;
use crate::payload::parse_payload;

pub const COMPOSITE_HEADER: &str = "X-SIM-INCOMING-COMPOSITE";
pub const COMPOSITES_HEADER: &str = "X-SIM-INCOMING-COMPOSITES";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    NotFound,
}

impl ReplyStatus {
    pub fn http_code(&self) -> u16 {
        match self {
            ReplyStatus::Ok => 200,
            ReplyStatus::NotFound => 404,
        }
    }
}

/// A fully decided response.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayReply {
    pub status: ReplyStatus,
    pub body: Value,
    /// Composite diagnostic header; absent when resolution never ran
    pub header: Option<(&'static str, String)>,
}

impl GatewayReply {
    fn unmatched(message: &str) -> Self {
        Self {
            status: ReplyStatus::NotFound,
            body: Resolution::unmatched(message).to_json(),
            header: None,
        }
    }

    fn single(outcome: ResolutionOutcome) -> Self {
        let status = if outcome.response.matched {
            ReplyStatus::Ok
        } else {
            ReplyStatus::NotFound
        };
        Self {
            status,
            body: outcome.response.to_json(),
            header: Some((COMPOSITE_HEADER, encode_composite(outcome.composite.as_ref()))),
        }
    }
}

/// `""` when no composite was built, otherwise the JSON string literal.
fn encode_composite(composite: Option<&CompositeKey>) -> String {
    match composite {
        Some(key) => Value::String(key.as_str().to_string()).to_string(),
        None => String::new(),
    }
}

pub struct Gateway {
    simulator: Arc<ClaimsSimulator>,
    source: Box<dyn DocumentSource>,
    config: BridgeConfig,
}

impl Gateway {
    pub fn new(simulator: Arc<ClaimsSimulator>, source: Box<dyn DocumentSource>, config: BridgeConfig) -> Self {
        Self { simulator, source, config }
    }

    pub fn simulator(&self) -> &Arc<ClaimsSimulator> {
        &self.simulator
    }

    /// Parse a raw body and resolve it at `stage`.
    pub fn submit(&self, stage: Stage, body: &str) -> BridgeResult<GatewayReply> {
        let payload = parse_payload(body)?;
        Ok(self.submit_value(stage, payload))
    }

    /// Resolve an already parsed payload. Arrays are batches.
    pub fn submit_value(&self, stage: Stage, payload: Value) -> GatewayReply {
        match payload {
            Value::Array(documents) => {
                let batch = self.simulator.resolve_batch(stage, &documents);
                let composites: Vec<Value> = batch
                    .composites()
                    .into_iter()
                    .map(|key| key.map_or(Value::Null, |k| Value::String(k.as_str().to_string())))
                    .collect();
                debug!("Resolved batch of {} at {}", batch.len(), stage);
                GatewayReply {
                    status: ReplyStatus::Ok,
                    body: batch.to_json(),
                    header: Some((COMPOSITES_HEADER, Value::Array(composites).to_string())),
                }
            }
            document => GatewayReply::single(self.simulator.resolve(stage, &document)),
        }
    }

    /// Pull a stored document and resolve it at eligibility.
    ///
    /// The collection falls back to the configured default; the filter is
    /// applied only when both field and value are non-empty.
    pub fn fetch_eligibility(
        &self,
        collection: Option<&str>,
        unique_field: Option<&str>,
        unique_value: Option<&str>,
    ) -> GatewayReply {
        let message = &self.simulator.config().unmatched_message;

        let collection = collection
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .or_else(|| self.config.fetch_collection.as_deref());
        let Some(collection) = collection else {
            return GatewayReply::unmatched(message);
        };

        let filter = match (unique_field, unique_value) {
            (Some(field), Some(value)) if !field.is_empty() && !value.is_empty() => Some((field, value)),
            _ => None,
        };

        match self.source.fetch(collection, filter) {
            Ok(Some(document)) => GatewayReply::single(self.simulator.resolve(Stage::Eligibility, &document)),
            Ok(None) => GatewayReply::unmatched(message),
            Err(e) => {
                warn!("Eligibility fetch from '{}' failed: {}", collection, e);
                GatewayReply::unmatched(message)
            }
        }
    }

    /// Remittance status for a claim reference.
    pub fn remittance(&self, claim_ref_id: &str) -> GatewayReply {
        GatewayReply::single(self.simulator.lookup_remittance(claim_ref_id))
    }
}
