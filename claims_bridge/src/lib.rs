//! # Claims Bridge Library
//!
//! Collaborators around the claims simulator: claim tracking persistence,
//! stored-document access, request payload parsing and the gateway.

// Core modules
pub mod claim_store;
pub mod config;
pub mod document_source;
pub mod error;
pub mod gateway;
pub mod payload;

// Re-export commonly used types
pub use claim_store::{ClaimRecord, ClaimStore, ClaimUpdate, HistoryEntry, NewClaimRecord};
pub use config::BridgeConfig;
pub use document_source::{DocumentSource, JsonDirSource};
pub use error::{BridgeError, BridgeResult};
pub use gateway::{Gateway, GatewayReply, ReplyStatus, COMPOSITES_HEADER, COMPOSITE_HEADER};
pub use payload::parse_payload;
