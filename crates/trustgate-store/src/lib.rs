//! Storage adapters: the policy store interface, an in-memory store, and loading policy
//! documents from a directory.
//!
//! This crate is allowed to do filesystem IO. It never evaluates policies; the service
//! layer combines it with the pure engine.

#![forbid(unsafe_code)]

mod discover;
mod memory;
mod store;

pub use discover::{discover_policy_files, load_policy_dir};
pub use memory::{EVALUATION_LOG_CAPACITY, MemoryStore};
pub use store::{
    AuditOperation, AuditRecord, EvaluationRecord, NewPolicy, PolicyFilter, PolicyPage,
    PolicyPatch, PolicyStore, StoreError,
};

/// Fuzz-friendly API for testing document parsing without filesystem access.
/// These functions are designed to never panic on any input.
pub mod fuzz {
    use trustgate_domain::{EngineConfig, PolicyDocument};

    /// Parse arbitrary text as a stored policy document and validate its expressions.
    ///
    /// Returns `Err(...)` on invalid JSON or malformed expressions. **Never panics**.
    pub fn parse_policy(text: &str) -> anyhow::Result<()> {
        let doc: PolicyDocument = serde_json::from_str(text)?;
        doc.validate(&EngineConfig::default())?;
        Ok(())
    }
}
