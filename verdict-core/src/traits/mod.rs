//! Collaborator interfaces. Evidence, facts, and line items are produced by
//! out-of-scope subsystems (extraction, grouping, derivation); the engine
//! only reads them through these traits. Run and result stores are the
//! engine's own write surface.

mod audit;
mod stores;

pub use audit::AuditSink;
pub use stores::{
    DecisionResultStore, DecisionRunStore, DocumentLinkStore, EvidenceGroupStore, EvidenceStore,
    FactStore, LineItemStore,
};
