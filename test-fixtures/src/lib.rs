//! Shared test fixtures: in-memory collaborator stores and builders for
//! policies, groups, facts, and line items, used by integration tests across
//! the workspace.

pub mod builders;
pub mod stores;

pub use builders::{
    confirmed_link, evidence, group, line_item, price_fact, sample_policy, ungrouped_group,
};
pub use stores::{
    FailingAuditSink, InMemoryCaseStore, InMemoryResultStore, InMemoryRunStore, MemoryAuditSink,
};
