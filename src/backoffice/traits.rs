//! Trait abstraction for the back office to enable mocking in tests

use crate::state::{Agency, Agent, AgentPayload, TransferPayload, TransferStatus};
use anyhow::Result;
use async_trait::async_trait;

/// Back-office operations, shared behind an `Arc` by the app and its
/// submission tasks
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackOfficeTrait: Send + Sync {
    /// Agencies where transfers can be paid out
    async fn list_agencies(&self) -> Result<Vec<Agency>>;

    async fn list_transfers(&self) -> Result<Vec<TransferPayload>>;

    async fn list_agents(&self) -> Result<Vec<Agent>>;

    /// Record a new transfer. Fails on a duplicate id or an agency the
    /// service does not know.
    async fn create_transfer(&self, transfer: TransferPayload) -> Result<()>;

    /// Record a new agent. Logins are unique.
    async fn create_agent(&self, agent: AgentPayload) -> Result<()>;

    /// Validate or reject a pending transfer
    async fn set_transfer_status(&self, id: &str, status: TransferStatus) -> Result<()>;
}
