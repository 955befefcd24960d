use crate::domain::UserId;
use crate::domain::audit::{AuditAction, AuditEntry, EntityType};
use crate::domain::ports::{LedgerTransaction, Sequence};
use crate::error::Result;
use chrono::Utc;

/// Appends audit entries to the caller's transaction.
///
/// There is no separate commit: an entry persists exactly when the mutation
/// it documents does.
pub struct AuditRecorder;

impl AuditRecorder {
    pub async fn record(
        tx: &mut dyn LedgerTransaction,
        actor: Option<UserId>,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: impl ToString,
        detail: impl Into<String>,
    ) -> Result<AuditEntry> {
        let entry = AuditEntry {
            id: tx.next_id(Sequence::Audit).await?,
            actor,
            action,
            entity_type,
            entity_id: entity_id.to_string(),
            detail: detail.into(),
            created_at: Utc::now(),
        };
        tx.append_audit(entry.clone()).await?;
        Ok(entry)
    }
}
