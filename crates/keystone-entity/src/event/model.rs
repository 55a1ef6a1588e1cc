//! Security event entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::severity::{EventCategory, EventSeverity};

/// One entry in the append-only security audit trail.
///
/// Events are never mutated after creation except for the resolution
/// fields, which an operator workflow sets.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SecurityEvent {
    /// Row identifier.
    pub id: Uuid,
    /// The account the event concerns, when attributable.
    pub account_id: Option<Uuid>,
    /// Machine-readable event name (e.g. `"account_locked"`).
    pub event_type: String,
    /// Broad category.
    pub category: EventCategory,
    /// Severity.
    pub severity: EventSeverity,
    /// Source IP associated with the event.
    pub ip_address: Option<String>,
    /// User-agent associated with the event.
    pub user_agent: Option<String>,
    /// The session involved, if any.
    pub session_id: Option<Uuid>,
    /// Free-form contextual data.
    pub data: Option<serde_json::Value>,
    /// When the event occurred.
    pub created_at: DateTime<Utc>,
    /// When an operator resolved the event.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Who resolved the event.
    pub resolved_by: Option<Uuid>,
}

impl SecurityEvent {
    /// Build a new unresolved event occurring now.
    pub fn new(
        account_id: Option<Uuid>,
        event_type: impl Into<String>,
        category: EventCategory,
        severity: EventSeverity,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            event_type: event_type.into(),
            category,
            severity,
            ip_address: None,
            user_agent: None,
            session_id: None,
            data: None,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
        }
    }

    /// Attach request context to the event.
    pub fn with_context(
        mut self,
        ip_address: Option<String>,
        user_agent: Option<String>,
        session_id: Option<Uuid>,
    ) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self.session_id = session_id;
        self
    }

    /// Attach free-form data to the event.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}
