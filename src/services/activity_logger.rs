use actix_web::HttpRequest;
use uuid::Uuid;

use crate::database::models::CreateActivityInput;
use crate::database::repositories::ActivityRepository;

/// Audit sink: every state transition, import and pay-period close is
/// written through here. The core only appends; it never reads audit
/// history back except through the admin report endpoint.
#[derive(Clone)]
pub struct ActivityLogger {
    repository: ActivityRepository,
}

impl ActivityLogger {
    pub fn new(repository: ActivityRepository) -> Self {
        Self { repository }
    }

    /// Extract client info from HTTP request
    fn extract_client_info(&self, req: &HttpRequest) -> (Option<String>, Option<String>) {
        let ip_address = req.connection_info().peer_addr().map(|addr| {
            // Remove port if present
            if addr.contains(':') {
                addr.split(':').next().unwrap_or(addr).to_string()
            } else {
                addr.to_string()
            }
        });

        let user_agent = req
            .headers()
            .get("user-agent")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        (ip_address, user_agent)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn log(
        &self,
        user_id: Option<Uuid>,
        action_type: &str,
        entity_type: &str,
        entity_id: Option<Uuid>,
        old_values: Option<serde_json::Value>,
        new_values: Option<serde_json::Value>,
        description: impl Into<String>,
        req: &HttpRequest,
    ) {
        let (ip_address, user_agent) = self.extract_client_info(req);

        let input = CreateActivityInput {
            user_id,
            action_type: action_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            old_values,
            new_values,
            description: Some(description.into()),
            ip_address,
            user_agent,
        };

        // Audit writes are best-effort; a failed insert is logged, never
        // surfaced to the caller.
        if let Err(err) = self.repository.log_activity(input).await {
            log::error!("Failed to write audit log: {}", err);
        }
    }

    /// Convenience for status transitions: before/after as {"status": ...}.
    #[allow(clippy::too_many_arguments)]
    pub async fn log_transition(
        &self,
        user_id: Uuid,
        action_type: &str,
        entity_type: &str,
        entity_id: Uuid,
        old_status: &str,
        new_status: &str,
        description: impl Into<String>,
        req: &HttpRequest,
    ) {
        self.log(
            Some(user_id),
            action_type,
            entity_type,
            Some(entity_id),
            Some(serde_json::json!({ "status": old_status })),
            Some(serde_json::json!({ "status": new_status })),
            description,
            req,
        )
        .await;
    }
}
