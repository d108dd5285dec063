//! Support Ticket Tool
//!
//! Opens a ticket with the issue-tracker collaborator. Only the sink seam is
//! owned here; the tracker integration lives behind [`TicketSink`]. This is
//! the one tool flagged with side effects, which is what the reasoning loop
//! uses for interaction accounting.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use support_core::{
    tool::{ParameterSchema, Tool, ToolCall, ToolResult, ToolSchema},
    Result as CoreResult,
};

use crate::error::Result;
use crate::model::TenantContext;

/// A ticket creation request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketRequest {
    /// Merchant display name
    pub tenant_name: String,

    /// Channel the request came from
    pub channel_id: String,

    /// One-line summary
    pub summary: String,

    /// Free-form details
    pub details: Option<String>,
}

/// Issue-tracker seam. Implementations own the tracker protocol.
#[async_trait]
pub trait TicketSink: Send + Sync {
    /// Create a ticket, returning its reference
    async fn create_ticket(&self, request: &TicketRequest) -> Result<String>;
}

/// Sink that only logs the ticket (default wiring and tests)
pub struct LogTicketSink;

#[async_trait]
impl TicketSink for LogTicketSink {
    async fn create_ticket(&self, request: &TicketRequest) -> Result<String> {
        let reference = format!("TCK-{}", &uuid::Uuid::new_v4().simple().to_string()[..8]);
        tracing::info!(
            reference = %reference,
            tenant = %request.tenant_name,
            summary = %request.summary,
            "support ticket recorded"
        );
        Ok(reference)
    }
}

/// Tool opening a support ticket on the merchant's behalf
pub struct CreateTicketTool {
    sink: Arc<dyn TicketSink>,
    ctx: TenantContext,
}

impl CreateTicketTool {
    pub fn new(sink: Arc<dyn TicketSink>, ctx: TenantContext) -> Self {
        Self { sink, ctx }
    }
}

#[async_trait]
impl Tool for CreateTicketTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_support_ticket".into(),
            description: "Open a support ticket for an issue that needs human follow-up. \
                          Use only when the merchant explicitly asks for escalation or the \
                          available tools cannot answer."
                .into(),
            parameters: vec![
                ParameterSchema::string("summary", "One-line summary of the issue", true),
                ParameterSchema::string("details", "Relevant context for the support team", false),
            ],
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let request = TicketRequest {
            tenant_name: self.ctx.display_name.clone(),
            channel_id: self.ctx.channel_id.clone(),
            summary: call.str_arg("summary").unwrap_or_default().to_string(),
            details: call.str_arg("details").map(ToString::to_string),
        };

        let reference = self
            .sink
            .create_ticket(&request)
            .await
            .map_err(|e| support_core::AgentError::ToolExecution(e.to_string()))?;

        Ok(ToolResult::success(
            "create_support_ticket",
            format!("Ticket {} created for {}.", reference, self.ctx.display_name),
        ))
    }
}
