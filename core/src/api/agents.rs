//! Enrolled Elastic Agents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::operation::{Endpoint, Operation, RequestBody, SuccessStatus};
use crate::query::Query;
use crate::types::{ActionResponse, Empty, ItemResponse, ListResponse, SortOrder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checkin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checkin_status: Option<String>,
    /// Host and agent metadata as reported by the agent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_provided_metadata: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default)]
pub struct ListAgents {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub kuery: Option<String>,
    pub show_inactive: Option<bool>,
    pub show_upgradeable: Option<bool>,
    pub get_status_summary: Option<bool>,
    pub sort_field: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl Operation for ListAgents {
    type Response = ListResponse<Agent>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agents.list",
        method: HttpMethod::Get,
        path: "/api/fleet/agents",
        success: SuccessStatus::Ok,
    };

    fn query(&self, query: &mut Query) {
        query
            .push("page", self.page)
            .push("perPage", self.per_page)
            .push("kuery", self.kuery.as_deref())
            .push("showInactive", self.show_inactive)
            .push("showUpgradeable", self.show_upgradeable)
            .push("getStatusSummary", self.get_status_summary)
            .push("sortField", self.sort_field.as_deref())
            .push("sortOrder", self.sort_order);
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetAgent {
    pub agent_id: String,
    pub with_metrics: Option<bool>,
}

impl Operation for GetAgent {
    type Response = ItemResponse<Agent>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agents.get",
        method: HttpMethod::Get,
        path: "/api/fleet/agents/{agentId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("agentId", self.agent_id.as_str())]
    }

    fn query(&self, query: &mut Query) {
        query.push("withMetrics", self.with_metrics);
    }
}

/// Fields an operator may change on an enrolled agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_provided_metadata: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAgent {
    pub agent_id: String,
    pub body: AgentUpdate,
}

impl Operation for UpdateAgent {
    type Response = ItemResponse<Agent>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agents.update",
        method: HttpMethod::Put,
        path: "/api/fleet/agents/{agentId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("agentId", self.agent_id.as_str())]
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&self.body).map(Some)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteAgent {
    pub agent_id: String,
}

impl Operation for DeleteAgent {
    type Response = ActionResponse;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agents.delete",
        method: HttpMethod::Delete,
        path: "/api/fleet/agents/{agentId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("agentId", self.agent_id.as_str())]
    }
}

/// Move an agent to another agent policy.
#[derive(Debug, Clone, Default)]
pub struct ReassignAgent {
    pub agent_id: String,
    pub policy_id: String,
}

#[derive(Serialize)]
struct ReassignBody<'a> {
    policy_id: &'a str,
}

impl Operation for ReassignAgent {
    type Response = Empty;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agents.reassign",
        method: HttpMethod::Post,
        path: "/api/fleet/agents/{agentId}/reassign",
        success: SuccessStatus::Below299,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("agentId", self.agent_id.as_str())]
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&ReassignBody {
            policy_id: &self.policy_id,
        })
        .map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        Self::ENDPOINT.require("policy_id", &self.policy_id)
    }
}
