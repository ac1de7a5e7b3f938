//! Agent policies: `/api/fleet/agent_policies`.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::operation::{Endpoint, Operation, RequestBody, SuccessStatus};
use crate::query::Query;
use crate::types::{Format, ItemResponse, ListResponse, SortOrder};

/// An agent policy as returned by Fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPolicy {
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub monitoring_enabled: Vec<String>,
    #[serde(default)]
    pub is_managed: bool,
    #[serde(default)]
    pub is_protected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub revision: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_output_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_output_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet_server_host_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactivity_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Body of create and update calls. Unset fields are left out of the JSON
/// so Fleet applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentPolicyBody {
    /// Custom id; only honored on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_enabled: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_output_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_output_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fleet_server_host_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactivity_timeout: Option<u64>,
}

impl AgentPolicyBody {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    fn validate(&self, endpoint: &Endpoint) -> Result<(), ApiError> {
        endpoint.require("name", &self.name)?;
        endpoint.require("namespace", &self.namespace)
    }
}

/// Returned by `fleet.agent_policies.delete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedAgentPolicy {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct ListAgentPolicies {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_field: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub kuery: Option<String>,
    pub show_upgradeable: Option<bool>,
    pub no_agent_count: Option<bool>,
    pub full: Option<bool>,
    pub format: Option<Format>,
}

impl Operation for ListAgentPolicies {
    type Response = ListResponse<AgentPolicy>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agent_policies.list",
        method: HttpMethod::Get,
        path: "/api/fleet/agent_policies",
        success: SuccessStatus::Ok,
    };

    fn query(&self, query: &mut Query) {
        query
            .push("page", self.page)
            .push("perPage", self.per_page)
            .push("sortField", self.sort_field.as_deref())
            .push("sortOrder", self.sort_order)
            .push("kuery", self.kuery.as_deref())
            .push("showUpgradeable", self.show_upgradeable)
            .push("noAgentCount", self.no_agent_count)
            .push("full", self.full)
            .push("format", self.format);
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetAgentPolicy {
    pub agent_policy_id: String,
    pub format: Option<Format>,
}

impl GetAgentPolicy {
    pub fn new(agent_policy_id: impl Into<String>) -> Self {
        Self {
            agent_policy_id: agent_policy_id.into(),
            format: None,
        }
    }
}

impl Operation for GetAgentPolicy {
    type Response = ItemResponse<AgentPolicy>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agent_policies.get",
        method: HttpMethod::Get,
        path: "/api/fleet/agent_policies/{agentPolicyId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("agentPolicyId", self.agent_policy_id.as_str())]
    }

    fn query(&self, query: &mut Query) {
        query.push("format", self.format);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateAgentPolicy {
    pub body: AgentPolicyBody,
    /// Also install the system integration and enable monitoring.
    pub sys_monitoring: Option<bool>,
}

impl Operation for CreateAgentPolicy {
    type Response = ItemResponse<AgentPolicy>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agent_policies.create",
        method: HttpMethod::Post,
        path: "/api/fleet/agent_policies",
        success: SuccessStatus::Ok,
    };

    fn query(&self, query: &mut Query) {
        query.push("sys_monitoring", self.sys_monitoring);
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&self.body).map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        self.body.validate(&Self::ENDPOINT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAgentPolicy {
    pub agent_policy_id: String,
    pub body: AgentPolicyBody,
}

impl Operation for UpdateAgentPolicy {
    type Response = ItemResponse<AgentPolicy>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agent_policies.update",
        method: HttpMethod::Put,
        path: "/api/fleet/agent_policies/{agentPolicyId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("agentPolicyId", self.agent_policy_id.as_str())]
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&self.body).map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        self.body.validate(&Self::ENDPOINT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CopyAgentPolicy {
    pub agent_policy_id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Serialize)]
struct CopyBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl Operation for CopyAgentPolicy {
    type Response = ItemResponse<AgentPolicy>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agent_policies.copy",
        method: HttpMethod::Post,
        path: "/api/fleet/agent_policies/{agentPolicyId}/copy",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("agentPolicyId", self.agent_policy_id.as_str())]
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        let body = CopyBody {
            name: &self.name,
            description: self.description.as_deref(),
        };
        RequestBody::json(&body).map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        Self::ENDPOINT.require("name", &self.name)
    }
}

/// Deletes are a POST carrying the id in the body.
#[derive(Debug, Clone, Default)]
pub struct DeleteAgentPolicy {
    pub agent_policy_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteBody<'a> {
    agent_policy_id: &'a str,
}

impl Operation for DeleteAgentPolicy {
    type Response = DeletedAgentPolicy;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.agent_policies.delete",
        method: HttpMethod::Post,
        path: "/api/fleet/agent_policies/delete",
        success: SuccessStatus::Ok,
    };

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        let body = DeleteBody {
            agent_policy_id: &self.agent_policy_id,
        };
        RequestBody::json(&body).map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        Self::ENDPOINT.require("agentPolicyId", &self.agent_policy_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_omits_unset_fields() {
        let body = AgentPolicyBody::new("Default policy", "default");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Default policy", "namespace": "default"})
        );
    }

    #[test]
    fn create_requires_name_and_namespace() {
        let request = CreateAgentPolicy {
            body: AgentPolicyBody::new("Default policy", ""),
            sys_monitoring: None,
        };
        let err = request.validate().unwrap_err();
        assert!(matches!(
            err,
            ApiError::MissingParameter { parameter: "namespace", .. }
        ));
    }

    #[test]
    fn delete_sends_camel_case_id() {
        let request = DeleteAgentPolicy {
            agent_policy_id: "p-1".to_string(),
        };
        let body = request.body().unwrap().unwrap();
        assert_eq!(&body.bytes[..], br#"{"agentPolicyId":"p-1"}"#);
    }

    #[test]
    fn delete_requires_id() {
        assert!(DeleteAgentPolicy::default().validate().is_err());
    }

    #[test]
    fn list_query_skips_unset_parameters() {
        let request = ListAgentPolicies {
            per_page: Some(50),
            full: Some(false),
            ..ListAgentPolicies::default()
        };
        let mut query = Query::new();
        request.query(&mut query);
        assert_eq!(
            query.pairs(),
            &[("perPage", "50".to_string()), ("full", "false".to_string())]
        );
    }

    #[test]
    fn policy_decodes_with_missing_optional_fields() {
        let policy: AgentPolicy = serde_json::from_str(
            r#"{"id":"p-1","name":"Default","namespace":"default","revision":3,"monitoring_enabled":["logs"]}"#,
        )
        .unwrap();
        assert_eq!(policy.revision, 3);
        assert_eq!(policy.monitoring_enabled, vec!["logs".to_string()]);
        assert!(policy.description.is_none());
        assert!(!policy.is_managed);
    }
}
