//! Package policies: integrations attached to agent policies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::operation::{Endpoint, Operation, RequestBody, SuccessStatus};
use crate::query::Query;
use crate::types::{Format, IdResponse, ItemResponse, ListResponse, SortOrder};

/// Package a policy installs, e.g. `system` at `1.54.0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageReference {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackagePolicy {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default)]
    pub policy_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageReference>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub revision: u64,
    /// Shape depends on the requested [`Format`]; kept untyped.
    #[serde(default)]
    pub inputs: Value,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, Value>,
}

/// Body of create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackagePolicyBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vars: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ListPackagePolicies {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub sort_field: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub kuery: Option<String>,
    pub show_upgradeable: Option<bool>,
    pub with_agent_count: Option<bool>,
    pub format: Option<Format>,
}

impl Operation for ListPackagePolicies {
    type Response = ListResponse<PackagePolicy>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.package_policies.list",
        method: HttpMethod::Get,
        path: "/api/fleet/package_policies",
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
            .push("withAgentCount", self.with_agent_count)
            .push("format", self.format);
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetPackagePolicy {
    pub package_policy_id: String,
    pub format: Option<Format>,
}

impl Operation for GetPackagePolicy {
    type Response = ItemResponse<PackagePolicy>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.package_policies.get",
        method: HttpMethod::Get,
        path: "/api/fleet/package_policies/{packagePolicyId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("packagePolicyId", self.package_policy_id.as_str())]
    }

    fn query(&self, query: &mut Query) {
        query.push("format", self.format);
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreatePackagePolicy {
    pub body: PackagePolicyBody,
    pub format: Option<Format>,
}

impl Operation for CreatePackagePolicy {
    type Response = ItemResponse<PackagePolicy>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.package_policies.create",
        method: HttpMethod::Post,
        path: "/api/fleet/package_policies",
        success: SuccessStatus::Ok,
    };

    fn query(&self, query: &mut Query) {
        query.push("format", self.format);
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&self.body).map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        Self::ENDPOINT.require("name", &self.body.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePackagePolicy {
    pub package_policy_id: String,
    pub body: PackagePolicyBody,
    pub format: Option<Format>,
}

impl Operation for UpdatePackagePolicy {
    type Response = ItemResponse<PackagePolicy>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.package_policies.update",
        method: HttpMethod::Put,
        path: "/api/fleet/package_policies/{packagePolicyId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("packagePolicyId", self.package_policy_id.as_str())]
    }

    fn query(&self, query: &mut Query) {
        query.push("format", self.format);
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&self.body).map(Some)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeletePackagePolicy {
    pub package_policy_id: String,
    /// Delete even when the policy is managed.
    pub force: Option<bool>,
}

impl Operation for DeletePackagePolicy {
    type Response = IdResponse;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.package_policies.delete",
        method: HttpMethod::Delete,
        path: "/api/fleet/package_policies/{packagePolicyId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("packagePolicyId", self.package_policy_id.as_str())]
    }

    fn query(&self, query: &mut Query) {
        query.push("force", self.force);
    }
}
