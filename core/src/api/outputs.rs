//! Outputs: where agents ship their data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::operation::{Endpoint, Operation, RequestBody, SuccessStatus};
use crate::types::{IdResponse, ItemResponse, ListResponse};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    #[default]
    Elasticsearch,
    RemoteElasticsearch,
    Logstash,
    Kafka,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub output_type: OutputType,
    #[serde(default)]
    pub hosts: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_default_monitoring: bool,
    #[serde(default)]
    pub is_preconfigured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_trusted_fingerprint: Option<String>,
    /// YAML passed through to the agent verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_yaml: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub output_type: OutputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hosts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default_monitoring: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_trusted_fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_yaml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct ListOutputs;

impl Operation for ListOutputs {
    type Response = ListResponse<Output>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.outputs.list",
        method: HttpMethod::Get,
        path: "/api/fleet/outputs",
        success: SuccessStatus::Ok,
    };
}

#[derive(Debug, Clone, Default)]
pub struct GetOutput {
    pub output_id: String,
}

impl Operation for GetOutput {
    type Response = ItemResponse<Output>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.outputs.get",
        method: HttpMethod::Get,
        path: "/api/fleet/outputs/{outputId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("outputId", self.output_id.as_str())]
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateOutput {
    pub body: OutputBody,
}

impl Operation for CreateOutput {
    type Response = ItemResponse<Output>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.outputs.create",
        method: HttpMethod::Post,
        path: "/api/fleet/outputs",
        success: SuccessStatus::Ok,
    };

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&self.body).map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        Self::ENDPOINT.require("name", &self.body.name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateOutput {
    pub output_id: String,
    pub body: OutputBody,
}

impl Operation for UpdateOutput {
    type Response = ItemResponse<Output>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.outputs.update",
        method: HttpMethod::Put,
        path: "/api/fleet/outputs/{outputId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("outputId", self.output_id.as_str())]
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&self.body).map(Some)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteOutput {
    pub output_id: String,
}

impl Operation for DeleteOutput {
    type Response = IdResponse;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.outputs.delete",
        method: HttpMethod::Delete,
        path: "/api/fleet/outputs/{outputId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("outputId", self.output_id.as_str())]
    }
}
