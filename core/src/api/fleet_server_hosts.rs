//! Fleet Server hosts advertised to enrolling agents.
//!
//! Create and delete accept any status below `299`; the other calls expect
//! exactly `200`.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::operation::{Endpoint, Operation, RequestBody, SuccessStatus};
use crate::types::{Empty, ItemResponse, ListResponse};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetServerHost {
    pub id: String,
    pub name: String,
    pub host_urls: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub is_preconfigured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetServerHostBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub host_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_id: Option<String>,
}

impl FleetServerHostBody {
    fn validate(&self, endpoint: &Endpoint) -> Result<(), ApiError> {
        endpoint.require("name", &self.name)?;
        if self.host_urls.is_empty() {
            return Err(ApiError::MissingParameter {
                operation: endpoint.id,
                parameter: "host_urls",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListFleetServerHosts;

impl Operation for ListFleetServerHosts {
    type Response = ListResponse<FleetServerHost>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.fleet_server_hosts.list",
        method: HttpMethod::Get,
        path: "/api/fleet/fleet_server_hosts",
        success: SuccessStatus::Ok,
    };
}

#[derive(Debug, Clone, Default)]
pub struct GetFleetServerHost {
    pub item_id: String,
}

impl Operation for GetFleetServerHost {
    type Response = ItemResponse<FleetServerHost>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.fleet_server_hosts.get",
        method: HttpMethod::Get,
        path: "/api/fleet/fleet_server_hosts/{itemId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("itemId", self.item_id.as_str())]
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateFleetServerHost {
    pub body: FleetServerHostBody,
}

impl Operation for CreateFleetServerHost {
    type Response = ItemResponse<FleetServerHost>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.fleet_server_hosts.create",
        method: HttpMethod::Post,
        path: "/api/fleet/fleet_server_hosts",
        success: SuccessStatus::Below299,
    };

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&self.body).map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        self.body.validate(&Self::ENDPOINT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UpdateFleetServerHost {
    pub item_id: String,
    pub body: FleetServerHostBody,
}

impl Operation for UpdateFleetServerHost {
    type Response = ItemResponse<FleetServerHost>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.fleet_server_hosts.update",
        method: HttpMethod::Put,
        path: "/api/fleet/fleet_server_hosts/{itemId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("itemId", self.item_id.as_str())]
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&self.body).map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        self.body.validate(&Self::ENDPOINT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeleteFleetServerHost {
    pub item_id: String,
}

impl Operation for DeleteFleetServerHost {
    type Response = Empty;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.fleet_server_hosts.delete",
        method: HttpMethod::Delete,
        path: "/api/fleet/fleet_server_hosts/{itemId}",
        success: SuccessStatus::Below299,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("itemId", self.item_id.as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_host_urls() {
        let request = CreateFleetServerHost {
            body: FleetServerHostBody {
                name: "default".to_string(),
                ..FleetServerHostBody::default()
            },
        };
        assert!(matches!(
            request.validate(),
            Err(ApiError::MissingParameter { parameter: "host_urls", .. })
        ));
    }

    #[test]
    fn create_and_delete_accept_any_2xx() {
        assert!(CreateFleetServerHost::ENDPOINT.success.matches(201));
        assert!(DeleteFleetServerHost::ENDPOINT.success.matches(204));
        assert!(!UpdateFleetServerHost::ENDPOINT.success.matches(201));
    }
}
