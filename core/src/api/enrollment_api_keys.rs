//! Enrollment API keys, used by agents to enroll into a policy.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::operation::{Endpoint, Operation, RequestBody, SuccessStatus};
use crate::query::Query;
use crate::types::{ActionResponse, ItemResponse, ListResponse};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentApiKey {
    pub id: String,
    pub api_key_id: String,
    /// The secret agents enroll with.
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ListEnrollmentApiKeys {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub kuery: Option<String>,
}

impl Operation for ListEnrollmentApiKeys {
    type Response = ListResponse<EnrollmentApiKey>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.enrollment_api_keys.list",
        method: HttpMethod::Get,
        path: "/api/fleet/enrollment_api_keys",
        success: SuccessStatus::Ok,
    };

    fn query(&self, query: &mut Query) {
        query
            .push("page", self.page)
            .push("perPage", self.per_page)
            .push("kuery", self.kuery.as_deref());
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetEnrollmentApiKey {
    pub key_id: String,
}

impl Operation for GetEnrollmentApiKey {
    type Response = ItemResponse<EnrollmentApiKey>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.enrollment_api_keys.get",
        method: HttpMethod::Get,
        path: "/api/fleet/enrollment_api_keys/{keyId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("keyId", self.key_id.as_str())]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEnrollmentApiKey {
    pub policy_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Seconds until the key expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

impl Operation for CreateEnrollmentApiKey {
    type Response = ItemResponse<EnrollmentApiKey>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.enrollment_api_keys.create",
        method: HttpMethod::Post,
        path: "/api/fleet/enrollment_api_keys",
        success: SuccessStatus::Ok,
    };

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(self).map(Some)
    }

    fn validate(&self) -> Result<(), ApiError> {
        Self::ENDPOINT.require("policy_id", &self.policy_id)
    }
}

/// Revokes the key; Fleet keeps a deactivated record.
#[derive(Debug, Clone, Default)]
pub struct DeleteEnrollmentApiKey {
    pub key_id: String,
}

impl Operation for DeleteEnrollmentApiKey {
    type Response = ActionResponse;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.enrollment_api_keys.delete",
        method: HttpMethod::Delete,
        path: "/api/fleet/enrollment_api_keys/{keyId}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![("keyId", self.key_id.as_str())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_policy_id() {
        let err = CreateEnrollmentApiKey::default().validate().unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("policy_id"));
    }

    #[test]
    fn create_body_is_the_request() {
        let request = CreateEnrollmentApiKey {
            policy_id: "p-1".to_string(),
            name: Some("ci".to_string()),
            expiration: None,
        };
        let body = request.body().unwrap().unwrap();
        assert_eq!(&body.bytes[..], br#"{"policy_id":"p-1","name":"ci"}"#);
    }
}
