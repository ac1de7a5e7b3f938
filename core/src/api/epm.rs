//! Elastic Package Manager: integration packages.
//!
//! Install and delete calls accept any status below `299`. Uploads send the
//! archive bytes unmodified as `application/zip`.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::http::HttpMethod;
use crate::operation::{Endpoint, Operation, RequestBody, SuccessStatus, ZIP_CONTENT_TYPE};
use crate::query::Query;
use crate::types::ItemResponse;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "type")]
    pub package_type: Option<String>,
    /// `installed`, `not_installed`, `installing` or `install_failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
}

/// Saved objects and index assets touched by an install or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    pub id: String,
    #[serde(rename = "type")]
    pub asset_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Response to install, upload and delete calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageAssets {
    #[serde(default)]
    pub items: Vec<AssetReference>,
    #[serde(default, rename = "_meta")]
    pub meta: InstallMeta,
}

/// The package list is not paginated: `{"items": [...]}` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageList {
    pub items: Vec<PackageInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct ListPackages {
    pub category: Option<String>,
    pub prerelease: Option<bool>,
}

impl Operation for ListPackages {
    type Response = PackageList;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.epm.packages.list",
        method: HttpMethod::Get,
        path: "/api/fleet/epm/packages",
        success: SuccessStatus::Ok,
    };

    fn query(&self, query: &mut Query) {
        query
            .push("category", self.category.as_deref())
            .push("prerelease", self.prerelease);
    }
}

#[derive(Debug, Clone, Default)]
pub struct GetPackage {
    pub pkg_name: String,
    pub pkg_version: String,
    pub prerelease: Option<bool>,
    pub full: Option<bool>,
}

impl Operation for GetPackage {
    type Response = ItemResponse<PackageInfo>;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.epm.packages.get",
        method: HttpMethod::Get,
        path: "/api/fleet/epm/packages/{pkgName}/{pkgVersion}",
        success: SuccessStatus::Ok,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("pkgName", self.pkg_name.as_str()),
            ("pkgVersion", self.pkg_version.as_str()),
        ]
    }

    fn query(&self, query: &mut Query) {
        query
            .push("prerelease", self.prerelease)
            .push("full", self.full);
    }
}

/// Install a package from the registry.
#[derive(Debug, Clone, Default)]
pub struct InstallPackage {
    pub pkg_name: String,
    pub pkg_version: String,
    pub prerelease: Option<bool>,
    /// Reinstall even if the version is already installed.
    pub force: Option<bool>,
    pub ignore_constraints: Option<bool>,
}

#[derive(Serialize)]
struct InstallBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    force: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ignore_constraints: Option<bool>,
}

impl Operation for InstallPackage {
    type Response = PackageAssets;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.epm.packages.install",
        method: HttpMethod::Post,
        path: "/api/fleet/epm/packages/{pkgName}/{pkgVersion}",
        success: SuccessStatus::Below299,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("pkgName", self.pkg_name.as_str()),
            ("pkgVersion", self.pkg_version.as_str()),
        ]
    }

    fn query(&self, query: &mut Query) {
        query.push("prerelease", self.prerelease);
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        RequestBody::json(&InstallBody {
            force: self.force,
            ignore_constraints: self.ignore_constraints,
        })
        .map(Some)
    }
}

/// Install a package from a zip archive.
#[derive(Debug, Clone, Default)]
pub struct InstallPackageByUpload {
    pub archive: Bytes,
    pub ignore_mapping_update_errors: Option<bool>,
    pub skip_data_stream_rollover: Option<bool>,
}

impl InstallPackageByUpload {
    pub fn new(archive: impl Into<Bytes>) -> Self {
        Self {
            archive: archive.into(),
            ..Self::default()
        }
    }
}

impl Operation for InstallPackageByUpload {
    type Response = PackageAssets;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.epm.packages.install_by_upload",
        method: HttpMethod::Post,
        path: "/api/fleet/epm/packages",
        success: SuccessStatus::Below299,
    };

    fn query(&self, query: &mut Query) {
        query
            .push("ignoreMappingUpdateErrors", self.ignore_mapping_update_errors)
            .push("skipDataStreamRollover", self.skip_data_stream_rollover);
    }

    fn body(&self) -> Result<Option<RequestBody>, ApiError> {
        Ok(Some(RequestBody::binary(
            ZIP_CONTENT_TYPE,
            self.archive.clone(),
        )))
    }

    fn validate(&self) -> Result<(), ApiError> {
        if self.archive.is_empty() {
            return Err(ApiError::MissingParameter {
                operation: Self::ENDPOINT.id,
                parameter: "archive",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeletePackage {
    pub pkg_name: String,
    pub pkg_version: String,
    /// Remove even if package policies still use the package.
    pub force: Option<bool>,
}

impl Operation for DeletePackage {
    type Response = PackageAssets;

    const ENDPOINT: Endpoint = Endpoint {
        id: "fleet.epm.packages.delete",
        method: HttpMethod::Delete,
        path: "/api/fleet/epm/packages/{pkgName}/{pkgVersion}",
        success: SuccessStatus::Below299,
    };

    fn path_params(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("pkgName", self.pkg_name.as_str()),
            ("pkgVersion", self.pkg_version.as_str()),
        ]
    }

    fn query(&self, query: &mut Query) {
        query.push("force", self.force);
    }
}
