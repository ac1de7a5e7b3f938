//! Fleet operations, one module per resource group.
//!
//! Each request type implements [`Operation`](crate::operation::Operation)
//! and is executed with [`FleetClient::execute`](crate::FleetClient::execute):
//!
//! ```no_run
//! use fleet_core::api::agent_policies::GetAgentPolicy;
//! use fleet_core::{ClientConfig, Context, FleetClient};
//! # use fleet_core::{HttpRequest, HttpResponse, Transport, TransportError};
//! # struct Offline;
//! # impl Transport for Offline {
//! #     fn perform(&self, _: &Context, _: HttpRequest) -> Result<HttpResponse, TransportError> {
//! #         Err(TransportError::Connection("offline".into()))
//! #     }
//! # }
//! # fn transport() -> Offline { Offline }
//!
//! let client = FleetClient::new(ClientConfig::from_env()?, transport());
//! let request = GetAgentPolicy::new("fleet-server-policy");
//! let policy = client.execute(&Context::background(), &request, &[])?.into_body().item;
//! println!("{} (revision {})", policy.name, policy.revision);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod agent_policies;
pub mod agents;
pub mod enrollment_api_keys;
pub mod epm;
pub mod fleet_server_hosts;
pub mod outputs;
pub mod package_policies;
