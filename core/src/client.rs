//! The generic operation executor.
//!
//! # Design
//! `FleetClient` holds an immutable [`ClientConfig`] and a shared
//! [`Transport`]; it carries no per-call state. Every endpoint goes through
//! [`FleetClient::execute`], which runs one fixed pipeline:
//!
//! ```text
//! validate -> resolve path -> query -> body -> (instrumentation start)
//!   -> options -> dispatch -> classify status -> decode | capture error
//! ```
//!
//! Request building is split out as [`FleetClient::build_request`] and
//! response classification as [`parse_response`], so a host that performs
//! I/O itself can use the two halves without a `Transport`.

use std::borrow::Cow;
use std::error::Error;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::context::Context;
use crate::error::ApiError;
use crate::http::{Body, HttpRequest, HttpResponse};
use crate::instrumentation::Instrumentation;
use crate::operation::Operation;
use crate::option::RequestOption;
use crate::query::Query;
use crate::response::{ApiResponse, ErrorPayload, ErrorResponse};
use crate::transport::Transport;

/// Executes Fleet operations through a caller-supplied transport.
#[derive(Clone)]
pub struct FleetClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl FleetClient {
    pub fn new(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self::from_shared(config, Arc::new(transport))
    }

    /// Use a transport that is shared with other clients.
    pub fn from_shared(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Turn `request` into the HTTP request that would be dispatched, before
    /// any [`RequestOption`] runs. Nothing is sent.
    pub fn build_request<O: Operation>(&self, request: &O) -> Result<HttpRequest, ApiError> {
        let endpoint = O::ENDPOINT;
        request.validate()?;

        let path = endpoint.resolve_path(&request.path_params())?;
        let mut url = self.config.url_for(&path)?;
        let mut query = Query::new();
        request.query(&mut query);
        query.apply_to(&mut url);

        let body = request.body()?;

        let mut http_request = HttpRequest::new(endpoint.method, url);
        for (name, value) in self.config.default_headers() {
            http_request.append_header(name.clone(), value.clone());
        }
        if let Some(body) = body {
            http_request.set_header("content-type", body.content_type);
            http_request.body = Some(Body::from(body.bytes));
        }
        Ok(http_request)
    }

    /// Run one call.
    ///
    /// Validation errors return before instrumentation starts and before
    /// the transport is touched. A non-success status returns
    /// [`ApiError::Status`] carrying the failure envelope.
    pub fn execute<O: Operation>(
        &self,
        ctx: &Context,
        request: &O,
        options: &[RequestOption],
    ) -> Result<ApiResponse<O::Response>, ApiError> {
        let operation = O::ENDPOINT.id;
        let mut http_request = self.build_request(request)?;

        let hooks = CallHooks::start(self.transport.instrumentation(), ctx, operation);
        hooks.before_request(&http_request);
        if let Some(body) = http_request.body.take() {
            http_request.body = Some(hooks.record_request_body(body));
        }

        for option in options {
            if let Err(source) = option.apply(&mut http_request) {
                return Err(hooks.fail(ApiError::RequestOption { operation, source }));
            }
        }

        tracing::debug!(
            operation,
            method = %http_request.method,
            url = %http_request.url,
            "dispatching request"
        );
        let response = match self.transport.perform(hooks.ctx(), http_request) {
            Ok(response) => response,
            Err(source) => {
                hooks.after_request(None);
                return Err(hooks.fail(ApiError::Transport { operation, source }));
            }
        };
        hooks.after_request(Some(response.status));

        parse_response::<O>(response).map_err(|err| hooks.fail(err))
    }
}

impl std::fmt::Debug for FleetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetClient")
            .field("config", &self.config)
            .field("instrumented", &self.transport.instrumentation().is_some())
            .finish()
    }
}

/// Classify a raw response for operation `O`.
///
/// The body is drained in full on every path. Success statuses decode into
/// `O::Response` (an empty body decodes as JSON `null`); any other status
/// yields [`ApiError::Status`] with the body parsed as JSON when possible
/// and kept as text otherwise.
pub fn parse_response<O: Operation>(
    response: HttpResponse,
) -> Result<ApiResponse<O::Response>, ApiError> {
    let endpoint = O::ENDPOINT;
    let HttpResponse {
        status,
        headers,
        body,
    } = response;
    let raw_body = body.into_bytes().map_err(|source| ApiError::Body {
        operation: endpoint.id,
        source,
    })?;

    if !endpoint.success.matches(status) {
        tracing::debug!(operation = endpoint.id, status, "error response");
        let error = ErrorPayload::from_bytes(&raw_body);
        return Err(ApiError::Status(Box::new(ErrorResponse {
            operation: endpoint.id,
            status,
            headers,
            error,
            raw_body,
        })));
    }

    let body = decode(&raw_body).map_err(|source| ApiError::Decode {
        operation: endpoint.id,
        status,
        source,
    })?;
    tracing::debug!(operation = endpoint.id, status, "response decoded");
    Ok(ApiResponse {
        status,
        headers,
        body,
        raw_body,
    })
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(Value::Null);
    }
    serde_json::from_slice(bytes)
}

/// Instrumentation for one call. Every method is a no-op when the transport
/// exposes none; `close` runs on drop.
struct CallHooks<'a> {
    instrumentation: Option<&'a dyn Instrumentation>,
    ctx: Cow<'a, Context>,
    operation: &'static str,
}

impl<'a> CallHooks<'a> {
    fn start(
        instrumentation: Option<&'a dyn Instrumentation>,
        ctx: &'a Context,
        operation: &'static str,
    ) -> Self {
        let ctx = match instrumentation {
            Some(hooks) => Cow::Owned(hooks.start(ctx, operation)),
            None => Cow::Borrowed(ctx),
        };
        Self {
            instrumentation,
            ctx,
            operation,
        }
    }

    fn ctx(&self) -> &Context {
        &self.ctx
    }

    fn before_request(&self, request: &HttpRequest) {
        if let Some(hooks) = self.instrumentation {
            hooks.before_request(&self.ctx, request, self.operation);
        }
    }

    fn record_request_body(&self, body: Body) -> Body {
        match self.instrumentation {
            Some(hooks) => hooks.record_request_body(&self.ctx, self.operation, body),
            None => body,
        }
    }

    fn after_request(&self, status: Option<u16>) {
        if let Some(hooks) = self.instrumentation {
            hooks.after_request(&self.ctx, self.operation, status);
        }
    }

    /// Record `err` and hand it back.
    fn fail(&self, err: ApiError) -> ApiError {
        if let Some(hooks) = self.instrumentation {
            hooks.record_error(&self.ctx, &err as &(dyn Error + 'static));
        }
        err
    }
}

impl Drop for CallHooks<'_> {
    fn drop(&mut self) {
        if let Some(hooks) = self.instrumentation {
            hooks.close(&self.ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::api::agent_policies::{
        AgentPolicyBody, CreateAgentPolicy, DeleteAgentPolicy, GetAgentPolicy, ListAgentPolicies,
    };
    use crate::api::agents::{DeleteAgent, ReassignAgent};
    use crate::api::epm::InstallPackageByUpload;
    use crate::http::HttpMethod;
    use crate::operation::{Endpoint, RequestBody, SuccessStatus};
    use crate::transport::{from_fn, Instrumented, TransportError};

    const POLICY: &str = r#"{"item":{"id":"p-1","name":"Default","namespace":"default","revision":2}}"#;

    /// Records every dispatched request and answers with a fixed response.
    struct Spy {
        status: u16,
        body: &'static str,
        calls: AtomicUsize,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl Spy {
        fn new(status: u16, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_request(&self) -> HttpRequest {
            self.requests.lock().unwrap().pop().unwrap()
        }
    }

    impl Transport for Spy {
        fn perform(&self, _ctx: &Context, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            Ok(HttpResponse::new(self.status, self.body).with_header("content-type", "application/json"))
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        fn push(&self, event: impl Into<String>) {
            self.events.lock().unwrap().push(event.into());
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Instrumentation for Recorder {
        fn start(&self, ctx: &Context, operation: &'static str) -> Context {
            self.push(format!("start {operation}"));
            ctx.clone()
        }

        fn before_request(&self, _ctx: &Context, request: &HttpRequest, _operation: &str) {
            self.push(format!("before {} {}", request.method, request.url.path()));
        }

        fn record_request_body(&self, _ctx: &Context, _operation: &str, body: Body) -> Body {
            self.push("body");
            body
        }

        fn after_request(&self, _ctx: &Context, _operation: &str, status: Option<u16>) {
            self.push(format!("after {status:?}"));
        }

        fn record_error(&self, _ctx: &Context, _error: &(dyn Error + 'static)) {
            self.push("error");
        }

        fn close(&self, _ctx: &Context) {
            self.push("close");
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:5601").unwrap()
    }

    fn client(spy: &Arc<Spy>) -> FleetClient {
        FleetClient::from_shared(config(), spy.clone())
    }

    fn instrumented(spy: &Arc<Spy>, recorder: &Recorder) -> FleetClient {
        FleetClient::new(config(), Instrumented::new(spy.clone(), recorder.clone()))
    }

    #[test]
    fn success_decodes_typed_body() {
        let spy = Spy::new(200, POLICY);
        let response = client(&spy)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &[])
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body.item.name, "Default");
        assert_eq!(response.body.item.revision, 2);
        assert_eq!(&response.raw_body[..], POLICY.as_bytes());
        assert_eq!(response.header("Content-Type"), Some("application/json"));

        let sent = spy.last_request();
        assert_eq!(sent.method, HttpMethod::Get);
        assert_eq!(
            sent.url.as_str(),
            "http://localhost:5601/api/fleet/agent_policies/p-1"
        );
        assert_eq!(sent.header("kbn-xsrf"), Some("true"));
    }

    #[test]
    fn not_found_parses_json_error() {
        let spy = Spy::new(404, r#"{"message":"not found"}"#);
        let err = client(&spy)
            .execute(&Context::background(), &GetAgentPolicy::new("missing"), &[])
            .unwrap_err();

        assert!(err.to_string().contains("not found"));
        assert!(err.is_not_found());
        let envelope = err.response().unwrap();
        assert_eq!(envelope.status, 404);
        assert_eq!(
            envelope.error,
            ErrorPayload::Json(serde_json::json!({"message": "not found"}))
        );
        assert_eq!(envelope.error.message(), Some("not found"));
    }

    #[test]
    fn non_json_error_is_kept_as_text() {
        let spy = Spy::new(500, "boom");
        let err = client(&spy)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &[])
            .unwrap_err();

        assert!(err.to_string().contains("boom"));
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.response().unwrap().error, ErrorPayload::Raw("boom".to_string()));
    }

    #[test]
    fn created_is_an_error_for_exact_200_operations() {
        let spy = Spy::new(201, POLICY);
        let err = client(&spy)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &[])
            .unwrap_err();
        assert_eq!(err.status(), Some(201));
    }

    #[test]
    fn no_content_succeeds_for_below_299_operations() {
        let spy = Spy::new(204, "");
        let request = ReassignAgent {
            agent_id: "a-1".to_string(),
            policy_id: "p-2".to_string(),
        };
        let response = client(&spy)
            .execute(&Context::background(), &request, &[])
            .unwrap();
        assert_eq!(response.status, 204);
        assert!(response.raw_body.is_empty());
    }

    #[test]
    fn malformed_success_body_is_a_decode_error() {
        let spy = Spy::new(200, r#"{"item":"#);
        let err = client(&spy)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode { status: 200, .. }));
    }

    #[test]
    fn options_apply_in_order() {
        let spy = Spy::new(200, POLICY);
        let options = [
            RequestOption::header("x-trace", "first"),
            RequestOption::header("x-trace", "second"),
        ];
        client(&spy)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &options)
            .unwrap();

        let sent = spy.last_request();
        let traces: Vec<&str> = sent
            .headers
            .iter()
            .filter(|(name, _)| name == "x-trace")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(traces, ["first", "second"]);
    }

    #[test]
    fn failing_option_prevents_dispatch() {
        let spy = Spy::new(200, POLICY);
        let second_ran = Arc::new(AtomicUsize::new(0));
        let counter = second_ran.clone();
        let options = [
            RequestOption::new(|_| Err("rejected".into())),
            RequestOption::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        ];
        let err = client(&spy)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &options)
            .unwrap_err();

        assert!(matches!(err, ApiError::RequestOption { .. }));
        assert_eq!(spy.calls(), 0);
        assert_eq!(second_ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unset_query_parameters_are_not_sent() {
        let spy = Spy::new(200, r#"{"items":[],"total":0}"#);
        let request = ListAgentPolicies {
            page: Some(0),
            full: Some(false),
            ..ListAgentPolicies::default()
        };
        client(&spy)
            .execute(&Context::background(), &request, &[])
            .unwrap();

        let sent = spy.last_request();
        assert_eq!(sent.url.query(), Some("page=0&full=false"));
    }

    #[test]
    fn no_query_string_without_parameters() {
        let spy = Spy::new(200, r#"{"items":[],"total":0}"#);
        client(&spy)
            .execute(&Context::background(), &ListAgentPolicies::default(), &[])
            .unwrap();
        assert_eq!(spy.last_request().url.query(), None);
    }

    #[test]
    fn missing_path_parameter_never_dispatches() {
        let spy = Spy::new(200, POLICY);
        let recorder = Recorder::default();
        let err = instrumented(&spy, &recorder)
            .execute(&Context::background(), &GetAgentPolicy::new(""), &[])
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(spy.calls(), 0);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn dot_segment_id_never_dispatches() {
        let spy = Spy::new(200, r#"{"action":"deleted"}"#);
        let recorder = Recorder::default();
        let client = instrumented(&spy, &recorder);

        for agent_id in ["..", "."] {
            let request = DeleteAgent {
                agent_id: agent_id.to_string(),
            };
            let err = client
                .execute(&Context::background(), &request, &[])
                .unwrap_err();
            assert!(matches!(err, ApiError::InvalidRequest { .. }), "{agent_id}");
            assert!(err.is_validation());
        }
        assert_eq!(spy.calls(), 0);
        assert!(recorder.events().is_empty());
    }

    #[test]
    fn missing_body_field_never_dispatches() {
        let spy = Spy::new(200, r#"{"id":"p-1","name":"Default"}"#);
        let err = client(&spy)
            .execute(&Context::background(), &DeleteAgentPolicy::default(), &[])
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::MissingParameter { parameter: "agentPolicyId", .. }
        ));
        assert_eq!(spy.calls(), 0);
    }

    #[test]
    fn instrumentation_lifecycle_on_success() {
        let spy = Spy::new(200, POLICY);
        let recorder = Recorder::default();
        let request = CreateAgentPolicy {
            body: AgentPolicyBody::new("Default", "default"),
            sys_monitoring: Some(true),
        };
        instrumented(&spy, &recorder)
            .execute(&Context::background(), &request, &[])
            .unwrap();

        assert_eq!(
            recorder.events(),
            [
                "start fleet.agent_policies.create",
                "before POST /api/fleet/agent_policies",
                "body",
                "after Some(200)",
                "close",
            ]
        );
    }

    #[test]
    fn instrumentation_records_status_errors() {
        let spy = Spy::new(409, r#"{"message":"conflict"}"#);
        let recorder = Recorder::default();
        instrumented(&spy, &recorder)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &[])
            .unwrap_err();

        assert_eq!(
            recorder.events(),
            [
                "start fleet.agent_policies.get",
                "before GET /api/fleet/agent_policies/p-1",
                "after Some(409)",
                "error",
                "close",
            ]
        );
    }

    #[test]
    fn instrumentation_closes_after_option_failure() {
        let spy = Spy::new(200, POLICY);
        let recorder = Recorder::default();
        let options = [RequestOption::header("bad header", "x")];
        instrumented(&spy, &recorder)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &options)
            .unwrap_err();

        let events = recorder.events();
        assert_eq!(events[events.len() - 2..], ["error", "close"]);
        assert_eq!(spy.calls(), 0);
    }

    #[test]
    fn transport_failure_is_recorded() {
        let recorder = Recorder::default();
        let transport = from_fn(|ctx: &Context, _request: HttpRequest| {
            ctx.check()?;
            Err(TransportError::Connection("refused".to_string()))
        });
        let client = FleetClient::new(config(), Instrumented::new(transport, recorder.clone()));
        let err = client
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &[])
            .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Transport {
                source: TransportError::Connection(_),
                ..
            }
        ));
        assert_eq!(err.status(), None);
        assert_eq!(recorder.events()[2..], ["after None", "error", "close"]);
    }

    #[test]
    fn cancelled_context_surfaces_as_transport_error() {
        let transport = from_fn(|ctx: &Context, _request: HttpRequest| {
            ctx.check()?;
            Ok(HttpResponse::new(200, POLICY))
        });
        let client = FleetClient::new(config(), transport);
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();

        let err = client
            .execute(&ctx, &GetAgentPolicy::new("p-1"), &[])
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Transport {
                source: TransportError::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn uninstrumented_and_instrumented_results_match() {
        let plain = Spy::new(200, POLICY);
        let traced = Spy::new(200, POLICY);
        let recorder = Recorder::default();

        let a = client(&plain)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &[])
            .unwrap();
        let b = instrumented(&traced, &recorder)
            .execute(&Context::background(), &GetAgentPolicy::new("p-1"), &[])
            .unwrap();

        assert_eq!(a.body, b.body);
        assert_eq!(plain.last_request().url, traced.last_request().url);
    }

    #[test]
    fn upload_sends_raw_bytes_with_zip_content_type() {
        let spy = Spy::new(200, r#"{"items":[],"_meta":{"install_source":"upload"}}"#);
        let archive = vec![0x50, 0x4b, 0x03, 0x04, 0x00, 0xff];
        client(&spy)
            .execute(
                &Context::background(),
                &InstallPackageByUpload::new(archive.clone()),
                &[],
            )
            .unwrap();

        let sent = spy.last_request();
        assert_eq!(sent.header("content-type"), Some("application/zip"));
        assert_eq!(sent.body.unwrap().into_bytes().unwrap().as_ref(), archive.as_slice());
    }

    #[test]
    fn streaming_error_body_is_drained() {
        struct Chunked(io::Cursor<Vec<u8>>);
        impl Read for Chunked {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                let limit = buf.len().min(3);
                self.0.read(&mut buf[..limit])
            }
        }

        let response = HttpResponse::new(
            503,
            Body::from_reader(Chunked(io::Cursor::new(b"upstream unavailable".to_vec()))),
        );
        let err = parse_response::<GetAgentPolicy>(response).unwrap_err();
        assert_eq!(
            err.response().unwrap().error,
            ErrorPayload::Raw("upstream unavailable".to_string())
        );
    }

    #[test]
    fn build_request_does_not_apply_options() {
        let request = CreateAgentPolicy {
            body: AgentPolicyBody::new("Default", "default"),
            sys_monitoring: None,
        };
        let client = FleetClient::new(config(), Spy::new(200, POLICY));
        let built = client.build_request(&request).unwrap();
        assert_eq!(built.header("content-type"), Some("application/json"));
        assert_eq!(built.url.query(), None);
        assert!(built.header("authorization").is_none());
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct EchoBody {
        name: String,
        count: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    }

    struct Echo(EchoBody);

    impl Operation for Echo {
        type Response = EchoBody;

        const ENDPOINT: Endpoint = Endpoint {
            id: "test.echo",
            method: HttpMethod::Put,
            path: "/api/echo",
            success: SuccessStatus::Ok,
        };

        fn body(&self) -> Result<Option<RequestBody>, ApiError> {
            RequestBody::json(&self.0).map(Some)
        }
    }

    #[test]
    fn echoed_body_round_trips() {
        let transport = from_fn(|_ctx: &Context, request: HttpRequest| {
            let body = request.body.unwrap_or_default();
            Ok(HttpResponse::new(200, body))
        });
        let client = FleetClient::new(config(), transport);
        let original = EchoBody {
            name: "fleet".to_string(),
            count: 0,
            note: None,
        };
        let response = client
            .execute(&Context::background(), &Echo(original.clone()), &[])
            .unwrap();
        assert_eq!(response.body, original);
    }
}
