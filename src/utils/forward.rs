#![forbid(unsafe_code)]

use poem::{Endpoint, Request, Response, Result};
use poem::http::StatusCode;
use log::error;

use crate::utils::errors::Errors;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Body returned when the upstream cannot be reached.  The client dispatcher
// treats this like any other non-2xx response.
const UPSTREAM_FAILURE_MSG : &str = "Upstream request failed";

// ***************************************************************************
//                            Forwarding Endpoint
// ***************************************************************************
// ---------------------------------------------------------------------------
// ForwardEndpoint:
// ---------------------------------------------------------------------------
/** A poem endpoint that relays requests to a fixed external origin.  The
 * endpoint is mounted under a path prefix, so by the time a request gets
 * here the prefix has been stripped and the remaining path is appended to
 * the upstream origin unchanged.
 *
 * Only the development router state mounts this endpoint.  A transport
 * failure reaching the upstream is reported as a 502 with the standard
 * error body shape; there is no retry.
 */
pub struct ForwardEndpoint {
    upstream: String,
    client: reqwest::Client,
}

impl ForwardEndpoint {
    pub fn new(upstream: &str) -> Self {
        Self {
            upstream: upstream.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /** The upstream URL for a stripped request path and optional query. */
    fn upstream_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = format!("{}{}", self.upstream, path);
        if let Some(q) = query {
            url.push('?');
            url.push_str(q);
        }
        url
    }

    /** Build the generic failure response for an unreachable upstream. */
    fn upstream_failure(&self, cause: &str) -> Response {
        error!("{}", Errors::UpstreamFailure(self.upstream.clone(), cause.to_string()));
        let body = serde_json::json!({"error": UPSTREAM_FAILURE_MSG}).to_string();
        Response::builder()
            .status(StatusCode::BAD_GATEWAY)
            .content_type("application/json")
            .body(body)
    }
}

impl Endpoint for ForwardEndpoint {
    type Output = Response;

    async fn call(&self, req: Request) -> Result<Self::Output> {
        // Capture everything we relay before consuming the body.
        let method = req.method().as_str().to_string();
        let url = self.upstream_url(req.uri().path(), req.uri().query());
        let content_type = req.content_type().map(|ct| ct.to_string());

        let body = match req.into_body().into_bytes().await {
            Ok(b) => b,
            Err(e) => return Ok(self.upstream_failure(&e.to_string())),
        };

        // Relay method, query, content type and body as-is.
        let reqw_method = match reqwest::Method::from_bytes(method.as_bytes()) {
            Ok(m) => m,
            Err(e) => return Ok(self.upstream_failure(&e.to_string())),
        };
        let mut builder = self.client.request(reqw_method, &url).body(body.to_vec());
        if let Some(ct) = content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, ct);
        }

        let upstream_resp = match builder.send().await {
            Ok(r) => r,
            Err(e) => return Ok(self.upstream_failure(&e.to_string())),
        };

        // Relay status, content type and body back to the caller.
        let status = StatusCode::from_u16(upstream_resp.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let resp_content_type = upstream_resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let resp_body = match upstream_resp.bytes().await {
            Ok(b) => b,
            Err(e) => return Ok(self.upstream_failure(&e.to_string())),
        };

        let mut builder = Response::builder().status(status);
        if let Some(ct) = resp_content_type {
            builder = builder.content_type(ct);
        }
        Ok(builder.body(resp_body.to_vec()))
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::Route;
    use poem::test::TestClient;

    use crate::utils::greeting::GreetingProfile;
    use crate::utils::test_support::{greeting_app, spawn_app};

    /** Start a peer greeting service on an ephemeral port and return its origin. */
    async fn spawn_peer(profile: GreetingProfile) -> String {
        spawn_app(greeting_app(profile)).await
    }

    #[tokio::test]
    async fn forwards_get_to_upstream() {
        let upstream = spawn_peer(GreetingProfile::new(
            "peer-api", "Hello from the peer API, {name}!")).await;
        let app = Route::new().nest("/peer", ForwardEndpoint::new(&upstream));
        let cli = TestClient::new(app);

        let resp = cli.get("/peer/greeting").query("name", &"Ada").send().await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        json.value().object().get("message").assert_string("Hello from the peer API, Ada!");
        json.value().object().get("processedOn").assert_string("peer-api");
    }

    #[tokio::test]
    async fn forwards_post_and_relays_validation_errors() {
        let upstream = spawn_peer(GreetingProfile::new(
            "peer-api", "Hello from the peer API, {name}!")).await;
        let app = Route::new().nest("/peer", ForwardEndpoint::new(&upstream));
        let cli = TestClient::new(app);

        // A valid body reaches the peer and comes back tagged by it.
        let resp = cli.post("/peer/greeting")
            .content_type("application/json")
            .body(r#"{"name": "Ada"}"#)
            .send().await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        json.value().object().get("processedOn").assert_string("peer-api");

        // The peer's 400 passes through unchanged.
        let resp = cli.post("/peer/greeting")
            .content_type("application/json")
            .body("{}")
            .send().await;
        resp.assert_status(StatusCode::BAD_REQUEST);
        let json = resp.json().await;
        json.value().object().get("error").assert_string("Name is required");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_a_generic_failure() {
        // Nothing listens on port 1.
        let app = Route::new().nest("/peer", ForwardEndpoint::new("http://127.0.0.1:1"));
        let cli = TestClient::new(app);

        let resp = cli.get("/peer/greeting").query("name", &"Ada").send().await;
        resp.assert_status(StatusCode::BAD_GATEWAY);
        let json = resp.json().await;
        json.value().object().get("error").assert_string("Upstream request failed");
    }
}
