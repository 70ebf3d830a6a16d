#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, param::Query };
use log::info;

use crate::utils::greeting::{self, GreetingProfile, RespGreeting};
use crate::utils::web_utils::{self, RequestDebug};

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct GreetingGetApi {
    profile: GreetingProfile,
}

impl GreetingGetApi {
    pub fn new(profile: GreetingProfile) -> Self {
        Self { profile }
    }
}

struct ReqGetGreeting {
    name: Option<String>,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqGetGreeting {
    type Req = ReqGetGreeting;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(64);
        s.push_str("  Query parameters:");
        s.push_str("\n    name: ");
        let name = match &self.name {
            Some(n) => n,
            None => "None",
        };
        s.push_str(name);
        s.push('\n');
        s
    }
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl GreetingGetApi {
    /** Greet the caller.  An absent or empty name defaults to "Friend";
     * this operation always succeeds.
     */
    #[oai(path = "/greeting", method = "get")]
    async fn get_greeting(&self, http_req: &Request, name: Query<Option<String>>) -> Json<RespGreeting> {
        let req = ReqGetGreeting { name: name.0 };

        // Conditional logging depending on log level.
        web_utils::debug_request(http_req, &req);

        let name = greeting::default_get_name(req.name);
        info!("Processing GET greeting request for \"{}\".", name);
        Json(RespGreeting::new(&self.profile, &name))
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
    use poem_openapi::OpenApiService;

    use crate::utils::web_utils::timestamp_str_to_datetime;

    fn test_app(profile: GreetingProfile) -> Route {
        let api = OpenApiService::new(GreetingGetApi::new(profile), "greeting", "test");
        Route::new().nest("/", api)
    }

    #[tokio::test]
    async fn get_with_name_greets_that_name() {
        let cli = TestClient::new(test_app(GreetingProfile::default()));

        let resp = cli.get("/greeting").query("name", &"John").send().await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        json.value().object().get("message").assert_string("Hello, John!");
        json.value().object().get("processedOn").assert_string("rust-server");

        let ts = json.value().object().get("timestamp").string().to_string();
        assert!(timestamp_str_to_datetime(&ts).is_ok());
    }

    #[tokio::test]
    async fn get_without_name_defaults_to_friend() {
        let cli = TestClient::new(test_app(GreetingProfile::default()));

        let resp = cli.get("/greeting").send().await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        json.value().object().get("message").assert_string("Hello, Friend!");
    }

    #[tokio::test]
    async fn get_with_empty_name_defaults_to_friend() {
        let cli = TestClient::new(test_app(GreetingProfile::default()));

        let resp = cli.get("/greeting").query("name", &"").send().await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        json.value().object().get("message").assert_string("Hello, Friend!");
    }

    #[tokio::test]
    async fn profile_controls_tag_and_template_only() {
        let cli = TestClient::new(test_app(GreetingProfile::new(
            "peer-api", "Hello from the peer API, {name}!")));

        let resp = cli.get("/greeting").query("name", &"John").send().await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        json.value().object().get("message").assert_string("Hello from the peer API, John!");
        json.value().object().get("processedOn").assert_string("peer-api");
    }
}
