#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json, Object, ApiResponse };
use log::{error, info};

use crate::utils::greeting::{self, GreetingError, GreetingProfile, NameError, RespGreeting};
use crate::utils::web_utils::{self, RequestDebug};

// ***************************************************************************
//                                Constants
// ***************************************************************************
const MSG_NAME_REQUIRED : &str = "Name is required";
const MSG_INVALID_BODY  : &str = "Invalid request body";

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct GreetingPostApi {
    profile: GreetingProfile,
}

impl GreetingPostApi {
    pub fn new(profile: GreetingProfile) -> Self {
        Self { profile }
    }
}

// The name is kept as a raw JSON value so validation can distinguish the
// falsy cases (null, "", false, 0) from a typed string; a typed field
// would silently coerce scalars.
#[derive(Object)]
struct ReqPostGreeting {
    name: Option<serde_json::Value>,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqPostGreeting {
    type Req = ReqPostGreeting;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(64);
        s.push_str("  Request body:");
        s.push_str("\n    name: ");
        let name = match &self.name {
            Some(v) => v.to_string(),
            None => "None".to_string(),
        };
        s.push_str(&name);
        s.push('\n');
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
#[oai(bad_request_handler = "bad_request_handler")]
enum HelloResponse {
    #[oai(status = 200)]
    Http200(Json<RespGreeting>),
    #[oai(status = 400)]
    Http400(Json<GreetingError>),
}

fn make_http_200(resp: RespGreeting) -> HelloResponse {
    HelloResponse::Http200(Json(resp))
}
fn make_http_400(msg: &str) -> HelloResponse {
    HelloResponse::Http400(Json(GreetingError::new(msg)))
}

/** A request body that cannot be parsed as JSON never reaches the handler;
 * poem routes the parse failure here so the error body keeps the contract
 * shape instead of the framework default.
 */
fn bad_request_handler(err: poem::Error) -> HelloResponse {
    error!("ERROR: {}: {}", MSG_INVALID_BODY, err);
    make_http_400(MSG_INVALID_BODY)
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl GreetingPostApi {
    /** Greet the caller by the name in the JSON body.  POST has no default
     * name: a missing or empty name is a validation error.
     */
    #[oai(path = "/greeting", method = "post")]
    async fn post_greeting(&self, http_req: &Request, req: Json<ReqPostGreeting>) -> HelloResponse {
        // Conditional logging depending on log level.
        web_utils::debug_request(http_req, &req.0);

        match greeting::required_name(&req.0.name) {
            Ok(name) => {
                info!("Processing POST greeting request for \"{}\".", name);
                make_http_200(RespGreeting::new(&self.profile, name))
            },
            Err(NameError::Required) => {
                error!("ERROR: {}", MSG_NAME_REQUIRED);
                make_http_400(MSG_NAME_REQUIRED)
            },
            Err(NameError::Invalid) => {
                error!("ERROR: {}: name must be a string.", MSG_INVALID_BODY);
                make_http_400(MSG_INVALID_BODY)
            },
        }
    }
}
