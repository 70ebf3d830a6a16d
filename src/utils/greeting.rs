#![forbid(unsafe_code)]

use poem_openapi::Object;
use serde::Deserialize;
use serde_json::Value;

use crate::utils::web_utils::timestamp_str;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Name substituted on GET when the caller provides none.
pub const DEFAULT_GET_NAME : &str = "Friend";

// Placeholder replaced by the caller's name when a template is rendered.
const TEMPLATE_NAME_TOKEN  : &str = "{name}";

// Default service identity.
const DEFAULT_PROCESSED_ON : &str = "rust-server";
const DEFAULT_TEMPLATE     : &str = "Hello, {name}!";

// ***************************************************************************
//                              Greeting Profile
// ***************************************************************************
// ---------------------------------------------------------------------------
// GreetingProfile:
// ---------------------------------------------------------------------------
/** The identity of a greeting backend.  Both logical backends run the exact
 * same contract code; the only differences allowed between them are the
 * processed_on tag and the greeting template configured here.  The profile
 * is read from the [service] section of the configuration file.
 */
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GreetingProfile {
    pub processed_on: String,
    pub greeting_template: String,
}

impl Default for GreetingProfile {
    fn default() -> Self {
        Self {
            processed_on: DEFAULT_PROCESSED_ON.to_string(),
            greeting_template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl GreetingProfile {
    #[allow(dead_code)]
    pub fn new(processed_on: &str, greeting_template: &str) -> Self {
        Self {
            processed_on: processed_on.to_string(),
            greeting_template: greeting_template.to_string(),
        }
    }

    /** Render the greeting message for a name. */
    pub fn render(&self, name: &str) -> String {
        self.greeting_template.replace(TEMPLATE_NAME_TOKEN, name)
    }
}

// ***************************************************************************
//                              Response Objects
// ***************************************************************************
// ---------------------------------------------------------------------------
// RespGreeting:
// ---------------------------------------------------------------------------
/** The uniform success body returned by every greeting backend. */
#[derive(Object, Debug)]
pub struct RespGreeting {
    pub message: String,
    pub timestamp: String,
    #[oai(rename = "processedOn")]
    pub processed_on: String,
}

impl RespGreeting {
    /** Build a response for the given profile and resolved name. */
    pub fn new(profile: &GreetingProfile, name: &str) -> Self {
        Self {
            message: profile.render(name),
            timestamp: timestamp_str(),
            processed_on: profile.processed_on.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// GreetingError:
// ---------------------------------------------------------------------------
/** The uniform error body, paired with an HTTP 400 status. */
#[derive(Object, Debug)]
pub struct GreetingError {
    pub error: String,
}

impl GreetingError {
    pub fn new(error: &str) -> Self {
        Self { error: error.to_string() }
    }
}

// ***************************************************************************
//                              Name Resolution
// ***************************************************************************
// ---------------------------------------------------------------------------
// default_get_name:
// ---------------------------------------------------------------------------
/** Resolve the GET name.  An absent or empty name becomes the default;
 * GET has no error path.
 */
pub fn default_get_name(name: Option<String>) -> String {
    match name {
        Some(n) if !n.is_empty() => n,
        _ => DEFAULT_GET_NAME.to_string(),
    }
}

// ---------------------------------------------------------------------------
// NameError:
// ---------------------------------------------------------------------------
/** Why a POST name failed validation. */
#[derive(Debug, PartialEq, Eq)]
pub enum NameError {
    /// Absent, null, or falsy.
    Required,
    /// Present and truthy, but not a string.
    Invalid,
}

// ---------------------------------------------------------------------------
// required_name:
// ---------------------------------------------------------------------------
/** Resolve the POST name.  Unlike GET there is no default: an absent name,
 * or a falsy one (null, empty string, false, numeric zero), is a
 * validation error.  The name is typed as a string in the contract, so a
 * truthy value of any other JSON type is an invalid request body.
 */
pub fn required_name(name: &Option<Value>) -> Result<&str, NameError> {
    match name {
        None | Some(Value::Null) => Err(NameError::Required),
        Some(Value::Bool(false)) => Err(NameError::Required),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Err(NameError::Required),
        Some(Value::String(s)) if s.is_empty() => Err(NameError::Required),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(NameError::Invalid),
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::utils::web_utils::timestamp_str_to_datetime;

    #[test]
    fn render_substitutes_name() {
        let profile = GreetingProfile::default();
        assert_eq!(profile.render("John"), "Hello, John!");
    }

    #[test]
    fn render_honors_custom_template() {
        let profile = GreetingProfile::new("peer-api", "Hello from the peer API, {name}!");
        assert_eq!(profile.render("Ada"), "Hello from the peer API, Ada!");
        assert_eq!(profile.processed_on, "peer-api");
    }

    #[test]
    fn get_name_defaults_when_absent_or_empty() {
        assert_eq!(default_get_name(None), DEFAULT_GET_NAME);
        assert_eq!(default_get_name(Some("".to_string())), DEFAULT_GET_NAME);
        assert_eq!(default_get_name(Some("John".to_string())), "John");
    }

    #[test]
    fn post_name_has_no_default() {
        assert_eq!(required_name(&None), Err(NameError::Required));
        assert_eq!(required_name(&Some(json!(null))), Err(NameError::Required));
        assert_eq!(required_name(&Some(json!(""))), Err(NameError::Required));
        assert_eq!(required_name(&Some(json!("Ada"))), Ok("Ada"));
    }

    #[test]
    fn falsy_post_names_are_required_errors() {
        for falsy in [json!(0), json!(0.0), json!(false)] {
            assert_eq!(required_name(&Some(falsy)), Err(NameError::Required));
        }
    }

    #[test]
    fn truthy_non_string_post_names_are_invalid() {
        for value in [json!(42), json!(true), json!([1, 2]), json!({"first": "Ada"})] {
            assert_eq!(required_name(&Some(value)), Err(NameError::Invalid));
        }
    }

    #[test]
    fn response_timestamp_is_rfc3339() {
        let resp = RespGreeting::new(&GreetingProfile::default(), "John");
        assert!(timestamp_str_to_datetime(&resp.timestamp).is_ok());
        assert_eq!(resp.message, "Hello, John!");
    }
}
