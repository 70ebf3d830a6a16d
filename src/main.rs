#![forbid(unsafe_code)]

use lazy_static::lazy_static;
use log::info;
use poem::{listener::TcpListener, Route};
use poem_openapi::OpenApiService;

use crate::utils::config::{init_log, init_runtime_context, Config, RuntimeCtx};
use crate::utils::errors::Errors;
use crate::utils::forward::ForwardEndpoint;
use crate::v1::hello::greeting_get::GreetingGetApi;
use crate::v1::hello::greeting_post::GreetingPostApi;
use crate::v1::hello::version::VersionApi;

// Modules
mod client;
mod utils;
mod v1;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "HelloServer"; // for poem logging

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the parameters variable so that is has a 'static lifetime.
// We exit if we can't read our parameters.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // --------------- Initialize Server --------------
    // Announce ourselves.
    println!("Starting hello_server!");

    // Initialize the server.
    hello_init();

    // --------------- Main Loop Set Up ---------------
    // Create the routes and run the server.
    let addr = format!("{}{}", "0.0.0.0:", RUNTIME_CTX.parms.config.http_port);
    let app = build_routes(&RUNTIME_CTX.parms.config);

    // ------------------ Main Loop -------------------
    poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run(app)
        .await
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// hello_init:
// ---------------------------------------------------------------------------
/** Initialize all subsystems and data structures other than those needed
 * to configure the main loop processor.
 */
fn hello_init() {
    // Configure our log.
    init_log();

    // Force the reading of input parameters and initialization of the
    // runtime context.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));

    // Log build info.
    print_version_info();

    // The user may only want the data directories created.
    if RUNTIME_CTX.hello_args.create_dirs_only {
        println!("Data directories created under {}. Exiting.", RUNTIME_CTX.hello_dirs.root_dir);
        std::process::exit(0);
    }

    // Announce the router state chosen for the life of this process.
    let config = &RUNTIME_CTX.parms.config;
    if config.forwarding_enabled() {
        info!("Request forwarding enabled: {:?} -> {}.",
              config.forward.prefixes, config.forward.upstream);
    } else {
        info!("Request forwarding disabled; all paths are served locally.");
    }
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    // Log build info.
    info!("{}.", format!("\n*** Running hello_server={}, BRANCH={}, COMMIT={}, DIRTY={}, RUSTC={}",
                        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
                        env!("GIT_BRANCH"),
                        env!("GIT_COMMIT_SHORT"),
                        env!("GIT_DIRTY"),
                        env!("RUSTC_VERSION")),
    );
}

// ---------------------------------------------------------------------------
// build_routes:
// ---------------------------------------------------------------------------
/** Assemble the application routes from the configuration.  The greeting
 * contract and the version endpoint are always served locally.  Each
 * configured forwarding prefix is either relayed to the upstream origin
 * (development) or served by the local greeting handlers (any other run
 * environment).  The state is decided here, once, at startup.
 */
fn build_routes(config: &Config) -> Route {
    let profile = config.service.clone();
    let pkg_version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown");

    // Assign base URL.
    let base_url = format!("{}:{}", config.http_addr, config.http_port);

    let endpoints = (GreetingGetApi::new(profile.clone()),
                     GreetingPostApi::new(profile.clone()),
                     VersionApi);
    let api_service = OpenApiService::new(endpoints, config.title.clone(), pkg_version)
        .server(base_url);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();
    let ui = api_service.swagger_ui();

    let mut app = Route::new()
        .nest("/docs", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml);

    for prefix in &config.forward.prefixes {
        if config.forwarding_enabled() {
            app = app.nest(prefix, ForwardEndpoint::new(&config.forward.upstream));
        } else {
            let local = OpenApiService::new(
                (GreetingGetApi::new(profile.clone()), GreetingPostApi::new(profile.clone())),
                config.title.clone(), pkg_version);
            app = app.nest(prefix, local);
        }
    }

    app.nest("/", api_service)
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::test::TestClient;

    use crate::utils::config::RUN_ENV_DEVELOPMENT;
    use crate::utils::greeting::GreetingProfile;
    use crate::utils::test_support::{greeting_app, spawn_app};

    #[tokio::test]
    async fn disabled_forwarding_serves_peer_paths_locally() {
        let config = Config::new();
        assert!(!config.forwarding_enabled());
        let cli = TestClient::new(build_routes(&config));

        // The primary path and the would-be forwarded path are both
        // answered by this process with the same identity.
        for path in ["/greeting", "/peer/greeting"] {
            let resp = cli.get(path).query("name", &"John").send().await;
            resp.assert_status_is_ok();
            let json = resp.json().await;
            json.value().object().get("message").assert_string("Hello, John!");
            json.value().object().get("processedOn").assert_string("rust-server");
        }
    }

    #[tokio::test]
    async fn development_forwarding_reaches_the_peer() {
        let upstream = spawn_app(greeting_app(GreetingProfile::new(
            "peer-api", "Hello from the peer API, {name}!"))).await;

        let mut config = Config::new();
        config.run_env = RUN_ENV_DEVELOPMENT.to_string();
        config.forward.upstream = upstream;
        let cli = TestClient::new(build_routes(&config));

        // Local path keeps the local identity.
        let resp = cli.get("/greeting").query("name", &"John").send().await;
        resp.assert_status_is_ok();
        resp.json().await.value().object().get("processedOn").assert_string("rust-server");

        // Forwarded path is answered by the peer.
        let resp = cli.get("/peer/greeting").query("name", &"John").send().await;
        resp.assert_status_is_ok();
        let json = resp.json().await;
        json.value().object().get("message").assert_string("Hello from the peer API, John!");
        json.value().object().get("processedOn").assert_string("peer-api");
    }

    #[tokio::test]
    async fn spec_endpoint_is_served() {
        let cli = TestClient::new(build_routes(&Config::new()));
        let resp = cli.get("/spec").send().await;
        resp.assert_status_is_ok();
    }
}
