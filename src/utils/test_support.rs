#![forbid(unsafe_code)]

//! Helpers shared by the network-facing tests: build a greeting app for a
//! profile and serve it on an ephemeral local port.

use poem::Route;
use poem::listener::{Acceptor, Listener, TcpListener};
use poem_openapi::OpenApiService;

use crate::utils::greeting::GreetingProfile;
use crate::v1::hello::greeting_get::GreetingGetApi;
use crate::v1::hello::greeting_post::GreetingPostApi;

/** A route serving the greeting contract for the given profile. */
pub fn greeting_app(profile: GreetingProfile) -> Route {
    let api = OpenApiService::new(
        (GreetingGetApi::new(profile.clone()), GreetingPostApi::new(profile)),
        "greeting", "test");
    Route::new().nest("/", api)
}

/** Serve the app on 127.0.0.1 with an ephemeral port and return its origin. */
pub async fn spawn_app(app: Route) -> String {
    let acceptor = TcpListener::bind("127.0.0.1:0").into_acceptor().await.unwrap();
    let addr = acceptor.local_addr().remove(0);
    let port = addr.as_socket_addr().unwrap().port();
    tokio::spawn(async move {
        poem::Server::new_with_acceptor(acceptor).run(app).await.ok();
    });
    format!("http://127.0.0.1:{}", port)
}
