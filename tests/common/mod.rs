#![allow(dead_code)]

pub mod config_test_utils;

use axum::Router;

/// Binds an ephemeral port, serves `app` in the background, and returns the
/// endpoint URL for the verify route.
pub async fn spawn_test_endpoint(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test app");
    });

    format!("http://{addr}/verify")
}

/// Reserves a port with no listener behind it, for connection-refused tests.
pub async fn unreachable_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("listener addr");
    drop(listener);

    format!("http://{addr}/verify")
}
