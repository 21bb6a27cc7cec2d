use std::time::Duration;

use axum::{extract::Path, http::HeaderMap, routing::get, Json, Router};
use eco_client::{Client, RetryPolicy};
use serde_json::{json, Value as JsonValue};

async fn echo_cluster(
    Path((project, region, id)): Path<(String, String, u64)>,
    headers: HeaderMap,
) -> Json<JsonValue> {
    // Stagger replies so responses complete out of request order.
    tokio::time::sleep(Duration::from_millis((id % 5) * 3)).await;
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    Json(json!({
        "id": id,
        "name": format!("{project}-{region}-{id}"),
        "endpoint": auth,
    }))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_calls_observe_only_their_own_state() {
    let app = Router::new().route("/v1/cluster/:project/:region/:id", get(echo_cluster));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("must bind test listener");
    let address = listener.local_addr().expect("must have local addr");
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("mock server must run");
    });

    let client = Client::builder()
        .base_url(format!("http://{address}"))
        .api_key("shared-key")
        .project_id("p")
        .region_id("r")
        .retry(RetryPolicy::disabled())
        .build()
        .expect("client must build");

    let tasks: Vec<_> = (1..=32u64)
        .map(|id| {
            let client = client.clone();
            tokio::spawn(async move { (id, client.clusters().get(id).await) })
        })
        .collect();

    for task in tasks {
        let (id, result) = task.await.expect("task must not panic");
        let cluster = result.expect("get must succeed");
        assert_eq!(cluster.id, id);
        assert_eq!(cluster.name, format!("p-r-{id}"));
        assert_eq!(cluster.endpoint, "apikey shared-key");
    }

    server.abort();
}
