use eco_client::{ClientBuilder, Error, RetryPolicy};

/// Runs against a real API when `ECO_API_URL` and `ECO_API_KEY` are set.
#[tokio::test]
async fn live_read_only_roundtrip() {
    let builder = match ClientBuilder::from_env() {
        Ok(builder) => builder,
        Err(_) => {
            eprintln!("skipping live test: ECO_API_URL / ECO_API_KEY not set");
            return;
        }
    };
    let client = builder
        .retry(RetryPolicy::disabled())
        .build()
        .expect("client from env must build");

    let version = client
        .clusters()
        .server_version()
        .await
        .expect("server version must succeed");
    assert!(!version.is_empty());

    client
        .clusters()
        .list()
        .await
        .expect("listing clusters must succeed");

    match client.clusters().get(u64::MAX).await {
        Err(Error::Remote(err)) => assert!(err.status.is_client_error(), "got {err}"),
        other => panic!("expected a 4xx remote error for an unknown cluster, got {other:?}"),
    }
}
