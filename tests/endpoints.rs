//! Status endpoints, preflight and CORS.

mod common;

#[tokio::test]
async fn test_health_reports_target_and_counters() {
    let upstream = common::start_echo_upstream().await;
    let relay = common::start_relay(common::relay_config(upstream.port())).await;
    let client = common::client();

    client.get(relay.url("/cgi-bin/x")).send().await.unwrap();

    let res = client.get(relay.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let text = res.text().await.unwrap();
    assert!(text.contains("\n  \"status\""), "pretty printed: {}", text);

    let health: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["service"], "wecom-proxy");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(health["target"]["host"], "127.0.0.1");
    assert_eq!(health["target"]["port"], upstream.port());
    assert_eq!(health["stats"]["totalRequests"], 1);
    assert_eq!(health["stats"]["totalErrors"], 0);
    assert!(health["stats"]["uptime"].as_f64().unwrap() >= 0.0);
    assert!(health["stats"]["memoryUsage"].is_object());
    assert!(health["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_stats_is_flat_and_not_counted() {
    let relay = common::start_relay(common::relay_config(common::closed_port())).await;
    let client = common::client();

    for _ in 0..3 {
        let res = client.get(relay.url("/stats")).send().await.unwrap();
        assert_eq!(res.status(), 200);
        let stats: serde_json::Value = res.json().await.unwrap();
        assert_eq!(stats["totalRequests"], 0);
        assert_eq!(stats["totalErrors"], 0);
        assert!(stats["memoryUsage"].is_object());
        assert!(stats["timestamp"].is_string());
    }

    client.get(relay.url("/health")).send().await.unwrap();
    client.get(relay.url("/")).send().await.unwrap();
    assert_eq!(relay.stats.total_requests(), 0);
}

#[tokio::test]
async fn test_help_text_lists_target() {
    let relay = common::start_relay(common::relay_config(4321)).await;

    let res = common::client().get(relay.url("/")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let text = res.text().await.unwrap();
    assert!(text.contains("All /cgi-bin/* requests are proxied to 127.0.0.1:4321"));
    assert!(text.contains("Total Requests: 0"));
    assert!(text.contains("Total Errors: 0"));
    assert!(text.contains("PROXY_PORT"));
}

#[tokio::test]
async fn test_preflight_on_any_path() {
    let relay = common::start_relay(common::relay_config(common::closed_port())).await;
    let client = common::client();

    for path in ["/", "/health", "/cgi-bin/message/send", "/nowhere"] {
        let res = client
            .request(reqwest::Method::OPTIONS, relay.url(path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 204, "path {}", path);
        assert_eq!(res.headers()["access-control-allow-origin"], "*");
        assert_eq!(
            res.headers()["access-control-allow-methods"],
            "GET, POST, OPTIONS"
        );
        assert_eq!(
            res.headers()["access-control-allow-headers"],
            "Content-Type, Authorization"
        );
        assert!(res.bytes().await.unwrap().is_empty());
    }

    // Preflight never contacts the upstream.
    assert_eq!(relay.stats.total_requests(), 0);
    assert_eq!(relay.stats.total_errors(), 0);
}

#[tokio::test]
async fn test_cors_headers_on_every_response() {
    let relay = common::start_relay(common::relay_config(common::closed_port())).await;
    let client = common::client();

    for (path, status) in [("/", 200), ("/health", 200), ("/stats", 200), ("/nope", 404), ("/cgi-bin/x", 502)] {
        let res = client.get(relay.url(path)).send().await.unwrap();
        assert_eq!(res.status(), status, "path {}", path);
        assert_eq!(res.headers()["access-control-allow-origin"], "*", "path {}", path);
        assert!(res.headers().contains_key("access-control-allow-methods"));
        assert!(res.headers().contains_key("access-control-allow-headers"));
    }
}

#[tokio::test]
async fn test_status_paths_with_query_are_not_status_endpoints() {
    let relay = common::start_relay(common::relay_config(common::closed_port())).await;

    for target in ["/health?x=1", "/stats?window=60", "/?help", "/health?format=json"] {
        let (status, body) = common::raw_get(relay.addr, target).await;
        assert_eq!(status, 404, "target {}", target);
        assert_eq!(body, "Not Found - Only /cgi-bin/ paths are proxied");
    }

    // Bare paths still answer, and nothing above was counted.
    let (status, _) = common::raw_get(relay.addr, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(relay.stats.total_requests(), 0);
    assert_eq!(relay.stats.total_errors(), 0);
}
