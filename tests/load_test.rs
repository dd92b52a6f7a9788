//! Concurrency tests for the relay.

use std::time::Instant;

use common::EchoReport;

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_stay_correlated() {
    let upstream = common::start_echo_upstream().await;
    let relay = common::start_relay(common::relay_config(upstream.port())).await;
    let client = common::client();
    let total = 100;

    let started = Instant::now();
    let mut handles = Vec::with_capacity(total);
    for i in 0..total {
        let client = client.clone();
        let url = relay.url(&format!("/cgi-bin/message/send?seq={}", i));
        handles.push(tokio::spawn(async move {
            let res = client.get(url).send().await.unwrap();
            assert_eq!(res.status(), 200);
            let report: EchoReport = res.json().await.unwrap();
            (i, report)
        }));
    }

    for handle in handles {
        let (i, report) = handle.await.unwrap();
        assert_eq!(report.path, format!("/cgi-bin/message/send?seq={}", i));
    }

    println!("{} requests in {:?}", total, started.elapsed());
    assert_eq!(relay.stats.total_requests(), total as u64);
    assert_eq!(relay.stats.total_errors(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_mixed_traffic_counts_exactly() {
    let upstream = common::start_echo_upstream().await;
    let relay = common::start_relay(common::relay_config(upstream.port())).await;
    let client = common::client();

    let mut handles = Vec::new();
    for i in 0..60 {
        let client = client.clone();
        let path = match i % 3 {
            0 => format!("/cgi-bin/user/get?userid={}", i),
            1 => "/health".to_string(),
            _ => format!("/static/{}", i),
        };
        let url = relay.url(&path);
        handles.push(tokio::spawn(async move {
            client.get(url).send().await.unwrap().status().as_u16()
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 40);
    assert_eq!(statuses.iter().filter(|s| **s == 404).count(), 20);
    assert_eq!(relay.stats.total_requests(), 20);
    assert_eq!(relay.stats.total_errors(), 0);
}
