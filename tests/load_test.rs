//! Load testing for concurrent dispatch.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use failover_dispatch::config::{DispatchConfig, DispatcherConfig};
use failover_dispatch::dispatch::{HttpProbe, HttpRequester};
use failover_dispatch::lifecycle::Components;

mod common;

/// Endpoint counting probe hits (path `/`) separately from queries.
async fn start_split_counter(probes: Arc<AtomicU32>, queries: Arc<AtomicU32>) -> SocketAddr {
    common::start_programmable_endpoint(move |path| {
        let probes = probes.clone();
        let queries = queries.clone();
        async move {
            if path == "/" {
                probes.fetch_add(1, Ordering::SeqCst);
            } else {
                queries.fetch_add(1, Ordering::SeqCst);
            }
            (200, r#"{"ok":true}"#.to_string())
        }
    })
    .await
}

#[tokio::test]
async fn test_concurrent_dispatch_shares_one_probe_round() {
    let probes = Arc::new(AtomicU32::new(0));
    let queries = Arc::new(AtomicU32::new(0));
    let a = start_split_counter(probes.clone(), queries.clone()).await;
    let b = start_split_counter(probes.clone(), queries.clone()).await;
    let list = format!("{}\n{}", common::base_url(a), common::base_url(b));

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let requester = HttpRequester::with_client(client);
    let transport = Arc::new(HttpProbe::new(requester.clone(), "/"));
    let components = Components::with_transport(&DispatcherConfig::default(), transport, requester);
    let engine = components.engine.clone();

    let concurrency = 20;
    let requests_per_task = 10;
    let total_requests = concurrency * requests_per_task;

    let start = Instant::now();
    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let engine = engine.clone();
        let requester = components.requester.clone();
        let list = list.clone();
        tasks.push(tokio::spawn(async move {
            let mut served = 0;
            for i in 0..requests_per_task {
                let result = engine
                    .run(
                        &list,
                        format!("/item/{task}/{i}"),
                        |ep, path| requester.get_json(ep, path),
                        &DispatchConfig::default(),
                    )
                    .await;
                if result.is_ok() {
                    served += 1;
                }
            }
            served
        }));
    }

    let mut served = 0;
    for task in tasks {
        served += task.await.unwrap();
    }
    let elapsed = start.elapsed();

    println!("Load test results:");
    println!("  Total requests: {}", total_requests);
    println!("  Served: {}", served);
    println!("  Total time: {:?}", elapsed);

    assert_eq!(served, total_requests);
    assert_eq!(queries.load(Ordering::SeqCst), total_requests as u32);
    // One probe per endpoint for the whole burst.
    assert_eq!(probes.load(Ordering::SeqCst), 2);
    assert!(elapsed < Duration::from_secs(30));
}
