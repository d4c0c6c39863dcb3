use std::sync::Arc;
use std::time::Duration;

use sidecar_catalog::clock::FixedClock;
use sidecar_catalog::service::{Port, ProxyMode, Service, Status};
use sidecar_catalog::CatalogState;
use sidecar_loopers::broadcast::{BroadcastConfig, BroadcastTracker};

fn svc(id: &str, hostname: &str, status: Status, updated: chrono::DateTime<chrono::Utc>) -> Service {
    Service {
        id: id.to_string(),
        name: "web".to_string(),
        image: "web:latest".to_string(),
        hostname: hostname.to_string(),
        created: updated,
        updated,
        status,
        proxy_mode: ProxyMode::Http,
        ports: vec![Port {
            kind: "tcp".to_string(),
            port: 8080,
            service_port: 10000,
            ip: None,
        }],
    }
}

#[tokio::test]
async fn new_local_service_is_retransmitted_alive_count_times_with_increasing_updated() {
    let t0 = chrono::Utc::now();
    let clock = Arc::new(FixedClock::new(t0));
    let (catalog, channels) = CatalogState::new("prod", "h1", 25, clock);
    tokio::spawn(catalog.clone().run_ingress(channels.ingress_rx));
    let mut broadcast_rx = channels.broadcast_rx;

    catalog.update_service(svc("a", "h1", Status::Alive, t0)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let cfg = BroadcastConfig {
        tick_interval: Duration::from_secs(1),
        alive_broadcast_interval: Duration::from_secs(60),
        alive_count: 5,
        retransmit_spacing: Duration::from_millis(5),
    };
    let mut tracker = BroadcastTracker::new();
    let broadcast_tx = catalog.broadcast_sender();
    tracker.tick(&catalog, &broadcast_tx, &cfg).await.unwrap();

    let mut seen_updated = Vec::new();
    for _ in 0..cfg.alive_count {
        let batch = tokio::time::timeout(Duration::from_millis(200), broadcast_rx.recv())
            .await
            .expect("retransmission must arrive")
            .expect("channel must stay open")
            .expect("a new-service batch is never the nil sentinel");
        for s in batch {
            if s.id == "a" {
                seen_updated.push(s.updated);
            }
        }
    }

    assert_eq!(seen_updated.len(), cfg.alive_count);
    for pair in seen_updated.windows(2) {
        assert!(pair[1] > pair[0], "retransmissions must have strictly increasing Updated");
    }
}

#[tokio::test]
async fn refresh_only_broadcast_is_sent_once_without_scheduling_retransmissions() {
    let t0 = chrono::Utc::now();
    let clock = Arc::new(FixedClock::new(t0));
    let (catalog, channels) = CatalogState::new("prod", "h1", 25, clock);
    tokio::spawn(catalog.clone().run_ingress(channels.ingress_rx));
    let mut broadcast_rx = channels.broadcast_rx;

    catalog.update_service(svc("a", "h1", Status::Alive, t0)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let cfg = BroadcastConfig {
        tick_interval: Duration::from_secs(1),
        alive_broadcast_interval: Duration::from_secs(60),
        alive_count: 5,
        retransmit_spacing: Duration::from_millis(5),
    };
    let mut tracker = BroadcastTracker::new();
    let broadcast_tx = catalog.broadcast_sender();

    // First tick: "a" is new to the tracker's own bookkeeping, so it is
    // scheduled for ALIVE_COUNT retransmissions. Drain them all.
    tracker.tick(&catalog, &broadcast_tx, &cfg).await.unwrap();
    for _ in 0..cfg.alive_count {
        let _ = broadcast_rx.recv().await;
    }

    // Second tick, immediately after: unchanged and well within
    // ALIVE_BROADCAST_INTERVAL, so nothing new is included — the loop
    // still writes the nil sentinel rather than starving the consumer.
    tracker.tick(&catalog, &broadcast_tx, &cfg).await.unwrap();
    let second = tokio::time::timeout(Duration::from_millis(200), broadcast_rx.recv())
        .await
        .expect("a sentinel must still arrive")
        .expect("channel must stay open");
    assert!(second.is_none(), "an unchanged, recently-broadcast service must not be re-included");
}
