use std::sync::Arc;
use std::time::Duration;

use sidecar_catalog::clock::FixedClock;
use sidecar_catalog::defaults::MAX_PENDING_LENGTH;
use sidecar_catalog::service::{Port, ProxyMode, Service, Status};
use sidecar_catalog::CatalogState;
use sidecar_membership::Delegate;

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

fn new_delegate(hostname: &str, at: chrono::DateTime<chrono::Utc>) -> (Arc<CatalogState>, Delegate) {
    let clock = Arc::new(FixedClock::new(at));
    let (state, channels) = CatalogState::new("prod", hostname, 25, clock);
    tokio::spawn(state.clone().run_ingress(channels.ingress_rx));
    let delegate = Delegate::new(
        "prod",
        state.clone(),
        channels.broadcast_rx,
        MAX_PENDING_LENGTH,
        Duration::from_millis(5),
    );
    (state, delegate)
}

#[tokio::test]
async fn node_meta_round_trips_cluster_name_and_host() {
    let t0 = chrono::Utc::now();
    let (_state, delegate) = new_delegate("h1", t0);

    let bytes = delegate.node_meta(1024).unwrap();
    let meta: sidecar_membership::NodeMeta = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(meta.cluster_name, "prod");
    assert_eq!(meta.name, "h1");
}

#[tokio::test]
async fn node_meta_rejects_undersized_limit() {
    let t0 = chrono::Utc::now();
    let (_state, delegate) = new_delegate("h1", t0);

    let err = delegate.node_meta(4).unwrap_err();
    assert!(matches!(err, sidecar_membership::Error::NodeMetaTooLarge { limit: 4 }));
}

#[tokio::test]
async fn notify_msg_merges_a_valid_payload_and_drops_garbage() {
    let t0 = chrono::Utc::now();
    let (state, delegate) = new_delegate("h1", t0);

    let payload = serde_json::to_vec(&svc("a", "h2", Status::Alive, t0)).unwrap();
    delegate.notify_msg(&payload).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let snapshot = state.snapshot().await;
    assert!(snapshot.servers.get("h2").unwrap().services.contains_key("a"));

    // Garbage bytes are logged and dropped, never panicking the caller.
    delegate.notify_msg(b"not json").await;
}

#[tokio::test]
async fn local_state_and_merge_remote_state_round_trip() {
    let t0 = chrono::Utc::now();
    let (state_a, delegate_a) = new_delegate("h1", t0);
    let (state_b, delegate_b) = new_delegate("h2", t0);

    state_a.update_service(svc("a", "h1", Status::Alive, t0)).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let bytes = delegate_a.local_state(true).await.unwrap();
    delegate_b.merge_remote_state(&bytes, true).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let snapshot = state_b.snapshot().await;
    assert!(snapshot.servers.get("h1").unwrap().services.contains_key("a"));

    // A corrupted blob is a no-op, not a panic.
    delegate_b.merge_remote_state(b"{not valid", false).await;
}

#[tokio::test]
async fn notify_leave_expires_the_departed_host() {
    let t0 = chrono::Utc::now();
    let (state, delegate) = new_delegate("h1", t0);

    state.update_service(svc("a", "h2", Status::Alive, t0)).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    delegate.notify_leave(&sidecar_membership::NodeMeta {
        cluster_name: "prod".to_string(),
        name: "h2".to_string(),
    });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.servers.get("h2").unwrap().services.get("a").unwrap().status, Status::Tombstone);
}

#[tokio::test]
async fn notify_leave_retransmits_the_departed_hosts_tombstones_tombstone_count_times() {
    use sidecar_catalog::defaults::TOMBSTONE_COUNT;

    let t0 = chrono::Utc::now();
    let (state, delegate) = new_delegate("h1", t0);

    // A departed host with two live services (E2E scenario 4, spec §8).
    state.update_service(svc("x", "h2", Status::Alive, t0)).await;
    state.update_service(svc("y", "h2", Status::Alive, t0)).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    delegate.notify_leave(&sidecar_membership::NodeMeta {
        cluster_name: "prod".to_string(),
        name: "h2".to_string(),
    });

    // Drain every retransmitted batch off the wire as `notify_leave`'s
    // spawned task sends them (spacing is 5ms in `new_delegate`).
    let mut batches_seen = 0usize;
    for _ in 0..TOMBSTONE_COUNT {
        let payloads = tokio::time::timeout(Duration::from_millis(500), async {
            loop {
                let batch = delegate.get_broadcasts(0, 10_000).await;
                if !batch.is_empty() {
                    return batch;
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .expect("a retransmitted tombstone batch must arrive");
        assert_eq!(payloads.len(), 2, "each retransmission carries both of h2's tombstones");
        batches_seen += 1;
    }
    assert_eq!(batches_seen, TOMBSTONE_COUNT);

    let snapshot = state.snapshot().await;
    assert!(snapshot.servers.get("h2").unwrap().services.values().all(|s| s.status == Status::Tombstone));
}

#[tokio::test]
async fn get_broadcasts_respects_the_byte_budget() {
    let t0 = chrono::Utc::now();
    let (state, delegate) = new_delegate("h1", t0);

    // A remote-origin service is retransmitted onto the broadcast channel
    // by the catalog itself (spec §4.1's `Retransmit`).
    state.update_service(svc("a", "h2", Status::Alive, t0)).await;
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    // A budget smaller than the single queued payload packs nothing, and
    // the payload is preserved in the stash rather than dropped.
    let tiny = delegate.get_broadcasts(0, 8).await;
    assert!(tiny.is_empty());

    // A generous budget then drains the stash.
    let roomy = delegate.get_broadcasts(0, 10_000).await;
    assert_eq!(roomy.len(), 1);
    assert!(roomy[0].len() <= 10_000);
}
