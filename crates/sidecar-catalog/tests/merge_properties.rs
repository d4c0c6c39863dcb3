use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use sidecar_catalog::clock::FixedClock;
use sidecar_catalog::service::{Port, ProxyMode, Service, Status};
use sidecar_catalog::CatalogState;

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

async fn apply_all(services: &[Service]) -> Service {
    let t0 = chrono::Utc::now();
    let clock = Arc::new(FixedClock::new(t0));
    let (catalog, channels) = CatalogState::new("prod", "h1", 25, clock);
    tokio::spawn(catalog.clone().run_ingress(channels.ingress_rx));

    for svc in services {
        catalog.update_service(svc.clone()).await;
    }
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    catalog.get_local_service_by_id("a").await.expect("at least one update was applied")
}

fn run(services: Vec<Service>) -> Service {
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(apply_all(&services))
}

proptest! {
    /// Re-applying the exact same update a second time must not change the
    /// stored record — a non-invalidating merge is silently dropped (spec
    /// §4.1, §8's retransmit-termination property).
    #[test]
    fn reapplying_the_same_update_is_a_no_op(offset_secs in 0i64..100_000, status_idx in 0usize..4) {
        let t0 = chrono::Utc::now();
        let statuses = [Status::Alive, Status::Unhealthy, Status::Unknown, Status::Tombstone];
        let updated = t0 + chrono::Duration::seconds(offset_secs);
        let update = svc("a", "h1", statuses[status_idx], updated);

        let once = run(vec![update.clone()]);
        let twice = run(vec![update.clone(), update]);

        prop_assert_eq!(once.status, twice.status);
        prop_assert_eq!(once.updated, twice.updated);
    }

    /// When every update in a sequence shares the same status, `invalidates`
    /// reduces to "strictly newer `Updated` wins" — a last-writer-wins
    /// merge, which converges to the same record regardless of delivery
    /// order (spec §4.1; this is what anti-entropy's periodic full-state
    /// exchange relies on to converge peers that received gossip out of
    /// order).
    #[test]
    fn same_status_updates_converge_regardless_of_delivery_order(offsets in prop::collection::vec(0i64..100_000, 1..8)) {
        let t0 = chrono::Utc::now();
        let forward: Vec<Service> = offsets
            .iter()
            .map(|secs| svc("a", "h1", Status::Alive, t0 + chrono::Duration::seconds(*secs)))
            .collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        let forward_result = run(forward);
        let reversed_result = run(reversed);

        prop_assert_eq!(forward_result.updated, reversed_result.updated);
        prop_assert_eq!(forward_result.status, reversed_result.status);

        let max_offset = offsets.iter().copied().max().unwrap();
        prop_assert_eq!(forward_result.updated, t0 + chrono::Duration::seconds(max_offset));
    }
}
