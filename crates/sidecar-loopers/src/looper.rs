use std::future::Future;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// The outcome of one race between a periodic tick and the shutdown signal,
/// the shared primitive every looper in this crate selects on (spec §5,
/// §9's "uniform looper abstraction" redesign note).
pub enum Tick {
    Fire,
    Shutdown,
}

pub async fn wait_tick(ticker: &mut Interval, shutdown: &mut (impl Future<Output = ()> + Unpin)) -> Tick {
    tokio::select! {
        _ = ticker.tick() => Tick::Fire,
        _ = shutdown => Tick::Shutdown,
    }
}

fn new_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Run `body` on a fixed interval until `shutdown` resolves or `max_iterations`
/// is reached. A failing iteration is logged and the loop continues (spec
/// §4.7: the core never crashes a process for data-plane errors).
pub async fn fixed_interval<F, Fut>(
    period: Duration,
    max_iterations: Option<u64>,
    mut shutdown: impl Future<Output = ()> + Unpin,
    mut body: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut ticker = new_ticker(period);
    let mut iterations: u64 = 0;
    loop {
        match wait_tick(&mut ticker, &mut shutdown).await {
            Tick::Shutdown => {
                tracing::info!("looper received shutdown signal");
                break;
            }
            Tick::Fire => {
                if let Err(err) = body().await {
                    tracing::error!(error = %err, "looper iteration failed; continuing");
                }
                iterations += 1;
                if matches!(max_iterations, Some(cap) if iterations >= cap) {
                    break;
                }
            }
        }
    }
}

/// Run `body` back-to-back as fast as it completes, racing `shutdown` on
/// every iteration (spec §9's "unbounded-rate" looper variant). Used for
/// work whose own pacing comes from upstream backpressure rather than a
/// fixed clock (e.g. draining an ingress channel).
pub async fn hot<F, Fut>(max_iterations: Option<u64>, mut shutdown: impl Future<Output = ()> + Unpin, mut body: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    let mut iterations: u64 = 0;
    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                tracing::info!("looper received shutdown signal");
                break;
            }
            result = body() => {
                if let Err(err) = result {
                    tracing::error!(error = %err, "looper iteration failed; continuing");
                }
                iterations += 1;
                if matches!(max_iterations, Some(cap) if iterations >= cap) {
                    break;
                }
            }
        }
    }
}
