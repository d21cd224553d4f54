//! ReservationPoller - 予約の定期昇格ループ
//!
//! 一定間隔で `process_due_reservations(None)` を呼ぶだけのループです。
//! 失敗はログに出して次の周期で再試行します（昇格は冪等なので安全）。

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::reservation::ReservationManager;

/// 既定のポーリング間隔（分単位の精度で十分）
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Poller handle.
/// - `request_shutdown()` でループが止まる
/// - `shutdown_and_join()` で終了を待てる
pub struct ReservationPoller {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl ReservationPoller {
    /// ループを起動する（最初の処理は即時）
    pub fn spawn(reservations: ReservationManager, interval: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(poll_loop(reservations, interval, shutdown_rx));
        Self { shutdown_tx, join }
    }

    /// Request shutdown. An in-flight pass finishes before the loop exits.
    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn poll_loop(
    reservations: ReservationManager,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "reservation poller started");

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                // handle dropped: stop with it
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        match reservations.process_due_reservations(None).await {
            Ok(outcome) if outcome.changed => {
                info!(promoted = outcome.promoted.len(), "due reservations promoted");
            }
            Ok(_) => debug!("no due reservations"),
            Err(e) => warn!(error = %e, "reservation pass failed"),
        }
    }

    info!("reservation poller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::context::{SchedulerConfig, SchedulerContext};
    use crate::impls::InMemoryTaskStore;
    use crate::ports::{FixedClock, SequenceIdGenerator, TaskStore};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Arc;

    #[tokio::test]
    async fn promotes_on_tick_and_stops_on_shutdown() {
        let store = InMemoryTaskStore::new();
        let clock = FixedClock::new(
            chrono_tz::Asia::Tokyo
                .with_ymd_and_hms(2025, 3, 14, 10, 0, 0)
                .unwrap()
                .with_timezone(&Utc),
        );
        let ctx = Arc::new(SchedulerContext::new(
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            Arc::new(SequenceIdGenerator::new()),
            SchedulerConfig::default(),
        ));
        let reservations = ReservationManager::new(ctx);
        reservations
            .add_reservation(None, "Standup", "10:00", None)
            .await
            .unwrap();

        let poller = ReservationPoller::spawn(reservations, Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(50)).await;
        poller.shutdown_and_join().await;

        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
        let tasks = store.load_schedule(date).await.unwrap();
        assert!(tasks[0].is_running());
    }
}
