//! Dashboard change watcher.
//!
//! The backend has no push channel, so the watcher polls the viewer's
//! project list, diffs it against its previous poll and publishes what
//! changed on the [`EventBus`](crate::EventBus). Dashboards subscribe to the
//! bus rather than polling themselves.
//!
//! The first poll of a watcher is its baseline and publishes nothing, even
//! when the stored cache from an earlier run differs from the server.

use std::collections::HashMap;
use std::time::Duration;

use bidboard_api::MarketplaceApi;
use bidboard_core::{BidStatus, Event, EventKind, Project, ProjectFilter, ProjectStatus, UserId};
use bidboard_storage::Storage;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::WorkContext;
use crate::error::Result;

/// Turns two snapshots of the same projects into events.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChangeDetector;

impl ChangeDetector {
    /// Events explaining how `previous` became `current`.
    ///
    /// Projects seen for the first time produce nothing; they are the
    /// baseline for the next diff.
    pub fn diff(&self, previous: &[Project], current: &[Project]) -> Vec<Event> {
        let before: HashMap<_, _> = previous.iter().map(|p| (&p.id, p)).collect();
        let mut events = Vec::new();

        for project in current {
            let Some(old) = before.get(&project.id) else {
                continue;
            };
            let emit = |events: &mut Vec<Event>, kind| events.push(Event::new(project.id.clone(), kind));

            for bid in &project.bids {
                let bid_id = bid.id.clone();
                let kind = match old.bid(&bid.id).map(|b| b.status) {
                    None => Some(EventKind::BidSubmitted { bid_id }),
                    Some(was) if was == bid.status => None,
                    Some(_) => match bid.status {
                        BidStatus::Accepted => Some(EventKind::BidAccepted { bid_id }),
                        BidStatus::Rejected => Some(EventKind::BidRejected { bid_id }),
                        BidStatus::Confirmed => Some(EventKind::BidConfirmed { bid_id }),
                        BidStatus::Declined => Some(EventKind::BidDeclined { bid_id }),
                        BidStatus::Pending => None,
                    },
                };
                if let Some(kind) = kind {
                    emit(&mut events, kind);
                }
            }

            if old.status != project.status {
                match project.status {
                    ProjectStatus::InProgress => emit(&mut events, EventKind::EscrowFunded),
                    ProjectStatus::Completed => emit(&mut events, EventKind::ProjectCompleted),
                    ProjectStatus::Cancelled => emit(&mut events, EventKind::ProjectCancelled),
                    ProjectStatus::Open => {}
                }
            }

            if project.progress > old.progress {
                emit(
                    &mut events,
                    EventKind::ProgressUpdated {
                        previous: old.progress,
                        current: project.progress,
                    },
                );
                if project.progress >= 100 && project.status == ProjectStatus::InProgress {
                    emit(&mut events, EventKind::CompletionRequested);
                }
            }
        }

        events
    }
}

/// Whose projects to watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchScope {
    /// Projects the user posted
    Client(UserId),
    /// Projects the user bid on or works on
    Freelancer(UserId),
}

impl WatchScope {
    fn filter(&self) -> ProjectFilter {
        match self {
            WatchScope::Client(id) => ProjectFilter {
                client: Some(id.clone()),
                ..Default::default()
            },
            WatchScope::Freelancer(id) => ProjectFilter {
                freelancer: Some(id.clone()),
                ..Default::default()
            },
        }
    }
}

/// Polls the backend and publishes changes.
pub struct DashboardWatcher<S: Storage, A: MarketplaceApi> {
    ctx: WorkContext<S, A>,
    scope: WatchScope,
    interval: Duration,
    max_backoff: Duration,
    detector: ChangeDetector,
    seen: Mutex<Option<Vec<Project>>>,
}

impl<S: Storage + 'static, A: MarketplaceApi + 'static> DashboardWatcher<S, A> {
    /// Create a watcher refreshing every `interval`.
    pub fn new(ctx: WorkContext<S, A>, scope: WatchScope, interval: Duration) -> Self {
        Self {
            ctx,
            scope,
            interval,
            max_backoff: interval * 12,
            detector: ChangeDetector,
            seen: Mutex::new(None),
        }
    }

    /// Cap on the delay after repeated failures.
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff.max(self.interval);
        self
    }

    /// Refresh once: fetch, diff, store, publish.
    pub async fn poll_once(&self) -> Result<Vec<Event>> {
        let current = match &self.scope {
            WatchScope::Client(_) => self.ctx.api.client_projects().await?,
            WatchScope::Freelancer(_) => self.ctx.api.freelancer_projects().await?,
        };

        let filter = self.scope.filter();
        let mut seen = self.seen.lock().await;
        let events = match seen.as_deref() {
            Some(previous) => self.detector.diff(previous, &current),
            None => Vec::new(),
        };
        {
            let mut storage = self.ctx.storage.lock().await;
            storage.apply_snapshot(&filter, &current).await?;
            storage.commit("dashboard refresh").await?;
        }
        *seen = Some(current.clone());
        drop(seen);

        debug!(projects = current.len(), events = events.len(), "dashboard refreshed");
        for event in &events {
            self.ctx.bus.publish(event.clone());
        }
        Ok(events)
    }

    /// Delay after a failure, doubling up to the cap.
    fn next_delay(&self, delay: Duration) -> Duration {
        (delay * 2).min(self.max_backoff)
    }

    /// Poll until `shutdown` turns true or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(scope = ?self.scope, interval_secs = self.interval.as_secs(), "dashboard watcher started");
        let mut delay = Duration::ZERO;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    delay = match self.poll_once().await {
                        Ok(_) => self.interval,
                        Err(e) => {
                            let next = self.next_delay(delay.max(self.interval));
                            warn!(error = %e, retry_in_secs = next.as_secs(), "dashboard refresh failed");
                            next
                        }
                    };
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("dashboard watcher stopped");
    }

    /// Run on the runtime; stop through the returned handle.
    pub fn spawn(self) -> WatcherHandle {
        let (tx, rx) = watch::channel(false);
        let join = tokio::spawn(self.run(rx));
        WatcherHandle { shutdown: tx, join }
    }
}

/// Handle to a spawned watcher.
pub struct WatcherHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WatcherHandle {
    /// Signal shutdown and wait for the loop to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.join.await {
            warn!(error = %e, "dashboard watcher task failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::LogNotifier;
    use bidboard_api::MockApi;
    use bidboard_core::{BidAction, BidId, ProjectId, Role, User};
    use bidboard_storage::MemoryStorage;
    use std::sync::Arc;

    fn project(bids: serde_json::Value) -> Project {
        serde_json::from_value(serde_json::json!({
            "_id": "p1",
            "title": "Data cleaning",
            "status": "open",
            "clientId": "c1",
            "bids": bids
        }))
        .unwrap()
    }

    #[test]
    fn test_diff_bid_lifecycle() {
        let before = project(serde_json::json!([
            {"_id": "b1", "freelancerId": "f1", "amount": 100, "status": "pending"}
        ]));
        let mut after = before.clone();
        after.apply_bid_action(&BidId::new("b1"), BidAction::Accept).unwrap();
        after.apply_bid_action(&BidId::new("b1"), BidAction::Confirm).unwrap();

        let events = ChangeDetector.diff(&[before.clone()], &[after.clone()]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::BidConfirmed { bid_id: BidId::new("b1") });
        assert!(events[0].prompt().is_some());

        // First sighting is a baseline.
        assert!(ChangeDetector.diff(&[], &[after]).is_empty());
        // No change, no events.
        assert!(ChangeDetector.diff(&[before.clone()], &[before]).is_empty());
    }

    #[test]
    fn test_diff_progress_and_status() {
        let mut before = project(serde_json::json!([]));
        before.status = ProjectStatus::InProgress;
        before.progress = 70;
        let mut after = before.clone();
        after.progress = 100;

        let kinds: Vec<EventKind> = ChangeDetector
            .diff(&[before.clone()], &[after.clone()])
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ProgressUpdated { previous: 70, current: 100 },
                EventKind::CompletionRequested
            ]
        );

        let mut done = after.clone();
        done.status = ProjectStatus::Completed;
        let kinds: Vec<EventKind> = ChangeDetector.diff(&[after], &[done]).into_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::ProjectCompleted]);
    }

    fn context(api: Arc<MockApi>) -> WorkContext<MemoryStorage, MockApi> {
        WorkContext::new(Arc::new(Mutex::new(MemoryStorage::new())), api, Arc::new(LogNotifier))
    }

    fn client() -> User {
        User {
            id: UserId::new("c1"),
            fullname: "Cara".to_string(),
            email: "c1@x.io".to_string(),
            role: Role::Client,
            verified: true,
            profile_photo: None,
        }
    }

    #[tokio::test]
    async fn test_poll_publishes_server_changes() {
        let api = Arc::new(MockApi::new().with_user(client()).with_project(project(serde_json::json!([]))));
        let ctx = context(api.clone());
        let mut events = ctx.bus.subscribe();
        let watcher = DashboardWatcher::new(ctx, WatchScope::Client(UserId::new("c1")), Duration::from_secs(5));

        assert!(watcher.poll_once().await.unwrap().is_empty());

        let mut changed = api.server_project(&ProjectId::new("p1")).unwrap();
        changed.bids = project(serde_json::json!([
            {"_id": "b9", "freelancerId": "f9", "amount": 300, "status": "pending"}
        ]))
        .bids;
        api.put_project(changed);

        let published = watcher.poll_once().await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(
            events.recv().await.unwrap().kind,
            EventKind::BidSubmitted { bid_id: BidId::new("b9") }
        );
    }

    #[tokio::test]
    async fn test_first_poll_ignores_earlier_cache() {
        let api = Arc::new(MockApi::new().with_user(client()).with_project(project(serde_json::json!([
            {"_id": "b1", "freelancerId": "f1", "amount": 100, "status": "pending"}
        ]))));
        let ctx = context(api.clone());
        // Left behind by an earlier session, before b1 arrived.
        ctx.storage
            .lock()
            .await
            .save_project(&project(serde_json::json!([])))
            .await
            .unwrap();
        let mut events = ctx.bus.subscribe();
        let watcher = DashboardWatcher::new(ctx.clone(), WatchScope::Client(UserId::new("c1")), Duration::from_secs(5));

        assert!(watcher.poll_once().await.unwrap().is_empty());
        assert!(events.try_recv().is_err());
        let stored = ctx.storage.lock().await.load_project(&ProjectId::new("p1")).await.unwrap().unwrap();
        assert_eq!(stored.bids.len(), 1);

        let mut changed = api.server_project(&ProjectId::new("p1")).unwrap();
        changed.apply_bid_action(&BidId::new("b1"), BidAction::Reject).unwrap();
        api.put_project(changed);

        let published = watcher.poll_once().await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(
            events.recv().await.unwrap().kind,
            EventKind::BidRejected { bid_id: BidId::new("b1") }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_backs_off_and_stops() {
        let api = Arc::new(MockApi::new().with_user(client()));
        api.fail("client_projects", "Service unavailable");
        let watcher = DashboardWatcher::new(
            context(api.clone()),
            WatchScope::Client(UserId::new("c1")),
            Duration::from_secs(5),
        )
        .with_max_backoff(Duration::from_secs(20));

        let handle = watcher.spawn();
        // Attempts at 0s, 10s, 30s, 50s: the delay doubles from 5s and caps at 20s.
        tokio::time::sleep(Duration::from_secs(55)).await;
        assert_eq!(api.call_count("client_projects"), 4);

        api.heal("client_projects");
        handle.stop().await;
        let calls = api.call_count("client_projects");
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.call_count("client_projects"), calls);
    }
}
