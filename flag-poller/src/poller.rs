use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common_types::FeatureFlag;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};

use crate::backoff::{Backoff, PollOutcome};
use crate::client::{FlagSource, PollError};
use crate::config::PollSettings;

/// Newest `updated_at` across a fetched set. `None` for an empty set.
type ChangeMarker = Option<DateTime<Utc>>;

fn change_marker(flags: &[FeatureFlag]) -> ChangeMarker {
    flags.iter().map(|f| f.updated_at).max()
}

type Fetch = Pin<Box<dyn Future<Output = Result<Vec<FeatureFlag>, PollError>> + Send>>;

/// Resolves with the fetch result, or never if nothing is in flight.
async fn in_flight(fetch: &mut Option<Fetch>) -> Result<Vec<FeatureFlag>, PollError> {
    match fetch {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}

/// The cached flag set as seen by gated components.
#[derive(Clone, Debug, Default)]
pub struct FlagSnapshot {
    // None until the first successful fetch.
    flags: Option<Arc<BTreeMap<String, FeatureFlag>>>,
}

impl FlagSnapshot {
    fn from_flags(flags: Vec<FeatureFlag>) -> Self {
        let by_key = flags
            .into_iter()
            .map(|f| (f.feature_key.clone(), f))
            .collect();
        FlagSnapshot {
            flags: Some(Arc::new(by_key)),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.flags.is_some()
    }

    /// Fails open: an unknown key, or a cache that was never filled, reads as
    /// enabled.
    pub fn is_enabled(&self, feature_key: &str) -> bool {
        self.get_flag(feature_key).map_or(true, |f| f.enabled)
    }

    pub fn get_flag(&self, feature_key: &str) -> Option<&FeatureFlag> {
        self.flags.as_ref()?.get(feature_key)
    }

    pub fn flags(&self) -> Vec<FeatureFlag> {
        self.flags
            .as_ref()
            .map(|f| f.values().cloned().collect())
            .unwrap_or_default()
    }
}

/// Pending requests from handles. Each `Notify` holds at most one permit, so
/// repeated requests before the poller wakes collapse into one.
#[derive(Default)]
struct Triggers {
    /// Page regained focus: fetch now, leave the schedule alone.
    visibility: Notify,
    /// Forget what was seen and poll on the schedule right away.
    invalidate: Notify,
}

/// Read side of a polling session. Cheap to clone; every clone reads the
/// same snapshot. The session stops once all handles are dropped.
#[derive(Clone)]
pub struct FlagHandle {
    snapshot: watch::Receiver<FlagSnapshot>,
    triggers: Arc<Triggers>,
}

impl FlagHandle {
    pub fn is_enabled(&self, feature_key: &str) -> bool {
        self.snapshot.borrow().is_enabled(feature_key)
    }

    pub fn get_flag(&self, feature_key: &str) -> Option<FeatureFlag> {
        self.snapshot.borrow().get_flag(feature_key).cloned()
    }

    pub fn flags(&self) -> Vec<FeatureFlag> {
        self.snapshot.borrow().flags()
    }

    pub fn snapshot(&self) -> FlagSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn refresh_visible(&self) {
        self.triggers.visibility.notify_one();
    }

    pub fn invalidate(&self) {
        self.triggers.invalidate.notify_one();
    }

    /// Waits until the cached set is replaced. Returns false once the
    /// session has stopped.
    pub async fn changed(&mut self) -> bool {
        self.snapshot.changed().await.is_ok()
    }
}

/// One polling session: owns the cache, the last seen change marker and the
/// backoff state.
pub struct FlagPoller<S> {
    source: Arc<S>,
    settings: PollSettings,
    backoff: Backoff,
    last_seen: Option<ChangeMarker>,
    snapshot: watch::Sender<FlagSnapshot>,
    triggers: Arc<Triggers>,
}

impl<S> FlagPoller<S>
where
    S: FlagSource + 'static,
{
    pub fn new(source: Arc<S>, settings: PollSettings) -> (FlagPoller<S>, FlagHandle) {
        let (snapshot_tx, snapshot_rx) = watch::channel(FlagSnapshot::default());
        let triggers = Arc::new(Triggers::default());

        let poller = FlagPoller {
            source,
            backoff: Backoff::new(&settings),
            settings,
            last_seen: None,
            snapshot: snapshot_tx,
            triggers: triggers.clone(),
        };
        let handle = FlagHandle {
            snapshot: snapshot_rx,
            triggers,
        };
        (poller, handle)
    }

    pub fn spawn(source: Arc<S>, settings: PollSettings) -> (FlagHandle, JoinHandle<()>) {
        let (poller, handle) = FlagPoller::new(source, settings);
        (handle, tokio::spawn(poller.run()))
    }

    /// Polls immediately, then on the adaptive schedule. The deadline is an
    /// absolute instant, so out-of-band fetches never move it.
    ///
    /// At most one scheduled and one visibility fetch are in flight at a
    /// time, and neither waits on the other. Whichever resolves last wins the
    /// cache.
    pub async fn run(mut self) {
        let mut deadline = Instant::now();
        let mut scheduled: Option<Fetch> = None;
        let mut out_of_band: Option<Fetch> = None;

        loop {
            tokio::select! {
                _ = sleep_until(deadline), if scheduled.is_none() => {
                    scheduled = Some(self.fetch());
                }
                result = in_flight(&mut scheduled), if scheduled.is_some() => {
                    scheduled = None;
                    let outcome = self.scheduled_outcome(result);
                    let interval = self.backoff.next_interval(outcome);
                    tracing::debug!(?outcome, ?interval, multiplier = self.backoff.multiplier(), "scheduled next flag poll");
                    deadline = Instant::now() + interval;
                }
                result = in_flight(&mut out_of_band), if out_of_band.is_some() => {
                    out_of_band = None;
                    self.refresh_outcome(result);
                }
                _ = self.triggers.visibility.notified() => {
                    if out_of_band.is_none() {
                        out_of_band = Some(self.fetch());
                    } else {
                        tracing::debug!("visibility refresh already in flight");
                    }
                }
                _ = self.triggers.invalidate.notified() => {
                    // a fetch already under way may predate the write
                    scheduled = None;
                    self.last_seen = None;
                    deadline = Instant::now();
                }
                _ = self.snapshot.closed() => break,
            }
        }
        tracing::info!("flag poller stopped");
    }

    fn fetch(&self) -> Fetch {
        let source = self.source.clone();
        let fetch_timeout = self.settings.fetch_timeout;
        Box::pin(async move {
            match timeout(fetch_timeout, source.fetch_flags()).await {
                Ok(result) => result,
                Err(_) => Err(PollError::Timeout),
            }
        })
    }

    /// Replaces the cache if the marker moved. Returns whether it did.
    fn observe(&mut self, flags: Vec<FeatureFlag>) -> bool {
        let marker = change_marker(&flags);
        if self.last_seen == Some(marker) {
            return false;
        }
        self.last_seen = Some(marker);
        self.snapshot.send_replace(FlagSnapshot::from_flags(flags));
        true
    }

    fn scheduled_outcome(&mut self, result: Result<Vec<FeatureFlag>, PollError>) -> PollOutcome {
        match result {
            Ok(flags) => {
                if self.observe(flags) {
                    tracing::info!(last_seen = ?self.last_seen, "feature flags changed");
                    PollOutcome::Changed
                } else {
                    PollOutcome::Unchanged
                }
            }
            Err(e) => {
                tracing::warn!("failed to fetch feature flags: {}", e);
                PollOutcome::Failed
            }
        }
    }

    /// Out-of-band results update the cache but never the backoff.
    fn refresh_outcome(&mut self, result: Result<Vec<FeatureFlag>, PollError>) {
        match result {
            Ok(flags) => {
                if self.observe(flags) {
                    tracing::info!("feature flags changed on visibility refresh");
                }
            }
            Err(e) => tracing::warn!("visibility refresh failed: {}", e),
        }
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use common_types::keys;

    use super::*;

    fn flag(key: &str, enabled: bool, updated_at: DateTime<Utc>) -> FeatureFlag {
        FeatureFlag {
            id: 1,
            feature_key: key.to_string(),
            feature_name: key.to_string(),
            description: format!("{key} section"),
            enabled,
            updated_at,
        }
    }

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    /// Serves whatever flags it currently holds and records when it was asked.
    #[derive(Default)]
    struct ScriptedSource {
        flags: Mutex<Vec<FeatureFlag>>,
        calls: Mutex<Vec<Instant>>,
        failing: AtomicBool,
        hang: AtomicBool,
    }

    impl ScriptedSource {
        fn with_flags(flags: Vec<FeatureFlag>) -> Arc<Self> {
            let source = ScriptedSource::default();
            *source.flags.lock().unwrap() = flags;
            Arc::new(source)
        }

        fn set_flags(&self, flags: Vec<FeatureFlag>) {
            *self.flags.lock().unwrap() = flags;
        }

        fn intervals(&self) -> Vec<f64> {
            let calls = self.calls.lock().unwrap();
            calls
                .windows(2)
                .map(|w| (w[1] - w[0]).as_secs_f64())
                .collect()
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl FlagSource for ScriptedSource {
        async fn fetch_flags(&self) -> Result<Vec<FeatureFlag>, PollError> {
            self.calls.lock().unwrap().push(Instant::now());
            if self.hang.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(PollError::Timeout);
            }
            Ok(self.flags.lock().unwrap().clone())
        }
    }

    async fn poll_once(poller: &mut FlagPoller<ScriptedSource>) -> PollOutcome {
        let result = poller.fetch().await;
        poller.scheduled_outcome(result)
    }

    fn assert_intervals(actual: &[f64], expected: &[f64]) {
        assert!(
            actual.len() >= expected.len(),
            "expected at least {} intervals, got {:?}",
            expected.len(),
            actual
        );
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 0.01, "intervals {actual:?} != {expected:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn idle_session_backs_off_to_the_cap() {
        let source = ScriptedSource::with_flags(vec![flag(keys::RSVP, true, t(0))]);
        let (handle, _task) = FlagPoller::spawn(source.clone(), PollSettings::default());

        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_intervals(
            &source.intervals(),
            &[10.0, 15.0, 22.5, 33.75, 50.625, 60.0, 60.0],
        );
        assert!(handle.is_enabled(keys::RSVP));
    }

    #[tokio::test(start_paused = true)]
    async fn a_change_resets_the_interval() {
        let source = ScriptedSource::with_flags(vec![flag(keys::MESSAGES, false, t(0))]);
        let (handle, _task) = FlagPoller::spawn(source.clone(), PollSettings::default());

        // polls at 0, 10, 25, 47.5
        tokio::time::sleep(Duration::from_secs(50)).await;
        assert!(!handle.is_enabled(keys::MESSAGES));
        source.set_flags(vec![flag(keys::MESSAGES, true, t(60))]);

        // next poll at 81.25 sees the change, the one after comes 10s later
        tokio::time::sleep(Duration::from_secs(45)).await;
        assert!(handle.is_enabled(keys::MESSAGES));
        assert_intervals(&source.intervals(), &[10.0, 15.0, 22.5, 33.75, 10.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_back_off_and_keep_the_cache() {
        let source = ScriptedSource::with_flags(vec![flag(keys::GALLERY, false, t(0))]);
        let (handle, _task) = FlagPoller::spawn(source.clone(), PollSettings::default());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!handle.is_enabled(keys::GALLERY));

        source.failing.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(150)).await;

        assert_intervals(&source.intervals(), &[10.0, 15.0, 22.5, 33.75, 50.625]);
        assert!(!handle.is_enabled(keys::GALLERY));
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_server_fails_open() {
        let source = Arc::new(ScriptedSource::default());
        source.failing.store(true, Ordering::SeqCst);
        let (handle, _task) = FlagPoller::spawn(source.clone(), PollSettings::default());

        tokio::time::sleep(Duration::from_secs(30)).await;

        assert!(!handle.snapshot().is_populated());
        for key in keys::ALL {
            assert!(handle.is_enabled(key));
        }
        assert!(handle.is_enabled("nonexistent-key"));
        assert_eq!(handle.get_flag(keys::RSVP), None);
        assert!(handle.flags().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_key_fails_open_with_a_populated_cache() {
        let source = ScriptedSource::with_flags(vec![flag(keys::MUSIC, false, t(0))]);
        let (handle, _task) = FlagPoller::spawn(source, PollSettings::default());

        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!handle.is_enabled(keys::MUSIC));
        assert!(handle.is_enabled("nonexistent-key"));
        assert_eq!(handle.flags().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out_as_no_change() {
        let source = Arc::new(ScriptedSource::default());
        source.hang.store(true, Ordering::SeqCst);
        let settings = PollSettings {
            fetch_timeout: Duration::from_secs(2),
            ..PollSettings::default()
        };
        let (mut poller, handle) = FlagPoller::new(source, settings);

        assert_eq!(poll_once(&mut poller).await, PollOutcome::Failed);
        assert!(!handle.snapshot().is_populated());
    }

    #[tokio::test(start_paused = true)]
    async fn first_fetch_counts_as_a_change_even_when_empty() {
        let source = Arc::new(ScriptedSource::default());
        let (mut poller, handle) = FlagPoller::new(source, PollSettings::default());

        assert_eq!(poll_once(&mut poller).await, PollOutcome::Changed);
        assert_eq!(poll_once(&mut poller).await, PollOutcome::Unchanged);
        assert!(handle.snapshot().is_populated());
    }

    #[tokio::test(start_paused = true)]
    async fn visibility_refresh_updates_cache_without_moving_the_schedule() {
        let source = ScriptedSource::with_flags(vec![flag(keys::COUNTDOWN, true, t(0))]);
        let (handle, _task) = FlagPoller::spawn(source.clone(), PollSettings::default());

        // polls at 0, 10
        tokio::time::sleep(Duration::from_secs(12)).await;
        source.set_flags(vec![flag(keys::COUNTDOWN, false, t(20))]);
        handle.refresh_visible();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(!handle.is_enabled(keys::COUNTDOWN));
        assert_eq!(source.call_count(), 3);

        // scheduled poll still lands at 25
        tokio::time::sleep(Duration::from_secs(13)).await;
        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 4);
        assert!(((calls[3] - calls[1]).as_secs_f64() - 15.0).abs() < 0.01);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_polls_now_and_resets_backoff() {
        let source = ScriptedSource::with_flags(vec![flag(keys::RSVP, true, t(0))]);
        let (handle, _task) = FlagPoller::spawn(source.clone(), PollSettings::default());

        // polls at 0, 10, 25, 47.5, 81.25; the next one is due at 131.875
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(source.call_count(), 5);

        handle.invalidate();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.call_count(), 6);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.call_count(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_visibility_fetch_does_not_hold_up_the_schedule() {
        let source = ScriptedSource::with_flags(vec![flag(keys::RSVP, true, t(0))]);
        let (handle, _task) = FlagPoller::spawn(source.clone(), PollSettings::default());

        tokio::time::sleep(Duration::from_secs(9)).await;
        source.hang.store(true, Ordering::SeqCst);
        handle.refresh_visible();
        tokio::time::sleep(Duration::from_millis(100)).await;
        source.hang.store(false, Ordering::SeqCst);

        // the visibility fetch at 9 is still pending; the 10s poll goes out anyway
        tokio::time::sleep(Duration::from_millis(2900)).await;
        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert!(((calls[2] - calls[0]).as_secs_f64() - 10.0).abs() < 0.01);
        assert!(handle.is_enabled(keys::RSVP));
    }

    #[tokio::test(start_paused = true)]
    async fn visibility_refresh_runs_while_a_scheduled_fetch_hangs() {
        let source = ScriptedSource::with_flags(vec![flag(keys::GALLERY, true, t(0))]);
        let (handle, _task) = FlagPoller::spawn(source.clone(), PollSettings::default());

        tokio::time::sleep(Duration::from_secs(9)).await;
        source.hang.store(true, Ordering::SeqCst);

        // the 10s poll is stuck until its timeout at 20
        tokio::time::sleep(Duration::from_secs(3)).await;
        source.hang.store(false, Ordering::SeqCst);
        source.set_flags(vec![flag(keys::GALLERY, false, t(11))]);
        handle.refresh_visible();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(source.call_count(), 3);
        assert!(!handle.is_enabled(keys::GALLERY));
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_triggers_collapse_into_one_fetch() {
        let source = ScriptedSource::with_flags(vec![flag(keys::RSVP, true, t(0))]);
        let (handle, _task) = FlagPoller::spawn(source.clone(), PollSettings::default());

        tokio::time::sleep(Duration::from_secs(1)).await;
        source.hang.store(true, Ordering::SeqCst);
        for _ in 0..5 {
            handle.refresh_visible();
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.call_count(), 2);

        // the scheduled poll at 10 is the only other fetch; it times out at 20
        // and the next one is due at 35
        tokio::time::sleep(Duration::from_secs(24)).await;
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn changed_wakes_up_on_new_snapshots() {
        let source = ScriptedSource::with_flags(vec![flag(keys::RSVP, true, t(0))]);
        let (mut handle, task) = FlagPoller::spawn(source, PollSettings::default());

        assert!(handle.changed().await);
        assert!(handle.is_enabled(keys::RSVP));

        task.abort();
        assert!(!handle.changed().await);
    }
}
