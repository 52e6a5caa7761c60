use crate::config::HealthCheckConfig;
use dashmap::DashMap;
use futures::{stream, StreamExt};
use std::{collections::HashSet, sync::Arc, time::Instant};
use surge_common::resource::address::AddressModel;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info, warn};

pub(crate) mod eviction;
pub mod probe;

use probe::HealthProbe;

/// Health bookkeeping of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEntry {
    pub endpoint: AddressModel,
    pub health: bool,
    pub unhealthy_times: u32,
    /// `None` until the first probe finished.
    pub last_checked: Option<Instant>,
}

impl MonitorEntry {
    fn new(endpoint: AddressModel) -> Self {
        Self {
            endpoint,
            health: false,
            unhealthy_times: 0,
            last_checked: None,
        }
    }

    fn update(&mut self, healthy: bool) {
        if self.last_checked.is_some() && self.health != healthy {
            if healthy {
                info!("endpoint {} recovered", self.endpoint);
            } else {
                warn!("endpoint {} became unhealthy", self.endpoint);
            }
        }
        self.last_checked = Some(Instant::now());
        self.health = healthy;
        if healthy {
            self.unhealthy_times = 0;
        } else {
            self.unhealthy_times = self.unhealthy_times.saturating_add(1);
        }
    }
}

/// Probes registered endpoints out of band of the RPC path.
///
/// A single failed probe marks an endpoint unhealthy and a single successful
/// one marks it healthy again. The flag is advisory. Endpoints never probed
/// are checked on the spot by [`HealthMonitor::is_healthy`] and that result is
/// kept like a cycle result.
pub struct HealthMonitor {
    entries: DashMap<AddressModel, MonitorEntry>,
    probe: Arc<dyn HealthProbe>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(probe: Arc<dyn HealthProbe>, config: HealthCheckConfig) -> Self {
        Self {
            entries: DashMap::new(),
            probe,
            config,
        }
    }

    pub fn monitor(&self, address: &AddressModel) {
        if self.entries.contains_key(address) {
            return;
        }
        self.entries
            .entry(address.clone())
            .or_insert_with(|| MonitorEntry::new(address.clone()));
    }

    pub async fn is_healthy(&self, address: &AddressModel) -> bool {
        let known = self
            .entries
            .get(address)
            .map(|entry| entry.last_checked.map(|_| entry.health));
        if let Some(Some(health)) = known {
            return health;
        }
        let healthy = self.probe.probe(address, self.config.timeout()).await;
        debug!("first probe of {address} : {healthy}");
        if known.is_none() {
            self.entries
                .entry(address.clone())
                .or_insert_with(|| MonitorEntry::new(address.clone()))
                .update(healthy);
        } else if let Some(mut entry) = self.entries.get_mut(address) {
            entry.update(healthy);
        } else {
            debug!("{address} evicted while probing, result dropped");
        }
        healthy
    }

    /// Runs one probe cycle over every registered endpoint. At most
    /// `max_concurrent_probes` probes are in flight at a time.
    pub async fn check_all(&self) {
        let endpoints: Vec<AddressModel> =
            self.entries.iter().map(|entry| entry.key().clone()).collect();
        if endpoints.is_empty() {
            return;
        }
        let timeout = self.config.timeout();
        let results: Vec<(AddressModel, bool)> = stream::iter(endpoints)
            .map(|endpoint| {
                let probe = self.probe.clone();
                async move {
                    let healthy = probe.probe(&endpoint, timeout).await;
                    (endpoint, healthy)
                }
            })
            .buffer_unordered(self.config.max_concurrent_probes.max(1))
            .collect()
            .await;
        let mut unhealthy = 0;
        for (endpoint, healthy) in results {
            if !healthy {
                unhealthy += 1;
            }
            // entries evicted while the cycle ran stay evicted
            if let Some(mut entry) = self.entries.get_mut(&endpoint) {
                entry.update(healthy);
            }
        }
        debug!(
            "health check cycle done, {} endpoints, {} unhealthy",
            self.entries.len(),
            unhealthy
        );
    }

    /// Starts the periodic probe cycle. Abort the handle to stop it.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let monitor = self.clone();
        info!(
            "start health check, interval {:?}, timeout {:?}",
            monitor.config.interval(),
            monitor.config.timeout()
        );
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.config.interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                monitor.check_all().await;
            }
        })
    }

    pub fn entry(&self, address: &AddressModel) -> Option<MonitorEntry> {
        self.entries.get(address).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, address: &AddressModel) -> bool {
        self.entries.contains_key(address)
    }

    pub fn evict(&self, address: &AddressModel) -> bool {
        self.entries.remove(address).is_some()
    }

    /// Evicts the `stale` endpoints that are not part of `live`.
    pub fn evict_unreferenced(
        &self,
        stale: &[AddressModel],
        live: &HashSet<AddressModel>,
    ) -> usize {
        stale
            .iter()
            .filter(|address| !live.contains(*address))
            .filter(|address| self.evict(address))
            .count()
    }

    /// Keeps only the endpoints in `live`. Returns how many were dropped.
    pub fn retain(&self, live: &HashSet<AddressModel>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|address, _| live.contains(address));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn config(&self) -> &HealthCheckConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
        time::Duration,
    };
    use surge_common::BoxFuture;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct ScriptedProbe {
        healthy: AtomicBool,
        calls: AtomicUsize,
        in_flight: Arc<AtomicUsize>,
        max_in_flight: Arc<AtomicUsize>,
    }

    impl HealthProbe for ScriptedProbe {
        fn probe(&self, _address: &AddressModel, _timeout: Duration) -> BoxFuture<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let healthy = self.healthy.load(Ordering::SeqCst);
            let in_flight = self.in_flight.clone();
            let max_in_flight = self.max_in_flight.clone();
            Box::pin(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                healthy
            })
        }
    }

    /// Holds every probe until `release` is notified.
    #[derive(Default)]
    struct GateProbe {
        started: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl HealthProbe for GateProbe {
        fn probe(&self, _address: &AddressModel, _timeout: Duration) -> BoxFuture<bool> {
            let started = self.started.clone();
            let release = self.release.clone();
            Box::pin(async move {
                started.notify_one();
                release.notified().await;
                true
            })
        }
    }

    fn monitor_with(probe: Arc<ScriptedProbe>, max_concurrent_probes: usize) -> HealthMonitor {
        HealthMonitor::new(
            probe,
            HealthCheckConfig {
                max_concurrent_probes,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn monitor_is_idempotent() {
        let monitor = monitor_with(Arc::new(ScriptedProbe::default()), 4);
        let address = AddressModel::ip("10.0.0.1", 81);
        for _ in 0..5 {
            monitor.monitor(&address);
        }
        assert_eq!(monitor.len(), 1);
        assert_eq!(monitor.entry(&address).unwrap().last_checked, None);
    }

    #[tokio::test]
    async fn unknown_endpoint_is_probed_once_on_demand() {
        let probe = Arc::new(ScriptedProbe::default());
        probe.healthy.store(true, Ordering::SeqCst);
        let monitor = monitor_with(probe.clone(), 4);
        let address = AddressModel::ip("10.0.0.1", 81);

        assert!(monitor.is_healthy(&address).await);
        assert!(monitor.is_healthy(&address).await);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
        let entry = monitor.entry(&address).unwrap();
        assert!(entry.health);
        assert!(entry.last_checked.is_some());
    }

    #[tokio::test]
    async fn health_transition_follows_last_probe() {
        let probe = Arc::new(ScriptedProbe::default());
        let monitor = monitor_with(probe.clone(), 4);
        let address = AddressModel::ip("10.0.0.1", 81);
        monitor.monitor(&address);

        probe.healthy.store(false, Ordering::SeqCst);
        monitor.check_all().await;
        assert!(!monitor.is_healthy(&address).await);
        assert_eq!(monitor.entry(&address).unwrap().unhealthy_times, 1);

        monitor.check_all().await;
        assert_eq!(monitor.entry(&address).unwrap().unhealthy_times, 2);

        probe.healthy.store(true, Ordering::SeqCst);
        monitor.check_all().await;
        assert!(monitor.is_healthy(&address).await);
        assert_eq!(monitor.entry(&address).unwrap().unhealthy_times, 0);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn cycle_probes_concurrently_up_to_limit() {
        for limit in [1, 4] {
            let probe = Arc::new(ScriptedProbe::default());
            let monitor = monitor_with(probe.clone(), limit);
            for port in 0..8 {
                monitor.monitor(&AddressModel::ip("10.0.0.1", 8000 + port));
            }
            monitor.check_all().await;
            assert_eq!(probe.calls.load(Ordering::SeqCst), 8);
            assert_eq!(probe.max_in_flight.load(Ordering::SeqCst), limit);
        }
    }

    #[tokio::test]
    async fn evict_unreferenced_keeps_live_endpoints() {
        let monitor = monitor_with(Arc::new(ScriptedProbe::default()), 4);
        let a = AddressModel::ip("10.0.0.1", 81);
        let b = AddressModel::ip("10.0.0.2", 81);
        monitor.monitor(&a);
        monitor.monitor(&b);
        let live: HashSet<AddressModel> = [b.clone()].into_iter().collect();
        assert_eq!(monitor.evict_unreferenced(&[a.clone(), b.clone()], &live), 1);
        assert!(!monitor.contains(&a));
        assert!(monitor.contains(&b));
    }

    #[tokio::test]
    async fn retain_drops_endpoints_outside_live_set() {
        let monitor = monitor_with(Arc::new(ScriptedProbe::default()), 4);
        let a = AddressModel::ip("10.0.0.1", 81);
        let b = AddressModel::ip("10.0.0.2", 81);
        let c = AddressModel::ip("10.0.0.3", 81);
        for address in [&a, &b, &c] {
            monitor.monitor(address);
        }
        let live: HashSet<AddressModel> = [a.clone(), c.clone()].into_iter().collect();
        assert_eq!(monitor.retain(&live), 1);
        assert_eq!(monitor.len(), 2);
        assert!(!monitor.contains(&b));
        assert_eq!(monitor.retain(&live), 0);
    }

    #[tokio::test]
    async fn endpoint_evicted_during_check_stays_evicted() {
        let probe = Arc::new(GateProbe::default());
        let monitor = HealthMonitor::new(probe.clone(), HealthCheckConfig::default());
        let address = AddressModel::ip("10.0.0.1", 81);
        monitor.monitor(&address);

        let evict = async {
            probe.started.notified().await;
            assert!(monitor.evict(&address));
            probe.release.notify_one();
        };
        let (healthy, _) = tokio::join!(monitor.is_healthy(&address), evict);
        assert!(healthy);
        assert!(!monitor.contains(&address));

        // an endpoint never registered is still recorded on demand
        let other = AddressModel::ip("10.0.0.2", 81);
        probe.release.notify_one();
        assert!(monitor.is_healthy(&other).await);
        assert!(monitor.entry(&other).unwrap().health);
    }

    #[tokio::test]
    async fn spawned_cycle_updates_entries() {
        let probe = Arc::new(ScriptedProbe::default());
        probe.healthy.store(true, Ordering::SeqCst);
        let monitor = Arc::new(HealthMonitor::new(
            probe.clone(),
            HealthCheckConfig {
                interval_ms: 20,
                ..Default::default()
            },
        ));
        let address = AddressModel::ip("10.0.0.1", 81);
        monitor.monitor(&address);
        let handle = monitor.spawn();
        for _ in 0..100 {
            if monitor.entry(&address).and_then(|e| e.last_checked).is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert!(monitor.entry(&address).unwrap().health);
    }
}
