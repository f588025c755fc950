//! Advertisement metrics
//!
//! `AdMetrics` owns a Prometheus registry; the caller constructs it and
//! passes it to the commands that feed it, so no recorder is global.
//! Counters only grow; the gauges hold the last statistics snapshot taken by
//! `ad_stats`. Serving `render` output is the caller's concern.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use serde::Serialize;

use adplace_core::AdStats;

pub struct AdMetrics {
    registry: Registry,
    created_total: IntCounter,
    deactivated_total: IntCounter,
    active: IntGauge,
    inactive: IntGauge,
    expired: IntGauge,
}

/// Point-in-time copy of every metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub created_total: u64,
    pub deactivated_total: u64,
    pub active: i64,
    pub inactive: i64,
    pub expired: i64,
}

fn counter(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntCounter> {
    let counter = IntCounter::new(name, help)?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

fn gauge(registry: &Registry, name: &str, help: &str) -> prometheus::Result<IntGauge> {
    let gauge = IntGauge::new(name, help)?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn clamp_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl AdMetrics {
    /// Register the ad counters and gauges in a fresh registry
    ///
    /// # Errors
    ///
    /// Propagates prometheus descriptor or registration failures.
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        Ok(Self {
            created_total: counter(
                &registry,
                "adplace_ads_created_total",
                "Total number of ads created",
            )?,
            deactivated_total: counter(
                &registry,
                "adplace_ads_deactivated_total",
                "Total number of ads deactivated",
            )?,
            active: gauge(
                &registry,
                "adplace_ads_active_current",
                "Current number of active ads",
            )?,
            inactive: gauge(
                &registry,
                "adplace_ads_inactive_current",
                "Current number of inactive ads",
            )?,
            expired: gauge(
                &registry,
                "adplace_ads_expired_current",
                "Current number of expired ads",
            )?,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_created(&self) {
        self.created_total.inc();
    }

    pub fn record_deactivated(&self) {
        self.deactivated_total.inc();
    }

    /// Replace the gauges with freshly computed statistics
    pub fn observe(&self, stats: &AdStats) {
        self.active.set(clamp_count(stats.active));
        self.inactive.set(clamp_count(stats.inactive));
        self.expired.set(clamp_count(stats.expired));
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            created_total: self.created_total.get(),
            deactivated_total: self.deactivated_total.get(),
            active: self.active.get(),
            inactive: self.inactive.get(),
            expired: self.expired.get(),
        }
    }

    /// Prometheus text exposition of every registered metric
    ///
    /// # Errors
    ///
    /// Fails when the encoder rejects a metric family.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = AdMetrics::new().unwrap();
        metrics.record_created();
        metrics.record_created();
        metrics.record_deactivated();

        let snap = metrics.snapshot();
        assert_eq!(snap.created_total, 2);
        assert_eq!(snap.deactivated_total, 1);
    }

    #[test]
    fn test_observe_overwrites_gauges() {
        let metrics = AdMetrics::new().unwrap();
        metrics.observe(&AdStats {
            total: 5,
            active: 3,
            inactive: 2,
            expired: 1,
        });
        metrics.observe(&AdStats {
            total: 1,
            active: 1,
            inactive: 0,
            expired: 0,
        });

        let snap = metrics.snapshot();
        assert_eq!((snap.active, snap.inactive, snap.expired), (1, 0, 0));
    }

    #[test]
    fn test_instances_do_not_share_values() {
        let a = AdMetrics::new().unwrap();
        let b = AdMetrics::new().unwrap();
        a.record_created();

        assert_eq!(a.snapshot().created_total, 1);
        assert_eq!(b.snapshot().created_total, 0);
    }

    #[test]
    fn test_render_exposes_registered_metrics() {
        let metrics = AdMetrics::new().unwrap();
        metrics.record_created();
        metrics.observe(&AdStats {
            total: 2,
            active: 2,
            inactive: 0,
            expired: 0,
        });

        let text = metrics.render().unwrap();
        assert!(text.contains("adplace_ads_created_total 1"));
        assert!(text.contains("adplace_ads_active_current 2"));
        assert!(text.contains("# HELP adplace_ads_expired_current"));
        assert_eq!(metrics.registry().gather().len(), 5);
    }

    #[test]
    fn test_shared_across_threads() {
        let metrics = std::sync::Arc::new(AdMetrics::new().unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record_created();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().created_total, 400);
    }
}
