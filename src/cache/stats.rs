//! Cache statistics and health reporting.

use chrono::{DateTime, Utc};

/// Three-level health classification derived from total size against the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheHealth {
    /// Comfortably below the configured cap.
    Healthy,
    /// Approaching the cap (80% and above).
    Warning,
    /// At or above the cap; maintenance is overdue.
    Critical,
}

impl CacheHealth {
    /// Fraction of the cap at which health degrades from healthy to warning.
    pub const WARNING_FRACTION: f64 = 0.8;

    pub fn classify(total_size_mb: f64, max_size_mb: u64) -> Self {
        let cap = max_size_mb as f64;
        if total_size_mb >= cap {
            Self::Critical
        } else if total_size_mb >= cap * Self::WARNING_FRACTION {
            Self::Warning
        } else {
            Self::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for CacheHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Consistent snapshot of the cache's aggregate state.
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    pub total_items: usize,
    pub total_size_mb: f64,
    pub average_file_size_kb: f64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    /// Entries currently past their TTL (candidates for the next maintenance pass).
    pub expired_count: usize,
    /// Fraction of fetches that hit, since the cache was opened.
    pub hit_rate: f64,
    pub health: CacheHealth,
}

impl CacheStatistics {
    /// Human-readable total size: kilobytes below 1 MB, megabytes above.
    pub fn total_size_display(&self) -> String {
        if self.total_size_mb < 1.0 {
            format!("{:.0} KB", self.total_size_mb * 1024.0)
        } else {
            format!("{:.1} MB", self.total_size_mb)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_thresholds() {
        assert_eq!(CacheHealth::classify(10.0, 100), CacheHealth::Healthy);
        assert_eq!(CacheHealth::classify(79.9, 100), CacheHealth::Healthy);
        assert_eq!(CacheHealth::classify(80.0, 100), CacheHealth::Warning);
        assert_eq!(CacheHealth::classify(99.9, 100), CacheHealth::Warning);
        assert_eq!(CacheHealth::classify(100.0, 100), CacheHealth::Critical);
        assert_eq!(CacheHealth::classify(250.0, 100), CacheHealth::Critical);
    }

    #[test]
    fn size_display_switches_units() {
        let mut stats = CacheStatistics {
            total_items: 1,
            total_size_mb: 0.5,
            average_file_size_kb: 512.0,
            oldest: None,
            newest: None,
            expired_count: 0,
            hit_rate: 0.0,
            health: CacheHealth::Healthy,
        };
        assert_eq!(stats.total_size_display(), "512 KB");

        stats.total_size_mb = 2.25;
        assert_eq!(stats.total_size_display(), "2.2 MB");
    }
}
