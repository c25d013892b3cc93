//! Explicit configuration values passed into the pipeline and the renderer feeds.

use bon::Builder;
use chrono::TimeDelta;
use chrono_tz::Tz;

/// Settings for [`crate::enrich_orders`] and [`crate::time_slices`].
///
/// # Examples
///
/// ```
/// use urban_metrics::EngineConfig;
/// use chrono::TimeDelta;
///
/// // Coordinates already in WGS-84, 15-minute buckets.
/// let config = EngineConfig::builder()
///     .assume_gcj02(false)
///     .granularity(TimeDelta::minutes(15))
///     .build();
/// assert!(!config.assume_gcj02);
/// assert_eq!(config.min_samples, 25);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct EngineConfig {
    /// Treat input coordinates as GCJ-02 and convert them to WGS-84. Defaults to `true`.
    #[builder(default = true)]
    pub assume_gcj02: bool,
    /// Time buckets with fewer trips than this are suppressed. Defaults to `25`.
    #[builder(default = 25)]
    pub min_samples: usize,
    /// Width of a time bucket. Defaults to one hour.
    #[builder(default = TimeDelta::hours(1))]
    pub granularity: TimeDelta,
    /// Local timezone the buckets are aligned to. Defaults to `Asia/Shanghai`.
    #[builder(default = Tz::Asia__Shanghai)]
    pub timezone: Tz,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Settings for [`crate::hexbin`].
#[derive(Debug, Clone, Copy, Builder)]
pub struct HexbinConfig {
    /// Number of hexagons across the x (longitude) direction. Defaults to `40`.
    #[builder(default = 40)]
    pub gridsize: usize,
    /// Cells with fewer points than this are dropped. Defaults to `5`.
    #[builder(default = 5)]
    pub min_count: usize,
}

impl Default for HexbinConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
