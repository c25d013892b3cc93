mod climate;
mod error;
mod geo;
mod trips;
mod types;

pub use error::UrbanMetricsError;

pub use geo::distance::haversine_km;
pub use geo::gcj02::{gcj02_to_wgs84, out_of_china};

pub use types::config::{EngineConfig, HexbinConfig};
pub use types::lat_lon::LatLon;
pub use types::order::{EnrichedTripRecord, RawOrderRecord};

pub use trips::engine::{congestion_score, enrich_orders};
pub use trips::error::OrderDataError;
pub use trips::frame::*;
pub use trips::heatmap::{heat_points, map_center, HeatPoint, HeatmapLayer};
pub use trips::hexbin::{hexbin, HexCell};
pub use trips::time_slices::{time_slices, TimeSlice};

pub use climate::error::ClimateDataError;
pub use climate::loader::*;
pub use climate::processing::{top_countries, ClimateFrameExt, RankMetric, DEFAULT_BASELINE};
