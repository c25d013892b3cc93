//! Conversion from the GCJ-02 ("Mars") datum used by maps of mainland China back to WGS-84.
//!
//! GCJ-02 shifts true coordinates by a location-dependent offset. The offset model below is the
//! widely published reverse-engineered one; its constants are an external contract and must stay
//! exactly as they are to reproduce the output of other implementations.

use std::f64::consts::PI;

/// Semi-major axis of the Krasovsky 1940 ellipsoid, in meters.
const SEMI_MAJOR_AXIS: f64 = 6378245.0;
/// First eccentricity squared of the Krasovsky 1940 ellipsoid.
const ECCENTRICITY_SQ: f64 = 0.00669342162296594323;

/// Bounding box inside which the GCJ-02 offset is applied, as open intervals.
const CHINA_LNG_RANGE: (f64, f64) = (73.66, 135.05);
const CHINA_LAT_RANGE: (f64, f64) = (3.86, 53.55);

/// Returns `true` when the point lies outside the rough mainland China bounding box.
///
/// This is a rectangle, not the actual border: points in neighbouring countries that fall inside
/// the box (parts of Mongolia, Korea, Vietnam, ...) are still treated as offset, and points in the
/// far corners of China's territory may be left alone. Kept deliberately loose to stay compatible
/// with other GCJ-02 tooling.
pub fn out_of_china(lng: f64, lat: f64) -> bool {
    !(CHINA_LNG_RANGE.0 < lng
        && lng < CHINA_LNG_RANGE.1
        && CHINA_LAT_RANGE.0 < lat
        && lat < CHINA_LAT_RANGE.1)
}

fn transform_lat(x: f64, y: f64) -> f64 {
    let mut ret = -100.0 + 2.0 * x + 3.0 * y + 0.2 * y * y + 0.1 * x * y + 0.2 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (y * PI).sin() + 40.0 * (y / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (160.0 * (y / 12.0 * PI).sin() + 320.0 * (y * PI / 30.0).sin()) * 2.0 / 3.0;
    ret
}

fn transform_lng(x: f64, y: f64) -> f64 {
    let mut ret = 300.0 + x + 2.0 * y + 0.1 * x * x + 0.1 * x * y + 0.1 * x.abs().sqrt();
    ret += (20.0 * (6.0 * x * PI).sin() + 20.0 * (2.0 * x * PI).sin()) * 2.0 / 3.0;
    ret += (20.0 * (x * PI).sin() + 40.0 * (x / 3.0 * PI).sin()) * 2.0 / 3.0;
    ret += (150.0 * (x / 12.0 * PI).sin() + 300.0 * (x / 30.0 * PI).sin()) * 2.0 / 3.0;
    ret
}

/// Converts a GCJ-02 `(lng, lat)` pair in degrees to WGS-84.
///
/// Points outside the China bounding box (see [`out_of_china`]) are returned unchanged.
/// The conversion subtracts the forward offset evaluated at the GCJ-02 point, so it is an
/// approximation with meter-level residual error, not an exact inverse.
///
/// # Examples
///
/// ```
/// use urban_metrics::gcj02_to_wgs84;
///
/// // Outside China: untouched.
/// assert_eq!(gcj02_to_wgs84(10.0, 50.0), (10.0, 50.0));
///
/// // Inside China the offset is a few hundred meters at most.
/// let (lng, lat) = gcj02_to_wgs84(113.0, 22.0);
/// assert!((lng - 113.0).abs() < 0.01 && (lat - 22.0).abs() < 0.01);
/// ```
pub fn gcj02_to_wgs84(lng: f64, lat: f64) -> (f64, f64) {
    if out_of_china(lng, lat) {
        return (lng, lat);
    }
    let d_lat = transform_lat(lng - 105.0, lat - 35.0);
    let d_lng = transform_lng(lng - 105.0, lat - 35.0);

    let rad_lat = lat / 180.0 * PI;
    let magic = 1.0 - ECCENTRICITY_SQ * rad_lat.sin() * rad_lat.sin();
    let sqrt_magic = magic.sqrt();

    let d_lat =
        (d_lat * 180.0) / ((SEMI_MAJOR_AXIS * (1.0 - ECCENTRICITY_SQ)) / (magic * sqrt_magic) * PI);
    let d_lng = (d_lng * 180.0) / (SEMI_MAJOR_AXIS / sqrt_magic * rad_lat.cos() * PI);

    (lng - d_lng, lat - d_lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_bbox_is_returned_unchanged() {
        let points = [
            (10.0, 50.0),
            (-74.006, 40.7128),
            (151.2093, -33.8688),
            // On the open boundary.
            (73.66, 30.0),
            (100.0, 53.55),
            (0.0, 0.0),
        ];
        for (lng, lat) in points {
            assert!(
                out_of_china(lng, lat),
                "({lng}, {lat}) should be out of China"
            );
            assert_eq!(gcj02_to_wgs84(lng, lat), (lng, lat));
        }
    }

    #[test]
    fn test_inside_bbox_is_shifted() {
        let (lng, lat) = (116.404, 39.915); // Beijing, Tiananmen
        assert!(!out_of_china(lng, lat));
        let (wgs_lng, wgs_lat) = gcj02_to_wgs84(lng, lat);
        assert_ne!((wgs_lng, wgs_lat), (lng, lat));
        // GCJ-02 drifts north-east of WGS-84 around Beijing by a few hundred meters.
        assert!(wgs_lng < lng && lng - wgs_lng < 0.01);
        assert!(wgs_lat < lat && lat - wgs_lat < 0.01);
    }

    #[test]
    fn test_matches_reference_output() {
        // Reference values from the common Python/JS implementations of the same model.
        let (lng, lat) = gcj02_to_wgs84(116.404, 39.915);
        assert!((lng - 116.397_755).abs() < 1e-5, "lng = {lng}");
        assert!((lat - 39.913_596).abs() < 1e-5, "lat = {lat}");
    }

    #[test]
    fn test_conversion_is_deterministic() {
        let a = gcj02_to_wgs84(104.066, 30.657);
        let b = gcj02_to_wgs84(104.066, 30.657);
        assert_eq!(a.0.to_bits(), b.0.to_bits());
        assert_eq!(a.1.to_bits(), b.1.to_bits());
    }
}
