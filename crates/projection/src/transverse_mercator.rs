//! Transverse Mercator projection (and UTM).
//!
//! Uses the series expansions from Snyder, "Map Projections: A Working
//! Manual" (USGS PP 1395), which are accurate to well under a meter within a
//! UTM zone. UTM is Transverse Mercator with:
//! - Central meridian: -183° + 6° × zone
//! - Scale factor: 0.9996
//! - False easting: 500 000 m
//! - False northing: 0 m (north) or 10 000 000 m (south)

use preview_common::Ellipsoid;

const UTM_SCALE: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Transverse Mercator projection parameters.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Semi-major axis (meters)
    a: f64,
    /// First eccentricity squared
    e2: f64,
    /// Second eccentricity squared
    ep2: f64,
    /// Latitude of origin in radians
    lat0: f64,
    /// Central meridian in radians
    lon0: f64,
    /// Scale factor on the central meridian
    k0: f64,
    false_easting: f64,
    false_northing: f64,
    /// Meridional arc length at the latitude of origin
    m0: f64,
}

impl TransverseMercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        lat_origin_deg: f64,
        lon_origin_deg: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let a = ellipsoid.semi_major_axis;
        let e2 = ellipsoid.eccentricity_squared();
        let ep2 = e2 / (1.0 - e2);
        let lat0 = lat_origin_deg.to_radians();

        Self {
            a,
            e2,
            ep2,
            lat0,
            lon0: lon_origin_deg.to_radians(),
            k0: scale,
            false_easting,
            false_northing,
            m0: meridional_arc(a, e2, lat0),
        }
    }

    /// UTM zone projection on the given ellipsoid.
    pub fn utm(zone: u32, north: bool, ellipsoid: Ellipsoid) -> Self {
        let central_meridian = -183.0 + 6.0 * zone as f64;
        let false_northing = if north { 0.0 } else { UTM_FALSE_NORTHING_SOUTH };
        Self::new(
            ellipsoid,
            0.0,
            central_meridian,
            UTM_SCALE,
            UTM_FALSE_EASTING,
            false_northing,
        )
    }

    /// Convert (lon, lat) in degrees to projected meters.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = self.a / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = self.ep2 * cos_phi * cos_phi;
        let a = (lon.to_radians() - self.lon0) * cos_phi;
        let m = meridional_arc(self.a, self.e2, phi);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let x = self.k0
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * self.ep2) * a5 / 120.0);

        let y = self.k0
            * (m - self.m0
                + n * tan_phi
                    * (a2 / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * self.ep2) * a6
                            / 720.0));

        (x + self.false_easting, y + self.false_northing)
    }

    /// Convert projected meters to (lon, lat) in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let x = x - self.false_easting;
        let y = y - self.false_northing;

        let m = self.m0 + y / self.k0;
        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let sqrt_1_e2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;

        // Footpoint latitude
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let c1 = self.ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = self.a / denom.sqrt();
        let r1 = self.a * (1.0 - e2) / denom.powf(1.5);
        let d = x / (n1 * self.k0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * self.ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * self.ep2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let lon = self.lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * self.ep2 + 24.0 * t1 * t1)
                    * d5
                    / 120.0)
                / cos_phi1;

        (lon.to_degrees(), phi.to_degrees())
    }
}

/// Distance along the meridian from the equator to latitude `phi` (radians).
fn meridional_arc(a: f64, e2: f64, phi: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_central_meridian_on_equator() {
        let utm33n = TransverseMercator::utm(33, true, Ellipsoid::WGS84);
        let (lon, lat) = utm33n.inverse(500_000.0, 0.0);
        assert!((lon - 15.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn test_utm_south_false_northing() {
        let utm33s = TransverseMercator::utm(33, false, Ellipsoid::WGS84);
        let (lon, lat) = utm33s.inverse(500_000.0, 10_000_000.0);
        assert!((lon - 15.0).abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn test_utm_roundtrip_off_meridian() {
        let utm = TransverseMercator::utm(32, true, Ellipsoid::WGS84);
        let (x, y) = utm.forward(10.75, 59.91);
        let (lon, lat) = utm.inverse(x, y);
        assert!((lon - 10.75).abs() < 1e-7, "lon {}", lon);
        assert!((lat - 59.91).abs() < 1e-7, "lat {}", lat);
    }

    #[test]
    fn test_one_degree_of_latitude_near_equator() {
        // One degree of latitude along the central meridian is ~110.57 km,
        // scaled by 0.9996.
        let utm = TransverseMercator::utm(31, true, Ellipsoid::WGS84);
        let (_, y) = utm.forward(3.0, 1.0);
        assert!((y - 110_574.0 * 0.9996).abs() < 5.0, "y {}", y);
    }
}
