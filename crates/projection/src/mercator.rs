//! Mercator projections.
//!
//! - [`WebMercator`]: the spherical "Pseudo-Mercator" used by web maps
//!   (EPSG:3857). The WGS84 semi-major axis is used as the sphere radius.
//! - [`Mercator`]: the ellipsoidal variant found in user-defined GeoTIFFs.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use preview_common::Ellipsoid;

/// Half the circumference of the Web Mercator sphere in meters.
pub const WEB_MERCATOR_HALF_EXTENT: f64 = 20_037_508.342_789_244;

const WEB_MERCATOR_RADIUS: f64 = 6_378_137.0;

/// Spherical Web Mercator (EPSG:3857).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// Convert meters to (lon, lat) in degrees.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = (x / WEB_MERCATOR_RADIUS).to_degrees();
        let lat = (2.0 * (y / WEB_MERCATOR_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
        (lon, lat)
    }

    /// Convert (lon, lat) in degrees to meters.
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = WEB_MERCATOR_RADIUS * lon.to_radians();
        let y = WEB_MERCATOR_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }
}

/// Ellipsoidal Mercator (variant A, scale factor at the equator).
#[derive(Debug, Clone)]
pub struct Mercator {
    ellipsoid: Ellipsoid,
    /// Central meridian in radians
    lon0: f64,
    scale: f64,
    false_easting: f64,
    false_northing: f64,
}

impl Mercator {
    pub fn new(
        ellipsoid: Ellipsoid,
        lon_origin_deg: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        Self {
            ellipsoid,
            lon0: lon_origin_deg.to_radians(),
            scale,
            false_easting,
            false_northing,
        }
    }

    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let a = self.ellipsoid.semi_major_axis;
        let e = self.ellipsoid.eccentricity();
        let phi = lat.to_radians();
        let esin = e * phi.sin();

        let x = a * self.scale * (lon.to_radians() - self.lon0);
        let y = a
            * self.scale
            * ((FRAC_PI_4 + phi / 2.0).tan() * ((1.0 - esin) / (1.0 + esin)).powf(e / 2.0)).ln();

        (x + self.false_easting, y + self.false_northing)
    }

    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let a = self.ellipsoid.semi_major_axis;
        let e = self.ellipsoid.eccentricity();
        let x = x - self.false_easting;
        let y = y - self.false_northing;

        let t = (-y / (a * self.scale)).exp();
        let phi = conformal_latitude_inverse(t, e);
        let lon = x / (a * self.scale) + self.lon0;

        (lon.to_degrees(), phi.to_degrees())
    }
}

/// Solve `t = tan(pi/4 - phi/2) / ((1 - e sin phi) / (1 + e sin phi))^(e/2)` for phi.
///
/// Shared by the Mercator and Lambert Conformal Conic inverses.
pub(crate) fn conformal_latitude_inverse(t: f64, e: f64) -> f64 {
    let mut phi = FRAC_PI_2 - 2.0 * t.atan();
    for _ in 0..15 {
        let esin = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - esin) / (1.0 + esin)).powf(e / 2.0)).atan();
        if (next - phi).abs() < 1e-12 {
            return next;
        }
        phi = next;
    }
    phi
}
