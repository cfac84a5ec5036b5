//! Lambert Conformal Conic projection.
//!
//! Maps a cone tangent or secant to the ellipsoid onto a flat plane. Common
//! for regional orthoimagery and national grids in mid latitudes.
//!
//! The projection parameters include:
//! - Latitude of origin (lat0): where northings are measured from
//! - Central meridian (lon0)
//! - Standard parallel(s): latin1 and latin2 (equal for a tangent cone)
//! - Scale factor on the standard parallel (1SP variant only)
//! - False easting / northing in meters

use std::f64::consts::{FRAC_PI_4, PI};

use preview_common::Ellipsoid;

use crate::mercator::conformal_latitude_inverse;

/// Lambert Conformal Conic projection parameters.
///
/// Converts between geographic (lon/lat in degrees) and projected
/// (x/y in meters) coordinates.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    /// Semi-major axis (meters)
    pub a: f64,
    /// First eccentricity
    pub e: f64,
    pub false_easting: f64,
    pub false_northing: f64,
    /// Cone constant (n)
    n: f64,
    /// a * F * k0
    af: f64,
    /// Rho at the latitude of origin
    rho0: f64,
}

impl LambertConformal {
    /// Create a projection from two standard parallels (EPSG method 9802).
    pub fn two_standard_parallels(
        ellipsoid: Ellipsoid,
        lat_origin_deg: f64,
        lon_origin_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        Self::build(
            ellipsoid,
            lat_origin_deg,
            lon_origin_deg,
            latin1_deg,
            latin2_deg,
            1.0,
            false_easting,
            false_northing,
        )
    }

    /// Create a projection from a single standard parallel at the natural
    /// origin with a scale factor (EPSG method 9801).
    pub fn one_standard_parallel(
        ellipsoid: Ellipsoid,
        lat_origin_deg: f64,
        lon_origin_deg: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        Self::build(
            ellipsoid,
            lat_origin_deg,
            lon_origin_deg,
            lat_origin_deg,
            lat_origin_deg,
            scale,
            false_easting,
            false_northing,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        ellipsoid: Ellipsoid,
        lat_origin_deg: f64,
        lon_origin_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let a = ellipsoid.semi_major_axis;
        let e = ellipsoid.eccentricity();

        let lat0 = lat_origin_deg.to_radians();
        let lon0 = lon_origin_deg.to_radians();
        let latin1 = latin1_deg.to_radians();
        let latin2 = latin2_deg.to_radians();

        let m1 = m_factor(latin1, e);
        let t1 = t_factor(latin1, e);

        // Compute cone constant n
        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            latin1.sin()
        } else {
            // Secant cone (two standard parallels)
            let m2 = m_factor(latin2, e);
            let t2 = t_factor(latin2, e);
            (m1.ln() - m2.ln()) / (t1.ln() - t2.ln())
        };

        let f = m1 / (n * t1.powf(n));
        let af = a * f * scale;
        let rho0 = af * t_factor(lat0, e).powf(n);

        Self {
            lon0,
            lat0,
            latin1,
            latin2,
            a,
            e,
            false_easting,
            false_northing,
            n,
            af,
            rho0,
        }
    }

    /// Convert geographic coordinates (lon/lat in degrees) to projected meters.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();

        // Normalize longitude difference to [-π, π]
        let mut dlon = lon - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let rho = self.af * t_factor(lat, self.e).powf(self.n);
        let theta = self.n * dlon;

        let x = rho * theta.sin();
        let y = self.rho0 - rho * theta.cos();

        (x + self.false_easting, y + self.false_northing)
    }

    /// Convert projected meters to geographic coordinates (lon/lat in degrees).
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let x = x - self.false_easting;
        let y = self.rho0 - (y - self.false_northing);

        let sign = self.n.signum();
        let rho = sign * (x * x + y * y).sqrt();
        let theta = (sign * x).atan2(sign * y);

        let lat = if rho == 0.0 {
            sign * std::f64::consts::FRAC_PI_2
        } else {
            let t = (rho / self.af).powf(1.0 / self.n);
            conformal_latitude_inverse(t, self.e)
        };
        let lon = theta / self.n + self.lon0;

        (lon.to_degrees(), lat.to_degrees())
    }
}

/// `m = cos(phi) / sqrt(1 - e² sin²(phi))`
fn m_factor(phi: f64, e: f64) -> f64 {
    let esin = e * phi.sin();
    phi.cos() / (1.0 - esin * esin).sqrt()
}

/// `t = tan(pi/4 - phi/2) / ((1 - e sin(phi)) / (1 + e sin(phi)))^(e/2)`
fn t_factor(phi: f64, e: f64) -> f64 {
    let esin = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - esin) / (1.0 + esin)).powf(e / 2.0)
}
