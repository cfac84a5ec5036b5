//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// EPSG code of the reference CRS every bounds output is expressed in.
pub const REFERENCE_EPSG: u32 = 4326;

/// Geographic CRS codes treated as interchangeable with WGS84.
///
/// Datum shifts between these are well below preview resolution.
const WGS84_COMPATIBLE_GEOGRAPHIC: &[u32] = &[4326, 4269, 4258, 4283, 4617];

/// Reference ellipsoid.
///
/// An `inverse_flattening` of zero denotes a sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ellipsoid {
    pub semi_major_axis: f64,
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        inverse_flattening: 298.257_223_563,
    };

    pub const GRS80: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        inverse_flattening: 298.257_222_101,
    };

    pub const AIRY_1830: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_377_563.396,
        inverse_flattening: 299.324_964_6,
    };

    pub const BESSEL_1841: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_377_397.155,
        inverse_flattening: 299.152_812_8,
    };

    /// Sphere with the given radius.
    pub fn sphere(radius: f64) -> Self {
        Self {
            semi_major_axis: radius,
            inverse_flattening: 0.0,
        }
    }

    /// First eccentricity squared.
    pub fn eccentricity_squared(&self) -> f64 {
        if self.inverse_flattening == 0.0 {
            return 0.0;
        }
        let f = 1.0 / self.inverse_flattening;
        2.0 * f - f * f
    }

    /// First eccentricity.
    pub fn eccentricity(&self) -> f64 {
        self.eccentricity_squared().sqrt()
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// A projection described by its parameters rather than an EPSG code.
///
/// Angles are in degrees, distances in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CustomProjection {
    TransverseMercator {
        ellipsoid: Ellipsoid,
        lat_origin: f64,
        lon_origin: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    },
    Mercator {
        ellipsoid: Ellipsoid,
        lon_origin: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    },
    /// Lambert Conformal Conic. The one-standard-parallel variant sets both
    /// parallels to `lat_origin` and carries its scale factor in `scale`.
    LambertConformal {
        ellipsoid: Ellipsoid,
        lat_origin: f64,
        lon_origin: f64,
        standard_parallel_1: f64,
        standard_parallel_2: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    },
}

impl CustomProjection {
    pub fn name(&self) -> &'static str {
        match self {
            CustomProjection::TransverseMercator { .. } => "Transverse Mercator",
            CustomProjection::Mercator { .. } => "Mercator",
            CustomProjection::LambertConformal { .. } => "Lambert Conformal Conic",
        }
    }
}

/// Coordinate reference system of a raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Crs {
    /// A CRS identified by its EPSG code.
    Epsg(u32),
    /// A user-defined projected CRS.
    Custom(CustomProjection),
}

impl Crs {
    /// The reference CRS (EPSG:4326).
    pub fn reference() -> Self {
        Crs::Epsg(REFERENCE_EPSG)
    }

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326"
    /// - "epsg:32633"
    /// - "CRS:84" (equivalent to EPSG:4326 with lon/lat axis order)
    pub fn from_string(s: &str) -> Result<Self, CrsParseError> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84" || normalized == "OGC:CRS84" {
            return Ok(Crs::Epsg(REFERENCE_EPSG));
        }

        let code = normalized
            .strip_prefix("EPSG:")
            .ok_or_else(|| CrsParseError::InvalidFormat(s.to_string()))?;

        code.parse::<u32>()
            .map(Crs::Epsg)
            .map_err(|_| CrsParseError::InvalidCode(s.to_string()))
    }

    /// True for EPSG:4326 itself.
    pub fn is_reference(&self) -> bool {
        matches!(self, Crs::Epsg(REFERENCE_EPSG))
    }

    /// Check if this is a geographic (lat/lon) CRS compatible with WGS84.
    pub fn is_geographic(&self) -> bool {
        match self {
            Crs::Epsg(code) => WGS84_COMPATIBLE_GEOGRAPHIC.contains(code),
            Crs::Custom(_) => false,
        }
    }

    pub fn epsg_code(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Custom(_) => None,
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Custom(projection) => write!(f, "user-defined {}", projection.name()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Invalid CRS format: {0}. Expected 'EPSG:<code>'")]
    InvalidFormat(String),

    #[error("Invalid EPSG code: {0}")]
    InvalidCode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(Crs::from_string("EPSG:4326").unwrap(), Crs::Epsg(4326));
        assert_eq!(Crs::from_string("epsg:32633").unwrap(), Crs::Epsg(32633));
        assert_eq!(Crs::from_string("CRS:84").unwrap(), Crs::Epsg(4326));
        assert!(matches!(
            Crs::from_string("4326"),
            Err(CrsParseError::InvalidFormat(_))
        ));
        assert!(matches!(
            Crs::from_string("EPSG:abc"),
            Err(CrsParseError::InvalidCode(_))
        ));
    }

    #[test]
    fn test_reference_and_geographic() {
        assert!(Crs::reference().is_reference());
        assert!(Crs::Epsg(4269).is_geographic());
        assert!(!Crs::Epsg(4269).is_reference());
        assert!(!Crs::Epsg(3857).is_geographic());
    }

    #[test]
    fn test_ellipsoid_eccentricity() {
        let e2 = Ellipsoid::WGS84.eccentricity_squared();
        assert!((e2 - 0.006_694_379_990_14).abs() < 1e-12);
        assert_eq!(Ellipsoid::sphere(6_371_000.0).eccentricity_squared(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(Crs::Epsg(32633).to_string(), "EPSG:32633");
    }
}
