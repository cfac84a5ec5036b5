//! CRS → geographic transforms and bounds reprojection.

use preview_common::{BoundingBox, Crs, CustomProjection, Ellipsoid};
use tracing::debug;

use crate::error::{ProjectionError, ProjectionResult};
use crate::lambert::LambertConformal;
use crate::mercator::{Mercator, WebMercator};
use crate::transverse_mercator::TransverseMercator;

/// Points added along each bounding box edge before transforming.
///
/// Projected edges are curves in geographic space; sampling them keeps the
/// envelope from cutting off bulges between corners.
pub const DEFAULT_DENSIFY_PTS: usize = 21;

/// A projection from some source CRS to geographic lon/lat (degrees).
#[derive(Debug, Clone)]
pub enum Projection {
    /// Source is already geographic.
    Identity,
    WebMercator(WebMercator),
    Mercator(Mercator),
    TransverseMercator(TransverseMercator),
    LambertConformal(LambertConformal),
}

impl Projection {
    /// Resolve the projection for a source CRS.
    pub fn from_crs(crs: &Crs) -> ProjectionResult<Self> {
        match crs {
            Crs::Epsg(code) => Self::from_epsg(*code),
            Crs::Custom(custom) => Self::from_custom(custom),
        }
    }

    fn from_epsg(code: u32) -> ProjectionResult<Self> {
        if Crs::Epsg(code).is_geographic() {
            return Ok(Projection::Identity);
        }

        match code {
            3857 | 900913 => Ok(Projection::WebMercator(WebMercator)),
            // WGS84 / UTM north and south
            32601..=32660 => Ok(Projection::TransverseMercator(TransverseMercator::utm(
                code - 32600,
                true,
                Ellipsoid::WGS84,
            ))),
            32701..=32760 => Ok(Projection::TransverseMercator(TransverseMercator::utm(
                code - 32700,
                false,
                Ellipsoid::WGS84,
            ))),
            // NAD83 / UTM zones 1N-23N
            26901..=26923 => Ok(Projection::TransverseMercator(TransverseMercator::utm(
                code - 26900,
                true,
                Ellipsoid::GRS80,
            ))),
            // ETRS89 / UTM zones 28N-38N
            25828..=25838 => Ok(Projection::TransverseMercator(TransverseMercator::utm(
                code - 25800,
                true,
                Ellipsoid::GRS80,
            ))),
            _ => national_grid(code)
                .ok_or_else(|| ProjectionError::UnsupportedCrs(format!("EPSG:{}", code))),
        }
    }

    fn from_custom(custom: &CustomProjection) -> ProjectionResult<Self> {
        let projection = match *custom {
            CustomProjection::TransverseMercator {
                ellipsoid,
                lat_origin,
                lon_origin,
                scale,
                false_easting,
                false_northing,
            } => {
                check_ellipsoid(&ellipsoid)?;
                check_scale(scale)?;
                Projection::TransverseMercator(TransverseMercator::new(
                    ellipsoid,
                    lat_origin,
                    lon_origin,
                    scale,
                    false_easting,
                    false_northing,
                ))
            }
            CustomProjection::Mercator {
                ellipsoid,
                lon_origin,
                scale,
                false_easting,
                false_northing,
            } => {
                check_ellipsoid(&ellipsoid)?;
                check_scale(scale)?;
                Projection::Mercator(Mercator::new(
                    ellipsoid,
                    lon_origin,
                    scale,
                    false_easting,
                    false_northing,
                ))
            }
            CustomProjection::LambertConformal {
                ellipsoid,
                lat_origin,
                lon_origin,
                standard_parallel_1,
                standard_parallel_2,
                scale,
                false_easting,
                false_northing,
            } => {
                check_ellipsoid(&ellipsoid)?;
                check_scale(scale)?;
                if standard_parallel_1.abs() >= 90.0 || standard_parallel_2.abs() >= 90.0 {
                    return Err(ProjectionError::InvalidParameters(
                        "standard parallels must lie strictly between the poles".to_string(),
                    ));
                }
                let lambert = if (standard_parallel_1 - standard_parallel_2).abs() < 1e-10 {
                    if standard_parallel_1 == 0.0 {
                        return Err(ProjectionError::InvalidParameters(
                            "a tangent cone cannot touch the equator".to_string(),
                        ));
                    }
                    LambertConformal::one_standard_parallel(
                        ellipsoid,
                        lat_origin,
                        lon_origin,
                        scale,
                        false_easting,
                        false_northing,
                    )
                } else {
                    LambertConformal::two_standard_parallels(
                        ellipsoid,
                        lat_origin,
                        lon_origin,
                        standard_parallel_1,
                        standard_parallel_2,
                        false_easting,
                        false_northing,
                    )
                };
                Projection::LambertConformal(lambert)
            }
        };

        Ok(projection)
    }

    /// Convert a source coordinate to (lon, lat) in degrees.
    pub fn to_geographic(&self, x: f64, y: f64) -> ProjectionResult<(f64, f64)> {
        let (lon, lat) = match self {
            Projection::Identity => (x, y),
            Projection::WebMercator(p) => p.inverse(x, y),
            Projection::Mercator(p) => p.inverse(x, y),
            Projection::TransverseMercator(p) => p.inverse(x, y),
            Projection::LambertConformal(p) => p.inverse(x, y),
        };

        if lon.is_finite() && lat.is_finite() {
            Ok((lon, lat))
        } else {
            Err(ProjectionError::NonFinite { x, y })
        }
    }

    /// Convert (lon, lat) in degrees to a source coordinate.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Projection::Identity => (lon, lat),
            Projection::WebMercator(p) => p.forward(lon, lat),
            Projection::Mercator(p) => p.forward(lon, lat),
            Projection::TransverseMercator(p) => p.forward(lon, lat),
            Projection::LambertConformal(p) => p.forward(lon, lat),
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Projection::Identity)
    }
}

/// Projected national grids expressible with the built-in projections.
///
/// Datums are not shifted. OSGB36 and DHDN land within about 150 m of their
/// WGS84 positions.
fn national_grid(code: u32) -> Option<Projection> {
    let projection = match code {
        // RGF93 / Lambert-93
        2154 => Projection::LambertConformal(LambertConformal::two_standard_parallels(
            Ellipsoid::GRS80,
            46.5,
            3.0,
            49.0,
            44.0,
            700_000.0,
            6_600_000.0,
        )),
        // ETRS89 / LCC Europe
        3034 => Projection::LambertConformal(LambertConformal::two_standard_parallels(
            Ellipsoid::GRS80,
            52.0,
            10.0,
            35.0,
            65.0,
            4_000_000.0,
            2_800_000.0,
        )),
        // OSGB36 / British National Grid
        27700 => Projection::TransverseMercator(TransverseMercator::new(
            Ellipsoid::AIRY_1830,
            49.0,
            -2.0,
            0.999_601_271_7,
            400_000.0,
            -100_000.0,
        )),
        // IRENET95 / Irish Transverse Mercator
        2157 => Projection::TransverseMercator(TransverseMercator::new(
            Ellipsoid::GRS80,
            53.5,
            -8.0,
            0.999_82,
            600_000.0,
            750_000.0,
        )),
        // ETRS89 / TM35FIN
        3067 => Projection::TransverseMercator(TransverseMercator::new(
            Ellipsoid::GRS80,
            0.0,
            27.0,
            0.9996,
            500_000.0,
            0.0,
        )),
        // DHDN / 3-degree Gauss-Kruger zones 2-5
        31466..=31469 => {
            let zone = (code - 31464) as f64;
            Projection::TransverseMercator(TransverseMercator::new(
                Ellipsoid::BESSEL_1841,
                0.0,
                3.0 * zone,
                1.0,
                zone * 1_000_000.0 + 500_000.0,
                0.0,
            ))
        }
        // WGS 84 / World Mercator
        3395 => Projection::Mercator(Mercator::new(Ellipsoid::WGS84, 0.0, 1.0, 0.0, 0.0)),
        _ => return None,
    };
    Some(projection)
}

/// Reproject a bounding box into geographic coordinates.
///
/// The perimeter is densified with `densify_pts` points per edge, every
/// point is transformed, and the envelope of the results is returned.
pub fn transform_bounds(
    projection: &Projection,
    bbox: &BoundingBox,
    densify_pts: usize,
) -> ProjectionResult<BoundingBox> {
    if projection.is_identity() {
        return Ok(*bbox);
    }

    let points = bbox
        .perimeter_points(densify_pts)
        .into_iter()
        .map(|(x, y)| projection.to_geographic(x, y))
        .collect::<ProjectionResult<Vec<_>>>()?;

    let envelope = BoundingBox::envelope(points).ok_or_else(|| {
        ProjectionError::InvalidParameters("bounding box has no perimeter".to_string())
    })?;

    debug!(
        src = ?bbox,
        dst = ?envelope,
        densify_pts,
        "Transformed bounds"
    );

    Ok(envelope)
}

fn check_ellipsoid(ellipsoid: &Ellipsoid) -> ProjectionResult<()> {
    let e2 = ellipsoid.eccentricity_squared();
    if !(ellipsoid.semi_major_axis > 0.0) || !(0.0..1.0).contains(&e2) {
        return Err(ProjectionError::InvalidParameters(format!(
            "invalid ellipsoid: a={}, 1/f={}",
            ellipsoid.semi_major_axis, ellipsoid.inverse_flattening
        )));
    }
    Ok(())
}

fn check_scale(scale: f64) -> ProjectionResult<()> {
    if !(scale > 0.0) || !scale.is_finite() {
        return Err(ProjectionError::InvalidParameters(format!(
            "scale factor must be positive, got {}",
            scale
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geographic_is_identity() {
        assert!(Projection::from_crs(&Crs::Epsg(4326)).unwrap().is_identity());
        assert!(Projection::from_crs(&Crs::Epsg(4269)).unwrap().is_identity());
    }

    #[test]
    fn test_unsupported_epsg() {
        let err = Projection::from_crs(&Crs::Epsg(2193)).unwrap_err();
        assert!(matches!(err, ProjectionError::UnsupportedCrs(ref s) if s == "EPSG:2193"));
    }

    #[test]
    fn test_identity_bounds_unchanged() {
        let bbox = BoundingBox::new(-1.5, 50.0, 2.5, 53.0);
        let out = transform_bounds(&Projection::Identity, &bbox, DEFAULT_DENSIFY_PTS).unwrap();
        assert_eq!(out, bbox);
    }

    #[test]
    fn test_invalid_custom_scale() {
        let custom = CustomProjection::Mercator {
            ellipsoid: Ellipsoid::WGS84,
            lon_origin: 0.0,
            scale: 0.0,
            false_easting: 0.0,
            false_northing: 0.0,
        };
        assert!(matches!(
            Projection::from_crs(&Crs::Custom(custom)),
            Err(ProjectionError::InvalidParameters(_))
        ));
    }
}
