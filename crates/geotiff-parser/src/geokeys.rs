//! GeoKey directory parsing and CRS resolution.
//!
//! The directory (tag 34735) is an array of u16: a 4-value header
//! `[version, revision, minor, key_count]` followed by `key_count` entries
//! of `[key_id, location, count, value_offset]`. `location` is 0 for an
//! inline short, 34736 for doubles and 34737 for ASCII params.

use std::collections::HashMap;

use preview_common::{Crs, CustomProjection, Ellipsoid, PreviewError, PreviewResult};
use tracing::debug;

pub const GT_MODEL_TYPE: u16 = 1024;
pub const GT_RASTER_TYPE: u16 = 1025;
pub const GEOGRAPHIC_TYPE: u16 = 2048;
pub const GEOG_SEMI_MAJOR_AXIS: u16 = 2057;
pub const GEOG_SEMI_MINOR_AXIS: u16 = 2058;
pub const GEOG_INV_FLATTENING: u16 = 2059;
pub const PROJECTED_CS_TYPE: u16 = 3072;
pub const PROJ_COORD_TRANS: u16 = 3075;
pub const PROJ_LINEAR_UNITS: u16 = 3076;
pub const PROJ_STD_PARALLEL_1: u16 = 3078;
pub const PROJ_STD_PARALLEL_2: u16 = 3079;
pub const PROJ_NAT_ORIGIN_LONG: u16 = 3080;
pub const PROJ_NAT_ORIGIN_LAT: u16 = 3081;
pub const PROJ_FALSE_EASTING: u16 = 3082;
pub const PROJ_FALSE_NORTHING: u16 = 3083;
pub const PROJ_FALSE_ORIGIN_LONG: u16 = 3084;
pub const PROJ_FALSE_ORIGIN_LAT: u16 = 3085;
pub const PROJ_FALSE_ORIGIN_EASTING: u16 = 3086;
pub const PROJ_FALSE_ORIGIN_NORTHING: u16 = 3087;
pub const PROJ_CENTER_LONG: u16 = 3088;
pub const PROJ_SCALE_AT_NAT_ORIGIN: u16 = 3092;
pub const PROJ_SCALE_AT_CENTER: u16 = 3093;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;
const LINEAR_UNIT_METRE: u16 = 9001;

const CT_TRANSVERSE_MERCATOR: u16 = 1;
const CT_MERCATOR: u16 = 7;
const CT_LAMBERT_CONF_CONIC_2SP: u16 = 8;
const CT_LAMBERT_CONF_CONIC_1SP: u16 = 9;

/// GRS80-based geographic CRSs.
const GRS80_GEOGRAPHIC: &[u16] = &[4269, 4258, 4283, 4617];

/// Value of a single GeoKey.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoKey {
    Short(Vec<u16>),
    Double(Vec<f64>),
    Ascii(String),
}

/// Parsed GeoKey directory.
#[derive(Debug, Clone, Default)]
pub struct GeoKeyDirectory {
    keys: HashMap<u16, GeoKey>,
}

impl GeoKeyDirectory {
    /// Parse the directory and resolve its values against the double and
    /// ASCII parameter tags.
    pub fn parse(directory: &[u16], doubles: &[f64], ascii: &str) -> PreviewResult<Self> {
        if directory.len() < 4 {
            return Err(PreviewError::georeference(format!(
                "GeoKeyDirectoryTag has {} values, expected at least 4",
                directory.len()
            )));
        }

        let key_count = directory[3] as usize;
        if directory.len() < 4 + key_count * 4 {
            return Err(PreviewError::georeference(format!(
                "GeoKeyDirectoryTag declares {} keys but holds {} values",
                key_count,
                directory.len()
            )));
        }

        let mut keys = HashMap::with_capacity(key_count);
        for entry in directory[4..4 + key_count * 4].chunks_exact(4) {
            let (key_id, location, count, offset) =
                (entry[0], entry[1], entry[2] as usize, entry[3] as usize);

            let value = match location {
                0 => GeoKey::Short(vec![entry[3]]),
                34736 => GeoKey::Double(
                    doubles
                        .get(offset..offset + count)
                        .ok_or_else(|| out_of_range(key_id, "GeoDoubleParamsTag"))?
                        .to_vec(),
                ),
                34737 => {
                    let text = ascii
                        .get(offset..offset + count)
                        .ok_or_else(|| out_of_range(key_id, "GeoAsciiParamsTag"))?;
                    GeoKey::Ascii(text.trim_end_matches(['|', '\0']).to_string())
                }
                34735 => GeoKey::Short(
                    directory
                        .get(offset..offset + count)
                        .ok_or_else(|| out_of_range(key_id, "GeoKeyDirectoryTag"))?
                        .to_vec(),
                ),
                other => {
                    debug!(key_id, location = other, "Skipping GeoKey with unknown location");
                    continue;
                }
            };
            keys.insert(key_id, value);
        }

        Ok(Self { keys })
    }

    pub fn get(&self, key_id: u16) -> Option<&GeoKey> {
        self.keys.get(&key_id)
    }

    pub fn short(&self, key_id: u16) -> Option<u16> {
        match self.keys.get(&key_id) {
            Some(GeoKey::Short(values)) => values.first().copied(),
            _ => None,
        }
    }

    pub fn double(&self, key_id: u16) -> Option<f64> {
        match self.keys.get(&key_id) {
            Some(GeoKey::Double(values)) => values.first().copied(),
            _ => None,
        }
    }

    pub fn ascii(&self, key_id: u16) -> Option<&str> {
        match self.keys.get(&key_id) {
            Some(GeoKey::Ascii(text)) => Some(text),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// True when GTRasterTypeGeoKey says coordinates refer to pixel centres.
    pub fn is_pixel_is_point(&self) -> bool {
        self.short(GT_RASTER_TYPE) == Some(RASTER_PIXEL_IS_POINT)
    }

    /// Resolve the raster's CRS. `Ok(None)` when the keys name no CRS.
    pub fn crs(&self) -> PreviewResult<Option<Crs>> {
        let model_type = self.short(GT_MODEL_TYPE);
        let projected = self.short(PROJECTED_CS_TYPE).filter(|&c| c != 0);

        match (model_type, projected) {
            (Some(MODEL_TYPE_PROJECTED), Some(code)) | (None, Some(code)) if code != USER_DEFINED => {
                Ok(Some(Crs::Epsg(code as u32)))
            }
            (Some(MODEL_TYPE_PROJECTED), _) => self.user_defined_projection().map(Some),
            (Some(MODEL_TYPE_GEOGRAPHIC), _) | (None, None) => Ok(self.geographic_crs()),
            (Some(other), _) => Err(PreviewError::unsupported(format!(
                "GeoTIFF model type {}",
                other
            ))),
            (None, Some(_)) => self.user_defined_projection().map(Some),
        }
    }

    fn geographic_crs(&self) -> Option<Crs> {
        match self.short(GEOGRAPHIC_TYPE) {
            Some(USER_DEFINED) => Some(Crs::reference()),
            Some(code) if code != 0 => Some(Crs::Epsg(code as u32)),
            _ if self.short(GT_MODEL_TYPE) == Some(MODEL_TYPE_GEOGRAPHIC) => Some(Crs::reference()),
            _ => None,
        }
    }

    fn ellipsoid(&self) -> Ellipsoid {
        let base = match self.short(GEOGRAPHIC_TYPE) {
            Some(code) if GRS80_GEOGRAPHIC.contains(&code) => Ellipsoid::GRS80,
            _ => Ellipsoid::WGS84,
        };

        let Some(a) = self.double(GEOG_SEMI_MAJOR_AXIS) else {
            return base;
        };
        let inverse_flattening = match (
            self.double(GEOG_INV_FLATTENING),
            self.double(GEOG_SEMI_MINOR_AXIS),
        ) {
            (Some(inv_f), _) => inv_f,
            (None, Some(b)) if (a - b).abs() > f64::EPSILON => a / (a - b),
            (None, Some(_)) => 0.0,
            (None, None) => base.inverse_flattening,
        };

        Ellipsoid {
            semi_major_axis: a,
            inverse_flattening,
        }
    }

    fn user_defined_projection(&self) -> PreviewResult<Crs> {
        if let Some(units) = self.short(PROJ_LINEAR_UNITS) {
            if units != LINEAR_UNIT_METRE {
                return Err(PreviewError::unsupported(format!(
                    "user-defined projection with linear units {}",
                    units
                )));
            }
        }

        let ellipsoid = self.ellipsoid();
        let d = |key: u16| self.double(key);
        let false_easting = d(PROJ_FALSE_EASTING).unwrap_or(0.0);
        let false_northing = d(PROJ_FALSE_NORTHING).unwrap_or(0.0);

        let projection = match self.short(PROJ_COORD_TRANS) {
            Some(CT_TRANSVERSE_MERCATOR) => CustomProjection::TransverseMercator {
                ellipsoid,
                lat_origin: d(PROJ_NAT_ORIGIN_LAT).unwrap_or(0.0),
                lon_origin: d(PROJ_NAT_ORIGIN_LONG)
                    .or_else(|| d(PROJ_CENTER_LONG))
                    .unwrap_or(0.0),
                scale: d(PROJ_SCALE_AT_NAT_ORIGIN)
                    .or_else(|| d(PROJ_SCALE_AT_CENTER))
                    .unwrap_or(1.0),
                false_easting,
                false_northing,
            },
            Some(CT_MERCATOR) => {
                // Mercator (2SP) gives a standard parallel instead of a scale
                let scale = match (d(PROJ_SCALE_AT_NAT_ORIGIN), d(PROJ_STD_PARALLEL_1)) {
                    (Some(k0), _) => k0,
                    (None, Some(lat_ts)) => parallel_scale(&ellipsoid, lat_ts),
                    (None, None) => 1.0,
                };
                CustomProjection::Mercator {
                    ellipsoid,
                    lon_origin: d(PROJ_NAT_ORIGIN_LONG)
                        .or_else(|| d(PROJ_CENTER_LONG))
                        .unwrap_or(0.0),
                    scale,
                    false_easting,
                    false_northing,
                }
            }
            Some(CT_LAMBERT_CONF_CONIC_2SP) => CustomProjection::LambertConformal {
                ellipsoid,
                lat_origin: d(PROJ_FALSE_ORIGIN_LAT)
                    .or_else(|| d(PROJ_NAT_ORIGIN_LAT))
                    .unwrap_or(0.0),
                lon_origin: d(PROJ_FALSE_ORIGIN_LONG)
                    .or_else(|| d(PROJ_NAT_ORIGIN_LONG))
                    .unwrap_or(0.0),
                standard_parallel_1: d(PROJ_STD_PARALLEL_1).ok_or_else(|| {
                    PreviewError::georeference("Lambert Conformal Conic (2SP) without ProjStdParallel1GeoKey")
                })?,
                standard_parallel_2: d(PROJ_STD_PARALLEL_2).ok_or_else(|| {
                    PreviewError::georeference("Lambert Conformal Conic (2SP) without ProjStdParallel2GeoKey")
                })?,
                scale: 1.0,
                false_easting: d(PROJ_FALSE_ORIGIN_EASTING).unwrap_or(false_easting),
                false_northing: d(PROJ_FALSE_ORIGIN_NORTHING).unwrap_or(false_northing),
            },
            Some(CT_LAMBERT_CONF_CONIC_1SP) => {
                let lat_origin = d(PROJ_NAT_ORIGIN_LAT).ok_or_else(|| {
                    PreviewError::georeference("Lambert Conformal Conic (1SP) without ProjNatOriginLatGeoKey")
                })?;
                CustomProjection::LambertConformal {
                    ellipsoid,
                    lat_origin,
                    lon_origin: d(PROJ_NAT_ORIGIN_LONG).unwrap_or(0.0),
                    standard_parallel_1: lat_origin,
                    standard_parallel_2: lat_origin,
                    scale: d(PROJ_SCALE_AT_NAT_ORIGIN).unwrap_or(1.0),
                    false_easting,
                    false_northing,
                }
            }
            Some(other) => {
                return Err(PreviewError::unsupported(format!(
                    "user-defined coordinate transformation {}",
                    other
                )))
            }
            None => {
                return Err(PreviewError::georeference(
                    "projected model without ProjectedCSTypeGeoKey or ProjCoordTransGeoKey",
                ))
            }
        };

        Ok(Crs::Custom(projection))
    }
}

/// Mercator scale factor implied by a latitude of true scale.
fn parallel_scale(ellipsoid: &Ellipsoid, lat_ts_deg: f64) -> f64 {
    let phi = lat_ts_deg.to_radians();
    let e2 = ellipsoid.eccentricity_squared();
    phi.cos() / (1.0 - e2 * phi.sin() * phi.sin()).sqrt()
}

fn out_of_range(key_id: u16, tag: &str) -> PreviewError {
    PreviewError::georeference(format!("GeoKey {} points outside {}", key_id, tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(entries: &[[u16; 4]]) -> Vec<u16> {
        let mut dir = vec![1, 1, 0, entries.len() as u16];
        for entry in entries {
            dir.extend_from_slice(entry);
        }
        dir
    }

    #[test]
    fn test_geographic_4326() {
        let dir = directory(&[[1024, 0, 1, 2], [1025, 0, 1, 1], [2048, 0, 1, 4326]]);
        let keys = GeoKeyDirectory::parse(&dir, &[], "").unwrap();
        assert_eq!(keys.len(), 3);
        assert!(!keys.is_pixel_is_point());
        assert_eq!(keys.crs().unwrap(), Some(Crs::Epsg(4326)));
    }

    #[test]
    fn test_projected_utm() {
        let dir = directory(&[[1024, 0, 1, 1], [3072, 0, 1, 32633]]);
        let keys = GeoKeyDirectory::parse(&dir, &[], "").unwrap();
        assert_eq!(keys.crs().unwrap(), Some(Crs::Epsg(32633)));
    }

    #[test]
    fn test_no_crs_keys() {
        let dir = directory(&[[1025, 0, 1, 2]]);
        let keys = GeoKeyDirectory::parse(&dir, &[], "").unwrap();
        assert!(keys.is_pixel_is_point());
        assert_eq!(keys.crs().unwrap(), None);
    }

    #[test]
    fn test_ascii_and_double_params() {
        let dir = directory(&[[1026, 34737, 6, 0], [2057, 34736, 1, 1]]);
        let keys = GeoKeyDirectory::parse(&dir, &[0.0, 6_378_137.0], "WGS 84|").unwrap();
        assert_eq!(keys.ascii(1026), Some("WGS 84"));
        assert_eq!(keys.double(2057), Some(6_378_137.0));
    }

    #[test]
    fn test_truncated_directory() {
        assert!(GeoKeyDirectory::parse(&[1, 1, 0], &[], "").is_err());
        assert!(GeoKeyDirectory::parse(&[1, 1, 0, 2, 1024, 0, 1, 1], &[], "").is_err());
    }

    #[test]
    fn test_double_offset_out_of_range() {
        let dir = directory(&[[3082, 34736, 1, 5]]);
        assert!(GeoKeyDirectory::parse(&dir, &[1.0], "").is_err());
    }

    #[test]
    fn test_user_defined_lambert_2sp() {
        let doubles = [49.0, 44.0, 46.5, 3.0, 700_000.0, 6_600_000.0];
        let dir = directory(&[
            [1024, 0, 1, 1],
            [2048, 0, 1, 4258],
            [3072, 0, 1, 32767],
            [3075, 0, 1, 8],
            [3076, 0, 1, 9001],
            [3078, 34736, 1, 0],
            [3079, 34736, 1, 1],
            [3085, 34736, 1, 2],
            [3084, 34736, 1, 3],
            [3086, 34736, 1, 4],
            [3087, 34736, 1, 5],
        ]);
        let keys = GeoKeyDirectory::parse(&dir, &doubles, "").unwrap();

        let expected = CustomProjection::LambertConformal {
            ellipsoid: Ellipsoid::GRS80,
            lat_origin: 46.5,
            lon_origin: 3.0,
            standard_parallel_1: 49.0,
            standard_parallel_2: 44.0,
            scale: 1.0,
            false_easting: 700_000.0,
            false_northing: 6_600_000.0,
        };
        assert_eq!(keys.crs().unwrap(), Some(Crs::Custom(expected)));
    }

    #[test]
    fn test_user_defined_transverse_mercator_with_custom_ellipsoid() {
        let doubles = [-2.0, 49.0, 0.999_601_271_7, 400_000.0, -100_000.0, 6_377_563.396, 299.324_964_6];
        let dir = directory(&[
            [1024, 0, 1, 1],
            [3072, 0, 1, 32767],
            [3075, 0, 1, 1],
            [3080, 34736, 1, 0],
            [3081, 34736, 1, 1],
            [3092, 34736, 1, 2],
            [3082, 34736, 1, 3],
            [3083, 34736, 1, 4],
            [2057, 34736, 1, 5],
            [2059, 34736, 1, 6],
        ]);
        let keys = GeoKeyDirectory::parse(&dir, &doubles, "").unwrap();

        match keys.crs().unwrap() {
            Some(Crs::Custom(CustomProjection::TransverseMercator {
                ellipsoid,
                lon_origin,
                scale,
                false_northing,
                ..
            })) => {
                assert_eq!(ellipsoid.semi_major_axis, 6_377_563.396);
                assert_eq!(lon_origin, -2.0);
                assert_eq!(scale, 0.999_601_271_7);
                assert_eq!(false_northing, -100_000.0);
            }
            other => panic!("unexpected CRS {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_user_defined_method() {
        // Polar stereographic
        let dir = directory(&[[1024, 0, 1, 1], [3072, 0, 1, 32767], [3075, 0, 1, 15]]);
        let keys = GeoKeyDirectory::parse(&dir, &[], "").unwrap();
        assert!(keys.crs().is_err());
    }

    #[test]
    fn test_feet_are_unsupported() {
        let dir = directory(&[
            [1024, 0, 1, 1],
            [3072, 0, 1, 32767],
            [3075, 0, 1, 1],
            [3076, 0, 1, 9002],
        ]);
        let keys = GeoKeyDirectory::parse(&dir, &[], "").unwrap();
        assert!(keys.crs().is_err());
    }
}
