//! Common test fixtures: reference bounds, CRS identifiers and byte
//! buffers that must be rejected.

/// Bounds as (min_x, min_y, max_x, max_y) in the raster's own CRS.
pub mod bbox {
    /// 1° × 1° cell over Bavaria, EPSG:4326
    pub const BAVARIA_DEGREES: (f64, f64, f64, f64) = (11.0, 48.0, 12.0, 49.0);

    /// 10 km square just east of the UTM 33N central meridian (15°E), ~52°N
    pub const UTM33N_10KM: (f64, f64, f64, f64) = (500_000.0, 5_760_000.0, 510_000.0, 5_770_000.0);

    /// ~111 km square at the Web Mercator origin
    pub const WEB_MERCATOR_ORIGIN: (f64, f64, f64, f64) = (0.0, 0.0, 111_319.490_793, 111_325.142_866);

    /// Whole Web Mercator square
    pub const WEB_MERCATOR_WORLD: (f64, f64, f64, f64) = (
        -20_037_508.342_789_244,
        -20_037_508.342_789_244,
        20_037_508.342_789_244,
        20_037_508.342_789_244,
    );

    /// Around Paris in Lambert-93
    pub const LAMBERT93_PARIS: (f64, f64, f64, f64) = (640_000.0, 6_850_000.0, 660_000.0, 6_870_000.0);
}

/// Common CRS identifiers.
pub mod crs {
    /// WGS84 geographic
    pub const EPSG_4326: &str = "EPSG:4326";

    /// Web Mercator
    pub const EPSG_3857: &str = "EPSG:3857";

    /// WGS84 / UTM zone 33N
    pub const EPSG_32633: &str = "EPSG:32633";

    /// lon/lat alias of EPSG:4326
    pub const CRS_84: &str = "CRS:84";
}

/// Byte buffers that are not readable rasters.
pub mod malformed {
    /// Empty upload
    pub const EMPTY: &[u8] = b"";

    /// Plain text
    pub const TEXT: &[u8] = b"this is not a raster";

    /// PNG signature
    pub const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    /// Little-endian TIFF header whose first IFD offset points past the end
    pub const DANGLING_IFD: &[u8] = &[0x49, 0x49, 42, 0, 0xFF, 0xFF, 0x00, 0x00];

    /// Valid TIFF bytes cut short
    pub fn truncated(valid: &[u8]) -> Vec<u8> {
        valid[..valid.len().min(24)].to_vec()
    }

    /// All fixed malformed inputs, with a label for assertion messages.
    pub fn all() -> Vec<(&'static str, &'static [u8])> {
        vec![
            ("empty", EMPTY),
            ("text", TEXT),
            ("png", PNG_MAGIC),
            ("dangling_ifd", DANGLING_IFD),
        ]
    }
}
