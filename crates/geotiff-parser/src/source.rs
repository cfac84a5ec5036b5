//! In-memory GeoTIFF source.

use std::io::Cursor;

use preview_common::{BoundingBox, Crs, PreviewError, PreviewResult};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::TiffError;
use tracing::{debug, instrument};

use crate::block::{PixelBlock, SampleType};
use crate::geokeys::GeoKeyDirectory;
use crate::geotransform::GeoTransform;

/// A GeoTIFF opened from a byte buffer.
///
/// Holds the decoder positioned at the first image directory together with
/// the metadata read from it. Pixel data is decoded only by [`read`].
///
/// [`read`]: RasterSource::read
pub struct RasterSource<'a> {
    decoder: Decoder<Cursor<&'a [u8]>>,
    width: usize,
    height: usize,
    band_count: usize,
    sample_type: SampleType,
    transform: Option<GeoTransform>,
    crs: Option<Crs>,
}

impl<'a> RasterSource<'a> {
    /// Open a GeoTIFF held in memory and read its metadata.
    ///
    /// Uses the `tiff` crate's default decoding limits.
    pub fn open(bytes: &'a [u8]) -> PreviewResult<Self> {
        Self::open_with_limits(bytes, Limits::default())
    }

    /// Open with a cap on the decoded image buffer, in bytes.
    pub fn open_with_memory_limit(bytes: &'a [u8], max_decoded_bytes: usize) -> PreviewResult<Self> {
        let mut limits = Limits::default();
        limits.decoding_buffer_size = max_decoded_bytes;
        limits.intermediate_buffer_size = max_decoded_bytes;
        Self::open_with_limits(bytes, limits)
    }

    #[instrument(level = "debug", skip(bytes, limits), fields(size = bytes.len()))]
    fn open_with_limits(bytes: &'a [u8], limits: Limits) -> PreviewResult<Self> {
        let mut decoder = Decoder::new(Cursor::new(bytes))
            .map_err(tiff_error)?
            .with_limits(limits);

        let (width, height) = decoder.dimensions().map_err(tiff_error)?;
        let (width, height) = (width as usize, height as usize);
        if width == 0 || height == 0 {
            return Err(PreviewError::tiff(format!(
                "raster has zero size ({} x {})",
                width, height
            )));
        }

        let band_count = optional_tag(&mut decoder, Tag::SamplesPerPixel)?
            .map(|v| v.into_u32())
            .transpose()
            .map_err(tiff_error)?
            .unwrap_or(1) as usize;
        let bits = first_u32(&mut decoder, Tag::BitsPerSample)?.unwrap_or(1);
        let sample_format = first_u32(&mut decoder, Tag::SampleFormat)?.unwrap_or(1);
        let sample_type = SampleType::from_tiff(sample_format, bits).ok_or_else(|| {
            PreviewError::unsupported(format!(
                "{}-bit samples with sample format {}",
                bits, sample_format
            ))
        })?;

        let transform = read_geotransform(&mut decoder)?;
        let geokeys = read_geokeys(&mut decoder)?;

        let crs = match &geokeys {
            Some(keys) => keys.crs()?,
            None => None,
        };
        let transform = match (transform, &geokeys) {
            (Some(t), Some(keys)) if keys.is_pixel_is_point() => Some(t.pixel_is_point_shift()),
            (t, _) => t,
        };

        debug!(
            width,
            height,
            band_count,
            sample_type = %sample_type,
            crs = ?crs.as_ref().map(|c| c.to_string()),
            georeferenced = transform.is_some(),
            "Opened GeoTIFF"
        );

        Ok(Self {
            decoder,
            width,
            height,
            band_count,
            sample_type,
            transform,
            crs,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Source CRS, if the GeoKeys name one.
    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub fn geotransform(&self) -> Option<&GeoTransform> {
        self.transform.as_ref()
    }

    /// Bounds in source CRS units.
    ///
    /// Without georeferencing this is the pixel grid `(0, 0, width, height)`.
    pub fn bounds(&self) -> BoundingBox {
        match &self.transform {
            Some(t) => t.bounds(self.width, self.height),
            None => BoundingBox::new(0.0, 0.0, self.width as f64, self.height as f64),
        }
    }

    /// Decode the image and resample it to `out_rows` × `out_cols`.
    ///
    /// Both are clamped to at least 1. Resampling is nearest neighbour.
    pub fn read(&mut self, out_rows: usize, out_cols: usize) -> PreviewResult<PixelBlock> {
        let (out_rows, out_cols) = (out_rows.max(1), out_cols.max(1));
        let decoded = self.decoder.read_image().map_err(tiff_error)?;

        let (w, h) = (self.width, self.height);
        let bands = band_count(decoded_len(&decoded), w, h)?;
        if bands != self.band_count {
            debug!(
                declared = self.band_count,
                decoded = bands,
                "SamplesPerPixel disagrees with decoded data"
            );
        }

        let block = match decoded {
            DecodingResult::U8(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::U8)
            }
            DecodingResult::U16(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::U16)
            }
            DecodingResult::U32(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::U32)
            }
            DecodingResult::U64(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::U64)
            }
            DecodingResult::I8(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::I8)
            }
            DecodingResult::I16(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::I16)
            }
            DecodingResult::I32(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::I32)
            }
            DecodingResult::I64(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::I64)
            }
            DecodingResult::F32(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::F32)
            }
            DecodingResult::F64(buf) => {
                PixelBlock::from_interleaved(&buf, bands, h, w, out_rows, out_cols, SampleType::F64)
            }
        }?;

        debug!(
            bands = block.bands(),
            rows = block.rows(),
            cols = block.cols(),
            "Read pixel block"
        );

        Ok(block)
    }

    /// Decode the image decimated by an integer factor
    /// (`height / factor` × `width / factor`).
    pub fn read_decimated(&mut self, factor: usize) -> PreviewResult<PixelBlock> {
        let factor = factor.max(1);
        self.read(self.height / factor, self.width / factor)
    }
}

impl std::fmt::Debug for RasterSource<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSource")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("band_count", &self.band_count)
            .field("sample_type", &self.sample_type)
            .field("transform", &self.transform)
            .field("crs", &self.crs)
            .finish()
    }
}

fn read_geotransform(
    decoder: &mut Decoder<Cursor<&[u8]>>,
) -> PreviewResult<Option<GeoTransform>> {
    let tiepoint = f64_tag(decoder, Tag::ModelTiepointTag)?;
    let scale = f64_tag(decoder, Tag::ModelPixelScaleTag)?;

    match (tiepoint, scale) {
        (Some(tiepoint), Some(scale)) => GeoTransform::from_tiepoint(&tiepoint, &scale).map(Some),
        (tiepoint, _) => match f64_tag(decoder, Tag::ModelTransformationTag)? {
            Some(matrix) => GeoTransform::from_model_transformation(&matrix).map(Some),
            None if tiepoint.is_some_and(|t| t.len() > 6) => Err(PreviewError::unsupported(
                "rasters georeferenced by ground control points",
            )),
            None => Ok(None),
        },
    }
}

fn read_geokeys(decoder: &mut Decoder<Cursor<&[u8]>>) -> PreviewResult<Option<GeoKeyDirectory>> {
    let Some(directory) = optional_tag(decoder, Tag::GeoKeyDirectoryTag)? else {
        return Ok(None);
    };
    let directory = directory.into_u16_vec().map_err(tiff_error)?;
    let doubles = f64_tag(decoder, Tag::GeoDoubleParamsTag)?.unwrap_or_default();
    let ascii = match optional_tag(decoder, Tag::GeoAsciiParamsTag)? {
        Some(value) => value.into_string().map_err(tiff_error)?,
        None => String::new(),
    };

    GeoKeyDirectory::parse(&directory, &doubles, &ascii).map(Some)
}

fn optional_tag(
    decoder: &mut Decoder<Cursor<&[u8]>>,
    tag: Tag,
) -> PreviewResult<Option<tiff::decoder::ifd::Value>> {
    decoder.find_tag(tag).map_err(tiff_error)
}

fn f64_tag(decoder: &mut Decoder<Cursor<&[u8]>>, tag: Tag) -> PreviewResult<Option<Vec<f64>>> {
    optional_tag(decoder, tag)?
        .map(|v| v.into_f64_vec())
        .transpose()
        .map_err(tiff_error)
}

/// First value of a per-sample tag such as BitsPerSample.
fn first_u32(decoder: &mut Decoder<Cursor<&[u8]>>, tag: Tag) -> PreviewResult<Option<u32>> {
    let values = optional_tag(decoder, tag)?
        .map(|v| v.into_u32_vec())
        .transpose()
        .map_err(tiff_error)?;
    Ok(values.and_then(|v| v.first().copied()))
}

fn decoded_len(decoded: &DecodingResult) -> usize {
    match decoded {
        DecodingResult::U8(b) => b.len(),
        DecodingResult::U16(b) => b.len(),
        DecodingResult::U32(b) => b.len(),
        DecodingResult::U64(b) => b.len(),
        DecodingResult::I8(b) => b.len(),
        DecodingResult::I16(b) => b.len(),
        DecodingResult::I32(b) => b.len(),
        DecodingResult::I64(b) => b.len(),
        DecodingResult::F32(b) => b.len(),
        DecodingResult::F64(b) => b.len(),
    }
}

fn band_count(samples: usize, width: usize, height: usize) -> PreviewResult<usize> {
    let pixels = width * height;
    if samples == 0 || samples % pixels != 0 {
        return Err(PreviewError::tiff(format!(
            "decoded {} samples for a {} x {} raster",
            samples, width, height
        )));
    }
    Ok(samples / pixels)
}

fn tiff_error(err: TiffError) -> PreviewError {
    match err {
        TiffError::UnsupportedError(e) => PreviewError::unsupported(e.to_string()),
        TiffError::LimitsExceeded => {
            PreviewError::unsupported("raster exceeds the decoder's memory limits")
        }
        other => PreviewError::tiff(other.to_string()),
    }
}
