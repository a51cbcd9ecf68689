//! Embedded images
//!
//! An [`Image`] carries its bytes, detected format, size in both pixels and
//! EMUs, and its placement. Pixel dimensions come from a [`DimensionProbe`];
//! formats the probe cannot measure are embedded as opaque payloads.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::{DocxError, Result};
use crate::format::ooxml_token_enum;
use crate::units::{emu_to_pixels, EMU_PER_INCH, EMU_PER_PIXEL, PIXELS_PER_INCH};

/// Image formats recognised by extension or signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Webp,
    Svg,
    Emf,
    Wmf,
}

impl ImageFormat {
    /// Detect format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            "webp" => Some(Self::Webp),
            "svg" => Some(Self::Svg),
            "emf" => Some(Self::Emf),
            "wmf" => Some(Self::Wmf),
            _ => None,
        }
    }

    /// Detect format from a filename's extension
    pub fn from_filename(filename: &str) -> Option<Self> {
        filename
            .rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
    }

    /// Detect format from leading magic bytes
    pub fn detect_from_bytes(data: &[u8]) -> Option<Self> {
        const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

        if data.starts_with(PNG) {
            Some(Self::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if data.starts_with(b"BM") {
            Some(Self::Bmp)
        } else if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
            Some(Self::Tiff)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
            Some(Self::Wmf)
        } else if data.len() >= 44 && data[0..4] == [1, 0, 0, 0] && &data[40..44] == b" EMF" {
            Some(Self::Emf)
        } else if looks_like_svg(data) {
            Some(Self::Svg)
        } else {
            None
        }
    }

    /// Canonical file extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
            Self::Webp => "webp",
            Self::Svg => "svg",
            Self::Emf => "emf",
            Self::Wmf => "wmf",
        }
    }

    /// MIME content type used in `[Content_Types].xml`
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Webp => "image/webp",
            Self::Svg => "image/svg+xml",
            Self::Emf => "image/x-emf",
            Self::Wmf => "image/x-wmf",
        }
    }

    /// Whether pixel dimensions are decoded rather than assumed
    pub fn is_measurable(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Gif | Self::Bmp)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with("<svg") || (trimmed.starts_with("<?xml") && text.contains("<svg"))
}

/// Content type for a file extension, `application/octet-stream` if unknown
pub fn content_type_for_extension(ext: &str) -> &'static str {
    ImageFormat::from_extension(ext)
        .map(|f| f.content_type())
        .unwrap_or("application/octet-stream")
}

/// Image extent in pixels (96 DPI) and EMUs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width_px: u32,
    pub height_px: u32,
    pub width_emu: i64,
    pub height_emu: i64,
}

impl ImageSize {
    /// Size from pixel dimensions at 96 DPI
    pub fn new(width_px: u32, height_px: u32) -> Self {
        Self {
            width_px,
            height_px,
            width_emu: i64::from(width_px) * EMU_PER_PIXEL,
            height_emu: i64::from(height_px) * EMU_PER_PIXEL,
        }
    }

    /// Size from inches; pixels are rounded at 96 DPI
    pub fn from_inches(width: f64, height: f64) -> Self {
        Self {
            width_px: (width * PIXELS_PER_INCH).round().max(0.0) as u32,
            height_px: (height * PIXELS_PER_INCH).round().max(0.0) as u32,
            width_emu: (width * EMU_PER_INCH as f64).round() as i64,
            height_emu: (height * EMU_PER_INCH as f64).round() as i64,
        }
    }

    /// Size from EMU extents; pixels are rounded at 96 DPI
    pub fn from_emu(width_emu: i64, height_emu: i64) -> Self {
        Self {
            width_px: emu_to_pixels(width_emu).max(0) as u32,
            height_px: emu_to_pixels(height_emu).max(0) as u32,
            width_emu,
            height_emu,
        }
    }

    /// Scale to `width_px`, keeping the aspect ratio
    pub fn scaled_to_width(&self, width_px: u32) -> Self {
        if self.width_px == 0 {
            return Self::new(width_px, self.height_px);
        }
        let ratio = f64::from(width_px) / f64::from(self.width_px);
        Self::new(width_px, (f64::from(self.height_px) * ratio).round() as u32)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width_emu <= 0 || self.height_emu <= 0 {
            return Err(DocxError::validation(
                "image_size",
                format!(
                    "extent {}x{} EMU must be positive",
                    self.width_emu, self.height_emu
                ),
            ));
        }
        Ok(())
    }
}

ooxml_token_enum! {
    /// Text wrapping around a floating image
    WrapType {
        None => "none",
        Square => "square",
        Tight => "tight",
        Through => "through",
        TopAndBottom => "topAndBottom",
    }
}

impl WrapType {
    /// Element name inside `wp:anchor`
    pub fn element_name(&self) -> &'static str {
        match self {
            Self::None => "wrapNone",
            Self::Square => "wrapSquare",
            Self::Tight => "wrapTight",
            Self::Through => "wrapThrough",
            Self::TopAndBottom => "wrapTopAndBottom",
        }
    }

    /// Inverse of [`WrapType::element_name`]
    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "wrapNone" => Some(Self::None),
            "wrapSquare" => Some(Self::Square),
            "wrapTight" => Some(Self::Tight),
            "wrapThrough" => Some(Self::Through),
            "wrapTopAndBottom" => Some(Self::TopAndBottom),
            _ => None,
        }
    }
}

ooxml_token_enum! {
    /// Reference frame for a floating offset
    RelativeFrom {
        Margin => "margin",
        Page => "page",
        Column => "column",
        Character => "character",
        Paragraph => "paragraph",
        Line => "line",
    }
}

ooxml_token_enum! {
    /// Aligned placement within the reference frame
    PositionAlign {
        Left => "left",
        Center => "center",
        Right => "right",
        Top => "top",
        Bottom => "bottom",
        Inside => "inside",
        Outside => "outside",
    }
}

/// One axis of a floating position: aligned, or offset in EMUs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisPosition {
    Align(PositionAlign),
    Offset(i64),
}

/// Placement of an anchored (floating) image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatingPosition {
    pub horizontal: AxisPosition,
    pub horizontal_from: RelativeFrom,
    pub vertical: AxisPosition,
    pub vertical_from: RelativeFrom,
    pub wrap: WrapType,
    /// Relative stacking order (`relativeHeight`)
    pub z_order: u32,
    pub behind_text: bool,
}

impl Default for FloatingPosition {
    fn default() -> Self {
        Self {
            horizontal: AxisPosition::Offset(0),
            horizontal_from: RelativeFrom::Column,
            vertical: AxisPosition::Offset(0),
            vertical_from: RelativeFrom::Paragraph,
            wrap: WrapType::Square,
            z_order: 0,
            behind_text: false,
        }
    }
}

impl FloatingPosition {
    /// Horizontally aligned relative to the margin, square wrap
    pub fn aligned(align: PositionAlign) -> Self {
        Self {
            horizontal: AxisPosition::Align(align),
            horizontal_from: RelativeFrom::Margin,
            ..Self::default()
        }
    }

    /// Absolute offsets in EMUs from the page corner
    pub fn at_offset(x_emu: i64, y_emu: i64) -> Self {
        Self {
            horizontal: AxisPosition::Offset(x_emu),
            horizontal_from: RelativeFrom::Page,
            vertical: AxisPosition::Offset(y_emu),
            vertical_from: RelativeFrom::Page,
            ..Self::default()
        }
    }

    pub fn with_wrap(mut self, wrap: WrapType) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn with_z_order(mut self, z_order: u32) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn behind_text(mut self, behind: bool) -> Self {
        self.behind_text = behind;
        self
    }
}

/// Inline (flows with text) or floating (anchored) placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImagePosition {
    #[default]
    Inline,
    Floating(FloatingPosition),
}

impl ImagePosition {
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline)
    }
}

/// Source of pixel dimensions for image bytes
pub trait DimensionProbe: fmt::Debug + Send + Sync {
    /// Pixel `(width, height)`, or `None` when the format is not measurable
    fn probe(&self, data: &[u8], format: ImageFormat) -> Result<Option<(u32, u32)>>;
}

/// Probe backed by the `image` crate (PNG, JPEG, GIF, BMP)
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateProbe;

impl DimensionProbe for ImageCrateProbe {
    fn probe(&self, data: &[u8], format: ImageFormat) -> Result<Option<(u32, u32)>> {
        if !format.is_measurable() {
            return Ok(None);
        }
        let reader = ::image::ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        let dimensions = reader.into_dimensions()?;
        Ok(Some(dimensions))
    }
}

/// An image placed in a run
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    id: String,
    drawing_id: u64,
    data: Arc<[u8]>,
    format: ImageFormat,
    original_size: ImageSize,
    size: ImageSize,
    description: String,
    position: ImagePosition,
    relationship_id: Option<String>,
    target: Option<String>,
}

impl Image {
    pub(crate) fn new(
        id: String,
        drawing_id: u64,
        data: Arc<[u8]>,
        format: ImageFormat,
        original_size: ImageSize,
    ) -> Self {
        Self {
            id,
            drawing_id,
            data,
            format,
            original_size,
            size: original_size,
            description: String::new(),
            position: ImagePosition::Inline,
            relationship_id: None,
            target: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Numeric id used for `wp:docPr`
    pub fn drawing_id(&self) -> u64 {
        self.drawing_id
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Size as probed (or assumed) at attachment
    pub fn original_size(&self) -> ImageSize {
        self.original_size
    }

    /// Size rendered in the document
    pub fn size(&self) -> ImageSize {
        self.size
    }

    pub fn set_size(&mut self, size: ImageSize) -> Result<()> {
        size.validate()?;
        self.size = size;
        Ok(())
    }

    /// Resize to `width_px`, preserving the original aspect ratio
    pub fn scale_to_width(&mut self, width_px: u32) -> Result<()> {
        self.set_size(self.original_size.scaled_to_width(width_px))
    }

    /// Alt text
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn position(&self) -> ImagePosition {
        self.position
    }

    pub fn set_position(&mut self, position: ImagePosition) {
        self.position = position;
    }

    /// Relationship ID once registered
    pub fn relationship_id(&self) -> Option<&str> {
        self.relationship_id.as_deref()
    }

    /// In-package media path once registered (relative to `word/`)
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub(crate) fn bind(&mut self, relationship_id: String, target: String) {
        self.relationship_id = Some(relationship_id);
        self.target = Some(target);
    }
}
