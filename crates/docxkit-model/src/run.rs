//! Runs: spans of content sharing one formatting set

use std::sync::Arc;

use crate::error::{DocxError, Result};
use crate::field::Field;
use crate::format::{Color, Font, HighlightColor, UnderlineStyle, VerticalPosition};
use crate::ids::{IdGenerator, IdKind};
use crate::image::Image;
use crate::units::{MAX_HALF_POINTS, MIN_HALF_POINTS};

/// Explicit break kinds (`w:br`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakType {
    /// Line break (no `w:type` attribute)
    Line,
    Page,
    Column,
}

impl BreakType {
    /// Value of `w:type`, `None` for a plain line break
    pub fn as_attr(&self) -> Option<&'static str> {
        match self {
            Self::Line => None,
            Self::Page => Some("page"),
            Self::Column => Some("column"),
        }
    }
}

/// What a run displays
///
/// Text and images are alternatives: assigning one replaces the other.
#[derive(Debug, Clone, PartialEq)]
pub enum RunContent {
    Text(String),
    Image(Box<Image>),
    Break(BreakType),
    Tab,
}

impl Default for RunContent {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// Character formatting (`w:rPr`)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunProperties {
    /// Character style ID
    pub style: Option<String>,
    pub font: Option<Font>,
    pub color: Option<Color>,
    /// Font size in half-points
    pub size: Option<u16>,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: UnderlineStyle,
    pub highlight: HighlightColor,
    pub vertical_position: Option<VerticalPosition>,
}

impl RunProperties {
    /// True when no property would be written
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A run of content with uniform formatting
#[derive(Debug, Clone)]
pub struct Run {
    id: String,
    ids: Arc<IdGenerator>,
    content: RunContent,
    properties: RunProperties,
    fields: Vec<Field>,
}

impl Run {
    pub(crate) fn new(ids: Arc<IdGenerator>, content: RunContent) -> Self {
        Self {
            id: ids.next(IdKind::Run),
            ids,
            content,
            properties: RunProperties::default(),
            fields: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &RunContent {
        &self.content
    }

    /// The run's text; empty for image, break and tab runs
    pub fn text(&self) -> &str {
        match &self.content {
            RunContent::Text(text) => text,
            _ => "",
        }
    }

    /// Replace the content with text (drops any image)
    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.content = RunContent::Text(text.into());
        self
    }

    pub fn image(&self) -> Option<&Image> {
        match &self.content {
            RunContent::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn image_mut(&mut self) -> Option<&mut Image> {
        match &mut self.content {
            RunContent::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self.content, RunContent::Image(_))
    }

    pub(crate) fn set_image(&mut self, image: Image) {
        self.content = RunContent::Image(Box::new(image));
    }

    pub fn properties(&self) -> &RunProperties {
        &self.properties
    }

    /// Unvalidated access for values already known to be in range
    pub(crate) fn properties_mut(&mut self) -> &mut RunProperties {
        &mut self.properties
    }

    /// Replace all formatting at once, validating each field
    pub fn set_properties(&mut self, properties: RunProperties) -> Result<&mut Self> {
        if let Some(size) = properties.size {
            check_size(size)?;
        }
        if let Some(font) = &properties.font {
            font.validate()?;
        }
        check_style(properties.style.as_deref())?;
        self.properties = properties;
        Ok(self)
    }

    pub fn set_bold(&mut self, bold: bool) -> &mut Self {
        self.properties.bold = bold;
        self
    }

    pub fn set_italic(&mut self, italic: bool) -> &mut Self {
        self.properties.italic = italic;
        self
    }

    pub fn set_strike(&mut self, strike: bool) -> &mut Self {
        self.properties.strike = strike;
        self
    }

    pub fn set_underline(&mut self, underline: UnderlineStyle) -> &mut Self {
        self.properties.underline = underline;
        self
    }

    pub fn set_highlight(&mut self, highlight: HighlightColor) -> &mut Self {
        self.properties.highlight = highlight;
        self
    }

    pub fn set_color(&mut self, color: Color) -> &mut Self {
        self.properties.color = Some(color);
        self
    }

    pub fn set_vertical_position(&mut self, position: VerticalPosition) -> &mut Self {
        self.properties.vertical_position = Some(position);
        self
    }

    /// Font size in half-points, inclusive range 2..=3276
    pub fn set_size(&mut self, half_points: u16) -> Result<&mut Self> {
        check_size(half_points)?;
        self.properties.size = Some(half_points);
        Ok(self)
    }

    /// Font size in points (rounded to the nearest half-point)
    pub fn set_size_points(&mut self, points: f64) -> Result<&mut Self> {
        let half_points = (points * 2.0).round();
        if !(f64::from(MIN_HALF_POINTS)..=f64::from(MAX_HALF_POINTS)).contains(&half_points) {
            return Err(DocxError::validation(
                "size",
                format!("{points}pt is outside 1..=1638"),
            ));
        }
        self.set_size(half_points as u16)
    }

    pub fn set_font(&mut self, font: Font) -> Result<&mut Self> {
        font.validate()?;
        self.properties.font = Some(font);
        Ok(self)
    }

    /// Set the Latin font name, keeping any east-asian/complex-script names
    pub fn set_font_name(&mut self, name: &str) -> Result<&mut Self> {
        let mut font = self.properties.font.clone().unwrap_or_default();
        font.name = name.to_string();
        self.set_font(font)
    }

    /// Character style ID (not checked against the registry)
    pub fn set_style(&mut self, style: &str) -> Result<&mut Self> {
        check_style(Some(style))?;
        self.properties.style = Some(style.to_string());
        Ok(self)
    }

    pub fn clear_style(&mut self) -> &mut Self {
        self.properties.style = None;
        self
    }

    /// Fields embedded after the run's content
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    /// Embed a field after the run's content, sharing its formatting
    pub fn add_field(&mut self, mut field: Field) -> &mut Field {
        field.assign_id(self.ids.next(IdKind::Field));
        self.fields.push(field);
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }
}

fn check_size(half_points: u16) -> Result<()> {
    if !(MIN_HALF_POINTS..=MAX_HALF_POINTS).contains(&half_points) {
        return Err(DocxError::validation(
            "size",
            format!("{half_points} half-points is outside {MIN_HALF_POINTS}..={MAX_HALF_POINTS}"),
        ));
    }
    Ok(())
}

fn check_style(style: Option<&str>) -> Result<()> {
    match style {
        Some(style) if style.trim().is_empty() => Err(DocxError::validation(
            "style",
            "style id must not be empty",
        )),
        _ => Ok(()),
    }
}
