//! Shared formatting value types
//!
//! Enumerations map one-to-one onto WordprocessingML tokens; `as_str` gives
//! the token written to XML and `from_token` parses it back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DocxError, Result};
use crate::units::MAX_TWIPS;

/// 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);
    pub const RED: Color = Color::rgb(0xFF, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 0x80, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 0xFF);

    /// Create a color from components
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a 6-digit hex string, with or without a leading `#`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DocxError::validation(
                "color",
                format!("expected 6 hex digits, got {hex:?}"),
            ));
        }
        let component = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        match (component(0), component(2), component(4)) {
            (Ok(r), Ok(g), Ok(b)) => Ok(Self { r, g, b }),
            _ => Err(DocxError::validation("color", format!("bad hex {hex:?}"))),
        }
    }

    /// Uppercase 6-digit hex form used by OOXML (`"FF0000"`)
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = DocxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Declares a token-backed enum with `as_str`/`from_token`
macro_rules! ooxml_token_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// The OOXML token for this value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $token ),+
                }
            }

            /// Parse an OOXML token
            pub fn from_token(token: &str) -> Option<Self> {
                match token {
                    $( $token => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::DocxError;

            fn from_str(s: &str) -> $crate::Result<Self> {
                Self::from_token(s).ok_or_else(|| {
                    $crate::DocxError::validation(stringify!($name), format!("unknown token {s:?}"))
                })
            }
        }
    };
}

pub(crate) use ooxml_token_enum;

ooxml_token_enum! {
    /// Horizontal paragraph alignment
    Alignment {
        Left => "left",
        Center => "center",
        Right => "right",
        /// Justified
        Justify => "both",
        Distribute => "distribute",
    }
}

ooxml_token_enum! {
    /// Underline styles
    UnderlineStyle {
        None => "none",
        Single => "single",
        Words => "words",
        Double => "double",
        Thick => "thick",
        Dotted => "dotted",
        Dash => "dash",
        DotDash => "dotDash",
        DotDotDash => "dotDotDash",
        Wave => "wave",
    }
}

ooxml_token_enum! {
    /// Text highlight colors (the fixed OOXML palette)
    HighlightColor {
        None => "none",
        Black => "black",
        Blue => "blue",
        Cyan => "cyan",
        Green => "green",
        Magenta => "magenta",
        Red => "red",
        Yellow => "yellow",
        White => "white",
        DarkBlue => "darkBlue",
        DarkCyan => "darkCyan",
        DarkGreen => "darkGreen",
        DarkMagenta => "darkMagenta",
        DarkRed => "darkRed",
        DarkYellow => "darkYellow",
        DarkGray => "darkGray",
        LightGray => "lightGray",
    }
}

ooxml_token_enum! {
    /// Border line styles
    BorderStyle {
        None => "none",
        Single => "single",
        Thick => "thick",
        Double => "double",
        Dotted => "dotted",
        Dashed => "dashed",
        DotDash => "dotDash",
        DotDotDash => "dotDotDash",
        Triple => "triple",
        Wave => "wave",
    }
}

ooxml_token_enum! {
    /// Line spacing rule
    LineSpacingRule {
        /// Value in 240ths of a line
        Auto => "auto",
        /// Value in twips, exact
        Exact => "exact",
        /// Value in twips, minimum
        AtLeast => "atLeast",
    }
}

ooxml_token_enum! {
    /// Vertical alignment within a table cell
    VerticalAlignment {
        Top => "top",
        Center => "center",
        Bottom => "bottom",
    }
}

ooxml_token_enum! {
    /// Superscript / subscript run positioning
    VerticalPosition {
        Baseline => "baseline",
        Superscript => "superscript",
        Subscript => "subscript",
    }
}

ooxml_token_enum! {
    /// Shading fill patterns
    ShadingPattern {
        Clear => "clear",
        Solid => "solid",
        Percent10 => "pct10",
        Percent25 => "pct25",
        Percent50 => "pct50",
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::Left
    }
}

impl Default for UnderlineStyle {
    fn default() -> Self {
        Self::None
    }
}

impl Default for HighlightColor {
    fn default() -> Self {
        Self::None
    }
}

/// Paragraph line spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpacing {
    pub rule: LineSpacingRule,
    /// 240ths of a line for `Auto`, twips otherwise
    pub value: i32,
}

impl LineSpacing {
    pub fn single() -> Self {
        Self::auto(240)
    }

    pub fn one_and_half() -> Self {
        Self::auto(360)
    }

    pub fn double() -> Self {
        Self::auto(480)
    }

    /// Proportional spacing in 240ths of a line
    pub fn auto(value: i32) -> Self {
        Self {
            rule: LineSpacingRule::Auto,
            value,
        }
    }

    /// Exact spacing in twips
    pub fn exact(twips: i32) -> Self {
        Self {
            rule: LineSpacingRule::Exact,
            value: twips,
        }
    }

    /// Minimum spacing in twips
    pub fn at_least(twips: i32) -> Self {
        Self {
            rule: LineSpacingRule::AtLeast,
            value: twips,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.value <= 0 || self.value > MAX_TWIPS {
            return Err(DocxError::validation(
                "line_spacing",
                format!("value {} must be in 1..={MAX_TWIPS}", self.value),
            ));
        }
        Ok(())
    }
}

/// A single border edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Border {
    pub style: BorderStyle,
    /// Width in eighths of a point (2..=96)
    pub size: u32,
    pub color: Color,
    /// Spacing from text in points
    pub space: u32,
}

impl Default for Border {
    fn default() -> Self {
        Self {
            style: BorderStyle::Single,
            size: 4,
            color: Color::BLACK,
            space: 0,
        }
    }
}

impl Border {
    pub fn new(style: BorderStyle, size: u32, color: Color) -> Self {
        Self {
            style,
            size,
            color,
            space: 0,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.style != BorderStyle::None && !(2..=96).contains(&self.size) {
            return Err(DocxError::validation(
                "border",
                format!("size {} must be in 2..=96 eighths of a point", self.size),
            ));
        }
        if self.space > 31 {
            return Err(DocxError::validation(
                "border",
                format!("space {} must be at most 31 points", self.space),
            ));
        }
        Ok(())
    }
}

/// Border set for paragraphs, tables and cells
///
/// `inside_h`/`inside_v` apply to tables; paragraphs use `between`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Borders {
    pub top: Option<Border>,
    pub left: Option<Border>,
    pub bottom: Option<Border>,
    pub right: Option<Border>,
    pub between: Option<Border>,
    pub inside_h: Option<Border>,
    pub inside_v: Option<Border>,
}

impl Borders {
    /// The same border on all four outer edges
    pub fn all(border: Border) -> Self {
        Self {
            top: Some(border),
            left: Some(border),
            bottom: Some(border),
            right: Some(border),
            ..Default::default()
        }
    }

    /// Outer edges plus inside grid lines (tables)
    pub fn grid(border: Border) -> Self {
        Self {
            inside_h: Some(border),
            inside_v: Some(border),
            ..Self::all(border)
        }
    }

    /// Edges in OOXML element order, with their element names
    pub fn edges(&self) -> impl Iterator<Item = (&'static str, &Border)> {
        [
            ("top", &self.top),
            ("left", &self.left),
            ("bottom", &self.bottom),
            ("right", &self.right),
            ("between", &self.between),
            ("insideH", &self.inside_h),
            ("insideV", &self.inside_v),
        ]
        .into_iter()
        .filter_map(|(name, edge)| edge.as_ref().map(|b| (name, b)))
    }

    pub fn is_empty(&self) -> bool {
        self.edges().next().is_none()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (_, border) in self.edges() {
            border.validate()?;
        }
        Ok(())
    }
}

/// Font family names for the three script classes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Font {
    /// Latin text (`w:ascii` / `w:hAnsi`)
    pub name: String,
    /// East-Asian text (`w:eastAsia`)
    pub east_asia: Option<String>,
    /// Complex-script text (`w:cs`)
    pub complex_script: Option<String>,
}

impl Font {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            east_asia: None,
            complex_script: None,
        }
    }

    pub fn with_east_asia(mut self, name: impl Into<String>) -> Self {
        self.east_asia = Some(name.into());
        self
    }

    pub fn with_complex_script(mut self, name: impl Into<String>) -> Self {
        self.complex_script = Some(name.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let names = std::iter::once(Some(&self.name))
            .chain([self.east_asia.as_ref(), self.complex_script.as_ref()])
            .flatten();
        for name in names {
            if name.trim().is_empty() {
                return Err(DocxError::validation("font", "font name must not be empty"));
            }
            if name.chars().count() > 31 {
                return Err(DocxError::validation(
                    "font",
                    format!("font name {name:?} exceeds 31 characters"),
                ));
            }
        }
        Ok(())
    }
}

/// Background shading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shading {
    pub fill: Color,
    pub pattern: ShadingPattern,
    pub color: Option<Color>,
}

impl Shading {
    /// Plain background fill
    pub fn solid_fill(fill: Color) -> Self {
        Self {
            fill,
            pattern: ShadingPattern::Clear,
            color: None,
        }
    }
}
