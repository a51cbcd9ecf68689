//! Style registry
//!
//! Holds the built-in catalog Word assumes plus user-defined styles. Styles
//! inherit through `basedOn`; the chain is recorded here and written out as
//! is, so consumers perform the cascade themselves.

use std::collections::{HashMap, HashSet};

use log::debug;
use parking_lot::RwLock;

use crate::error::{DocxError, Result};
use crate::format::{Alignment, Border, Borders, Color, Font, LineSpacing, UnderlineStyle};
use crate::paragraph::{Indentation, ParagraphProperties};
use crate::run::RunProperties;

/// Type of style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

impl StyleType {
    /// The `w:type` attribute value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Character => "character",
            Self::Table => "table",
            Self::Numbering => "numbering",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "paragraph" => Some(Self::Paragraph),
            "character" => Some(Self::Character),
            "table" => Some(Self::Table),
            "numbering" => Some(Self::Numbering),
            _ => None,
        }
    }
}

/// A style definition
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Style ID used in document references
    pub id: String,
    /// Display name
    pub name: String,
    pub style_type: StyleType,
    /// Parent style ID
    pub based_on: Option<String>,
    /// Style for the following paragraph
    pub next: Option<String>,
    pub ui_priority: Option<u32>,
    /// Shown in the quick style gallery
    pub quick_format: bool,
    /// Paragraph formatting (paragraph and table styles)
    pub paragraph: ParagraphProperties,
    /// Run formatting
    pub run: RunProperties,
    /// Table borders (table styles)
    pub table_borders: Option<Borders>,
    builtin: bool,
}

impl Style {
    /// A new user-defined style
    pub fn new(id: impl Into<String>, name: impl Into<String>, style_type: StyleType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            style_type,
            based_on: None,
            next: None,
            ui_priority: None,
            quick_format: false,
            paragraph: ParagraphProperties::default(),
            run: RunProperties::default(),
            table_borders: None,
            builtin: false,
        }
    }

    pub fn paragraph_style(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, StyleType::Paragraph)
    }

    pub fn character_style(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, StyleType::Character)
    }

    pub fn table_style(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, StyleType::Table)
    }

    pub fn based_on(mut self, parent: impl Into<String>) -> Self {
        self.based_on = Some(parent.into());
        self
    }

    pub fn next(mut self, next: impl Into<String>) -> Self {
        self.next = Some(next.into());
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.ui_priority = Some(priority);
        self
    }

    pub fn quick(mut self) -> Self {
        self.quick_format = true;
        self
    }

    pub fn with_run(mut self, run: RunProperties) -> Self {
        self.run = run;
        self
    }

    pub fn with_paragraph(mut self, paragraph: ParagraphProperties) -> Self {
        self.paragraph = paragraph;
        self
    }

    /// Whether this style belongs to the seeded catalog
    pub fn is_builtin(&self) -> bool {
        self.builtin
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(DocxError::validation("style_id", "style id must not be empty"));
        }
        if self.based_on.as_deref() == Some(self.id.as_str()) {
            return Err(DocxError::validation(
                "based_on",
                format!("style {} cannot be based on itself", self.id),
            ));
        }
        self.paragraph.validate()?;
        if let Some(font) = &self.run.font {
            font.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Catalog {
    order: Vec<String>,
    styles: HashMap<String, Style>,
    defaults: HashMap<StyleType, String>,
}

impl Catalog {
    /// Would giving `id` the parent `parent` close an inheritance loop?
    fn creates_cycle(&self, id: &str, parent: Option<&str>) -> bool {
        let mut seen = HashSet::new();
        let mut current = parent;
        while let Some(ancestor) = current {
            if ancestor == id {
                return true;
            }
            if !seen.insert(ancestor) {
                return false;
            }
            current = self
                .styles
                .get(ancestor)
                .and_then(|style| style.based_on.as_deref());
        }
        false
    }
}

/// Registry of the styles available to one document
#[derive(Debug)]
pub struct StyleRegistry {
    catalog: RwLock<Catalog>,
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleRegistry {
    /// A registry seeded with the built-in catalog
    pub fn new() -> Self {
        let mut catalog = Catalog {
            order: Vec::new(),
            styles: HashMap::new(),
            defaults: HashMap::new(),
        };
        for mut style in builtin_styles() {
            style.builtin = true;
            catalog.order.push(style.id.clone());
            catalog.styles.insert(style.id.clone(), style);
        }
        for (style_type, id) in DEFAULT_STYLES {
            catalog.defaults.insert(style_type, id.to_string());
        }
        Self {
            catalog: RwLock::new(catalog),
        }
    }

    /// Register a user-defined style
    pub fn add_style(&self, style: Style) -> Result<()> {
        style.validate()?;
        let mut catalog = self.catalog.write();
        if let Some(existing) = catalog.styles.get(&style.id) {
            let reason = if existing.builtin {
                format!("{} is a built-in style", style.id)
            } else {
                format!("style {} already exists", style.id)
            };
            return Err(DocxError::validation("style_id", reason));
        }
        if catalog.creates_cycle(&style.id, style.based_on.as_deref()) {
            return Err(cycle_error(&style.id));
        }
        debug!("registered style {}", style.id);
        catalog.order.push(style.id.clone());
        catalog.styles.insert(style.id.clone(), Style { builtin: false, ..style });
        Ok(())
    }

    /// Replace a user-defined style's definition
    pub fn update_style(&self, style: Style) -> Result<()> {
        style.validate()?;
        let mut catalog = self.catalog.write();
        check_mutable(&catalog, &style.id)?;
        if catalog.creates_cycle(&style.id, style.based_on.as_deref()) {
            return Err(cycle_error(&style.id));
        }
        let id = style.id.clone();
        catalog.styles.insert(id, Style { builtin: false, ..style });
        Ok(())
    }

    /// Change (or clear) the parent of a user-defined style
    pub fn set_based_on(&self, id: &str, parent: Option<&str>) -> Result<()> {
        let mut catalog = self.catalog.write();
        check_mutable(&catalog, id)?;
        if catalog.creates_cycle(id, parent) {
            return Err(cycle_error(id));
        }
        if let Some(style) = catalog.styles.get_mut(id) {
            style.based_on = parent.map(str::to_string);
        }
        Ok(())
    }

    /// Remove a user-defined style
    pub fn remove_style(&self, id: &str) -> Result<Style> {
        let mut catalog = self.catalog.write();
        check_mutable(&catalog, id)?;
        let removed = catalog
            .styles
            .remove(id)
            .ok_or_else(|| DocxError::not_found("style", id))?;
        catalog.order.retain(|existing| existing != id);

        if catalog.defaults.get(&removed.style_type).map(String::as_str) == Some(id) {
            if let Some((_, builtin)) = DEFAULT_STYLES
                .iter()
                .find(|(style_type, _)| *style_type == removed.style_type)
            {
                catalog
                    .defaults
                    .insert(removed.style_type, builtin.to_string());
            }
        }
        Ok(removed)
    }

    /// Make `id` the default style for `style_type`
    pub fn set_default_style(&self, style_type: StyleType, id: &str) -> Result<()> {
        let mut catalog = self.catalog.write();
        let style = catalog
            .styles
            .get(id)
            .ok_or_else(|| DocxError::not_found("style", id))?;
        if style.style_type != style_type {
            return Err(DocxError::validation(
                "style_type",
                format!(
                    "style {id} is a {} style, not {}",
                    style.style_type.as_str(),
                    style_type.as_str()
                ),
            ));
        }
        catalog.defaults.insert(style_type, id.to_string());
        Ok(())
    }

    pub fn default_style(&self, style_type: StyleType) -> Option<String> {
        self.catalog.read().defaults.get(&style_type).cloned()
    }

    pub fn is_default(&self, id: &str) -> bool {
        self.catalog.read().defaults.values().any(|default| default == id)
    }

    pub fn is_builtin(&self, id: &str) -> bool {
        self.catalog
            .read()
            .styles
            .get(id)
            .is_some_and(|style| style.builtin)
    }

    pub fn has_style(&self, id: &str) -> bool {
        self.catalog.read().styles.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<Style> {
        self.catalog.read().styles.get(id).cloned()
    }

    /// All styles in registration order (built-ins first)
    pub fn all(&self) -> Vec<Style> {
        let catalog = self.catalog.read();
        catalog
            .order
            .iter()
            .filter_map(|id| catalog.styles.get(id).cloned())
            .collect()
    }

    pub fn by_type(&self, style_type: StyleType) -> Vec<Style> {
        self.all()
            .into_iter()
            .filter(|style| style.style_type == style_type)
            .collect()
    }

    /// User-defined styles in registration order
    pub fn custom_styles(&self) -> Vec<Style> {
        self.all().into_iter().filter(|style| !style.builtin).collect()
    }

    pub fn len(&self) -> usize {
        self.catalog.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The style followed by its ancestors, nearest first
    ///
    /// Stops at the first missing parent.
    pub fn resolve_chain(&self, id: &str) -> Vec<Style> {
        let catalog = self.catalog.read();
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(id);

        while let Some(style) = current.and_then(|id| catalog.styles.get(id)) {
            if !seen.insert(style.id.as_str()) {
                break;
            }
            chain.push(style.clone());
            current = style.based_on.as_deref();
        }
        chain
    }

    /// Style ID for a heading level (1..=9)
    pub fn heading_id(level: u8) -> Option<String> {
        (1..=9).contains(&level).then(|| format!("Heading{level}"))
    }
}

fn check_mutable(catalog: &Catalog, id: &str) -> Result<()> {
    match catalog.styles.get(id) {
        None => Err(DocxError::not_found("style", id)),
        Some(style) if style.builtin => Err(DocxError::validation(
            "style_id",
            format!("{id} is a built-in style and cannot be modified"),
        )),
        Some(_) => Ok(()),
    }
}

fn cycle_error(id: &str) -> DocxError {
    DocxError::validation(
        "based_on",
        format!("basedOn chain of {id} would form a cycle"),
    )
}

const DEFAULT_STYLES: [(StyleType, &str); 4] = [
    (StyleType::Paragraph, "Normal"),
    (StyleType::Character, "DefaultParagraphFont"),
    (StyleType::Table, "TableNormal"),
    (StyleType::Numbering, "NoList"),
];

const ACCENT: Color = Color::rgb(0x2F, 0x54, 0x96);
const ACCENT_DARK: Color = Color::rgb(0x1F, 0x37, 0x63);
const ACCENT_LIGHT: Color = Color::rgb(0x44, 0x72, 0xC4);

fn run_props(f: impl FnOnce(&mut RunProperties)) -> RunProperties {
    let mut props = RunProperties::default();
    f(&mut props);
    props
}

fn para_props(f: impl FnOnce(&mut ParagraphProperties)) -> ParagraphProperties {
    let mut props = ParagraphProperties::default();
    f(&mut props);
    props
}

fn heading(level: u8) -> Style {
    let (size, color, before) = match level {
        1 => (32, ACCENT, 240),
        2 => (26, ACCENT, 40),
        3 => (24, ACCENT_DARK, 40),
        _ => (22, ACCENT, 40),
    };
    Style::paragraph_style(format!("Heading{level}"), format!("heading {level}"))
        .based_on("Normal")
        .next("Normal")
        .with_priority(9)
        .quick()
        .with_paragraph(para_props(|p| {
            p.keep_next = true;
            p.keep_lines = true;
            p.spacing_before = Some(before);
            p.spacing_after = Some(0);
            p.outline_level = Some(level - 1);
        }))
        .with_run(run_props(|r| {
            r.font = Some(Font::new("Calibri Light"));
            r.size = Some(size);
            r.color = Some(color);
            r.italic = level == 4 || level == 7;
        }))
}

fn toc(level: u8) -> Style {
    Style::paragraph_style(format!("TOC{level}"), format!("toc {level}"))
        .based_on("Normal")
        .next("Normal")
        .with_priority(39)
        .with_paragraph(para_props(|p| {
            p.spacing_after = Some(100);
            p.indentation.left = 220 * (i32::from(level) - 1);
        }))
}

fn quote(id: &str, name: &str, color: Color, priority: u32) -> Style {
    Style::paragraph_style(id, name)
        .based_on("Normal")
        .next("Normal")
        .with_priority(priority)
        .quick()
        .with_paragraph(para_props(|p| {
            p.alignment = Some(Alignment::Center);
            p.spacing_before = Some(200);
            p.spacing_after = Some(160);
            p.indentation = Indentation {
                left: 864,
                right: 864,
                ..Indentation::default()
            };
        }))
        .with_run(run_props(|r| {
            r.italic = true;
            r.color = Some(color);
        }))
}

fn compact(id: &str, name: &str, priority: u32) -> Style {
    Style::paragraph_style(id, name)
        .based_on("Normal")
        .with_priority(priority)
        .with_paragraph(para_props(|p| {
            p.spacing_after = Some(0);
            p.line_spacing = Some(LineSpacing::single());
        }))
}

fn character(id: &str, name: &str, priority: u32, f: impl FnOnce(&mut RunProperties)) -> Style {
    Style::character_style(id, name)
        .based_on("DefaultParagraphFont")
        .with_priority(priority)
        .with_run(run_props(f))
}

/// The catalog every registry starts with
fn builtin_styles() -> Vec<Style> {
    let mut styles = vec![Style::paragraph_style("Normal", "Normal")
        .with_priority(0)
        .quick()
        .with_paragraph(para_props(|p| {
            p.spacing_after = Some(160);
            p.line_spacing = Some(LineSpacing::auto(259));
        }))];

    styles.extend((1..=9).map(heading));
    styles.push(
        Style::paragraph_style("Title", "Title")
            .based_on("Normal")
            .next("Normal")
            .with_priority(10)
            .quick()
            .with_paragraph(para_props(|p| {
                p.spacing_after = Some(0);
                p.line_spacing = Some(LineSpacing::single());
            }))
            .with_run(run_props(|r| {
                r.font = Some(Font::new("Calibri Light"));
                r.size = Some(56);
            })),
    );
    styles.push(
        Style::paragraph_style("Subtitle", "Subtitle")
            .based_on("Normal")
            .next("Normal")
            .with_priority(11)
            .quick()
            .with_run(run_props(|r| {
                r.color = Some(Color::rgb(0x5A, 0x5A, 0x5A));
                r.size = Some(22);
            })),
    );
    styles.push(quote("Quote", "Quote", Color::rgb(0x40, 0x40, 0x40), 29));
    styles.push(quote("IntenseQuote", "Intense Quote", ACCENT_LIGHT, 30));
    styles.push(
        Style::paragraph_style("ListParagraph", "List Paragraph")
            .based_on("Normal")
            .with_priority(34)
            .quick()
            .with_paragraph(para_props(|p| p.indentation.left = 720)),
    );
    styles.push(
        heading(1)
            .with_priority(39)
            .with_paragraph(para_props(|p| {
                p.keep_next = true;
                p.spacing_before = Some(240);
                p.spacing_after = Some(0);
            })),
    );
    if let Some(toc_heading) = styles.last_mut() {
        toc_heading.id = "TOCHeading".into();
        toc_heading.name = "TOC Heading".into();
        toc_heading.based_on = Some("Heading1".into());
    }
    styles.extend((1..=9).map(toc));
    styles.push(compact("Header", "header", 99));
    styles.push(compact("Footer", "footer", 99));
    styles.push(
        Style::paragraph_style("BodyText", "Body Text")
            .based_on("Normal")
            .with_priority(99)
            .with_paragraph(para_props(|p| p.spacing_after = Some(120))),
    );
    styles.push(compact("NoSpacing", "No Spacing", 1).quick());
    styles.push(
        Style::paragraph_style("Caption", "caption")
            .based_on("Normal")
            .next("Normal")
            .with_priority(35)
            .quick()
            .with_paragraph(para_props(|p| p.spacing_after = Some(200)))
            .with_run(run_props(|r| {
                r.italic = true;
                r.size = Some(18);
                r.color = Some(Color::rgb(0x44, 0x54, 0x6A));
            })),
    );

    styles.push(Style::character_style("DefaultParagraphFont", "Default Paragraph Font").with_priority(1));
    styles.push(character("Emphasis", "Emphasis", 20, |r| r.italic = true).quick());
    styles.push(character("Strong", "Strong", 22, |r| r.bold = true).quick());
    styles.push(character("Hyperlink", "Hyperlink", 99, |r| {
        r.color = Some(Color::rgb(0x05, 0x63, 0xC1));
        r.underline = UnderlineStyle::Single;
    }));
    styles.push(character("FollowedHyperlink", "FollowedHyperlink", 99, |r| {
        r.color = Some(Color::rgb(0x95, 0x4F, 0x72));
        r.underline = UnderlineStyle::Single;
    }));
    styles.push(
        character("SubtleEmphasis", "Subtle Emphasis", 19, |r| {
            r.italic = true;
            r.color = Some(Color::rgb(0x40, 0x40, 0x40));
        })
        .quick(),
    );
    styles.push(
        character("IntenseEmphasis", "Intense Emphasis", 21, |r| {
            r.italic = true;
            r.color = Some(ACCENT_LIGHT);
        })
        .quick(),
    );

    styles.push(Style::table_style("TableNormal", "Normal Table").with_priority(99));
    let mut grid = Style::table_style("TableGrid", "Table Grid")
        .based_on("TableNormal")
        .with_priority(39)
        .with_paragraph(para_props(|p| {
            p.spacing_after = Some(0);
            p.line_spacing = Some(LineSpacing::single());
        }));
    grid.table_borders = Some(Borders::grid(Border::default()));
    styles.push(grid);

    styles.push(Style::new("NoList", "No List", StyleType::Numbering).with_priority(99));
    styles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_builtin_catalog() {
        let registry = StyleRegistry::new();
        for id in [
            "Normal", "Heading1", "Heading9", "Title", "Subtitle", "Quote", "IntenseQuote",
            "ListParagraph", "TOC1", "TOC9", "TOCHeading", "Header", "Footer", "BodyText",
            "NoSpacing", "Caption", "DefaultParagraphFont", "Emphasis", "Strong", "Hyperlink",
            "FollowedHyperlink", "TableNormal", "TableGrid", "NoList",
        ] {
            assert!(registry.is_builtin(id), "{id} should be built in");
        }
        assert_eq!(registry.default_style(StyleType::Paragraph).as_deref(), Some("Normal"));
        assert_eq!(registry.default_style(StyleType::Table).as_deref(), Some("TableNormal"));

        let heading = registry.get("Heading2").unwrap();
        assert_eq!(heading.paragraph.outline_level, Some(1));
        assert_eq!(heading.based_on.as_deref(), Some("Normal"));
        assert_eq!(registry.get("TOCHeading").unwrap().based_on.as_deref(), Some("Heading1"));
    }

    #[test]
    fn test_builtins_are_protected() {
        let registry = StyleRegistry::new();
        let err = registry
            .add_style(Style::paragraph_style("Normal", "Mine"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(registry.remove_style("Normal").is_err());
        assert!(registry
            .update_style(Style::paragraph_style("Heading1", "h"))
            .is_err());
        assert!(registry.set_based_on("Title", None).is_err());
    }

    #[test]
    fn test_custom_style_added_once() {
        let registry = StyleRegistry::new();
        let style = Style::paragraph_style("Callout", "Callout").based_on("Normal");
        registry.add_style(style.clone()).unwrap();
        let err = registry.add_style(style).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert!(registry.has_style("Callout"));
        assert!(!registry.is_builtin("Callout"));
    }

    #[test]
    fn test_add_style_rejects_empty_id() {
        let registry = StyleRegistry::new();
        assert!(registry.add_style(Style::paragraph_style(" ", "blank")).is_err());
    }

    #[test]
    fn test_remove_style() {
        let registry = StyleRegistry::new();
        registry
            .add_style(Style::character_style("Code", "Code"))
            .unwrap();
        registry.set_default_style(StyleType::Character, "Code").unwrap();
        registry.remove_style("Code").unwrap();
        assert!(!registry.has_style("Code"));
        assert_eq!(
            registry.default_style(StyleType::Character).as_deref(),
            Some("DefaultParagraphFont")
        );
        assert_eq!(registry.remove_style("Code").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_set_default_style_checks_type() {
        let registry = StyleRegistry::new();
        assert!(registry.set_default_style(StyleType::Paragraph, "Strong").is_err());
        assert_eq!(
            registry
                .set_default_style(StyleType::Paragraph, "Missing")
                .unwrap_err()
                .kind(),
            ErrorKind::NotFound
        );
        registry.set_default_style(StyleType::Paragraph, "BodyText").unwrap();
        assert!(registry.is_default("BodyText"));
    }

    #[test]
    fn test_cycles_rejected() {
        let registry = StyleRegistry::new();
        registry.add_style(Style::paragraph_style("A", "A")).unwrap();
        registry
            .add_style(Style::paragraph_style("B", "B").based_on("A"))
            .unwrap();
        registry
            .add_style(Style::paragraph_style("C", "C").based_on("B"))
            .unwrap();

        assert!(registry.set_based_on("A", Some("C")).is_err());
        assert!(registry
            .add_style(Style::paragraph_style("D", "D").based_on("D"))
            .is_err());
        assert!(registry
            .update_style(Style::paragraph_style("A", "A").based_on("B"))
            .is_err());
        assert!(registry.get("A").unwrap().based_on.is_none());
    }

    #[test]
    fn test_resolve_chain() {
        let registry = StyleRegistry::new();
        registry
            .add_style(Style::paragraph_style("Fancy", "Fancy").based_on("Heading1"))
            .unwrap();
        let chain: Vec<_> = registry
            .resolve_chain("Fancy")
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(chain, ["Fancy", "Heading1", "Normal"]);
        assert!(registry.resolve_chain("Nope").is_empty());
    }

    #[test]
    fn test_concurrent_lookups() {
        let registry = StyleRegistry::new();
        std::thread::scope(|scope| {
            for i in 0..4 {
                let registry = &registry;
                scope.spawn(move || {
                    registry
                        .add_style(Style::paragraph_style(format!("Custom{i}"), "c"))
                        .unwrap();
                    for _ in 0..100 {
                        assert!(registry.has_style("Normal"));
                    }
                });
            }
        });
        assert_eq!(registry.custom_styles().len(), 4);
    }
}
