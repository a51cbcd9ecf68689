//! List definitions backing `word/numbering.xml`

use crate::error::{DocxError, Result};
use crate::format::ooxml_token_enum;
use crate::paragraph::MAX_LIST_LEVEL;

ooxml_token_enum! {
    /// Number format of a list level (`w:numFmt`)
    NumberFormat {
        Bullet => "bullet",
        Decimal => "decimal",
        LowerLetter => "lowerLetter",
        UpperLetter => "upperLetter",
        LowerRoman => "lowerRoman",
        UpperRoman => "upperRoman",
    }
}

/// Preset list styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Bullet,
    /// 1. a. i. nesting
    Decimal,
    LowerLetter,
    UpperRoman,
}

const BULLETS: [&str; 3] = ["\u{2022}", "o", "\u{25aa}"];

/// One level of a list definition (`w:lvl`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLevel {
    pub level: u8,
    pub format: NumberFormat,
    /// Level text, `%1.` style placeholders or a bullet glyph
    pub text: String,
    pub start: u32,
    /// Left indent in twips
    pub indent: i32,
    pub hanging: i32,
}

impl ListLevel {
    fn preset(kind: ListKind, level: u8) -> Self {
        let format = match (kind, level % 3) {
            (ListKind::Bullet, _) => NumberFormat::Bullet,
            (ListKind::Decimal, 0) => NumberFormat::Decimal,
            (ListKind::Decimal, 1) => NumberFormat::LowerLetter,
            (ListKind::Decimal, _) => NumberFormat::LowerRoman,
            (ListKind::LowerLetter, _) => NumberFormat::LowerLetter,
            (ListKind::UpperRoman, _) => NumberFormat::UpperRoman,
        };
        let text = match format {
            NumberFormat::Bullet => BULLETS[usize::from(level) % BULLETS.len()].to_string(),
            _ => format!("%{}.", level + 1),
        };
        Self {
            level,
            format,
            text,
            start: 1,
            indent: 720 * (i32::from(level) + 1),
            hanging: 360,
        }
    }
}

/// An abstract list definition and the concrete instance pointing at it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListDefinition {
    pub abstract_id: u32,
    /// Value paragraphs store in `w:numId`
    pub num_id: u32,
    pub kind: Option<ListKind>,
    pub levels: Vec<ListLevel>,
}

impl ListDefinition {
    pub fn level(&self, level: u8) -> Option<&ListLevel> {
        self.levels.iter().find(|l| l.level == level)
    }
}

/// All lists of a document
#[derive(Debug, Clone, Default)]
pub struct NumberingCatalog {
    definitions: Vec<ListDefinition>,
}

impl NumberingCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a preset list with all nine levels; returns its num id
    pub fn add_list(&mut self, kind: ListKind) -> u32 {
        let levels = (0..=MAX_LIST_LEVEL)
            .map(|level| ListLevel::preset(kind, level))
            .collect();
        self.push(Some(kind), levels)
    }

    /// Add a list from explicit levels (levels must be distinct and in 0..=8)
    pub fn add_custom(&mut self, levels: Vec<ListLevel>) -> Result<u32> {
        if levels.is_empty() {
            return Err(DocxError::validation("levels", "a list needs at least one level"));
        }
        for (i, level) in levels.iter().enumerate() {
            if level.level > MAX_LIST_LEVEL {
                return Err(DocxError::validation(
                    "levels",
                    format!("level {} is outside 0..={MAX_LIST_LEVEL}", level.level),
                ));
            }
            if levels[..i].iter().any(|other| other.level == level.level) {
                return Err(DocxError::validation(
                    "levels",
                    format!("level {} defined twice", level.level),
                ));
            }
        }
        Ok(self.push(None, levels))
    }

    fn push(&mut self, kind: Option<ListKind>, levels: Vec<ListLevel>) -> u32 {
        let abstract_id = self.definitions.len() as u32;
        let num_id = abstract_id + 1;
        self.definitions.push(ListDefinition {
            abstract_id,
            num_id,
            kind,
            levels,
        });
        num_id
    }

    pub fn get(&self, num_id: u32) -> Option<&ListDefinition> {
        self.definitions.iter().find(|d| d.num_id == num_id)
    }

    pub fn contains(&self, num_id: u32) -> bool {
        self.get(num_id).is_some()
    }

    pub fn definitions(&self) -> &[ListDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_have_nine_levels() {
        let mut catalog = NumberingCatalog::new();
        let bullets = catalog.add_list(ListKind::Bullet);
        let numbers = catalog.add_list(ListKind::Decimal);
        assert_eq!((bullets, numbers), (1, 2));

        let def = catalog.get(numbers).unwrap();
        assert_eq!(def.abstract_id, 1);
        assert_eq!(def.levels.len(), 9);
        assert_eq!(def.level(0).unwrap().format, NumberFormat::Decimal);
        assert_eq!(def.level(1).unwrap().format, NumberFormat::LowerLetter);
        assert_eq!(def.level(2).unwrap().text, "%3.");
        assert_eq!(def.level(8).unwrap().indent, 6480);

        let bullet = catalog.get(bullets).unwrap().level(0).unwrap();
        assert_eq!(bullet.text, "\u{2022}");
    }

    #[test]
    fn test_custom_levels_validated() {
        let mut catalog = NumberingCatalog::new();
        let level = ListLevel {
            level: 0,
            format: NumberFormat::UpperLetter,
            text: "%1)".into(),
            start: 1,
            indent: 720,
            hanging: 360,
        };
        assert!(catalog.add_custom(vec![]).is_err());
        assert!(catalog.add_custom(vec![level.clone(), level.clone()]).is_err());
        let bad = ListLevel { level: 9, ..level.clone() };
        assert!(catalog.add_custom(vec![bad]).is_err());
        assert_eq!(catalog.add_custom(vec![level]).unwrap(), 1);
        assert!(catalog.contains(1));
        assert!(!catalog.contains(2));
    }
}
