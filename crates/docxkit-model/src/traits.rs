//! Capabilities shared across entity types

use crate::document::Document;
use crate::error::Result;
use crate::paragraph::Paragraph;
use crate::run::Run;
use crate::section::HeaderFooter;
use crate::table::{Table, TableCell};

/// Containers that hold a sequence of paragraphs
///
/// Implemented by [`Document`] (top-level body paragraphs), [`HeaderFooter`]
/// and [`TableCell`].
pub trait ContentHolder {
    fn add_paragraph(&mut self) -> &mut Paragraph;

    /// Paragraphs directly in this container, in order
    fn paragraph_list(&self) -> Vec<&Paragraph>;

    /// Append a paragraph with a single text run
    fn add_text_paragraph(&mut self, text: &str) -> &mut Paragraph {
        let paragraph = self.add_paragraph();
        paragraph.add_run(text);
        paragraph
    }

    /// Paragraph texts joined by newlines
    fn plain_text(&self) -> String {
        self.paragraph_list()
            .into_iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ContentHolder for Document {
    fn add_paragraph(&mut self) -> &mut Paragraph {
        Document::add_paragraph(self)
    }

    fn paragraph_list(&self) -> Vec<&Paragraph> {
        self.paragraphs().collect()
    }
}

impl ContentHolder for HeaderFooter {
    fn add_paragraph(&mut self) -> &mut Paragraph {
        HeaderFooter::add_paragraph(self)
    }

    fn paragraph_list(&self) -> Vec<&Paragraph> {
        self.paragraphs().iter().collect()
    }
}

impl ContentHolder for TableCell {
    fn add_paragraph(&mut self) -> &mut Paragraph {
        TableCell::add_paragraph(self)
    }

    fn paragraph_list(&self) -> Vec<&Paragraph> {
        self.paragraphs().collect()
    }
}

/// Entities carrying a style reference
pub trait Styled {
    fn style_id(&self) -> Option<&str>;

    fn apply_style(&mut self, style: &str) -> Result<()>;
}

impl Styled for Paragraph {
    fn style_id(&self) -> Option<&str> {
        self.style()
    }

    fn apply_style(&mut self, style: &str) -> Result<()> {
        self.set_style(style).map(|_| ())
    }
}

impl Styled for Run {
    fn style_id(&self) -> Option<&str> {
        self.properties().style.as_deref()
    }

    fn apply_style(&mut self, style: &str) -> Result<()> {
        self.set_style(style).map(|_| ())
    }
}

impl Styled for Table {
    fn style_id(&self) -> Option<&str> {
        self.style()
    }

    fn apply_style(&mut self, style: &str) -> Result<()> {
        self.set_style(Some(style)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill<C: ContentHolder>(holder: &mut C) {
        holder.add_text_paragraph("one");
        holder.add_text_paragraph("two");
    }

    #[test]
    fn test_content_holders_share_behaviour() {
        let mut doc = Document::new();
        fill(&mut doc);
        assert_eq!(doc.plain_text(), "one\ntwo");

        let mut table = doc.context().new_table(1, 1).unwrap();
        let cell = table.cell_mut(0, 0).unwrap();
        fill(&mut *cell);
        // the initial empty paragraph stays first
        assert_eq!(cell.plain_text(), "\none\ntwo");

        let footer = doc
            .last_section_mut()
            .footer(crate::section::FooterType::Default)
            .unwrap();
        fill(&mut *footer);
        assert_eq!(footer.paragraph_list().len(), 2);
    }

    #[test]
    fn test_styled_entities() {
        let mut doc = Document::new();
        let paragraph = doc.add_paragraph();
        paragraph.apply_style("Quote").unwrap();
        assert_eq!(paragraph.style_id(), Some("Quote"));
        let run = paragraph.add_run("x");
        assert!(run.apply_style("").is_err());
        run.apply_style("Strong").unwrap();
        assert_eq!(run.style_id(), Some("Strong"));
    }
}
