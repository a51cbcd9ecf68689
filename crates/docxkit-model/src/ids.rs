//! Per-document identifier generation
//!
//! Every entity class has its own monotonic counter. Counters are atomics so
//! independent subtrees can be built from several threads against the same
//! generator.

use std::sync::atomic::{AtomicU64, Ordering};

/// Entity classes that receive generated identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Paragraph,
    Run,
    Table,
    Row,
    Cell,
    Image,
    Relationship,
    Bookmark,
    Section,
    Header,
    Footer,
    Field,
    Hyperlink,
    /// Numeric `docPr` ids for drawings
    Drawing,
}

impl IdKind {
    const ALL: [IdKind; 14] = [
        IdKind::Paragraph,
        IdKind::Run,
        IdKind::Table,
        IdKind::Row,
        IdKind::Cell,
        IdKind::Image,
        IdKind::Relationship,
        IdKind::Bookmark,
        IdKind::Section,
        IdKind::Header,
        IdKind::Footer,
        IdKind::Field,
        IdKind::Hyperlink,
        IdKind::Drawing,
    ];

    /// String prefix used for this kind
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Paragraph => "para",
            Self::Run => "run",
            Self::Table => "tbl",
            Self::Row => "row",
            Self::Cell => "cell",
            Self::Image => "img",
            Self::Relationship => "rId",
            Self::Bookmark => "bm",
            Self::Section => "sect",
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Field => "fld",
            Self::Hyperlink => "link",
            Self::Drawing => "drawing",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Issues collision-free identifiers for one document
#[derive(Debug)]
pub struct IdGenerator {
    counters: [AtomicU64; IdKind::ALL.len()],
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Create a generator with every counter at zero
    pub fn new() -> Self {
        Self {
            counters: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Issue the next number for `kind`, starting at 1
    pub fn next_number(&self, kind: IdKind) -> u64 {
        self.counters[kind.index()].fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Issue the next identifier for `kind` (e.g. `"para3"`, `"rId7"`)
    pub fn next(&self, kind: IdKind) -> String {
        format!("{}{}", kind.prefix(), self.next_number(kind))
    }

    pub fn next_paragraph_id(&self) -> String {
        self.next(IdKind::Paragraph)
    }

    pub fn next_run_id(&self) -> String {
        self.next(IdKind::Run)
    }

    pub fn next_table_id(&self) -> String {
        self.next(IdKind::Table)
    }

    pub fn next_relationship_id(&self) -> String {
        self.next(IdKind::Relationship)
    }

    pub fn next_image_id(&self) -> String {
        self.next(IdKind::Image)
    }

    pub fn next_bookmark_id(&self) -> String {
        self.next(IdKind::Bookmark)
    }

    /// Last number issued for `kind` (0 if none)
    pub fn current(&self, kind: IdKind) -> u64 {
        self.counters[kind.index()].load(Ordering::Relaxed)
    }

    /// Ensure the next number issued for `kind` is greater than `used`
    pub fn advance_past(&self, kind: IdKind, used: u64) {
        self.counters[kind.index()].fetch_max(used, Ordering::Relaxed);
    }

    /// Advance past the numeric suffix of an identifier already in use
    ///
    /// Identifiers without a numeric suffix are ignored.
    pub fn observe(&self, kind: IdKind, id: &str) {
        if let Some(n) = numeric_suffix(id) {
            self.advance_past(kind, n);
        }
    }

    /// Zero every counter
    ///
    /// Requires exclusive access, so no shared handle can still be issuing IDs.
    pub fn reset(&mut self) {
        for counter in &mut self.counters {
            *counter.get_mut() = 0;
        }
    }
}

/// Extract the trailing decimal digits of an identifier ("rId12" -> 12)
pub fn numeric_suffix(id: &str) -> Option<u64> {
    let digits = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| &id[i..])?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_start_at_one_per_kind() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_paragraph_id(), "para1");
        assert_eq!(ids.next_paragraph_id(), "para2");
        assert_eq!(ids.next_run_id(), "run1");
        assert_eq!(ids.next_relationship_id(), "rId1");
    }

    #[test]
    fn test_concurrent_issuance_has_no_duplicates_or_gaps() {
        let ids = IdGenerator::new();
        let per_thread = 250;
        let threads = 8;

        let issued: Vec<Vec<String>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|_| {
                    scope.spawn(|| {
                        (0..per_thread)
                            .map(|_| ids.next_paragraph_id())
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let all: HashSet<String> = issued.into_iter().flatten().collect();
        assert_eq!(all.len(), per_thread * threads);
        for n in 1..=(per_thread * threads) {
            assert!(all.contains(&format!("para{n}")), "missing para{n}");
        }
    }

    #[test]
    fn test_advance_past_existing() {
        let ids = IdGenerator::new();
        ids.observe(IdKind::Relationship, "rId5");
        ids.observe(IdKind::Relationship, "rId2");
        ids.observe(IdKind::Relationship, "custom");
        assert_eq!(ids.next_relationship_id(), "rId6");
    }

    #[test]
    fn test_reset() {
        let mut ids = IdGenerator::new();
        ids.next(IdKind::Table);
        ids.next(IdKind::Table);
        ids.reset();
        assert_eq!(ids.current(IdKind::Table), 0);
        assert_eq!(ids.next_table_id(), "tbl1");
    }

    #[test]
    fn test_numeric_suffix() {
        assert_eq!(numeric_suffix("rId1"), Some(1));
        assert_eq!(numeric_suffix("image123"), Some(123));
        assert_eq!(numeric_suffix("rIdabc"), None);
        assert_eq!(numeric_suffix(""), None);
    }
}
