//! Tables: rows of cells holding paragraphs and nested tables

use crate::context::DocumentContext;
use crate::error::{DocxError, Result};
use crate::format::{Alignment, Borders, Shading, VerticalAlignment};
use crate::ids::IdKind;
use crate::paragraph::Paragraph;
use crate::units::check_positive_twips;

/// Row count accepted by [`Table::new`]
pub const MAX_ROWS: usize = 1000;

/// Column count accepted by [`Table::new`]
pub const MAX_COLS: usize = 63;

/// Usable width of a letter page with 1" margins, in twips
pub const DEFAULT_TABLE_WIDTH: i32 = 9360;

/// Width of a table or cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableWidth {
    #[default]
    Auto,
    /// Twips
    Dxa(i32),
    /// Fiftieths of a percent (5000 = 100%)
    Pct(u32),
}

impl TableWidth {
    /// `(w:w, w:type)` attribute values
    pub fn attrs(&self) -> (i64, &'static str) {
        match self {
            Self::Auto => (0, "auto"),
            Self::Dxa(twips) => (i64::from(*twips), "dxa"),
            Self::Pct(pct) => (i64::from(*pct), "pct"),
        }
    }

    pub fn from_attrs(value: i64, kind: &str) -> Self {
        match kind {
            "dxa" => Self::Dxa(value.clamp(0, i64::from(i32::MAX)) as i32),
            "pct" => Self::Pct(value.clamp(0, i64::from(u32::MAX)) as u32),
            _ => Self::Auto,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Dxa(twips) => check_positive_twips("width", *twips),
            Self::Pct(pct) if *pct > 5000 => Err(DocxError::validation(
                "width",
                format!("{pct} exceeds 5000 (100%)"),
            )),
            _ => Ok(()),
        }
    }
}

/// Vertical merge state of a cell (`w:vMerge`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalMerge {
    #[default]
    None,
    /// First cell of a vertically merged range
    Restart,
    /// Covered by the cell above
    Continue,
}

/// Row height rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightRule {
    AtLeast,
    Exact,
}

impl HeightRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtLeast => "atLeast",
            Self::Exact => "exact",
        }
    }
}

/// Block content of a cell
#[derive(Debug, Clone)]
pub enum CellContent {
    Paragraph(Paragraph),
    Table(Table),
}

/// A table cell (`w:tc`)
#[derive(Debug, Clone)]
pub struct TableCell {
    id: String,
    ctx: DocumentContext,
    content: Vec<CellContent>,
    grid_span: u32,
    vertical_merge: VerticalMerge,
    row_span: u32,
    col_span: u32,
    borders: Borders,
    shading: Option<Shading>,
    vertical_alignment: Option<VerticalAlignment>,
    width: Option<TableWidth>,
}

impl TableCell {
    /// A cell holding one empty paragraph (WordprocessingML requires one)
    fn new(ctx: DocumentContext) -> Self {
        let paragraph = Paragraph::new(ctx.clone());
        Self {
            id: ctx.ids().next(IdKind::Cell),
            ctx,
            content: vec![CellContent::Paragraph(paragraph)],
            grid_span: 1,
            vertical_merge: VerticalMerge::None,
            row_span: 1,
            col_span: 1,
            borders: Borders::default(),
            shading: None,
            vertical_alignment: None,
            width: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn content(&self) -> &[CellContent] {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut [CellContent] {
        &mut self.content
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(|item| match item {
            CellContent::Paragraph(p) => Some(p),
            CellContent::Table(_) => None,
        })
    }

    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.content.iter_mut().filter_map(|item| match item {
            CellContent::Paragraph(p) => Some(p),
            CellContent::Table(_) => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.content.iter().filter_map(|item| match item {
            CellContent::Table(t) => Some(t),
            CellContent::Paragraph(_) => None,
        })
    }

    /// First paragraph, created if the cell has none
    pub fn first_paragraph_mut(&mut self) -> &mut Paragraph {
        let index = self
            .content
            .iter()
            .position(|item| matches!(item, CellContent::Paragraph(_)));
        let index = match index {
            Some(index) => index,
            None => {
                self.content
                    .insert(0, CellContent::Paragraph(Paragraph::new(self.ctx.clone())));
                0
            }
        };
        match &mut self.content[index] {
            CellContent::Paragraph(p) => p,
            CellContent::Table(_) => unreachable!("index points at a paragraph"),
        }
    }

    pub fn add_paragraph(&mut self) -> &mut Paragraph {
        self.content
            .push(CellContent::Paragraph(Paragraph::new(self.ctx.clone())));
        match self.content.last_mut() {
            Some(CellContent::Paragraph(p)) => p,
            _ => unreachable!("just pushed a paragraph"),
        }
    }

    /// Nest a table inside this cell
    pub fn add_table(&mut self, rows: usize, cols: usize) -> Result<&mut Table> {
        let table = Table::new(self.ctx.clone(), rows, cols)?;
        self.content.push(CellContent::Table(table));
        match self.content.last_mut() {
            Some(CellContent::Table(t)) => Ok(t),
            _ => unreachable!("just pushed a table"),
        }
    }

    /// Replace the content with a single paragraph holding `text`
    pub fn set_text(&mut self, text: &str) -> &mut Paragraph {
        self.content.clear();
        let paragraph = self.add_paragraph();
        if !text.is_empty() {
            paragraph.add_run(text);
        }
        paragraph
    }

    pub fn text(&self) -> String {
        self.paragraphs()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Span `cols` grid columns and `rows` rows from this cell
    ///
    /// Both must be at least 1; rejected arguments leave the cell unchanged.
    pub fn merge(&mut self, cols: u32, rows: u32) -> Result<&mut Self> {
        if cols < 1 || rows < 1 {
            return Err(DocxError::validation(
                "merge",
                format!("cols ({cols}) and rows ({rows}) must both be at least 1"),
            ));
        }
        if cols as usize > MAX_COLS || rows as usize > MAX_ROWS {
            return Err(DocxError::validation(
                "merge",
                format!("span {cols}x{rows} exceeds {MAX_COLS}x{MAX_ROWS}"),
            ));
        }
        self.grid_span = cols;
        self.col_span = cols;
        self.row_span = rows;
        self.vertical_merge = if rows > 1 {
            VerticalMerge::Restart
        } else {
            VerticalMerge::None
        };
        Ok(self)
    }

    pub fn grid_span(&self) -> u32 {
        self.grid_span
    }

    pub fn vertical_merge(&self) -> VerticalMerge {
        self.vertical_merge
    }

    pub fn row_span(&self) -> u32 {
        self.row_span
    }

    pub fn col_span(&self) -> u32 {
        self.col_span
    }

    fn set_spans(&mut self, grid_span: u32, vertical_merge: VerticalMerge) {
        self.grid_span = grid_span.max(1);
        self.col_span = self.grid_span;
        self.vertical_merge = vertical_merge;
    }

    /// Set raw `w:gridSpan` / `w:vMerge` values, as read from a package
    pub fn set_merge_state(
        &mut self,
        grid_span: u32,
        vertical_merge: VerticalMerge,
    ) -> Result<&mut Self> {
        if grid_span < 1 || grid_span as usize > MAX_COLS {
            return Err(DocxError::validation(
                "grid_span",
                format!("{grid_span} is outside 1..={MAX_COLS}"),
            ));
        }
        self.set_spans(grid_span, vertical_merge);
        Ok(self)
    }

    /// Remove all content (a cell must get a paragraph before packaging)
    pub fn clear(&mut self) -> &mut Self {
        self.content.clear();
        self
    }

    /// Nest a table built from the same context
    pub fn attach_table(&mut self, table: Table) -> Result<&mut Table> {
        if !table.ctx.same_part(&self.ctx) {
            return Err(DocxError::validation(
                "table",
                "table was built for another document or part",
            ));
        }
        self.content.push(CellContent::Table(table));
        match self.content.last_mut() {
            Some(CellContent::Table(t)) => Ok(t),
            _ => unreachable!("just pushed a table"),
        }
    }

    pub fn borders(&self) -> &Borders {
        &self.borders
    }

    pub fn set_borders(&mut self, borders: Borders) -> Result<&mut Self> {
        borders.validate()?;
        self.borders = borders;
        Ok(self)
    }

    pub fn shading(&self) -> Option<&Shading> {
        self.shading.as_ref()
    }

    pub fn set_shading(&mut self, shading: Shading) -> &mut Self {
        self.shading = Some(shading);
        self
    }

    pub fn vertical_alignment(&self) -> Option<VerticalAlignment> {
        self.vertical_alignment
    }

    pub fn set_vertical_alignment(&mut self, alignment: VerticalAlignment) -> &mut Self {
        self.vertical_alignment = Some(alignment);
        self
    }

    pub fn width(&self) -> Option<TableWidth> {
        self.width
    }

    pub fn set_width(&mut self, width: TableWidth) -> Result<&mut Self> {
        width.validate()?;
        self.width = Some(width);
        Ok(self)
    }
}

/// A table row (`w:tr`)
#[derive(Debug, Clone)]
pub struct TableRow {
    id: String,
    ctx: DocumentContext,
    cells: Vec<TableCell>,
    height: Option<(i32, HeightRule)>,
    header: bool,
    cant_split: bool,
}

impl TableRow {
    fn new(ctx: &DocumentContext, cols: usize) -> Self {
        Self {
            id: ctx.ids().next(IdKind::Row),
            ctx: ctx.clone(),
            cells: (0..cols).map(|_| TableCell::new(ctx.clone())).collect(),
            height: None,
            header: false,
            cant_split: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a cell holding one empty paragraph
    pub fn append_cell(&mut self) -> Result<&mut TableCell> {
        if self.cells.len() >= MAX_COLS {
            return Err(DocxError::validation(
                "cols",
                format!("row already has {MAX_COLS} cells"),
            ));
        }
        self.cells.push(TableCell::new(self.ctx.clone()));
        let last = self.cells.len() - 1;
        Ok(&mut self.cells[last])
    }

    pub fn cells(&self) -> &[TableCell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [TableCell] {
        &mut self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&TableCell> {
        self.cells.get(index)
    }

    pub fn cell_mut(&mut self, index: usize) -> Option<&mut TableCell> {
        self.cells.get_mut(index)
    }

    /// Grid columns covered by this row
    pub fn grid_width(&self) -> usize {
        self.cells.iter().map(|c| c.grid_span as usize).sum()
    }

    pub fn height(&self) -> Option<(i32, HeightRule)> {
        self.height
    }

    pub fn set_height(&mut self, twips: i32, rule: HeightRule) -> Result<&mut Self> {
        check_positive_twips("row_height", twips)?;
        self.height = Some((twips, rule));
        Ok(self)
    }

    /// Repeat as a header row on each page
    pub fn is_header(&self) -> bool {
        self.header
    }

    pub fn set_header(&mut self, header: bool) -> &mut Self {
        self.header = header;
        self
    }

    pub fn cant_split(&self) -> bool {
        self.cant_split
    }

    pub fn set_cant_split(&mut self, cant_split: bool) -> &mut Self {
        self.cant_split = cant_split;
        self
    }
}

/// A table (`w:tbl`)
#[derive(Debug, Clone)]
pub struct Table {
    id: String,
    ctx: DocumentContext,
    rows: Vec<TableRow>,
    style: Option<String>,
    width: TableWidth,
    alignment: Option<Alignment>,
    borders: Borders,
    column_widths: Vec<i32>,
}

impl Table {
    /// A `rows` x `cols` grid of empty cells
    pub(crate) fn new(ctx: DocumentContext, rows: usize, cols: usize) -> Result<Self> {
        if !(1..=MAX_ROWS).contains(&rows) {
            return Err(DocxError::validation(
                "rows",
                format!("{rows} is outside 1..={MAX_ROWS}"),
            ));
        }
        if !(1..=MAX_COLS).contains(&cols) {
            return Err(DocxError::validation(
                "cols",
                format!("{cols} is outside 1..={MAX_COLS}"),
            ));
        }
        let mut table = Self::empty(ctx);
        table.rows = (0..rows).map(|_| TableRow::new(&table.ctx, cols)).collect();
        table.style = Some("TableGrid".to_string());
        Ok(table)
    }

    fn empty(ctx: DocumentContext) -> Self {
        Self {
            id: ctx.ids().next(IdKind::Table),
            ctx,
            rows: Vec::new(),
            style: None,
            width: TableWidth::Auto,
            alignment: None,
            borders: Borders::default(),
            column_widths: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn context(&self) -> &DocumentContext {
        &self.ctx
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [TableRow] {
        &mut self.rows
    }

    pub fn row(&self, index: usize) -> Option<&TableRow> {
        self.rows.get(index)
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut TableRow> {
        self.rows.get_mut(index)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row).and_then(|r| r.cell(col))
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row).and_then(|r| r.cell_mut(col))
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Grid columns of the widest row
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(TableRow::grid_width).max().unwrap_or(0)
    }

    /// Append a row sized to the current grid
    pub fn add_row(&mut self) -> Result<&mut TableRow> {
        if self.rows.len() >= MAX_ROWS {
            return Err(DocxError::validation(
                "rows",
                format!("table already has {MAX_ROWS} rows"),
            ));
        }
        let cols = self.column_count().max(1);
        self.rows.push(TableRow::new(&self.ctx, cols));
        let last = self.rows.len() - 1;
        Ok(&mut self.rows[last])
    }

    /// Append a row without cells, to be filled with [`TableRow::append_cell`]
    pub fn append_empty_row(&mut self) -> Result<&mut TableRow> {
        if self.rows.len() >= MAX_ROWS {
            return Err(DocxError::validation(
                "rows",
                format!("table already has {MAX_ROWS} rows"),
            ));
        }
        self.rows.push(TableRow::new(&self.ctx, 0));
        let last = self.rows.len() - 1;
        Ok(&mut self.rows[last])
    }

    /// Merge a block of cells anchored at (`row`, `col`)
    ///
    /// The anchor spans `cols` grid columns; the cells it covers in its row
    /// are removed. Each of the following `rows - 1` rows is merged the same
    /// way and marked as a vertical continuation. Indices are cell positions
    /// before the merge. The table is unchanged when validation fails.
    pub fn merge_cells(&mut self, row: usize, col: usize, cols: u32, rows: u32) -> Result<()> {
        if cols < 1 || rows < 1 {
            return Err(DocxError::validation(
                "merge",
                format!("cols ({cols}) and rows ({rows}) must both be at least 1"),
            ));
        }
        let (cols_n, rows_n) = (cols as usize, rows as usize);
        if row + rows_n > self.rows.len() {
            return Err(DocxError::validation(
                "merge",
                format!(
                    "rows {row}..{} exceed table of {} rows",
                    row + rows_n,
                    self.rows.len()
                ),
            ));
        }
        for (offset, r) in self.rows[row..row + rows_n].iter().enumerate() {
            if col + cols_n > r.cells.len() {
                return Err(DocxError::validation(
                    "merge",
                    format!(
                        "columns {col}..{} exceed the {} cells of row {}",
                        col + cols_n,
                        r.cells.len(),
                        row + offset
                    ),
                ));
            }
            if r.cells[col..col + cols_n].iter().any(|c| c.grid_span != 1) {
                return Err(DocxError::validation(
                    "merge",
                    format!("row {} already has merged cells in range", row + offset),
                ));
            }
        }

        for (offset, r) in self.rows[row..row + rows_n].iter_mut().enumerate() {
            let covered: Vec<TableCell> = r.cells.drain(col + 1..col + cols_n).collect();
            let anchor = &mut r.cells[col];
            if offset == 0 {
                anchor.merge(cols, rows)?;
                for cell in covered {
                    anchor.content.extend(cell.content.into_iter().filter(|item| {
                        !matches!(item, CellContent::Paragraph(p) if p.is_empty())
                    }));
                }
            } else {
                anchor.set_spans(cols, VerticalMerge::Continue);
            }
        }
        Ok(())
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    /// Table style ID; `None` for direct formatting only
    pub fn set_style(&mut self, style: Option<&str>) -> Result<&mut Self> {
        if matches!(style, Some(s) if s.trim().is_empty()) {
            return Err(DocxError::validation("style", "style id must not be empty"));
        }
        self.style = style.map(str::to_string);
        Ok(self)
    }

    pub fn width(&self) -> TableWidth {
        self.width
    }

    pub fn set_width(&mut self, width: TableWidth) -> Result<&mut Self> {
        width.validate()?;
        self.width = width;
        Ok(self)
    }

    pub fn alignment(&self) -> Option<Alignment> {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> &mut Self {
        self.alignment = Some(alignment);
        self
    }

    pub fn borders(&self) -> &Borders {
        &self.borders
    }

    pub fn set_borders(&mut self, borders: Borders) -> Result<&mut Self> {
        borders.validate()?;
        self.borders = borders;
        Ok(self)
    }

    /// Explicit grid column widths in twips
    pub fn set_column_widths(&mut self, widths: &[i32]) -> Result<&mut Self> {
        for width in widths {
            check_positive_twips("column_width", *width)?;
        }
        self.column_widths = widths.to_vec();
        Ok(self)
    }

    /// Grid column widths: explicit ones, else the default width split evenly
    pub fn grid_columns(&self) -> Vec<i32> {
        let count = self.column_count();
        if self.column_widths.len() == count {
            return self.column_widths.clone();
        }
        let each = DEFAULT_TABLE_WIDTH / count.max(1) as i32;
        vec![each; count]
    }

    /// All cells of the table, row by row
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }
}

impl DocumentContext {
    /// A detached table without rows, built up with [`Table::append_empty_row`]
    pub fn new_empty_table(&self) -> Table {
        Table::empty(self.clone())
    }
}
