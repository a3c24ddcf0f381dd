//! PDF rendering engine.
//!
//! Lays out paragraphs and bordered tables on A4 pages using the builtin
//! Helvetica fonts of `printpdf`, so no font files are needed at runtime.

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point,
};

use super::common::wrap_text;
use super::layout::{Cell, Table};
use super::GeneratorError;

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 15.0;
const FONT_SIZE_PT: f64 = 10.0;
const LINE_HEIGHT_MM: f64 = 5.0;
const CELL_PADDING_MM: f64 = 2.0;
const BORDER_THICKNESS_PT: f64 = 0.5;
const PT_TO_MM: f64 = 0.3528;
/// Average Helvetica glyph width relative to the font size.
const AVG_GLYPH_WIDTH_EM: f64 = 0.55;
const LAYER_NAME: &str = "Content";

/// Stateful engine that writes elements top to bottom, breaking pages as needed.
pub struct PdfRenderEngine {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Distance of the write cursor from the bottom edge, in millimetres.
    cursor: f64,
    pages: usize,
}

impl PdfRenderEngine {
    /// Start a new single-page document.
    pub fn new(title: &str) -> Result<Self, GeneratorError> {
        let (doc, page, layer) = PdfDocument::new(
            title,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            LAYER_NAME,
        );
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| GeneratorError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| GeneratorError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);
        layer.set_outline_thickness(BORDER_THICKNESS_PT);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            cursor: PAGE_HEIGHT_MM - MARGIN_MM,
            pages: 1,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    fn content_width() -> f64 {
        PAGE_WIDTH_MM - 2.0 * MARGIN_MM
    }

    fn max_chars(width: f64) -> usize {
        let glyph = FONT_SIZE_PT * PT_TO_MM * AVG_GLYPH_WIDTH_EM;
        ((width - 2.0 * CELL_PADDING_MM) / glyph).floor().max(1.0) as usize
    }

    fn at_page_top(&self) -> bool {
        self.cursor >= PAGE_HEIGHT_MM - MARGIN_MM
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.layer.set_outline_thickness(BORDER_THICKNESS_PT);
        self.cursor = PAGE_HEIGHT_MM - MARGIN_MM;
        self.pages += 1;
    }

    /// Break to a new page when `height` does not fit. Returns true on a break.
    ///
    /// A fresh page never breaks again; oversize content is drawn and clipped.
    fn ensure_space(&mut self, height: f64) -> bool {
        if self.cursor - height < MARGIN_MM && !self.at_page_top() {
            self.new_page();
            return true;
        }
        false
    }

    fn write_text(&self, text: &str, x: f64, baseline: f64, bold: bool) {
        if text.is_empty() {
            return;
        }
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(text, FONT_SIZE_PT, Mm(x), Mm(baseline), font);
    }

    fn draw_rect(&self, x: f64, top: f64, width: f64, height: f64) {
        let bottom = top - height;
        let outline = Line {
            points: vec![
                (Point::new(Mm(x), Mm(top)), false),
                (Point::new(Mm(x + width), Mm(top)), false),
                (Point::new(Mm(x + width), Mm(bottom)), false),
                (Point::new(Mm(x), Mm(bottom)), false),
            ],
            is_closed: true,
            has_fill: false,
            has_stroke: true,
            is_clipping_path: false,
        };
        self.layer.add_shape(outline);
    }

    /// Write a paragraph. Each `\n` starts a new line.
    pub fn paragraph(&mut self, text: &str, bold: bool) {
        let max_chars = Self::max_chars(Self::content_width() + 2.0 * CELL_PADDING_MM);
        for line in wrap_text(text, max_chars) {
            self.ensure_space(LINE_HEIGHT_MM);
            self.cursor -= LINE_HEIGHT_MM;
            self.write_text(&line, MARGIN_MM, self.cursor + 1.0, bold);
        }
    }

    /// Add vertical whitespace.
    pub fn spacer(&mut self, height: f64) {
        if !self.ensure_space(height) {
            self.cursor -= height;
        }
    }

    /// Draw a bordered table spanning the content width.
    pub fn table(&mut self, table: &Table) {
        let widths = table.column_widths(Self::content_width());

        if let Some(header) = table.header() {
            self.row(header, &widths, true);
        }

        for cells in table.rows() {
            let height = Self::row_height(cells, &widths, false);
            if self.ensure_space(height) {
                if let Some(header) = table.header() {
                    self.row(header, &widths, true);
                }
            }
            self.row(cells, &widths, false);
        }
    }

    fn wrapped_cell(cell: &Cell, width: f64, force_bold: bool) -> Vec<(String, bool)> {
        let max_chars = Self::max_chars(width);
        cell.lines
            .iter()
            .flat_map(|run| {
                let bold = run.bold || force_bold;
                wrap_text(&run.text, max_chars)
                    .into_iter()
                    .map(move |line| (line, bold))
            })
            .collect()
    }

    fn row_height(cells: &[Cell], widths: &[f64], force_bold: bool) -> f64 {
        let lines = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| Self::wrapped_cell(cell, *width, force_bold).len())
            .max()
            .unwrap_or(0)
            .max(1);
        lines as f64 * LINE_HEIGHT_MM + 2.0 * CELL_PADDING_MM
    }

    fn row(&mut self, cells: &[Cell], widths: &[f64], force_bold: bool) {
        let height = Self::row_height(cells, widths, force_bold);
        self.ensure_space(height);

        let top = self.cursor;
        let mut x = MARGIN_MM;
        for (cell, width) in cells.iter().zip(widths) {
            self.draw_rect(x, top, *width, height);
            let mut baseline = top - CELL_PADDING_MM;
            for (line, bold) in Self::wrapped_cell(cell, *width, force_bold) {
                baseline -= LINE_HEIGHT_MM;
                self.write_text(&line, x + CELL_PADDING_MM, baseline + 1.0, bold);
            }
            x += width;
        }
        self.cursor = top - height;
    }

    /// Serialize the document.
    pub fn finish(self) -> Result<Vec<u8>, GeneratorError> {
        let mut writer = BufWriter::new(Vec::new());
        self.doc
            .save(&mut writer)
            .map_err(|e| GeneratorError::Pdf(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| GeneratorError::Serialize(e.into_error()))
    }
}
