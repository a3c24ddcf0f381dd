//! Table model consumed by [`super::engine::PdfRenderEngine`].

use super::GeneratorError;

/// One line of text inside a table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
}

/// A table cell holding one or more lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub lines: Vec<TextRun>,
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell with a single regular line.
    pub fn text(text: impl Into<String>) -> Self {
        Self::new().line(text)
    }

    /// Cell with a single bold line.
    pub fn bold(text: impl Into<String>) -> Self {
        Self::new().bold_line(text)
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(TextRun {
            text: text.into(),
            bold: false,
        });
        self
    }

    pub fn bold_line(mut self, text: impl Into<String>) -> Self {
        self.lines.push(TextRun {
            text: text.into(),
            bold: true,
        });
        self
    }
}

/// A table with relative column widths and an optional repeating header.
#[derive(Debug, Clone)]
pub struct Table {
    weights: Vec<f64>,
    header: Option<Vec<Cell>>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table whose columns share the page width in proportion to `weights`.
    pub fn new(weights: &[f64]) -> Self {
        Self {
            weights: weights.to_vec(),
            header: None,
            rows: Vec::new(),
        }
    }

    /// Set the header row, repeated at the top of every page the table spans.
    pub fn with_header(mut self, cells: Vec<Cell>) -> Result<Self, GeneratorError> {
        self.check_width(&cells)?;
        self.header = Some(cells);
        Ok(self)
    }

    pub fn push_row(&mut self, cells: Vec<Cell>) -> Result<(), GeneratorError> {
        self.check_width(&cells)?;
        self.rows.push(cells);
        Ok(())
    }

    pub fn header(&self) -> Option<&[Cell]> {
        self.header.as_deref()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.weights.len()
    }

    /// Absolute column widths for the given total width.
    pub fn column_widths(&self, total: f64) -> Vec<f64> {
        let sum: f64 = self.weights.iter().sum();
        if sum <= 0.0 {
            let even = total / self.weights.len().max(1) as f64;
            return vec![even; self.weights.len()];
        }
        self.weights.iter().map(|w| total * w / sum).collect()
    }

    fn check_width(&self, cells: &[Cell]) -> Result<(), GeneratorError> {
        if cells.len() != self.weights.len() {
            return Err(GeneratorError::Layout(format!(
                "row has {} cells but the table has {} columns",
                cells.len(),
                self.weights.len()
            )));
        }
        Ok(())
    }
}
