//! Plain Markdown tables
//!
//! ```text
//! | impl       | pass |
//! |------------|------|
//! | Jsonschema |   12 |
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct Column {
    header: String,
    align: Align,
}

/// Fixed-header table; cells are padded to the widest value in their column
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: headers
                .into_iter()
                .map(|h| Column {
                    header: h.into(),
                    align: Align::Left,
                })
                .collect(),
            rows: Vec::new(),
        }
    }

    /// Right-align every column from `index` onwards
    pub fn right_align_from(mut self, index: usize) -> Self {
        for column in self.columns.iter_mut().skip(index) {
            column.align = Align::Right;
        }
        self
    }

    /// Append a row; missing trailing cells render empty, extra cells are dropped
    pub fn push_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        let mut row: Vec<String> = cells
            .into_iter()
            .take(self.columns.len())
            .map(Into::into)
            .collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                self.rows
                    .iter()
                    .map(|row| row[i].chars().count())
                    .chain(std::iter::once(column.header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn write_line(
        f: &mut fmt::Formatter<'_>,
        cells: impl Iterator<Item = (String, Align)>,
        widths: &[usize],
    ) -> fmt::Result {
        f.write_str("|")?;
        for ((text, align), width) in cells.zip(widths) {
            match align {
                Align::Left => write!(f, " {:<width$} |", text, width = width)?,
                Align::Right => write!(f, " {:>width$} |", text, width = width)?,
            }
        }
        writeln!(f)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();

        Self::write_line(
            f,
            self.columns.iter().map(|c| (c.header.clone(), Align::Left)),
            &widths,
        )?;

        f.write_str("|")?;
        for width in &widths {
            write!(f, "{}|", "-".repeat((width + 2).max(3)))?;
        }
        writeln!(f)?;

        for row in &self.rows {
            Self::write_line(
                f,
                row.iter()
                    .cloned()
                    .zip(self.columns.iter().map(|c| c.align)),
                &widths,
            )?;
        }
        Ok(())
    }
}
