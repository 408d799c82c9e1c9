// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal fixed-width table renderer for `text` output mode.

use std::io::Write;

pub enum ColumnKind {
    Left,
    Muted,
    Status,
}

pub struct Column {
    pub title: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub fn left(title: &'static str) -> Self {
        Self { title, kind: ColumnKind::Left }
    }

    pub fn muted(title: &'static str) -> Self {
        Self { title, kind: ColumnKind::Muted }
    }

    pub fn status(title: &'static str) -> Self {
        Self { title, kind: ColumnKind::Status }
    }
}

pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns, rows: Vec::new() }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn render(&self, out: &mut (impl Write + ?Sized)) {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.title.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c.title, width = widths[i]))
            .collect();
        let _ = writeln!(out, "{}", crate::color::muted(&header.join("  ")));

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let padded = format!("{:<width$}", cell, width = widths[i]);
                    match self.columns[i].kind {
                        ColumnKind::Status => crate::color::status(cell) + &" ".repeat(widths[i].saturating_sub(cell.len())),
                        ColumnKind::Muted => crate::color::muted(&padded),
                        ColumnKind::Left => padded,
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join("  "));
        }
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
