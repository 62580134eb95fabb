use serde_json::Value;

use crate::operation::{OpKind, Operation};
use crate::schema::Table;

/// One row to insert, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct BulkInsertOp {
    pub table: Table,
    pub rows: Vec<Row>,
    /// Insert all rows with one statement. When false, one statement is
    /// issued per row, for executors that cannot bind a multi-row insert.
    pub multiinsert: bool,
}

impl BulkInsertOp {
    pub fn new(table: Table, rows: Vec<Row>) -> Self {
        Self {
            table,
            rows,
            multiinsert: true,
        }
    }

    pub fn multiinsert(mut self, multiinsert: bool) -> Self {
        self.multiinsert = multiinsert;
        self
    }

    /// The table's columns when it declares any, otherwise every key seen in
    /// the rows in first-seen order.
    pub fn column_names(&self) -> Vec<String> {
        if !self.table.columns.is_empty() {
            return self.table.columns.iter().map(|c| c.name.clone()).collect();
        }

        let mut names: Vec<String> = Vec::new();
        for row in &self.rows {
            for key in row.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }
        names
    }
}

impl Operation for BulkInsertOp {
    fn kind(&self) -> OpKind {
        OpKind::BulkInsert
    }

    fn describe(&self) -> String {
        format!(
            "Insert {} rows into {}",
            self.rows.len(),
            self.table.table_ref()
        )
    }
}
