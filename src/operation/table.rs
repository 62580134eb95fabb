use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::factory::SchemaFactory;
use crate::operation::{OpKind, Operation};
use crate::schema::{Options, Table, TableElement, TableRef};

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableOp {
    pub table: TableRef,
    /// Columns and constraints in declaration order.
    pub elements: Vec<TableElement>,
    pub kw: Options,
    /// The table this operation was derived from, returned by `to_table`
    /// as-is.
    pub orig_table: Option<Arc<Table>>,
}

impl CreateTableOp {
    pub fn new(table_name: impl Into<String>, elements: Vec<TableElement>) -> Self {
        Self {
            table: TableRef::new(table_name),
            elements,
            kw: Options::new(),
            orig_table: None,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn element(mut self, element: impl Into<TableElement>) -> Self {
        self.elements.push(element.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kw.insert(key.into(), value.into());
        self
    }

    pub fn from_table(table: &Arc<Table>) -> Self {
        Self {
            table: table.table_ref(),
            elements: table.elements(),
            kw: table.kw.clone(),
            orig_table: Some(Arc::clone(table)),
        }
    }

    pub fn to_table(&self, factory: &dyn SchemaFactory) -> Result<Arc<Table>> {
        if let Some(ref table) = self.orig_table {
            return Ok(Arc::clone(table));
        }
        let table = factory.table(
            &self.table.name,
            self.table.schema.as_deref(),
            &self.elements,
            &self.kw,
        )?;
        Ok(Arc::new(table))
    }

    pub fn detach(&mut self) {
        self.orig_table = None;
    }

    pub fn reverse(&self) -> DropTableOp {
        DropTableOp {
            table: self.table.clone(),
            table_kw: self.kw.clone(),
        }
    }
}

impl Operation for CreateTableOp {
    fn kind(&self) -> OpKind {
        OpKind::CreateTable
    }

    fn describe(&self) -> String {
        format!("Create table {}", self.table)
    }
}

/// Drops a table by identity. `table_kw` keeps the construction options
/// needed to rebuild an empty table of the same kind on reversal.
#[derive(Debug, Clone, PartialEq)]
pub struct DropTableOp {
    pub table: TableRef,
    pub table_kw: Options,
}

impl DropTableOp {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table: TableRef::new(table_name),
            table_kw: Options::new(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn from_table(table: &Table) -> Self {
        Self {
            table: table.table_ref(),
            table_kw: table.kw.clone(),
        }
    }

    /// A table with this identity and options but no columns.
    pub fn to_table(&self, factory: &dyn SchemaFactory) -> Result<Table> {
        factory.table(
            &self.table.name,
            self.table.schema.as_deref(),
            &[],
            &self.table_kw,
        )
    }

    pub fn reverse(&self, factory: &dyn SchemaFactory) -> Result<CreateTableOp> {
        let table = Arc::new(self.to_table(factory)?);
        Ok(CreateTableOp::from_table(&table))
    }
}

impl Operation for DropTableOp {
    fn kind(&self) -> OpKind {
        OpKind::DropTable
    }

    fn describe(&self) -> String {
        format!("Drop table {}", self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::SchemaObjects;
    use crate::schema::{Column, ColumnType, Constraint};

    fn users_table() -> Arc<Table> {
        Arc::new(
            Table::new("users")
                .in_schema("auth")
                .add_column(Column::new("id", ColumnType::Serial).primary_key())
                .add_column(Column::new("email", ColumnType::Text).not_null())
                .add_constraint(Constraint::unique(
                    Some("uq_users_email"),
                    TableRef::new("users"),
                    vec!["email".to_string()],
                ))
                .option("mysql_engine", "InnoDB"),
        )
    }

    #[test]
    fn from_table_lists_columns_then_constraints() {
        let op = CreateTableOp::from_table(&users_table());

        assert_eq!(op.table, TableRef::new("users").in_schema("auth"));
        assert_eq!(op.elements.len(), 3);
        assert!(matches!(op.elements[2], TableElement::Constraint(_)));
        assert_eq!(op.kw.get("mysql_engine"), Some(&Value::from("InnoDB")));
    }

    #[test]
    fn to_table_returns_the_original_object() {
        let table = users_table();
        let op = CreateTableOp::from_table(&table);

        let rebuilt = op.to_table(&SchemaObjects::new(None)).unwrap();
        assert!(Arc::ptr_eq(&rebuilt, &table));
    }

    #[test]
    fn detached_table_rebuilds_equal() {
        let table = users_table();
        let mut op = CreateTableOp::from_table(&table);
        op.detach();

        let rebuilt = op.to_table(&SchemaObjects::new(None)).unwrap();
        assert_eq!(*rebuilt, *table);
    }

    #[test]
    fn hand_written_create_table() {
        let op = CreateTableOp::new("posts", Vec::new())
            .element(Column::new("id", ColumnType::Serial).primary_key())
            .element(Column::new("title", ColumnType::Text));

        let table = op.to_table(&SchemaObjects::new(None)).unwrap();
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[1].name, "title");
    }

    #[test]
    fn drop_table_keeps_options_for_reversal() {
        let op = DropTableOp::from_table(&users_table());
        let create = op.reverse(&SchemaObjects::new(None)).unwrap();

        assert_eq!(create.table, TableRef::new("users").in_schema("auth"));
        assert!(create.elements.is_empty());
        assert_eq!(create.kw.get("mysql_engine"), Some(&Value::from("InnoDB")));
    }

    #[test]
    fn create_table_reverses_to_drop() {
        let op = CreateTableOp::from_table(&users_table());
        assert_eq!(op.reverse().table, op.table);
    }

    #[test]
    fn create_table_describe() {
        assert_eq!(CreateTableOp::new("users", Vec::new()).describe(), "Create table users");
        assert_eq!(
            DropTableOp::new("users").in_schema("auth").describe(),
            "Drop table auth.users"
        );
    }
}
