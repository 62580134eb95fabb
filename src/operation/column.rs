use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::factory::SchemaFactory;
use crate::operation::{OpKind, Operation};
use crate::schema::options::keys;
use crate::schema::{Column, ColumnType, Options, TableRef};

#[derive(Debug, Clone, PartialEq)]
pub struct RenameTableOp {
    pub table: TableRef,
    pub new_table_name: String,
}

impl RenameTableOp {
    pub fn new(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            table: TableRef::new(old_name),
            new_table_name: new_name.into(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn reverse(&self) -> RenameTableOp {
        RenameTableOp {
            table: TableRef::with_schema(self.new_table_name.clone(), self.table.schema.clone()),
            new_table_name: self.table.name.clone(),
        }
    }
}

impl Operation for RenameTableOp {
    fn kind(&self) -> OpKind {
        OpKind::RenameTable
    }

    fn describe(&self) -> String {
        format!("Rename table {} to {}", self.table, self.new_table_name)
    }
}

/// Changes attributes of one existing column.
///
/// Every `modify_*` field is `None` when that attribute is left alone. For
/// the server default and comment, `Some(None)` is an explicit change that
/// removes the attribute. The `existing_*` fields describe the column before
/// the change; `None` there means unknown. Some dialects need them to restate
/// unchanged attributes, and reversal swaps them with the `modify_*` fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlterColumnOp {
    pub table: TableRef,
    pub column_name: String,
    pub modify_nullable: Option<bool>,
    pub modify_server_default: Option<Option<String>>,
    pub modify_name: Option<String>,
    pub modify_type: Option<ColumnType>,
    pub modify_comment: Option<Option<String>>,
    pub existing_type: Option<ColumnType>,
    pub existing_nullable: Option<bool>,
    pub existing_server_default: Option<Option<String>>,
    pub existing_comment: Option<Option<String>>,
    pub kw: Options,
}

impl AlterColumnOp {
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            table: TableRef::new(table_name),
            column_name: column_name.into(),
            ..Default::default()
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn set_nullable(mut self, nullable: bool) -> Self {
        self.modify_nullable = Some(nullable);
        self
    }

    /// `None` drops the current default.
    pub fn set_server_default(mut self, default: Option<String>) -> Self {
        self.modify_server_default = Some(default);
        self
    }

    pub fn rename_to(mut self, new_name: impl Into<String>) -> Self {
        self.modify_name = Some(new_name.into());
        self
    }

    pub fn set_type(mut self, column_type: ColumnType) -> Self {
        self.modify_type = Some(column_type);
        self
    }

    pub fn set_comment(mut self, comment: Option<String>) -> Self {
        self.modify_comment = Some(comment);
        self
    }

    pub fn existing_type(mut self, column_type: ColumnType) -> Self {
        self.existing_type = Some(column_type);
        self
    }

    pub fn existing_nullable(mut self, nullable: bool) -> Self {
        self.existing_nullable = Some(nullable);
        self
    }

    pub fn existing_server_default(mut self, default: Option<String>) -> Self {
        self.existing_server_default = Some(default);
        self
    }

    pub fn existing_comment(mut self, comment: Option<String>) -> Self {
        self.existing_comment = Some(comment);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kw.insert(key.into(), value.into());
        self
    }

    pub fn has_changes(&self) -> bool {
        self.modify_nullable.is_some()
            || self.modify_server_default.is_some()
            || self.modify_name.is_some()
            || self.modify_type.is_some()
            || self.modify_comment.is_some()
    }

    /// Swaps each `modify_*` field with its `existing_*` shadow. An attribute
    /// whose prior value is unknown is left unchanged by the reversal.
    pub fn reverse(&self) -> AlterColumnOp {
        let (column_name, modify_name) = match self.modify_name {
            Some(ref new_name) => (new_name.clone(), Some(self.column_name.clone())),
            None => (self.column_name.clone(), None),
        };

        AlterColumnOp {
            table: self.table.clone(),
            column_name,
            modify_nullable: self.modify_nullable.and(self.existing_nullable),
            modify_server_default: self
                .modify_server_default
                .as_ref()
                .and(self.existing_server_default.clone()),
            modify_name,
            modify_type: self.modify_type.as_ref().and(self.existing_type.clone()),
            modify_comment: self
                .modify_comment
                .as_ref()
                .and(self.existing_comment.clone()),
            existing_type: self.modify_type.clone().or_else(|| self.existing_type.clone()),
            existing_nullable: self.modify_nullable.or(self.existing_nullable),
            existing_server_default: self
                .modify_server_default
                .clone()
                .or_else(|| self.existing_server_default.clone()),
            existing_comment: self
                .modify_comment
                .clone()
                .or_else(|| self.existing_comment.clone()),
            kw: self.kw.clone(),
        }
    }
}

impl Operation for AlterColumnOp {
    fn kind(&self) -> OpKind {
        OpKind::AlterColumn
    }

    fn describe(&self) -> String {
        format!("Alter column {} on {}", self.column_name, self.table)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddColumnOp {
    pub table: TableRef,
    pub column: Column,
}

impl AddColumnOp {
    pub fn new(table_name: impl Into<String>, column: Column) -> Self {
        Self {
            table: TableRef::new(table_name),
            column,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn from_column(table: &TableRef, column: &Column) -> Self {
        Self {
            table: table.clone(),
            column: column.clone(),
        }
    }

    pub fn from_column_and_tablename(
        schema: Option<&str>,
        table_name: &str,
        column: &Column,
    ) -> Self {
        Self::from_column(
            &TableRef::with_schema(table_name, schema.map(str::to_string)),
            column,
        )
    }

    pub fn to_column(&self) -> &Column {
        &self.column
    }

    /// The drop keeps the full column, so reversing it again is lossless.
    pub fn reverse(&self) -> DropColumnOp {
        DropColumnOp::from_column_and_tablename(
            self.table.schema.as_deref(),
            &self.table.name,
            &self.column,
        )
    }
}

impl Operation for AddColumnOp {
    fn kind(&self) -> OpKind {
        OpKind::AddColumn
    }

    fn describe(&self) -> String {
        format!("Add column {} to {}", self.column.name, self.table)
    }
}

/// Drops a column by name. `kw` holds whatever was captured about the
/// column (`type`, `nullable`, `server_default` keys) for reconstructing it.
#[derive(Debug, Clone, PartialEq)]
pub struct DropColumnOp {
    pub table: TableRef,
    pub column_name: String,
    pub kw: Options,
    pub orig_column: Option<Column>,
}

impl DropColumnOp {
    pub fn new(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self {
            table: TableRef::new(table_name),
            column_name: column_name.into(),
            kw: Options::new(),
            orig_column: None,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kw.insert(key.into(), value.into());
        self
    }

    pub fn from_column_and_tablename(
        schema: Option<&str>,
        table_name: &str,
        column: &Column,
    ) -> Self {
        Self {
            table: TableRef::with_schema(table_name, schema.map(str::to_string)),
            column_name: column.name.clone(),
            kw: Options::new(),
            orig_column: Some(column.clone()),
        }
    }

    /// The dropped column if it was recorded, otherwise a column rebuilt
    /// from `kw` whose type is `Null` unless `kw` names one.
    pub fn to_column(&self, factory: &dyn SchemaFactory) -> Result<Column> {
        if let Some(ref column) = self.orig_column {
            return Ok(column.clone());
        }
        if !self.kw.contains_key(keys::TYPE) {
            warn!(
                column = %self.column_name,
                table = %self.table,
                "reconstructing dropped column without a recorded type"
            );
        }
        factory.column(&self.column_name, ColumnType::Null, &self.kw)
    }

    pub fn reverse(&self, factory: &dyn SchemaFactory) -> Result<AddColumnOp> {
        let column = self.to_column(factory)?;
        Ok(AddColumnOp::from_column(&self.table, &column))
    }
}

impl Operation for DropColumnOp {
    fn kind(&self) -> OpKind {
        OpKind::DropColumn
    }

    fn describe(&self) -> String {
        format!("Drop column {} from {}", self.column_name, self.table)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterTableOp {
    RenameTable(RenameTableOp),
    AlterColumn(AlterColumnOp),
    AddColumn(AddColumnOp),
    DropColumn(DropColumnOp),
}

impl AlterTableOp {
    pub fn table(&self) -> &TableRef {
        match self {
            AlterTableOp::RenameTable(op) => &op.table,
            AlterTableOp::AlterColumn(op) => &op.table,
            AlterTableOp::AddColumn(op) => &op.table,
            AlterTableOp::DropColumn(op) => &op.table,
        }
    }

    pub fn reverse(&self, factory: &dyn SchemaFactory) -> Result<AlterTableOp> {
        Ok(match self {
            AlterTableOp::RenameTable(op) => AlterTableOp::RenameTable(op.reverse()),
            AlterTableOp::AlterColumn(op) => AlterTableOp::AlterColumn(op.reverse()),
            AlterTableOp::AddColumn(op) => AlterTableOp::DropColumn(op.reverse()),
            AlterTableOp::DropColumn(op) => AlterTableOp::AddColumn(op.reverse(factory)?),
        })
    }
}

impl Operation for AlterTableOp {
    fn kind(&self) -> OpKind {
        match self {
            AlterTableOp::RenameTable(op) => op.kind(),
            AlterTableOp::AlterColumn(op) => op.kind(),
            AlterTableOp::AddColumn(op) => op.kind(),
            AlterTableOp::DropColumn(op) => op.kind(),
        }
    }

    fn describe(&self) -> String {
        match self {
            AlterTableOp::RenameTable(op) => op.describe(),
            AlterTableOp::AlterColumn(op) => op.describe(),
            AlterTableOp::AddColumn(op) => op.describe(),
            AlterTableOp::DropColumn(op) => op.describe(),
        }
    }
}

impl From<RenameTableOp> for AlterTableOp {
    fn from(op: RenameTableOp) -> Self {
        AlterTableOp::RenameTable(op)
    }
}

impl From<AlterColumnOp> for AlterTableOp {
    fn from(op: AlterColumnOp) -> Self {
        AlterTableOp::AlterColumn(op)
    }
}

impl From<AddColumnOp> for AlterTableOp {
    fn from(op: AddColumnOp) -> Self {
        AlterTableOp::AddColumn(op)
    }
}

impl From<DropColumnOp> for AlterTableOp {
    fn from(op: DropColumnOp) -> Self {
        AlterTableOp::DropColumn(op)
    }
}
