mod constraint;
mod index;
pub mod options;
mod types;

use std::fmt;

pub use constraint::{
    Constraint, ConstraintBody, ConstraintKind, ConstraintType, ForeignKeySpec,
    ReferentialAction, SchemaConstraint,
};
pub use index::{Index, IndexExpr, IndexOrder};
pub use options::Options;
pub use types::ColumnType;

/// Addresses a table, optionally qualified by a schema. `None` is the
/// connection's default schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TableRef {
    pub name: String,
    pub schema: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
        }
    }

    pub fn with_schema(name: impl Into<String>, schema: Option<String>) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.schema {
            Some(ref schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub server_default: Option<String>,
    pub kw: Options,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary_key: false,
            unique: false,
            server_default: None,
            kw: Options::new(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn server_default(mut self, value: impl Into<String>) -> Self {
        self.server_default = Some(value.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.kw.insert(key.into(), value.into());
        self
    }
}

/// One entry of a table definition, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum TableElement {
    Column(Column),
    Constraint(Constraint),
}

impl From<Column> for TableElement {
    fn from(column: Column) -> Self {
        TableElement::Column(column)
    }
}

impl From<Constraint> for TableElement {
    fn from(constraint: Constraint) -> Self {
        TableElement::Constraint(constraint)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Vec<Column>,
    pub constraints: Vec<Constraint>,
    pub kw: Options,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            constraints: Vec::new(),
            kw: Options::new(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.push(Column::new(name, column_type));
        self
    }

    pub fn add_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Attach a constraint, re-addressing it to this table.
    pub fn add_constraint(mut self, mut constraint: Constraint) -> Self {
        constraint.table = self.table_ref();
        self.constraints.push(constraint);
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.kw.insert(key.into(), value.into());
        self
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::with_schema(self.name.clone(), self.schema.clone())
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns followed by constraints.
    pub fn elements(&self) -> Vec<TableElement> {
        self.columns
            .iter()
            .cloned()
            .map(TableElement::Column)
            .chain(self.constraints.iter().cloned().map(TableElement::Constraint))
            .collect()
    }
}
