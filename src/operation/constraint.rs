use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::factory::SchemaFactory;
use crate::operation::{display_name, OpKind, Operation};
use crate::schema::options::{insert_if_set, keys};
use crate::schema::{
    Constraint, ConstraintKind, ConstraintType, Options, SchemaConstraint, TableRef,
};

/// Options shared by every constraint kind: the source's dialect options,
/// plus deferrable/initially when they are set.
fn constraint_options<C: SchemaConstraint + ?Sized>(constraint: &C) -> Options {
    let mut kw = constraint.dialect_options();
    insert_if_set(&mut kw, keys::DEFERRABLE, constraint.deferrable().map(Value::Bool));
    insert_if_set(
        &mut kw,
        keys::INITIALLY,
        constraint.initially().map(|s| Value::String(s.to_string())),
    );
    kw
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatePrimaryKeyOp {
    pub constraint_name: Option<String>,
    pub table: TableRef,
    pub columns: Vec<String>,
    pub kw: Options,
}

impl CreatePrimaryKeyOp {
    pub fn new(
        constraint_name: Option<&str>,
        table_name: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            constraint_name: constraint_name.map(str::to_string),
            table: TableRef::new(table_name),
            columns,
            kw: Options::new(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn from_constraint<C: SchemaConstraint + ?Sized>(constraint: &C) -> Self {
        Self {
            constraint_name: constraint.name().map(str::to_string),
            table: constraint.table(),
            columns: constraint.column_names(),
            kw: constraint_options(constraint),
        }
    }

    pub fn to_constraint(&self, factory: &dyn SchemaFactory) -> Result<Constraint> {
        factory.primary_key_constraint(
            self.constraint_name.as_deref(),
            &self.table,
            &self.columns,
            &self.kw,
        )
    }
}

impl Operation for CreatePrimaryKeyOp {
    fn kind(&self) -> OpKind {
        OpKind::CreatePrimaryKey
    }

    fn describe(&self) -> String {
        format!(
            "Create primary key {} on {}",
            display_name(self.constraint_name.as_deref()),
            self.table
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateUniqueConstraintOp {
    pub constraint_name: Option<String>,
    pub table: TableRef,
    pub columns: Vec<String>,
    pub kw: Options,
}

impl CreateUniqueConstraintOp {
    pub fn new(
        constraint_name: Option<&str>,
        table_name: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            constraint_name: constraint_name.map(str::to_string),
            table: TableRef::new(table_name),
            columns,
            kw: Options::new(),
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

    pub fn from_constraint<C: SchemaConstraint + ?Sized>(constraint: &C) -> Self {
        Self {
            constraint_name: constraint.name().map(str::to_string),
            table: constraint.table(),
            columns: constraint.column_names(),
            kw: constraint_options(constraint),
        }
    }

    pub fn to_constraint(&self, factory: &dyn SchemaFactory) -> Result<Constraint> {
        factory.unique_constraint(
            self.constraint_name.as_deref(),
            &self.table,
            &self.columns,
            &self.kw,
        )
    }
}

impl Operation for CreateUniqueConstraintOp {
    fn kind(&self) -> OpKind {
        OpKind::CreateUniqueConstraint
    }

    fn describe(&self) -> String {
        format!(
            "Create unique constraint {} on {}",
            display_name(self.constraint_name.as_deref()),
            self.table
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateForeignKeyOp {
    pub constraint_name: Option<String>,
    pub source: TableRef,
    pub referent: TableRef,
    pub local_cols: Vec<String>,
    pub remote_cols: Vec<String>,
    pub kw: Options,
}

impl CreateForeignKeyOp {
    pub fn new(
        constraint_name: Option<&str>,
        source_table: impl Into<String>,
        referent_table: impl Into<String>,
        local_cols: Vec<String>,
        remote_cols: Vec<String>,
    ) -> Self {
        Self {
            constraint_name: constraint_name.map(str::to_string),
            source: TableRef::new(source_table),
            referent: TableRef::new(referent_table),
            local_cols,
            remote_cols,
            kw: Options::new(),
        }
    }

    pub fn source_schema(mut self, schema: impl Into<String>) -> Self {
        self.source.schema = Some(schema.into());
        self
    }

    pub fn referent_schema(mut self, schema: impl Into<String>) -> Self {
        self.referent.schema = Some(schema.into());
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kw.insert(key.into(), value.into());
        self
    }

    pub fn from_constraint<C: SchemaConstraint + ?Sized>(constraint: &C) -> Result<Self> {
        let fk = constraint
            .foreign_key_spec()
            .ok_or_else(|| Error::MalformedConstraint {
                kind: constraint.visit_name().to_string(),
                reason: "no referenced table or columns".to_string(),
            })?;

        let mut kw = constraint.dialect_options();
        insert_if_set(
            &mut kw,
            keys::ONUPDATE,
            fk.onupdate.map(|a| Value::String(a.as_sql().to_string())),
        );
        insert_if_set(
            &mut kw,
            keys::ONDELETE,
            fk.ondelete.map(|a| Value::String(a.as_sql().to_string())),
        );
        insert_if_set(
            &mut kw,
            keys::INITIALLY,
            constraint.initially().map(|s| Value::String(s.to_string())),
        );
        insert_if_set(&mut kw, keys::DEFERRABLE, constraint.deferrable().map(Value::Bool));
        insert_if_set(&mut kw, keys::USE_ALTER, Some(Value::Bool(fk.use_alter)));

        Ok(Self {
            constraint_name: constraint.name().map(str::to_string),
            source: constraint.table(),
            referent: fk.referent.clone(),
            local_cols: fk.columns.clone(),
            remote_cols: fk.referent_columns.clone(),
            kw,
        })
    }

    pub fn to_constraint(&self, factory: &dyn SchemaFactory) -> Result<Constraint> {
        factory.foreign_key_constraint(
            self.constraint_name.as_deref(),
            &self.source,
            &self.referent,
            &self.local_cols,
            &self.remote_cols,
            &self.kw,
        )
    }
}

impl Operation for CreateForeignKeyOp {
    fn kind(&self) -> OpKind {
        OpKind::CreateForeignKey
    }

    fn describe(&self) -> String {
        format!(
            "Create foreign key {} on {} referencing {}",
            display_name(self.constraint_name.as_deref()),
            self.source,
            self.referent
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateCheckConstraintOp {
    pub constraint_name: Option<String>,
    pub table: TableRef,
    pub condition: String,
    pub kw: Options,
}

impl CreateCheckConstraintOp {
    pub fn new(
        constraint_name: Option<&str>,
        table_name: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            constraint_name: constraint_name.map(str::to_string),
            table: TableRef::new(table_name),
            condition: condition.into(),
            kw: Options::new(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    /// Accepts table-level and column-level checks alike.
    pub fn from_constraint<C: SchemaConstraint + ?Sized>(constraint: &C) -> Result<Self> {
        let condition = constraint
            .condition()
            .ok_or_else(|| Error::MalformedConstraint {
                kind: constraint.visit_name().to_string(),
                reason: "no condition".to_string(),
            })?;

        Ok(Self {
            constraint_name: constraint.name().map(str::to_string),
            table: constraint.table(),
            condition: condition.to_string(),
            kw: constraint_options(constraint),
        })
    }

    pub fn to_constraint(&self, factory: &dyn SchemaFactory) -> Result<Constraint> {
        factory.check_constraint(
            self.constraint_name.as_deref(),
            &self.table,
            &self.condition,
            &self.kw,
        )
    }
}

impl Operation for CreateCheckConstraintOp {
    fn kind(&self) -> OpKind {
        OpKind::CreateCheckConstraint
    }

    fn describe(&self) -> String {
        format!(
            "Create check constraint {} on {}",
            display_name(self.constraint_name.as_deref()),
            self.table
        )
    }
}

/// Introduces one constraint of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum AddConstraintOp {
    PrimaryKey(CreatePrimaryKeyOp),
    Unique(CreateUniqueConstraintOp),
    ForeignKey(CreateForeignKeyOp),
    Check(CreateCheckConstraintOp),
}

impl AddConstraintOp {
    /// Classifies `constraint` by its visit name and builds the matching
    /// operation. An unknown visit name is an error, never skipped.
    pub fn from_constraint<C: SchemaConstraint + ?Sized>(constraint: &C) -> Result<Self> {
        let kind: ConstraintKind = constraint.visit_name().parse()?;
        debug!(%kind, name = ?constraint.name(), "deriving add-constraint operation");

        Ok(match kind {
            ConstraintKind::Unique => {
                AddConstraintOp::Unique(CreateUniqueConstraintOp::from_constraint(constraint))
            }
            ConstraintKind::ForeignKey => {
                AddConstraintOp::ForeignKey(CreateForeignKeyOp::from_constraint(constraint)?)
            }
            ConstraintKind::PrimaryKey => {
                AddConstraintOp::PrimaryKey(CreatePrimaryKeyOp::from_constraint(constraint))
            }
            ConstraintKind::Check | ConstraintKind::ColumnCheck => {
                AddConstraintOp::Check(CreateCheckConstraintOp::from_constraint(constraint)?)
            }
        })
    }

    pub fn to_constraint(&self, factory: &dyn SchemaFactory) -> Result<Constraint> {
        match self {
            AddConstraintOp::PrimaryKey(op) => op.to_constraint(factory),
            AddConstraintOp::Unique(op) => op.to_constraint(factory),
            AddConstraintOp::ForeignKey(op) => op.to_constraint(factory),
            AddConstraintOp::Check(op) => op.to_constraint(factory),
        }
    }

    pub fn constraint_name(&self) -> Option<&str> {
        match self {
            AddConstraintOp::PrimaryKey(op) => op.constraint_name.as_deref(),
            AddConstraintOp::Unique(op) => op.constraint_name.as_deref(),
            AddConstraintOp::ForeignKey(op) => op.constraint_name.as_deref(),
            AddConstraintOp::Check(op) => op.constraint_name.as_deref(),
        }
    }

    /// The constrained table; the source table for a foreign key.
    pub fn table(&self) -> &TableRef {
        match self {
            AddConstraintOp::PrimaryKey(op) => &op.table,
            AddConstraintOp::Unique(op) => &op.table,
            AddConstraintOp::ForeignKey(op) => &op.source,
            AddConstraintOp::Check(op) => &op.table,
        }
    }

    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            AddConstraintOp::PrimaryKey(_) => ConstraintType::Primary,
            AddConstraintOp::Unique(_) => ConstraintType::Unique,
            AddConstraintOp::ForeignKey(_) => ConstraintType::ForeignKey,
            AddConstraintOp::Check(_) => ConstraintType::Check,
        }
    }

    pub fn reverse(&self) -> DropConstraintOp {
        DropConstraintOp {
            constraint_name: self.constraint_name().map(str::to_string),
            table: self.table().clone(),
            constraint_type: Some(self.constraint_type()),
        }
    }
}

impl Operation for AddConstraintOp {
    fn kind(&self) -> OpKind {
        match self {
            AddConstraintOp::PrimaryKey(op) => op.kind(),
            AddConstraintOp::Unique(op) => op.kind(),
            AddConstraintOp::ForeignKey(op) => op.kind(),
            AddConstraintOp::Check(op) => op.kind(),
        }
    }

    fn describe(&self) -> String {
        match self {
            AddConstraintOp::PrimaryKey(op) => op.describe(),
            AddConstraintOp::Unique(op) => op.describe(),
            AddConstraintOp::ForeignKey(op) => op.describe(),
            AddConstraintOp::Check(op) => op.describe(),
        }
    }
}

/// Drops a constraint by identity; the constraint's shape is not recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct DropConstraintOp {
    pub constraint_name: Option<String>,
    pub table: TableRef,
    pub constraint_type: Option<ConstraintType>,
}

impl DropConstraintOp {
    pub fn new(constraint_name: Option<&str>, table_name: impl Into<String>) -> Self {
        Self {
            constraint_name: constraint_name.map(str::to_string),
            table: TableRef::new(table_name),
            constraint_type: None,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn with_type(mut self, constraint_type: ConstraintType) -> Self {
        self.constraint_type = Some(constraint_type);
        self
    }

    pub fn from_constraint<C: SchemaConstraint + ?Sized>(constraint: &C) -> Result<Self> {
        let kind: ConstraintKind = constraint.visit_name().parse()?;

        Ok(Self {
            constraint_name: constraint.name().map(str::to_string),
            table: constraint.table(),
            constraint_type: Some(kind.constraint_type()),
        })
    }
}

impl Operation for DropConstraintOp {
    fn kind(&self) -> OpKind {
        OpKind::DropConstraint
    }

    fn describe(&self) -> String {
        format!(
            "Drop constraint {} from {}",
            display_name(self.constraint_name.as_deref()),
            self.table
        )
    }
}
