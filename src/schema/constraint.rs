use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::schema::{Options, TableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

impl FromStr for ReferentialAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('_', " ");
        match normalized.as_str() {
            "NO ACTION" => Ok(ReferentialAction::NoAction),
            "RESTRICT" => Ok(ReferentialAction::Restrict),
            "CASCADE" => Ok(ReferentialAction::Cascade),
            "SET NULL" => Ok(ReferentialAction::SetNull),
            "SET DEFAULT" => Ok(ReferentialAction::SetDefault),
            _ => Err(Error::InvalidSchemaObject(format!(
                "unknown referential action: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeySpec {
    pub columns: Vec<String>,
    pub referent: TableRef,
    pub referent_columns: Vec<String>,
    pub onupdate: Option<ReferentialAction>,
    pub ondelete: Option<ReferentialAction>,
    pub use_alter: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintBody {
    PrimaryKey { columns: Vec<String> },
    Unique { columns: Vec<String> },
    ForeignKey(ForeignKeySpec),
    Check { condition: String },
    /// A check declared inline on one column.
    ColumnCheck { column: String, condition: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: Option<String>,
    pub table: TableRef,
    pub body: ConstraintBody,
    pub deferrable: Option<bool>,
    pub initially: Option<String>,
    pub kw: Options,
}

impl Constraint {
    fn with_body(name: Option<&str>, table: TableRef, body: ConstraintBody) -> Self {
        Self {
            name: name.map(str::to_string),
            table,
            body,
            deferrable: None,
            initially: None,
            kw: Options::new(),
        }
    }

    pub fn primary_key(name: Option<&str>, table: TableRef, columns: Vec<String>) -> Self {
        Self::with_body(name, table, ConstraintBody::PrimaryKey { columns })
    }

    pub fn unique(name: Option<&str>, table: TableRef, columns: Vec<String>) -> Self {
        Self::with_body(name, table, ConstraintBody::Unique { columns })
    }

    pub fn foreign_key(
        name: Option<&str>,
        table: TableRef,
        columns: Vec<String>,
        referent: TableRef,
        referent_columns: Vec<String>,
    ) -> Self {
        Self::with_body(
            name,
            table,
            ConstraintBody::ForeignKey(ForeignKeySpec {
                columns,
                referent,
                referent_columns,
                onupdate: None,
                ondelete: None,
                use_alter: false,
            }),
        )
    }

    pub fn check(name: Option<&str>, table: TableRef, condition: impl Into<String>) -> Self {
        Self::with_body(
            name,
            table,
            ConstraintBody::Check {
                condition: condition.into(),
            },
        )
    }

    pub fn column_check(
        name: Option<&str>,
        table: TableRef,
        column: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self::with_body(
            name,
            table,
            ConstraintBody::ColumnCheck {
                column: column.into(),
                condition: condition.into(),
            },
        )
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        if let ConstraintBody::ForeignKey(ref mut fk) = self.body {
            fk.ondelete = Some(action);
        }
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        if let ConstraintBody::ForeignKey(ref mut fk) = self.body {
            fk.onupdate = Some(action);
        }
        self
    }

    pub fn use_alter(mut self) -> Self {
        if let ConstraintBody::ForeignKey(ref mut fk) = self.body {
            fk.use_alter = true;
        }
        self
    }

    pub fn with_deferrable(mut self, deferrable: bool) -> Self {
        self.deferrable = Some(deferrable);
        self
    }

    pub fn with_initially(mut self, initially: impl Into<String>) -> Self {
        self.initially = Some(initially.into());
        self
    }

    pub fn kind(&self) -> ConstraintKind {
        match self.body {
            ConstraintBody::PrimaryKey { .. } => ConstraintKind::PrimaryKey,
            ConstraintBody::Unique { .. } => ConstraintKind::Unique,
            ConstraintBody::ForeignKey(_) => ConstraintKind::ForeignKey,
            ConstraintBody::Check { .. } => ConstraintKind::Check,
            ConstraintBody::ColumnCheck { .. } => ConstraintKind::ColumnCheck,
        }
    }
}

/// Structural classification of a live constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    PrimaryKey,
    Check,
    ColumnCheck,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 5] = [
        ConstraintKind::Unique,
        ConstraintKind::ForeignKey,
        ConstraintKind::PrimaryKey,
        ConstraintKind::Check,
        ConstraintKind::ColumnCheck,
    ];

    pub fn visit_name(self) -> &'static str {
        match self {
            ConstraintKind::Unique => "unique_constraint",
            ConstraintKind::ForeignKey => "foreign_key_constraint",
            ConstraintKind::PrimaryKey => "primary_key_constraint",
            ConstraintKind::Check => "check_constraint",
            ConstraintKind::ColumnCheck => "column_check_constraint",
        }
    }

    /// Column-level and table-level checks share one drop tag.
    pub fn constraint_type(self) -> ConstraintType {
        match self {
            ConstraintKind::Unique => ConstraintType::Unique,
            ConstraintKind::ForeignKey => ConstraintType::ForeignKey,
            ConstraintKind::PrimaryKey => ConstraintType::Primary,
            ConstraintKind::Check | ConstraintKind::ColumnCheck => ConstraintType::Check,
        }
    }
}

impl FromStr for ConstraintKind {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        ConstraintKind::ALL
            .into_iter()
            .find(|kind| kind.visit_name() == tag)
            .ok_or_else(|| Error::UnknownConstraintKind(tag.to_string()))
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.visit_name())
    }
}

/// Coarse constraint tag recorded on drop operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    Unique,
    ForeignKey,
    Primary,
    Check,
}

impl ConstraintType {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintType::Unique => "unique",
            ConstraintType::ForeignKey => "foreignkey",
            ConstraintType::Primary => "primary",
            ConstraintType::Check => "check",
        }
    }
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What operations need to read from a live constraint object.
///
/// `visit_name` is the structural tag used to classify the constraint. Objects
/// from other metadata libraries can implement this to feed operations.
pub trait SchemaConstraint {
    fn visit_name(&self) -> &str;

    fn name(&self) -> Option<&str>;

    fn table(&self) -> TableRef;

    /// Constrained columns for primary key and unique constraints.
    fn column_names(&self) -> Vec<String>;

    fn condition(&self) -> Option<&str>;

    fn deferrable(&self) -> Option<bool>;

    fn initially(&self) -> Option<&str>;

    fn foreign_key_spec(&self) -> Option<&ForeignKeySpec>;

    fn dialect_options(&self) -> Options {
        Options::new()
    }
}

impl SchemaConstraint for Constraint {
    fn visit_name(&self) -> &str {
        self.kind().visit_name()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn table(&self) -> TableRef {
        self.table.clone()
    }

    fn column_names(&self) -> Vec<String> {
        match self.body {
            ConstraintBody::PrimaryKey { ref columns } | ConstraintBody::Unique { ref columns } => {
                columns.clone()
            }
            ConstraintBody::ForeignKey(ref fk) => fk.columns.clone(),
            ConstraintBody::ColumnCheck { ref column, .. } => vec![column.clone()],
            ConstraintBody::Check { .. } => Vec::new(),
        }
    }

    fn condition(&self) -> Option<&str> {
        match self.body {
            ConstraintBody::Check { ref condition }
            | ConstraintBody::ColumnCheck { ref condition, .. } => Some(condition),
            _ => None,
        }
    }

    fn deferrable(&self) -> Option<bool> {
        self.deferrable
    }

    fn initially(&self) -> Option<&str> {
        self.initially.as_deref()
    }

    fn foreign_key_spec(&self) -> Option<&ForeignKeySpec> {
        match self.body {
            ConstraintBody::ForeignKey(ref fk) => Some(fk),
            _ => None,
        }
    }

    fn dialect_options(&self) -> Options {
        self.kw.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referential_action_as_sql() {
        assert_eq!(ReferentialAction::NoAction.as_sql(), "NO ACTION");
        assert_eq!(ReferentialAction::Restrict.as_sql(), "RESTRICT");
        assert_eq!(ReferentialAction::Cascade.as_sql(), "CASCADE");
        assert_eq!(ReferentialAction::SetNull.as_sql(), "SET NULL");
        assert_eq!(ReferentialAction::SetDefault.as_sql(), "SET DEFAULT");
    }

    #[test]
    fn referential_action_parses_sql_spelling() {
        assert_eq!(
            "set null".parse::<ReferentialAction>().unwrap(),
            ReferentialAction::SetNull
        );
        assert_eq!(
            "CASCADE".parse::<ReferentialAction>().unwrap(),
            ReferentialAction::Cascade
        );
        assert!("EXPLODE".parse::<ReferentialAction>().is_err());
    }

    #[test]
    fn kind_round_trips_through_visit_name() {
        for kind in ConstraintKind::ALL {
            assert_eq!(kind.visit_name().parse::<ConstraintKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_visit_name_is_rejected() {
        let err = "exclude_constraint".parse::<ConstraintKind>().unwrap_err();
        assert!(matches!(err, Error::UnknownConstraintKind(ref tag) if tag == "exclude_constraint"));
    }

    #[test]
    fn column_check_collapses_to_check_type() {
        assert_eq!(
            ConstraintKind::ColumnCheck.constraint_type(),
            ConstraintType::Check
        );
        assert_eq!(ConstraintKind::Check.constraint_type(), ConstraintType::Check);
    }

    #[test]
    fn on_delete_on_non_fk_is_noop() {
        let constraint = Constraint::check(Some("chk"), TableRef::new("t"), "x > 0")
            .on_delete(ReferentialAction::Cascade);
        assert_eq!(constraint.kind(), ConstraintKind::Check);
    }

    #[test]
    fn foreign_key_builder() {
        let constraint = Constraint::foreign_key(
            Some("fk_posts_user"),
            TableRef::new("posts"),
            vec!["user_id".to_string()],
            TableRef::new("users"),
            vec!["id".to_string()],
        )
        .on_delete(ReferentialAction::Cascade)
        .use_alter();

        let fk = constraint.foreign_key_spec().unwrap();
        assert_eq!(fk.ondelete, Some(ReferentialAction::Cascade));
        assert_eq!(fk.onupdate, None);
        assert!(fk.use_alter);
        assert_eq!(constraint.visit_name(), "foreign_key_constraint");
    }
}
