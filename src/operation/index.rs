use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::factory::SchemaFactory;
use crate::operation::{display_name, OpKind, Operation};
use crate::schema::{Index, IndexExpr, Options, TableRef};

/// Placeholder column used when a dropped index must be rebuilt without its
/// recorded columns; index construction rejects an empty column list.
const PLACEHOLDER_COLUMN: &str = "x";

#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexOp {
    pub index_name: Option<String>,
    pub table: TableRef,
    pub columns: Vec<IndexExpr>,
    pub unique: bool,
    pub quote: Option<bool>,
    pub kw: Options,
    /// The index this operation was derived from, returned by `to_index`
    /// as-is. Editing the other fields does not invalidate it; call
    /// [`CreateIndexOp::detach`] after editing.
    pub orig_index: Option<Arc<Index>>,
}

impl CreateIndexOp {
    pub fn new(
        index_name: impl Into<String>,
        table_name: impl Into<String>,
        columns: Vec<IndexExpr>,
    ) -> Self {
        Self {
            index_name: Some(index_name.into()),
            table: TableRef::new(table_name),
            columns,
            unique: false,
            quote: None,
            kw: Options::new(),
            orig_index: None,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kw.insert(key.into(), value.into());
        self
    }

    pub fn from_index(index: &Arc<Index>) -> Self {
        Self {
            index_name: index.name.clone(),
            table: index.table.clone(),
            columns: index.expressions.clone(),
            unique: index.unique,
            quote: index.quote,
            kw: index.kw.clone(),
            orig_index: Some(Arc::clone(index)),
        }
    }

    pub fn to_index(&self, factory: &dyn SchemaFactory) -> Result<Arc<Index>> {
        if let Some(ref index) = self.orig_index {
            return Ok(Arc::clone(index));
        }
        let index = factory.index(
            self.index_name.as_deref(),
            &self.table,
            &self.columns,
            self.unique,
            self.quote,
            &self.kw,
        )?;
        Ok(Arc::new(index))
    }

    /// Forget the originating index so `to_index` rebuilds from the fields.
    pub fn detach(&mut self) {
        self.orig_index = None;
    }

    pub fn reverse(&self) -> DropIndexOp {
        DropIndexOp {
            index_name: self.index_name.clone(),
            table: self.table.clone(),
            kw: self.kw.clone(),
        }
    }
}

impl Operation for CreateIndexOp {
    fn kind(&self) -> OpKind {
        OpKind::CreateIndex
    }

    fn describe(&self) -> String {
        format!(
            "Create index {} on {}",
            display_name(self.index_name.as_deref()),
            self.table
        )
    }
}

/// Drops an index by identity. The indexed columns are not recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct DropIndexOp {
    pub index_name: Option<String>,
    pub table: TableRef,
    pub kw: Options,
}

impl DropIndexOp {
    pub fn new(index_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            index_name: Some(index_name.into()),
            table: TableRef::new(table_name),
            kw: Options::new(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn from_index(index: &Index) -> Self {
        Self {
            index_name: index.name.clone(),
            table: index.table.clone(),
            kw: Options::new(),
        }
    }

    /// Builds a stand-in index addressing the dropped one. Its column list is
    /// a single placeholder column, not the original columns.
    pub fn to_index(&self, factory: &dyn SchemaFactory) -> Result<Index> {
        factory.index(
            self.index_name.as_deref(),
            &self.table,
            &[IndexExpr::column(PLACEHOLDER_COLUMN)],
            false,
            None,
            &self.kw,
        )
    }

    pub fn reverse(&self, factory: &dyn SchemaFactory) -> Result<CreateIndexOp> {
        warn!(
            index = display_name(self.index_name.as_deref()),
            table = %self.table,
            "reversing index drop without recorded columns; using placeholder column"
        );
        let index = Arc::new(self.to_index(factory)?);
        Ok(CreateIndexOp::from_index(&index))
    }
}

impl Operation for DropIndexOp {
    fn kind(&self) -> OpKind {
        OpKind::DropIndex
    }

    fn describe(&self) -> String {
        format!(
            "Drop index {} from {}",
            display_name(self.index_name.as_deref()),
            self.table
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::SchemaObjects;

    fn email_index() -> Arc<Index> {
        Arc::new(
            Index::new("idx_users_email", TableRef::new("users").in_schema("auth"))
                .column("email")
                .expression("lower(name)")
                .unique()
                .option("postgresql_using", "btree"),
        )
    }

    #[test]
    fn to_index_returns_the_original_object() {
        let index = email_index();
        let op = CreateIndexOp::from_index(&index);

        let rebuilt = op.to_index(&SchemaObjects::new(None)).unwrap();
        assert!(Arc::ptr_eq(&rebuilt, &index));
    }

    #[test]
    fn detached_index_is_rebuilt_from_fields() {
        let index = email_index();
        let mut op = CreateIndexOp::from_index(&index);
        op.detach();

        let rebuilt = op.to_index(&SchemaObjects::new(None)).unwrap();
        assert!(!Arc::ptr_eq(&rebuilt, &index));
        assert_eq!(*rebuilt, *index);
    }

    #[test]
    fn from_index_copies_expressions_and_options() {
        let op = CreateIndexOp::from_index(&email_index());

        assert_eq!(op.index_name.as_deref(), Some("idx_users_email"));
        assert_eq!(op.table.schema.as_deref(), Some("auth"));
        assert_eq!(op.columns.len(), 2);
        assert!(matches!(op.columns[1], IndexExpr::Expression(ref sql) if sql == "lower(name)"));
        assert!(op.unique);
        assert_eq!(op.kw.get("postgresql_using"), Some(&Value::from("btree")));
    }

    #[test]
    fn drop_index_to_index_uses_placeholder_column() {
        let op = DropIndexOp::from_index(&email_index());

        let index = op.to_index(&SchemaObjects::new(None)).unwrap();
        assert_eq!(index.name.as_deref(), Some("idx_users_email"));
        assert_eq!(index.table, TableRef::new("users").in_schema("auth"));
        assert_eq!(index.column_names(), vec![PLACEHOLDER_COLUMN]);
    }

    #[test]
    fn create_index_reverses_to_drop() {
        let op = CreateIndexOp::new("idx_email", "users", vec!["email".into()]);
        let drop = op.reverse();
        assert_eq!(drop.index_name.as_deref(), Some("idx_email"));
        assert_eq!(drop.table, TableRef::new("users"));
    }

    #[test]
    fn drop_index_reverses_to_create() {
        let op = DropIndexOp::new("idx_email", "users");
        let create = op.reverse(&SchemaObjects::new(None)).unwrap();
        assert_eq!(create.index_name.as_deref(), Some("idx_email"));
        assert!(create.orig_index.is_some());
    }

    #[test]
    fn add_index_describe() {
        let op = CreateIndexOp::new("idx_email", "users", vec!["email".into()]);
        assert_eq!(op.describe(), "Create index idx_email on users");
    }

    #[test]
    fn remove_index_describe() {
        let op = DropIndexOp::new("idx_email", "users");
        assert_eq!(op.describe(), "Drop index idx_email from users");
    }
}
