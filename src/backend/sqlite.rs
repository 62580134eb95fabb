use sea_query::{
    IndexCreateStatement, IndexDropStatement, InsertStatement, SqliteQueryBuilder,
    TableAlterStatement, TableCreateStatement, TableDropStatement, TableRenameStatement,
};

use crate::backend::Backend;
use crate::schema::{ConstraintType, TableRef};

#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Backend for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn supports_transactional_ddl(&self) -> bool {
        true
    }

    fn build_table_create(&self, stmt: TableCreateStatement) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    fn build_table_drop(&self, stmt: TableDropStatement) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    fn build_table_rename(&self, stmt: TableRenameStatement) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    fn build_table_alter(&self, stmt: TableAlterStatement) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    fn build_index_create(&self, stmt: IndexCreateStatement) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    fn build_index_drop(&self, stmt: IndexDropStatement) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    fn build_insert(&self, stmt: InsertStatement) -> String {
        stmt.to_string(SqliteQueryBuilder)
    }

    /// SQLite has no DROP CONSTRAINT; unique constraints added after table
    /// creation are unique indexes and are dropped as such.
    fn drop_constraint_sql(
        &self,
        table: &TableRef,
        constraint_name: &str,
        _constraint_type: Option<ConstraintType>,
    ) -> String {
        let index = TableRef::with_schema(constraint_name, table.schema.clone());
        format!("DROP INDEX IF EXISTS {}", self.quote_table(&index))
    }

    // The new name cannot carry a schema; the table stays in its own.
    fn rename_table_sql(&self, table: &TableRef, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME TO {}",
            self.quote_table(table),
            self.quote_identifier(new_name)
        )
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
