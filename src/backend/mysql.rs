use sea_query::{
    IndexCreateStatement, IndexDropStatement, InsertStatement, MysqlQueryBuilder,
    TableAlterStatement, TableCreateStatement, TableDropStatement, TableRenameStatement,
};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::schema::{ConstraintType, TableRef};

#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Backend for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn supports_transactional_ddl(&self) -> bool {
        // MySQL issues implicit commits for DDL statements
        false
    }

    fn restates_column_on_alter(&self) -> bool {
        true
    }

    fn build_table_create(&self, stmt: TableCreateStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    fn build_table_drop(&self, stmt: TableDropStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    fn build_table_rename(&self, stmt: TableRenameStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    fn build_table_alter(&self, stmt: TableAlterStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    fn build_index_create(&self, stmt: IndexCreateStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    fn build_index_drop(&self, stmt: IndexDropStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    fn build_insert(&self, stmt: InsertStatement) -> String {
        stmt.to_string(MysqlQueryBuilder)
    }

    fn column_comment_sql(
        &self,
        table: &TableRef,
        column_name: &str,
        _comment: Option<&str>,
    ) -> Result<String> {
        Err(Error::Unsupported {
            backend: self.name(),
            operation: format!("changing the comment of {} on {}", column_name, table),
        })
    }

    fn drop_constraint_sql(
        &self,
        table: &TableRef,
        constraint_name: &str,
        constraint_type: Option<ConstraintType>,
    ) -> String {
        let table = self.quote_table(table);
        let name = self.quote_identifier(constraint_name);
        match constraint_type {
            Some(ConstraintType::ForeignKey) => {
                format!("ALTER TABLE {} DROP FOREIGN KEY {}", table, name)
            }
            Some(ConstraintType::Primary) => format!("ALTER TABLE {} DROP PRIMARY KEY", table),
            Some(ConstraintType::Check) => format!("ALTER TABLE {} DROP CHECK {}", table, name),
            Some(ConstraintType::Unique) | None => {
                format!("ALTER TABLE {} DROP INDEX {}", table, name)
            }
        }
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }
}
