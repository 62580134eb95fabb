mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use sea_query::{
    Alias, ColumnDef, Expr, ForeignKey as SeaForeignKey, ForeignKeyAction, Index as SeaIndex,
    IndexCreateStatement, IndexDropStatement, InsertStatement, IntoTableRef, Keyword, Query,
    SimpleExpr, Table as SeaTable, TableAlterStatement, TableCreateStatement, TableDropStatement,
    TableRef as SeaTableRef, TableRenameStatement,
};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::operation::{AlterColumnOp, BulkInsertOp};
use crate::schema::{
    Column, ColumnType, Constraint, ConstraintBody, ConstraintType, ForeignKeySpec, Index,
    IndexExpr, IndexOrder, ReferentialAction, Table, TableRef,
};

pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;
    fn supports_transactional_ddl(&self) -> bool;

    /// Whether altering one attribute of a column requires restating the
    /// whole column definition.
    fn restates_column_on_alter(&self) -> bool {
        false
    }

    fn build_table_create(&self, stmt: TableCreateStatement) -> String;
    fn build_table_drop(&self, stmt: TableDropStatement) -> String;
    fn build_table_rename(&self, stmt: TableRenameStatement) -> String;
    fn build_table_alter(&self, stmt: TableAlterStatement) -> String;
    fn build_index_create(&self, stmt: IndexCreateStatement) -> String;
    fn build_index_drop(&self, stmt: IndexDropStatement) -> String;
    fn build_insert(&self, stmt: InsertStatement) -> String;

    fn quote_identifier(&self, name: &str) -> String;

    fn quote_table(&self, table: &TableRef) -> String {
        match table.schema {
            Some(ref schema) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.quote_identifier(&table.name)
            ),
            None => self.quote_identifier(&table.name),
        }
    }

    fn create_table_sql(&self, table: &Table) -> Result<String> {
        let mut stmt = SeaTable::create();
        stmt.table(table_iden(&table.table_ref()));

        for column in &table.columns {
            stmt.col(column_to_column_def(column));
        }

        let has_column_pk = table.columns.iter().any(|c| c.primary_key);
        for constraint in &table.constraints {
            match constraint.body {
                ConstraintBody::PrimaryKey { ref columns } => {
                    if !has_column_pk {
                        let mut pk = SeaIndex::create();
                        for col in columns {
                            pk.col(Alias::new(col));
                        }
                        stmt.primary_key(&mut pk);
                    }
                }
                ConstraintBody::Unique { ref columns } => {
                    let mut unique = SeaIndex::create();
                    unique.unique();
                    if let Some(ref name) = constraint.name {
                        unique.name(name);
                    }
                    for col in columns {
                        unique.col(Alias::new(col));
                    }
                    stmt.index(&mut unique);
                }
                ConstraintBody::ForeignKey(ref fk) => {
                    let mut create = SeaForeignKey::create();
                    if let Some(ref name) = constraint.name {
                        create.name(name);
                    }
                    for col in &fk.columns {
                        create.from_col(Alias::new(col));
                    }
                    create.to_tbl(table_iden(&fk.referent));
                    for col in &fk.referent_columns {
                        create.to_col(Alias::new(col));
                    }
                    if let Some(action) = fk.ondelete {
                        create.on_delete(referential_action_to_sea(action));
                    }
                    if let Some(action) = fk.onupdate {
                        create.on_update(referential_action_to_sea(action));
                    }
                    stmt.foreign_key(&mut create);
                }
                // Table-level checks are emitted without their name.
                ConstraintBody::Check { ref condition }
                | ConstraintBody::ColumnCheck { ref condition, .. } => {
                    stmt.check(Expr::cust(condition));
                }
            }
        }

        Ok(self.build_table_create(stmt))
    }

    fn drop_table_sql(&self, table: &TableRef) -> String {
        let stmt = SeaTable::drop().table(table_iden(table)).to_owned();
        self.build_table_drop(stmt)
    }

    fn rename_table_sql(&self, table: &TableRef, new_name: &str) -> String {
        let renamed = TableRef::with_schema(new_name, table.schema.clone());
        let stmt = SeaTable::rename()
            .table(table_iden(table), table_iden(&renamed))
            .to_owned();
        self.build_table_rename(stmt)
    }

    fn add_column_sql(&self, table: &TableRef, column: &Column) -> String {
        let stmt = SeaTable::alter()
            .table(table_iden(table))
            .add_column(column_to_column_def(column))
            .to_owned();
        self.build_table_alter(stmt)
    }

    fn drop_column_sql(&self, table: &TableRef, column_name: &str) -> String {
        let stmt = SeaTable::alter()
            .table(table_iden(table))
            .drop_column(Alias::new(column_name))
            .to_owned();
        self.build_table_alter(stmt)
    }

    /// Statements applying every change in `op`, rename last so the other
    /// changes address the column by its current name.
    fn alter_column_sql(&self, op: &AlterColumnOp) -> Result<Vec<String>> {
        let mut statements = Vec::new();

        let column_type = match op.modify_type {
            Some(ref column_type) => Some(column_type),
            None if self.restates_column_on_alter() => op.existing_type.as_ref(),
            None => None,
        };
        let nullable = match op.modify_nullable {
            Some(nullable) => Some(nullable),
            None if self.restates_column_on_alter() => op.existing_nullable,
            None => None,
        };
        let default = match op.modify_server_default {
            Some(Some(ref default)) => Some(default),
            Some(None) => None,
            None if self.restates_column_on_alter() => {
                op.existing_server_default.as_ref().and_then(Option::as_ref)
            }
            None => None,
        };

        let modifies = op.modify_type.is_some()
            || op.modify_nullable.is_some()
            || matches!(op.modify_server_default, Some(Some(_)));
        if modifies {
            if self.restates_column_on_alter() && column_type.is_none() {
                return Err(Error::Unsupported {
                    backend: self.name(),
                    operation: format!(
                        "altering column {} on {} without its type",
                        op.column_name, op.table
                    ),
                });
            }

            let mut col = ColumnDef::new(Alias::new(&op.column_name));
            if let Some(column_type) = column_type {
                apply_column_type(&mut col, column_type);
            }
            match nullable {
                Some(true) => {
                    col.null();
                }
                Some(false) => {
                    col.not_null();
                }
                None => {}
            }
            if let Some(default) = default {
                col.default(Expr::cust(default));
            }

            let stmt = SeaTable::alter()
                .table(table_iden(&op.table))
                .modify_column(col)
                .to_owned();
            statements.push(self.build_table_alter(stmt));
        }

        if let Some(None) = op.modify_server_default {
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                self.quote_table(&op.table),
                self.quote_identifier(&op.column_name)
            ));
        }

        if let Some(ref comment) = op.modify_comment {
            statements.push(self.column_comment_sql(
                &op.table,
                &op.column_name,
                comment.as_deref(),
            )?);
        }

        if let Some(ref new_name) = op.modify_name {
            let stmt = SeaTable::alter()
                .table(table_iden(&op.table))
                .rename_column(Alias::new(&op.column_name), Alias::new(new_name))
                .to_owned();
            statements.push(self.build_table_alter(stmt));
        }

        Ok(statements)
    }

    fn column_comment_sql(
        &self,
        table: &TableRef,
        column_name: &str,
        comment: Option<&str>,
    ) -> Result<String> {
        let comment = match comment {
            Some(text) => format!("'{}'", text.replace('\'', "''")),
            None => "NULL".to_string(),
        };
        Ok(format!(
            "COMMENT ON COLUMN {}.{} IS {}",
            self.quote_table(table),
            self.quote_identifier(column_name),
            comment
        ))
    }

    fn create_index_sql(&self, index: &Index) -> Result<String> {
        let name = index
            .name
            .as_deref()
            .ok_or_else(|| {
                Error::InvalidSchemaObject(format!("index on {} has no name", index.table))
            })?;

        let has_expressions = index
            .expressions
            .iter()
            .any(|expr| matches!(expr, IndexExpr::Expression(_)));

        if has_expressions {
            // sea-query indexes only take column references
            let parts: Vec<String> = index
                .expressions
                .iter()
                .map(|expr| match expr {
                    IndexExpr::Column { name, order } => match order {
                        IndexOrder::Asc => self.quote_identifier(name),
                        IndexOrder::Desc => format!("{} DESC", self.quote_identifier(name)),
                    },
                    IndexExpr::Expression(sql) => format!("({})", sql),
                })
                .collect();
            return Ok(format!(
                "CREATE {}INDEX {} ON {} ({})",
                if index.unique { "UNIQUE " } else { "" },
                self.quote_identifier(name),
                self.quote_table(&index.table),
                parts.join(", ")
            ));
        }

        let mut stmt = SeaIndex::create();
        stmt.name(name).table(table_iden(&index.table));

        if index.unique {
            stmt.unique();
        }

        for expr in &index.expressions {
            if let IndexExpr::Column { name, order } = expr {
                match order {
                    IndexOrder::Asc => stmt.col(Alias::new(name)),
                    IndexOrder::Desc => stmt.col((Alias::new(name), sea_query::IndexOrder::Desc)),
                };
            }
        }

        Ok(self.build_index_create(stmt.to_owned()))
    }

    fn drop_index_sql(&self, table: &TableRef, index_name: &str) -> String {
        let stmt = SeaIndex::drop()
            .name(index_name)
            .table(table_iden(table))
            .to_owned();
        self.build_index_drop(stmt)
    }

    fn add_constraint_sql(&self, constraint: &Constraint) -> Result<String> {
        let prefix = match constraint.name {
            Some(ref name) => format!("CONSTRAINT {} ", self.quote_identifier(name)),
            None => String::new(),
        };

        let body = match constraint.body {
            ConstraintBody::PrimaryKey { ref columns } => {
                format!("PRIMARY KEY ({})", self.quote_list(columns))
            }
            ConstraintBody::Unique { ref columns } => {
                format!("UNIQUE ({})", self.quote_list(columns))
            }
            ConstraintBody::ForeignKey(ref fk) => self.foreign_key_clause(fk),
            ConstraintBody::Check { ref condition }
            | ConstraintBody::ColumnCheck { ref condition, .. } => {
                format!("CHECK ({})", condition)
            }
        };

        let mut sql = format!(
            "ALTER TABLE {} ADD {}{}",
            self.quote_table(&constraint.table),
            prefix,
            body
        );
        if constraint.deferrable == Some(true) {
            sql.push_str(" DEFERRABLE");
        }
        if let Some(ref initially) = constraint.initially {
            sql.push_str(" INITIALLY ");
            sql.push_str(&initially.to_uppercase());
        }
        Ok(sql)
    }

    fn drop_constraint_sql(
        &self,
        table: &TableRef,
        constraint_name: &str,
        constraint_type: Option<ConstraintType>,
    ) -> String;

    fn bulk_insert_sql(&self, op: &BulkInsertOp) -> Result<Vec<String>> {
        if op.rows.is_empty() {
            return Ok(Vec::new());
        }

        let columns = op.column_names();
        let table = op.table.table_ref();
        if columns.is_empty() {
            return Err(Error::InvalidSchemaObject(format!(
                "no columns to insert into {}",
                table
            )));
        }
        let new_stmt = || {
            let mut stmt = Query::insert();
            stmt.into_table(table_iden(&table))
                .columns(columns.iter().map(Alias::new));
            stmt
        };

        let mut statements = Vec::new();
        let mut stmt = new_stmt();
        for row in &op.rows {
            let values = columns
                .iter()
                .map(|column| {
                    row.get(column)
                        .map(json_to_expr)
                        .unwrap_or(SimpleExpr::Keyword(Keyword::Null))
                });
            stmt.values(values)?;

            if !op.multiinsert {
                statements.push(self.build_insert(stmt));
                stmt = new_stmt();
            }
        }
        if op.multiinsert {
            statements.push(self.build_insert(stmt));
        }

        Ok(statements)
    }

    fn quote_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|name| self.quote_identifier(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn foreign_key_clause(&self, fk: &ForeignKeySpec) -> String {
        let mut clause = format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_list(&fk.columns),
            self.quote_table(&fk.referent),
            self.quote_list(&fk.referent_columns)
        );
        if let Some(action) = fk.ondelete {
            clause.push_str(" ON DELETE ");
            clause.push_str(action.as_sql());
        }
        if let Some(action) = fk.onupdate {
            clause.push_str(" ON UPDATE ");
            clause.push_str(action.as_sql());
        }
        clause
    }
}

fn table_iden(table: &TableRef) -> SeaTableRef {
    match table.schema {
        Some(ref schema) => (Alias::new(schema), Alias::new(&table.name)).into_table_ref(),
        None => Alias::new(&table.name).into_table_ref(),
    }
}

fn column_to_column_def(column: &Column) -> ColumnDef {
    let mut col = ColumnDef::new(Alias::new(&column.name));

    apply_column_type(&mut col, &column.column_type);

    if column.primary_key {
        col.primary_key();
        if matches!(column.column_type, ColumnType::Serial | ColumnType::BigSerial) {
            col.auto_increment();
        }
    }

    if !column.nullable && !column.primary_key {
        col.not_null();
    }

    if column.unique && !column.primary_key {
        col.unique_key();
    }

    if let Some(ref default) = column.server_default {
        col.default(Expr::cust(default));
    }

    col
}

fn apply_column_type(col: &mut ColumnDef, column_type: &ColumnType) {
    match column_type {
        ColumnType::Serial | ColumnType::Integer => {
            col.integer();
        }
        ColumnType::BigSerial | ColumnType::BigInt => {
            col.big_integer();
        }
        ColumnType::SmallInt => {
            col.small_integer();
        }
        ColumnType::Text => {
            col.text();
        }
        ColumnType::VarChar(len) => {
            col.string_len(*len as u32);
        }
        ColumnType::Boolean => {
            col.boolean();
        }
        ColumnType::Timestamp => {
            col.timestamp();
        }
        ColumnType::TimestampTz => {
            col.timestamp_with_time_zone();
        }
        ColumnType::Date => {
            col.date();
        }
        ColumnType::Time => {
            col.time();
        }
        ColumnType::Uuid => {
            col.uuid();
        }
        ColumnType::Json => {
            col.json();
        }
        ColumnType::JsonB => {
            col.json_binary();
        }
        ColumnType::Binary => {
            col.binary();
        }
        ColumnType::Real => {
            col.float();
        }
        ColumnType::DoublePrecision => {
            col.double();
        }
        ColumnType::Decimal { precision, scale } => {
            col.decimal_len(*precision as u32, *scale as u32);
        }
        ColumnType::Custom(name) => {
            col.custom(Alias::new(name));
        }
        ColumnType::Null => {}
    }
}

fn referential_action_to_sea(action: ReferentialAction) -> ForeignKeyAction {
    match action {
        ReferentialAction::NoAction => ForeignKeyAction::NoAction,
        ReferentialAction::Restrict => ForeignKeyAction::Restrict,
        ReferentialAction::Cascade => ForeignKeyAction::Cascade,
        ReferentialAction::SetNull => ForeignKeyAction::SetNull,
        ReferentialAction::SetDefault => ForeignKeyAction::SetDefault,
    }
}

fn json_to_expr(value: &Value) -> SimpleExpr {
    match value {
        Value::Null => SimpleExpr::Keyword(Keyword::Null),
        Value::Bool(b) => Expr::val(*b).into(),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Expr::val(i).into(),
            (None, Some(u)) => Expr::val(u).into(),
            (None, None) => Expr::val(n.as_f64().unwrap_or_default()).into(),
        },
        Value::String(s) => Expr::val(s.as_str()).into(),
        other => Expr::val(other.to_string()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Row;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row literal must be an object"),
        }
    }

    #[test]
    fn quote_table_qualifies_schema() {
        let table = TableRef::new("users").in_schema("auth");
        assert_eq!(Postgres.quote_table(&table), "\"auth\".\"users\"");
        assert_eq!(MySql.quote_table(&table), "`auth`.`users`");
    }

    #[test]
    fn add_named_foreign_key() {
        let constraint = Constraint::foreign_key(
            Some("fk_posts_user"),
            TableRef::new("posts"),
            vec!["user_id".to_string()],
            TableRef::new("users"),
            vec!["id".to_string()],
        )
        .on_delete(ReferentialAction::Cascade);

        let sql = Postgres.add_constraint_sql(&constraint).unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE \"posts\" ADD CONSTRAINT \"fk_posts_user\" FOREIGN KEY (\"user_id\") \
             REFERENCES \"users\" (\"id\") ON DELETE CASCADE"
        );
    }

    #[test]
    fn add_deferrable_unique() {
        let constraint = Constraint::unique(
            Some("uq_t1_ab"),
            TableRef::new("t1"),
            vec!["a".to_string(), "b".to_string()],
        )
        .with_deferrable(true)
        .with_initially("deferred");

        let sql = Postgres.add_constraint_sql(&constraint).unwrap();
        assert!(sql.ends_with("UNIQUE (\"a\", \"b\") DEFERRABLE INITIALLY DEFERRED"));
    }

    #[test]
    fn expression_index_is_formatted() {
        let index = Index::new("idx_lower_email", TableRef::new("users"))
            .expression("lower(email)")
            .column_desc("created_at");

        let sql = Postgres.create_index_sql(&index).unwrap();
        assert_eq!(
            sql,
            "CREATE INDEX \"idx_lower_email\" ON \"users\" ((lower(email)), \"created_at\" DESC)"
        );
    }

    #[test]
    fn unnamed_index_is_rejected() {
        let mut index = Index::new("idx", TableRef::new("users")).column("email");
        index.name = None;
        assert!(matches!(
            Postgres.create_index_sql(&index),
            Err(Error::InvalidSchemaObject(_))
        ));
    }

    #[test]
    fn alter_column_drops_default_and_renames_last() {
        let op = AlterColumnOp::new("users", "status")
            .set_server_default(None)
            .rename_to("state");

        let sql = Postgres.alter_column_sql(&op).unwrap();
        assert_eq!(sql.len(), 2);
        assert_eq!(sql[0], "ALTER TABLE \"users\" ALTER COLUMN \"status\" DROP DEFAULT");
        assert!(sql[1].contains("RENAME COLUMN \"status\" TO \"state\""));
    }

    #[test]
    fn bulk_insert_single_statement() {
        let table = Table::new("users")
            .column("id", ColumnType::Integer)
            .column("email", ColumnType::Text);
        let op = BulkInsertOp::new(
            table,
            vec![
                row(json!({"id": 1, "email": "a@example.com"})),
                row(json!({"id": 2})),
            ],
        );

        let sql = Sqlite.bulk_insert_sql(&op).unwrap();
        assert_eq!(sql.len(), 1);
        assert!(sql[0].starts_with("INSERT INTO \"users\" (\"id\", \"email\") VALUES"));
        assert!(sql[0].contains("'a@example.com'"));
        assert!(sql[0].contains("NULL"));
    }

    #[test]
    fn bulk_insert_statement_per_row() {
        let op = BulkInsertOp::new(
            Table::new("users").column("id", ColumnType::Integer),
            vec![row(json!({"id": 1})), row(json!({"id": 2})), row(json!({"id": 3}))],
        )
        .multiinsert(false);

        let sql = Sqlite.bulk_insert_sql(&op).unwrap();
        assert_eq!(sql.len(), 3);
        assert!(sql[2].contains("(3)"));
    }

    #[test]
    fn bulk_insert_without_columns_is_rejected() {
        let op = BulkInsertOp::new(Table::new("t"), vec![Row::new(), Row::new()]);

        let result = Postgres.bulk_insert_sql(&op);
        assert!(matches!(result, Err(Error::InvalidSchemaObject(_))));
    }
}
