use tracing::{debug, trace};

use crate::backend::Backend;
use crate::dispatch::{Dispatcher, DEFAULT_QUALIFIER};
use crate::error::{Error, Result};
use crate::factory::{MigrationContext, SchemaObjects};
use crate::operation::{
    AddConstraintOp, AlterTableOp, MigrateOperation, OpContainer, OpKind, Operation,
};
use crate::schema::{ConstraintBody, ConstraintType, Index};
use crate::script::MigrationScript;

pub type RenderFn = fn(&DdlRenderer, &MigrateOperation) -> Result<Vec<String>>;

/// Statements for both directions of one script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedScript {
    pub upgrade: Vec<String>,
    pub downgrade: Vec<String>,
}

pub struct DdlRenderer {
    backend: Box<dyn Backend>,
    context: MigrationContext,
    handlers: Dispatcher<RenderFn>,
    transactional: bool,
}

impl std::fmt::Debug for DdlRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdlRenderer")
            .field("backend", &self.backend.name())
            .field("context", &self.context)
            .field("handlers", &self.handlers.len())
            .field("transactional", &self.transactional)
            .finish()
    }
}

impl DdlRenderer {
    pub fn new(backend: impl Backend + 'static) -> Result<Self> {
        Ok(Self {
            backend: Box::new(backend),
            context: MigrationContext::default(),
            handlers: default_handlers()?,
            transactional: false,
        })
    }

    pub fn context(mut self, context: MigrationContext) -> Self {
        self.context = context;
        self
    }

    /// Wrap each rendered script direction in a transaction when the
    /// backend supports transactional DDL.
    pub fn transactional(mut self, transactional: bool) -> Self {
        self.transactional = transactional;
        self
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn factory(&self) -> SchemaObjects<'_> {
        SchemaObjects::new(Some(&self.context))
    }

    /// Attach a handler for `kind`. Registering over an existing key fails;
    /// register for a more specific kind or qualifier instead.
    pub fn register(&mut self, kind: OpKind, qualifier: &str, handler: RenderFn) -> Result<()> {
        self.handlers.register_qualified(kind, qualifier, handler)
    }

    pub fn render(&self, op: &MigrateOperation) -> Result<Vec<String>> {
        let handler = self.handlers.dispatch_for(op, self.backend.name())?;
        let statements = handler(self, op)?;
        debug!(
            backend = self.backend.name(),
            operation = %op.describe(),
            statements = statements.len(),
            "rendered operation"
        );
        for statement in &statements {
            trace!(%statement);
        }
        Ok(statements)
    }

    /// Renders every child front to back.
    pub fn render_all<C: OpContainer + ?Sized>(&self, container: &C) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        for op in container.iter() {
            statements.extend(self.render(op)?);
        }
        Ok(statements)
    }

    pub fn render_script(&self, script: &MigrationScript) -> Result<RenderedScript> {
        debug!(revision = %script.rev_id, "rendering script");
        Ok(RenderedScript {
            upgrade: self.wrap(self.render_all(&script.upgrade_ops)?),
            downgrade: self.wrap(self.render_all(&script.downgrade_ops)?),
        })
    }

    fn wrap(&self, mut statements: Vec<String>) -> Vec<String> {
        let wrap = self.transactional && self.backend.supports_transactional_ddl();
        if wrap && !statements.is_empty() {
            statements.insert(0, "BEGIN".to_string());
            statements.push("COMMIT".to_string());
        }
        statements
    }
}

fn default_handlers() -> Result<Dispatcher<RenderFn>> {
    let mut handlers = Dispatcher::new();
    let defaults: [(OpKind, &str, RenderFn); 12] = [
        (OpKind::AddConstraint, DEFAULT_QUALIFIER, render_add_constraint),
        (OpKind::DropConstraint, DEFAULT_QUALIFIER, render_drop_constraint),
        (OpKind::CreateIndex, DEFAULT_QUALIFIER, render_create_index),
        (OpKind::DropIndex, DEFAULT_QUALIFIER, render_drop_index),
        (OpKind::CreateTable, DEFAULT_QUALIFIER, render_create_table),
        (OpKind::DropTable, DEFAULT_QUALIFIER, render_drop_table),
        (OpKind::AlterTable, DEFAULT_QUALIFIER, render_alter_table),
        (OpKind::BulkInsert, DEFAULT_QUALIFIER, render_bulk_insert),
        (OpKind::OpContainer, DEFAULT_QUALIFIER, render_container),
        (OpKind::AddConstraint, "sqlite", sqlite_add_constraint),
        (OpKind::DropConstraint, "sqlite", sqlite_drop_constraint),
        (OpKind::AlterColumn, "sqlite", sqlite_alter_column),
    ];
    for (kind, qualifier, handler) in defaults {
        handlers.register_qualified(kind, qualifier, handler)?;
    }
    Ok(handlers)
}

fn unexpected(expected: OpKind, op: &MigrateOperation) -> Error {
    Error::UnexpectedOperation {
        expected,
        found: op.kind(),
    }
}

fn unnamed(what: &str, op: &MigrateOperation) -> Error {
    Error::InvalidSchemaObject(format!(
        "cannot render {} without a name: {}",
        what,
        op.describe()
    ))
}

fn render_add_constraint(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::AddConstraint(add) = op else {
        return Err(unexpected(OpKind::AddConstraint, op));
    };
    let constraint = add.to_constraint(&renderer.factory())?;
    Ok(vec![renderer.backend.add_constraint_sql(&constraint)?])
}

fn render_drop_constraint(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::DropConstraint(drop) = op else {
        return Err(unexpected(OpKind::DropConstraint, op));
    };
    let name = drop
        .constraint_name
        .as_deref()
        .ok_or_else(|| unnamed("constraint drop", op))?;
    Ok(vec![renderer.backend.drop_constraint_sql(
        &drop.table,
        name,
        drop.constraint_type,
    )])
}

fn render_create_index(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::CreateIndex(create) = op else {
        return Err(unexpected(OpKind::CreateIndex, op));
    };
    let index = create.to_index(&renderer.factory())?;
    Ok(vec![renderer.backend.create_index_sql(&index)?])
}

fn render_drop_index(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::DropIndex(drop) = op else {
        return Err(unexpected(OpKind::DropIndex, op));
    };
    let name = drop
        .index_name
        .as_deref()
        .ok_or_else(|| unnamed("index drop", op))?;
    Ok(vec![renderer.backend.drop_index_sql(&drop.table, name)])
}

fn render_create_table(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::CreateTable(create) = op else {
        return Err(unexpected(OpKind::CreateTable, op));
    };
    let table = create.to_table(&renderer.factory())?;
    Ok(vec![renderer.backend.create_table_sql(&table)?])
}

fn render_drop_table(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::DropTable(drop) = op else {
        return Err(unexpected(OpKind::DropTable, op));
    };
    Ok(vec![renderer.backend.drop_table_sql(&drop.table)])
}

fn render_alter_table(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::AlterTable(alter) = op else {
        return Err(unexpected(OpKind::AlterTable, op));
    };
    let backend = renderer.backend();
    match alter {
        AlterTableOp::RenameTable(rename) => Ok(vec![
            backend.rename_table_sql(&rename.table, &rename.new_table_name),
        ]),
        AlterTableOp::AlterColumn(alter_column) => backend.alter_column_sql(alter_column),
        AlterTableOp::AddColumn(add) => Ok(vec![backend.add_column_sql(&add.table, &add.column)]),
        AlterTableOp::DropColumn(drop) => {
            Ok(vec![backend.drop_column_sql(&drop.table, &drop.column_name)])
        }
    }
}

fn render_bulk_insert(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::BulkInsert(insert) = op else {
        return Err(unexpected(OpKind::BulkInsert, op));
    };
    renderer.backend.bulk_insert_sql(insert)
}

fn render_container(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::ModifyTable(container) = op else {
        return Err(unexpected(OpKind::OpContainer, op));
    };
    renderer.render_all(container)
}

/// SQLite cannot add constraints to an existing table. Unique constraints
/// become unique indexes; everything else is refused.
fn sqlite_add_constraint(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::AddConstraint(add) = op else {
        return Err(unexpected(OpKind::AddConstraint, op));
    };
    let AddConstraintOp::Unique(_) = add else {
        return Err(Error::Unsupported {
            backend: renderer.backend.name(),
            operation: op.describe(),
        });
    };

    let constraint = add.to_constraint(&renderer.factory())?;
    let ConstraintBody::Unique { ref columns } = constraint.body else {
        return Err(unexpected(OpKind::CreateUniqueConstraint, op));
    };
    let name = constraint
        .name
        .as_deref()
        .ok_or_else(|| unnamed("unique constraint", op))?;

    let mut index = Index::new(name, constraint.table.clone()).unique();
    for column in columns {
        index = index.column(column.clone());
    }
    Ok(vec![renderer.backend.create_index_sql(&index)?])
}

fn sqlite_drop_constraint(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::DropConstraint(drop) = op else {
        return Err(unexpected(OpKind::DropConstraint, op));
    };
    match drop.constraint_type {
        None | Some(ConstraintType::Unique) => render_drop_constraint(renderer, op),
        Some(_) => Err(Error::Unsupported {
            backend: renderer.backend.name(),
            operation: op.describe(),
        }),
    }
}

/// SQLite can only rename a column in place.
fn sqlite_alter_column(renderer: &DdlRenderer, op: &MigrateOperation) -> Result<Vec<String>> {
    let MigrateOperation::AlterTable(AlterTableOp::AlterColumn(alter)) = op else {
        return Err(unexpected(OpKind::AlterColumn, op));
    };
    let rename_only = alter.modify_name.is_some()
        && alter.modify_type.is_none()
        && alter.modify_nullable.is_none()
        && alter.modify_server_default.is_none()
        && alter.modify_comment.is_none();
    if !rename_only {
        return Err(Error::Unsupported {
            backend: renderer.backend.name(),
            operation: op.describe(),
        });
    }
    renderer.backend.alter_column_sql(alter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MySql, Postgres, Sqlite};
    use crate::factory::NamingConvention;
    use crate::operation::{
        AddColumnOp, AlterColumnOp, CreateCheckConstraintOp, CreateIndexOp, CreateTableOp,
        CreateUniqueConstraintOp, DowngradeOps, DropColumnOp, DropConstraintOp, ModifyTableOps,
        UpgradeOps,
    };
    use crate::schema::{Column, ColumnType};

    fn users_upgrade() -> UpgradeOps {
        UpgradeOps::new(vec![
            CreateTableOp::new("users", Vec::new())
                .element(Column::new("id", ColumnType::Serial).primary_key())
                .into(),
            ModifyTableOps::new(
                "users",
                vec![
                    AddColumnOp::new("users", Column::new("email", ColumnType::Text)).into(),
                    CreateIndexOp::new("idx_users_email", "users", vec!["email".into()]).into(),
                ],
            )
            .into(),
        ])
    }

    #[test]
    fn containers_render_front_to_back() {
        let renderer = DdlRenderer::new(Sqlite).unwrap();
        let sql = renderer.render_all(&users_upgrade()).unwrap();

        assert_eq!(sql.len(), 3);
        assert!(sql[0].starts_with("CREATE TABLE"));
        assert!(sql[1].contains("ADD COLUMN \"email\""));
        assert!(sql[2].starts_with("CREATE INDEX"));
    }

    #[test]
    fn sqlite_refuses_type_changes() {
        let renderer = DdlRenderer::new(Sqlite).unwrap();
        let op = AlterColumnOp::new("users", "age").set_type(ColumnType::BigInt).into();

        assert!(matches!(
            renderer.render(&op),
            Err(Error::Unsupported { backend: "sqlite", .. })
        ));
    }

    #[test]
    fn sqlite_allows_column_rename() {
        let renderer = DdlRenderer::new(Sqlite).unwrap();
        let op = AlterColumnOp::new("users", "email").rename_to("email_address").into();

        let sql = renderer.render(&op).unwrap();
        assert_eq!(
            sql,
            vec!["ALTER TABLE \"users\" RENAME COLUMN \"email\" TO \"email_address\""]
        );
    }

    #[test]
    fn sqlite_unique_constraint_becomes_index() {
        let renderer = DdlRenderer::new(Sqlite).unwrap();
        let op =
            CreateUniqueConstraintOp::new(Some("uq_email"), "users", vec!["email".to_string()]).into();

        let sql = renderer.render(&op).unwrap();
        assert!(sql[0].starts_with("CREATE UNIQUE INDEX \"uq_email\""));
    }

    #[test]
    fn sqlite_refuses_check_constraints_and_typed_drops() {
        let renderer = DdlRenderer::new(Sqlite).unwrap();
        let add = CreateCheckConstraintOp::new(Some("ck_age"), "users", "age > 0").into();
        let drop = DropConstraintOp::new(Some("fk_user"), "posts")
            .with_type(ConstraintType::ForeignKey)
            .into();

        assert!(matches!(renderer.render(&add), Err(Error::Unsupported { .. })));
        assert!(matches!(renderer.render(&drop), Err(Error::Unsupported { .. })));
    }

    #[test]
    fn postgres_uses_default_handlers() {
        let renderer = DdlRenderer::new(Postgres).unwrap();
        let op = CreateCheckConstraintOp::new(Some("ck_age"), "users", "age > 0").into();

        let sql = renderer.render(&op).unwrap();
        assert_eq!(
            sql,
            vec!["ALTER TABLE \"users\" ADD CONSTRAINT \"ck_age\" CHECK (age > 0)"]
        );
    }

    #[test]
    fn naming_convention_names_anonymous_constraints() {
        let convention = NamingConvention::new().with("uq", "uq_%(table_name)s_%(column_0_name)s");
        let context = MigrationContext::new().naming_convention(convention);
        let renderer = DdlRenderer::new(Postgres).unwrap().context(context);
        let op = CreateUniqueConstraintOp::new(None, "users", vec!["email".to_string()]).into();

        let sql = renderer.render(&op).unwrap();
        assert!(sql[0].contains("CONSTRAINT \"uq_users_email\" UNIQUE"));
    }

    #[test]
    fn unnamed_drop_is_rejected() {
        let renderer = DdlRenderer::new(MySql).unwrap();
        let op = DropConstraintOp::new(None, "users").into();

        assert!(matches!(renderer.render(&op), Err(Error::InvalidSchemaObject(_))));
    }

    #[test]
    fn default_handlers_register_every_entry() {
        let handlers = default_handlers().unwrap();
        assert_eq!(handlers.len(), 12);
        assert!(handlers.contains(OpKind::AlterColumn, "sqlite"));

        let mut renderer = DdlRenderer::new(Sqlite).unwrap();
        let result = renderer.register(OpKind::AddConstraint, "sqlite", sqlite_add_constraint);
        assert!(matches!(result, Err(Error::DuplicateHandler { .. })));
    }

    #[test]
    fn custom_handler_overrides_family_for_one_kind() {
        fn noop(_: &DdlRenderer, _: &MigrateOperation) -> Result<Vec<String>> {
            Ok(vec!["-- skipped".to_string()])
        }

        let mut renderer = DdlRenderer::new(Postgres).unwrap();
        renderer
            .register(OpKind::DropColumn, DEFAULT_QUALIFIER, noop)
            .unwrap();

        let drop = DropColumnOp::new("users", "email").into();
        let add = AddColumnOp::new("users", Column::new("email", ColumnType::Text)).into();
        assert_eq!(renderer.render(&drop).unwrap(), vec!["-- skipped"]);
        assert!(renderer.render(&add).unwrap()[0].contains("ADD COLUMN"));
    }

    #[test]
    fn render_script_wraps_transactions() {
        let renderer = DdlRenderer::new(Postgres).unwrap().transactional(true);
        let upgrade = users_upgrade();
        let script = MigrationScript::reversible("abc123", upgrade, &renderer.factory()).unwrap();

        let rendered = renderer.render_script(&script).unwrap();
        assert_eq!(rendered.upgrade.first().map(String::as_str), Some("BEGIN"));
        assert_eq!(rendered.upgrade.last().map(String::as_str), Some("COMMIT"));
        assert!(rendered.downgrade[1].starts_with("DROP INDEX"));
        assert!(rendered.downgrade.iter().any(|s| s.starts_with("DROP TABLE")));
    }

    #[test]
    fn empty_direction_is_not_wrapped() {
        let renderer = DdlRenderer::new(Postgres).unwrap().transactional(true);
        let script = MigrationScript::new("abc", UpgradeOps::default(), DowngradeOps::default());

        let rendered = renderer.render_script(&script).unwrap();
        assert!(rendered.upgrade.is_empty());
    }
}
