use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::schema::options::{self, keys};
use crate::schema::{
    Column, ColumnType, Constraint, Index, IndexExpr, Options, Table, TableElement, TableRef,
};

pub trait SchemaFactory {
    fn primary_key_constraint(
        &self,
        name: Option<&str>,
        table: &TableRef,
        columns: &[String],
        kw: &Options,
    ) -> Result<Constraint>;

    fn unique_constraint(
        &self,
        name: Option<&str>,
        table: &TableRef,
        columns: &[String],
        kw: &Options,
    ) -> Result<Constraint>;

    fn foreign_key_constraint(
        &self,
        name: Option<&str>,
        source: &TableRef,
        referent: &TableRef,
        local_cols: &[String],
        remote_cols: &[String],
        kw: &Options,
    ) -> Result<Constraint>;

    fn check_constraint(
        &self,
        name: Option<&str>,
        table: &TableRef,
        condition: &str,
        kw: &Options,
    ) -> Result<Constraint>;

    fn index(
        &self,
        name: Option<&str>,
        table: &TableRef,
        expressions: &[IndexExpr],
        unique: bool,
        quote: Option<bool>,
        kw: &Options,
    ) -> Result<Index>;

    fn table(
        &self,
        name: &str,
        schema: Option<&str>,
        elements: &[TableElement],
        kw: &Options,
    ) -> Result<Table>;

    fn column(&self, name: &str, column_type: ColumnType, kw: &Options) -> Result<Column>;
}

/// Templates for naming anonymous constraints and indexes, keyed by `pk`,
/// `uq`, `fk`, `ck` and `ix`.
///
/// Supported tokens: `%(table_name)s`, `%(column_0_name)s`,
/// `%(referred_table_name)s`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamingConvention {
    templates: BTreeMap<String, String>,
}

impl NamingConvention {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn render(
        &self,
        key: &str,
        table: &TableRef,
        column_0: Option<&str>,
        referred_table: Option<&TableRef>,
    ) -> Option<String> {
        let template = self.templates.get(key)?;
        let mut name = template.replace("%(table_name)s", &table.name);
        if let Some(column) = column_0 {
            name = name.replace("%(column_0_name)s", column);
        }
        if let Some(referred) = referred_table {
            name = name.replace("%(referred_table_name)s", &referred.name);
        }
        Some(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MigrationContext {
    pub naming_convention: NamingConvention,
}

impl MigrationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn naming_convention(mut self, convention: NamingConvention) -> Self {
        self.naming_convention = convention;
        self
    }
}

/// Builds the in-memory [`crate::schema`] model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaObjects<'a> {
    context: Option<&'a MigrationContext>,
}

impl<'a> SchemaObjects<'a> {
    pub fn new(context: Option<&'a MigrationContext>) -> Self {
        Self { context }
    }

    fn resolve_name(
        &self,
        name: Option<&str>,
        key: &str,
        table: &TableRef,
        column_0: Option<&str>,
        referred_table: Option<&TableRef>,
    ) -> Option<String> {
        if let Some(name) = name {
            return Some(name.to_string());
        }
        self.context.and_then(|ctx| {
            ctx.naming_convention
                .render(key, table, column_0, referred_table)
        })
    }
}

fn apply_constraint_options(mut constraint: Constraint, kw: &Options) -> Constraint {
    constraint.deferrable = options::get_bool(kw, keys::DEFERRABLE);
    constraint.initially = options::get_str(kw, keys::INITIALLY).map(str::to_string);
    constraint.kw = kw
        .iter()
        .filter(|(key, _)| {
            !matches!(
                key.as_str(),
                keys::DEFERRABLE
                    | keys::INITIALLY
                    | keys::ONUPDATE
                    | keys::ONDELETE
                    | keys::USE_ALTER
            )
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    constraint
}

impl SchemaFactory for SchemaObjects<'_> {
    fn primary_key_constraint(
        &self,
        name: Option<&str>,
        table: &TableRef,
        columns: &[String],
        kw: &Options,
    ) -> Result<Constraint> {
        let name = self.resolve_name(name, "pk", table, columns.first().map(String::as_str), None);
        let constraint = Constraint::primary_key(name.as_deref(), table.clone(), columns.to_vec());
        Ok(apply_constraint_options(constraint, kw))
    }

    fn unique_constraint(
        &self,
        name: Option<&str>,
        table: &TableRef,
        columns: &[String],
        kw: &Options,
    ) -> Result<Constraint> {
        let name = self.resolve_name(name, "uq", table, columns.first().map(String::as_str), None);
        let constraint = Constraint::unique(name.as_deref(), table.clone(), columns.to_vec());
        Ok(apply_constraint_options(constraint, kw))
    }

    fn foreign_key_constraint(
        &self,
        name: Option<&str>,
        source: &TableRef,
        referent: &TableRef,
        local_cols: &[String],
        remote_cols: &[String],
        kw: &Options,
    ) -> Result<Constraint> {
        if local_cols.is_empty() || local_cols.len() != remote_cols.len() {
            return Err(Error::InvalidSchemaObject(format!(
                "foreign key from {} to {} needs matching column lists, got {} and {}",
                source,
                referent,
                local_cols.len(),
                remote_cols.len()
            )));
        }

        let name = self.resolve_name(
            name,
            "fk",
            source,
            local_cols.first().map(String::as_str),
            Some(referent),
        );
        let mut constraint = Constraint::foreign_key(
            name.as_deref(),
            source.clone(),
            local_cols.to_vec(),
            referent.clone(),
            remote_cols.to_vec(),
        );

        if let Some(action) = options::get_str(kw, keys::ONUPDATE) {
            constraint = constraint.on_update(action.parse()?);
        }
        if let Some(action) = options::get_str(kw, keys::ONDELETE) {
            constraint = constraint.on_delete(action.parse()?);
        }
        if options::get_bool(kw, keys::USE_ALTER).unwrap_or(false) {
            constraint = constraint.use_alter();
        }

        Ok(apply_constraint_options(constraint, kw))
    }

    fn check_constraint(
        &self,
        name: Option<&str>,
        table: &TableRef,
        condition: &str,
        kw: &Options,
    ) -> Result<Constraint> {
        if condition.trim().is_empty() {
            return Err(Error::InvalidSchemaObject(format!(
                "check constraint on {} has an empty condition",
                table
            )));
        }
        let name = self.resolve_name(name, "ck", table, None, None);
        let constraint = Constraint::check(name.as_deref(), table.clone(), condition);
        Ok(apply_constraint_options(constraint, kw))
    }

    fn index(
        &self,
        name: Option<&str>,
        table: &TableRef,
        expressions: &[IndexExpr],
        unique: bool,
        quote: Option<bool>,
        kw: &Options,
    ) -> Result<Index> {
        if expressions.is_empty() {
            return Err(Error::InvalidSchemaObject(format!(
                "index {} on {} has no expressions",
                name.unwrap_or("<unnamed>"),
                table
            )));
        }

        let column_0 = expressions.iter().find_map(|expr| match expr {
            IndexExpr::Column { name, .. } => Some(name.as_str()),
            IndexExpr::Expression(_) => None,
        });

        Ok(Index {
            name: self.resolve_name(name, "ix", table, column_0, None),
            table: table.clone(),
            expressions: expressions.to_vec(),
            unique,
            quote,
            kw: kw.clone(),
        })
    }

    fn table(
        &self,
        name: &str,
        schema: Option<&str>,
        elements: &[TableElement],
        kw: &Options,
    ) -> Result<Table> {
        let mut table = Table::new(name);
        table.schema = schema.map(str::to_string);
        table.kw = kw.clone();

        for element in elements {
            table = match element {
                TableElement::Column(column) => table.add_column(column.clone()),
                TableElement::Constraint(constraint) => table.add_constraint(constraint.clone()),
            };
        }

        Ok(table)
    }

    fn column(&self, name: &str, column_type: ColumnType, kw: &Options) -> Result<Column> {
        let mut column = Column::new(name, column_type);

        if let Some(type_name) = options::get_str(kw, keys::TYPE) {
            if column.column_type.is_null() {
                column.column_type = ColumnType::Custom(type_name.to_string());
            }
        }
        if let Some(nullable) = options::get_bool(kw, keys::NULLABLE) {
            column.nullable = nullable;
        }
        if let Some(default) = options::get_str(kw, keys::SERVER_DEFAULT) {
            column.server_default = Some(default.to_string());
        }

        column.kw = kw
            .iter()
            .filter(|(key, _)| {
                !matches!(
                    key.as_str(),
                    keys::TYPE | keys::NULLABLE | keys::SERVER_DEFAULT
                )
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ReferentialAction, SchemaConstraint};
    use serde_json::json;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn index_without_expressions_is_rejected() {
        let factory = SchemaObjects::new(None);
        let result = factory.index(
            Some("ix_t_a"),
            &TableRef::new("t"),
            &[],
            false,
            None,
            &Options::new(),
        );
        assert!(matches!(result, Err(Error::InvalidSchemaObject(_))));
    }

    #[test]
    fn foreign_key_parses_actions_from_options() {
        let factory = SchemaObjects::new(None);
        let mut kw = Options::new();
        kw.insert("ondelete".to_string(), json!("CASCADE"));
        kw.insert("deferrable".to_string(), json!(true));
        kw.insert("mysql_engine_hint".to_string(), json!("x"));

        let fk = factory
            .foreign_key_constraint(
                Some("fk_posts_user"),
                &TableRef::new("posts"),
                &TableRef::new("users"),
                &strings(&["user_id"]),
                &strings(&["id"]),
                &kw,
            )
            .unwrap();

        let spec = fk.foreign_key_spec().unwrap();
        assert_eq!(spec.ondelete, Some(ReferentialAction::Cascade));
        assert_eq!(spec.onupdate, None);
        assert_eq!(fk.deferrable, Some(true));
        assert_eq!(fk.kw.len(), 1);
        assert!(fk.kw.contains_key("mysql_engine_hint"));
    }

    #[test]
    fn foreign_key_with_mismatched_columns_is_rejected() {
        let factory = SchemaObjects::new(None);
        let result = factory.foreign_key_constraint(
            None,
            &TableRef::new("posts"),
            &TableRef::new("users"),
            &strings(&["a", "b"]),
            &strings(&["id"]),
            &Options::new(),
        );
        assert!(matches!(result, Err(Error::InvalidSchemaObject(_))));
    }

    #[test]
    fn invalid_referential_action_is_forwarded() {
        let factory = SchemaObjects::new(None);
        let mut kw = Options::new();
        kw.insert("onupdate".to_string(), json!("EXPLODE"));

        let result = factory.foreign_key_constraint(
            None,
            &TableRef::new("posts"),
            &TableRef::new("users"),
            &strings(&["user_id"]),
            &strings(&["id"]),
            &kw,
        );
        assert!(matches!(result, Err(Error::InvalidSchemaObject(_))));
    }

    #[test]
    fn naming_convention_names_anonymous_objects() {
        let context = MigrationContext::new().naming_convention(
            NamingConvention::new()
                .with("uq", "uq_%(table_name)s_%(column_0_name)s")
                .with("fk", "fk_%(table_name)s_%(referred_table_name)s"),
        );
        let factory = SchemaObjects::new(Some(&context));

        let uq = factory
            .unique_constraint(None, &TableRef::new("users"), &strings(&["email"]), &Options::new())
            .unwrap();
        assert_eq!(uq.name.as_deref(), Some("uq_users_email"));

        let fk = factory
            .foreign_key_constraint(
                None,
                &TableRef::new("posts"),
                &TableRef::new("users"),
                &strings(&["user_id"]),
                &strings(&["id"]),
                &Options::new(),
            )
            .unwrap();
        assert_eq!(fk.name.as_deref(), Some("fk_posts_users"));

        let explicit = factory
            .unique_constraint(
                Some("keep_me"),
                &TableRef::new("users"),
                &strings(&["email"]),
                &Options::new(),
            )
            .unwrap();
        assert_eq!(explicit.name.as_deref(), Some("keep_me"));
    }

    #[test]
    fn anonymous_objects_stay_anonymous_without_context() {
        let factory = SchemaObjects::new(None);
        let ck = factory
            .check_constraint(None, &TableRef::new("t"), "x > 0", &Options::new())
            .unwrap();
        assert_eq!(ck.name, None);
    }

    #[test]
    fn column_reads_reconstruction_keys() {
        let factory = SchemaObjects::new(None);
        let mut kw = Options::new();
        kw.insert("type".to_string(), json!("VARCHAR(40)"));
        kw.insert("nullable".to_string(), json!(false));
        kw.insert("comment".to_string(), json!("legacy"));

        let column = factory.column("code", ColumnType::Null, &kw).unwrap();
        assert_eq!(column.column_type, ColumnType::Custom("VARCHAR(40)".to_string()));
        assert!(!column.nullable);
        assert_eq!(column.kw.len(), 1);
    }

    #[test]
    fn table_readdresses_constraints() {
        let factory = SchemaObjects::new(None);
        let elements = vec![
            TableElement::Column(Column::new("id", ColumnType::Integer)),
            TableElement::Constraint(Constraint::primary_key(
                Some("pk_t"),
                TableRef::new("placeholder"),
                strings(&["id"]),
            )),
        ];

        let table = factory
            .table("t", Some("app"), &elements, &Options::new())
            .unwrap();
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.constraints[0].table, TableRef::new("t").in_schema("app"));
    }
}
