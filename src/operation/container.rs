use crate::error::Result;
use crate::factory::SchemaFactory;
use crate::operation::{MigrateOperation, OpKind, Operation};
use crate::schema::TableRef;

/// An ordered sequence of operations. The order is the application order;
/// nothing in this crate reorders siblings.
pub trait OpContainer {
    fn ops(&self) -> &[MigrateOperation];

    fn ops_mut(&mut self) -> &mut Vec<MigrateOperation>;

    fn iter(&self) -> std::slice::Iter<'_, MigrateOperation> {
        self.ops().iter()
    }

    fn len(&self) -> usize {
        self.ops().len()
    }

    fn is_empty(&self) -> bool {
        self.ops().is_empty()
    }

    fn push(&mut self, op: impl Into<MigrateOperation>)
    where
        Self: Sized,
    {
        self.ops_mut().push(op.into());
    }
}

/// Children reversed, last one first.
fn reverse_ops(
    ops: &[MigrateOperation],
    factory: &dyn SchemaFactory,
) -> Result<Vec<MigrateOperation>> {
    ops.iter().rev().map(|op| op.reverse(factory)).collect()
}

/// All operations against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyTableOps {
    pub table: TableRef,
    pub ops: Vec<MigrateOperation>,
}

impl ModifyTableOps {
    pub fn new(table_name: impl Into<String>, ops: Vec<MigrateOperation>) -> Self {
        Self {
            table: TableRef::new(table_name),
            ops,
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    pub fn reverse(&self, factory: &dyn SchemaFactory) -> Result<ModifyTableOps> {
        Ok(ModifyTableOps {
            table: self.table.clone(),
            ops: reverse_ops(&self.ops, factory)?,
        })
    }
}

impl OpContainer for ModifyTableOps {
    fn ops(&self) -> &[MigrateOperation] {
        &self.ops
    }

    fn ops_mut(&mut self) -> &mut Vec<MigrateOperation> {
        &mut self.ops
    }
}

impl Operation for ModifyTableOps {
    fn kind(&self) -> OpKind {
        OpKind::ModifyTableOps
    }

    fn describe(&self) -> String {
        format!(
            "Modify table {} ({} operations)",
            self.table,
            self.ops.len()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpgradeOps {
    pub ops: Vec<MigrateOperation>,
    /// Identifies this direction when a script carries several upgrade
    /// sequences, one per target.
    pub upgrade_token: Option<String>,
}

impl UpgradeOps {
    pub fn new(ops: Vec<MigrateOperation>) -> Self {
        Self {
            ops,
            upgrade_token: None,
        }
    }

    pub fn upgrade_token(mut self, token: impl Into<String>) -> Self {
        self.upgrade_token = Some(token.into());
        self
    }

    pub fn reverse(&self, factory: &dyn SchemaFactory) -> Result<DowngradeOps> {
        Ok(DowngradeOps {
            ops: reverse_ops(&self.ops, factory)?,
            downgrade_token: self.upgrade_token.clone(),
        })
    }

    /// Replace the downgrade's operations with the reversal of this upgrade.
    pub fn reverse_into_downgrade(
        &self,
        downgrade: &mut DowngradeOps,
        factory: &dyn SchemaFactory,
    ) -> Result<()> {
        downgrade.ops = reverse_ops(&self.ops, factory)?;
        Ok(())
    }
}

impl OpContainer for UpgradeOps {
    fn ops(&self) -> &[MigrateOperation] {
        &self.ops
    }

    fn ops_mut(&mut self) -> &mut Vec<MigrateOperation> {
        &mut self.ops
    }
}

impl Operation for UpgradeOps {
    fn kind(&self) -> OpKind {
        OpKind::UpgradeOps
    }

    fn describe(&self) -> String {
        format!("Upgrade ({} operations)", self.ops.len())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DowngradeOps {
    pub ops: Vec<MigrateOperation>,
    pub downgrade_token: Option<String>,
}

impl DowngradeOps {
    pub fn new(ops: Vec<MigrateOperation>) -> Self {
        Self {
            ops,
            downgrade_token: None,
        }
    }

    pub fn downgrade_token(mut self, token: impl Into<String>) -> Self {
        self.downgrade_token = Some(token.into());
        self
    }

    pub fn reverse(&self, factory: &dyn SchemaFactory) -> Result<UpgradeOps> {
        Ok(UpgradeOps {
            ops: reverse_ops(&self.ops, factory)?,
            upgrade_token: self.downgrade_token.clone(),
        })
    }
}

impl OpContainer for DowngradeOps {
    fn ops(&self) -> &[MigrateOperation] {
        &self.ops
    }

    fn ops_mut(&mut self) -> &mut Vec<MigrateOperation> {
        &mut self.ops
    }
}

impl Operation for DowngradeOps {
    fn kind(&self) -> OpKind {
        OpKind::DowngradeOps
    }

    fn describe(&self) -> String {
        format!("Downgrade ({} operations)", self.ops.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::factory::SchemaObjects;
    use crate::operation::{
        AddColumnOp, CreateIndexOp, CreateUniqueConstraintOp, DropConstraintOp,
    };
    use crate::schema::{Column, ColumnType};

    fn add_email() -> MigrateOperation {
        AddColumnOp::new("users", Column::new("email", ColumnType::Text)).into()
    }

    fn unique_email() -> MigrateOperation {
        CreateUniqueConstraintOp::new(Some("uq_email"), "users", vec!["email".to_string()])
            .into()
    }

    fn index_email() -> MigrateOperation {
        CreateIndexOp::new("idx_email", "users", vec!["email".into()]).into()
    }

    #[test]
    fn modify_table_preserves_order() {
        let ops = vec![add_email(), unique_email(), index_email()];
        let container = ModifyTableOps::new("users", ops.clone());

        let seen: Vec<_> = container.iter().cloned().collect();
        assert_eq!(seen, ops);
    }

    #[test]
    fn push_appends_at_the_end() {
        let mut upgrade = UpgradeOps::default();
        upgrade.push(add_email());
        upgrade.push(index_email());

        assert_eq!(upgrade.len(), 2);
        assert_eq!(upgrade.ops[1].kind(), OpKind::CreateIndex);
    }

    #[test]
    fn reversal_runs_children_back_to_front() {
        let factory = SchemaObjects::new(None);
        let container = ModifyTableOps::new("users", vec![add_email(), index_email()]);

        let reversed = container.reverse(&factory).unwrap();
        let kinds: Vec<_> = reversed.iter().map(|op| op.kind()).collect();
        assert_eq!(kinds, vec![OpKind::DropIndex, OpKind::DropColumn]);
    }

    #[test]
    fn upgrade_reverses_into_downgrade() {
        let factory = SchemaObjects::new(None);
        let nested: MigrateOperation =
            ModifyTableOps::new("users", vec![add_email(), unique_email()]).into();
        let upgrade = UpgradeOps::new(vec![nested]).upgrade_token("upgrades");

        let mut downgrade = DowngradeOps::default();
        upgrade.reverse_into_downgrade(&mut downgrade, &factory).unwrap();

        assert_eq!(downgrade.len(), 1);
        let MigrateOperation::ModifyTable(ref inner) = downgrade.ops[0] else {
            panic!("expected a table container");
        };
        let kinds: Vec<_> = inner.iter().map(|op| op.kind()).collect();
        assert_eq!(kinds, vec![OpKind::DropConstraint, OpKind::DropColumn]);
        assert_eq!(upgrade.reverse(&factory).unwrap().downgrade_token.as_deref(), Some("upgrades"));
    }

    #[test]
    fn irreversible_child_fails_the_container() {
        let factory = SchemaObjects::new(None);
        let downgrade = DowngradeOps::new(vec![
            add_email(),
            DropConstraintOp::new(Some("uq_email"), "users").into(),
        ]);

        assert!(matches!(
            downgrade.reverse(&factory),
            Err(Error::NotReversible(_))
        ));
    }

    #[test]
    fn container_describe() {
        let container = ModifyTableOps::new("users", vec![add_email(), index_email()]);
        assert_eq!(container.describe(), "Modify table users (2 operations)");
        assert!(container.kind().is_a(OpKind::OpContainer));
    }
}
