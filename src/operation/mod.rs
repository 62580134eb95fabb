mod bulk;
mod column;
mod constraint;
mod container;
mod index;
mod table;

use std::fmt;

pub use bulk::{BulkInsertOp, Row};
pub use column::{AddColumnOp, AlterColumnOp, AlterTableOp, DropColumnOp, RenameTableOp};
pub use constraint::{
    AddConstraintOp, CreateCheckConstraintOp, CreateForeignKeyOp, CreatePrimaryKeyOp,
    CreateUniqueConstraintOp, DropConstraintOp,
};
pub use container::{DowngradeOps, ModifyTableOps, OpContainer, UpgradeOps};
pub use index::{CreateIndexOp, DropIndexOp};
pub use table::{CreateTableOp, DropTableOp};

use crate::error::{Error, Result};
use crate::factory::SchemaFactory;

/// Every operation node type, abstract families included.
///
/// This is the key space of [`crate::dispatch::Dispatcher`]. `parent` gives
/// the declared family of each type, so a handler registered for a family
/// serves every member without a more specific handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpKind {
    MigrateOperation,
    AddConstraint,
    CreatePrimaryKey,
    CreateUniqueConstraint,
    CreateForeignKey,
    CreateCheckConstraint,
    DropConstraint,
    CreateIndex,
    DropIndex,
    CreateTable,
    DropTable,
    AlterTable,
    RenameTable,
    AlterColumn,
    AddColumn,
    DropColumn,
    BulkInsert,
    OpContainer,
    ModifyTableOps,
    UpgradeOps,
    DowngradeOps,
    MigrationScript,
}

impl OpKind {
    pub fn parent(self) -> Option<OpKind> {
        match self {
            OpKind::MigrateOperation => None,
            OpKind::CreatePrimaryKey
            | OpKind::CreateUniqueConstraint
            | OpKind::CreateForeignKey
            | OpKind::CreateCheckConstraint => Some(OpKind::AddConstraint),
            OpKind::RenameTable | OpKind::AlterColumn | OpKind::AddColumn | OpKind::DropColumn => {
                Some(OpKind::AlterTable)
            }
            OpKind::ModifyTableOps | OpKind::UpgradeOps | OpKind::DowngradeOps => {
                Some(OpKind::OpContainer)
            }
            OpKind::AddConstraint
            | OpKind::DropConstraint
            | OpKind::CreateIndex
            | OpKind::DropIndex
            | OpKind::CreateTable
            | OpKind::DropTable
            | OpKind::AlterTable
            | OpKind::BulkInsert
            | OpKind::OpContainer
            | OpKind::MigrationScript => Some(OpKind::MigrateOperation),
        }
    }

    /// This kind followed by its families, most specific first.
    pub fn ancestors(self) -> impl Iterator<Item = OpKind> {
        std::iter::successors(Some(self), |kind| kind.parent())
    }

    pub fn is_a(self, family: OpKind) -> bool {
        self.ancestors().any(|kind| kind == family)
    }

    pub fn name(self) -> &'static str {
        match self {
            OpKind::MigrateOperation => "MigrateOperation",
            OpKind::AddConstraint => "AddConstraintOp",
            OpKind::CreatePrimaryKey => "CreatePrimaryKeyOp",
            OpKind::CreateUniqueConstraint => "CreateUniqueConstraintOp",
            OpKind::CreateForeignKey => "CreateForeignKeyOp",
            OpKind::CreateCheckConstraint => "CreateCheckConstraintOp",
            OpKind::DropConstraint => "DropConstraintOp",
            OpKind::CreateIndex => "CreateIndexOp",
            OpKind::DropIndex => "DropIndexOp",
            OpKind::CreateTable => "CreateTableOp",
            OpKind::DropTable => "DropTableOp",
            OpKind::AlterTable => "AlterTableOp",
            OpKind::RenameTable => "RenameTableOp",
            OpKind::AlterColumn => "AlterColumnOp",
            OpKind::AddColumn => "AddColumnOp",
            OpKind::DropColumn => "DropColumnOp",
            OpKind::BulkInsert => "BulkInsertOp",
            OpKind::OpContainer => "OpContainer",
            OpKind::ModifyTableOps => "ModifyTableOps",
            OpKind::UpgradeOps => "UpgradeOps",
            OpKind::DowngradeOps => "DowngradeOps",
            OpKind::MigrationScript => "MigrationScript",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Operation {
    fn kind(&self) -> OpKind;

    fn describe(&self) -> String;
}

pub(crate) fn display_name(name: Option<&str>) -> &str {
    name.unwrap_or("(unnamed)")
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrateOperation {
    AddConstraint(AddConstraintOp),
    DropConstraint(DropConstraintOp),
    CreateIndex(CreateIndexOp),
    DropIndex(DropIndexOp),
    CreateTable(CreateTableOp),
    DropTable(DropTableOp),
    AlterTable(AlterTableOp),
    BulkInsert(BulkInsertOp),
    ModifyTable(ModifyTableOps),
}

impl MigrateOperation {
    /// A reversed column or index drop may be less complete than the
    /// original object.
    pub fn reverse(&self, factory: &dyn SchemaFactory) -> Result<MigrateOperation> {
        match self {
            MigrateOperation::AddConstraint(op) => Ok(op.reverse().into()),
            MigrateOperation::DropConstraint(op) => Err(Error::NotReversible(op.describe())),
            MigrateOperation::CreateIndex(op) => Ok(op.reverse().into()),
            MigrateOperation::DropIndex(op) => Ok(op.reverse(factory)?.into()),
            MigrateOperation::CreateTable(op) => Ok(op.reverse().into()),
            MigrateOperation::DropTable(op) => Ok(op.reverse(factory)?.into()),
            MigrateOperation::AlterTable(op) => Ok(op.reverse(factory)?.into()),
            MigrateOperation::BulkInsert(op) => Err(Error::NotReversible(op.describe())),
            MigrateOperation::ModifyTable(op) => Ok(op.reverse(factory)?.into()),
        }
    }
}

impl Operation for MigrateOperation {
    fn kind(&self) -> OpKind {
        match self {
            MigrateOperation::AddConstraint(op) => op.kind(),
            MigrateOperation::DropConstraint(op) => op.kind(),
            MigrateOperation::CreateIndex(op) => op.kind(),
            MigrateOperation::DropIndex(op) => op.kind(),
            MigrateOperation::CreateTable(op) => op.kind(),
            MigrateOperation::DropTable(op) => op.kind(),
            MigrateOperation::AlterTable(op) => op.kind(),
            MigrateOperation::BulkInsert(op) => op.kind(),
            MigrateOperation::ModifyTable(op) => op.kind(),
        }
    }

    fn describe(&self) -> String {
        match self {
            MigrateOperation::AddConstraint(op) => op.describe(),
            MigrateOperation::DropConstraint(op) => op.describe(),
            MigrateOperation::CreateIndex(op) => op.describe(),
            MigrateOperation::DropIndex(op) => op.describe(),
            MigrateOperation::CreateTable(op) => op.describe(),
            MigrateOperation::DropTable(op) => op.describe(),
            MigrateOperation::AlterTable(op) => op.describe(),
            MigrateOperation::BulkInsert(op) => op.describe(),
            MigrateOperation::ModifyTable(op) => op.describe(),
        }
    }
}

impl From<AddConstraintOp> for MigrateOperation {
    fn from(op: AddConstraintOp) -> Self {
        MigrateOperation::AddConstraint(op)
    }
}

impl From<CreatePrimaryKeyOp> for MigrateOperation {
    fn from(op: CreatePrimaryKeyOp) -> Self {
        MigrateOperation::AddConstraint(AddConstraintOp::PrimaryKey(op))
    }
}

impl From<CreateUniqueConstraintOp> for MigrateOperation {
    fn from(op: CreateUniqueConstraintOp) -> Self {
        MigrateOperation::AddConstraint(AddConstraintOp::Unique(op))
    }
}

impl From<CreateForeignKeyOp> for MigrateOperation {
    fn from(op: CreateForeignKeyOp) -> Self {
        MigrateOperation::AddConstraint(AddConstraintOp::ForeignKey(op))
    }
}

impl From<CreateCheckConstraintOp> for MigrateOperation {
    fn from(op: CreateCheckConstraintOp) -> Self {
        MigrateOperation::AddConstraint(AddConstraintOp::Check(op))
    }
}

impl From<DropConstraintOp> for MigrateOperation {
    fn from(op: DropConstraintOp) -> Self {
        MigrateOperation::DropConstraint(op)
    }
}

impl From<CreateIndexOp> for MigrateOperation {
    fn from(op: CreateIndexOp) -> Self {
        MigrateOperation::CreateIndex(op)
    }
}

impl From<DropIndexOp> for MigrateOperation {
    fn from(op: DropIndexOp) -> Self {
        MigrateOperation::DropIndex(op)
    }
}

impl From<CreateTableOp> for MigrateOperation {
    fn from(op: CreateTableOp) -> Self {
        MigrateOperation::CreateTable(op)
    }
}

impl From<DropTableOp> for MigrateOperation {
    fn from(op: DropTableOp) -> Self {
        MigrateOperation::DropTable(op)
    }
}

impl From<AlterTableOp> for MigrateOperation {
    fn from(op: AlterTableOp) -> Self {
        MigrateOperation::AlterTable(op)
    }
}

impl From<RenameTableOp> for MigrateOperation {
    fn from(op: RenameTableOp) -> Self {
        MigrateOperation::AlterTable(AlterTableOp::RenameTable(op))
    }
}

impl From<AlterColumnOp> for MigrateOperation {
    fn from(op: AlterColumnOp) -> Self {
        MigrateOperation::AlterTable(AlterTableOp::AlterColumn(op))
    }
}

impl From<AddColumnOp> for MigrateOperation {
    fn from(op: AddColumnOp) -> Self {
        MigrateOperation::AlterTable(AlterTableOp::AddColumn(op))
    }
}

impl From<DropColumnOp> for MigrateOperation {
    fn from(op: DropColumnOp) -> Self {
        MigrateOperation::AlterTable(AlterTableOp::DropColumn(op))
    }
}

impl From<BulkInsertOp> for MigrateOperation {
    fn from(op: BulkInsertOp) -> Self {
        MigrateOperation::BulkInsert(op)
    }
}

impl From<ModifyTableOps> for MigrateOperation {
    fn from(op: ModifyTableOps) -> Self {
        MigrateOperation::ModifyTable(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::SchemaObjects;
    use crate::schema::{Column, ColumnType};

    #[test]
    fn ancestors_walk_to_root() {
        let chain: Vec<_> = OpKind::AlterColumn.ancestors().collect();
        assert_eq!(
            chain,
            vec![
                OpKind::AlterColumn,
                OpKind::AlterTable,
                OpKind::MigrateOperation
            ]
        );
    }

    #[test]
    fn every_kind_reaches_the_root() {
        let kinds = [
            OpKind::CreatePrimaryKey,
            OpKind::DropConstraint,
            OpKind::BulkInsert,
            OpKind::UpgradeOps,
            OpKind::MigrationScript,
        ];
        for kind in kinds {
            assert_eq!(kind.ancestors().last(), Some(OpKind::MigrateOperation));
        }
    }

    #[test]
    fn is_a_follows_families() {
        assert!(OpKind::CreateForeignKey.is_a(OpKind::AddConstraint));
        assert!(OpKind::ModifyTableOps.is_a(OpKind::OpContainer));
        assert!(!OpKind::DropConstraint.is_a(OpKind::AddConstraint));
    }

    #[test]
    fn conversions_pick_the_concrete_kind() {
        let op: MigrateOperation =
            AddColumnOp::new("users", Column::new("email", ColumnType::Text)).into();
        assert_eq!(op.kind(), OpKind::AddColumn);
        assert_eq!(op.describe(), "Add column email to users");
    }

    #[test]
    fn drop_constraint_is_not_reversible() {
        let op: MigrateOperation = DropConstraintOp::new(Some("uq_email"), "users").into();
        let result = op.reverse(&SchemaObjects::new(None));
        assert!(matches!(result, Err(Error::NotReversible(_))));
    }

    #[test]
    fn add_column_reverses_to_drop_column() {
        let op: MigrateOperation =
            AddColumnOp::new("users", Column::new("email", ColumnType::Text)).into();
        let reversed = op.reverse(&SchemaObjects::new(None)).unwrap();
        assert_eq!(reversed.kind(), OpKind::DropColumn);
        assert_eq!(reversed.describe(), "Drop column email from users");
    }
}
