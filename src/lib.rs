pub mod backend;
pub mod dispatch;
pub mod error;
pub mod factory;
pub mod operation;
pub mod render;
pub mod schema;
pub mod script;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::backend::{Backend, MySql, Postgres, Sqlite};
    pub use crate::dispatch::{Dispatcher, DEFAULT_QUALIFIER};
    pub use crate::error::{Error, Result};
    pub use crate::factory::{MigrationContext, NamingConvention, SchemaFactory, SchemaObjects};
    pub use crate::operation::{
        AddColumnOp, AddConstraintOp, AlterColumnOp, AlterTableOp, BulkInsertOp,
        CreateCheckConstraintOp, CreateForeignKeyOp, CreateIndexOp, CreatePrimaryKeyOp,
        CreateTableOp, CreateUniqueConstraintOp, DowngradeOps, DropColumnOp, DropConstraintOp,
        DropIndexOp, DropTableOp, MigrateOperation, ModifyTableOps, OpContainer, OpKind,
        Operation, RenameTableOp, Row, UpgradeOps,
    };
    pub use crate::render::{DdlRenderer, RenderedScript};
    pub use crate::schema::{
        Column, ColumnType, Constraint, ConstraintKind, ConstraintType, Index, IndexExpr,
        Options, ReferentialAction, SchemaConstraint, Table, TableElement, TableRef,
    };
    pub use crate::script::{rev_id, MigrationScript};
}
