use std::path::PathBuf;

use uuid::Uuid;

use crate::error::Result;
use crate::factory::SchemaFactory;
use crate::operation::{DowngradeOps, OpContainer, OpKind, Operation, UpgradeOps};

/// A fresh revision identifier: the last 12 hex digits of a random UUID.
pub fn rev_id() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    simple[simple.len() - 12..].to_string()
}

/// One migration: the upgrade and downgrade operation trees plus the
/// metadata needed to place the script in a revision graph. The placement
/// fields are carried as given and never validated here.
#[derive(Clone, PartialEq)]
pub struct MigrationScript {
    pub rev_id: String,
    pub message: Option<String>,
    /// Import statements needed by code embedded in the rendered script.
    pub imports: Vec<String>,
    pub head: Option<String>,
    pub splice: Option<bool>,
    pub branch_label: Option<String>,
    pub version_path: Option<PathBuf>,
    pub depends_on: Vec<String>,
    pub upgrade_ops: UpgradeOps,
    pub downgrade_ops: DowngradeOps,
}

impl std::fmt::Debug for MigrationScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationScript")
            .field("rev_id", &self.rev_id)
            .field("message", &self.message)
            .field("imports", &self.imports)
            .field("head", &self.head)
            .field("splice", &self.splice)
            .field("branch_label", &self.branch_label)
            .field("version_path", &self.version_path)
            .field("depends_on", &self.depends_on)
            .field(
                "upgrade_ops",
                &format!("[{} operations]", self.upgrade_ops.len()),
            )
            .field(
                "downgrade_ops",
                &format!("[{} operations]", self.downgrade_ops.len()),
            )
            .finish()
    }
}

impl MigrationScript {
    pub fn new(rev_id: impl Into<String>, upgrade_ops: UpgradeOps, downgrade_ops: DowngradeOps) -> Self {
        Self {
            rev_id: rev_id.into(),
            message: None,
            imports: Vec::new(),
            head: None,
            splice: None,
            branch_label: None,
            version_path: None,
            depends_on: Vec::new(),
            upgrade_ops,
            downgrade_ops,
        }
    }

    /// A script whose downgrade is the reversal of `upgrade_ops`.
    pub fn reversible(
        rev_id: impl Into<String>,
        upgrade_ops: UpgradeOps,
        factory: &dyn SchemaFactory,
    ) -> Result<Self> {
        let downgrade_ops = upgrade_ops.reverse(factory)?;
        Ok(Self::new(rev_id, upgrade_ops, downgrade_ops))
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds an import statement unless it is already present.
    pub fn import(mut self, statement: impl Into<String>) -> Self {
        let statement = statement.into();
        if !self.imports.contains(&statement) {
            self.imports.push(statement);
        }
        self
    }

    pub fn head(mut self, head: impl Into<String>) -> Self {
        self.head = Some(head.into());
        self
    }

    pub fn splice(mut self, splice: bool) -> Self {
        self.splice = Some(splice);
        self
    }

    pub fn branch_label(mut self, label: impl Into<String>) -> Self {
        self.branch_label = Some(label.into());
        self
    }

    pub fn version_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.version_path = Some(path.into());
        self
    }

    pub fn depends_on(mut self, revision: impl Into<String>) -> Self {
        self.depends_on.push(revision.into());
        self
    }
}

impl Operation for MigrationScript {
    fn kind(&self) -> OpKind {
        OpKind::MigrationScript
    }

    fn describe(&self) -> String {
        match self.message {
            Some(ref message) => format!("Revision {}: {}", self.rev_id, message),
            None => format!("Revision {}", self.rev_id),
        }
    }
}
