use crate::schema::{Options, TableRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexOrder {
    #[default]
    Asc,
    Desc,
}

/// An indexed element: a plain column or an arbitrary SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexExpr {
    Column { name: String, order: IndexOrder },
    Expression(String),
}

impl IndexExpr {
    pub fn column(name: impl Into<String>) -> Self {
        IndexExpr::Column {
            name: name.into(),
            order: IndexOrder::Asc,
        }
    }
}

impl From<&str> for IndexExpr {
    fn from(name: &str) -> Self {
        IndexExpr::column(name)
    }
}

impl From<String> for IndexExpr {
    fn from(name: String) -> Self {
        IndexExpr::column(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Index {
    pub name: Option<String>,
    pub table: TableRef,
    pub expressions: Vec<IndexExpr>,
    pub unique: bool,
    pub quote: Option<bool>,
    pub kw: Options,
}

impl Index {
    pub fn new(name: impl Into<String>, table: TableRef) -> Self {
        Self {
            name: Some(name.into()),
            table,
            expressions: Vec::new(),
            unique: false,
            quote: None,
            kw: Options::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.expressions.push(IndexExpr::column(name));
        self
    }

    pub fn column_desc(mut self, name: impl Into<String>) -> Self {
        self.expressions.push(IndexExpr::Column {
            name: name.into(),
            order: IndexOrder::Desc,
        });
        self
    }

    /// Index a SQL expression, e.g. `lower(email)`.
    pub fn expression(mut self, sql: impl Into<String>) -> Self {
        self.expressions.push(IndexExpr::Expression(sql.into()));
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.kw.insert(key.into(), value.into());
        self
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.expressions
            .iter()
            .filter_map(|expr| match expr {
                IndexExpr::Column { name, .. } => Some(name.as_str()),
                IndexExpr::Expression(_) => None,
            })
            .collect()
    }
}
