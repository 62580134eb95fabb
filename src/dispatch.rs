use std::collections::HashMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::operation::{OpKind, Operation};

pub const DEFAULT_QUALIFIER: &str = "default";

#[derive(Debug, Clone)]
pub struct Dispatcher<H> {
    handlers: HashMap<(OpKind, String), H>,
}

impl<H> Default for Dispatcher<H> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<H> Dispatcher<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind` under [`DEFAULT_QUALIFIER`].
    pub fn register(&mut self, kind: OpKind, handler: H) -> Result<()> {
        self.register_qualified(kind, DEFAULT_QUALIFIER, handler)
    }

    /// Fails if a handler already occupies exactly this kind and qualifier.
    pub fn register_qualified(&mut self, kind: OpKind, qualifier: &str, handler: H) -> Result<()> {
        let key = (kind, qualifier.to_string());
        if self.handlers.contains_key(&key) {
            return Err(Error::DuplicateHandler {
                kind,
                qualifier: qualifier.to_string(),
            });
        }

        debug!(%kind, qualifier, "registered handler");
        self.handlers.insert(key, handler);
        Ok(())
    }

    pub fn contains(&self, kind: OpKind, qualifier: &str) -> bool {
        self.handlers.contains_key(&(kind, qualifier.to_string()))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The most specific handler for `kind`.
    pub fn dispatch(&self, kind: OpKind, qualifier: &str) -> Result<&H> {
        for candidate in kind.ancestors() {
            if let Some(handler) = self.handlers.get(&(candidate, qualifier.to_string())) {
                debug!(%kind, served_by = %candidate, qualifier, "resolved handler");
                return Ok(handler);
            }
            if qualifier != DEFAULT_QUALIFIER {
                if let Some(handler) = self
                    .handlers
                    .get(&(candidate, DEFAULT_QUALIFIER.to_string()))
                {
                    debug!(
                        %kind,
                        served_by = %candidate,
                        qualifier = DEFAULT_QUALIFIER,
                        "resolved handler"
                    );
                    return Ok(handler);
                }
            }
        }

        Err(Error::NoHandler {
            kind,
            qualifier: qualifier.to_string(),
        })
    }

    pub fn dispatch_for<O: Operation + ?Sized>(&self, op: &O, qualifier: &str) -> Result<&H> {
        self.dispatch(op.kind(), qualifier)
    }
}

impl<H: Clone> Dispatcher<H> {
    /// An independent copy. Registrations on the branch do not affect this
    /// registry and vice versa.
    pub fn branch(&self) -> Self {
        self.clone()
    }
}
