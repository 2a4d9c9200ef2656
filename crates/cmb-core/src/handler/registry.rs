//! Registro tag → handler.
//!
//! Se construye una vez al arrancar el proceso (cada crate de formatos
//! registra sus handlers) y luego se comparte por referencia, sólo lectura.
//! Política ante tags duplicados: gana el último registro; el reemplazado se
//! devuelve al caller y se deja constancia con `warn!`.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, warn};

use super::Handler;
use crate::errors::CoreError;

#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: IndexMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra `handler` bajo `tag`. Si el tag ya existía, lo reemplaza y
    /// devuelve el handler anterior.
    pub fn register<H>(&mut self, tag: impl Into<String>, handler: H) -> Option<Arc<dyn Handler>>
        where H: Handler + 'static
    {
        self.register_arc(tag, Arc::new(handler))
    }

    pub fn register_arc(&mut self, tag: impl Into<String>, handler: Arc<dyn Handler>) -> Option<Arc<dyn Handler>> {
        let tag = tag.into();
        let previous = self.handlers.insert(tag.clone(), handler);
        if previous.is_some() {
            warn!("handler tag '{tag}' registered twice; last registration wins");
        } else {
            debug!("registered handler '{tag}'");
        }
        previous
    }

    /// Variante encadenable de `register`.
    pub fn with<H>(mut self, tag: impl Into<String>, handler: H) -> Self
        where H: Handler + 'static
    {
        self.register(tag, handler);
        self
    }

    pub fn get(&self, tag: &str) -> Result<Arc<dyn Handler>, CoreError> {
        self.handlers
            .get(tag)
            .cloned()
            .ok_or_else(|| CoreError::UnknownHandler { tag: tag.to_string(), known: self.tags().map(str::to_string).collect() })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Tags en orden de registro.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry").field("tags", &self.tags().collect::<Vec<_>>()).finish()
    }
}
