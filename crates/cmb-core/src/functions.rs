//! Registro estático nombre lógico → función.
//!
//! La configuración nombra funciones (métricas, métodos de normalización,
//! etapas a ejecutar) por string. En lugar de resolverlas dinámicamente, cada
//! binario construye un `FunctionRegistry` explícito y valida contra él los
//! nombres de la configuración al arrancar.

use std::fmt;

use indexmap::IndexMap;

use crate::errors::CoreError;

pub struct FunctionRegistry<F> {
    kind: &'static str,
    entries: IndexMap<&'static str, F>,
}

impl<F> FunctionRegistry<F> {
    /// `kind` aparece en los mensajes de error (`"metric"`, `"stage"`, ...).
    pub fn new(kind: &'static str) -> Self {
        Self { kind, entries: IndexMap::new() }
    }

    pub fn with(mut self, name: &'static str, f: F) -> Self {
        self.entries.insert(name, f);
        self
    }

    pub fn get(&self, name: &str) -> Result<&F, CoreError> {
        self.entries.get(name).ok_or_else(|| CoreError::UnknownFunction { kind: self.kind,
                                                                          name: name.to_string(),
                                                                          known: self.names().map(str::to_string).collect() })
    }

    /// Verifica que todos los `names` existan; pensado para correr antes de
    /// empezar cualquier trabajo.
    pub fn validate<'n, I>(&self, names: I) -> Result<(), CoreError>
        where I: IntoIterator<Item = &'n str>
    {
        names.into_iter().try_for_each(|name| self.get(name).map(|_| ()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<F> fmt::Debug for FunctionRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
         .field("kind", &self.kind)
         .field("names", &self.names().collect::<Vec<_>>())
         .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean(xs: &[f64]) -> f64 {
        xs.iter().sum::<f64>() / xs.len() as f64
    }

    fn peak(xs: &[f64]) -> f64 {
        xs.iter().cloned().fold(f64::MIN, f64::max)
    }

    #[test]
    fn lookup_and_validation() {
        let reg = FunctionRegistry::<fn(&[f64]) -> f64>::new("metric").with("mean", mean).with("peak", peak);
        assert_eq!((reg.get("mean").unwrap())(&[1.0, 3.0]), 2.0);
        assert!(reg.validate(["mean", "peak"]).is_ok());
        match reg.validate(["mean", "mse"]) {
            Err(CoreError::UnknownFunction { kind, name, known }) => {
                assert_eq!(kind, "metric");
                assert_eq!(name, "mse");
                assert_eq!(known, vec!["mean".to_string(), "peak".to_string()]);
            }
            other => panic!("se esperaba UnknownFunction, llegó {other:?}"),
        }
    }
}
