//! Engine parameters: caller-supplied values and per-engine setter tables.
//!
//! Each engine declares a static table mapping parameter names to typed
//! setters over its own settings struct. A whole [`ParamMap`] is resolved
//! against the table before any setter runs, so a bad entry leaves the
//! settings untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SolveError, SolveResult};

/// A single parameter value as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "integer",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v.into())
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Parameter name to value, interpreted by the selected engine.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Typed setter over an engine settings struct `T`.
pub enum Setter<T> {
    /// Non-negative integer that fits in `u32`.
    Count(fn(&mut T, u32)),
    /// Float; integer values are widened.
    Float(fn(&mut T, f64)),
    Bool(fn(&mut T, bool)),
    Str(fn(&mut T, String)),
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Setter<T> {}

impl<T> Setter<T> {
    fn expected(&self) -> &'static str {
        match self {
            Setter::Count(_) => "non-negative integer",
            Setter::Float(_) => "float",
            Setter::Bool(_) => "bool",
            Setter::Str(_) => "string",
        }
    }
}

/// One named entry of a parameter table.
pub struct Param<T: 'static> {
    pub name: &'static str,
    pub setter: Setter<T>,
}

/// A setter paired with a value already checked against it.
enum Binding<T> {
    Count(fn(&mut T, u32), u32),
    Float(fn(&mut T, f64), f64),
    Bool(fn(&mut T, bool), bool),
    Str(fn(&mut T, String), String),
}

impl<T> Binding<T> {
    fn apply(self, target: &mut T) {
        match self {
            Binding::Count(set, v) => set(target, v),
            Binding::Float(set, v) => set(target, v),
            Binding::Bool(set, v) => set(target, v),
            Binding::Str(set, v) => set(target, v),
        }
    }
}

/// Static parameter table of one engine.
pub struct ParamTable<T: 'static> {
    backend: &'static str,
    entries: &'static [Param<T>],
}

impl<T> ParamTable<T> {
    pub const fn new(backend: &'static str, entries: &'static [Param<T>]) -> Self {
        Self { backend, entries }
    }

    fn bind(&self, name: &str, value: &ParamValue) -> SolveResult<Binding<T>> {
        let param = self
            .entries
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| SolveError::UnknownParameter {
                backend: self.backend.to_string(),
                name: name.to_string(),
            })?;

        let mismatch = || SolveError::InvalidParameterValue {
            name: name.to_string(),
            expected: param.setter.expected(),
            found: value.type_name(),
        };

        let binding = match (param.setter, value) {
            (Setter::Count(set), ParamValue::Int(v)) => {
                Binding::Count(set, u32::try_from(*v).map_err(|_| mismatch())?)
            }
            (Setter::Float(set), ParamValue::Float(v)) => Binding::Float(set, *v),
            (Setter::Float(set), ParamValue::Int(v)) => Binding::Float(set, *v as f64),
            (Setter::Bool(set), ParamValue::Bool(v)) => Binding::Bool(set, *v),
            (Setter::Str(set), ParamValue::Str(v)) => Binding::Str(set, v.clone()),
            _ => return Err(mismatch()),
        };
        Ok(binding)
    }

    /// Resolve every entry of `params`, then apply them to `target`.
    pub fn apply(&self, target: &mut T, params: &ParamMap) -> SolveResult<()> {
        let bindings = params
            .iter()
            .map(|(name, value)| self.bind(name, value))
            .collect::<SolveResult<Vec<_>>>()?;
        for binding in bindings {
            binding.apply(target);
        }
        Ok(())
    }
}

/// Reject any parameter for an engine that exposes none.
pub fn reject_all(backend: &str, params: &ParamMap) -> SolveResult<()> {
    match params.keys().next() {
        Some(name) => Err(SolveError::UnknownParameter {
            backend: backend.to_string(),
            name: name.clone(),
        }),
        None => Ok(()),
    }
}
