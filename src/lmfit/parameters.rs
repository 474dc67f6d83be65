//! Named, ordered fit parameters.

use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    /// Fixed parameters are held at `value` during the fit.
    pub vary: bool,
    pub min: f64,
    pub max: f64,
    /// Set after a fit when the covariance could be estimated.
    pub stderr: Option<f64>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
            vary: true,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            stderr: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Parameters {
    items: Vec<Parameter>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, param: Parameter) -> Result<(), AppError> {
        if self.get(&param.name).is_some() {
            return Err(AppError::invalid_input(format!(
                "Duplicate parameter '{}'.",
                param.name
            )));
        }
        self.items.push(param);
        Ok(())
    }

    /// Append without the duplicate check; `param.name` must be new.
    pub(crate) fn push(&mut self, param: Parameter) {
        debug_assert!(self.get(&param.name).is_none());
        self.items.push(param);
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.items.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.items.iter_mut().find(|p| p.name == name)
    }

    pub fn set(&mut self, name: &str, value: f64) -> Result<(), AppError> {
        self.lookup_mut(name)?.value = value;
        Ok(())
    }

    /// Hold a parameter at its current value.
    pub fn fix(&mut self, name: &str) -> Result<(), AppError> {
        self.lookup_mut(name)?.vary = false;
        Ok(())
    }

    pub fn bound(&mut self, name: &str, min: f64, max: f64) -> Result<(), AppError> {
        if min.is_nan() || max.is_nan() || min >= max {
            return Err(AppError::invalid_input(format!(
                "Invalid bounds for '{name}': min ({min}) must be < max ({max})."
            )));
        }
        let param = self.lookup_mut(name)?;
        param.min = min;
        param.max = max;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of parameters with `vary = true`.
    pub fn nvarys(&self) -> usize {
        self.items.iter().filter(|p| p.vary).count()
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut Parameter, AppError> {
        self.get_mut(name)
            .ok_or_else(|| AppError::invalid_input(format!("Unknown parameter '{name}'.")))
    }
}
