//! A named collection of portfolios owned by one user.
//!
//! The account is plain state: callers pass it in, get it back, and decide
//! when to persist it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PieError;
use crate::tree::Pie;
use crate::PieResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "account")]
pub struct Account {
    #[serde(default)]
    pub portfolios: BTreeMap<String, Pie>,
}

impl Account {
    pub fn create_empty() -> Self {
        Self::default()
    }

    /// Portfolio names in sorted order.
    pub fn list(&self) -> Vec<&str> {
        self.portfolios.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Pie> {
        self.portfolios.get(name)
    }

    /// Like [`Account::get`] but missing portfolios are an error.
    pub fn require(&self, name: &str) -> PieResult<&Pie> {
        self.get(name)
            .ok_or_else(|| PieError::NotFound(format!("portfolio '{name}'")))
    }

    /// Store `portfolio` under `name`, returning the one it replaced.
    pub fn add_or_replace(&mut self, name: impl Into<String>, portfolio: Pie) -> Option<Pie> {
        let name = name.into();
        debug!(portfolio = %name, "storing portfolio in account");
        self.portfolios.insert(name, portfolio)
    }

    /// Remove a portfolio. Deleting a missing name is a no-op.
    pub fn delete(&mut self, name: &str) -> Option<Pie> {
        self.portfolios.remove(name)
    }

    pub fn len(&self) -> usize {
        self.portfolios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portfolios.is_empty()
    }
}
