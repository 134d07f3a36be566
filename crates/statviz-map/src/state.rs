//! Role assignment state for the variable-mapping step.
//!
//! Tracks which dataset columns sit in which [`VariableRole`]. A column holds
//! at most one role; the available pool is every column not assigned.

use serde::Serialize;
use tracing::debug;

use statviz_model::{VariableMapping, VariableRole};

use crate::error::{MappingError, Result};
use crate::suggest::suggest_column;

/// Outcome of an assignment: the new snapshot and any evicted column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub mapping: VariableMapping,
    /// Previous occupant of a single-slot role, now back in the pool.
    pub evicted: Option<String>,
}

/// Summary counts for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MappingSummary {
    pub total_columns: usize,
    pub assigned: usize,
    pub available: usize,
    pub independent: usize,
    pub covariates: usize,
    pub ready: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    columns: Vec<String>,
    mapping: VariableMapping,
}

impl RoleAssignment {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let mut unique: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if !unique.contains(&column) {
                unique.push(column);
            }
        }
        Self {
            columns: unique,
            mapping: VariableMapping::default(),
        }
    }

    /// Restore an initial mapping. Unknown columns and repeated columns are
    /// dropped, earlier roles winning.
    pub fn from_mapping<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        mapping: &VariableMapping,
    ) -> Self {
        let mut state = Self::new(columns);
        for role in VariableRole::ALL {
            for column in mapping.columns_in(role) {
                if state.is_known(column) && state.role_of(column).is_none() {
                    state.place(column, role);
                }
            }
        }
        state
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn mapping(&self) -> &VariableMapping {
        &self.mapping
    }

    pub fn role_of(&self, column: &str) -> Option<VariableRole> {
        self.mapping.role_of(column)
    }

    /// Columns in no role, in dataset order.
    pub fn available(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|column| self.role_of(column).is_none())
            .collect()
    }

    /// Move `column` into `role`, removing it from any other role first.
    ///
    /// A single-slot role evicts its previous occupant. Re-assigning to a
    /// multi-slot role moves the column to the end of that list.
    pub fn assign(&mut self, column: &str, role: VariableRole) -> Result<Assignment> {
        self.ensure_known(column)?;
        let evicted = self.take_slot(role, column);
        self.remove(column);
        self.place(column, role);
        debug!(column, role = %role, evicted = ?evicted, "column assigned");
        Ok(Assignment {
            mapping: self.mapping.clone(),
            evicted,
        })
    }

    /// Return `column` to the available pool.
    pub fn unassign(&mut self, column: &str) -> Result<VariableMapping> {
        self.ensure_known(column)?;
        if self.remove(column) {
            debug!(column, "column unassigned");
        }
        Ok(self.mapping.clone())
    }

    /// Put every column back in the pool.
    pub fn clear(&mut self) -> VariableMapping {
        self.mapping = VariableMapping::default();
        self.mapping.clone()
    }

    pub fn summary(&self) -> MappingSummary {
        let assigned = self.mapping.assigned_columns().len();
        MappingSummary {
            total_columns: self.columns.len(),
            assigned,
            available: self.columns.len() - assigned,
            independent: self.mapping.independent_variables.len(),
            covariates: self.mapping.covariates.len(),
            ready: self.mapping.is_ready(),
        }
    }

    fn is_known(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    fn ensure_known(&self, column: &str) -> Result<()> {
        if self.is_known(column) {
            return Ok(());
        }
        Err(MappingError::ColumnNotFound {
            column: column.to_string(),
            suggestion: suggest_column(column, self.columns.iter().map(String::as_str)),
        })
    }

    /// Empty a single-slot role, returning its occupant unless it is `incoming`.
    fn take_slot(&mut self, role: VariableRole, incoming: &str) -> Option<String> {
        let slot = match role {
            VariableRole::Dependent => &mut self.mapping.dependent_variable,
            VariableRole::Values => &mut self.mapping.values_column,
            VariableRole::Independent | VariableRole::Covariate => return None,
        };
        slot.take().filter(|previous| previous != incoming)
    }

    fn remove(&mut self, column: &str) -> bool {
        let mapping = &mut self.mapping;
        let mut removed = false;
        if mapping.dependent_variable.as_deref() == Some(column) {
            mapping.dependent_variable = None;
            removed = true;
        }
        if mapping.values_column.as_deref() == Some(column) {
            mapping.values_column = None;
            removed = true;
        }
        let before = mapping.independent_variables.len() + mapping.covariates.len();
        mapping.independent_variables.retain(|c| c != column);
        mapping.covariates.retain(|c| c != column);
        removed || before != mapping.independent_variables.len() + mapping.covariates.len()
    }

    fn place(&mut self, column: &str, role: VariableRole) {
        let column = column.to_string();
        match role {
            VariableRole::Dependent => self.mapping.dependent_variable = Some(column),
            VariableRole::Values => self.mapping.values_column = Some(column),
            VariableRole::Independent => self.mapping.independent_variables.push(column),
            VariableRole::Covariate => self.mapping.covariates.push(column),
        }
    }
}
