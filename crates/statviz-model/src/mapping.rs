//! Variable roles and the mapping snapshot sent to analysis backends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Role a column can play in an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableRole {
    Dependent,
    Independent,
    Values,
    Covariate,
}

impl VariableRole {
    pub const ALL: [VariableRole; 4] = [
        Self::Dependent,
        Self::Independent,
        Self::Values,
        Self::Covariate,
    ];

    /// Dependent and values roles hold at most one column.
    #[must_use]
    pub const fn is_single_slot(self) -> bool {
        matches!(self, Self::Dependent | Self::Values)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dependent => "dependent",
            Self::Independent => "independent",
            Self::Values => "values",
            Self::Covariate => "covariates",
        }
    }
}

impl fmt::Display for VariableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VariableRole {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dependent" | "dv" | "response" => Ok(Self::Dependent),
            "independent" | "iv" | "factor" => Ok(Self::Independent),
            "values" | "value" => Ok(Self::Values),
            "covariate" | "covariates" => Ok(Self::Covariate),
            other => Err(ModelError::UnknownRole(other.to_string())),
        }
    }
}

/// Complete role assignment snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMapping {
    pub dependent_variable: Option<String>,
    #[serde(default)]
    pub independent_variables: Vec<String>,
    pub values_column: Option<String>,
    #[serde(default)]
    pub covariates: Vec<String>,
}

impl VariableMapping {
    /// Dependent present and at least one independent variable.
    pub fn is_ready(&self) -> bool {
        self.dependent_variable.is_some() && !self.independent_variables.is_empty()
    }

    pub fn role_of(&self, column: &str) -> Option<VariableRole> {
        if self.dependent_variable.as_deref() == Some(column) {
            Some(VariableRole::Dependent)
        } else if self.independent_variables.iter().any(|c| c == column) {
            Some(VariableRole::Independent)
        } else if self.values_column.as_deref() == Some(column) {
            Some(VariableRole::Values)
        } else if self.covariates.iter().any(|c| c == column) {
            Some(VariableRole::Covariate)
        } else {
            None
        }
    }

    pub fn columns_in(&self, role: VariableRole) -> Vec<&str> {
        match role {
            VariableRole::Dependent => self.dependent_variable.as_deref().into_iter().collect(),
            VariableRole::Independent => {
                self.independent_variables.iter().map(String::as_str).collect()
            }
            VariableRole::Values => self.values_column.as_deref().into_iter().collect(),
            VariableRole::Covariate => self.covariates.iter().map(String::as_str).collect(),
        }
    }

    /// Every assigned column, in role order.
    pub fn assigned_columns(&self) -> Vec<&str> {
        VariableRole::ALL
            .iter()
            .flat_map(|role| self.columns_in(*role))
            .collect()
    }
}
