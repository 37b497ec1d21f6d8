use crate::error::LookmlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Field categories that can carry a description in a LookML view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Dimension,
    DimensionGroup,
    Measure,
}

impl FieldKind {
    pub const ALL: [FieldKind; 3] = [
        FieldKind::Dimension,
        FieldKind::DimensionGroup,
        FieldKind::Measure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Dimension => "dimension",
            FieldKind::DimensionGroup => "dimension_group",
            FieldKind::Measure => "measure",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = LookmlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dimension" => Ok(FieldKind::Dimension),
            "dimension_group" => Ok(FieldKind::DimensionGroup),
            "measure" => Ok(FieldKind::Measure),
            other => Err(LookmlError::Configuration(format!(
                "unrecognized field type '{}'",
                other
            ))),
        }
    }
}

/// A desired description for one field of one file, as loaded from the
/// definitions source. Immutable once loaded for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub file: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub name: String,
    pub definition: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kind_round_trip() {
        for kind in FieldKind::ALL {
            assert_eq!(kind.as_str().parse::<FieldKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_field_kind_is_configuration_error() {
        let err = "filter".parse::<FieldKind>().unwrap_err();
        assert!(matches!(err, LookmlError::Configuration(_)));
    }
}
