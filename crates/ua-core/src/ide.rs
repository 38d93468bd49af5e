//! IDE installation identity.
//!
//! Every activity row is attributed to one IDE installation, identified by
//! the (machine, installation, family) triple. The database stores one `ide`
//! row per distinct triple; it is created on first sight and immutable
//! thereafter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// The product family an installation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeFamily {
    /// A desktop IDE installation.
    Desktop,
    /// A remote-development backend.
    Backend,
    /// A thin frontend/client attached to a backend.
    Frontend,
}

impl IdeFamily {
    /// String representation for database storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Backend => "backend",
            Self::Frontend => "frontend",
        }
    }
}

impl fmt::Display for IdeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for IdeFamily {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "desktop" => Ok(Self::Desktop),
            "backend" => Ok(Self::Backend),
            "frontend" => Ok(Self::Frontend),
            _ => Err(ValidationError::InvalidFamily {
                value: s.to_string(),
            }),
        }
    }
}

/// Identity of one IDE installation on one machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdeInfo {
    /// Persistent UUID of the machine.
    pub machine_id: String,
    /// Identifier of the installation (e.g., an install-time UUID or a
    /// product code plus install path hash).
    pub ide_id: String,
    /// Product family of the installation.
    pub family: IdeFamily,
}

impl IdeInfo {
    /// Creates a new installation identity after validating both IDs.
    pub fn new(
        machine_id: impl Into<String>,
        ide_id: impl Into<String>,
        family: IdeFamily,
    ) -> Result<Self, ValidationError> {
        let machine_id = machine_id.into();
        if machine_id.is_empty() {
            return Err(ValidationError::Empty {
                field: "machine ID",
            });
        }
        let ide_id = ide_id.into();
        if ide_id.is_empty() {
            return Err(ValidationError::Empty { field: "IDE ID" });
        }
        Ok(Self {
            machine_id,
            ide_id,
            family,
        })
    }
}
