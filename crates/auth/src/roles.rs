use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::permissions::ROLE_PREFIX;

/// Business roles known to the Tricol back office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    Admin,
    ResponsableAchats,
    Magasinier,
    ChefAtelier,
}

impl RoleName {
    pub const ALL: [RoleName; 4] = [
        RoleName::Admin,
        RoleName::ResponsableAchats,
        RoleName::Magasinier,
        RoleName::ChefAtelier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "ADMIN",
            RoleName::ResponsableAchats => "RESPONSABLE_ACHATS",
            RoleName::Magasinier => "MAGASINIER",
            RoleName::ChefAtelier => "CHEF_ATELIER",
        }
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for RoleName {
    type Err = UnknownRole;

    /// Accepts both `ADMIN` and the authority form `ROLE_ADMIN`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix(ROLE_PREFIX).unwrap_or(s);
        RoleName::ALL
            .into_iter()
            .find(|r| r.as_str() == name)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
