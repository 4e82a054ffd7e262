//! Admin-managed resource kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Tag distinguishing which admin collection an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Movie,
    CrewMember,
    Genre,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Movie,
        ResourceKind::CrewMember,
        ResourceKind::Genre,
    ];

    /// Tab name used by the admin panel.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Movie => "movies",
            ResourceKind::CrewMember => "crew",
            ResourceKind::Genre => "genres",
        }
    }

    /// Plural noun used in default error reasons.
    pub fn noun(&self) -> &'static str {
        match self {
            ResourceKind::Movie => "movies",
            ResourceKind::CrewMember => "crew members",
            ResourceKind::Genre => "genres",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            ResourceKind::Movie => 0,
            ResourceKind::CrewMember => 1,
            ResourceKind::Genre => 2,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movies" | "movie" => Ok(ResourceKind::Movie),
            "crew" | "crew-member" | "crew_members" | "crewmember" => Ok(ResourceKind::CrewMember),
            "genres" | "genre" => Ok(ResourceKind::Genre),
            other => Err(StoreError::InvalidArgument(format!(
                "Unknown resource kind: {}",
                other
            ))),
        }
    }
}
