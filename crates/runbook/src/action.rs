// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

/// The closed set of step actions a Step Manager (`oj-adapters`) can carry
/// out (spec §4, §9 Open Questions — the action tag is closed and small;
/// `config` underneath it stays schemaless).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Crawl,
    Transform,
    Agent,
    PlacesSearch,
    Reindex,
    Classify,
    Summarize,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crawl => "crawl",
            Self::Transform => "transform",
            Self::Agent => "agent",
            Self::PlacesSearch => "places_search",
            Self::Reindex => "reindex",
            Self::Classify => "classify",
            Self::Summarize => "summarize",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = UnknownActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crawl" => Ok(Self::Crawl),
            "transform" => Ok(Self::Transform),
            "agent" => Ok(Self::Agent),
            "places_search" => Ok(Self::PlacesSearch),
            "reindex" => Ok(Self::Reindex),
            "classify" => Ok(Self::Classify),
            "summarize" => Ok(Self::Summarize),
            other => Err(UnknownActionError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown step action \"{0}\"")]
pub struct UnknownActionError(pub String);

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
