//! Team roster type.

use serde::{Deserialize, Serialize};

use super::user::TeamMember;

/// A named team and its members.
///
/// Membership only grows through `add_team` upserts; users are never
/// removed, only deactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Unique team name.
    pub team_name: String,
    /// Team members, ordered by user id when read from a store.
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl Team {
    /// Create a team with the given members.
    pub fn new(team_name: impl Into<String>, members: Vec<TeamMember>) -> Self {
        Self {
            team_name: team_name.into(),
            members,
        }
    }
}
