use serde::{Deserialize, Serialize};

/// Lifecycle of a friend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accept,
    Decline,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accept => "accept",
            Self::Decline => "decline",
        }
    }
}

impl std::str::FromStr for FriendshipStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "accept" => Ok(Self::Accept),
            "decline" => Ok(Self::Decline),
            _ => Err(()),
        }
    }
}

/// A friend request between two profiles. One row per pair and direction;
/// duplicate detection checks both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Friendship {
    pub id: String,
    pub requester_id: String,
    pub receiver_id: String,
    pub status: FriendshipStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A friend as surfaced by the list endpoint: the other party's profile.
#[derive(Debug, Clone, Serialize)]
pub struct FriendProfile {
    pub username: String,
    pub session_hours: i64,
}
