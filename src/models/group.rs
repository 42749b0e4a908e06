use serde::{Deserialize, Serialize};

/// A money pool shared by a set of members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub creator_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct CreateGroup {
    pub name: String,
    pub creator_id: String,
}
