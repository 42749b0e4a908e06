use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;

use super::from_row::{
    query_all, query_one, FRIENDSHIP_COLS, GROUP_COLS, LEDGER_ENTRY_COLS, PROFILE_COLS,
};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

/// True when an execute failed because a UNIQUE or PRIMARY KEY constraint
/// fired (the duplicate-row case we convert to domain outcomes).
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ============ Profiles ============

/// Bootstrap a profile for a freshly signed-up identity-provider user.
/// A taken username surfaces as `Conflict`.
pub fn create_profile(conn: &Connection, input: &CreateProfile) -> Result<Profile> {
    let now = now();
    let username = input.username.trim().to_string();

    conn.execute(
        "INSERT INTO profiles (id, username, session_hours, created_at)
         VALUES (?1, ?2, 0, ?3)",
        params![&input.user_id, &username, now],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Username already taken".into())
        } else {
            e.into()
        }
    })?;

    Ok(Profile {
        id: input.user_id.clone(),
        username,
        session_hours: 0,
        created_at: now,
    })
}

pub fn get_profile_by_id(conn: &Connection, id: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLS),
        &[&id],
    )
}

pub fn get_profile_by_username(conn: &Connection, username: &str) -> Result<Option<Profile>> {
    query_one(
        conn,
        &format!("SELECT {} FROM profiles WHERE username = ?1", PROFILE_COLS),
        &[&username],
    )
}

// ============ Friendships ============

/// Find a friendship between two profiles in either direction, any status.
pub fn find_friendship_between(
    conn: &Connection,
    a: &str,
    b: &str,
) -> Result<Option<Friendship>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM friends
             WHERE (requester_id = ?1 AND receiver_id = ?2)
                OR (requester_id = ?2 AND receiver_id = ?1)",
            FRIENDSHIP_COLS
        ),
        &[&a, &b],
    )
}

pub fn create_friend_request(
    conn: &Connection,
    requester_id: &str,
    receiver_id: &str,
) -> Result<Friendship> {
    let id = gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO friends (id, requester_id, receiver_id, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'pending', ?4, ?4)",
        params![&id, requester_id, receiver_id, now],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Friend request already exists".into())
        } else {
            e.into()
        }
    })?;

    Ok(Friendship {
        id,
        requester_id: requester_id.to_string(),
        receiver_id: receiver_id.to_string(),
        status: FriendshipStatus::Pending,
        created_at: now,
        updated_at: now,
    })
}

/// The pending request from `requester_id` to `receiver_id`, if any.
pub fn get_pending_request(
    conn: &Connection,
    requester_id: &str,
    receiver_id: &str,
) -> Result<Option<Friendship>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM friends
             WHERE requester_id = ?1 AND receiver_id = ?2 AND status = 'pending'",
            FRIENDSHIP_COLS
        ),
        &[&requester_id, &receiver_id],
    )
}

pub fn set_friendship_status(
    conn: &Connection,
    id: &str,
    status: FriendshipStatus,
) -> Result<Option<Friendship>> {
    conn.execute(
        "UPDATE friends SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now(), id],
    )?;
    query_one(
        conn,
        &format!("SELECT {} FROM friends WHERE id = ?1", FRIENDSHIP_COLS),
        &[&id],
    )
}

/// Accepted friends of `user_id`, projected to the other party's profile.
pub fn list_accepted_friend_profiles(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<FriendProfile>> {
    let mut stmt = conn.prepare(
        "SELECT p.username, p.session_hours
         FROM friends f
         JOIN profiles p ON p.id = CASE
             WHEN f.requester_id = ?1 THEN f.receiver_id
             ELSE f.requester_id
         END
         WHERE (f.requester_id = ?1 OR f.receiver_id = ?1)
           AND f.status = 'accept'
         ORDER BY p.username",
    )?;
    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok(FriendProfile {
                username: row.get(0)?,
                session_hours: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ Groups ============

/// Create a group and enroll the creator as its first member atomically.
pub fn create_group_with_creator(conn: &mut Connection, input: &CreateGroup) -> Result<Group> {
    let id = gen_id();
    let now = now();

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO groups (id, name, creator_id, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![&id, &input.name, &input.creator_id, now],
    )?;
    tx.execute(
        "INSERT INTO group_members (group_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
        params![&id, &input.creator_id, now],
    )?;
    tx.commit()?;

    Ok(Group {
        id,
        name: input.name.clone(),
        creator_id: input.creator_id.clone(),
        created_at: now,
    })
}

pub fn get_group_by_id(conn: &Connection, id: &str) -> Result<Option<Group>> {
    query_one(
        conn,
        &format!("SELECT {} FROM groups WHERE id = ?1", GROUP_COLS),
        &[&id],
    )
}

/// Add a member to a group. Returns false when the membership already
/// existed - callers treat that as success.
pub fn try_add_group_member(conn: &Connection, group_id: &str, user_id: &str) -> Result<bool> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO group_members (group_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
        params![group_id, user_id, now()],
    )?;
    Ok(affected > 0)
}

pub fn is_group_member(conn: &Connection, group_id: &str, user_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM group_members WHERE group_id = ?1 AND user_id = ?2",
        params![group_id, user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

// ============ Contribution ledger ============

/// Record a settled contribution exactly once per checkout session.
///
/// Returns false when a row for this session id already exists (duplicate
/// webhook delivery) - the caller acknowledges without treating it as an
/// error. Two concurrent deliveries race on the UNIQUE constraint; the loser
/// sees `affected == 0` via INSERT OR IGNORE.
pub fn try_record_contribution(conn: &Connection, input: &RecordContribution) -> Result<bool> {
    let affected = conn.execute(
        "INSERT OR IGNORE INTO group_payments
             (id, checkout_session_id, group_id, user_id, amount_cents, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            gen_id(),
            &input.checkout_session_id,
            &input.group_id,
            &input.user_id,
            input.amount_cents,
            now()
        ],
    )?;
    Ok(affected > 0)
}

/// Sum of all recorded contributions for a group, in cents. Zero rows sum
/// to zero, not an error.
pub fn group_total_cents(conn: &Connection, group_id: &str) -> Result<i64> {
    let total: i64 = conn.query_row(
        "SELECT COALESCE(SUM(amount_cents), 0) FROM group_payments WHERE group_id = ?1",
        params![group_id],
        |row| row.get(0),
    )?;
    Ok(total)
}

/// Per-user contribution totals for a group, with display names resolved
/// from profiles. LEFT JOIN keeps rows whose profile is missing: the name
/// comes back NULL but the money is still counted.
pub fn group_contributions(conn: &Connection, group_id: &str) -> Result<Vec<ContributionRow>> {
    let mut stmt = conn.prepare(
        "SELECT gp.user_id, p.username, SUM(gp.amount_cents)
         FROM group_payments gp
         LEFT JOIN profiles p ON p.id = gp.user_id
         WHERE gp.group_id = ?1
         GROUP BY gp.user_id
         ORDER BY gp.user_id",
    )?;
    let rows = stmt
        .query_map(params![group_id], |row| {
            Ok(ContributionRow {
                user_id: row.get(0)?,
                username: row.get(1)?,
                total_cents: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All ledger rows for a group, oldest first.
pub fn list_group_payments(conn: &Connection, group_id: &str) -> Result<Vec<LedgerEntry>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM group_payments WHERE group_id = ?1 ORDER BY recorded_at",
            LEDGER_ENTRY_COLS
        ),
        &[&group_id],
    )
}
