//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to
/// rusqlite errors instead of panicking on corrupt data.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const PROFILE_COLS: &str = "id, username, session_hours, created_at";

pub const FRIENDSHIP_COLS: &str =
    "id, requester_id, receiver_id, status, created_at, updated_at";

pub const GROUP_COLS: &str = "id, name, creator_id, created_at";

pub const LEDGER_ENTRY_COLS: &str =
    "id, checkout_session_id, group_id, user_id, amount_cents, recorded_at";

// ============ FromRow Implementations ============

impl FromRow for Profile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Profile {
            id: row.get(0)?,
            username: row.get(1)?,
            session_hours: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for Friendship {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Friendship {
            id: row.get(0)?,
            requester_id: row.get(1)?,
            receiver_id: row.get(2)?,
            status: parse_enum(row, 3, "status")?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for Group {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Group {
            id: row.get(0)?,
            name: row.get(1)?,
            creator_id: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}

impl FromRow for LedgerEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LedgerEntry {
            id: row.get(0)?,
            checkout_session_id: row.get(1)?,
            group_id: row.get(2)?,
            user_id: row.get(3)?,
            amount_cents: row.get(4)?,
            recorded_at: row.get(5)?,
        })
    }
}
