use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Profiles (one per identity-provider user; id = provider user id)
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            session_hours INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_profiles_username ON profiles(username);

        -- Friend requests. One row per (requester, receiver) pair; the
        -- reverse direction is checked in queries, not by constraint.
        CREATE TABLE IF NOT EXISTS friends (
            id TEXT PRIMARY KEY,
            requester_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            receiver_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            status TEXT NOT NULL CHECK (status IN ('pending', 'accept', 'decline')),
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(requester_id, receiver_id)
        );
        CREATE INDEX IF NOT EXISTS idx_friends_requester ON friends(requester_id, status);
        CREATE INDEX IF NOT EXISTS idx_friends_receiver ON friends(receiver_id, status);

        -- Money pools
        CREATE TABLE IF NOT EXISTS groups (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            creator_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL
        );

        -- Group membership; composite primary key makes a repeat join a no-op
        CREATE TABLE IF NOT EXISTS group_members (
            group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
            joined_at INTEGER NOT NULL,
            PRIMARY KEY (group_id, user_id)
        );
        CREATE INDEX IF NOT EXISTS idx_group_members_user ON group_members(user_id);

        -- Contribution ledger. Append-only: one row per settled checkout
        -- session, written by the webhook reconciler. The UNIQUE constraint
        -- on checkout_session_id is the idempotency key for at-least-once
        -- webhook delivery.
        CREATE TABLE IF NOT EXISTS group_payments (
            id TEXT PRIMARY KEY,
            checkout_session_id TEXT NOT NULL UNIQUE,
            group_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            recorded_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_group_payments_group ON group_payments(group_id);
        CREATE INDEX IF NOT EXISTS idx_group_payments_user ON group_payments(group_id, user_id);
        "#,
    )?;
    Ok(())
}
