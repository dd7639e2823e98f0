//! SQL schema for the Weave SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    sub         TEXT NOT NULL UNIQUE,
    username    TEXT NOT NULL UNIQUE,
    name        TEXT NOT NULL,
    title       TEXT,
    avatar_url  TEXT,
    bio         TEXT,
    location    TEXT,
    created_at  TEXT NOT NULL
);

-- One row per unordered pair: (pair_low, pair_high) is the sorted pair.
-- Rejecting or cancelling deletes the row.
CREATE TABLE IF NOT EXISTS connections (
    connection_id TEXT PRIMARY KEY,
    from_id       TEXT NOT NULL REFERENCES users(user_id),
    to_id         TEXT NOT NULL REFERENCES users(user_id),
    pair_low      TEXT NOT NULL,
    pair_high     TEXT NOT NULL,
    status        TEXT NOT NULL,   -- 'pending' | 'connected'
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,
    UNIQUE (pair_low, pair_high),
    CHECK  (from_id != to_id),
    CHECK  (status IN ('pending', 'connected'))
);

CREATE TABLE IF NOT EXISTS posts (
    post_id     TEXT PRIMARY KEY,
    author_id   TEXT NOT NULL REFERENCES users(user_id),
    content     TEXT NOT NULL,
    image_url   TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id  TEXT PRIMARY KEY,
    post_id     TEXT NOT NULL REFERENCES posts(post_id),
    author_id   TEXT NOT NULL REFERENCES users(user_id),
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS likes (
    post_id     TEXT NOT NULL REFERENCES posts(post_id),
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    created_at  TEXT NOT NULL,
    PRIMARY KEY (post_id, user_id)
);

CREATE INDEX IF NOT EXISTS connections_from_idx ON connections(from_id);
CREATE INDEX IF NOT EXISTS connections_to_idx   ON connections(to_id);
CREATE INDEX IF NOT EXISTS posts_author_idx     ON posts(author_id);
CREATE INDEX IF NOT EXISTS comments_post_idx    ON comments(post_id);

PRAGMA user_version = 1;
";
