/// SQL schema for the Murmur database
/// Creates all tables with proper constraints, foreign keys, and indexes.
///
/// Engagement totals are never stored: likes, comments and shares are
/// counted from their own tables whenever they are read.
pub const SCHEMA: &str = r#"
-- Users table (one row per external principal)
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    -- NULL when the principal has no address; NULLs do not collide on UNIQUE
    email TEXT UNIQUE,
    image TEXT,
    role TEXT NOT NULL DEFAULT 'customer',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Posts table
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    content TEXT NOT NULL,
    image_url TEXT,
    video_url TEXT,
    is_public INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_user_id ON posts(user_id);
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);

-- Likes table
CREATE TABLE IF NOT EXISTS likes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    post_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, post_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_likes_post_id ON likes(post_id);

-- Comments table (parent_comment_id enables threaded replies)
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    post_id INTEGER NOT NULL,
    content TEXT NOT NULL,
    parent_comment_id INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (parent_comment_id) REFERENCES comments(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id);
CREATE INDEX IF NOT EXISTS idx_comments_parent_id ON comments(parent_comment_id);

-- Comment likes table
CREATE TABLE IF NOT EXISTS comment_likes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    comment_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (user_id, comment_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (comment_id) REFERENCES comments(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_comment_likes_comment_id ON comment_likes(comment_id);

-- Shares table (not unique: repeated shares accumulate)
CREATE TABLE IF NOT EXISTS shares (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    post_id INTEGER NOT NULL,
    caption TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_shares_post_id ON shares(post_id);
CREATE INDEX IF NOT EXISTS idx_shares_user_id ON shares(user_id);

-- Follows table (one-way relationships)
CREATE TABLE IF NOT EXISTS followers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    follower_id INTEGER NOT NULL,
    following_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (follower_id, following_id),
    CHECK (follower_id <> following_id),
    FOREIGN KEY (follower_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (following_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Indexes for "who follows X" and "who does X follow"
CREATE INDEX IF NOT EXISTS idx_followers_follower ON followers(follower_id);
CREATE INDEX IF NOT EXISTS idx_followers_following ON followers(following_id);
"#;

/// Names of every table created by [`SCHEMA`], parents first
pub const TABLES: &[&str] = &[
    "users",
    "posts",
    "likes",
    "comments",
    "comment_likes",
    "shares",
    "followers",
];

/// Demo data for local development:
/// - 3 demo users (alice, bob, charlie)
/// - a handful of posts with likes, comments and shares
/// - a small follow graph
pub const DEMO_DATA: &str = r#"
-- ============================================================================
-- DEMO USERS
-- ============================================================================
INSERT OR IGNORE INTO users (id, external_id, name, email, image, role, created_at, updated_at) VALUES
    (1, 'demo_alice', 'Alice Example', 'alice@example.com', NULL, 'customer', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z'),
    (2, 'demo_bob', 'Bob Example', 'bob@example.com', NULL, 'customer', '2024-01-02T00:00:00Z', '2024-01-02T00:00:00Z'),
    (3, 'demo_charlie', 'Charlie Example', 'charlie@example.com', NULL, 'admin', '2024-01-03T00:00:00Z', '2024-01-03T00:00:00Z');

-- ============================================================================
-- DEMO POSTS
-- ============================================================================
INSERT OR IGNORE INTO posts (id, user_id, content, image_url, video_url, is_public, created_at, updated_at) VALUES
    (1, 1, 'Hello from Alice! First post on the feed.', NULL, NULL, 1, '2024-01-10T10:00:00Z', '2024-01-10T10:00:00Z'),
    (2, 2, 'Bob here. Anyone up for a coffee?', NULL, NULL, 1, '2024-01-10T11:00:00Z', '2024-01-10T11:00:00Z'),
    (3, 3, 'Charlie checking in.', NULL, NULL, 1, '2024-01-10T12:00:00Z', '2024-01-10T12:00:00Z'),
    (4, 1, 'Drafting something private.', NULL, NULL, 0, '2024-01-11T09:00:00Z', '2024-01-11T09:00:00Z');

-- ============================================================================
-- DEMO ENGAGEMENT
-- ============================================================================
INSERT OR IGNORE INTO likes (user_id, post_id, created_at) VALUES
    (2, 1, '2024-01-10T10:05:00Z'),
    (3, 1, '2024-01-10T10:06:00Z'),
    (1, 2, '2024-01-10T11:05:00Z');

INSERT OR IGNORE INTO comments (id, user_id, post_id, content, parent_comment_id, created_at, updated_at) VALUES
    (1, 2, 1, 'Welcome, Alice!', NULL, '2024-01-10T10:10:00Z', '2024-01-10T10:10:00Z'),
    (2, 1, 1, 'Thanks Bob!', 1, '2024-01-10T10:12:00Z', '2024-01-10T10:12:00Z');

INSERT OR IGNORE INTO comment_likes (user_id, comment_id, created_at) VALUES
    (1, 1, '2024-01-10T10:11:00Z');

INSERT OR IGNORE INTO shares (id, user_id, post_id, caption, created_at) VALUES
    (1, 3, 2, 'Coffee time', '2024-01-10T11:30:00Z');

INSERT OR IGNORE INTO followers (follower_id, following_id, created_at) VALUES
    (1, 2, '2024-01-05T00:00:00Z'),
    (2, 1, '2024-01-05T00:00:00Z'),
    (3, 1, '2024-01-06T00:00:00Z');
"#;
