/// Subset of the InvokeAI catalog layout used by the tools.
pub const SCHEMA: &str = r#"
-- Images: one row per generated or imported image file
CREATE TABLE IF NOT EXISTS images (
    image_name TEXT NOT NULL PRIMARY KEY,
    image_origin TEXT NOT NULL,       -- 'internal' or 'external'
    image_category TEXT NOT NULL,     -- 'general', 'user', 'control', 'mask', 'other'
    width INTEGER NOT NULL,
    height INTEGER NOT NULL,
    session_id TEXT,
    node_id TEXT,
    metadata TEXT,                    -- raw invokeai_metadata chunk
    is_intermediate BOOLEAN DEFAULT FALSE,
    created_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    updated_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    deleted_at DATETIME,
    starred BOOLEAN DEFAULT FALSE,
    has_workflow BOOLEAN DEFAULT FALSE
);

CREATE INDEX IF NOT EXISTS idx_images_image_origin ON images(image_origin);
CREATE INDEX IF NOT EXISTS idx_images_image_category ON images(image_category);
CREATE INDEX IF NOT EXISTS idx_images_created_at ON images(created_at);

-- Boards: named collections of images
CREATE TABLE IF NOT EXISTS boards (
    board_id TEXT NOT NULL PRIMARY KEY,
    board_name TEXT NOT NULL,
    cover_image_name TEXT,
    created_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    updated_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    deleted_at DATETIME,
    archived BOOLEAN NOT NULL DEFAULT FALSE
);

-- Board membership
CREATE TABLE IF NOT EXISTS board_images (
    board_id TEXT NOT NULL,
    image_name TEXT NOT NULL,
    created_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    updated_at DATETIME NOT NULL DEFAULT(STRFTIME('%Y-%m-%d %H:%M:%f', 'NOW')),
    deleted_at DATETIME,
    PRIMARY KEY (board_id, image_name),
    FOREIGN KEY (board_id) REFERENCES boards (board_id) ON DELETE CASCADE,
    FOREIGN KEY (image_name) REFERENCES images (image_name) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_board_images_board_id ON board_images(board_id);
"#;
