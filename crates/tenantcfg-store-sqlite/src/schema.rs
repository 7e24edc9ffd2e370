//! SQL schema for the tenant configuration store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per committed version. Only is_current is ever updated.
CREATE TABLE IF NOT EXISTS config_snapshots (
    tenant_id       TEXT    NOT NULL,
    version         INTEGER NOT NULL CHECK (version > 0),
    system_message  TEXT,
    handover_mode   TEXT    NOT NULL,   -- 'ask' | 'immediate'
    language        TEXT    NOT NULL,   -- lowercase language code
    thresholds      TEXT    NOT NULL DEFAULT '{}',   -- JSON object
    created_at      TEXT    NOT NULL,   -- ISO 8601 UTC; server-assigned
    is_current      INTEGER NOT NULL DEFAULT 0 CHECK (is_current IN (0, 1)),
    PRIMARY KEY (tenant_id, version)
);

-- At most one current snapshot per tenant.
CREATE UNIQUE INDEX IF NOT EXISTS config_snapshots_one_current
    ON config_snapshots(tenant_id) WHERE is_current = 1;

-- The full knowledge list of each version; never updated or deleted.
CREATE TABLE IF NOT EXISTS knowledge_entries (
    tenant_id  TEXT    NOT NULL,
    version    INTEGER NOT NULL,
    position   INTEGER NOT NULL,   -- committed order, 0-based
    question   TEXT    NOT NULL,
    answer     TEXT    NOT NULL,
    keywords   TEXT    NOT NULL DEFAULT '[]',   -- JSON array of strings
    priority   INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (tenant_id, version, position),
    FOREIGN KEY (tenant_id, version)
        REFERENCES config_snapshots(tenant_id, version)
);

CREATE TRIGGER IF NOT EXISTS config_snapshots_write_once
BEFORE UPDATE OF tenant_id, version, system_message, handover_mode,
                 language, thresholds, created_at
ON config_snapshots
BEGIN
    SELECT RAISE(ABORT, 'config snapshot fields are write-once');
END;

CREATE TRIGGER IF NOT EXISTS config_snapshots_no_delete
BEFORE DELETE ON config_snapshots
BEGIN
    SELECT RAISE(ABORT, 'config snapshots are never deleted');
END;

CREATE TRIGGER IF NOT EXISTS knowledge_entries_immutable
BEFORE UPDATE ON knowledge_entries
BEGIN
    SELECT RAISE(ABORT, 'knowledge entries are immutable');
END;

CREATE TRIGGER IF NOT EXISTS knowledge_entries_no_delete
BEFORE DELETE ON knowledge_entries
BEGIN
    SELECT RAISE(ABORT, 'knowledge entries are never deleted');
END;

-- Projection of the current pointer.
CREATE VIEW IF NOT EXISTS current_snapshots AS
    SELECT * FROM config_snapshots WHERE is_current = 1;

PRAGMA user_version = 1;
";
