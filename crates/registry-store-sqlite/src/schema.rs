//! SQL schema for the registry SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Canonical latest version; only the row with id = 1 is read.
CREATE TABLE IF NOT EXISTS versions (
    id      INTEGER PRIMARY KEY,
    version TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS agents (
    id           INTEGER PRIMARY KEY,
    agent_name   TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL
);

-- Dictionary tables. Rows are inserted once and never updated or deleted.
CREATE TABLE IF NOT EXISTS agent_versions   (id INTEGER PRIMARY KEY, version TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS os_names         (id INTEGER PRIMARY KEY, name    TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS os_archs         (id INTEGER PRIMARY KEY, name    TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS os_versions      (id INTEGER PRIMARY KEY, version TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS java_vendors     (id INTEGER PRIMARY KEY, name    TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS java_versions    (id INTEGER PRIMARY KEY, version TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS python_versions  (id INTEGER PRIMARY KEY, version TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS python_compilers (id INTEGER PRIMARY KEY, name    TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS python_builds    (id INTEGER PRIMARY KEY, name    TEXT NOT NULL UNIQUE);

-- Geolocation dimensions. Populated by external enrichment only.
CREATE TABLE IF NOT EXISTS continents (
    id      INTEGER PRIMARY KEY,
    name    TEXT NOT NULL UNIQUE,
    centerx REAL NOT NULL,
    centery REAL NOT NULL,
    zoom    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS countries (
    id           INTEGER PRIMARY KEY,
    name         TEXT NOT NULL UNIQUE,
    continent_id INTEGER REFERENCES continents(id)
);

CREATE TABLE IF NOT EXISTS cities (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL UNIQUE,
    country_id INTEGER REFERENCES countries(id)
);

CREATE TABLE IF NOT EXISTS organisations (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS domains       (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS hosts         (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);
CREATE TABLE IF NOT EXISTS suffixes      (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE);

CREATE TABLE IF NOT EXISTS ips (
    id              INTEGER PRIMARY KEY,
    ip              TEXT NOT NULL UNIQUE,   -- canonical textual form
    latitude        REAL,
    longitude       REAL,
    city_id         INTEGER REFERENCES cities(id),
    country_id      INTEGER REFERENCES countries(id),
    continent_id    INTEGER REFERENCES continents(id),
    organisation_id INTEGER REFERENCES organisations(id),
    domain_id       INTEGER REFERENCES domains(id),
    host_id         INTEGER REFERENCES hosts(id),
    suffix_id       INTEGER REFERENCES suffixes(id)
);

-- One row per accepted request. Append-only.
CREATE TABLE IF NOT EXISTS hits (
    id                 INTEGER PRIMARY KEY,
    created_at         TEXT NOT NULL,      -- RFC 3339 UTC; server-assigned
    agent_id           INTEGER NOT NULL REFERENCES agents(id),
    ip_id              INTEGER REFERENCES ips(id),
    agent_version_id   INTEGER REFERENCES agent_versions(id),
    os_name_id         INTEGER REFERENCES os_names(id),
    os_arch_id         INTEGER REFERENCES os_archs(id),
    os_version_id      INTEGER REFERENCES os_versions(id),
    java_vendor_id     INTEGER REFERENCES java_vendors(id),
    java_version_id    INTEGER REFERENCES java_versions(id),
    python_version_id  INTEGER REFERENCES python_versions(id),
    python_compiler_id INTEGER REFERENCES python_compilers(id),
    python_build_id    INTEGER REFERENCES python_builds(id)
);

CREATE INDEX IF NOT EXISTS hits_agent_idx   ON hits(agent_id);
CREATE INDEX IF NOT EXISTS hits_created_idx ON hits(created_at);

PRAGMA user_version = 1;
";
