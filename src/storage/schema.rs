//! Database schema definitions.
//!
//! Table names and discriminator strings are the on-disk contract;
//! renaming any of them is a breaking schema change.

/// Base table of the instrument hierarchy; `instrument_type` is the
/// discriminator ("stringed" / "keyboard" / "wind" / "percussion").
pub const CREATE_INSTRUMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS instrument (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    instrument_type TEXT NOT NULL
)
"#;

/// Variant tables share the base table's key (joined-table inheritance).
pub const CREATE_STRINGED_INSTRUMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stringed_instrument (
    id INTEGER PRIMARY KEY REFERENCES instrument(id) ON DELETE CASCADE,
    string_count INTEGER NOT NULL,
    scale_length REAL
)
"#;

pub const CREATE_KEYBOARD_INSTRUMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS keyboard_instrument (
    id INTEGER PRIMARY KEY REFERENCES instrument(id) ON DELETE CASCADE
)
"#;

pub const CREATE_WIND_INSTRUMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wind_instrument (
    id INTEGER PRIMARY KEY REFERENCES instrument(id) ON DELETE CASCADE
)
"#;

pub const CREATE_PERCUSSION_INSTRUMENT_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS percussion_instrument (
    id INTEGER PRIMARY KEY REFERENCES instrument(id) ON DELETE CASCADE
)
"#;

/// Base table of the tuning hierarchy, parallel to `instrument`.
pub const CREATE_TUNING_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tuning (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    tuning_type TEXT NOT NULL
)
"#;

pub const CREATE_STRINGED_INSTRUMENT_TUNING_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stringed_instrument_tuning (
    id INTEGER PRIMARY KEY REFERENCES tuning(id) ON DELETE CASCADE,
    pitch_sequence TEXT NOT NULL
)
"#;

pub const CREATE_KEYBOARD_INSTRUMENT_TUNING_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS keyboard_instrument_tuning (
    id INTEGER PRIMARY KEY REFERENCES tuning(id) ON DELETE CASCADE
)
"#;

pub const CREATE_WIND_INSTRUMENT_TUNING_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wind_instrument_tuning (
    id INTEGER PRIMARY KEY REFERENCES tuning(id) ON DELETE CASCADE
)
"#;

pub const CREATE_PERCUSSION_INSTRUMENT_TUNING_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS percussion_instrument_tuning (
    id INTEGER PRIMARY KEY REFERENCES tuning(id) ON DELETE CASCADE
)
"#;

pub const CREATE_EXERCISE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS exercise (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    domains TEXT NOT NULL,
    technique_tags TEXT NOT NULL,
    instrument_compatibility TEXT
)
"#;

/// One state row per exercise; the UNIQUE on exercise_id is what turns a
/// second insert into a constraint violation instead of a silent overwrite.
pub const CREATE_EXERCISE_STATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS exercise_state (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    exercise_id INTEGER NOT NULL UNIQUE REFERENCES exercise(id) ON DELETE CASCADE,
    last_practiced_date TEXT,
    rolling_minutes_7d INTEGER NOT NULL DEFAULT 0,
    rolling_minutes_28d INTEGER NOT NULL DEFAULT 0,
    mastery_estimate REAL NOT NULL DEFAULT 0.0,
    last_fatigue_profile TEXT
)
"#;

pub const CREATE_TECHNIQUE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS technique (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT
)
"#;

pub const CREATE_OVERLOAD_DIMENSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS overload_dimension (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT
)
"#;

/// Deleting an instrument cascades through its practices.
pub const CREATE_PRACTICE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS practice (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    instrument_id INTEGER NOT NULL REFERENCES instrument(id) ON DELETE CASCADE,
    session_date TEXT NOT NULL,
    session_type TEXT NOT NULL,
    total_minutes INTEGER NOT NULL
)
"#;

pub const CREATE_EXERCISE_INSTANCE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS exercise_instance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    practice_id INTEGER NOT NULL REFERENCES practice(id) ON DELETE CASCADE,
    exercise_id INTEGER NOT NULL REFERENCES exercise(id),
    sequence_order INTEGER NOT NULL,
    parameters TEXT NOT NULL
)
"#;

pub const CREATE_EXERCISE_LOG_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS exercise_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    exercise_instance_id INTEGER NOT NULL UNIQUE
        REFERENCES exercise_instance(id) ON DELETE CASCADE,
    completion_status TEXT NOT NULL,
    quality_rating TEXT NOT NULL,
    notes TEXT
)
"#;

/// Association tables are pure link records: two foreign keys forming a
/// composite primary key, no payload. Deleting either participant removes
/// the link rows only.
pub const CREATE_INSTRUMENT_TECHNIQUE_ASSOCIATION: &str = r#"
CREATE TABLE IF NOT EXISTS instrument_technique_association (
    instrument_id INTEGER NOT NULL REFERENCES instrument(id) ON DELETE CASCADE,
    technique_id INTEGER NOT NULL REFERENCES technique(id) ON DELETE CASCADE,
    PRIMARY KEY (instrument_id, technique_id)
)
"#;

pub const CREATE_EXERCISE_TECHNIQUE_ASSOCIATION: &str = r#"
CREATE TABLE IF NOT EXISTS exercise_technique_association (
    exercise_id INTEGER NOT NULL REFERENCES exercise(id) ON DELETE CASCADE,
    technique_id INTEGER NOT NULL REFERENCES technique(id) ON DELETE CASCADE,
    PRIMARY KEY (exercise_id, technique_id)
)
"#;

pub const CREATE_EXERCISE_OVERLOAD_DIMENSION_ASSOCIATION: &str = r#"
CREATE TABLE IF NOT EXISTS exercise_overload_dimension_association (
    exercise_id INTEGER NOT NULL REFERENCES exercise(id) ON DELETE CASCADE,
    overload_dimension_id INTEGER NOT NULL REFERENCES overload_dimension(id) ON DELETE CASCADE,
    PRIMARY KEY (exercise_id, overload_dimension_id)
)
"#;

pub const CREATE_STRINGED_INSTRUMENT_TUNING_ASSOCIATION: &str = r#"
CREATE TABLE IF NOT EXISTS stringed_instrument_tuning_association (
    stringed_instrument_id INTEGER NOT NULL
        REFERENCES stringed_instrument(id) ON DELETE CASCADE,
    stringed_instrument_tuning_id INTEGER NOT NULL
        REFERENCES stringed_instrument_tuning(id) ON DELETE CASCADE,
    PRIMARY KEY (stringed_instrument_id, stringed_instrument_tuning_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_practice_instrument ON practice(instrument_id)",
    "CREATE INDEX IF NOT EXISTS idx_exercise_instance_practice ON exercise_instance(practice_id)",
    "CREATE INDEX IF NOT EXISTS idx_exercise_instance_exercise ON exercise_instance(exercise_id)",
];

/// All schema creation statements, in dependency order.
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_INSTRUMENT_TABLE,
        CREATE_STRINGED_INSTRUMENT_TABLE,
        CREATE_KEYBOARD_INSTRUMENT_TABLE,
        CREATE_WIND_INSTRUMENT_TABLE,
        CREATE_PERCUSSION_INSTRUMENT_TABLE,
        CREATE_TUNING_TABLE,
        CREATE_STRINGED_INSTRUMENT_TUNING_TABLE,
        CREATE_KEYBOARD_INSTRUMENT_TUNING_TABLE,
        CREATE_WIND_INSTRUMENT_TUNING_TABLE,
        CREATE_PERCUSSION_INSTRUMENT_TUNING_TABLE,
        CREATE_EXERCISE_TABLE,
        CREATE_EXERCISE_STATE_TABLE,
        CREATE_TECHNIQUE_TABLE,
        CREATE_OVERLOAD_DIMENSION_TABLE,
        CREATE_PRACTICE_TABLE,
        CREATE_EXERCISE_INSTANCE_TABLE,
        CREATE_EXERCISE_LOG_TABLE,
        CREATE_INSTRUMENT_TECHNIQUE_ASSOCIATION,
        CREATE_EXERCISE_TECHNIQUE_ASSOCIATION,
        CREATE_EXERCISE_OVERLOAD_DIMENSION_ASSOCIATION,
        CREATE_STRINGED_INSTRUMENT_TUNING_ASSOCIATION,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
