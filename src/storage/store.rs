//! SQLite-backed store.
//!
//! [`Store`] owns the connection; every operation runs inside
//! [`Store::with_txn`], which hands the caller a [`Txn`] and commits on
//! `Ok` or rolls back on `Err`. Rollback is the drop behavior of the
//! underlying transaction, so the failure path holds on every exit,
//! including unwinds.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use crate::model::connector::{ConnectorUpdate, OverloadDimension, Technique};
use crate::model::exercise::{Exercise, ExerciseState, ExerciseStateUpdate, ExerciseUpdate};
use crate::model::instrument::{Instrument, InstrumentDetail, InstrumentKind, InstrumentUpdate};
use crate::model::practice::{
    ExerciseInstance, ExerciseInstanceUpdate, ExerciseLog, ExerciseLogUpdate, Parameters,
    Practice, PracticeUpdate,
};
use crate::model::tuning::{Tuning, TuningDetail, TuningUpdate};
use crate::model::{DomainType, FatigueProfile, SessionType};
use crate::{Error, Result};

use super::{codec, schema};

/// SQLite-backed store for the practice-tracking schema.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open a database file (creates if it doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    /// Open from a connection descriptor string.
    ///
    /// Accepts `sqlite://:memory:` (or `sqlite:///:memory:`) for an
    /// in-memory database and `sqlite://<path>` for a file. Any other
    /// scheme is a configuration error.
    pub fn connect(database_url: &str) -> Result<Self> {
        let rest = database_url
            .strip_prefix("sqlite://")
            .ok_or_else(|| Error::Config(format!("unsupported database url: {}", database_url)))?;
        match rest {
            "" | ":memory:" | "/:memory:" => Self::open_in_memory(),
            path => Self::open(Path::new(path)),
        }
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        // SQLite ships with foreign key enforcement off; cascades and FK
        // constraint errors depend on it.
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        tracing::debug!("schema initialized");
        Ok(())
    }

    /// Run `f` inside a single transaction.
    ///
    /// Commits when `f` returns `Ok`; any `Err` (or unwind) rolls back the
    /// whole transaction, leaving no partial writes.
    pub fn with_txn<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Txn<'_>) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let txn = Txn { tx };
        match f(&txn) {
            Ok(value) => {
                txn.tx.commit()?;
                tracing::trace!("transaction committed");
                Ok(value)
            }
            Err(err) => {
                // Dropping the transaction rolls it back.
                tracing::trace!("transaction rolled back: {}", err);
                Err(err)
            }
        }
    }

    /// Connectivity check (`SELECT 1`); surfaces the underlying failure.
    pub fn ping(&self) -> Result<()> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

/// Active transaction handle; only exists inside [`Store::with_txn`].
pub struct Txn<'a> {
    tx: rusqlite::Transaction<'a>,
}

/// Raw base+variant join row for an instrument, decoded outside the
/// rusqlite closure so codec failures stay `Error::Decoding`.
struct InstrumentRow {
    id: i64,
    name: String,
    instrument_type: String,
    string_count: Option<i64>,
    scale_length: Option<f64>,
}

struct TuningRow {
    id: i64,
    name: String,
    tuning_type: String,
    pitch_sequence: Option<String>,
}

struct ExerciseRow {
    id: i64,
    name: String,
    domains: String,
    technique_tags: String,
    instrument_compatibility: Option<String>,
}

struct ExerciseStateRow {
    id: i64,
    exercise_id: i64,
    last_practiced_date: Option<String>,
    rolling_minutes_7d: i64,
    rolling_minutes_28d: i64,
    mastery_estimate: f64,
    last_fatigue_profile: Option<String>,
}

struct PracticeRow {
    id: i64,
    instrument_id: i64,
    session_date: String,
    session_type: String,
    total_minutes: i64,
}

struct InstanceRow {
    id: i64,
    practice_id: i64,
    exercise_id: i64,
    sequence_order: i64,
    parameters: String,
}

struct LogRow {
    id: i64,
    exercise_instance_id: i64,
    completion_status: String,
    quality_rating: String,
    notes: Option<String>,
}

const INSTRUMENT_SELECT: &str = "SELECT i.id, i.name, i.instrument_type, \
     s.string_count, s.scale_length \
     FROM instrument i LEFT JOIN stringed_instrument s ON s.id = i.id";

const TUNING_SELECT: &str = "SELECT t.id, t.name, t.tuning_type, s.pitch_sequence \
     FROM tuning t LEFT JOIN stringed_instrument_tuning s ON s.id = t.id";

fn read_instrument_row(row: &rusqlite::Row) -> rusqlite::Result<InstrumentRow> {
    Ok(InstrumentRow {
        id: row.get(0)?,
        name: row.get(1)?,
        instrument_type: row.get(2)?,
        string_count: row.get(3)?,
        scale_length: row.get(4)?,
    })
}

fn read_tuning_row(row: &rusqlite::Row) -> rusqlite::Result<TuningRow> {
    Ok(TuningRow {
        id: row.get(0)?,
        name: row.get(1)?,
        tuning_type: row.get(2)?,
        pitch_sequence: row.get(3)?,
    })
}

fn read_exercise_row(row: &rusqlite::Row) -> rusqlite::Result<ExerciseRow> {
    Ok(ExerciseRow {
        id: row.get(0)?,
        name: row.get(1)?,
        domains: row.get(2)?,
        technique_tags: row.get(3)?,
        instrument_compatibility: row.get(4)?,
    })
}

fn read_state_row(row: &rusqlite::Row) -> rusqlite::Result<ExerciseStateRow> {
    Ok(ExerciseStateRow {
        id: row.get(0)?,
        exercise_id: row.get(1)?,
        last_practiced_date: row.get(2)?,
        rolling_minutes_7d: row.get(3)?,
        rolling_minutes_28d: row.get(4)?,
        mastery_estimate: row.get(5)?,
        last_fatigue_profile: row.get(6)?,
    })
}

fn read_practice_row(row: &rusqlite::Row) -> rusqlite::Result<PracticeRow> {
    Ok(PracticeRow {
        id: row.get(0)?,
        instrument_id: row.get(1)?,
        session_date: row.get(2)?,
        session_type: row.get(3)?,
        total_minutes: row.get(4)?,
    })
}

fn read_instance_row(row: &rusqlite::Row) -> rusqlite::Result<InstanceRow> {
    Ok(InstanceRow {
        id: row.get(0)?,
        practice_id: row.get(1)?,
        exercise_id: row.get(2)?,
        sequence_order: row.get(3)?,
        parameters: row.get(4)?,
    })
}

fn read_log_row(row: &rusqlite::Row) -> rusqlite::Result<LogRow> {
    Ok(LogRow {
        id: row.get(0)?,
        exercise_instance_id: row.get(1)?,
        completion_status: row.get(2)?,
        quality_rating: row.get(3)?,
        notes: row.get(4)?,
    })
}

fn read_technique_row(row: &rusqlite::Row) -> rusqlite::Result<Technique> {
    Ok(Technique {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn read_dimension_row(row: &rusqlite::Row) -> rusqlite::Result<OverloadDimension> {
    Ok(OverloadDimension {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn decode_date(stored: &str) -> Result<NaiveDate> {
    stored
        .parse()
        .map_err(|_| Error::Decoding(format!("Invalid date: {}", stored)))
}

/// Stored counts and positions are non-negative by schema; anything else
/// is corruption and surfaces as a decoding failure, not a truncated cast.
fn decode_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| Error::Decoding(format!("{} out of range: {}", field, value)))
}

fn decode_instrument(raw: InstrumentRow) -> Result<Instrument> {
    let kind = InstrumentKind::from_str(&raw.instrument_type)?;
    let detail = match kind {
        InstrumentKind::Stringed => {
            let string_count = raw.string_count.ok_or_else(|| {
                Error::Decoding(format!("instrument {}: missing stringed variant row", raw.id))
            })?;
            InstrumentDetail::Stringed {
                string_count: decode_u32(string_count, "string_count")?,
                scale_length: raw.scale_length,
            }
        }
        InstrumentKind::Keyboard => InstrumentDetail::Keyboard,
        InstrumentKind::Wind => InstrumentDetail::Wind,
        InstrumentKind::Percussion => InstrumentDetail::Percussion,
    };
    Ok(Instrument {
        id: raw.id,
        name: raw.name,
        detail,
    })
}

fn decode_tuning(raw: TuningRow) -> Result<Tuning> {
    let kind = InstrumentKind::from_str(&raw.tuning_type)?;
    let detail = match kind {
        InstrumentKind::Stringed => {
            let pitch_sequence = codec::decode_string_list(raw.pitch_sequence)?.ok_or_else(|| {
                Error::Decoding(format!("tuning {}: missing stringed variant row", raw.id))
            })?;
            TuningDetail::Stringed { pitch_sequence }
        }
        InstrumentKind::Keyboard => TuningDetail::Keyboard,
        InstrumentKind::Wind => TuningDetail::Wind,
        InstrumentKind::Percussion => TuningDetail::Percussion,
    };
    Ok(Tuning {
        id: raw.id,
        name: raw.name,
        detail,
    })
}

fn decode_exercise(raw: ExerciseRow) -> Result<Exercise> {
    Ok(Exercise {
        id: raw.id,
        name: raw.name,
        domains: codec::decode_enum_list(&raw.domains)?,
        technique_tags: codec::decode_string_list(Some(raw.technique_tags))?
            .unwrap_or_default(),
        instrument_compatibility: codec::decode_string_list(raw.instrument_compatibility)?,
    })
}

fn decode_state(raw: ExerciseStateRow) -> Result<ExerciseState> {
    Ok(ExerciseState {
        id: raw.id,
        exercise_id: raw.exercise_id,
        last_practiced_date: raw.last_practiced_date.as_deref().map(decode_date).transpose()?,
        rolling_minutes_7d: decode_u32(raw.rolling_minutes_7d, "rolling_minutes_7d")?,
        rolling_minutes_28d: decode_u32(raw.rolling_minutes_28d, "rolling_minutes_28d")?,
        mastery_estimate: raw.mastery_estimate,
        last_fatigue_profile: codec::decode_enum_opt(raw.last_fatigue_profile)?,
    })
}

fn decode_practice(raw: PracticeRow) -> Result<Practice> {
    Ok(Practice {
        id: raw.id,
        instrument_id: raw.instrument_id,
        session_date: decode_date(&raw.session_date)?,
        session_type: codec::decode_enum(&raw.session_type)?,
        total_minutes: decode_u32(raw.total_minutes, "total_minutes")?,
    })
}

fn decode_instance(raw: InstanceRow) -> Result<ExerciseInstance> {
    Ok(ExerciseInstance {
        id: raw.id,
        practice_id: raw.practice_id,
        exercise_id: raw.exercise_id,
        sequence_order: decode_u32(raw.sequence_order, "sequence_order")?,
        parameters: codec::decode_dict(Some(raw.parameters))?.unwrap_or_default(),
    })
}

fn decode_log(raw: LogRow) -> Result<ExerciseLog> {
    Ok(ExerciseLog {
        id: raw.id,
        exercise_instance_id: raw.exercise_instance_id,
        completion_status: codec::decode_enum(&raw.completion_status)?,
        quality_rating: codec::decode_enum(&raw.quality_rating)?,
        notes: raw.notes,
    })
}

impl<'a> Txn<'a> {
    // ========== Instrument Operations ==========

    /// Insert a base row plus the matching variant row.
    pub fn create_instrument(&self, name: &str, detail: &InstrumentDetail) -> Result<Instrument> {
        self.tx.execute(
            "INSERT INTO instrument (name, instrument_type) VALUES (?1, ?2)",
            params![name, detail.kind().as_str()],
        )?;
        let id = self.tx.last_insert_rowid();
        match detail {
            InstrumentDetail::Stringed {
                string_count,
                scale_length,
            } => {
                self.tx.execute(
                    "INSERT INTO stringed_instrument (id, string_count, scale_length) VALUES (?1, ?2, ?3)",
                    params![id, string_count, scale_length],
                )?;
            }
            InstrumentDetail::Keyboard => {
                self.tx
                    .execute("INSERT INTO keyboard_instrument (id) VALUES (?1)", [id])?;
            }
            InstrumentDetail::Wind => {
                self.tx
                    .execute("INSERT INTO wind_instrument (id) VALUES (?1)", [id])?;
            }
            InstrumentDetail::Percussion => {
                self.tx
                    .execute("INSERT INTO percussion_instrument (id) VALUES (?1)", [id])?;
            }
        }
        Ok(Instrument {
            id,
            name: name.to_string(),
            detail: detail.clone(),
        })
    }

    /// Get an instrument by id, always as its concrete variant.
    pub fn get_instrument(&self, id: i64) -> Result<Instrument> {
        let raw = self
            .tx
            .query_row(
                &format!("{} WHERE i.id = ?1", INSTRUMENT_SELECT),
                [id],
                read_instrument_row,
            )
            .optional()?
            .ok_or(Error::NotFound("instrument"))?;
        decode_instrument(raw)
    }

    /// List instruments across the whole hierarchy.
    pub fn list_instruments(&self, skip: usize, limit: usize) -> Result<Vec<Instrument>> {
        let mut stmt = self.tx.prepare(&format!(
            "{} ORDER BY i.id LIMIT ?1 OFFSET ?2",
            INSTRUMENT_SELECT
        ))?;
        let rows = stmt.query_map(params![limit as i64, skip as i64], read_instrument_row)?;
        let mut instruments = Vec::new();
        for row in rows {
            instruments.push(decode_instrument(row?)?);
        }
        Ok(instruments)
    }

    /// Apply a partial update. The discriminator never changes; stringed
    /// fields only apply when the instrument is stringed.
    pub fn update_instrument(&self, id: i64, update: &InstrumentUpdate) -> Result<Instrument> {
        let mut instrument = self.get_instrument(id)?;
        if let Some(name) = &update.name {
            instrument.name = name.clone();
            self.tx.execute(
                "UPDATE instrument SET name = ?1 WHERE id = ?2",
                params![name, id],
            )?;
        }
        if let InstrumentDetail::Stringed {
            string_count,
            scale_length,
        } = &mut instrument.detail
        {
            if let Some(count) = update.string_count {
                *string_count = count;
            }
            if let Some(length) = update.scale_length {
                *scale_length = length;
            }
            self.tx.execute(
                "UPDATE stringed_instrument SET string_count = ?1, scale_length = ?2 WHERE id = ?3",
                params![*string_count, *scale_length, id],
            )?;
        }
        Ok(instrument)
    }

    /// Delete an instrument; cascades through its practices, their
    /// instances and logs.
    pub fn delete_instrument(&self, id: i64) -> Result<()> {
        let deleted = self
            .tx
            .execute("DELETE FROM instrument WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("instrument"));
        }
        Ok(())
    }

    // ========== Tuning Operations ==========

    pub fn create_tuning(&self, name: &str, detail: &TuningDetail) -> Result<Tuning> {
        self.tx.execute(
            "INSERT INTO tuning (name, tuning_type) VALUES (?1, ?2)",
            params![name, detail.kind().as_str()],
        )?;
        let id = self.tx.last_insert_rowid();
        match detail {
            TuningDetail::Stringed { pitch_sequence } => {
                self.tx.execute(
                    "INSERT INTO stringed_instrument_tuning (id, pitch_sequence) VALUES (?1, ?2)",
                    params![id, codec::encode_string_list(pitch_sequence)?],
                )?;
            }
            TuningDetail::Keyboard => {
                self.tx.execute(
                    "INSERT INTO keyboard_instrument_tuning (id) VALUES (?1)",
                    [id],
                )?;
            }
            TuningDetail::Wind => {
                self.tx
                    .execute("INSERT INTO wind_instrument_tuning (id) VALUES (?1)", [id])?;
            }
            TuningDetail::Percussion => {
                self.tx.execute(
                    "INSERT INTO percussion_instrument_tuning (id) VALUES (?1)",
                    [id],
                )?;
            }
        }
        Ok(Tuning {
            id,
            name: name.to_string(),
            detail: detail.clone(),
        })
    }

    pub fn get_tuning(&self, id: i64) -> Result<Tuning> {
        let raw = self
            .tx
            .query_row(
                &format!("{} WHERE t.id = ?1", TUNING_SELECT),
                [id],
                read_tuning_row,
            )
            .optional()?
            .ok_or(Error::NotFound("tuning"))?;
        decode_tuning(raw)
    }

    pub fn list_tunings(&self, skip: usize, limit: usize) -> Result<Vec<Tuning>> {
        let mut stmt = self.tx.prepare(&format!(
            "{} ORDER BY t.id LIMIT ?1 OFFSET ?2",
            TUNING_SELECT
        ))?;
        let rows = stmt.query_map(params![limit as i64, skip as i64], read_tuning_row)?;
        let mut tunings = Vec::new();
        for row in rows {
            tunings.push(decode_tuning(row?)?);
        }
        Ok(tunings)
    }

    pub fn update_tuning(&self, id: i64, update: &TuningUpdate) -> Result<Tuning> {
        let mut tuning = self.get_tuning(id)?;
        if let Some(name) = &update.name {
            tuning.name = name.clone();
            self.tx.execute(
                "UPDATE tuning SET name = ?1 WHERE id = ?2",
                params![name, id],
            )?;
        }
        if let (TuningDetail::Stringed { pitch_sequence }, Some(pitches)) =
            (&mut tuning.detail, &update.pitch_sequence)
        {
            *pitch_sequence = pitches.clone();
            self.tx.execute(
                "UPDATE stringed_instrument_tuning SET pitch_sequence = ?1 WHERE id = ?2",
                params![codec::encode_string_list(pitches)?, id],
            )?;
        }
        Ok(tuning)
    }

    pub fn delete_tuning(&self, id: i64) -> Result<()> {
        let deleted = self.tx.execute("DELETE FROM tuning WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("tuning"));
        }
        Ok(())
    }

    // ========== Exercise Operations ==========

    pub fn create_exercise(
        &self,
        name: &str,
        domains: &[DomainType],
        technique_tags: &[String],
        instrument_compatibility: Option<&[String]>,
    ) -> Result<Exercise> {
        let compatibility = instrument_compatibility
            .map(codec::encode_string_list)
            .transpose()?;
        self.tx.execute(
            "INSERT INTO exercise (name, domains, technique_tags, instrument_compatibility) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                codec::encode_enum_list(domains)?,
                codec::encode_string_list(technique_tags)?,
                compatibility,
            ],
        )?;
        Ok(Exercise {
            id: self.tx.last_insert_rowid(),
            name: name.to_string(),
            domains: domains.to_vec(),
            technique_tags: technique_tags.to_vec(),
            instrument_compatibility: instrument_compatibility.map(<[String]>::to_vec),
        })
    }

    pub fn get_exercise(&self, id: i64) -> Result<Exercise> {
        let raw = self
            .tx
            .query_row(
                "SELECT id, name, domains, technique_tags, instrument_compatibility \
                 FROM exercise WHERE id = ?1",
                [id],
                read_exercise_row,
            )
            .optional()?
            .ok_or(Error::NotFound("exercise"))?;
        decode_exercise(raw)
    }

    pub fn list_exercises(&self, skip: usize, limit: usize) -> Result<Vec<Exercise>> {
        let mut stmt = self.tx.prepare(
            "SELECT id, name, domains, technique_tags, instrument_compatibility \
             FROM exercise ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, skip as i64], read_exercise_row)?;
        let mut exercises = Vec::new();
        for row in rows {
            exercises.push(decode_exercise(row?)?);
        }
        Ok(exercises)
    }

    pub fn update_exercise(&self, id: i64, update: &ExerciseUpdate) -> Result<Exercise> {
        let mut exercise = self.get_exercise(id)?;
        if let Some(name) = &update.name {
            exercise.name = name.clone();
        }
        if let Some(domains) = &update.domains {
            exercise.domains = domains.clone();
        }
        if let Some(tags) = &update.technique_tags {
            exercise.technique_tags = tags.clone();
        }
        if let Some(compat) = &update.instrument_compatibility {
            exercise.instrument_compatibility = compat.clone();
        }
        let compatibility = exercise
            .instrument_compatibility
            .as_deref()
            .map(codec::encode_string_list)
            .transpose()?;
        self.tx.execute(
            "UPDATE exercise SET name = ?1, domains = ?2, technique_tags = ?3, \
             instrument_compatibility = ?4 WHERE id = ?5",
            params![
                exercise.name,
                codec::encode_enum_list(&exercise.domains)?,
                codec::encode_string_list(&exercise.technique_tags)?,
                compatibility,
                id,
            ],
        )?;
        Ok(exercise)
    }

    /// Delete an exercise; cascades to its state row.
    pub fn delete_exercise(&self, id: i64) -> Result<()> {
        let deleted = self.tx.execute("DELETE FROM exercise WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("exercise"));
        }
        Ok(())
    }

    // ========== Exercise State Operations ==========

    /// Create the state row for an exercise. A second state for the same
    /// exercise hits the UNIQUE constraint and fails.
    pub fn create_exercise_state(
        &self,
        exercise_id: i64,
        last_practiced_date: Option<NaiveDate>,
        rolling_minutes_7d: u32,
        rolling_minutes_28d: u32,
        mastery_estimate: f64,
        last_fatigue_profile: Option<FatigueProfile>,
    ) -> Result<ExerciseState> {
        self.tx.execute(
            "INSERT INTO exercise_state (exercise_id, last_practiced_date, rolling_minutes_7d, \
             rolling_minutes_28d, mastery_estimate, last_fatigue_profile) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                exercise_id,
                last_practiced_date.map(|d| d.to_string()),
                rolling_minutes_7d,
                rolling_minutes_28d,
                mastery_estimate,
                last_fatigue_profile.map(|f| f.as_str()),
            ],
        )?;
        Ok(ExerciseState {
            id: self.tx.last_insert_rowid(),
            exercise_id,
            last_practiced_date,
            rolling_minutes_7d,
            rolling_minutes_28d,
            mastery_estimate,
            last_fatigue_profile,
        })
    }

    pub fn get_exercise_state(&self, id: i64) -> Result<ExerciseState> {
        let raw = self
            .tx
            .query_row(
                "SELECT id, exercise_id, last_practiced_date, rolling_minutes_7d, \
                 rolling_minutes_28d, mastery_estimate, last_fatigue_profile \
                 FROM exercise_state WHERE id = ?1",
                [id],
                read_state_row,
            )
            .optional()?
            .ok_or(Error::NotFound("exercise state"))?;
        decode_state(raw)
    }

    /// The state row owned by an exercise, if it has one.
    pub fn state_for_exercise(&self, exercise_id: i64) -> Result<Option<ExerciseState>> {
        let raw = self
            .tx
            .query_row(
                "SELECT id, exercise_id, last_practiced_date, rolling_minutes_7d, \
                 rolling_minutes_28d, mastery_estimate, last_fatigue_profile \
                 FROM exercise_state WHERE exercise_id = ?1",
                [exercise_id],
                read_state_row,
            )
            .optional()?;
        raw.map(decode_state).transpose()
    }

    pub fn update_exercise_state(
        &self,
        id: i64,
        update: &ExerciseStateUpdate,
    ) -> Result<ExerciseState> {
        let mut state = self.get_exercise_state(id)?;
        if let Some(date) = update.last_practiced_date {
            state.last_practiced_date = date;
        }
        if let Some(minutes) = update.rolling_minutes_7d {
            state.rolling_minutes_7d = minutes;
        }
        if let Some(minutes) = update.rolling_minutes_28d {
            state.rolling_minutes_28d = minutes;
        }
        if let Some(mastery) = update.mastery_estimate {
            state.mastery_estimate = mastery;
        }
        if let Some(fatigue) = update.last_fatigue_profile {
            state.last_fatigue_profile = fatigue;
        }
        self.tx.execute(
            "UPDATE exercise_state SET last_practiced_date = ?1, rolling_minutes_7d = ?2, \
             rolling_minutes_28d = ?3, mastery_estimate = ?4, last_fatigue_profile = ?5 \
             WHERE id = ?6",
            params![
                state.last_practiced_date.map(|d| d.to_string()),
                state.rolling_minutes_7d,
                state.rolling_minutes_28d,
                state.mastery_estimate,
                state.last_fatigue_profile.map(|f| f.as_str()),
                id,
            ],
        )?;
        Ok(state)
    }

    pub fn delete_exercise_state(&self, id: i64) -> Result<()> {
        let deleted = self
            .tx
            .execute("DELETE FROM exercise_state WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("exercise state"));
        }
        Ok(())
    }

    // ========== Technique Operations ==========

    pub fn create_technique(&self, name: &str, description: Option<&str>) -> Result<Technique> {
        self.tx.execute(
            "INSERT INTO technique (name, description) VALUES (?1, ?2)",
            params![name, description],
        )?;
        Ok(Technique {
            id: self.tx.last_insert_rowid(),
            name: name.to_string(),
            description: description.map(str::to_string),
        })
    }

    pub fn get_technique(&self, id: i64) -> Result<Technique> {
        self.tx
            .query_row(
                "SELECT id, name, description FROM technique WHERE id = ?1",
                [id],
                read_technique_row,
            )
            .optional()?
            .ok_or(Error::NotFound("technique"))
    }

    pub fn list_techniques(&self, skip: usize, limit: usize) -> Result<Vec<Technique>> {
        let mut stmt = self.tx.prepare(
            "SELECT id, name, description FROM technique ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, skip as i64], read_technique_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_technique(&self, id: i64, update: &ConnectorUpdate) -> Result<Technique> {
        let mut technique = self.get_technique(id)?;
        if let Some(name) = &update.name {
            technique.name = name.clone();
        }
        if let Some(description) = &update.description {
            technique.description = description.clone();
        }
        self.tx.execute(
            "UPDATE technique SET name = ?1, description = ?2 WHERE id = ?3",
            params![technique.name, technique.description, id],
        )?;
        Ok(technique)
    }

    /// Delete a technique. Only association rows go with it; linked
    /// instruments and exercises stay.
    pub fn delete_technique(&self, id: i64) -> Result<()> {
        let deleted = self
            .tx
            .execute("DELETE FROM technique WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("technique"));
        }
        Ok(())
    }

    // ========== Overload Dimension Operations ==========

    pub fn create_overload_dimension(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<OverloadDimension> {
        self.tx.execute(
            "INSERT INTO overload_dimension (name, description) VALUES (?1, ?2)",
            params![name, description],
        )?;
        Ok(OverloadDimension {
            id: self.tx.last_insert_rowid(),
            name: name.to_string(),
            description: description.map(str::to_string),
        })
    }

    pub fn get_overload_dimension(&self, id: i64) -> Result<OverloadDimension> {
        self.tx
            .query_row(
                "SELECT id, name, description FROM overload_dimension WHERE id = ?1",
                [id],
                read_dimension_row,
            )
            .optional()?
            .ok_or(Error::NotFound("overload dimension"))
    }

    pub fn list_overload_dimensions(
        &self,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<OverloadDimension>> {
        let mut stmt = self.tx.prepare(
            "SELECT id, name, description FROM overload_dimension ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, skip as i64], read_dimension_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn update_overload_dimension(
        &self,
        id: i64,
        update: &ConnectorUpdate,
    ) -> Result<OverloadDimension> {
        let mut dimension = self.get_overload_dimension(id)?;
        if let Some(name) = &update.name {
            dimension.name = name.clone();
        }
        if let Some(description) = &update.description {
            dimension.description = description.clone();
        }
        self.tx.execute(
            "UPDATE overload_dimension SET name = ?1, description = ?2 WHERE id = ?3",
            params![dimension.name, dimension.description, id],
        )?;
        Ok(dimension)
    }

    pub fn delete_overload_dimension(&self, id: i64) -> Result<()> {
        let deleted = self
            .tx
            .execute("DELETE FROM overload_dimension WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("overload dimension"));
        }
        Ok(())
    }

    // ========== Practice Operations ==========

    pub fn create_practice(
        &self,
        instrument_id: i64,
        session_date: NaiveDate,
        session_type: SessionType,
        total_minutes: u32,
    ) -> Result<Practice> {
        self.tx.execute(
            "INSERT INTO practice (instrument_id, session_date, session_type, total_minutes) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                instrument_id,
                session_date.to_string(),
                session_type.as_str(),
                total_minutes,
            ],
        )?;
        Ok(Practice {
            id: self.tx.last_insert_rowid(),
            instrument_id,
            session_date,
            session_type,
            total_minutes,
        })
    }

    pub fn get_practice(&self, id: i64) -> Result<Practice> {
        let raw = self
            .tx
            .query_row(
                "SELECT id, instrument_id, session_date, session_type, total_minutes \
                 FROM practice WHERE id = ?1",
                [id],
                read_practice_row,
            )
            .optional()?
            .ok_or(Error::NotFound("practice"))?;
        decode_practice(raw)
    }

    pub fn list_practices(&self, skip: usize, limit: usize) -> Result<Vec<Practice>> {
        let mut stmt = self.tx.prepare(
            "SELECT id, instrument_id, session_date, session_type, total_minutes \
             FROM practice ORDER BY id LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit as i64, skip as i64], read_practice_row)?;
        let mut practices = Vec::new();
        for row in rows {
            practices.push(decode_practice(row?)?);
        }
        Ok(practices)
    }

    /// Practices owned by one instrument, in insertion order.
    pub fn practices_for_instrument(&self, instrument_id: i64) -> Result<Vec<Practice>> {
        let mut stmt = self.tx.prepare(
            "SELECT id, instrument_id, session_date, session_type, total_minutes \
             FROM practice WHERE instrument_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([instrument_id], read_practice_row)?;
        let mut practices = Vec::new();
        for row in rows {
            practices.push(decode_practice(row?)?);
        }
        Ok(practices)
    }

    pub fn update_practice(&self, id: i64, update: &PracticeUpdate) -> Result<Practice> {
        let mut practice = self.get_practice(id)?;
        if let Some(date) = update.session_date {
            practice.session_date = date;
        }
        if let Some(session_type) = update.session_type {
            practice.session_type = session_type;
        }
        if let Some(minutes) = update.total_minutes {
            practice.total_minutes = minutes;
        }
        self.tx.execute(
            "UPDATE practice SET session_date = ?1, session_type = ?2, total_minutes = ?3 \
             WHERE id = ?4",
            params![
                practice.session_date.to_string(),
                practice.session_type.as_str(),
                practice.total_minutes,
                id,
            ],
        )?;
        Ok(practice)
    }

    /// Delete a practice; its instances and their logs go with it in the
    /// same transaction.
    pub fn delete_practice(&self, id: i64) -> Result<()> {
        let deleted = self.tx.execute("DELETE FROM practice WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("practice"));
        }
        Ok(())
    }

    // ========== Exercise Instance Operations ==========

    pub fn create_exercise_instance(
        &self,
        practice_id: i64,
        exercise_id: i64,
        sequence_order: u32,
        parameters: &Parameters,
    ) -> Result<ExerciseInstance> {
        self.tx.execute(
            "INSERT INTO exercise_instance (practice_id, exercise_id, sequence_order, parameters) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                practice_id,
                exercise_id,
                sequence_order,
                codec::encode_dict(parameters)?,
            ],
        )?;
        Ok(ExerciseInstance {
            id: self.tx.last_insert_rowid(),
            practice_id,
            exercise_id,
            sequence_order,
            parameters: parameters.clone(),
        })
    }

    pub fn get_exercise_instance(&self, id: i64) -> Result<ExerciseInstance> {
        let raw = self
            .tx
            .query_row(
                "SELECT id, practice_id, exercise_id, sequence_order, parameters \
                 FROM exercise_instance WHERE id = ?1",
                [id],
                read_instance_row,
            )
            .optional()?
            .ok_or(Error::NotFound("exercise instance"))?;
        decode_instance(raw)
    }

    /// Instances of one practice, ordered by sequence position.
    pub fn instances_for_practice(&self, practice_id: i64) -> Result<Vec<ExerciseInstance>> {
        let mut stmt = self.tx.prepare(
            "SELECT id, practice_id, exercise_id, sequence_order, parameters \
             FROM exercise_instance WHERE practice_id = ?1 ORDER BY sequence_order",
        )?;
        let rows = stmt.query_map([practice_id], read_instance_row)?;
        let mut instances = Vec::new();
        for row in rows {
            instances.push(decode_instance(row?)?);
        }
        Ok(instances)
    }

    pub fn update_exercise_instance(
        &self,
        id: i64,
        update: &ExerciseInstanceUpdate,
    ) -> Result<ExerciseInstance> {
        let mut instance = self.get_exercise_instance(id)?;
        if let Some(order) = update.sequence_order {
            instance.sequence_order = order;
        }
        if let Some(parameters) = &update.parameters {
            instance.parameters = parameters.clone();
        }
        self.tx.execute(
            "UPDATE exercise_instance SET sequence_order = ?1, parameters = ?2 WHERE id = ?3",
            params![
                instance.sequence_order,
                codec::encode_dict(&instance.parameters)?,
                id,
            ],
        )?;
        Ok(instance)
    }

    pub fn delete_exercise_instance(&self, id: i64) -> Result<()> {
        let deleted = self
            .tx
            .execute("DELETE FROM exercise_instance WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("exercise instance"));
        }
        Ok(())
    }

    // ========== Exercise Log Operations ==========

    /// Create the completion record for an instance. The UNIQUE constraint
    /// rejects a second log for the same instance.
    pub fn create_exercise_log(
        &self,
        exercise_instance_id: i64,
        completion_status: crate::model::CompletionStatus,
        quality_rating: crate::model::QualityRating,
        notes: Option<&str>,
    ) -> Result<ExerciseLog> {
        self.tx.execute(
            "INSERT INTO exercise_log (exercise_instance_id, completion_status, quality_rating, notes) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                exercise_instance_id,
                completion_status.as_str(),
                quality_rating.as_str(),
                notes,
            ],
        )?;
        Ok(ExerciseLog {
            id: self.tx.last_insert_rowid(),
            exercise_instance_id,
            completion_status,
            quality_rating,
            notes: notes.map(str::to_string),
        })
    }

    pub fn get_exercise_log(&self, id: i64) -> Result<ExerciseLog> {
        let raw = self
            .tx
            .query_row(
                "SELECT id, exercise_instance_id, completion_status, quality_rating, notes \
                 FROM exercise_log WHERE id = ?1",
                [id],
                read_log_row,
            )
            .optional()?
            .ok_or(Error::NotFound("exercise log"))?;
        decode_log(raw)
    }

    /// The log owned by an instance, if recorded.
    pub fn log_for_instance(&self, exercise_instance_id: i64) -> Result<Option<ExerciseLog>> {
        let raw = self
            .tx
            .query_row(
                "SELECT id, exercise_instance_id, completion_status, quality_rating, notes \
                 FROM exercise_log WHERE exercise_instance_id = ?1",
                [exercise_instance_id],
                read_log_row,
            )
            .optional()?;
        raw.map(decode_log).transpose()
    }

    pub fn update_exercise_log(&self, id: i64, update: &ExerciseLogUpdate) -> Result<ExerciseLog> {
        let mut log = self.get_exercise_log(id)?;
        if let Some(status) = update.completion_status {
            log.completion_status = status;
        }
        if let Some(rating) = update.quality_rating {
            log.quality_rating = rating;
        }
        if let Some(notes) = &update.notes {
            log.notes = notes.clone();
        }
        self.tx.execute(
            "UPDATE exercise_log SET completion_status = ?1, quality_rating = ?2, notes = ?3 \
             WHERE id = ?4",
            params![
                log.completion_status.as_str(),
                log.quality_rating.as_str(),
                log.notes,
                id,
            ],
        )?;
        Ok(log)
    }

    pub fn delete_exercise_log(&self, id: i64) -> Result<()> {
        let deleted = self
            .tx
            .execute("DELETE FROM exercise_log WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound("exercise log"));
        }
        Ok(())
    }

    // ========== Association Operations ==========
    //
    // Many-to-many edges are mutated only through these link/unlink calls;
    // there is no collection assignment on either side, so mutual
    // consistency has a single code path.

    pub fn link_instrument_technique(&self, instrument_id: i64, technique_id: i64) -> Result<()> {
        self.tx.execute(
            "INSERT INTO instrument_technique_association (instrument_id, technique_id) \
             VALUES (?1, ?2)",
            params![instrument_id, technique_id],
        )?;
        Ok(())
    }

    pub fn unlink_instrument_technique(&self, instrument_id: i64, technique_id: i64) -> Result<()> {
        let deleted = self.tx.execute(
            "DELETE FROM instrument_technique_association \
             WHERE instrument_id = ?1 AND technique_id = ?2",
            params![instrument_id, technique_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound("association"));
        }
        Ok(())
    }

    pub fn techniques_for_instrument(&self, instrument_id: i64) -> Result<Vec<Technique>> {
        let mut stmt = self.tx.prepare(
            "SELECT t.id, t.name, t.description FROM technique t \
             JOIN instrument_technique_association a ON a.technique_id = t.id \
             WHERE a.instrument_id = ?1 ORDER BY t.id",
        )?;
        let rows = stmt.query_map([instrument_id], read_technique_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn instruments_for_technique(&self, technique_id: i64) -> Result<Vec<Instrument>> {
        let mut stmt = self.tx.prepare(&format!(
            "{} JOIN instrument_technique_association a ON a.instrument_id = i.id \
             WHERE a.technique_id = ?1 ORDER BY i.id",
            INSTRUMENT_SELECT
        ))?;
        let rows = stmt.query_map([technique_id], read_instrument_row)?;
        let mut instruments = Vec::new();
        for row in rows {
            instruments.push(decode_instrument(row?)?);
        }
        Ok(instruments)
    }

    pub fn link_exercise_technique(&self, exercise_id: i64, technique_id: i64) -> Result<()> {
        self.tx.execute(
            "INSERT INTO exercise_technique_association (exercise_id, technique_id) \
             VALUES (?1, ?2)",
            params![exercise_id, technique_id],
        )?;
        Ok(())
    }

    pub fn unlink_exercise_technique(&self, exercise_id: i64, technique_id: i64) -> Result<()> {
        let deleted = self.tx.execute(
            "DELETE FROM exercise_technique_association \
             WHERE exercise_id = ?1 AND technique_id = ?2",
            params![exercise_id, technique_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound("association"));
        }
        Ok(())
    }

    pub fn techniques_for_exercise(&self, exercise_id: i64) -> Result<Vec<Technique>> {
        let mut stmt = self.tx.prepare(
            "SELECT t.id, t.name, t.description FROM technique t \
             JOIN exercise_technique_association a ON a.technique_id = t.id \
             WHERE a.exercise_id = ?1 ORDER BY t.id",
        )?;
        let rows = stmt.query_map([exercise_id], read_technique_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn exercises_for_technique(&self, technique_id: i64) -> Result<Vec<Exercise>> {
        let mut stmt = self.tx.prepare(
            "SELECT e.id, e.name, e.domains, e.technique_tags, e.instrument_compatibility \
             FROM exercise e \
             JOIN exercise_technique_association a ON a.exercise_id = e.id \
             WHERE a.technique_id = ?1 ORDER BY e.id",
        )?;
        let rows = stmt.query_map([technique_id], read_exercise_row)?;
        let mut exercises = Vec::new();
        for row in rows {
            exercises.push(decode_exercise(row?)?);
        }
        Ok(exercises)
    }

    pub fn link_exercise_overload_dimension(
        &self,
        exercise_id: i64,
        overload_dimension_id: i64,
    ) -> Result<()> {
        self.tx.execute(
            "INSERT INTO exercise_overload_dimension_association \
             (exercise_id, overload_dimension_id) VALUES (?1, ?2)",
            params![exercise_id, overload_dimension_id],
        )?;
        Ok(())
    }

    pub fn unlink_exercise_overload_dimension(
        &self,
        exercise_id: i64,
        overload_dimension_id: i64,
    ) -> Result<()> {
        let deleted = self.tx.execute(
            "DELETE FROM exercise_overload_dimension_association \
             WHERE exercise_id = ?1 AND overload_dimension_id = ?2",
            params![exercise_id, overload_dimension_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound("association"));
        }
        Ok(())
    }

    pub fn overload_dimensions_for_exercise(
        &self,
        exercise_id: i64,
    ) -> Result<Vec<OverloadDimension>> {
        let mut stmt = self.tx.prepare(
            "SELECT d.id, d.name, d.description FROM overload_dimension d \
             JOIN exercise_overload_dimension_association a ON a.overload_dimension_id = d.id \
             WHERE a.exercise_id = ?1 ORDER BY d.id",
        )?;
        let rows = stmt.query_map([exercise_id], read_dimension_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn exercises_for_overload_dimension(
        &self,
        overload_dimension_id: i64,
    ) -> Result<Vec<Exercise>> {
        let mut stmt = self.tx.prepare(
            "SELECT e.id, e.name, e.domains, e.technique_tags, e.instrument_compatibility \
             FROM exercise e \
             JOIN exercise_overload_dimension_association a ON a.exercise_id = e.id \
             WHERE a.overload_dimension_id = ?1 ORDER BY e.id",
        )?;
        let rows = stmt.query_map([overload_dimension_id], read_exercise_row)?;
        let mut exercises = Vec::new();
        for row in rows {
            exercises.push(decode_exercise(row?)?);
        }
        Ok(exercises)
    }

    /// Link a stringed instrument to a stringed tuning. The foreign keys
    /// point at the variant tables, so linking a non-stringed participant
    /// fails as a constraint violation.
    pub fn link_instrument_tuning(&self, instrument_id: i64, tuning_id: i64) -> Result<()> {
        self.tx.execute(
            "INSERT INTO stringed_instrument_tuning_association \
             (stringed_instrument_id, stringed_instrument_tuning_id) VALUES (?1, ?2)",
            params![instrument_id, tuning_id],
        )?;
        Ok(())
    }

    pub fn unlink_instrument_tuning(&self, instrument_id: i64, tuning_id: i64) -> Result<()> {
        let deleted = self.tx.execute(
            "DELETE FROM stringed_instrument_tuning_association \
             WHERE stringed_instrument_id = ?1 AND stringed_instrument_tuning_id = ?2",
            params![instrument_id, tuning_id],
        )?;
        if deleted == 0 {
            return Err(Error::NotFound("association"));
        }
        Ok(())
    }

    pub fn tunings_for_instrument(&self, instrument_id: i64) -> Result<Vec<Tuning>> {
        let mut stmt = self.tx.prepare(&format!(
            "{} JOIN stringed_instrument_tuning_association a \
             ON a.stringed_instrument_tuning_id = t.id \
             WHERE a.stringed_instrument_id = ?1 ORDER BY t.id",
            TUNING_SELECT
        ))?;
        let rows = stmt.query_map([instrument_id], read_tuning_row)?;
        let mut tunings = Vec::new();
        for row in rows {
            tunings.push(decode_tuning(row?)?);
        }
        Ok(tunings)
    }

    pub fn instruments_for_tuning(&self, tuning_id: i64) -> Result<Vec<Instrument>> {
        let mut stmt = self.tx.prepare(&format!(
            "{} JOIN stringed_instrument_tuning_association a \
             ON a.stringed_instrument_id = i.id \
             WHERE a.stringed_instrument_tuning_id = ?1 ORDER BY i.id",
            INSTRUMENT_SELECT
        ))?;
        let rows = stmt.query_map([tuning_id], read_instrument_row)?;
        let mut instruments = Vec::new();
        for row in rows {
            instruments.push(decode_instrument(row?)?);
        }
        Ok(instruments)
    }

    // ========== Statistics ==========

    fn count(&self, table: &str) -> Result<usize> {
        let count: i64 =
            self.tx
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            instruments: self.count("instrument")?,
            tunings: self.count("tuning")?,
            exercises: self.count("exercise")?,
            techniques: self.count("technique")?,
            overload_dimensions: self.count("overload_dimension")?,
            practices: self.count("practice")?,
            exercise_instances: self.count("exercise_instance")?,
            exercise_logs: self.count("exercise_log")?,
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub instruments: usize,
    pub tunings: usize,
    pub exercises: usize,
    pub techniques: usize,
    pub overload_dimensions: usize,
    pub practices: usize,
    pub exercise_instances: usize,
    pub exercise_logs: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Instruments: {}", self.instruments)?;
        writeln!(f, "  Tunings: {}", self.tunings)?;
        writeln!(f, "  Exercises: {}", self.exercises)?;
        writeln!(f, "  Techniques: {}", self.techniques)?;
        writeln!(f, "  Overload dimensions: {}", self.overload_dimensions)?;
        writeln!(f, "  Practices: {}", self.practices)?;
        writeln!(f, "  Exercise instances: {}", self.exercise_instances)?;
        writeln!(f, "  Exercise logs: {}", self.exercise_logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompletionStatus, QualityRating};

    fn guitar_detail() -> InstrumentDetail {
        InstrumentDetail::Stringed {
            string_count: 6,
            scale_length: Some(25.5),
        }
    }

    #[test]
    fn test_instrument_crud() {
        let mut store = Store::open_in_memory().unwrap();

        let guitar = store
            .with_txn(|txn| txn.create_instrument("Strat 6-string", &guitar_detail()))
            .unwrap();
        assert!(guitar.id > 0);

        let fetched = store.with_txn(|txn| txn.get_instrument(guitar.id)).unwrap();
        assert_eq!(fetched, guitar);
        assert_eq!(fetched.kind(), InstrumentKind::Stringed);

        let updated = store
            .with_txn(|txn| {
                txn.update_instrument(
                    guitar.id,
                    &InstrumentUpdate {
                        string_count: Some(7),
                        ..Default::default()
                    },
                )
            })
            .unwrap();
        assert!(matches!(
            updated.detail,
            InstrumentDetail::Stringed { string_count: 7, .. }
        ));

        store.with_txn(|txn| txn.delete_instrument(guitar.id)).unwrap();
        let missing = store.with_txn(|txn| txn.get_instrument(guitar.id));
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_polymorphic_resolution() {
        let mut store = Store::open_in_memory().unwrap();

        store
            .with_txn(|txn| {
                txn.create_instrument("Guitar", &guitar_detail())?;
                txn.create_instrument("Piano", &InstrumentDetail::Keyboard)?;
                Ok(())
            })
            .unwrap();

        let all = store.with_txn(|txn| txn.list_instruments(0, 100)).unwrap();
        assert_eq!(all.len(), 2);
        assert!(matches!(all[0].detail, InstrumentDetail::Stringed { .. }));
        assert!(matches!(all[1].detail, InstrumentDetail::Keyboard));
    }

    #[test]
    fn test_tuning_polymorphic_resolution() {
        let mut store = Store::open_in_memory().unwrap();

        let standard = TuningDetail::Stringed {
            pitch_sequence: vec![
                "E2".into(),
                "A2".into(),
                "D3".into(),
                "G3".into(),
                "B3".into(),
                "E4".into(),
            ],
        };
        store
            .with_txn(|txn| {
                txn.create_tuning("Standard", &standard)?;
                txn.create_tuning("A440", &TuningDetail::Keyboard)?;
                Ok(())
            })
            .unwrap();

        let all = store.with_txn(|txn| txn.list_tunings(0, 100)).unwrap();
        assert_eq!(all.len(), 2);
        assert!(matches!(all[0].detail, TuningDetail::Stringed { .. }));
        assert!(matches!(all[1].detail, TuningDetail::Keyboard));
    }

    #[test]
    fn test_duplicate_instrument_name_is_constraint() {
        let mut store = Store::open_in_memory().unwrap();

        store
            .with_txn(|txn| txn.create_instrument("Guitar", &guitar_detail()))
            .unwrap();
        let dup = store.with_txn(|txn| txn.create_instrument("Guitar", &InstrumentDetail::Wind));
        assert!(matches!(dup, Err(Error::Constraint(_))));

        // The failed transaction left nothing behind.
        let all = store.with_txn(|txn| txn.list_instruments(0, 100)).unwrap();
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn test_exercise_state_cardinality() {
        let mut store = Store::open_in_memory().unwrap();

        let exercise = store
            .with_txn(|txn| {
                txn.create_exercise("Chromatic Scale", &[DomainType::Technique], &[], None)
            })
            .unwrap();

        store
            .with_txn(|txn| txn.create_exercise_state(exercise.id, None, 0, 0, 0.0, None))
            .unwrap();
        let second =
            store.with_txn(|txn| txn.create_exercise_state(exercise.id, None, 10, 40, 0.5, None));
        assert!(matches!(second, Err(Error::Constraint(_))));

        let state = store
            .with_txn(|txn| txn.state_for_exercise(exercise.id))
            .unwrap()
            .unwrap();
        assert_eq!(state.rolling_minutes_7d, 0);
    }

    #[test]
    fn test_cascade_delete_through_practice() {
        let mut store = Store::open_in_memory().unwrap();

        let (practice_id, instance_ids) = store
            .with_txn(|txn| {
                let guitar = txn.create_instrument("Guitar", &guitar_detail())?;
                let exercise =
                    txn.create_exercise("Spider Walk", &[DomainType::Technique], &[], None)?;
                let practice = txn.create_practice(
                    guitar.id,
                    "2025-01-15".parse().unwrap(),
                    SessionType::Normal,
                    60,
                )?;
                let first = txn.create_exercise_instance(
                    practice.id,
                    exercise.id,
                    1,
                    &Parameters::new(),
                )?;
                let second = txn.create_exercise_instance(
                    practice.id,
                    exercise.id,
                    2,
                    &Parameters::new(),
                )?;
                txn.create_exercise_log(
                    first.id,
                    CompletionStatus::Yes,
                    QualityRating::Clean,
                    None,
                )?;
                txn.create_exercise_log(
                    second.id,
                    CompletionStatus::Partial,
                    QualityRating::Sloppy,
                    Some("ran out of time"),
                )?;
                Ok((practice.id, (first.id, second.id)))
            })
            .unwrap();

        store.with_txn(|txn| txn.delete_practice(practice_id)).unwrap();

        let (instances, logs) = store
            .with_txn(|txn| {
                let instances = txn.instances_for_practice(practice_id)?;
                let first_log = txn.log_for_instance(instance_ids.0)?;
                let second_log = txn.log_for_instance(instance_ids.1)?;
                Ok((instances, (first_log, second_log)))
            })
            .unwrap();
        assert!(instances.is_empty());
        assert!(logs.0.is_none());
        assert!(logs.1.is_none());
    }

    #[test]
    fn test_many_to_many_symmetry() {
        let mut store = Store::open_in_memory().unwrap();

        let (technique_id, a_id, b_id) = store
            .with_txn(|txn| {
                let technique = txn.create_technique("alternate picking", None)?;
                let a = txn.create_exercise("Exercise A", &[DomainType::Technique], &[], None)?;
                let b = txn.create_exercise("Exercise B", &[DomainType::Rhythm], &[], None)?;
                txn.link_exercise_technique(a.id, technique.id)?;
                txn.link_exercise_technique(b.id, technique.id)?;
                Ok((technique.id, a.id, b.id))
            })
            .unwrap();

        let exercises = store
            .with_txn(|txn| txn.exercises_for_technique(technique_id))
            .unwrap();
        let ids: Vec<i64> = exercises.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a_id, b_id]);

        let techniques = store
            .with_txn(|txn| txn.techniques_for_exercise(a_id))
            .unwrap();
        assert_eq!(techniques.len(), 1);
        assert_eq!(techniques[0].id, technique_id);

        // Deleting the technique removes links, not the exercises.
        store.with_txn(|txn| txn.delete_technique(technique_id)).unwrap();
        let a = store.with_txn(|txn| txn.get_exercise(a_id)).unwrap();
        assert_eq!(a.name, "Exercise A");
        let techniques = store.with_txn(|txn| txn.techniques_for_exercise(a_id)).unwrap();
        assert!(techniques.is_empty());
    }

    #[test]
    fn test_rollback_leaves_no_partial_writes() {
        let mut store = Store::open_in_memory().unwrap();

        let result: Result<()> = store.with_txn(|txn| {
            txn.create_instrument("Ghost", &InstrumentDetail::Wind)?;
            Err(Error::Decoding("forced failure".to_string()))
        });
        assert!(result.is_err());

        let all = store.with_txn(|txn| txn.list_instruments(0, 100)).unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_stringed_tuning_association() {
        let mut store = Store::open_in_memory().unwrap();

        let (guitar_id, tuning_id) = store
            .with_txn(|txn| {
                let guitar = txn.create_instrument("Guitar", &guitar_detail())?;
                let drop_d = txn.create_tuning(
                    "Drop D",
                    &TuningDetail::Stringed {
                        pitch_sequence: vec![
                            "D2".into(),
                            "A2".into(),
                            "D3".into(),
                            "G3".into(),
                            "B3".into(),
                            "E4".into(),
                        ],
                    },
                )?;
                txn.link_instrument_tuning(guitar.id, drop_d.id)?;
                Ok((guitar.id, drop_d.id))
            })
            .unwrap();

        let tunings = store
            .with_txn(|txn| txn.tunings_for_instrument(guitar_id))
            .unwrap();
        assert_eq!(tunings.len(), 1);
        assert_eq!(tunings[0].id, tuning_id);

        let instruments = store
            .with_txn(|txn| txn.instruments_for_tuning(tuning_id))
            .unwrap();
        assert_eq!(instruments.len(), 1);
        assert_eq!(instruments[0].id, guitar_id);
    }

    #[test]
    fn test_link_non_stringed_participant_fails() {
        let mut store = Store::open_in_memory().unwrap();

        let result = store.with_txn(|txn| {
            let piano = txn.create_instrument("Piano", &InstrumentDetail::Keyboard)?;
            let drop_d = txn.create_tuning(
                "Drop D",
                &TuningDetail::Stringed {
                    pitch_sequence: vec!["D2".into()],
                },
            )?;
            txn.link_instrument_tuning(piano.id, drop_d.id)
        });
        assert!(matches!(result, Err(Error::Constraint(_))));
    }

    #[test]
    fn test_connect_url_parsing() {
        assert!(Store::connect("sqlite://:memory:").is_ok());
        assert!(Store::connect("sqlite:///:memory:").is_ok());
        assert!(matches!(
            Store::connect("postgresql://localhost/practica"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_stats_counts_rows() {
        let mut store = Store::open_in_memory().unwrap();

        store
            .with_txn(|txn| {
                txn.create_instrument("Guitar", &guitar_detail())?;
                txn.create_technique("bending", Some("whole-step bends"))?;
                Ok(())
            })
            .unwrap();

        let stats = store.with_txn(|txn| txn.stats()).unwrap();
        assert_eq!(stats.instruments, 1);
        assert_eq!(stats.techniques, 1);
        assert_eq!(stats.practices, 0);
    }

    #[test]
    fn test_cascade_delete_through_instrument() {
        let mut store = Store::open_in_memory().unwrap();

        let (instrument_id, practice_id, instance_id) = store
            .with_txn(|txn| {
                let guitar = txn.create_instrument("Guitar", &guitar_detail())?;
                let exercise =
                    txn.create_exercise("Spider Walk", &[DomainType::Technique], &[], None)?;
                let practice = txn.create_practice(
                    guitar.id,
                    "2025-01-15".parse().unwrap(),
                    SessionType::Normal,
                    60,
                )?;
                let instance = txn.create_exercise_instance(
                    practice.id,
                    exercise.id,
                    1,
                    &Parameters::new(),
                )?;
                txn.create_exercise_log(
                    instance.id,
                    CompletionStatus::Yes,
                    QualityRating::Clean,
                    None,
                )?;
                Ok((guitar.id, practice.id, instance.id))
            })
            .unwrap();

        store
            .with_txn(|txn| txn.delete_instrument(instrument_id))
            .unwrap();

        // The whole ownership chain is gone: practices, instances, logs.
        store
            .with_txn(|txn| {
                assert!(matches!(
                    txn.get_practice(practice_id),
                    Err(Error::NotFound(_))
                ));
                assert!(txn.practices_for_instrument(instrument_id)?.is_empty());
                assert!(txn.instances_for_practice(practice_id)?.is_empty());
                assert!(txn.log_for_instance(instance_id)?.is_none());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_delete_exercise_removes_state() {
        let mut store = Store::open_in_memory().unwrap();

        let exercise_id = store
            .with_txn(|txn| {
                let exercise =
                    txn.create_exercise("Chromatic Scale", &[DomainType::Technique], &[], None)?;
                txn.create_exercise_state(exercise.id, None, 10, 40, 0.25, None)?;
                Ok(exercise.id)
            })
            .unwrap();

        store
            .with_txn(|txn| txn.delete_exercise(exercise_id))
            .unwrap();

        let state = store
            .with_txn(|txn| txn.state_for_exercise(exercise_id))
            .unwrap();
        assert!(state.is_none());
    }

    #[test]
    fn test_explicit_null_clears_nullable_fields() {
        let mut store = Store::open_in_memory().unwrap();

        let (instrument_id, technique_id) = store
            .with_txn(|txn| {
                let guitar = txn.create_instrument("Guitar", &guitar_detail())?;
                let technique = txn.create_technique("bending", Some("whole-step bends"))?;
                Ok((guitar.id, technique.id))
            })
            .unwrap();

        let updated = store
            .with_txn(|txn| {
                txn.update_instrument(
                    instrument_id,
                    &InstrumentUpdate {
                        scale_length: Some(None),
                        ..Default::default()
                    },
                )
            })
            .unwrap();
        assert!(matches!(
            updated.detail,
            InstrumentDetail::Stringed {
                scale_length: None,
                ..
            }
        ));

        let technique = store
            .with_txn(|txn| {
                txn.update_technique(
                    technique_id,
                    &ConnectorUpdate {
                        description: Some(None),
                        ..Default::default()
                    },
                )
            })
            .unwrap();
        assert!(technique.description.is_none());

        // An absent field leaves the cleared value alone.
        let technique = store
            .with_txn(|txn| txn.update_technique(technique_id, &ConnectorUpdate::default()))
            .unwrap();
        assert!(technique.description.is_none());
    }

    #[test]
    fn test_exercise_log_notes_cleared_by_explicit_null() {
        let mut store = Store::open_in_memory().unwrap();

        let log_id = store
            .with_txn(|txn| {
                let guitar = txn.create_instrument("Guitar", &guitar_detail())?;
                let exercise =
                    txn.create_exercise("Spider Walk", &[DomainType::Technique], &[], None)?;
                let practice = txn.create_practice(
                    guitar.id,
                    "2025-01-15".parse().unwrap(),
                    SessionType::Normal,
                    60,
                )?;
                let instance = txn.create_exercise_instance(
                    practice.id,
                    exercise.id,
                    1,
                    &Parameters::new(),
                )?;
                let log = txn.create_exercise_log(
                    instance.id,
                    CompletionStatus::Yes,
                    QualityRating::Clean,
                    Some("original notes"),
                )?;
                Ok(log.id)
            })
            .unwrap();

        // The wire shape a client sends to null the field out.
        let update: ExerciseLogUpdate = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        let updated = store
            .with_txn(|txn| txn.update_exercise_log(log_id, &update))
            .unwrap();
        assert_eq!(updated.notes, None);

        let fetched = store.with_txn(|txn| txn.get_exercise_log(log_id)).unwrap();
        assert_eq!(fetched.notes, None);
    }

    #[test]
    fn test_corrupt_stored_integer_is_decoding_failure() {
        let mut store = Store::open_in_memory().unwrap();

        let practice_id = store
            .with_txn(|txn| {
                let guitar = txn.create_instrument("Guitar", &guitar_detail())?;
                let practice = txn.create_practice(
                    guitar.id,
                    "2025-01-15".parse().unwrap(),
                    SessionType::Normal,
                    60,
                )?;
                Ok(practice.id)
            })
            .unwrap();

        store
            .conn
            .execute(
                "UPDATE practice SET total_minutes = -5 WHERE id = ?1",
                [practice_id],
            )
            .unwrap();

        let result = store.with_txn(|txn| txn.get_practice(practice_id));
        assert!(matches!(result, Err(Error::Decoding(_))));
    }
}
