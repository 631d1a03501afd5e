use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::error::{AuraError, Result};
use crate::models::{CycleSnapshot, Tag, TopicRecord};
use crate::ports::{RecordSink, RecordSource};

pub struct Database {
    conn: Connection,
}

const TOPIC_COLUMNS: &str = "id, name, name_key, revised_at, revision_date, result_before, \
     result_after, percent_before, percent_after, confidence";

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                owner TEXT NOT NULL,
                name TEXT NOT NULL,
                revised_at INTEGER,
                revision_date TEXT,
                result_before TEXT NOT NULL DEFAULT '',
                result_after TEXT NOT NULL DEFAULT '',
                percent_before REAL NOT NULL DEFAULT 0,
                percent_after REAL NOT NULL DEFAULT 0,
                confidence TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Past review cycles, oldest first by position
            CREATE TABLE IF NOT EXISTS cycles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                date TEXT NOT NULL,
                result_before TEXT NOT NULL,
                result_after TEXT NOT NULL,
                confidence TEXT NOT NULL,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS topic_tags (
                topic_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (topic_id, tag_id),
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_topics_owner ON topics(owner);
            CREATE INDEX IF NOT EXISTS idx_cycles_topic ON cycles(topic_id, position);
            CREATE INDEX IF NOT EXISTS idx_topic_tags_topic ON topic_tags(topic_id);
            CREATE INDEX IF NOT EXISTS idx_topic_tags_tag ON topic_tags(tag_id);
            "#,
        )?;

        // Run migrations for existing databases
        self.migrate()?;

        // Needs the migrated column
        self.conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_topics_key ON topics(owner, name_key);",
        )?;

        Ok(())
    }

    // Databases created before name keys existed get the column, left NULL
    fn migrate(&self) -> Result<()> {
        let has_name_key = self
            .conn
            .prepare("SELECT name_key FROM topics LIMIT 1")
            .is_ok();

        if !has_name_key {
            log::info!("migrating topics table: adding name_key");
            self.conn
                .execute_batch("ALTER TABLE topics ADD COLUMN name_key TEXT;")?;
        }

        Ok(())
    }

    fn row_to_record(row: &Row) -> rusqlite::Result<TopicRecord> {
        Ok(TopicRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            name_key: row.get(2)?,
            revised_at: row.get(3)?,
            revision_date: row.get(4)?,
            result_before: row.get(5)?,
            result_after: row.get(6)?,
            percent_before: row.get(7)?,
            percent_after: row.get(8)?,
            confidence: row.get(9)?,
            tags: vec![],
            history: vec![],
            cycle_count: 0,
        })
    }

    // Tags and history live in their own tables
    fn fill_children(&self, record: &mut TopicRecord) -> Result<()> {
        record.tags = self.get_topic_tags(record.id)?;
        record.history = self.get_cycles(record.id)?;
        record.cycle_count = record.history.len();
        Ok(())
    }

    pub fn get_record(&self, id: i64) -> Result<Option<TopicRecord>> {
        let sql = format!("SELECT {} FROM topics WHERE id = ?1", TOPIC_COLUMNS);
        let record = self
            .conn
            .query_row(&sql, params![id], Self::row_to_record)
            .optional()?;

        match record {
            Some(mut r) => {
                self.fill_children(&mut r)?;
                Ok(Some(r))
            }
            None => Ok(None),
        }
    }

    fn get_cycles(&self, topic_id: i64) -> Result<Vec<CycleSnapshot>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT date, result_before, result_after, confidence
            FROM cycles
            WHERE topic_id = ?1
            ORDER BY position, id
            "#,
        )?;

        let rows = stmt.query_map(params![topic_id], |row| {
            Ok(CycleSnapshot {
                date: row.get(0)?,
                result_before: row.get(1)?,
                result_after: row.get(2)?,
                confidence: row.get(3)?,
            })
        })?;
        let cycles = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(cycles)
    }

    fn push_cycle(conn: &Connection, topic_id: i64, cycle: &CycleSnapshot) -> Result<()> {
        conn.execute(
            r#"
            INSERT INTO cycles (topic_id, position, date, result_before, result_after, confidence)
            VALUES (?1, (SELECT COALESCE(MAX(position), -1) + 1 FROM cycles WHERE topic_id = ?1),
                    ?2, ?3, ?4, ?5)
            "#,
            params![
                topic_id,
                cycle.date,
                cycle.result_before,
                cycle.result_after,
                cycle.confidence
            ],
        )?;
        Ok(())
    }

    pub fn update_topic_tags(&self, topic_id: i64, tags: &[String]) -> Result<()> {
        Self::replace_tags(&self.conn, topic_id, tags)
    }

    fn replace_tags(conn: &Connection, topic_id: i64, tags: &[String]) -> Result<()> {
        // Remove existing tags
        conn.execute(
            "DELETE FROM topic_tags WHERE topic_id = ?1",
            params![topic_id],
        )?;

        for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
            let tag_id = Self::get_or_create_tag(conn, tag)?;
            conn.execute(
                "INSERT OR IGNORE INTO topic_tags (topic_id, tag_id) VALUES (?1, ?2)",
                params![topic_id, tag_id],
            )?;
        }

        Ok(())
    }

    // Tag operations
    fn get_or_create_tag(conn: &Connection, name: &str) -> Result<i64> {
        let existing: Option<i64> = conn
            .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?;

        match existing {
            Some(id) => Ok(id),
            None => {
                conn.execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
                Ok(conn.last_insert_rowid())
            }
        }
    }

    fn get_topic_tags(&self, topic_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tg.name
            FROM tags tg
            JOIN topic_tags tt ON tg.id = tt.tag_id
            WHERE tt.topic_id = ?1
            ORDER BY tg.name
            "#,
        )?;

        let rows = stmt.query_map(params![topic_id], |row| row.get(0))?;
        let tags = rows.collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(tags)
    }

    pub fn list_tags(&self, owner: &str) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tg.id, tg.name, COUNT(t.id) as topic_count
            FROM tags tg
            JOIN topic_tags tt ON tg.id = tt.tag_id
            JOIN topics t ON t.id = tt.topic_id
            WHERE t.owner = ?1
            GROUP BY tg.id, tg.name
            ORDER BY tg.name
            "#,
        )?;

        let rows = stmt.query_map(params![owner], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                topic_count: row.get(2)?,
            })
        })?;
        let tags = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(tags)
    }
}

impl RecordSource for Database {
    fn load_records(&self, owner: &str) -> Result<Vec<TopicRecord>> {
        let sql = format!(
            "SELECT {} FROM topics WHERE owner = ?1 ORDER BY name COLLATE NOCASE, id",
            TOPIC_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![owner], Self::row_to_record)?;
        let mut records = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        for record in &mut records {
            self.fill_children(record)?;
        }

        log::debug!("loaded {} topic(s) for owner '{}'", records.len(), owner);
        Ok(records)
    }
}

impl RecordSink for Database {
    fn create_record(&self, owner: &str, record: &TopicRecord) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO topics (owner, name, name_key, revised_at, revision_date, result_before,
                                result_after, percent_before, percent_after, confidence)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                owner,
                record.name,
                record.name_key,
                record.revised_at,
                record.revision_date,
                record.result_before,
                record.result_after,
                record.percent_before,
                record.percent_after,
                record.confidence
            ],
        )?;
        let topic_id = tx.last_insert_rowid();

        for cycle in &record.history {
            Self::push_cycle(&tx, topic_id, cycle)?;
        }
        Self::replace_tags(&tx, topic_id, &record.tags)?;
        tx.commit()?;

        log::info!("created topic '{}' with ID {}", record.name, topic_id);
        Ok(topic_id)
    }

    fn update_record_with_history_push(&self, record: &TopicRecord) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        let rows = tx.execute(
            r#"
            UPDATE topics
            SET name = ?1,
                name_key = ?2,
                revised_at = ?3,
                revision_date = ?4,
                result_before = ?5,
                result_after = ?6,
                percent_before = ?7,
                percent_after = ?8,
                confidence = ?9
            WHERE id = ?10
            "#,
            params![
                record.name,
                record.name_key,
                record.revised_at,
                record.revision_date,
                record.result_before,
                record.result_after,
                record.percent_before,
                record.percent_after,
                record.confidence,
                record.id
            ],
        )?;
        if rows == 0 {
            return Err(AuraError::TopicNotFound(record.id));
        }

        if let Some(newest) = record.history.last() {
            Self::push_cycle(&tx, record.id, newest)?;
        }
        Self::replace_tags(&tx, record.id, &record.tags)?;
        tx.commit()?;

        log::info!(
            "updated topic '{}' ({} cycle(s))",
            record.name,
            record.history.len()
        );
        Ok(())
    }

    fn delete_record(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM topics WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_cycle(&self, id: i64, index: usize) -> Result<bool> {
        let cycle_id: Option<i64> = self
            .conn
            .query_row(
                r#"
                SELECT id FROM cycles
                WHERE topic_id = ?1
                ORDER BY position, id
                LIMIT 1 OFFSET ?2
                "#,
                params![id, index as i64],
                |row| row.get(0),
            )
            .optional()?;

        let Some(cycle_id) = cycle_id else {
            return Ok(false);
        };
        self.conn
            .execute("DELETE FROM cycles WHERE id = ?1", params![cycle_id])?;
        Ok(true)
    }
}
