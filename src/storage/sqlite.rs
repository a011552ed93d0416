use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Analysis, AnalysisStatus, ExportFile, ExportFormat};

const ANALYSIS_COLUMNS: &str = "id, repository_url, owner, repository_name, status, description, \
     language, stars, forks, repository_data, insights, file_structure, error_message, \
     created_at, updated_at";

const EXPORT_COLUMNS: &str = "id, analysis_id, format, filename, file_size, created_at";

/// Analysis records and export metadata. The connection is only locked for
/// the duration of a single statement batch, never across an await.
pub struct Storage {
    conn: Mutex<Connection>,
}

struct AnalysisRow {
    id: String,
    repository_url: String,
    owner: String,
    repository_name: String,
    status: String,
    description: Option<String>,
    language: Option<String>,
    stars: u64,
    forks: u64,
    repository_data: Option<String>,
    insights: Option<String>,
    file_structure: Option<String>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl AnalysisRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            repository_url: row.get(1)?,
            owner: row.get(2)?,
            repository_name: row.get(3)?,
            status: row.get(4)?,
            description: row.get(5)?,
            language: row.get(6)?,
            stars: row.get(7)?,
            forks: row.get(8)?,
            repository_data: row.get(9)?,
            insights: row.get(10)?,
            file_structure: row.get(11)?,
            error_message: row.get(12)?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }

    fn into_analysis(self) -> Result<Analysis> {
        Ok(Analysis {
            id: parse_uuid(&self.id)?,
            repository_url: self.repository_url,
            owner: self.owner,
            repository_name: self.repository_name,
            status: self.status.parse::<AnalysisStatus>()?,
            description: self.description,
            language: self.language,
            stars: self.stars,
            forks: self.forks,
            repository_data: from_json_column(self.repository_data)?,
            insights: from_json_column(self.insights)?,
            file_structure: from_json_column(self.file_structure)?,
            error_message: self.error_message,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

struct ExportRow {
    id: String,
    analysis_id: String,
    format: String,
    filename: String,
    file_size: u64,
    created_at: String,
}

impl ExportRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            analysis_id: row.get(1)?,
            format: row.get(2)?,
            filename: row.get(3)?,
            file_size: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_export(self) -> Result<ExportFile> {
        Ok(ExportFile {
            id: parse_uuid(&self.id)?,
            analysis_id: parse_uuid(&self.analysis_id)?,
            format: self.format.parse::<ExportFormat>()?,
            filename: self.filename,
            file_size: self.file_size,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| Error::Storage(format!("invalid id '{}': {}", value, e)))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Storage(format!("invalid timestamp '{}': {}", value, e)))
}

fn to_json_column<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(Into::into)
}

fn from_json_column<T: serde::de::DeserializeOwned>(value: Option<String>) -> Result<Option<T>> {
    value
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(Into::into)
}

impl Storage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_db()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Storage("database connection lock poisoned".to_string()))
    }

    fn init_db(&self) -> Result<()> {
        self.conn()?.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS analyses (
                id TEXT PRIMARY KEY,
                repository_url TEXT NOT NULL,
                owner TEXT NOT NULL,
                repository_name TEXT NOT NULL,
                status TEXT NOT NULL,
                description TEXT,
                language TEXT,
                stars INTEGER NOT NULL DEFAULT 0,
                forks INTEGER NOT NULL DEFAULT 0,
                repository_data TEXT,
                insights TEXT,
                file_structure TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS export_files (
                id TEXT PRIMARY KEY,
                analysis_id TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
                format TEXT NOT NULL,
                filename TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE(analysis_id, format)
            );

            CREATE INDEX IF NOT EXISTS idx_analyses_url ON analyses(repository_url);
            CREATE INDEX IF NOT EXISTS idx_analyses_created_at ON analyses(created_at);
            CREATE INDEX IF NOT EXISTS idx_export_files_analysis_id ON export_files(analysis_id);
            "#,
        )?;

        Ok(())
    }

    pub fn ping(&self) -> Result<()> {
        self.conn()?.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    /// Insert a new record or overwrite the stored one with the same id.
    pub fn save_analysis(&self, analysis: &Analysis) -> Result<()> {
        let repository_data = to_json_column(&analysis.repository_data)?;
        let insights = to_json_column(&analysis.insights)?;
        let file_structure = to_json_column(&analysis.file_structure)?;

        self.conn()?.execute(
            r#"
            INSERT INTO analyses (id, repository_url, owner, repository_name, status, description,
                                  language, stars, forks, repository_data, insights, file_structure,
                                  error_message, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                description = excluded.description,
                language = excluded.language,
                stars = excluded.stars,
                forks = excluded.forks,
                repository_data = excluded.repository_data,
                insights = excluded.insights,
                file_structure = excluded.file_structure,
                error_message = excluded.error_message,
                updated_at = excluded.updated_at
            "#,
            params![
                analysis.id.to_string(),
                analysis.repository_url,
                analysis.owner,
                analysis.repository_name,
                analysis.status.as_str(),
                analysis.description,
                analysis.language,
                analysis.stars,
                analysis.forks,
                repository_data,
                insights,
                file_structure,
                analysis.error_message,
                format_timestamp(&analysis.created_at),
                format_timestamp(&analysis.updated_at),
            ],
        )?;

        Ok(())
    }

    pub fn get_analysis(&self, id: Uuid) -> Result<Option<Analysis>> {
        let row = self
            .conn()?
            .query_row(
                &format!("SELECT {} FROM analyses WHERE id = ?1", ANALYSIS_COLUMNS),
                params![id.to_string()],
                AnalysisRow::from_row,
            )
            .optional()?;

        row.map(AnalysisRow::into_analysis).transpose()
    }

    /// Newest first, with the total number of matching records.
    pub fn list_analyses(
        &self,
        limit: usize,
        status: Option<AnalysisStatus>,
    ) -> Result<(Vec<Analysis>, usize)> {
        let status = status.map(|s| s.as_str());
        let conn = self.conn()?;

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM analyses WHERE ?1 IS NULL OR status = ?1",
            params![status],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM analyses WHERE ?1 IS NULL OR status = ?1 \
             ORDER BY created_at DESC LIMIT ?2",
            ANALYSIS_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![status, limit as i64], AnalysisRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        let analyses = rows
            .into_iter()
            .map(AnalysisRow::into_analysis)
            .collect::<Result<Vec<_>>>()?;

        Ok((analyses, total as usize))
    }

    pub fn latest_completed_for_url(&self, repository_url: &str) -> Result<Option<Analysis>> {
        let row = self
            .conn()?
            .query_row(
                &format!(
                    "SELECT {} FROM analyses WHERE repository_url = ?1 AND status = 'completed' \
                     ORDER BY created_at DESC LIMIT 1",
                    ANALYSIS_COLUMNS
                ),
                params![repository_url],
                AnalysisRow::from_row,
            )
            .optional()?;

        row.map(AnalysisRow::into_analysis).transpose()
    }

    /// Remove every record for a URL, returning the removed ids. Export rows
    /// go with them through the cascade.
    pub fn delete_by_url(&self, repository_url: &str) -> Result<Vec<Uuid>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let ids: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM analyses WHERE repository_url = ?1")?;
            let ids = stmt
                .query_map(params![repository_url], |row| row.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            ids
        };
        tx.execute(
            "DELETE FROM analyses WHERE repository_url = ?1",
            params![repository_url],
        )?;
        tx.commit()?;

        ids.iter().map(|id| parse_uuid(id)).collect()
    }

    /// Record an export, replacing any earlier row for the same analysis and
    /// format. Returns the stored row.
    pub fn upsert_export(&self, export: &ExportFile) -> Result<ExportFile> {
        self.conn()?.execute(
            r#"
            INSERT INTO export_files (id, analysis_id, format, filename, file_size, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(analysis_id, format) DO UPDATE SET
                filename = excluded.filename,
                file_size = excluded.file_size,
                created_at = excluded.created_at
            "#,
            params![
                export.id.to_string(),
                export.analysis_id.to_string(),
                export.format.as_str(),
                export.filename,
                export.file_size,
                format_timestamp(&export.created_at),
            ],
        )?;

        self.get_export(export.analysis_id, export.format)?
            .ok_or_else(|| Error::Storage("export row missing after upsert".to_string()))
    }

    pub fn get_export(
        &self,
        analysis_id: Uuid,
        format: ExportFormat,
    ) -> Result<Option<ExportFile>> {
        let row = self
            .conn()?
            .query_row(
                &format!(
                    "SELECT {} FROM export_files WHERE analysis_id = ?1 AND format = ?2",
                    EXPORT_COLUMNS
                ),
                params![analysis_id.to_string(), format.as_str()],
                ExportRow::from_row,
            )
            .optional()?;

        row.map(ExportRow::into_export).transpose()
    }

    pub fn list_exports(&self, analysis_id: Uuid) -> Result<Vec<ExportFile>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM export_files WHERE analysis_id = ?1 ORDER BY created_at, format",
            EXPORT_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![analysis_id.to_string()], ExportRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(ExportRow::into_export).collect()
    }
}
