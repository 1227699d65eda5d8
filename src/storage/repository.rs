use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::models::{MatchStatus, RequestStatus, Role};

/// Columns selected for every match listing, in `match_row_from` order.
pub(crate) const MATCH_SELECT: &str = "SELECT m.match_id, m.request_id, r.title,
        m.pin_id, pin.username, m.csr_rep_id, csr.username,
        m.status, COALESCE(m.service_type, c.title), c.title, m.notes,
        m.created_at, m.completed_at, m.updated_at
    FROM matches m
    JOIN requests r ON r.request_id = m.request_id
    LEFT JOIN categories c ON c.category_id = r.category_id
    LEFT JOIN user_accounts pin ON pin.id = m.pin_id
    LEFT JOIN user_accounts csr ON csr.id = m.csr_rep_id";

/// Service type shown for a match: its own label, else its request's category.
pub(crate) const SERVICE_TYPE_EXPR: &str = "COALESCE(m.service_type, c.title)";

/// A match joined with its request, category, and both accounts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRow {
    pub match_id: i64,
    pub request_id: i64,
    pub request_title: String,
    pub requester_id: i64,
    pub requester_name: Option<String>,
    pub volunteer_id: i64,
    pub volunteer_name: Option<String>,
    pub status: String,
    pub service_type: Option<String>,
    pub category_title: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub completed_at: Option<String>,
    pub updated_at: String,
}

pub(crate) fn match_row_from(row: &Row<'_>) -> Result<MatchRow, rusqlite::Error> {
    Ok(MatchRow {
        match_id: row.get(0)?,
        request_id: row.get(1)?,
        request_title: row.get(2)?,
        requester_id: row.get(3)?,
        requester_name: row.get(4)?,
        volunteer_id: row.get(5)?,
        volunteer_name: row.get(6)?,
        status: row.get(7)?,
        service_type: row.get(8)?,
        category_title: row.get(9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
        completed_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub category_id: i64,
    pub title: String,
    pub status: String,
}

impl CategoryRow {
    pub fn is_active(&self) -> bool {
        self.status == "Active"
    }
}

/// How often one of a requester's requests has been shortlisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortlistCount {
    pub request_id: i64,
    pub title: String,
    pub shortlist_count: u64,
}

// ── Writes (portal CRUD layer and fixtures) ───────────────────────

pub fn insert_user(
    conn: &Connection,
    username: &str,
    role: &str,
    created_at: &str,
) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO user_accounts (username, role, is_active, created_at, updated_at)
         VALUES (?1, ?2, 1, ?3, ?3)",
        params![username, role, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_category(
    conn: &Connection,
    title: &str,
    status: &str,
    created_by: Option<i64>,
    created_at: &str,
) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO categories (created_by, title, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![created_by, title, status, created_at],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone)]
pub struct NewRequest<'a> {
    pub requester_id: i64,
    pub category_id: Option<i64>,
    pub title: &'a str,
    pub status: RequestStatus,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

pub fn insert_request(conn: &Connection, req: &NewRequest<'_>) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO requests (user_account_id, category_id, title, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            req.requester_id,
            req.category_id,
            req.title,
            req.status.as_str(),
            req.created_at,
            req.updated_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

#[derive(Debug, Clone)]
pub struct NewMatch<'a> {
    pub request_id: i64,
    pub requester_id: i64,
    pub volunteer_id: i64,
    pub status: MatchStatus,
    pub service_type: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub created_at: &'a str,
    pub completed_at: Option<&'a str>,
    pub updated_at: &'a str,
}

pub fn insert_match(conn: &Connection, m: &NewMatch<'_>) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO matches (
            request_id, pin_id, csr_rep_id, status, service_type, notes,
            created_at, completed_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            m.request_id,
            m.requester_id,
            m.volunteer_id,
            m.status.as_str(),
            m.service_type,
            m.notes,
            m.created_at,
            m.completed_at,
            m.updated_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_shortlist(
    conn: &Connection,
    request_id: i64,
    volunteer_id: i64,
    shortlisted_at: &str,
) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO shortlists (request_id, csr_rep_id, shortlisted_at) VALUES (?1, ?2, ?3)",
        params![request_id, volunteer_id, shortlisted_at],
    )?;
    Ok(conn.last_insert_rowid())
}

// ── Reads ─────────────────────────────────────────────────────────

pub fn find_match(conn: &Connection, match_id: i64) -> Result<Option<MatchRow>, rusqlite::Error> {
    let sql = format!("{MATCH_SELECT} WHERE m.match_id = ?1");
    conn.query_row(&sql, params![match_id], match_row_from)
        .optional()
}

/// All categories in id order.
pub fn list_categories(conn: &Connection) -> Result<Vec<CategoryRow>, rusqlite::Error> {
    let mut stmt =
        conn.prepare("SELECT category_id, title, status FROM categories ORDER BY category_id")?;
    let rows = stmt.query_map([], |row| {
        Ok(CategoryRow {
            category_id: row.get(0)?,
            title: row.get(1)?,
            status: row.get(2)?,
        })
    })?;
    rows.collect()
}

/// Distinct effective service types across one actor's completed matches.
pub fn distinct_service_types(
    conn: &Connection,
    actor_id: i64,
    role: Role,
) -> Result<Vec<String>, rusqlite::Error> {
    let sql = format!(
        "SELECT DISTINCT {SERVICE_TYPE_EXPR} AS st
         FROM matches m
         JOIN requests r ON r.request_id = m.request_id
         LEFT JOIN categories c ON c.category_id = r.category_id
         WHERE {owner} = ?1 AND m.status = ?2 AND {SERVICE_TYPE_EXPR} IS NOT NULL
         ORDER BY st",
        owner = role.owner_column()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![actor_id, MatchStatus::Completed.as_str()], |row| {
        row.get(0)
    })?;
    rows.collect()
}

/// Shortlist counts for every request a requester owns, including zeros.
pub fn shortlist_counts_for_requester(
    conn: &Connection,
    requester_id: i64,
) -> Result<Vec<ShortlistCount>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT r.request_id, r.title, COUNT(s.shortlist_id)
         FROM requests r
         LEFT JOIN shortlists s ON s.request_id = r.request_id
         WHERE r.user_account_id = ?1
         GROUP BY r.request_id
         ORDER BY r.request_id",
    )?;
    let rows = stmt.query_map(params![requester_id], |row| {
        Ok(ShortlistCount {
            request_id: row.get(0)?,
            title: row.get(1)?,
            shortlist_count: row.get::<_, i64>(2)? as u64,
        })
    })?;
    rows.collect()
}

/// Row counts shown by the CLI `status` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreCounts {
    pub users: u64,
    pub categories: u64,
    pub requests: u64,
    pub matches: u64,
    pub completed_matches: u64,
    pub last_completed_at: Option<String>,
}

pub fn store_counts(conn: &Connection) -> Result<StoreCounts, rusqlite::Error> {
    let count = |sql: &str| -> Result<u64, rusqlite::Error> {
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n as u64)
    };
    let completed = MatchStatus::Completed.as_str();
    let completed_matches: i64 = conn.query_row(
        "SELECT COUNT(*) FROM matches WHERE status = ?1",
        params![completed],
        |row| row.get(0),
    )?;
    let last_completed_at: Option<String> = conn.query_row(
        "SELECT MAX(completed_at) FROM matches WHERE status = ?1",
        params![completed],
        |row| row.get(0),
    )?;
    Ok(StoreCounts {
        users: count("SELECT COUNT(*) FROM user_accounts")?,
        categories: count("SELECT COUNT(*) FROM categories")?,
        requests: count("SELECT COUNT(*) FROM requests")?,
        matches: count("SELECT COUNT(*) FROM matches")?,
        completed_matches: completed_matches as u64,
        last_completed_at,
    })
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}
