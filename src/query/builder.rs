use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::Connection;

use crate::date_util::format_timestamp;
use crate::models::{MatchStatus, Role};
use crate::storage::repository::{match_row_from, MatchRow, MATCH_SELECT, SERVICE_TYPE_EXPR};

/// Builder for completed-match queries scoped to one actor.
///
/// The completed-status predicate is always applied; callers cannot lift it.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    actor_id: i64,
    role: Role,
    service_type: Option<String>,
    completed_from: Option<NaiveDate>,
    completed_to: Option<NaiveDate>,
    limit: Option<u32>,
    offset: u64,
}

impl HistoryQuery {
    pub fn new(actor_id: i64, role: Role) -> Self {
        Self {
            actor_id,
            role,
            service_type: None,
            completed_from: None,
            completed_to: None,
            limit: None,
            offset: 0,
        }
    }

    /// Exact, case-sensitive match on the effective service type.
    pub fn service_type(mut self, st: &str) -> Self {
        self.service_type = Some(st.to_string());
        self
    }

    /// Completed on or after the start of `date`.
    pub fn completed_from(mut self, date: NaiveDate) -> Self {
        self.completed_from = Some(date);
        self
    }

    /// Completed on or before the end of `date`.
    pub fn completed_to(mut self, date: NaiveDate) -> Self {
        self.completed_to = Some(date);
        self
    }

    pub fn limit(mut self, n: u32) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: u64) -> Self {
        self.offset = n;
        self
    }

    /// Run the query, returning the current page of rows.
    pub fn fetch(&self, conn: &Connection) -> Result<Vec<MatchRow>, rusqlite::Error> {
        let (sql, params) = self.build_sql();
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), match_row_from)?;
        rows.collect()
    }

    /// Count every row the filters admit, ignoring limit and offset.
    pub fn count(&self, conn: &Connection) -> Result<u64, rusqlite::Error> {
        let (where_sql, params) = self.build_where();
        let sql = format!(
            "SELECT COUNT(*) FROM matches m
             JOIN requests r ON r.request_id = m.request_id
             LEFT JOIN categories c ON c.category_id = r.category_id
             WHERE {where_sql}"
        );
        let param_refs: Vec<&dyn rusqlite::types::ToSql> =
            params.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))?;
        Ok(count as u64)
    }

    fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
        let mut wheres = Vec::new();

        wheres.push(format!("{} = ?1", self.role.owner_column()));
        params.push(Box::new(self.actor_id));
        wheres.push("m.status = ?2".to_string());
        params.push(Box::new(MatchStatus::Completed.as_str()));
        let mut param_idx = 3;

        if let Some(ref st) = self.service_type {
            wheres.push(format!("{SERVICE_TYPE_EXPR} = ?{param_idx}"));
            params.push(Box::new(st.clone()));
            param_idx += 1;
        }
        if let Some(date) = self.completed_from {
            wheres.push(format!("m.completed_at >= ?{param_idx}"));
            params.push(Box::new(format_timestamp(date.and_time(NaiveTime::MIN))));
            param_idx += 1;
        }
        if let Some(date) = self.completed_to {
            // Half-open: strictly before the next midnight.
            let next = (date + Duration::days(1)).and_time(NaiveTime::MIN);
            wheres.push(format!("m.completed_at < ?{param_idx}"));
            params.push(Box::new(format_timestamp(next)));
        }

        (wheres.join(" AND "), params)
    }

    fn build_sql(&self) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
        let (where_sql, mut params) = self.build_where();
        let mut sql = format!("{MATCH_SELECT} WHERE {where_sql}");

        // Newest completion first; rows missing a completion time fall back
        // to their creation time so the sequence stays monotone.
        sql.push_str(" ORDER BY COALESCE(m.completed_at, m.created_at) DESC,");
        sql.push_str(" m.created_at DESC, m.match_id DESC");

        if let Some(limit) = self.limit {
            let idx = params.len() + 1;
            sql.push_str(&format!(" LIMIT ?{} OFFSET ?{}", idx, idx + 1));
            params.push(Box::new(limit as i64));
            params.push(Box::new(i64::try_from(self.offset).unwrap_or(i64::MAX)));
        }

        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_build_sql_default() {
        let q = HistoryQuery::new(42, Role::Requester);
        let (sql, params) = q.build_sql();
        assert!(sql.contains("m.pin_id = ?1"));
        assert!(sql.contains("m.status = ?2"));
        assert!(sql.contains("ORDER BY COALESCE(m.completed_at, m.created_at) DESC"));
        assert!(!sql.contains("LIMIT"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_build_sql_volunteer_scope() {
        let (sql, _) = HistoryQuery::new(7, Role::Volunteer).build_sql();
        assert!(sql.contains("m.csr_rep_id = ?1"));
        assert!(!sql.contains("m.pin_id = ?1"));
    }

    #[test]
    fn test_build_sql_with_filters() {
        let q = HistoryQuery::new(42, Role::Requester)
            .service_type("Tutoring")
            .completed_from(date(2025, 1, 1))
            .completed_to(date(2025, 1, 31))
            .limit(10)
            .offset(20);
        let (sql, params) = q.build_sql();
        assert!(sql.contains("COALESCE(m.service_type, c.title) = ?3"));
        assert!(sql.contains("m.completed_at >= ?4"));
        assert!(sql.contains("m.completed_at < ?5"));
        assert!(sql.contains("LIMIT ?6 OFFSET ?7"));
        assert_eq!(params.len(), 7);
    }

    #[test]
    fn test_huge_offset_binds_as_max() {
        let q = HistoryQuery::new(1, Role::Requester).limit(10).offset(u64::MAX);
        let (_, params) = q.build_sql();
        let last = params.last().unwrap().to_sql().unwrap();
        match last {
            rusqlite::types::ToSqlOutput::Owned(rusqlite::types::Value::Integer(n)) => {
                assert_eq!(n, i64::MAX)
            }
            rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Integer(n)) => {
                assert_eq!(n, i64::MAX)
            }
            other => panic!("unexpected offset {other:?}"),
        }
    }

    #[test]
    fn test_upper_bound_is_next_midnight() {
        let q = HistoryQuery::new(1, Role::Requester).completed_to(date(2025, 12, 31));
        let (_, params) = q.build_where();
        let last = params.last().unwrap().to_sql().unwrap();
        match last {
            rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(t)) => {
                assert_eq!(t, b"2026-01-01 00:00:00")
            }
            rusqlite::types::ToSqlOutput::Owned(rusqlite::types::Value::Text(t)) => {
                assert_eq!(t, "2026-01-01 00:00:00")
            }
            other => panic!("unexpected bound {other:?}"),
        }
    }
}
