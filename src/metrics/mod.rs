pub mod types;

pub use types::*;

use rusqlite::{params, Connection};

use crate::date_util::Window;
use crate::error::Result;
use crate::models::{MatchStatus, RequestStatus};
use crate::storage::repository::{self, ShortlistCount};
use crate::storage::Database;

/// Compute the raw counters for `window`.
///
/// "Completed" request counts use the request's last update time combined
/// with its current status, so a completed request edited later is counted
/// in the window of that later edit.
pub fn compute_period_stats(
    conn: &Connection,
    window: &Window,
) -> std::result::Result<PeriodStats, rusqlite::Error> {
    let start = window.start_key();
    let end = window.end_key();
    let completed_request = Some(RequestStatus::Completed.as_str());
    let completed_match = Some(MatchStatus::Completed.as_str());

    let total_requests: i64 =
        conn.query_row("SELECT COUNT(*) FROM requests", [], |row| row.get(0))?;
    let pending_requests: i64 = conn.query_row(
        "SELECT COUNT(*) FROM requests WHERE status = ?1",
        params![RequestStatus::Pending.as_str()],
        |row| row.get(0),
    )?;

    Ok(PeriodStats {
        new_requests: count_windowed(conn, "requests", "created_at", None, &start, &end)?,
        completed_requests: count_windowed(
            conn,
            "requests",
            "updated_at",
            completed_request,
            &start,
            &end,
        )?,
        new_matches: count_windowed(conn, "matches", "created_at", None, &start, &end)?,
        completed_matches: count_windowed(
            conn,
            "matches",
            "completed_at",
            completed_match,
            &start,
            &end,
        )?,
        new_shortlists: count_windowed(conn, "shortlists", "shortlisted_at", None, &start, &end)?,
        new_users: count_windowed(conn, "user_accounts", "created_at", None, &start, &end)?,
        total_requests: total_requests as u64,
        pending_requests: pending_requests as u64,
    })
}

/// Compare two stat blocks field by field.
pub fn compute_changes(current: &PeriodStats, previous: &PeriodStats) -> StatChanges {
    StatChanges {
        new_requests: windowed_change(current.new_requests, previous.new_requests),
        completed_requests: windowed_change(
            current.completed_requests,
            previous.completed_requests,
        ),
        new_matches: windowed_change(current.new_matches, previous.new_matches),
        completed_matches: windowed_change(current.completed_matches, previous.completed_matches),
        new_shortlists: windowed_change(current.new_shortlists, previous.new_shortlists),
        new_users: windowed_change(current.new_users, previous.new_users),
        total_requests: snapshot(current.total_requests),
        pending_requests: snapshot(current.pending_requests),
    }
}

/// Per-category request activity, busiest first. Every category appears,
/// including ones with no activity; ties keep category id order.
pub fn compute_category_breakdown(
    conn: &Connection,
    window: &Window,
) -> std::result::Result<Vec<CategoryBreakdown>, rusqlite::Error> {
    let start = window.start_key();
    let end = window.end_key();
    let mut new_stmt = conn.prepare(
        "SELECT COUNT(*) FROM requests
         WHERE category_id = ?1 AND created_at >= ?2 AND created_at < ?3",
    )?;
    let mut completed_stmt = conn.prepare(
        "SELECT COUNT(*) FROM requests
         WHERE category_id = ?1 AND updated_at >= ?2 AND updated_at < ?3 AND status = ?4",
    )?;

    let mut breakdown = Vec::new();
    for category in repository::list_categories(conn)? {
        let id = category.category_id;
        let new_requests: i64 = new_stmt.query_row(params![id, start, end], |row| row.get(0))?;
        let completed_requests: i64 = completed_stmt.query_row(
            params![id, start, end, RequestStatus::Completed.as_str()],
            |row| row.get(0),
        )?;
        breakdown.push(CategoryBreakdown {
            category_id: id,
            is_active: category.is_active(),
            category_title: category.title,
            new_requests: new_requests as u64,
            completed_requests: completed_requests as u64,
        });
    }
    // sort_by is stable, so equal counts stay in id order.
    breakdown.sort_by(|a, b| b.new_requests.cmp(&a.new_requests));
    Ok(breakdown)
}

/// Shortlist counts for each of a requester's requests.
pub async fn shortlist_counts(db: &Database, requester_id: i64) -> Result<Vec<ShortlistCount>> {
    let counts = db
        .reader()
        .call(move |conn| repository::shortlist_counts_for_requester(conn, requester_id))
        .await?;
    Ok(counts)
}

// ── Internal helpers ───────────────────────────────────────────────

fn count_windowed(
    conn: &Connection,
    table: &str,
    column: &str,
    status: Option<&str>,
    start: &str,
    end: &str,
) -> std::result::Result<u64, rusqlite::Error> {
    let count: i64 = match status {
        Some(status) => conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {table} \
                 WHERE {column} >= ?1 AND {column} < ?2 AND status = ?3"
            ),
            params![start, end, status],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE {column} >= ?1 AND {column} < ?2"),
            params![start, end],
            |row| row.get(0),
        )?,
    };
    Ok(count as u64)
}

fn windowed_change(current: u64, previous: u64) -> FieldChange {
    let change = current as i64 - previous as i64;
    let pct = if previous > 0 {
        change as f64 / previous as f64 * 100.0
    } else if change > 0 {
        // Growth from zero is reported as 100%.
        100.0
    } else {
        0.0
    };
    let trend = match change {
        c if c > 0 => Trend::Increase,
        c if c < 0 => Trend::Decrease,
        _ => Trend::Stable,
    };
    FieldChange {
        value: current,
        change: Some(change),
        change_percent: Some(round1(pct)),
        trend: Some(trend),
    }
}

fn snapshot(value: u64) -> FieldChange {
    FieldChange {
        value,
        change: None,
        change_percent: None,
        trend: None,
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixtures::Fixture;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> Window {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Window::from_dates(date, date)
    }

    fn stats(new_requests: u64, new_matches: u64) -> PeriodStats {
        PeriodStats {
            new_requests,
            new_matches,
            ..Default::default()
        }
    }

    #[test]
    fn test_increase_from_two_to_five() {
        let changes = compute_changes(&stats(5, 0), &stats(2, 0));
        let c = changes.new_requests;
        assert_eq!(c.value, 5);
        assert_eq!(c.change, Some(3));
        assert_eq!(c.change_percent, Some(150.0));
        assert_eq!(c.trend, Some(Trend::Increase));
    }

    #[test]
    fn test_growth_from_zero_is_one_hundred_percent() {
        let changes = compute_changes(&stats(0, 7), &stats(0, 0));
        assert_eq!(changes.new_matches.change_percent, Some(100.0));
        assert_eq!(changes.new_matches.trend, Some(Trend::Increase));
        // Zero to zero is stable at 0%.
        assert_eq!(changes.new_requests.change_percent, Some(0.0));
        assert_eq!(changes.new_requests.trend, Some(Trend::Stable));
    }

    #[test]
    fn test_equal_blocks_are_stable() {
        let s = PeriodStats {
            new_requests: 4,
            completed_requests: 1,
            new_matches: 3,
            completed_matches: 2,
            new_shortlists: 9,
            new_users: 5,
            total_requests: 40,
            pending_requests: 12,
        };
        let changes = compute_changes(&s, &s);
        for c in [
            changes.new_requests,
            changes.completed_requests,
            changes.new_matches,
            changes.completed_matches,
            changes.new_shortlists,
            changes.new_users,
        ] {
            assert_eq!(c.change, Some(0));
            assert_eq!(c.change_percent, Some(0.0));
            assert_eq!(c.trend, Some(Trend::Stable));
        }
    }

    #[test]
    fn test_decrease_and_rounding() {
        let changes = compute_changes(&stats(2, 0), &stats(3, 0));
        assert_eq!(changes.new_requests.change, Some(-1));
        assert_eq!(changes.new_requests.change_percent, Some(-33.3));
        assert_eq!(changes.new_requests.trend, Some(Trend::Decrease));
    }

    #[test]
    fn test_snapshot_fields_have_no_delta() {
        let mut current = stats(1, 1);
        current.total_requests = 30;
        current.pending_requests = 8;
        let mut previous = stats(1, 1);
        previous.total_requests = 10;
        let changes = compute_changes(&current, &previous);
        assert_eq!(
            changes.total_requests,
            FieldChange { value: 30, change: None, change_percent: None, trend: None }
        );
        assert_eq!(changes.pending_requests.value, 8);
        assert!(changes.pending_requests.trend.is_none());
    }

    #[test]
    fn test_trend_serializes_lowercase() {
        let json = serde_json::to_string(&Trend::Increase).unwrap();
        assert_eq!(json, "\"increase\"");
    }

    #[tokio::test]
    async fn test_compute_period_stats_counts_window_only() {
        let db = Database::open_memory().await.unwrap();

        let (today, yesterday) = db
            .writer()
            .call(|conn| {
                let f = Fixture::seed_people(conn)?;
                // Two requests today, one yesterday, one exactly at next midnight.
                let r1 = f.request(conn, None, "a", "2025-06-15 00:00:00")?;
                f.request(conn, None, "b", "2025-06-15 23:59:59")?;
                f.request(conn, None, "c", "2025-06-14 12:00:00")?;
                f.request(conn, None, "d", "2025-06-16 00:00:00")?;
                // Completed today, and an older completed request retouched today.
                f.request_with(
                    conn,
                    None,
                    RequestStatus::Completed,
                    "2025-06-01 09:00:00",
                    "2025-06-15 10:00:00",
                )?;
                f.request_with(
                    conn,
                    None,
                    RequestStatus::InProgress,
                    "2025-06-01 09:00:00",
                    "2025-06-15 11:00:00",
                )?;

                f.completed_match(
                    conn,
                    r1,
                    None,
                    "2025-06-15 08:00:00",
                    Some("2025-06-15 18:00:00"),
                )?;
                f.completed_match(
                    conn,
                    r1,
                    None,
                    "2025-06-10 08:00:00",
                    Some("2025-06-14 18:00:00"),
                )?;
                f.open_match(conn, r1, None, "2025-06-15 09:00:00")?;

                repository::insert_shortlist(conn, r1, f.volunteer, "2025-06-15 07:00:00")?;
                repository::insert_user(conn, "new_pin", "PIN", "2025-06-15 06:00:00")?;

                let today = compute_period_stats(conn, &day(2025, 6, 15))?;
                let yesterday = compute_period_stats(conn, &day(2025, 6, 14))?;
                Ok::<_, rusqlite::Error>((today, yesterday))
            })
            .await
            .unwrap();

        assert_eq!(today.new_requests, 2);
        assert_eq!(today.completed_requests, 1);
        assert_eq!(today.new_matches, 2);
        assert_eq!(today.completed_matches, 1);
        assert_eq!(today.new_shortlists, 1);
        assert_eq!(today.new_users, 1);
        // Snapshots ignore the window.
        assert_eq!(today.total_requests, 6);
        assert_eq!(today.pending_requests, 4);

        assert_eq!(yesterday.new_requests, 1);
        assert_eq!(yesterday.completed_matches, 1);
        assert_eq!(yesterday.new_matches, 0);
        assert_eq!(yesterday.total_requests, 6);
    }

    #[tokio::test]
    async fn test_category_breakdown_lists_idle_categories() {
        let db = Database::open_memory().await.unwrap();

        let breakdown = db
            .writer()
            .call(|conn| {
                repository::insert_category(
                    conn,
                    "Transport",
                    "Active",
                    None,
                    "2025-01-01 00:00:00",
                )?;
                repository::insert_category(
                    conn,
                    "Meals",
                    "Suspended",
                    None,
                    "2025-01-01 00:00:00",
                )?;
                repository::insert_category(
                    conn,
                    "Tutoring",
                    "Active",
                    None,
                    "2025-01-01 00:00:00",
                )?;
                compute_category_breakdown(conn, &day(2025, 6, 15))
            })
            .await
            .unwrap();

        assert_eq!(breakdown.len(), 3);
        for row in &breakdown {
            assert_eq!(row.new_requests, 0);
            assert_eq!(row.completed_requests, 0);
        }
        // All tied, so id order holds.
        let titles: Vec<&str> = breakdown.iter().map(|b| b.category_title.as_str()).collect();
        assert_eq!(titles, vec!["Transport", "Meals", "Tutoring"]);
        assert!(!breakdown[1].is_active);
        assert!(breakdown[0].is_active);
    }

    #[tokio::test]
    async fn test_category_breakdown_sorted_by_new_requests() {
        let db = Database::open_memory().await.unwrap();

        let breakdown = db
            .writer()
            .call(|conn| {
                let f = Fixture::seed_people(conn)?;
                let quiet = repository::insert_category(
                    conn,
                    "Quiet",
                    "Active",
                    None,
                    "2025-01-01 00:00:00",
                )?;
                let busy = repository::insert_category(
                    conn,
                    "Busy",
                    "Active",
                    None,
                    "2025-01-01 00:00:00",
                )?;
                let some = repository::insert_category(
                    conn,
                    "Some",
                    "Active",
                    None,
                    "2025-01-01 00:00:00",
                )?;
                for _ in 0..3 {
                    f.request(conn, Some(busy), "x", "2025-06-15 10:00:00")?;
                }
                f.request(conn, Some(some), "y", "2025-06-15 11:00:00")?;
                f.request_with(
                    conn,
                    Some(some),
                    RequestStatus::Completed,
                    "2025-06-01 10:00:00",
                    "2025-06-15 12:00:00",
                )?;
                // Outside the window.
                f.request(conn, Some(quiet), "z", "2025-06-16 10:00:00")?;
                compute_category_breakdown(conn, &day(2025, 6, 15))
            })
            .await
            .unwrap();

        assert_eq!(breakdown[0].category_title, "Busy");
        assert_eq!(breakdown[0].new_requests, 3);
        assert_eq!(breakdown[1].category_title, "Some");
        assert_eq!(breakdown[1].new_requests, 1);
        assert_eq!(breakdown[1].completed_requests, 1);
        assert_eq!(breakdown[2].category_title, "Quiet");
        assert_eq!(breakdown[2].new_requests, 0);
    }

    #[tokio::test]
    async fn test_shortlist_counts() {
        let db = Database::open_memory().await.unwrap();

        let requester = db
            .writer()
            .call(|conn| {
                let f = Fixture::seed_people(conn)?;
                let r = f.request(conn, None, "Ride to clinic", "2025-06-01 09:00:00")?;
                repository::insert_shortlist(conn, r, f.volunteer, "2025-06-02 09:00:00")?;
                Ok::<_, rusqlite::Error>(f.requester)
            })
            .await
            .unwrap();

        let counts = shortlist_counts(&db, requester).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].title, "Ride to clinic");
        assert_eq!(counts[0].shortlist_count, 1);
    }
}
