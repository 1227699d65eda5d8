pub mod date_util;
pub mod error;
pub mod history;
pub mod metrics;
pub mod models;
pub mod pagination;
pub mod query;
pub mod report;
pub mod storage;

use std::sync::Arc;

pub use date_util::{DateInput, Window};
pub use error::{Error, Result};
pub use history::{AllowAll, AuthorizationChecker, CompletedHistory, HistoryFilter, HistoryPage};
pub use metrics::{CategoryBreakdown, FieldChange, PeriodStats, StatChanges, Trend};
pub use models::{MatchStatus, RequestStatus, Role};
pub use pagination::PageMeta;
pub use query::builder::HistoryQuery;
pub use query::period::ReportPeriod;
pub use report::{DailyReport, MonthlyReport, PeriodComparison, WeeklyReport};
pub use storage::repository::{MatchRow, ShortlistCount};
pub use storage::Database;

use pagination::{sanitize_page_size, DEFAULT_PAGE_SIZE};
use storage::repository;

/// `app_config` key holding the history page size.
pub const PAGE_SIZE_KEY: &str = "history_page_size";

/// Main entry point for completed-service history and period reports.
pub struct VolunteerDW {
    db: Database,
    history: CompletedHistory,
}

impl VolunteerDW {
    /// Every actor is permitted until an authorizer is installed.
    pub fn new(db: Database) -> Self {
        Self {
            db,
            history: CompletedHistory::default(),
        }
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn AuthorizationChecker>) -> Self {
        self.history = CompletedHistory::new(authorizer);
        self
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Completed history ───────────────────────────────────────────

    pub async fn search_completed(
        &self,
        actor_id: i64,
        role: Role,
        filter: &HistoryFilter,
        page: i64,
    ) -> Result<HistoryPage> {
        let page_size = self.page_size().await?;
        self.history
            .search(&self.db, actor_id, role, filter, page, page_size as i64)
            .await
    }

    pub async fn view_history(&self, actor_id: i64, role: Role, page: i64) -> Result<HistoryPage> {
        let page_size = self.page_size().await?;
        self.history
            .view_history(&self.db, actor_id, role, page, page_size as i64)
            .await
    }

    pub async fn view_details(&self, actor_id: i64, role: Role, match_id: i64) -> Result<MatchRow> {
        self.history
            .view_details(&self.db, actor_id, role, match_id)
            .await
    }

    pub async fn service_types(&self, actor_id: i64, role: Role) -> Result<Vec<String>> {
        self.history.service_types(&self.db, actor_id, role).await
    }

    // ── Reports ─────────────────────────────────────────────────────

    pub async fn daily_report(&self, anchor: Option<&DateInput>) -> Result<DailyReport> {
        report::generate_daily_report(&self.db, anchor).await
    }

    pub async fn weekly_report(&self, anchor: Option<&DateInput>) -> Result<WeeklyReport> {
        report::generate_weekly_report(&self.db, anchor).await
    }

    pub async fn monthly_report(&self, anchor: Option<&DateInput>) -> Result<MonthlyReport> {
        report::generate_monthly_report(&self.db, anchor).await
    }

    pub async fn shortlist_counts(&self, requester_id: i64) -> Result<Vec<ShortlistCount>> {
        metrics::shortlist_counts(&self.db, requester_id).await
    }

    // ── Config ─────────────────────────────────────────────────────

    /// Configured history page size. Malformed or non-positive values fall
    /// back to the default.
    pub async fn page_size(&self) -> Result<u32> {
        let raw = self.config_get(PAGE_SIZE_KEY).await?;
        let Some(raw) = raw else {
            return Ok(DEFAULT_PAGE_SIZE);
        };
        match raw.trim().parse::<i64>() {
            Ok(n) if n > 0 => Ok(sanitize_page_size(n)),
            _ => {
                log::warn!("ignoring {PAGE_SIZE_KEY} = '{raw}', using {DEFAULT_PAGE_SIZE}");
                Ok(DEFAULT_PAGE_SIZE)
            }
        }
    }

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        let value = self
            .db
            .reader()
            .call(move |conn| repository::get_config(conn, &key))
            .await?;
        Ok(value)
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.db
            .writer()
            .call(move |conn| repository::set_config(conn, &key, &value))
            .await?;
        Ok(())
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        let items = self
            .db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await?;
        Ok(items)
    }
}
