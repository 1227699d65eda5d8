use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::date_util::{parse_date_input, DateInput};
use crate::error::{Error, Result};
use crate::models::MatchStatus;
pub use crate::models::Role;
use crate::pagination::{query_offset, sanitize_page, sanitize_page_size, PageMeta};
use crate::query::builder::HistoryQuery;
use crate::storage::repository::{self, MatchRow};
use crate::storage::Database;

/// Decides whether an actor may view completed history on one role side.
pub trait AuthorizationChecker: Send + Sync {
    fn can_view(&self, actor_id: i64, role: Role) -> bool;
}

/// Permits every actor. Used when no checker is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationChecker for AllowAll {
    fn can_view(&self, _actor_id: i64, _role: Role) -> bool {
        true
    }
}

/// Optional narrowing of a completed-history search.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Exact, case-sensitive. Blank means no filter.
    pub service_type: Option<String>,
    pub from_date: Option<DateInput>,
    pub to_date: Option<DateInput>,
}

impl HistoryFilter {
    pub fn service_type(mut self, st: impl Into<String>) -> Self {
        self.service_type = Some(st.into());
        self
    }

    pub fn from_date(mut self, d: impl Into<DateInput>) -> Self {
        self.from_date = Some(d.into());
        self
    }

    pub fn to_date(mut self, d: impl Into<DateInput>) -> Self {
        self.to_date = Some(d.into());
        self
    }
}

/// One page of completed matches.
///
/// `items` may be empty for a page past the end while `total_count` still
/// reports the full filtered total.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryPage {
    pub items: Vec<MatchRow>,
    pub total_count: u64,
    pub page_meta: PageMeta,
}

/// Completed-service history for requesters and volunteers.
#[derive(Clone)]
pub struct CompletedHistory {
    authorizer: Arc<dyn AuthorizationChecker>,
}

impl Default for CompletedHistory {
    fn default() -> Self {
        Self::new(Arc::new(AllowAll))
    }
}

impl CompletedHistory {
    pub fn new(authorizer: Arc<dyn AuthorizationChecker>) -> Self {
        Self { authorizer }
    }

    /// Search the actor's completed matches, newest completion first.
    pub async fn search(
        &self,
        db: &Database,
        actor_id: i64,
        role: Role,
        filter: &HistoryFilter,
        page: i64,
        page_size: i64,
    ) -> Result<HistoryPage> {
        self.authorize(actor_id, role)?;

        let page = sanitize_page(page);
        let page_size = sanitize_page_size(page_size);
        let (from, to) = validate_date_range(filter)?;

        let mut query = HistoryQuery::new(actor_id, role)
            .limit(page_size)
            .offset(query_offset(page, page_size));
        if let Some(st) = filter
            .service_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.service_type(st);
        }
        if let Some(from) = from {
            query = query.completed_from(from);
        }
        if let Some(to) = to {
            query = query.completed_to(to);
        }

        debug!("completed history: {role} {actor_id}, page {page} of size {page_size}, {query:?}");

        let (total_count, items) = db
            .reader()
            .call(move |conn| {
                let total = query.count(conn)?;
                let items = query.fetch(conn)?;
                Ok::<_, rusqlite::Error>((total, items))
            })
            .await?;

        let page_meta = PageMeta::compute(total_count, page, page_size);
        if page_meta.page != page {
            debug!(
                "requested page {page} is past the end, pager shows page {} of {}",
                page_meta.page, page_meta.total_pages
            );
        }

        Ok(HistoryPage {
            items,
            total_count,
            page_meta,
        })
    }

    /// Every completed match for the actor, unfiltered.
    pub async fn view_history(
        &self,
        db: &Database,
        actor_id: i64,
        role: Role,
        page: i64,
        page_size: i64,
    ) -> Result<HistoryPage> {
        self.search(db, actor_id, role, &HistoryFilter::default(), page, page_size)
            .await
    }

    /// One completed match the actor took part in on the `role` side.
    pub async fn view_details(
        &self,
        db: &Database,
        actor_id: i64,
        role: Role,
        match_id: i64,
    ) -> Result<MatchRow> {
        self.authorize(actor_id, role)?;

        let row = db
            .reader()
            .call(move |conn| repository::find_match(conn, match_id))
            .await?;

        let row = match row {
            Some(row) if row.status == MatchStatus::Completed.as_str() => row,
            _ => return Err(Error::NotFound(format!("completed match {match_id}"))),
        };

        let owner = match role {
            Role::Requester => row.requester_id,
            Role::Volunteer => row.volunteer_id,
        };
        if owner != actor_id {
            warn!("{role} {actor_id} denied access to match {match_id}");
            return Err(Error::Authorization(format!(
                "match {match_id} does not belong to {role} {actor_id}"
            )));
        }
        Ok(row)
    }

    /// Sorted distinct service types across the actor's completed matches.
    pub async fn service_types(
        &self,
        db: &Database,
        actor_id: i64,
        role: Role,
    ) -> Result<Vec<String>> {
        self.authorize(actor_id, role)?;
        let types = db
            .reader()
            .call(move |conn| repository::distinct_service_types(conn, actor_id, role))
            .await?;
        Ok(types)
    }

    fn authorize(&self, actor_id: i64, role: Role) -> Result<()> {
        if self.authorizer.can_view(actor_id, role) {
            Ok(())
        } else {
            warn!("{role} {actor_id} rejected by authorization check");
            Err(Error::Authorization(format!(
                "{role} {actor_id} may not view completed history"
            )))
        }
    }
}

fn validate_date_range(
    filter: &HistoryFilter,
) -> Result<(Option<chrono::NaiveDate>, Option<chrono::NaiveDate>)> {
    let from = parse_date_input(filter.from_date.as_ref())?;
    let to = parse_date_input(filter.to_date.as_ref())?;
    if let (Some(f), Some(t)) = (from, to) {
        if f > t {
            return Err(Error::Validation(format!("start after end ({f} > {t})")));
        }
    }
    Ok((from, to))
}
