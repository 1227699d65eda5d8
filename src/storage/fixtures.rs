//! Seed helpers shared by the store-backed tests.

use rusqlite::Connection;

use crate::models::{MatchStatus, RequestStatus};
use crate::storage::repository::{self, NewMatch, NewRequest};

/// Accounts created well before any window the tests look at.
const SEED_ACCOUNT_AT: &str = "2024-12-01 08:00:00";

pub(crate) struct Fixture {
    pub requester: i64,
    pub other_requester: i64,
    pub volunteer: i64,
    pub other_volunteer: i64,
}

impl Fixture {
    pub fn seed_people(conn: &Connection) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            requester: repository::insert_user(conn, "pin_r42", "PIN", SEED_ACCOUNT_AT)?,
            other_requester: repository::insert_user(conn, "pin_r43", "PIN", SEED_ACCOUNT_AT)?,
            volunteer: repository::insert_user(conn, "csr_v7", "CSR Rep", SEED_ACCOUNT_AT)?,
            other_volunteer: repository::insert_user(conn, "csr_v8", "CSR Rep", SEED_ACCOUNT_AT)?,
        })
    }

    /// A pending request owned by `self.requester`, never updated.
    pub fn request(
        &self,
        conn: &Connection,
        category_id: Option<i64>,
        title: &str,
        created_at: &str,
    ) -> Result<i64, rusqlite::Error> {
        repository::insert_request(
            conn,
            &NewRequest {
                requester_id: self.requester,
                category_id,
                title,
                status: RequestStatus::Pending,
                created_at,
                updated_at: created_at,
            },
        )
    }

    pub fn request_with(
        &self,
        conn: &Connection,
        category_id: Option<i64>,
        status: RequestStatus,
        created_at: &str,
        updated_at: &str,
    ) -> Result<i64, rusqlite::Error> {
        repository::insert_request(
            conn,
            &NewRequest {
                requester_id: self.requester,
                category_id,
                title: "Request",
                status,
                created_at,
                updated_at,
            },
        )
    }

    /// A completed match between `self.requester` and `self.volunteer`.
    pub fn completed_match(
        &self,
        conn: &Connection,
        request_id: i64,
        service_type: Option<&str>,
        created_at: &str,
        completed_at: Option<&str>,
    ) -> Result<i64, rusqlite::Error> {
        repository::insert_match(
            conn,
            &NewMatch {
                request_id,
                requester_id: self.requester,
                volunteer_id: self.volunteer,
                status: MatchStatus::Completed,
                service_type,
                notes: None,
                created_at,
                completed_at,
                updated_at: completed_at.unwrap_or(created_at),
            },
        )
    }

    pub fn open_match(
        &self,
        conn: &Connection,
        request_id: i64,
        service_type: Option<&str>,
        created_at: &str,
    ) -> Result<i64, rusqlite::Error> {
        repository::insert_match(
            conn,
            &NewMatch {
                request_id,
                requester_id: self.requester,
                volunteer_id: self.volunteer,
                status: MatchStatus::InProgress,
                service_type,
                notes: None,
                created_at,
                completed_at: None,
                updated_at: created_at,
            },
        )
    }
}
