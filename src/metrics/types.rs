use serde::Serialize;

/// Raw operational counters for one window.
///
/// `total_requests` and `pending_requests` are snapshots taken when the
/// stats are computed; every other field counts rows inside the window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub new_requests: u64,
    /// Requests currently Completed whose last update falls in the window.
    pub completed_requests: u64,
    pub new_matches: u64,
    pub completed_matches: u64,
    pub new_shortlists: u64,
    pub new_users: u64,
    pub total_requests: u64,
    pub pending_requests: u64,
}

/// Direction of a windowed counter against the previous window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increase,
    Decrease,
    Stable,
}

/// One counter's value and its movement. Snapshot counters carry only
/// `value`; the delta fields are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldChange {
    pub value: u64,
    pub change: Option<i64>,
    /// Rounded to one decimal place.
    pub change_percent: Option<f64>,
    pub trend: Option<Trend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatChanges {
    pub new_requests: FieldChange,
    pub completed_requests: FieldChange,
    pub new_matches: FieldChange,
    pub completed_matches: FieldChange,
    pub new_shortlists: FieldChange,
    pub new_users: FieldChange,
    pub total_requests: FieldChange,
    pub pending_requests: FieldChange,
}

/// Request activity for one category within a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub category_id: i64,
    pub category_title: String,
    pub new_requests: u64,
    pub completed_requests: u64,
    pub is_active: bool,
}
