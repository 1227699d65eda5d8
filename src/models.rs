use serde::Serialize;

/// Lifecycle of a match between a request and a volunteer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl MatchStatus {
    /// Label as stored in `matches.status`.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Pending => "Pending",
            MatchStatus::InProgress => "In Progress",
            MatchStatus::Completed => "Completed",
            MatchStatus::Cancelled => "Cancelled",
        }
    }
}

/// Request status labels shared with the portal's request pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RequestStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::InProgress => "In Progress",
            RequestStatus::Completed => "Completed",
            RequestStatus::Cancelled => "Cancelled",
        }
    }
}

/// Which side of a match the actor is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    /// Person-in-need who raised the request.
    Requester,
    /// CSR volunteer who served it.
    Volunteer,
}

impl Role {
    /// Column in `matches` that holds this role's account id.
    pub(crate) fn owner_column(&self) -> &'static str {
        match self {
            Role::Requester => "m.pin_id",
            Role::Volunteer => "m.csr_rep_id",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pin" | "requester" => Some(Role::Requester),
            "csr" | "volunteer" => Some(Role::Volunteer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Requester => write!(f, "requester"),
            Role::Volunteer => write!(f, "volunteer"),
        }
    }
}
