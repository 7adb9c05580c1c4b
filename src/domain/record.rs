use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker stored in `lastupdated` for records that were never refreshed
pub const NOT_AVAILABLE: &str = "N/A";

/// Listing partition a server was published under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerCategory {
    Public,
    Private,
    Secret,
}

impl ServerCategory {
    pub const ALL: [Self; 3] = [Self::Public, Self::Private, Self::Secret];

    /// Label persisted in the `type` column
    pub const fn label(self) -> &'static str {
        match self {
            Self::Public => "Public",
            Self::Private => "Private",
            Self::Secret => "Secret",
        }
    }
}

impl fmt::Display for ServerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ServerCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| s.to_string())
    }
}

/// One row as extracted from a listing page, before it is tagged with the
/// category loop and page offset that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    pub ip_address: String,
    /// Cell text with internal whitespace collapsed
    pub name: String,
    pub admin: bool,
    /// True when the row is marked as the player's gateway
    pub owned: bool,
}

impl ListingEntry {
    pub fn observe(self, category: ServerCategory, source_page: u32) -> ObservedRecord {
        ObservedRecord {
            ip_address: self.ip_address,
            name: self.name,
            category,
            source_page,
            admin: self.admin,
            owned: self.owned,
        }
    }
}

/// Sync-owned view of a record: everything the listing can tell us
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedRecord {
    pub ip_address: String,
    pub name: String,
    pub category: ServerCategory,
    pub source_page: u32,
    pub admin: bool,
    pub owned: bool,
}

/// Caller-owned operational attributes. The sync path never writes these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationalFields {
    pub minimum_protect: String,
    pub running: String,
    pub files: String,
    pub cpu: String,
    pub memory: String,
    pub bandwidth: String,
    pub last_log: String,
    pub last_updated: String,
}

impl Default for OperationalFields {
    fn default() -> Self {
        Self {
            minimum_protect: String::new(),
            running: String::new(),
            files: String::new(),
            cpu: String::new(),
            memory: String::new(),
            bandwidth: String::new(),
            last_log: String::new(),
            last_updated: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Full persisted row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub ip_address: String,
    pub name: String,
    pub category: ServerCategory,
    pub source_page: u32,
    pub admin: bool,
    pub owned: bool,
    pub operational: OperationalFields,
}

impl Record {
    pub fn is_never_updated(&self) -> bool {
        self.operational.last_updated == NOT_AVAILABLE
    }
}

/// Per-category outcome of a sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub pages_fetched: u32,
    pub records_seen: u32,
    pub inserted: u32,
    pub updated: u32,
    pub skipped: u32,
}

/// Summary returned by a full sync
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub identifier_filter: Option<String>,
    pub categories: Vec<(ServerCategory, CategoryReport)>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn category(&self, category: ServerCategory) -> Option<&CategoryReport> {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, report)| report)
    }

    pub fn total_inserted(&self) -> u32 {
        self.categories.iter().map(|(_, r)| r.inserted).sum()
    }

    pub fn total_updated(&self) -> u32 {
        self.categories.iter().map(|(_, r)| r.updated).sum()
    }

    pub fn total_pages_fetched(&self) -> u32 {
        self.categories.iter().map(|(_, r)| r.pages_fetched).sum()
    }
}
