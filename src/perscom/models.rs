//! Response bodies returned by the PERSCOM API.

use serde::Deserialize;

/// A page of a paginated listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Pagination info of a listing.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
}

/// Non-paginated responses wrap their payload in `data`.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct Envelope<T> {
    pub data: T,
}

/// A form submission, e.g. an application to join.
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub id: u64,
    #[serde(default)]
    pub form_id: Option<u64>,
    /// The user who submitted the form.
    #[serde(default)]
    pub user_id: Option<u64>,
}

/// A status a submission has been given.
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub name: String,
}
