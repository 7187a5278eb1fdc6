//! HTTP handlers: thin adapters between the JSON API and the service layer.

pub mod auth;
pub mod feed;
pub mod practice;
pub mod profile;
pub mod vocabulary;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_page() -> u32 {
    1
}

/// Envelope for paginated listings, with simple next/prev page numbers.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub next_page: Option<u32>,
    pub prev_page: Option<u32>,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: i64) -> Self {
        let has_next = i64::from(page) * i64::from(per_page) < total;
        Self {
            items,
            page,
            per_page,
            total,
            next_page: has_next.then(|| page + 1),
            prev_page: (page > 1).then(|| page - 1),
        }
    }
}
