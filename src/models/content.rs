use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The fixed set of site content collections the admin panel manages.
/// Collection names appear in URLs, so parsing is strict: anything outside
/// this list is rejected rather than creating a table-per-typo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    TeamMembers,
    Testimonials,
    Posts,
    NewsItems,
    CaseStudies,
    JobPostings,
    ContactMessages,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::TeamMembers,
        Collection::Testimonials,
        Collection::Posts,
        Collection::NewsItems,
        Collection::CaseStudies,
        Collection::JobPostings,
        Collection::ContactMessages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::TeamMembers => "team_members",
            Collection::Testimonials => "testimonials",
            Collection::Posts => "posts",
            Collection::NewsItems => "news_items",
            Collection::CaseStudies => "case_studies",
            Collection::JobPostings => "job_postings",
            Collection::ContactMessages => "contact_messages",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Collection::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

/// One document in a content collection. The payload is schemaless JSON;
/// the site's pages interpret it per collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub collection: Collection,
    pub data: serde_json::Value,
    pub published: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
