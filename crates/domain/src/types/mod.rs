//! Domain types and models
//!
//! Entities exchanged with the remote search service plus the client-side
//! credential pair.

pub mod credential;
pub mod list;
pub mod search_job;
pub mod search_params;
pub mod user;

pub use credential::Credential;
pub use list::{CompanyList, ListId, ListUpdate, NewList};
pub use search_job::{JobId, JobKind, JobStatus, SearchJob, SearchJobRecord, SubmittedJob};
pub use search_params::{
    IndustryLocationParameters, KeywordParameters, ListMeta, SearchParameters,
};
pub use user::{NewUser, ProfileUpdate, UserProfile};
