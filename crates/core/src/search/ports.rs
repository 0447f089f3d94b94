//! Port interfaces for the remote search service
//!
//! These traits define the boundary between job orchestration and the HTTP
//! gateway that actually talks to the service.

use async_trait::async_trait;
use risma_domain::{
    CompanyList, JobId, ListId, NewList, Result, SearchJobRecord, SearchParameters,
};

/// Remote operations needed to submit and track search jobs
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Create the list that will own a job's results
    async fn create_list(&self, list: &NewList) -> Result<CompanyList>;

    /// Create a search job bound to `list_id`
    async fn create_search_job(
        &self,
        list_id: ListId,
        params: &SearchParameters,
    ) -> Result<SearchJobRecord>;

    /// Fetch the current job snapshot, unclassified
    async fn fetch_search_job(&self, job_id: JobId) -> Result<SearchJobRecord>;

    /// Ask the service to stop a job
    async fn cancel_search_job(&self, job_id: JobId) -> Result<()>;
}
