//! API commands for list, search job and profile operations
//!
//! Thin typed wrappers over [`RequestGateway`]. `ApiCommands` is also the
//! production [`SearchBackend`] used by job submission and tracking.

use std::sync::Arc;

use async_trait::async_trait;
use risma_core::SearchBackend;
use risma_domain::{
    ClientError, CompanyList, JobId, ListId, ListUpdate, NewList, ProfileUpdate, Result,
    SearchJob, SearchJobRecord, SearchParameters, UserProfile,
};
use tracing::{debug, instrument};

use super::gateway::{GatewayRequest, RequestGateway};

/// API commands for domain operations
pub struct ApiCommands {
    gateway: Arc<RequestGateway>,
}

impl ApiCommands {
    /// Create a new commands instance
    ///
    /// # Arguments
    ///
    /// * `gateway` - Authenticated request gateway
    pub fn new(gateway: Arc<RequestGateway>) -> Self {
        Self { gateway }
    }

    // === List Operations ===

    /// List the caller's company lists
    ///
    /// # Arguments
    ///
    /// * `limit` - Max number of lists to return; the service default when
    ///   `None`
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self))]
    pub async fn list_lists(&self, limit: Option<u32>) -> Result<Vec<CompanyList>> {
        let mut request = GatewayRequest::get("/api/lists");
        if let Some(limit) = limit {
            request = request.query("limit", limit);
        }
        let lists: Vec<CompanyList> = self.gateway.execute_json(&request).await?;

        debug!(count = lists.len(), "Lists fetched");
        Ok(lists)
    }

    /// Get a list by ID
    ///
    /// # Errors
    ///
    /// Returns error if the list does not exist or the API request fails
    #[instrument(skip(self), fields(list_id = %id))]
    pub async fn get_list(&self, id: ListId) -> Result<CompanyList> {
        self.gateway.get_json(&format!("/api/lists/{id}")).await
    }

    /// Create a list
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self, list), fields(name = %list.name))]
    pub async fn create_list(&self, list: &NewList) -> Result<CompanyList> {
        let created: CompanyList = self.gateway.post_json("/api/lists", list).await?;

        debug!(list_id = %created.id, "List created");
        Ok(created)
    }

    /// Rename a list or change its description
    ///
    /// # Errors
    ///
    /// Returns error if the list does not exist or the API request fails
    #[instrument(skip(self, update), fields(list_id = %id))]
    pub async fn update_list(&self, id: ListId, update: &ListUpdate) -> Result<CompanyList> {
        self.gateway.put_json(&format!("/api/lists/{id}"), update).await
    }

    /// Delete a list
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self), fields(list_id = %id))]
    pub async fn delete_list(&self, id: ListId) -> Result<()> {
        self.gateway.delete(&format!("/api/lists/{id}")).await?;

        debug!(list_id = %id, "List deleted");
        Ok(())
    }

    /// Download a list's records as CSV
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self), fields(list_id = %id))]
    pub async fn export_list(&self, id: ListId) -> Result<Vec<u8>> {
        let csv = self.gateway.get_bytes(&format!("/api/lists/{id}/export")).await?;

        debug!(list_id = %id, bytes = csv.len(), "List exported");
        Ok(csv)
    }

    // === Search Job Operations ===

    /// Create a search job bound to `list_id`
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self, params), fields(list_id = %list_id, kind = %params.kind()))]
    pub async fn create_search_job(
        &self,
        list_id: ListId,
        params: &SearchParameters,
    ) -> Result<SearchJobRecord> {
        let request = GatewayRequest::post(format!("/api/search/{}", params.kind().endpoint()))
            .query("list_id", list_id)
            .json(&params.to_request_body())?;
        let record: SearchJobRecord = self.gateway.execute_json(&request).await?;

        debug!(job_id = %record.id, "Search job created");
        Ok(record)
    }

    /// Recent search jobs, newest first as returned by the service
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails or a job carries a status
    /// outside the known set
    #[instrument(skip(self))]
    pub async fn list_jobs(&self, limit: Option<u32>) -> Result<Vec<SearchJob>> {
        let mut request = GatewayRequest::get("/api/search/jobs");
        if let Some(limit) = limit {
            request = request.query("limit", limit);
        }
        let records: Vec<SearchJobRecord> = self.gateway.execute_json(&request).await?;

        debug!(count = records.len(), "Search jobs fetched");
        records.into_iter().map(SearchJob::try_from).collect()
    }

    /// Raw snapshot of one job
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self), fields(job_id = %id))]
    pub async fn get_job(&self, id: JobId) -> Result<SearchJobRecord> {
        self.gateway.get_json(&format!("/api/search/jobs/{id}")).await
    }

    /// Ask the service to stop a job
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self), fields(job_id = %id))]
    pub async fn cancel_job(&self, id: JobId) -> Result<()> {
        self.gateway.execute(&GatewayRequest::post(format!("/api/search/jobs/{id}/cancel"))).await?;

        debug!(job_id = %id, "Search job cancel requested");
        Ok(())
    }

    // === Profile Operations ===

    /// Profile of the authenticated user
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> Result<UserProfile> {
        self.gateway.get_json("/api/users/me").await
    }

    /// Change the authenticated user's email, name or password
    ///
    /// # Errors
    ///
    /// `Validation` if `update` changes nothing (nothing is sent); otherwise
    /// returns error if the API request fails
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        if update.is_empty() {
            return Err(ClientError::validation("profile", "no fields to update"));
        }
        let user: UserProfile = self.gateway.put_json("/api/users/me", update).await?;

        debug!(user_id = user.id, "Profile updated");
        Ok(user)
    }
}

#[async_trait]
impl SearchBackend for ApiCommands {
    async fn create_list(&self, list: &NewList) -> Result<CompanyList> {
        ApiCommands::create_list(self, list).await
    }

    async fn create_search_job(
        &self,
        list_id: ListId,
        params: &SearchParameters,
    ) -> Result<SearchJobRecord> {
        ApiCommands::create_search_job(self, list_id, params).await
    }

    async fn fetch_search_job(&self, job_id: JobId) -> Result<SearchJobRecord> {
        self.get_job(job_id).await
    }

    async fn cancel_search_job(&self, job_id: JobId) -> Result<()> {
        self.cancel_job(job_id).await
    }
}
