//! Search job submission
//!
//! Submitting is two remote calls: create the list, then create the job that
//! fills it. If the second call fails the list is kept and its id travels in
//! the error's step annotation, so the caller can delete it or reuse it.

use std::sync::Arc;

use risma_domain::{
    ClientError, JobKind, ListMeta, RequestStep, Result, SearchParameters, SubmittedJob,
};
use tracing::{info, instrument, warn};

use super::ports::SearchBackend;

/// Validates search parameters and creates the list/job pair
pub struct JobSubmitter {
    backend: Arc<dyn SearchBackend>,
}

impl JobSubmitter {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Submit a search of `kind`.
    ///
    /// Parameters and list metadata are validated before any network call.
    ///
    /// # Errors
    /// - `ClientError::Validation` if `params` does not belong to `kind` or
    ///   violates its schema, or the list name is blank. Nothing is sent.
    /// - `Remote`/`Network` tagged with `list-create` or `job-create`. A
    ///   `job-create` failure carries the id of the list that was created.
    #[instrument(skip(self, params, meta), fields(kind = %kind))]
    pub async fn submit(
        &self,
        kind: JobKind,
        params: SearchParameters,
        meta: ListMeta,
    ) -> Result<SubmittedJob> {
        if params.kind() != kind {
            return Err(ClientError::validation(
                "job_type",
                format!("parameters are for '{}', not '{kind}'", params.kind()),
            ));
        }
        let params = params.validated()?;
        let new_list = meta.validated()?.into_new_list(&params);

        let list = self
            .backend
            .create_list(&new_list)
            .await
            .map_err(|err| err.at_step(RequestStep::ListCreate))?;

        let job = match self.backend.create_search_job(list.id, &params).await {
            Ok(job) => job,
            Err(err) => {
                warn!(
                    list_id = %list.id,
                    error = %err,
                    "Search job creation failed; list kept without a job"
                );
                return Err(err.at_step(RequestStep::JobCreate { list_id: list.id }));
            }
        };

        info!(list_id = %list.id, job_id = %job.id, "Search job submitted");
        Ok(SubmittedJob { list_id: list.id, job_id: job.id })
    }
}
