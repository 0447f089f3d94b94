//! In-memory `SearchBackend` used by the unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use risma_domain::{
    ClientError, CompanyList, JobId, ListId, NewList, Result, SearchJobRecord, SearchParameters,
};

use super::ports::SearchBackend;

/// Records every call. Job fetches replay a scripted list of statuses and
/// then keep answering with `pending`.
#[derive(Default)]
pub(crate) struct FakeBackend {
    calls: Mutex<Vec<&'static str>>,
    lists: Mutex<Vec<NewList>>,
    list_error: Mutex<Option<ClientError>>,
    job_error: Mutex<Option<ClientError>>,
    script: Mutex<VecDeque<Result<String>>>,
    fetch_delay: Mutex<Option<Duration>>,
    fetches: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_statuses(statuses: &[&str]) -> Self {
        let backend = Self::new();
        backend.script.lock().extend(statuses.iter().map(|s| Ok((*s).to_string())));
        backend
    }

    pub(crate) fn push_fetch_error(&self, err: ClientError) {
        self.script.lock().push_back(Err(err));
    }

    pub(crate) fn fail_create_list(&self, err: ClientError) {
        *self.list_error.lock() = Some(err);
    }

    pub(crate) fn fail_create_job(&self, err: ClientError) {
        *self.job_error.lock() = Some(err);
    }

    pub(crate) fn delay_fetches(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub(crate) fn created_lists(&self) -> Vec<NewList> {
        self.lists.lock().clone()
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
    }
}

pub(crate) fn job_record(id: JobId, status: &str) -> SearchJobRecord {
    let terminal = matches!(status, "completed" | "failed");
    SearchJobRecord {
        id,
        job_type: "keyword".to_string(),
        status: status.to_string(),
        list_id: ListId(1),
        params: None,
        result_count: Some(if status == "completed" { 5 } else { 0 }),
        error_message: (status == "failed").then(|| "crawler blocked".to_string()),
        created_at: Utc::now(),
        completed_at: terminal.then(Utc::now),
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    async fn create_list(&self, list: &NewList) -> Result<CompanyList> {
        self.record("create_list");
        if let Some(err) = self.list_error.lock().clone() {
            return Err(err);
        }

        let mut lists = self.lists.lock();
        lists.push(list.clone());
        let now = Utc::now();
        Ok(CompanyList {
            id: ListId(lists.len() as i64),
            name: list.name.clone(),
            description: list.description.clone(),
            total_records: 0,
            status: None,
            search_params: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn create_search_job(
        &self,
        list_id: ListId,
        _params: &SearchParameters,
    ) -> Result<SearchJobRecord> {
        self.record("create_search_job");
        if let Some(err) = self.job_error.lock().clone() {
            return Err(err);
        }
        let mut record = job_record(JobId(100), "pending");
        record.list_id = list_id;
        Ok(record)
    }

    async fn fetch_search_job(&self, job_id: JobId) -> Result<SearchJobRecord> {
        self.record("fetch_search_job");
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(status)) => Ok(job_record(job_id, &status)),
            Some(Err(err)) => Err(err),
            None => Ok(job_record(job_id, "pending")),
        }
    }

    async fn cancel_search_job(&self, _job_id: JobId) -> Result<()> {
        self.record("cancel_search_job");
        Ok(())
    }
}
