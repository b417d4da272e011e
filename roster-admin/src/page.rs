//! Record list page
//!
//! Holds the in-memory list for one collection. Every successful mutation is
//! followed by a full re-fetch that replaces the list; the page never patches
//! records locally.

use roster_common::config::ImportSettings;
use roster_common::models::DeleteAllResponse;
use roster_common::validation::Validate;
use roster_common::{Resource, ResourceKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::api::RecordApi;
use crate::error::AdminResult;
use crate::import::ImportDialog;
use crate::search::{filter_records, SearchDebouncer};

pub struct RecordPage<R: Resource> {
    api: Arc<dyn RecordApi<R>>,
    records: Vec<R>,
    search: SearchDebouncer,
    refresh_tx: mpsc::UnboundedSender<ResourceKind>,
    refresh_rx: mpsc::UnboundedReceiver<ResourceKind>,
}

impl<R: Resource> RecordPage<R>
where
    R::Draft: Validate,
{
    pub fn new(api: Arc<dyn RecordApi<R>>, debounce_delay: Duration) -> Self {
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        Self {
            api,
            records: Vec::new(),
            search: SearchDebouncer::new(debounce_delay),
            refresh_tx,
            refresh_rx,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn search(&self) -> &SearchDebouncer {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchDebouncer {
        &mut self.search
    }

    /// Records matching the debounced search term
    pub fn filtered(&self) -> Vec<&R> {
        filter_records(&self.records, &self.search.debounced())
    }

    /// Replace the list with the server's collection
    pub async fn load(&mut self) -> AdminResult<&[R]> {
        self.records = self.api.list().await?;
        debug!(kind = %R::KIND, count = self.records.len(), "Records loaded");
        Ok(&self.records)
    }

    pub async fn create(&mut self, draft: &R::Draft) -> AdminResult<Option<R>> {
        draft.validate()?;
        let created = self.api.create(draft).await?;
        info!(kind = %R::KIND, id = created.as_ref().map(|r| r.id()), "Record created");
        self.load().await?;
        Ok(created)
    }

    pub async fn update(&mut self, id: &str, draft: &R::Draft) -> AdminResult<Option<R>> {
        draft.validate()?;
        let updated = self.api.update(id, draft).await?;
        info!(kind = %R::KIND, id, "Record updated");
        self.load().await?;
        Ok(updated)
    }

    pub async fn delete(&mut self, id: &str) -> AdminResult<()> {
        self.api.delete(id).await?;
        info!(kind = %R::KIND, id, "Record deleted");
        self.load().await?;
        Ok(())
    }

    pub async fn delete_all(&mut self) -> AdminResult<DeleteAllResponse> {
        let response = self.api.delete_all().await?;
        self.load().await?;
        Ok(response)
    }

    /// A new import dialog whose refresh requests reach this page
    pub fn import_dialog(&self, settings: ImportSettings) -> ImportDialog<R> {
        ImportDialog::new(self.api.clone(), settings, self.refresh_tx.clone())
    }

    /// Reload once if any dialog asked for a refresh; returns whether it did
    pub async fn apply_refreshes(&mut self) -> AdminResult<bool> {
        let mut requested = false;
        while self.refresh_rx.try_recv().is_ok() {
            requested = true;
        }
        if requested {
            self.load().await?;
        }
        Ok(requested)
    }
}
