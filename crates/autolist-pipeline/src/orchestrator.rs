//! Pipeline orchestration for one source.

use autolist_db::{DbError, InsertOutcome, Store};
use autolist_scraper::{
    classify, extract_embedded_payload, normalize_listing, split_envelope, AutotraderClient,
    RawFragment, RecordShape, SearchQuery,
};
use serde_json::Value;

use crate::error::{PipelineError, Stage};
use crate::types::{BatchResult, FailureKind, FragmentRef, PipelineConfig, ScrapeParams};

/// Owns the collaborators a run needs. Nothing is global: the store handle
/// and client are passed in and live as long as the orchestrator.
pub struct Orchestrator {
    config: PipelineConfig,
    store: Store,
    client: AutotraderClient,
}

impl Orchestrator {
    #[must_use]
    pub fn new(config: PipelineConfig, store: Store, client: AutotraderClient) -> Self {
        Self {
            config,
            store,
            client,
        }
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Fetch one page of listings from the channel in `params` and run it
    /// through the pipeline.
    ///
    /// A structured response is split into one fragment per listing and its
    /// declared total (if any) is recorded; an HTML response becomes a single
    /// fragment whose embedded payload supplies both.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Upstream`] on a timeout, connection failure or non-2xx
    ///   status from the upstream.
    /// - [`PipelineError::StorageUnavailable`] if the store fails mid-run.
    pub async fn scrape(&self, params: &ScrapeParams) -> Result<BatchResult, PipelineError> {
        let source_id = self.config.source_id(&params.postal_code);
        let query = SearchQuery {
            postal_code: params.postal_code.clone(),
            page: params.page,
            page_size: self.config.page_size,
        };

        tracing::info!(
            source_id = %source_id,
            channel = %params.channel,
            page = params.page,
            "fetching listings"
        );
        let response = self
            .client
            .fetch(params.channel, &query, params.page_path.as_deref())
            .await
            .map_err(|source| PipelineError::Upstream {
                source_id: source_id.clone(),
                source,
            })?;

        match classify(response) {
            RawFragment::Structured(value) => {
                let envelope = split_envelope(value);
                self.run(&source_id, envelope.fragments, envelope.total_count)
                    .await
            }
            html @ RawFragment::Html(_) => self.run(&source_id, vec![html], None).await,
        }
    }

    /// Process `fragments` independently and persist every listing not
    /// already stored.
    ///
    /// Extraction, normalization and missing-identity problems are recorded
    /// in the returned [`BatchResult`] and the run continues. When
    /// `declared_total` is `None` the first embedded payload that reports a
    /// total is used instead; if any total is known it is recorded for
    /// `source_id` once all fragments are processed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StorageUnavailable`] if an insert or the
    /// count update fails for any reason other than the listing already
    /// existing.
    pub async fn run(
        &self,
        source_id: &str,
        fragments: Vec<RawFragment>,
        declared_total: Option<i64>,
    ) -> Result<BatchResult, PipelineError> {
        let mut batch = BatchResult::default();
        let mut total = declared_total;
        let fragment_count = fragments.len();

        for (index, fragment) in fragments.into_iter().enumerate() {
            match fragment {
                RawFragment::Structured(record) => {
                    self.process_record(source_id, FragmentRef::whole(index), &record, &mut batch)
                        .await?;
                }
                RawFragment::Html(html) => match extract_embedded_payload(&html) {
                    Ok(payload) => {
                        total = total.or(payload.total_count);
                        for (position, record) in payload.listings.iter().enumerate() {
                            self.process_record(
                                source_id,
                                FragmentRef::record(index, position),
                                record,
                                &mut batch,
                            )
                            .await?;
                        }
                    }
                    Err(e) => {
                        let fragment_ref = FragmentRef::whole(index);
                        tracing::warn!(
                            source_id,
                            fragment = %fragment_ref,
                            error = %e,
                            "embedded payload extraction failed"
                        );
                        batch.push_failure(fragment_ref, FailureKind::from(&e), e.to_string());
                    }
                },
            }
        }

        if let Some(total) = total {
            autolist_db::record_source_count(self.store.pool(), source_id, total)
                .await
                .map_err(|source| PipelineError::StorageUnavailable {
                    source_id: source_id.to_string(),
                    stage: Stage::RecordCount,
                    source,
                })?;
        }

        tracing::info!(
            source_id,
            fragments = fragment_count,
            inserted = batch.inserted,
            duplicate = batch.duplicate,
            failed = batch.failed,
            declared_total = ?total,
            "batch complete"
        );
        Ok(batch)
    }

    /// Trivial liveness probe: succeeds when the store answers a query.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::StorageUnavailable`] if the store is down.
    pub async fn health(&self) -> Result<(), PipelineError> {
        autolist_db::health_check(self.store.pool())
            .await
            .map_err(|source| PipelineError::StorageUnavailable {
                source_id: self.config.source_prefix.clone(),
                stage: Stage::Health,
                source,
            })
    }

    async fn process_record(
        &self,
        source_id: &str,
        fragment_ref: FragmentRef,
        record: &Value,
        batch: &mut BatchResult,
    ) -> Result<(), PipelineError> {
        let shape = RecordShape::detect(record);
        let listing = match normalize_listing(record, shape, &self.config.site_origin) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!(
                    source_id,
                    fragment = %fragment_ref,
                    error = %e,
                    "record could not be normalized"
                );
                batch.push_failure(fragment_ref, FailureKind::Normalization, e.to_string());
                return Ok(());
            }
        };

        if !listing.has_identity() {
            tracing::warn!(
                source_id,
                fragment = %fragment_ref,
                title = listing.title.as_deref().unwrap_or(""),
                "listing has no identity url; dropped"
            );
            batch.push_failure(
                fragment_ref,
                FailureKind::MissingIdentity,
                DbError::MissingIdentity.to_string(),
            );
            return Ok(());
        }

        match autolist_db::insert_listing_if_absent(self.store.pool(), source_id, &listing).await
        {
            Ok(InsertOutcome::Inserted) => batch.inserted += 1,
            Ok(InsertOutcome::AlreadyExists) => batch.duplicate += 1,
            Err(DbError::MissingIdentity) => {
                batch.push_failure(
                    fragment_ref,
                    FailureKind::MissingIdentity,
                    DbError::MissingIdentity.to_string(),
                );
            }
            Err(source) => {
                tracing::error!(
                    source_id,
                    fragment = %fragment_ref,
                    error = %source,
                    "listing insert failed; aborting batch"
                );
                return Err(PipelineError::StorageUnavailable {
                    source_id: source_id.to_string(),
                    stage: Stage::Persist,
                    source,
                });
            }
        }
        Ok(())
    }
}
