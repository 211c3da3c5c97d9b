//! Worker lifecycle for pending actions
//!
//! One dedicated tokio task per pending action: submit persists the record
//! and spawns the worker; `resume_persisted` restarts the workers for
//! records that survived a crash. Nested follow-up actions run on the same
//! worker so a single operation stays strictly sequential.

use crate::action::{ActionEnvironment, ActionResult, PendingAction};
use crate::error::ActionError;
use crate::poller::ActionRequest;
use crate::record::{ActionId, ActionKind, PendingActionRecord};
use crate::status::ActionStatus;
use crate::variants::publish::PublishPayload;
use crate::variants::reserve::ReservePayload;
use cadastre_core::{CatalogueId, CoreError, OperationContext, PublishLevel, ReserveLevel};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct WorkerHandle {
    cancel: CancellationToken,
    join: JoinHandle<Result<ActionResult, ActionError>>,
}

/// Spawns and tracks the worker task of each pending action.
pub struct ActionRunner {
    env: Arc<ActionEnvironment>,
    workers: DashMap<ActionId, WorkerHandle>,
}

impl ActionRunner {
    #[must_use]
    pub fn new(env: Arc<ActionEnvironment>) -> Self {
        Self {
            env,
            workers: DashMap::new(),
        }
    }

    /// Request a reservation (or, with [`ReserveLevel::None`], a release).
    pub async fn submit_reserve(
        &self,
        ctx: &OperationContext,
        catalogue_id: CatalogueId,
        level: ReserveLevel,
    ) -> Result<ActionId, ActionError> {
        let payload = ReservePayload::new(level).encode()?;
        self.submit(ctx, catalogue_id, ActionKind::Reserve, payload, None)
            .await
    }

    /// Request a publish at the given level.
    pub async fn submit_publish(
        &self,
        ctx: &OperationContext,
        catalogue_id: CatalogueId,
        level: PublishLevel,
    ) -> Result<ActionId, ActionError> {
        let payload = PublishPayload::new(level).encode()?;
        self.submit(ctx, catalogue_id, ActionKind::Publish, payload, None)
            .await
    }

    /// Upload a data file to the authority.
    pub async fn submit_upload(
        &self,
        ctx: &OperationContext,
        catalogue_id: CatalogueId,
        body: Vec<u8>,
    ) -> Result<ActionId, ActionError> {
        self.submit(
            ctx,
            catalogue_id,
            ActionKind::UploadData,
            String::new(),
            Some(body),
        )
        .await
    }

    /// Ask the authority to prepare XML updates for download.
    pub async fn submit_download(
        &self,
        ctx: &OperationContext,
        catalogue_id: CatalogueId,
    ) -> Result<ActionId, ActionError> {
        self.submit(
            ctx,
            catalogue_id,
            ActionKind::DownloadXmlUpdates,
            String::new(),
            None,
        )
        .await
    }

    /// Submit a typed request to the authority and start its worker.
    pub async fn submit(
        &self,
        ctx: &OperationContext,
        catalogue_id: CatalogueId,
        kind: ActionKind,
        payload: String,
        body: Option<Vec<u8>>,
    ) -> Result<ActionId, ActionError> {
        // Local catalogues never participate in remote coordination.
        let catalogue = self.env.registry.get(catalogue_id).await?;
        if catalogue.local {
            return Err(CoreError::LocalCatalogue(catalogue_id).into());
        }

        let record = submit_record(
            &self.env,
            ctx.username.clone(),
            catalogue_id,
            kind,
            payload,
            body,
        )
        .await?;
        let id = record.id;
        self.spawn(record);
        Ok(id)
    }

    /// Restart workers for records that survived a restart.
    ///
    /// Each record's protocol starts over from `Started` but keeps its
    /// persisted priority, so a previously downgraded action resumes
    /// directly under the low-priority schedule.
    pub async fn resume_persisted(&self) -> Result<usize, ActionError> {
        let records = self.env.store.load_all().await?;
        let mut resumed = 0;
        for mut record in records {
            if self.workers.contains_key(&record.id) {
                continue;
            }
            record.status = ActionStatus::Started;
            record.outcome = None;
            self.env.store.update(&record).await?;
            self.spawn(record);
            resumed += 1;
        }
        if resumed > 0 {
            tracing::info!(resumed, "pending actions resumed from store");
        }
        Ok(resumed)
    }

    /// Cancel one action's worker at its next poll boundary.
    pub fn cancel(&self, id: ActionId) -> bool {
        match self.workers.get(&id) {
            Some(worker) => {
                worker.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every tracked worker.
    pub fn cancel_all(&self) {
        for worker in self.workers.iter() {
            worker.cancel.cancel();
        }
    }

    /// Number of workers that have not finished yet.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.workers
            .iter()
            .filter(|worker| !worker.join.is_finished())
            .count()
    }

    /// Wait for one action's worker and reap its handle.
    pub async fn join(&self, id: ActionId) -> Option<Result<ActionResult, ActionError>> {
        let (_, worker) = self.workers.remove(&id)?;
        match worker.join.await {
            Ok(result) => Some(result),
            Err(err) => Some(Err(ActionError::Worker(err.to_string()))),
        }
    }

    fn spawn(&self, record: PendingActionRecord) {
        let id = record.id;
        let cancel = CancellationToken::new();
        let env = Arc::clone(&self.env);
        let token = cancel.clone();
        let join = tokio::spawn(async move { drive(env, record, token).await });
        self.workers.insert(id, WorkerHandle { cancel, join });
    }
}

/// Prepare, submit and persist one action record.
async fn submit_record(
    env: &Arc<ActionEnvironment>,
    username: String,
    catalogue_id: CatalogueId,
    kind: ActionKind,
    payload: String,
    body: Option<Vec<u8>>,
) -> Result<PendingActionRecord, ActionError> {
    env.listener.request_prepared();
    let ticket = env
        .authority
        .submit(ActionRequest {
            kind,
            catalogue_id,
            username: username.clone(),
            payload: payload.clone(),
            body,
        })
        .await?;
    let record = PendingActionRecord::new(kind, catalogue_id, ticket.clone(), username, payload);
    env.store.insert(&record).await?;
    env.listener.request_sent(&record, &ticket);
    tracing::info!(action = %record.id, %ticket, kind = %kind, "remote request submitted");
    Ok(record)
}

/// Worker body: run the action, then any nested follow-up actions it
/// produced, all on this same task.
async fn drive(
    env: Arc<ActionEnvironment>,
    record: PendingActionRecord,
    cancel: CancellationToken,
) -> Result<ActionResult, ActionError> {
    let username = record.username.clone();
    let catalogue_id = record.catalogue_id;

    let mut action = PendingAction::new(record, Arc::clone(&env), cancel.clone());
    let mut result = action.send().await?;

    while let Some(follow_up) = result.follow_up.take() {
        let nested = submit_record(
            &env,
            username.clone(),
            catalogue_id,
            follow_up.kind,
            follow_up.payload,
            follow_up.body,
        )
        .await?;
        let mut nested_action = PendingAction::new(nested, Arc::clone(&env), cancel.clone());
        let nested_result = nested_action.send().await?;
        result.follow_up = nested_result.follow_up;
    }
    Ok(result)
}
