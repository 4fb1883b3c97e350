//! Permission-filtered workspace listings.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc::error::SendError;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::Resources;
use crate::types::{Resource, SubjectReference};
use crate::{Error, Result};

/// Receiving half of a listing result channel.
///
/// Yields items as checks complete and ends once every check has finished.
/// Usable directly through [`recv`](Self::recv) or as a [`Stream`].
#[derive(Debug)]
pub struct ResultStream<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> ResultStream<T> {
    fn new(rx: mpsc::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Waits for the next item. `None` means the stream is complete.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Drains every remaining item.
    pub async fn drain(mut self) -> Vec<T> {
        let mut items = Vec::new();
        while let Some(item) = self.rx.recv().await {
            items.push(item);
        }
        items
    }
}

impl<T> Stream for ResultStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

/// The two result streams of a workspace listing.
///
/// The streams are independent: positions in one say nothing about
/// positions in the other. Both close together after the last check.
#[derive(Debug)]
pub struct WorkspaceListing {
    /// Resources the subject may access.
    pub resources: ResultStream<Resource>,
    /// Authorization failures, one per resource whose check failed.
    pub errors: ResultStream<Error>,
}

impl WorkspaceListing {
    /// Drains both streams concurrently.
    pub async fn collect(self) -> (Vec<Resource>, Vec<Error>) {
        tokio::join!(self.resources.drain(), self.errors.drain())
    }
}

impl Resources {
    /// Lists the resources of a workspace that `subject` holds
    /// `permission` on.
    ///
    /// Every candidate is checked concurrently at read consistency. An
    /// allowed resource is sent on [`WorkspaceListing::resources`]; a failed
    /// check sends its error on [`WorkspaceListing::errors`]; a denial sends
    /// nothing. Both streams close once all checks are done.
    ///
    /// A store failure fetching the candidates is returned directly and no
    /// streams are created.
    pub async fn list_resources_in_workspace(
        &self,
        permission: &str,
        namespace: &str,
        subject: &SubjectReference,
        workspace_id: &str,
    ) -> Result<WorkspaceListing> {
        let authorizer = Arc::clone(self.require_authorizer()?);

        let candidates = self
            .repository
            .find_by_workspace_id(workspace_id)
            .await
            .map_err(Error::database)?;

        let total = candidates.len();
        let (resource_tx, resource_rx) = mpsc::channel(total.max(1));
        let (error_tx, error_rx) = mpsc::channel(total.max(1));
        let listing = WorkspaceListing {
            resources: ResultStream::new(resource_rx),
            errors: ResultStream::new(error_rx),
        };

        debug!(workspace_id, permission, candidates = total, "listing workspace");

        if candidates.is_empty() {
            return Ok(listing);
        }

        let limiter = self
            .config
            .max_concurrent_checks
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));
        let permission: Arc<str> = Arc::from(permission);
        let namespace: Arc<str> = Arc::from(namespace);
        let subject = Arc::new(subject.clone());

        let mut checks = JoinSet::new();
        for resource in candidates {
            let authorizer = Arc::clone(&authorizer);
            let limiter = limiter.clone();
            let permission = Arc::clone(&permission);
            let namespace = Arc::clone(&namespace);
            let subject = Arc::clone(&subject);

            checks.spawn(async move {
                let _permit = match limiter {
                    Some(limiter) => limiter.acquire_owned().await.ok(),
                    None => None,
                };
                let outcome = authorizer
                    .check(&namespace, &permission, &resource, &subject)
                    .await;
                (resource, outcome)
            });
        }

        let workspace_id = workspace_id.to_owned();
        tokio::spawn(async move {
            let (mut allowed, mut denied, mut failed) = (0usize, 0usize, 0usize);

            while let Some(joined) = checks.join_next().await {
                match joined {
                    Ok((resource, Ok(decision))) if decision.is_allowed() => {
                        allowed += 1;
                        if let Err(SendError(resource)) = resource_tx.send(resource).await {
                            debug!(
                                workspace_id = %workspace_id,
                                resource_id = %resource.id,
                                "resource stream dropped, discarding allowed resource"
                            );
                        }
                    }
                    Ok((resource, Ok(decision))) => {
                        denied += 1;
                        debug!(
                            resource_id = %resource.id,
                            decision = %decision.allowed_state(),
                            "resource filtered out"
                        );
                    }
                    Ok((resource, Err(e))) => {
                        failed += 1;
                        debug!(resource_id = %resource.id, error = %e, "check failed");
                        if let Err(SendError(e)) = error_tx.send(e).await {
                            debug!(
                                workspace_id = %workspace_id,
                                error = %e,
                                "error stream dropped, discarding check error"
                            );
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        warn!(error = %e, "check task did not complete");
                        let err = Error::internal(format!("check task did not complete: {e}"));
                        if let Err(SendError(e)) = error_tx.send(err).await {
                            debug!(
                                workspace_id = %workspace_id,
                                error = %e,
                                "error stream dropped, discarding check error"
                            );
                        }
                    }
                }
            }

            info!(
                workspace_id = %workspace_id,
                allowed,
                denied,
                failed,
                "workspace listing complete"
            );
            // Dropping the senders here closes both streams.
        });

        Ok(listing)
    }
}
