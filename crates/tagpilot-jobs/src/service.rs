//! Single-writer tag service.
//!
//! One [`TagService`] task owns the repository and handles requests strictly
//! one at a time from a bounded queue. Every context talks to it through a
//! cloneable [`TagServiceHandle`], which implements the same
//! [`TagRepository`] contract. With a single logical writer a creation can
//! no longer be lost to an interleaved read-modify-write.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

use tagpilot_core::defaults::EVENT_BUS_CAPACITY;
use tagpilot_core::{
    AliasOutcome, BatchResolution, DeleteOutcome, DuplicateGroup, EngineConfig, Error,
    MergeOutcome, RenameOutcome, Resolution, ResolveOptions, Result, Suggestion, Tag, TagId,
    TagRepository, TagUsage, VocabularyStats,
};
use tagpilot_db::{JsonFileStore, KvTagRepository};

type Reply<T> = oneshot::Sender<Result<T>>;

/// Event emitted by the tag service.
#[derive(Debug, Clone)]
pub enum ServiceEvent {
    /// Service started.
    ServiceStarted,
    /// A request finished successfully.
    RequestCompleted { op: &'static str, duration_ms: u64 },
    /// A request returned an error.
    RequestFailed { op: &'static str, error: String },
    /// Service stopped.
    ServiceStopped,
}

enum Request {
    Resolve {
        label: String,
        options: ResolveOptions,
        reply: Reply<Resolution>,
    },
    ResolveBatch {
        labels: Vec<String>,
        options: ResolveOptions,
        reply: Reply<BatchResolution>,
    },
    FindSimilar {
        label: String,
        max_results: usize,
        reply: Reply<Vec<Tag>>,
    },
    Suggest {
        query: String,
        max_results: usize,
        reply: Reply<Suggestion>,
    },
    Merge {
        source: TagId,
        target: TagId,
        reply: Reply<MergeOutcome>,
    },
    Rename {
        tag_id: TagId,
        new_name: String,
        reply: Reply<RenameOutcome>,
    },
    Delete {
        tag_id: TagId,
        reply: Reply<DeleteOutcome>,
    },
    AddAlias {
        tag_id: TagId,
        alias: String,
        reply: Reply<AliasOutcome>,
    },
    SetBookmarkTags {
        bookmark_id: String,
        labels: Vec<String>,
        reply: Reply<Vec<TagId>>,
    },
    AddTagsToBookmark {
        bookmark_id: String,
        labels: Vec<String>,
        reply: Reply<Vec<TagId>>,
    },
    BookmarkTags {
        bookmark_id: String,
        reply: Reply<Vec<Tag>>,
    },
    RemoveBookmark {
        bookmark_id: String,
        reply: Reply<bool>,
    },
    TagUsage {
        reply: Reply<Vec<TagUsage>>,
    },
    Stats {
        top_n: usize,
        reply: Reply<VocabularyStats>,
    },
    FindDuplicates {
        reply: Reply<Vec<DuplicateGroup>>,
    },
    RepairDuplicates {
        reply: Reply<Vec<MergeOutcome>>,
    },
    PruneDangling {
        reply: Reply<usize>,
    },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}

impl Request {
    fn op(&self) -> &'static str {
        match self {
            Request::Resolve { .. } => "resolve",
            Request::ResolveBatch { .. } => "resolve_batch",
            Request::FindSimilar { .. } => "find_similar",
            Request::Suggest { .. } => "suggest",
            Request::Merge { .. } => "merge",
            Request::Rename { .. } => "rename",
            Request::Delete { .. } => "delete",
            Request::AddAlias { .. } => "add_alias",
            Request::SetBookmarkTags { .. } => "set_bookmark_tags",
            Request::AddTagsToBookmark { .. } => "add_tags_to_bookmark",
            Request::BookmarkTags { .. } => "bookmark_tags",
            Request::RemoveBookmark { .. } => "remove_bookmark",
            Request::TagUsage { .. } => "tag_usage",
            Request::Stats { .. } => "stats",
            Request::FindDuplicates { .. } => "find_duplicates",
            Request::RepairDuplicates { .. } => "repair_duplicates",
            Request::PruneDangling { .. } => "prune_dangling",
            Request::Shutdown { .. } => "shutdown",
        }
    }
}

/// Owner of the repository; consumed by [`TagService::start`].
pub struct TagService {
    repo: Arc<dyn TagRepository>,
    config: EngineConfig,
    event_tx: broadcast::Sender<ServiceEvent>,
}

impl TagService {
    pub fn new(repo: impl TagRepository + 'static, config: EngineConfig) -> Self {
        Self::from_arc(Arc::new(repo), config)
    }

    /// Service over the JSON file store named by `config.store_path`.
    pub fn open(config: EngineConfig) -> Self {
        let store = JsonFileStore::new(config.store_path.clone());
        let repo = KvTagRepository::with_config(store, &config);
        Self::new(repo, config)
    }

    pub fn from_arc(repo: Arc<dyn TagRepository>, config: EngineConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            repo,
            config,
            event_tx,
        }
    }

    /// Spawn the service loop and return a handle to it.
    pub fn start(self) -> TagServiceHandle {
        let (request_tx, request_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let event_rx = self.event_tx.subscribe();

        tokio::spawn(async move {
            self.run(request_rx).await;
        });

        TagServiceHandle {
            request_tx,
            event_rx: Arc::new(event_rx),
        }
    }

    #[instrument(skip_all, fields(subsystem = "jobs", component = "tag_service"))]
    async fn run(self, mut request_rx: mpsc::Receiver<Request>) {
        info!(
            queue_capacity = self.config.queue_capacity,
            max_similar = self.config.max_similar,
            "Tag service started"
        );
        let _ = self.event_tx.send(ServiceEvent::ServiceStarted);

        while let Some(request) = request_rx.recv().await {
            if let Request::Shutdown { ack } = request {
                info!("Tag service received shutdown signal");
                let _ = ack.send(());
                break;
            }
            self.dispatch(request).await;
        }

        let _ = self.event_tx.send(ServiceEvent::ServiceStopped);
        info!("Tag service stopped");
    }

    async fn dispatch(&self, request: Request) {
        let op = request.op();
        let start = Instant::now();
        let repo = &self.repo;

        match request {
            Request::Resolve {
                label,
                options,
                reply,
            } => self.finish(op, start, reply, repo.resolve(&label, options).await),
            Request::ResolveBatch {
                labels,
                options,
                reply,
            } => self.finish(op, start, reply, repo.resolve_batch(&labels, options).await),
            Request::FindSimilar {
                label,
                max_results,
                reply,
            } => self.finish(op, start, reply, repo.find_similar(&label, max_results).await),
            Request::Suggest {
                query,
                max_results,
                reply,
            } => self.finish(op, start, reply, repo.suggest(&query, max_results).await),
            Request::Merge {
                source,
                target,
                reply,
            } => self.finish(op, start, reply, repo.merge(&source, &target).await),
            Request::Rename {
                tag_id,
                new_name,
                reply,
            } => self.finish(op, start, reply, repo.rename(&tag_id, &new_name).await),
            Request::Delete { tag_id, reply } => {
                self.finish(op, start, reply, repo.delete(&tag_id).await)
            }
            Request::AddAlias {
                tag_id,
                alias,
                reply,
            } => self.finish(op, start, reply, repo.add_alias(&tag_id, &alias).await),
            Request::SetBookmarkTags {
                bookmark_id,
                labels,
                reply,
            } => self.finish(
                op,
                start,
                reply,
                repo.set_bookmark_tags(&bookmark_id, &labels).await,
            ),
            Request::AddTagsToBookmark {
                bookmark_id,
                labels,
                reply,
            } => self.finish(
                op,
                start,
                reply,
                repo.add_tags_to_bookmark(&bookmark_id, &labels).await,
            ),
            Request::BookmarkTags { bookmark_id, reply } => {
                self.finish(op, start, reply, repo.bookmark_tags(&bookmark_id).await)
            }
            Request::RemoveBookmark { bookmark_id, reply } => {
                self.finish(op, start, reply, repo.remove_bookmark(&bookmark_id).await)
            }
            Request::TagUsage { reply } => self.finish(op, start, reply, repo.tag_usage().await),
            Request::Stats { top_n, reply } => {
                self.finish(op, start, reply, repo.stats(top_n).await)
            }
            Request::FindDuplicates { reply } => {
                self.finish(op, start, reply, repo.find_duplicates().await)
            }
            Request::RepairDuplicates { reply } => {
                self.finish(op, start, reply, repo.repair_duplicates().await)
            }
            Request::PruneDangling { reply } => {
                self.finish(op, start, reply, repo.prune_dangling().await)
            }
            Request::Shutdown { ack } => {
                let _ = ack.send(());
            }
        }
    }

    fn finish<T>(&self, op: &'static str, start: Instant, reply: Reply<T>, result: Result<T>) {
        let duration_ms = start.elapsed().as_millis() as u64;
        let event = match &result {
            Ok(_) => {
                debug!(op, duration_ms, "Request completed");
                ServiceEvent::RequestCompleted { op, duration_ms }
            }
            Err(e) => {
                warn!(op, duration_ms, error = %e, "Request failed");
                ServiceEvent::RequestFailed {
                    op,
                    error: e.to_string(),
                }
            }
        };
        let _ = self.event_tx.send(event);

        if reply.send(result).is_err() {
            debug!(op, "Caller went away before the reply");
        }
    }
}

/// Cloneable client of a running [`TagService`].
#[derive(Clone)]
pub struct TagServiceHandle {
    request_tx: mpsc::Sender<Request>,
    event_rx: Arc<broadcast::Receiver<ServiceEvent>>,
}

impl TagServiceHandle {
    /// Stop the service after the requests already queued.
    pub async fn shutdown(&self) -> Result<()> {
        let (ack, done) = oneshot::channel();
        self.request_tx
            .send(Request::Shutdown { ack })
            .await
            .map_err(|_| Error::Internal("Failed to send shutdown signal".into()))?;
        done.await
            .map_err(|_| Error::Internal("Tag service stopped before acknowledging shutdown".into()))
    }

    /// Get a receiver for service events.
    pub fn events(&self) -> broadcast::Receiver<ServiceEvent> {
        self.event_rx.resubscribe()
    }

    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.request_tx
            .send(make(reply))
            .await
            .map_err(|_| Error::Internal("tag service is not running".into()))?;
        response
            .await
            .map_err(|_| Error::Internal("tag service dropped the request".into()))?
    }
}

#[async_trait]
impl TagRepository for TagServiceHandle {
    async fn resolve(&self, label: &str, options: ResolveOptions) -> Result<Resolution> {
        self.call(|reply| Request::Resolve {
            label: label.to_string(),
            options,
            reply,
        })
        .await
    }

    async fn resolve_batch(
        &self,
        labels: &[String],
        options: ResolveOptions,
    ) -> Result<BatchResolution> {
        self.call(|reply| Request::ResolveBatch {
            labels: labels.to_vec(),
            options,
            reply,
        })
        .await
    }

    async fn find_similar(&self, label: &str, max_results: usize) -> Result<Vec<Tag>> {
        self.call(|reply| Request::FindSimilar {
            label: label.to_string(),
            max_results,
            reply,
        })
        .await
    }

    async fn suggest(&self, query: &str, max_results: usize) -> Result<Suggestion> {
        self.call(|reply| Request::Suggest {
            query: query.to_string(),
            max_results,
            reply,
        })
        .await
    }

    async fn merge(&self, source: &TagId, target: &TagId) -> Result<MergeOutcome> {
        self.call(|reply| Request::Merge {
            source: source.clone(),
            target: target.clone(),
            reply,
        })
        .await
    }

    async fn rename(&self, tag_id: &TagId, new_name: &str) -> Result<RenameOutcome> {
        self.call(|reply| Request::Rename {
            tag_id: tag_id.clone(),
            new_name: new_name.to_string(),
            reply,
        })
        .await
    }

    async fn delete(&self, tag_id: &TagId) -> Result<DeleteOutcome> {
        self.call(|reply| Request::Delete {
            tag_id: tag_id.clone(),
            reply,
        })
        .await
    }

    async fn add_alias(&self, tag_id: &TagId, alias: &str) -> Result<AliasOutcome> {
        self.call(|reply| Request::AddAlias {
            tag_id: tag_id.clone(),
            alias: alias.to_string(),
            reply,
        })
        .await
    }

    async fn set_bookmark_tags(&self, bookmark_id: &str, labels: &[String]) -> Result<Vec<TagId>> {
        self.call(|reply| Request::SetBookmarkTags {
            bookmark_id: bookmark_id.to_string(),
            labels: labels.to_vec(),
            reply,
        })
        .await
    }

    async fn add_tags_to_bookmark(
        &self,
        bookmark_id: &str,
        labels: &[String],
    ) -> Result<Vec<TagId>> {
        self.call(|reply| Request::AddTagsToBookmark {
            bookmark_id: bookmark_id.to_string(),
            labels: labels.to_vec(),
            reply,
        })
        .await
    }

    async fn bookmark_tags(&self, bookmark_id: &str) -> Result<Vec<Tag>> {
        self.call(|reply| Request::BookmarkTags {
            bookmark_id: bookmark_id.to_string(),
            reply,
        })
        .await
    }

    async fn remove_bookmark(&self, bookmark_id: &str) -> Result<bool> {
        self.call(|reply| Request::RemoveBookmark {
            bookmark_id: bookmark_id.to_string(),
            reply,
        })
        .await
    }

    async fn tag_usage(&self) -> Result<Vec<TagUsage>> {
        self.call(|reply| Request::TagUsage { reply }).await
    }

    async fn stats(&self, top_n: usize) -> Result<VocabularyStats> {
        self.call(|reply| Request::Stats { top_n, reply }).await
    }

    async fn find_duplicates(&self) -> Result<Vec<DuplicateGroup>> {
        self.call(|reply| Request::FindDuplicates { reply }).await
    }

    async fn repair_duplicates(&self) -> Result<Vec<MergeOutcome>> {
        self.call(|reply| Request::RepairDuplicates { reply }).await
    }

    async fn prune_dangling(&self) -> Result<usize> {
        self.call(|reply| Request::PruneDangling { reply }).await
    }
}
