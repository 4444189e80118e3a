//! The cache actor and the handle used to reach it.
//!
//! One tokio task owns the [`CacheTable`] and drains a bounded mailbox,
//! applying commands one at a time in the order they were admitted. Callers
//! hold a [`CacheHandle`], which is cheap to clone and is passed explicitly
//! to whatever needs the cache.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, trace};

use stash_core::{CacheStore, Key, Lifetime, Result, StashError};

use crate::config::CacheConfig;
use crate::orchestration;
use crate::stats::CacheStats;
use crate::table::CacheTable;

enum Command<V> {
    Get {
        key: Key,
        lifetime: Lifetime,
        reply: oneshot::Sender<Option<V>>,
    },
    Put {
        key: Key,
        value: V,
    },
    Delete {
        key: Key,
        reply: oneshot::Sender<()>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    Stats {
        reply: oneshot::Sender<CacheStats>,
    },
}

/// Single owner of a cache table.
///
/// Built with [`CacheActor::new`] when the caller wants to supervise the
/// task itself; otherwise use [`CacheHandle::spawn`].
pub struct CacheActor<V> {
    name: Arc<str>,
    table: CacheTable<V>,
    mailbox: mpsc::Receiver<Command<V>>,
}

impl<V> CacheActor<V>
where
    V: Clone + Send + 'static,
{
    /// Creates an actor and its first handle. Nothing runs until
    /// [`run`](Self::run) is polled.
    pub fn new(config: CacheConfig) -> Result<(Self, CacheHandle<V>)> {
        config.validate()?;

        let name: Arc<str> = Arc::from(config.name);
        let (sender, mailbox) = mpsc::channel(config.mailbox_capacity);

        let actor = Self {
            name: name.clone(),
            table: CacheTable::with_capacity(config.initial_capacity),
            mailbox,
        };
        Ok((actor, CacheHandle { sender, name }))
    }

    /// Processes commands until every handle has been dropped.
    pub async fn run(mut self) {
        info!(cache = %self.name, "cache actor started");

        while let Some(command) = self.mailbox.recv().await {
            self.handle(command);
        }

        info!(cache = %self.name, entries = self.table.len(), "cache actor stopped");
    }

    fn handle(&mut self, command: Command<V>) {
        // A dropped reply receiver means the caller stopped waiting; the
        // operation is still applied.
        match command {
            Command::Get {
                key,
                lifetime,
                reply,
            } => {
                let lookup = self.table.lookup(&key, lifetime, Instant::now());
                trace!(cache = %self.name, key = %key, hit = lookup.is_hit(), "get");
                let _ = reply.send(lookup.into_option());
            }
            Command::Put { key, value } => {
                trace!(cache = %self.name, key = %key, "put");
                self.table.put(key, value, Instant::now());
            }
            Command::Delete { key, reply } => {
                let removed = self.table.delete(&key);
                trace!(cache = %self.name, key = %key, removed, "delete");
                let _ = reply.send(());
            }
            Command::Clear { reply } => {
                self.table.clear();
                let _ = reply.send(());
            }
            Command::Stats { reply } => {
                let _ = reply.send(self.table.stats());
            }
        }
    }
}

/// Clonable reference to a running cache actor.
pub struct CacheHandle<V> {
    sender: mpsc::Sender<Command<V>>,
    name: Arc<str>,
}

impl<V> Clone for CacheHandle<V> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            name: self.name.clone(),
        }
    }
}

impl<V> std::fmt::Debug for CacheHandle<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHandle")
            .field("name", &self.name)
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<V> CacheHandle<V>
where
    V: Clone + Send + 'static,
{
    /// Spawns an actor on the current tokio runtime and returns its handle.
    ///
    /// The actor stops once the last handle is dropped.
    pub fn spawn(config: CacheConfig) -> Result<Self> {
        Self::spawn_supervised(config).map(|(handle, _task)| handle)
    }

    /// Like [`spawn`](Self::spawn), also returning the actor's task.
    pub fn spawn_supervised(config: CacheConfig) -> Result<(Self, JoinHandle<()>)> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| StashError::Unavailable(format!("no tokio runtime: {e}")))?;
        let (actor, handle) = CacheActor::new(config)?;
        let task = runtime.spawn(actor.run());
        Ok((handle, task))
    }

    /// The name from the actor's configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Returns a snapshot of the actor's counters.
    pub async fn stats(&self) -> Result<CacheStats> {
        self.request(|reply| Command::Stats { reply }).await
    }

    /// Number of entries held, stale ones included.
    pub async fn len(&self) -> Result<usize> {
        Ok(self.stats().await?.entries)
    }

    /// Drops every entry.
    pub async fn clear(&self) -> Result<()> {
        self.request(|reply| Command::Clear { reply }).await
    }

    /// See [`orchestration::get_or_compute`].
    pub async fn get_or_compute<F>(&self, key: &Key, compute: F, lifetime: Lifetime) -> Result<V>
    where
        F: FnOnce() -> V + Send,
    {
        orchestration::get_or_compute(self, key, compute, lifetime).await
    }

    /// See [`orchestration::get_or_compute_async`].
    pub async fn get_or_compute_async<F, Fut>(
        &self,
        key: &Key,
        compute: F,
        lifetime: Lifetime,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = V> + Send,
    {
        orchestration::get_or_compute_async(self, key, compute, lifetime).await
    }

    /// See [`orchestration::try_get_or_compute`].
    pub async fn try_get_or_compute<F, Fut, E>(
        &self,
        key: &Key,
        compute: F,
        lifetime: Lifetime,
    ) -> std::result::Result<V, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<V, E>> + Send,
        E: From<StashError> + Send,
    {
        orchestration::try_get_or_compute(self, key, compute, lifetime).await
    }

    /// See [`orchestration::invalidate_after_write`].
    pub async fn invalidate_after_write<T, E>(
        &self,
        result: std::result::Result<T, E>,
        key: &Key,
    ) -> std::result::Result<T, E>
    where
        T: Send,
        E: Send,
    {
        orchestration::invalidate_after_write(self, result, key).await
    }

    async fn request<R>(&self, command: impl FnOnce(oneshot::Sender<R>) -> Command<V>) -> Result<R> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| self.unavailable())?;
        response.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> StashError {
        StashError::Unavailable(format!("cache actor '{}' has stopped", self.name))
    }
}

#[async_trait]
impl<V> CacheStore<V> for CacheHandle<V>
where
    V: Clone + Send + 'static,
{
    async fn get(&self, key: &Key, lifetime: Lifetime) -> Result<Option<V>> {
        let key = key.clone();
        self.request(|reply| Command::Get {
            key,
            lifetime,
            reply,
        })
        .await
    }

    async fn put(&self, key: Key, value: V) -> Result<()> {
        // Admission into the mailbox fixes the order; no acknowledgement.
        self.sender
            .send(Command::Put { key, value })
            .await
            .map_err(|_| self.unavailable())
    }

    async fn delete(&self, key: &Key) -> Result<()> {
        let key = key.clone();
        self.request(|reply| Command::Delete { key, reply }).await
    }
}
