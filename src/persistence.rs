//! Snapshot persistence for the stores.
//!
//! Each slot has one [`SlotWriter`] thread. Mutations hand it a serialized
//! snapshot and return immediately. The thread drains its queue and writes
//! only the newest snapshot, so one write is in flight per slot and the
//! durable content always converges on the last in-memory state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{channel, sync_channel, Receiver, Sender, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::Keyed;
use crate::storage::SlotStorage;

/// Store lifecycle. There is no transition back to `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreState {
    Uninitialized,
    Ready,
}

/// Counters for one slot writer.
///
/// Once the writer is idle, `queued == written + failed + superseded`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceStats {
    pub queued: u64,
    pub written: u64,
    pub failed: u64,
    pub superseded: u64,
}

#[derive(Default)]
struct Counters {
    queued: AtomicU64,
    written: AtomicU64,
    failed: AtomicU64,
    superseded: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PersistenceStats {
        PersistenceStats {
            queued: self.queued.load(Ordering::Acquire),
            written: self.written.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
            superseded: self.superseded.load(Ordering::Acquire),
        }
    }
}

enum WriteRequest {
    Snapshot(Vec<u8>),
    Flush(SyncSender<()>),
}

pub struct SlotWriter {
    slot: String,
    storage: Arc<dyn SlotStorage>,
    counters: Arc<Counters>,
    sender: Option<Sender<WriteRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl SlotWriter {
    /// Starts the writer thread for `slot`. If the thread cannot be spawned,
    /// snapshots are written inline on the caller's thread instead.
    pub fn spawn(slot: &str, storage: Arc<dyn SlotStorage>) -> Self {
        let counters = Arc::new(Counters::default());
        let (sender, receiver) = channel();

        let thread_storage = Arc::clone(&storage);
        let thread_counters = Arc::clone(&counters);
        let thread_slot = slot.to_string();
        let spawned = std::thread::Builder::new()
            .name(format!("slot-writer-{slot}"))
            .spawn(move || writer_loop(thread_slot, thread_storage, thread_counters, receiver));

        let (sender, handle) = match spawned {
            Ok(handle) => (Some(sender), Some(handle)),
            Err(e) => {
                warn!("Could not spawn writer for slot '{slot}', writing inline: {e}");
                (None, None)
            }
        };

        Self {
            slot: slot.to_string(),
            storage,
            counters,
            sender,
            handle,
        }
    }

    pub fn enqueue(&self, bytes: Vec<u8>) {
        self.counters.queued.fetch_add(1, Ordering::AcqRel);
        let bytes = match &self.sender {
            Some(sender) => match sender.send(WriteRequest::Snapshot(bytes)) {
                Ok(()) => return,
                Err(std::sync::mpsc::SendError(request)) => match request {
                    WriteRequest::Snapshot(bytes) => bytes,
                    WriteRequest::Flush(_) => return,
                },
            },
            None => bytes,
        };
        write_snapshot(&self.slot, self.storage.as_ref(), &self.counters, &bytes);
    }

    /// Blocks until every snapshot enqueued before this call has been
    /// written or has failed.
    pub fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (ack, done) = sync_channel(1);
        if sender.send(WriteRequest::Flush(ack)).is_ok() {
            let _ = done.recv();
        }
    }

    pub fn stats(&self) -> PersistenceStats {
        self.counters.snapshot()
    }
}

impl Drop for SlotWriter {
    fn drop(&mut self) {
        // Closing the channel lets the thread finish its queue and exit.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Writer thread for slot '{}' panicked", self.slot);
            }
        }
    }
}

fn writer_loop(
    slot: String,
    storage: Arc<dyn SlotStorage>,
    counters: Arc<Counters>,
    receiver: Receiver<WriteRequest>,
) {
    debug!("Writer for slot '{slot}' started");
    while let Ok(first) = receiver.recv() {
        let mut latest: Option<Vec<u8>> = None;
        let mut waiters = Vec::new();

        let mut take = |request: WriteRequest| match request {
            WriteRequest::Snapshot(bytes) => {
                if latest.replace(bytes).is_some() {
                    counters.superseded.fetch_add(1, Ordering::AcqRel);
                }
            }
            WriteRequest::Flush(ack) => waiters.push(ack),
        };
        take(first);
        while let Ok(next) = receiver.try_recv() {
            take(next);
        }

        if let Some(bytes) = latest {
            write_snapshot(&slot, storage.as_ref(), &counters, &bytes);
        }
        for ack in waiters {
            let _ = ack.send(());
        }
    }
    debug!("Writer for slot '{slot}' stopped");
}

fn write_snapshot(slot: &str, storage: &dyn SlotStorage, counters: &Counters, bytes: &[u8]) {
    match storage.write_slot(slot, bytes) {
        Ok(()) => {
            counters.written.fetch_add(1, Ordering::AcqRel);
        }
        Err(e) => {
            counters.failed.fetch_add(1, Ordering::AcqRel);
            error!("Persisting slot '{slot}' failed, keeping in-memory state: {e}");
        }
    }
}

/// A keyed collection owned by a store and mirrored into one slot.
pub struct PersistedList<T> {
    slot: String,
    items: Vec<T>,
    state: StoreState,
    storage: Arc<dyn SlotStorage>,
    writer: SlotWriter,
    normalize: fn(Vec<T>) -> Vec<T>,
}

impl<T> PersistedList<T>
where
    T: Keyed + Serialize + DeserializeOwned,
{
    /// Loads the collection from `slot`. `normalize` repairs hydrated data
    /// that parsed but breaks the collection's invariants.
    pub fn open(storage: Arc<dyn SlotStorage>, slot: &str, normalize: fn(Vec<T>) -> Vec<T>) -> Self {
        let writer = SlotWriter::spawn(slot, Arc::clone(&storage));
        let mut list = Self {
            slot: slot.to_string(),
            items: Vec::new(),
            state: StoreState::Uninitialized,
            storage,
            writer,
            normalize,
        };
        list.hydrate();
        list
    }

    /// Read or parse failures leave the collection empty; either way the
    /// list ends up `Ready`.
    fn hydrate(&mut self) {
        match self.storage.read_slot(&self.slot) {
            Ok(None) => info!("Slot '{}' is empty, starting with no items", self.slot),
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<T>>(&bytes) {
                Ok(items) => {
                    self.items = (self.normalize)(items);
                    info!("Hydrated {} items from slot '{}'", self.items.len(), self.slot);
                }
                Err(e) => warn!("{}, starting with no items", StoreError::read(&self.slot, e)),
            },
            Err(e) => warn!("{e}, starting with no items"),
        }

        self.state = StoreState::Ready;
    }

    pub fn state(&self) -> StoreState {
        self.state
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut Vec<T> {
        &mut self.items
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Serializes the whole collection and hands it to the slot writer.
    pub fn persist(&mut self) {
        match serde_json::to_vec(&self.items) {
            Ok(bytes) => self.writer.enqueue(bytes),
            Err(e) => error!("{}", StoreError::write(&self.slot, e)),
        }
    }

    pub fn flush(&self) {
        self.writer.flush();
    }

    pub fn stats(&self) -> PersistenceStats {
        self.writer.stats()
    }
}
