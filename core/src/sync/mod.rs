//! Keeps the durable store consistent with the in-memory address book
//!
//! One-time load at startup, then level-triggered write-back: every change
//! to the book persists the full current collection, never a delta. Write-
//! back is gated on the load having completed so an empty or half-loaded
//! collection can never clobber previously saved data.

use crate::address::{Address, RawAddress};
use crate::book::{AddressBook, BookEvent};
use crate::storage::DurableStore;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, warn};

/// The fixed key the address collection lives under in the durable store.
pub const ADDRESSES_KEY: &str = "addresses";

/// Lifecycle of the initial load. Each transition happens exactly once per
/// process run; write-back is permitted only in `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyncStatus {
	NotStarted = 0,
	Loading = 1,
	Ready = 2,
}

impl SyncStatus {
	fn from_u8(value: u8) -> Self {
		match value {
			0 => Self::NotStarted,
			1 => Self::Loading,
			_ => Self::Ready,
		}
	}
}

/// Counters exposed over a watch channel so callers can await write-back
/// completion instead of polling the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
	/// Book change events the observer has finished handling, gated or not
	pub events_observed: u64,
	/// Successful full-collection writes to the durable store
	pub collections_persisted: u64,
}

/// Orchestrates load and write-back between an [`AddressBook`] and a
/// [`DurableStore`].
///
/// Subscribes to the book's event channel at construction and reacts to
/// every mutation on a background task. No lock is taken around write-back;
/// overlapping writes are safe because each one sends the full current
/// collection and the store applies last-write-wins.
pub struct SyncManager {
	book: Arc<AddressBook>,
	store: Arc<dyn DurableStore>,
	status: AtomicU8,
	status_tx: watch::Sender<SyncStatus>,
	stats_tx: watch::Sender<SyncStats>,
}

impl SyncManager {
	pub fn new(book: Arc<AddressBook>, store: Arc<dyn DurableStore>) -> Arc<Self> {
		let (status_tx, _) = watch::channel(SyncStatus::NotStarted);
		let (stats_tx, _) = watch::channel(SyncStats::default());

		let events = book.subscribe();

		let manager = Arc::new(Self {
			book,
			store,
			status: AtomicU8::new(SyncStatus::NotStarted as u8),
			status_tx,
			stats_tx,
		});

		tokio::spawn(Self::run(Arc::downgrade(&manager), events));

		manager
	}

	pub fn status(&self) -> SyncStatus {
		SyncStatus::from_u8(self.status.load(Ordering::Acquire))
	}

	pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
		self.status_tx.subscribe()
	}

	pub fn subscribe_stats(&self) -> watch::Receiver<SyncStats> {
		self.stats_tx.subscribe()
	}

	/// Wait until the initial load has completed.
	pub async fn wait_ready(&self) {
		let mut status = self.status_tx.subscribe();
		while *status.borrow_and_update() != SyncStatus::Ready {
			if status.changed().await.is_err() {
				return;
			}
		}
	}

	fn set_status(&self, status: SyncStatus) {
		self.status.store(status as u8, Ordering::Release);
		// send_replace keeps the channel value fresh for late subscribers
		self.status_tx.send_replace(status);
	}

	/// Load the saved collection into the book. Callable exactly once per
	/// process run; later (or concurrent) calls are no-ops.
	///
	/// An absent or non-array stored value leaves the book untouched, and a
	/// read failure is logged, not propagated: the session keeps working
	/// in-memory either way. The status always ends up `Ready`.
	pub async fn load(&self) {
		if self
			.status
			.compare_exchange(
				SyncStatus::NotStarted as u8,
				SyncStatus::Loading as u8,
				Ordering::AcqRel,
				Ordering::Acquire,
			)
			.is_err()
		{
			debug!("initial load already started, ignoring");
			return;
		}
		self.status_tx.send_replace(SyncStatus::Loading);

		match self.store.get(ADDRESSES_KEY).await {
			Ok(Some(Value::Array(items))) => {
				let addresses = items
					.iter()
					.map(RawAddress::from_json)
					.map(Address::normalize)
					.collect::<Vec<_>>();

				debug!(count = addresses.len(), "loaded saved addresses");
				self.book.replace_all(addresses);
			}
			Ok(Some(_)) => {
				warn!("saved address collection is not an array, starting empty");
			}
			Ok(None) => {
				debug!("no saved addresses");
			}
			Err(e) => {
				error!("failed to read saved addresses, continuing in-memory only: {e}");
			}
		}

		self.set_status(SyncStatus::Ready);
	}

	async fn run(manager: Weak<Self>, mut events: broadcast::Receiver<BookEvent>) {
		loop {
			match events.recv().await {
				Ok(event) => {
					let Some(manager) = manager.upgrade() else {
						break;
					};
					manager.handle_change(event).await;
				}
				Err(broadcast::error::RecvError::Lagged(skipped)) => {
					// Write-back is level-triggered on current state, so a
					// lagged receiver only means some events coalesced.
					let Some(manager) = manager.upgrade() else {
						break;
					};
					warn!(skipped, "change events coalesced");
					manager.handle_change(BookEvent::Replaced {
						count: manager.book.len(),
					})
					.await;
				}
				Err(broadcast::error::RecvError::Closed) => break,
			}
		}
	}

	async fn handle_change(&self, event: BookEvent) {
		let persisted = if self.status() == SyncStatus::Ready {
			self.write_back().await
		} else {
			debug!(
				?event,
				"change before initial load completed, persistence deferred"
			);
			false
		};

		self.stats_tx.send_modify(|stats| {
			stats.events_observed += 1;
			if persisted {
				stats.collections_persisted += 1;
			}
		});
	}

	/// Persist the full current collection. Failures are logged and not
	/// retried; the next change's write-back carries the latest state.
	async fn write_back(&self) -> bool {
		let addresses = self.book.list();

		let value = match serde_json::to_value(&addresses) {
			Ok(value) => value,
			Err(e) => {
				error!("failed to serialize address collection: {e}");
				return false;
			}
		};

		match self.store.set(ADDRESSES_KEY, value).await {
			Ok(()) => {
				debug!(count = addresses.len(), "persisted address collection");
				true
			}
			Err(e) => {
				warn!("failed to persist address collection, keeping in-memory state: {e}");
				false
			}
		}
	}
}
