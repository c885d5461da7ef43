//! In-memory address collection, the single source of truth for a session

use crate::address::Address;

use std::sync::RwLock;

use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Emitted by [`AddressBook`] after every mutation of the saved collection.
#[derive(Debug, Clone)]
pub enum BookEvent {
	/// An address was appended to the collection
	Added { id: String },

	/// An address was removed from the collection
	Removed { id: String },

	/// The whole collection was replaced
	Replaced { count: usize },
}

#[derive(Default)]
struct BookState {
	addresses: Vec<Address>,
	candidates: Vec<Address>,
	selected: Option<String>,
}

/// The ordered collection of saved addresses plus the ephemeral lookup
/// candidate set and its selection.
///
/// Owned behind an `Arc` and injected into whatever needs it; mutation goes
/// through the methods below only, and every mutation of the saved
/// collection emits exactly one [`BookEvent`] on the broadcast channel.
/// The candidate/selection surface is UI state for the current lookup and
/// is never persisted, so it emits nothing.
pub struct AddressBook {
	state: RwLock<BookState>,
	events: broadcast::Sender<BookEvent>,
}

impl AddressBook {
	pub fn new() -> Self {
		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

		Self {
			state: RwLock::new(BookState::default()),
			events,
		}
	}

	/// Subscribe to mutation events.
	pub fn subscribe(&self) -> broadcast::Receiver<BookEvent> {
		self.events.subscribe()
	}

	fn emit(&self, event: BookEvent) {
		// Ignore send errors (no receivers)
		let _ = self.events.send(event);
	}

	fn read(&self) -> std::sync::RwLockReadGuard<'_, BookState> {
		self.state.read().unwrap_or_else(|e| e.into_inner())
	}

	fn write(&self) -> std::sync::RwLockWriteGuard<'_, BookState> {
		self.state.write().unwrap_or_else(|e| e.into_inner())
	}

	/// Append an address to the collection.
	///
	/// No duplicate-id guard is applied here; callers are expected to have
	/// validated their selection beforehand.
	pub fn add(&self, address: Address) {
		let id = address.id.clone();
		self.write().addresses.push(address);
		self.emit(BookEvent::Added { id });
	}

	/// Remove the address with the given id. Removing an id that is not
	/// present is a silent no-op and emits no event.
	pub fn remove(&self, id: &str) {
		let removed = {
			let mut state = self.write();
			match state.addresses.iter().position(|a| a.id == id) {
				Some(index) => {
					state.addresses.remove(index);
					true
				}
				None => false,
			}
		};

		if removed {
			self.emit(BookEvent::Removed { id: id.to_string() });
		}
	}

	/// Replace the whole collection. Used by the load path only.
	pub fn replace_all(&self, addresses: Vec<Address>) {
		let count = addresses.len();
		self.write().addresses = addresses;
		self.emit(BookEvent::Replaced { count });
	}

	/// Snapshot of the saved collection in insertion order.
	pub fn list(&self) -> Vec<Address> {
		self.read().addresses.clone()
	}

	pub fn len(&self) -> usize {
		self.read().addresses.len()
	}

	pub fn is_empty(&self) -> bool {
		self.read().addresses.is_empty()
	}

	/// Replace the lookup candidate set, clearing any selection.
	pub fn set_candidates(&self, candidates: Vec<Address>) {
		let mut state = self.write();
		state.candidates = candidates;
		state.selected = None;
	}

	pub fn candidates(&self) -> Vec<Address> {
		self.read().candidates.clone()
	}

	/// Select a candidate by id. Returns `false` (leaving the previous
	/// selection intact) when the id is not in the current candidate set.
	pub fn select(&self, id: &str) -> bool {
		let mut state = self.write();
		if state.candidates.iter().any(|a| a.id == id) {
			state.selected = Some(id.to_string());
			true
		} else {
			false
		}
	}

	pub fn clear_selection(&self) {
		self.write().selected = None;
	}

	/// The currently selected candidate, if any.
	pub fn selected(&self) -> Option<Address> {
		let state = self.read();
		let id = state.selected.as_deref()?;
		state.candidates.iter().find(|a| a.id == id).cloned()
	}
}

impl Default for AddressBook {
	fn default() -> Self {
		Self::new()
	}
}
