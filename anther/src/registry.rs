//! The ordered slot collection behind each signal.
//!
//! A [`SlotRegistry`] stores its entries in connection order behind a copy-on-write
//! pointer. Dispatch takes a [`Snapshot`] of that pointer and then iterates it without
//! holding the critical section, so slots are free to connect, disconnect or block
//! (even themselves) while they run.

use core::{
	fmt::{self, Debug, Display, Formatter},
	mem,
	num::NonZeroU64,
	slice,
};

use tracing::{debug, trace};

use crate::policy::{Critical, Flag, Policy};

/// Identifies one connection towards the [`SlotRegistry`] that issued it.
///
/// Ids are issued in ascending order and are never reused by the same registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(NonZeroU64);

impl Display for SlotId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

struct SlotState<P: Policy> {
	alive: P::Flag,
	blocked: P::Flag,
}

impl<P: Policy> SlotState<P> {
	fn new() -> Self {
		Self {
			alive: Flag::new(true),
			blocked: Flag::new(false),
		}
	}

	fn is_active(&self) -> bool {
		self.alive.get() && !self.blocked.get()
	}
}

struct Entry<S, P: Policy> {
	id: SlotId,
	state: P::Shared<SlotState<P>>,
	slot: S,
}

impl<S: Clone, P: Policy> Clone for Entry<S, P> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			state: self.state.clone(),
			slot: self.slot.clone(),
		}
	}
}

struct Slots<S, P: Policy> {
	next_id: NonZeroU64,
	/// Always sorted by ascending [`SlotId`], which is also connection order.
	entries: P::Shared<Vec<Entry<S, P>>>,
}

impl<S, P: Policy> Slots<S, P> {
	fn position(&self, id: SlotId) -> Option<usize> {
		self.entries
			.binary_search_by_key(&id, |entry| entry.id)
			.ok()
	}

	fn state(&self, id: SlotId) -> Option<&SlotState<P>> {
		self.position(id).map(|index| &*self.entries[index].state)
	}
}

/// An ordered, thread-safe-or-not (depending on `P`) collection of slots of type `S`.
///
/// `S` is the shared callable handle, usually an `Arc<dyn Fn(…)>` or `Rc<dyn Fn(…)>`.
/// It's cloned whenever a mutation has to copy the entry sequence away from a running
/// dispatch, so it should be cheap to clone.
///
/// # Logic
///
/// No `S` is ever dropped inside the critical section.
///
/// `S` **is** cloned inside the critical section, by the first [`connect`](`SlotRegistry::connect`)
/// or [`disconnect`](`SlotRegistry::disconnect`) after a [`snapshot`](`SlotRegistry::snapshot`)
/// that is still held. That first call copies every entry and is O(n). Later calls are
/// O(1) amortized until the next snapshot. `S::clone` **must not** call into the same registry.
/// Under [`Unsynchronized`](`crate::policy::Unsynchronized`) doing so panics.
pub struct SlotRegistry<S, P: Policy> {
	critical: P::Critical<Slots<S, P>>,
}

impl<S: Clone, P: Policy> Default for SlotRegistry<S, P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: Clone, P: Policy> Debug for SlotRegistry<S, P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("SlotRegistry")
			.field("len", &self.len())
			.finish_non_exhaustive()
	}
}

impl<S: Clone, P: Policy> SlotRegistry<S, P> {
	/// Creates a new empty [`SlotRegistry`].
	#[must_use]
	pub fn new() -> Self {
		Self {
			critical: Critical::new(Slots {
				next_id: NonZeroU64::MIN,
				entries: P::share(Vec::new()),
			}),
		}
	}

	/// Appends `slot` as live and unblocked.
	///
	/// # Panics
	///
	/// Iff this registry has already issued [`u64::MAX`] ids.
	pub fn connect(&self, slot: S) -> SlotId {
		let id = self.critical.with(|slots| {
			let id = SlotId(slots.next_id);
			slots.next_id = slots
				.next_id
				.checked_add(1)
				.expect("Slot ids of this registry are exhausted.");
			P::make_mut(&mut slots.entries).push(Entry {
				id,
				state: P::share(SlotState::new()),
				slot,
			});
			id
		});
		trace!(%id, "connected slot");
		id
	}

	/// Marks the slot with `id` as dead and removes it.
	///
	/// **Idempotent** aside from the return value.
	/// **Returns** whether the slot was connected before this call.
	pub fn disconnect(&self, id: SlotId) -> bool {
		let removed = self.critical.with(|slots| {
			let index = slots.position(id)?;
			let entry = P::make_mut(&mut slots.entries).remove(index);
			entry.state.alive.set(false);
			Some(entry)
		});
		// The slot may own connections to this registry, so it's dropped after leaving.
		let disconnected = removed.is_some();
		drop(removed);
		if disconnected {
			trace!(%id, "disconnected slot");
		}
		disconnected
	}

	/// Marks all slots as dead and removes them.
	pub fn disconnect_all(&self) {
		let removed = self.critical.with(|slots| {
			for entry in slots.entries.iter() {
				entry.state.alive.set(false);
			}
			mem::replace(&mut slots.entries, P::share(Vec::new()))
		});
		debug!(count = removed.len(), "disconnected all slots");
		drop(removed);
	}

	/// Sets whether the slot with `id` is skipped during dispatch.
	///
	/// **Returns** the previous blocked state, or [`None`] iff `id` isn't connected.
	pub fn set_blocked(&self, id: SlotId, blocked: bool) -> Option<bool> {
		let previous = self
			.critical
			.with(|slots| slots.state(id).map(|state| state.blocked.replace(blocked)));
		if previous.is_some_and(|previous| previous != blocked) {
			trace!(%id, blocked, "changed slot blocking");
		}
		previous
	}

	/// Whether the slot with `id` is still connected.
	#[must_use]
	pub fn is_connected(&self, id: SlotId) -> bool {
		self.critical
			.with(|slots| slots.state(id).is_some_and(|state| state.alive.get()))
	}

	/// Whether the slot with `id` is connected and currently blocked.
	#[must_use]
	pub fn is_blocked(&self, id: SlotId) -> bool {
		self.critical.with(|slots| {
			slots
				.state(id)
				.is_some_and(|state| state.alive.get() && state.blocked.get())
		})
	}

	/// The number of connected slots, including blocked ones.
	#[must_use]
	pub fn len(&self) -> usize {
		self.critical.with(|slots| slots.entries.len())
	}

	/// Whether no slots are connected.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Captures the current entry sequence for one dispatch.
	///
	/// Slots connected after this call are not part of the [`Snapshot`].
	/// Disconnecting or blocking slots after this call **is** observed by [`Snapshot::active`].
	#[must_use]
	pub fn snapshot(&self) -> Snapshot<S, P> {
		Snapshot {
			entries: self.critical.with(|slots| slots.entries.clone()),
		}
	}
}

/// The entry positions of a [`SlotRegistry`] at the start of one dispatch.
///
/// Keeps the slots it lists alive (but not connected) until dropped.
pub struct Snapshot<S, P: Policy> {
	entries: P::Shared<Vec<Entry<S, P>>>,
}

impl<S, P: Policy> Debug for Snapshot<S, P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Snapshot")
			.field("len", &self.len())
			.finish_non_exhaustive()
	}
}

impl<S, P: Policy> Snapshot<S, P> {
	/// Lazily yields the slots that are live and unblocked **at the time each is pulled**.
	#[must_use]
	pub fn active(&self) -> Active<'_, S, P> {
		Active {
			entries: self.entries.iter(),
		}
	}

	/// The number of captured positions, whether still live or not.
	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether no positions were captured.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Iterator over the active slots of a [`Snapshot`]. See [`Snapshot::active`].
pub struct Active<'a, S, P: Policy> {
	entries: slice::Iter<'a, Entry<S, P>>,
}

impl<'a, S, P: Policy> Iterator for Active<'a, S, P> {
	type Item = &'a S;

	fn next(&mut self) -> Option<Self::Item> {
		self.entries
			.find(|entry| entry.state.is_active())
			.map(|entry| &entry.slot)
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(0, self.entries.size_hint().1)
	}
}

/// Type-erased access to a [`SlotRegistry`] by [`SlotId`].
///
/// This is what connection handles reach through, so it's object-safe.
pub trait Registry {
	/// See [`SlotRegistry::disconnect`].
	fn disconnect(&self, id: SlotId) -> bool;

	/// See [`SlotRegistry::set_blocked`].
	fn set_blocked(&self, id: SlotId, blocked: bool) -> Option<bool>;

	/// See [`SlotRegistry::is_connected`].
	fn is_connected(&self, id: SlotId) -> bool;

	/// See [`SlotRegistry::is_blocked`].
	fn is_blocked(&self, id: SlotId) -> bool;
}

impl<S: Clone, P: Policy> Registry for SlotRegistry<S, P> {
	fn disconnect(&self, id: SlotId) -> bool {
		SlotRegistry::disconnect(self, id)
	}

	fn set_blocked(&self, id: SlotId, blocked: bool) -> Option<bool> {
		SlotRegistry::set_blocked(self, id, blocked)
	}

	fn is_connected(&self, id: SlotId) -> bool {
		SlotRegistry::is_connected(self, id)
	}

	fn is_blocked(&self, id: SlotId) -> bool {
		SlotRegistry::is_blocked(self, id)
	}
}
