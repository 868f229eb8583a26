//! Signals for use on a single thread, without locking.
//!
//! [`Signal`] and its handles are neither [`Send`] nor [`Sync`], so they can't be accessed
//! concurrently. Slots don't need to be thread-safe in turn.
//! Re-entrant use from within slots works exactly as with [`crate::sync::Signal`].

use core::fmt::{self, Debug, Formatter};
use std::rc::{Rc, Weak};

use anther::{
	policy::Unsynchronized,
	registry::{Registry, SlotRegistry},
};
use tracing::trace;

use crate::{combiner::Combiner, connection, Last};

/// The [`RegistryRef`](`connection::RegistryRef`) of [`Signal`] handles.
pub type RegistryRef = Weak<dyn Registry>;

/// Handle to a slot's registration with a [`Signal`].
pub type Connection = connection::Connection<RegistryRef>;

/// Disconnects a [`Signal`]'s slot when dropped.
pub type ScopedConnection = connection::ScopedConnection<RegistryRef>;

/// Blocks a [`Signal`]'s slot while it exists.
pub type ConnectionBlock = connection::ConnectionBlock<RegistryRef>;

/// A single-threaded signal with argument type `A`, slot return type `R` and [`Combiner`] `C`.
///
/// Dropping the [`Signal`] disconnects all its slots.
pub struct Signal<A: ?Sized + 'static, R: 'static = (), C = Last> {
	registry: Rc<SlotRegistry<Rc<dyn Fn(&A) -> R>, Unsynchronized>>,
	combiner: C,
}

impl<A: ?Sized + 'static, R: 'static, C: Default> Signal<A, R, C> {
	/// Creates a new [`Signal`] without slots.
	#[must_use]
	pub fn new() -> Self {
		Self::with_combiner(C::default())
	}
}

impl<A: ?Sized + 'static, R: 'static, C: Default> Default for Signal<A, R, C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<A: ?Sized + 'static, R: 'static, C: Debug> Debug for Signal<A, R, C> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("registry", &self.registry)
			.field("combiner", &self.combiner)
			.finish()
	}
}

impl<A: ?Sized + 'static, R: 'static, C> Signal<A, R, C> {
	/// Creates a new [`Signal`] without slots that combines slot results with `combiner`.
	pub fn with_combiner(combiner: C) -> Self {
		Self {
			registry: Rc::new(SlotRegistry::new()),
			combiner,
		}
	}

	fn registry_ref(&self) -> RegistryRef {
		Rc::downgrade(&self.registry) as RegistryRef
	}

	/// Connects `slot` after all currently connected slots.
	pub fn connect(&self, slot: impl 'static + Fn(&A) -> R) -> Connection {
		let id = self.registry.connect(Rc::new(slot));
		Connection::new(self.registry_ref(), id)
	}

	/// Like [`connect`](`Signal::connect`), but disconnects `slot` when the returned guard is dropped.
	pub fn connect_scoped(&self, slot: impl 'static + Fn(&A) -> R) -> ScopedConnection {
		self.connect(slot).scoped()
	}

	/// Disconnects the slot of `connection` iff it is connected to this [`Signal`].
	pub fn disconnect(&self, connection: &Connection) {
		if let Some((registry, id)) = connection.target() {
			if Weak::as_ptr(registry).cast::<()>() == Rc::as_ptr(&self.registry).cast::<()>() {
				self.registry.disconnect(id);
			}
		}
	}

	/// Disconnects all slots.
	pub fn disconnect_all(&self) {
		self.registry.disconnect_all();
	}

	/// The number of connected slots, including blocked ones.
	#[must_use]
	pub fn len(&self) -> usize {
		self.registry.len()
	}

	/// Whether no slots are connected.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.registry.is_empty()
	}

	/// The [`Combiner`] of this [`Signal`].
	pub fn combiner(&self) -> &C {
		&self.combiner
	}

	/// Exclusive access to the [`Combiner`] of this [`Signal`].
	pub fn combiner_mut(&mut self) -> &mut C {
		&mut self.combiner
	}

	/// Invokes each live and unblocked slot in connection order with `args`,
	/// combining their results.
	///
	/// See [`crate::sync::Signal::emit`] for the exact dispatch semantics, which are the same.
	///
	/// # Panics
	///
	/// Iff a slot panics.
	pub fn emit(&self, args: &A) -> C::Output
	where
		C: Combiner<R>,
	{
		let snapshot = self.registry.snapshot();
		trace!(slots = snapshot.len(), "emitting");
		self.combiner.combine(snapshot.active().map(|slot| slot(args)))
	}
}
