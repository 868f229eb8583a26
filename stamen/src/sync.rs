//! Signals that can be shared with and emitted from any number of threads.
//!
//! Slots must be [`Send`] and [`Sync`], since they run on whichever thread emits.

use core::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Weak};

use anther::{
	policy::Synchronized,
	registry::{Registry, SlotRegistry},
};
use tracing::trace;

use crate::{combiner::Combiner, connection, Last};

/// The [`RegistryRef`](`connection::RegistryRef`) of [`Signal`] handles.
pub type RegistryRef = Weak<dyn Registry + Send + Sync>;

/// Handle to a slot's registration with a [`Signal`].
pub type Connection = connection::Connection<RegistryRef>;

/// Disconnects a [`Signal`]'s slot when dropped.
pub type ScopedConnection = connection::ScopedConnection<RegistryRef>;

/// Blocks a [`Signal`]'s slot while it exists.
pub type ConnectionBlock = connection::ConnectionBlock<RegistryRef>;

/// A thread-safe signal with argument type `A`, slot return type `R` and [`Combiner`] `C`.
///
/// Connecting, disconnecting, blocking and emitting are all possible through shared references,
/// concurrently from different threads and also from within slots that are currently running.
///
/// Dropping the [`Signal`] disconnects all its slots.
pub struct Signal<A: ?Sized + 'static, R: 'static = (), C = Last> {
	registry: Arc<SlotRegistry<Arc<dyn Fn(&A) -> R + Send + Sync>, Synchronized>>,
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
			registry: Arc::new(SlotRegistry::new()),
			combiner,
		}
	}

	fn registry_ref(&self) -> RegistryRef {
		Arc::downgrade(&self.registry) as RegistryRef
	}

	/// Connects `slot` after all currently connected slots.
	///
	/// Dispatches that are already running when this is called won't invoke `slot`.
	pub fn connect(&self, slot: impl 'static + Send + Sync + Fn(&A) -> R) -> Connection {
		let id = self.registry.connect(Arc::new(slot));
		Connection::new(self.registry_ref(), id)
	}

	/// Like [`connect`](`Signal::connect`), but disconnects `slot` when the returned guard is dropped.
	pub fn connect_scoped(
		&self,
		slot: impl 'static + Send + Sync + Fn(&A) -> R,
	) -> ScopedConnection {
		self.connect(slot).scoped()
	}

	/// Disconnects the slot of `connection` iff it is connected to this [`Signal`].
	pub fn disconnect(&self, connection: &Connection) {
		if let Some((registry, id)) = connection.target() {
			if Weak::as_ptr(registry).cast::<()>() == Arc::as_ptr(&self.registry).cast::<()>() {
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
	/// Only slots connected before the call are considered.
	/// A slot disconnected or blocked while this runs is skipped if it wasn't invoked yet.
	///
	/// # Panics
	///
	/// Iff a slot panics. The remaining slots are not invoked in that case.
	pub fn emit(&self, args: &A) -> C::Output
	where
		C: Combiner<R>,
	{
		let snapshot = self.registry.snapshot();
		trace!(slots = snapshot.len(), "emitting");
		self.combiner.combine(snapshot.active().map(|slot| slot(args)))
	}
}
