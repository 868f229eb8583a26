//! Connection handles, independent of signal type and threading policy.
//!
//! The [`sync`](`crate::sync`) and [`unsync`](`crate::unsync`) modules provide aliases
//! for these types with the matching [`RegistryRef`] filled in.

use core::{
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
	ops::Deref,
};
use std::{rc, sync};

use anther::registry::{Registry, SlotId};
use scopeguard::{guard, ScopeGuard};

/// A non-owning reference to a signal's slot registry.
///
/// Implemented for [`sync::Weak<dyn Registry + Send + Sync>`](`sync::Weak`)
/// and [`rc::Weak<dyn Registry>`](`rc::Weak`).
pub trait RegistryRef: Clone {
	/// Runs `f` on the registry iff it still exists.
	fn with_registry<T>(&self, f: impl FnOnce(&dyn Registry) -> T) -> Option<T>;

	/// The registry's address, which identifies it for as long as this reference exists.
	fn address(&self) -> usize;
}

impl RegistryRef for sync::Weak<dyn Registry + Send + Sync> {
	fn with_registry<T>(&self, f: impl FnOnce(&dyn Registry) -> T) -> Option<T> {
		self.upgrade().map(|registry| f(&*registry))
	}

	fn address(&self) -> usize {
		self.as_ptr().cast::<()>() as usize
	}
}

impl RegistryRef for rc::Weak<dyn Registry> {
	fn with_registry<T>(&self, f: impl FnOnce(&dyn Registry) -> T) -> Option<T> {
		self.upgrade().map(|registry| f(&*registry))
	}

	fn address(&self) -> usize {
		self.as_ptr().cast::<()>() as usize
	}
}

/// A handle to one slot's registration with a signal.
///
/// Cheap to clone, and all clones refer to the same registration.
/// The handle doesn't keep the signal or the slot alive: Once either is gone,
/// it reports "not connected" and all operations become no-ops.
///
/// [`Default`] creates an empty handle that was never connected.
pub struct Connection<W: RegistryRef> {
	target: Option<(W, SlotId)>,
}

impl<W: RegistryRef> Connection<W> {
	pub(crate) fn new(registry: W, id: SlotId) -> Self {
		Self {
			target: Some((registry, id)),
		}
	}

	pub(crate) fn target(&self) -> Option<(&W, SlotId)> {
		self.target.as_ref().map(|(registry, id)| (registry, *id))
	}

	fn with_registry<T>(&self, f: impl FnOnce(&dyn Registry, SlotId) -> T) -> Option<T> {
		let (registry, id) = self.target()?;
		registry.with_registry(|registry| f(registry, id))
	}

	/// Disconnects the slot. The slot is not invoked by any later dispatch step,
	/// including the remainder of dispatches that are currently running.
	///
	/// **Idempotent.** A no-op if the signal is gone.
	pub fn disconnect(&self) {
		self.with_registry(|registry, id| registry.disconnect(id));
	}

	/// Whether the slot is still connected.
	///
	/// This is a momentary observation only, as other handles may disconnect the slot concurrently.
	#[must_use]
	pub fn connected(&self) -> bool {
		self.with_registry(|registry, id| registry.is_connected(id))
			.unwrap_or(false)
	}

	/// Skips the slot during dispatch until [unblocked](`Connection::unblock`), without disconnecting it.
	///
	/// **Idempotent.** A no-op if the slot isn't connected.
	pub fn block(&self) {
		self.with_registry(|registry, id| registry.set_blocked(id, true));
	}

	/// Reverts [`block`](`Connection::block`).
	///
	/// **Idempotent.** A no-op if the slot isn't connected.
	pub fn unblock(&self) {
		self.with_registry(|registry, id| registry.set_blocked(id, false));
	}

	/// Whether the slot is connected and currently blocked.
	#[must_use]
	pub fn blocked(&self) -> bool {
		self.with_registry(|registry, id| registry.is_blocked(id))
			.unwrap_or(false)
	}

	/// The registration's id within its signal, unless this handle is empty.
	#[must_use]
	pub fn slot_id(&self) -> Option<SlotId> {
		self.target().map(|(_, id)| id)
	}

	/// Wraps this handle so that the slot is disconnected when the wrapper is dropped.
	pub fn scoped(self) -> ScopedConnection<W> {
		ScopedConnection::new(self)
	}

	/// Blocks the slot until the returned guard is dropped.
	///
	/// See [`ConnectionBlock`].
	pub fn block_scoped(&self) -> ConnectionBlock<W> {
		ConnectionBlock::new(self.clone())
	}
}

impl<W: RegistryRef> Default for Connection<W> {
	fn default() -> Self {
		Self { target: None }
	}
}

impl<W: RegistryRef> Clone for Connection<W> {
	fn clone(&self) -> Self {
		Self {
			target: self.target.clone(),
		}
	}
}

impl<W: RegistryRef> Debug for Connection<W> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Connection")
			.field("slot_id", &self.slot_id())
			.field("connected", &self.connected())
			.finish_non_exhaustive()
	}
}

impl<W: RegistryRef> PartialEq for Connection<W> {
	fn eq(&self, other: &Self) -> bool {
		match (self.target(), other.target()) {
			(None, None) => true,
			(Some((a, a_id)), Some((b, b_id))) => a.address() == b.address() && a_id == b_id,
			_ => false,
		}
	}
}

impl<W: RegistryRef> Eq for Connection<W> {}

impl<W: RegistryRef> Hash for Connection<W> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.target()
			.map(|(registry, id)| (registry.address(), id))
			.hash(state);
	}
}

fn disconnect_on_drop<W: RegistryRef>(connection: Connection<W>) {
	connection.disconnect();
}

/// Owns a [`Connection`] and disconnects it when dropped.
///
/// Assigning over a [`ScopedConnection`] drops, and therefore disconnects, the previous one.
/// Use [`release`](`ScopedConnection::release`) to take the handle back out without disconnecting.
///
/// Dereferences to the held [`Connection`].
#[must_use = "The slot is disconnected when this is dropped."]
pub struct ScopedConnection<W: RegistryRef>(ScopeGuard<Connection<W>, fn(Connection<W>)>);

impl<W: RegistryRef> ScopedConnection<W> {
	/// Takes ownership of `connection`.
	pub fn new(connection: Connection<W>) -> Self {
		Self(guard(connection, disconnect_on_drop::<W> as fn(_)))
	}

	/// Returns the held handle **without** disconnecting it, leaving this wrapper empty.
	#[must_use = "Use `drop(self)` to disconnect instead."]
	pub fn release(&mut self) -> Connection<W> {
		let Self(connection) = self;
		Connection {
			target: connection.target.take(),
		}
	}
}

impl<W: RegistryRef> Default for ScopedConnection<W> {
	fn default() -> Self {
		Self::new(Connection::default())
	}
}

impl<W: RegistryRef> From<Connection<W>> for ScopedConnection<W> {
	fn from(connection: Connection<W>) -> Self {
		Self::new(connection)
	}
}

impl<W: RegistryRef> Deref for ScopedConnection<W> {
	type Target = Connection<W>;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<W: RegistryRef> Debug for ScopedConnection<W> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ScopedConnection").field(&**self).finish()
	}
}

/// Keeps a slot [blocked](`Connection::block`) while it exists.
///
/// Dropping the guard unblocks the slot again iff creating it blocked the slot,
/// so that nested guards and manual blocks are preserved.
#[must_use = "The slot is unblocked again when this is dropped."]
pub struct ConnectionBlock<W: RegistryRef> {
	connection: Connection<W>,
	engaged: bool,
}

impl<W: RegistryRef> ConnectionBlock<W> {
	/// Blocks the slot of `connection`.
	pub fn new(connection: Connection<W>) -> Self {
		let engaged = connection
			.with_registry(|registry, id| registry.set_blocked(id, true))
			.flatten()
			== Some(false);
		Self {
			connection,
			engaged,
		}
	}

	/// Whether this guard blocked the slot and will unblock it on drop.
	#[must_use]
	pub fn engaged(&self) -> bool {
		self.engaged
	}
}

impl<W: RegistryRef> Drop for ConnectionBlock<W> {
	fn drop(&mut self) {
		if self.engaged {
			self.connection.unblock();
		}
	}
}

impl<W: RegistryRef> Debug for ConnectionBlock<W> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConnectionBlock")
			.field("connection", &self.connection)
			.field("engaged", &self.engaged)
			.finish()
	}
}
