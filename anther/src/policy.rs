//! Concurrency policies for [`SlotRegistry`](`crate::registry::SlotRegistry`).
//!
//! A [`Policy`] decides how the registry shares snapshot data between dispatches,
//! how per-slot flags are stored and how registry-shape changes are made exclusive.
//!
//! [`Synchronized`] (feature `sync`) is [`Send`] and [`Sync`] throughout, while
//! [`Unsynchronized`] is neither and has no locking overhead at all.

use core::ops::Deref;
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

#[cfg(feature = "sync")]
use core::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "sync")]
use parking_lot::ReentrantMutex;
#[cfg(feature = "sync")]
use std::sync::Arc;

/// Selects the sharing and locking strategy of a registry.
///
/// Implementors are type-level markers only and never instantiated.
pub trait Policy: 'static + Sized {
	/// Per-slot boolean state, which dispatch reads **without** entering the critical section.
	type Flag: Flag;

	/// Shared ownership, used for snapshots and per-slot state.
	type Shared<T>: Clone + Deref<Target = T>;

	/// The exclusive region around registry-shape changes.
	type Critical<T>: Critical<T>;

	/// Moves `value` into shared ownership.
	fn share<T>(value: T) -> Self::Shared<T>;

	/// Clone-on-write access to `shared`.
	///
	/// Other holders of the previous allocation keep observing the old value.
	fn make_mut<T: Clone>(shared: &mut Self::Shared<T>) -> &mut T;
}

/// A boolean cell that can be changed through a shared reference.
pub trait Flag {
	/// Creates a new [`Flag`] holding `value`.
	fn new(value: bool) -> Self;

	/// Reads the current value.
	fn get(&self) -> bool;

	/// Stores `value`, returning the previous value.
	fn replace(&self, value: bool) -> bool;

	/// Stores `value`.
	fn set(&self, value: bool) {
		self.replace(value);
	}
}

/// An exclusive region guarding `T`.
///
/// # Logic
///
/// Implementations **must not** deadlock when entered again on the same thread while
/// **outside** of [`with`](`Critical::with`)'s closure, even if another critical section
/// of the same instance is entered further up the call stack.
///
/// The closure passed to [`with`](`Critical::with`) **must not** call back into user code.
/// Implementations **may** panic if it re-enters the same instance.
pub trait Critical<T> {
	/// Creates a new critical region around `value`.
	fn new(value: T) -> Self;

	/// Runs `f` with exclusive access to the guarded value.
	fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

/// Thread-safe policy: atomics, [`Arc`] and a [`ReentrantMutex`].
#[cfg(feature = "sync")]
#[derive(Debug)]
pub enum Synchronized {}

#[cfg(feature = "sync")]
impl Policy for Synchronized {
	type Flag = AtomicBool;
	type Shared<T> = Arc<T>;
	type Critical<T> = ReentrantMutex<RefCell<T>>;

	fn share<T>(value: T) -> Self::Shared<T> {
		Arc::new(value)
	}

	fn make_mut<T: Clone>(shared: &mut Self::Shared<T>) -> &mut T {
		Arc::make_mut(shared)
	}
}

#[cfg(feature = "sync")]
impl Flag for AtomicBool {
	fn new(value: bool) -> Self {
		AtomicBool::new(value)
	}

	fn get(&self) -> bool {
		self.load(Ordering::Acquire)
	}

	fn replace(&self, value: bool) -> bool {
		self.swap(value, Ordering::AcqRel)
	}
}

#[cfg(feature = "sync")]
impl<T> Critical<T> for ReentrantMutex<RefCell<T>> {
	fn new(value: T) -> Self {
		ReentrantMutex::new(RefCell::new(value))
	}

	fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
		let lock = self.lock();
		let mut borrow = lock.borrow_mut();
		f(&mut *borrow)
	}
}

/// Single-threaded policy: [`Cell`], [`Rc`] and a plain [`RefCell`].
#[derive(Debug)]
pub enum Unsynchronized {}

impl Policy for Unsynchronized {
	type Flag = Cell<bool>;
	type Shared<T> = Rc<T>;
	type Critical<T> = RefCell<T>;

	fn share<T>(value: T) -> Self::Shared<T> {
		Rc::new(value)
	}

	fn make_mut<T: Clone>(shared: &mut Self::Shared<T>) -> &mut T {
		Rc::make_mut(shared)
	}
}

impl Flag for Cell<bool> {
	fn new(value: bool) -> Self {
		Cell::new(value)
	}

	fn get(&self) -> bool {
		Cell::get(self)
	}

	fn replace(&self, value: bool) -> bool {
		Cell::replace(self, value)
	}
}

impl<T> Critical<T> for RefCell<T> {
	fn new(value: T) -> Self {
		RefCell::new(value)
	}

	fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
		f(&mut *self.borrow_mut())
	}
}
