#![cfg(feature = "sync")]

use std::{
	collections::HashSet,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
};

use stamen::sync::{Connection, ScopedConnection, Signal};

use _calls::Calls;

#[test]
fn connection_outlives_signal() {
	let signal = Signal::<()>::new();
	let connection = signal.connect(|()| ());
	let blocked = signal.connect(|()| ());
	blocked.block();
	assert!(connection.connected());
	assert!(blocked.blocked());

	drop(signal);
	assert!(!connection.connected());
	assert!(!blocked.blocked());

	// All no-ops now.
	connection.disconnect();
	connection.block();
	connection.unblock();
	assert!(!connection.connected());
	assert!(connection.slot_id().is_some());
}

#[test]
fn default_connection_is_inert() {
	let connection = Connection::default();
	assert!(!connection.connected());
	assert!(!connection.blocked());
	assert_eq!(connection.slot_id(), None);
	connection.disconnect();
	assert!(!connection.block_scoped().engaged());
	assert_eq!(connection, Connection::default());
}

#[test]
fn dropping_signal_drops_slots() {
	static DROPS: AtomicUsize = AtomicUsize::new(0);

	struct Tracked;
	impl Drop for Tracked {
		fn drop(&mut self) {
			DROPS.fetch_add(1, Ordering::Relaxed);
		}
	}

	let signal = Signal::<()>::new();
	let tracked = Tracked;
	let connection = signal.connect(move |()| {
		let _tracked = &tracked;
	});
	assert_eq!(DROPS.load(Ordering::Relaxed), 0);

	drop(signal);
	assert_eq!(DROPS.load(Ordering::Relaxed), 1);
	assert!(!connection.connected());
}

#[test]
fn scoped_connection_disconnects_on_drop() {
	static V: Calls<&str> = Calls::new();

	let signal = Signal::<()>::new();
	{
		let _scoped = signal.connect_scoped(V.slot("scoped"));
		signal.emit(&());
		V.expect(["scoped"]);
	}
	assert!(signal.is_empty());

	signal.emit(&());
	V.expect([]);
}

#[test]
fn scoped_connection_release() {
	static V: Calls<&str> = Calls::new();

	let signal = Signal::<()>::new();
	let mut scoped = signal.connect_scoped(V.slot("released"));
	let connection = scoped.release();
	assert_eq!(scoped.slot_id(), None);
	drop(scoped);

	assert!(connection.connected());
	signal.emit(&());
	V.expect(["released"]);
}

#[test]
fn scoped_connection_reassignment() {
	static V: Calls<&str> = Calls::new();

	let signal = Signal::<()>::new();
	let a = signal.connect(V.slot("a"));
	let b = signal.connect(V.slot("b"));

	let mut scoped = ScopedConnection::from(a.clone());
	assert_eq!(*scoped, a);

	// Overwriting disconnects the previous connection only.
	scoped = b.clone().scoped();
	assert!(!a.connected());
	assert!(b.connected());
	assert!(scoped.connected());

	signal.emit(&());
	V.expect(["b"]);

	scoped = ScopedConnection::default();
	assert!(!b.connected());
	drop(scoped);

	signal.emit(&());
	V.expect([]);
}

#[test]
fn scoped_connection_of_dropped_signal() {
	let signal = Signal::<()>::new();
	let scoped = signal.connect_scoped(|()| ());
	drop(signal);
	assert!(!scoped.connected());
	drop(scoped);
}

#[test]
fn connections_compare_by_registration() {
	let signal = Signal::<()>::new();
	let other = Signal::<()>::new();

	let a = signal.connect(|()| ());
	let b = signal.connect(|()| ());
	let c = other.connect(|()| ());

	assert_eq!(a, a.clone());
	assert_ne!(a, b);
	assert_eq!(a.slot_id(), c.slot_id());
	assert_ne!(a, c);

	let set: HashSet<_> = [a.clone(), b.clone(), c.clone(), a.clone()].into_iter().collect();
	assert_eq!(set.len(), 3);

	// Disconnecting doesn't change identity.
	a.disconnect();
	assert!(set.contains(&a));
}

#[test]
fn ids_are_not_reused() {
	let signal = Signal::<()>::new();
	let a = signal.connect(|()| ());
	a.disconnect();
	let b = signal.connect(|()| ());

	assert_ne!(a.slot_id(), b.slot_id());
	assert!(!a.connected());
	a.disconnect();
	assert!(b.connected());
}

#[test]
fn connection_sent_to_other_thread() {
	static V: Calls<&str> = Calls::new();

	let signal = Arc::new(Signal::<()>::new());
	let connection = signal.connect(V.slot("a"));

	std::thread::spawn(move || connection.disconnect())
		.join()
		.unwrap();

	signal.emit(&());
	V.expect([]);
}
