#![cfg(feature = "sync")]

use std::sync::Mutex;

use proptest::{collection::vec, prelude::*};
use stamen::sync::{Connection, Signal};

/// Connects `count` slots that each push their index into the emitted log.
fn indexed(count: usize) -> (Signal<Mutex<Vec<usize>>>, Vec<Connection>) {
	let signal = Signal::<Mutex<Vec<usize>>>::new();
	let connections = (0..count)
		.map(|i| signal.connect(move |log: &Mutex<Vec<usize>>| log.lock().unwrap().push(i)))
		.collect();
	(signal, connections)
}

fn emit(signal: &Signal<Mutex<Vec<usize>>>) -> Vec<usize> {
	let log = Mutex::new(Vec::new());
	signal.emit(&log);
	log.into_inner().unwrap()
}

proptest! {
	#[test]
	fn emits_in_connection_order(count in 0usize..64) {
		let (signal, _connections) = indexed(count);
		prop_assert_eq!(emit(&signal), (0..count).collect::<Vec<_>>());
	}

	#[test]
	fn disconnects_keep_remaining_order(count in 0usize..48, removed in vec(any::<bool>(), 48)) {
		let (signal, connections) = indexed(count);
		for (connection, &removed) in connections.iter().zip(&removed) {
			if removed {
				connection.disconnect();
			}
		}

		let expected: Vec<_> = (0..count).filter(|&i| !removed[i]).collect();
		prop_assert_eq!(signal.len(), expected.len());
		prop_assert_eq!(emit(&signal), expected);
	}

	#[test]
	fn block_cycles_keep_order(count in 1usize..32, blocked in vec(any::<bool>(), 32)) {
		let (signal, connections) = indexed(count);
		for (connection, &blocked) in connections.iter().zip(&blocked) {
			if blocked {
				connection.block();
			}
		}

		prop_assert_eq!(
			emit(&signal),
			(0..count).filter(|&i| !blocked[i]).collect::<Vec<_>>()
		);
		for (i, connection) in connections.iter().enumerate() {
			prop_assert_eq!(connection.blocked(), blocked[i]);
			prop_assert!(connection.connected());
		}

		for connection in &connections {
			connection.unblock();
		}
		prop_assert_eq!(emit(&signal), (0..count).collect::<Vec<_>>());
	}
}

#[test]
fn blocked_slot_stays_in_place() {
	let (signal, connections) = indexed(3);

	let guard = connections[1].block_scoped();
	assert!(guard.engaged());
	assert_eq!(emit(&signal), [0, 2]);

	// Nested guards leave unblocking to the outermost one.
	let nested = connections[1].block_scoped();
	assert!(!nested.engaged());
	drop(nested);
	assert_eq!(emit(&signal), [0, 2]);

	drop(guard);
	assert_eq!(emit(&signal), [0, 1, 2]);

	// Connecting after a block cycle still appends.
	signal.connect(|log: &Mutex<Vec<usize>>| log.lock().unwrap().push(3));
	assert_eq!(emit(&signal), [0, 1, 2, 3]);
}
