#![cfg(feature = "sync")]

use std::{
	sync::{
		atomic::{AtomicBool, Ordering},
		Mutex,
	},
	thread,
};

use stamen::sync::{Connection, Signal};

const PERMANENT: usize = 16;
const TRANSIENT: usize = 1_000;

type Log = Mutex<Vec<usize>>;

fn push(index: usize) -> impl Fn(&Log) + Send + Sync {
	move |log: &Log| log.lock().unwrap().push(index)
}

#[test]
fn concurrent_emit_connect_disconnect() {
	let signal = Signal::<Log>::new();
	let permanent: Vec<Connection> = (0..PERMANENT).map(|i| signal.connect(push(i))).collect();
	let done = AtomicBool::new(false);

	thread::scope(|s| {
		let emitters: Vec<_> = (0..4)
			.map(|_| {
				let (signal, done) = (&signal, &done);
				s.spawn(move || {
					let mut emits = 0_usize;
					while !done.load(Ordering::Acquire) || emits < 100 {
						let log = Log::default();
						signal.emit(&log);
						let log = log.into_inner().unwrap();

						let mut seen = log.clone();
						seen.sort_unstable();
						seen.dedup();
						assert_eq!(seen.len(), log.len(), "duplicate invocation in {log:?}");

						let stable: Vec<_> = log.iter().copied().filter(|&i| i < PERMANENT).collect();
						assert_eq!(stable, (0..PERMANENT).collect::<Vec<_>>());
						emits += 1;
					}
				})
			})
			.collect();

		let churners: Vec<_> = (0..3)
			.map(|t| {
				let signal = &signal;
				s.spawn(move || {
					for n in 0..TRANSIENT {
						let index = PERMANENT + t * TRANSIENT + n;
						let connection = signal.connect(push(index));
						if n % 3 == 0 {
							connection.block();
							connection.unblock();
						}
						connection.disconnect();
						assert!(!connection.connected());
					}
				})
			})
			.collect();

		for churner in churners {
			churner.join().unwrap();
		}
		done.store(true, Ordering::Release);
		for emitter in emitters {
			emitter.join().unwrap();
		}
	});

	assert_eq!(signal.len(), PERMANENT);
	assert!(permanent.iter().all(Connection::connected));
}

#[test]
fn disconnect_from_other_thread_during_emit() {
	static STARTED: AtomicBool = AtomicBool::new(false);
	static RELEASED: AtomicBool = AtomicBool::new(false);

	let signal = Signal::<Log>::new();
	let first = signal.connect(|log: &Log| {
		log.lock().unwrap().push(0);
		STARTED.store(true, Ordering::Release);
		while !RELEASED.load(Ordering::Acquire) {
			thread::yield_now();
		}
	});
	let second = signal.connect(push(1));

	thread::scope(|s| {
		let emitter = s.spawn(|| {
			let log = Log::default();
			signal.emit(&log);
			log.into_inner().unwrap()
		});

		while !STARTED.load(Ordering::Acquire) {
			thread::yield_now();
		}
		second.disconnect();
		RELEASED.store(true, Ordering::Release);

		assert_eq!(emitter.join().unwrap(), [0]);
	});

	assert!(first.connected());
	assert!(!second.connected());
}
