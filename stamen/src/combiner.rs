use core::{
	fmt::{self, Debug, Formatter},
	marker::PhantomData,
};

/// Folds the results of one emit into that emit's return value.
///
/// `results` is lazy: each call to [`Iterator::next`] invokes the next live, unblocked slot.
/// A [`Combiner`] that stops pulling early thereby skips the remaining slots of that emit.
pub trait Combiner<R> {
	/// The return type of [`emit`](`crate::unsync::Signal::emit`).
	type Output;

	/// Invokes as many slots as needed through `results` and combines their return values.
	fn combine(&self, results: impl Iterator<Item = R>) -> Self::Output;
}

/// Invokes all slots and returns the result of the last one, or [`None`] if none ran.
///
/// This is the default [`Combiner`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Last;

impl<R> Combiner<R> for Last {
	type Output = Option<R>;

	fn combine(&self, results: impl Iterator<Item = R>) -> Self::Output {
		results.last()
	}
}

/// Invokes all slots and ignores their results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Discard;

impl<R> Combiner<R> for Discard {
	type Output = ();

	fn combine(&self, results: impl Iterator<Item = R>) -> Self::Output {
		results.for_each(drop);
	}
}

/// Invokes all slots and collects their results into a `B`, e.g. a [`Vec`].
pub struct Collect<B>(PhantomData<fn() -> B>);

impl<B> Collect<B> {
	/// Creates a new [`Collect`] combiner.
	#[must_use]
	pub const fn new() -> Self {
		Self(PhantomData)
	}
}

impl<B> Default for Collect<B> {
	fn default() -> Self {
		Self::new()
	}
}

impl<B> Clone for Collect<B> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<B> Copy for Collect<B> {}

impl<B> Debug for Collect<B> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Collect").finish()
	}
}

impl<R, B: FromIterator<R>> Combiner<R> for Collect<B> {
	type Output = B;

	fn combine(&self, results: impl Iterator<Item = R>) -> Self::Output {
		results.collect()
	}
}

/// For fallible slots: stops the emit at the first [`Err`] and returns it.
///
/// Slots after the failing one are **not** invoked.
/// Otherwise returns the last [`Ok`] value, or `Ok(None)` if no slot ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FailFast;

impl<T, E> Combiner<Result<T, E>> for FailFast {
	type Output = Result<Option<T>, E>;

	fn combine(&self, mut results: impl Iterator<Item = Result<T, E>>) -> Self::Output {
		results.try_fold(None, |_, result| result.map(Some))
	}
}
