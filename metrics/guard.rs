use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// `Guarded` owns the state of an accumulator and only hands it out through a read or write lock. Every update leaves the state consistent, so a lock poisoned by a panicking caller is recovered rather than propagated.
#[derive(Debug, Default)]
pub struct Guarded<T>(RwLock<T>);

impl<T> Guarded<T> {
	pub fn read(&self) -> RwLockReadGuard<T> {
		self.0.read().unwrap_or_else(PoisonError::into_inner)
	}

	pub fn write(&self) -> RwLockWriteGuard<T> {
		self.0.write().unwrap_or_else(PoisonError::into_inner)
	}
}

impl<T> Guarded<T>
where
	T: Clone,
{
	/// Clone the state under the read lock.
	pub fn snapshot(&self) -> T {
		self.read().clone()
	}
}

#[test]
fn test_recovers_from_poison() {
	use std::sync::Arc;
	let guarded = Arc::new(Guarded::<u64>::default());
	*guarded.write() = 1;
	let clone = guarded.clone();
	let result = std::thread::spawn(move || {
		let _lock = clone.write();
		panic!("poison");
	})
	.join();
	assert!(result.is_err());
	*guarded.write() += 1;
	assert_eq!(guarded.snapshot(), 2);
}
