/*
    Sequences whose length limits come from the active protocol profile. The limits are resolved once, when the
    vector is built with a `ProtocolConfig`, and every length-changing operation is checked against them. Element
    access goes through `Deref`/`DerefMut` to a slice, which can reorder or overwrite elements but never resize.
*/

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use constants::ProtocolConfig;
use crate::error::BoundsError;

pub trait SizeBound {
    const NAME: &'static str;
    fn bounds(config: &ProtocolConfig) -> (usize, usize);
}

macro_rules! size_bound {
    ($name:ident, $desc:literal, |$c:ident| ($min:expr, $max:expr)) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl SizeBound for $name {
            const NAME: &'static str = $desc;
            fn bounds($c: &ProtocolConfig) -> (usize, usize) {
                ($min, $max)
            }
        }
    };
}

size_bound!(PerValidator, "validators", |c| (c.validators_count, c.validators_count));
size_bound!(PerCore, "cores", |c| (c.cores_count, c.cores_count));
size_bound!(PerEpochSlot, "epoch slots", |c| (c.epoch_length as usize, c.epoch_length as usize));
size_bound!(UpToEpochLength, "ticket accumulator", |c| (0, c.epoch_length as usize));
size_bound!(AuthPoolSize, "authorization pool", |c| (0, c.max_auth_pool_items));
size_bound!(AuthQueueSize, "authorization queue", |c| (c.auth_queue_items, c.auth_queue_items));
size_bound!(RecentHistorySize, "recent history", |c| (0, c.recent_history_size));

pub struct BoundedVec<T, B> {
    items: Vec<T>,
    min: usize,
    max: usize,
    _bound: PhantomData<fn() -> B>,
}

impl<T, B: SizeBound> BoundedVec<T, B> {

    pub fn new(config: &ProtocolConfig, items: Vec<T>) -> Result<Self, BoundsError> {
        let (min, max) = B::bounds(config);
        let vec = BoundedVec { items, min, max, _bound: PhantomData };
        vec.check_len(vec.items.len())?;
        Ok(vec)
    }

    /// A vector holding the minimum number of items, each a clone of `item`.
    pub fn filled(config: &ProtocolConfig, item: T) -> Self
    where
        T: Clone,
    {
        let (min, max) = B::bounds(config);
        BoundedVec { items: vec![item; min], min, max, _bound: PhantomData }
    }

    pub fn with_default(config: &ProtocolConfig) -> Self
    where
        T: Clone + Default,
    {
        Self::filled(config, T::default())
    }

    /// Same bounds, different contents.
    pub fn replace(&self, items: Vec<T>) -> Result<Self, BoundsError> {
        let vec = BoundedVec { items, min: self.min, max: self.max, _bound: PhantomData };
        vec.check_len(vec.items.len())?;
        Ok(vec)
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> BoundedVec<U, B> {
        BoundedVec { items: self.items.iter().map(f).collect(), min: self.min, max: self.max, _bound: PhantomData }
    }

    fn check_len(&self, len: usize) -> Result<(), BoundsError> {
        if len < self.min || len > self.max {
            return Err(BoundsError { what: B::NAME, len, min: self.min, max: self.max });
        }
        Ok(())
    }

    /// Re-checks the resolved bounds against a (possibly different) profile.
    pub fn check(&self, config: &ProtocolConfig) -> Result<(), BoundsError> {
        let (min, max) = B::bounds(config);
        let len = self.items.len();
        if len < min || len > max {
            return Err(BoundsError { what: B::NAME, len, min, max });
        }
        Ok(())
    }

    pub fn push(&mut self, item: T) -> Result<(), BoundsError> {
        self.check_len(self.items.len() + 1)?;
        self.items.push(item);
        Ok(())
    }

    /// Appends `item`, dropping the oldest entries when the vector is already full.
    pub fn push_evicting(&mut self, item: T) {
        if self.max == 0 {
            return;
        }
        while self.items.len() >= self.max {
            self.items.remove(0);
        }
        self.items.push(item);
    }

    pub fn remove(&mut self, index: usize) -> Result<T, BoundsError> {
        if index >= self.items.len() {
            return Err(BoundsError { what: B::NAME, len: index, min: 0, max: self.items.len() });
        }
        self.check_len(self.items.len() - 1)?;
        Ok(self.items.remove(index))
    }

    pub fn insert(&mut self, index: usize, item: T) -> Result<(), BoundsError> {
        if index > self.items.len() {
            return Err(BoundsError { what: B::NAME, len: index, min: 0, max: self.items.len() });
        }
        self.check_len(self.items.len() + 1)?;
        self.items.insert(index, item);
        Ok(())
    }

    pub fn truncate(&mut self, len: usize) -> Result<(), BoundsError> {
        if len < self.items.len() {
            self.check_len(len)?;
            self.items.truncate(len);
        }
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), BoundsError> {
        self.truncate(0)
    }

    pub fn min_len(&self) -> usize {
        self.min
    }

    pub fn max_len(&self) -> usize {
        self.max
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T, B> Deref for BoundedVec<T, B> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T, B> DerefMut for BoundedVec<T, B> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.items
    }
}

impl<T: Clone, B> Clone for BoundedVec<T, B> {
    fn clone(&self) -> Self {
        BoundedVec { items: self.items.clone(), min: self.min, max: self.max, _bound: PhantomData }
    }
}

impl<T: PartialEq, B> PartialEq for BoundedVec<T, B> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Eq, B> Eq for BoundedVec<T, B> {}

impl<T: fmt::Debug, B> fmt::Debug for BoundedVec<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.items.fmt(f)
    }
}

impl<'a, T, B> IntoIterator for &'a BoundedVec<T, B> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
