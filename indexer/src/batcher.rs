//! Fixed-size batching of iterators.

/// Groups an iterator of `Result`s into `Vec`s of `size` `Ok` items.
///
/// Every batch is full except possibly the last, which holds the remainder
/// and is only produced when non-empty. An `Err` is passed through as soon
/// as it is pulled, and nothing is produced after it.
pub struct TryBatches<I> {
    iter: I,
    size: usize,
    done: bool,
}

impl<I> TryBatches<I> {
    /// Wrap `iter`. A size of zero is treated as one.
    pub fn new(iter: I, size: usize) -> Self {
        Self {
            iter,
            size: size.max(1),
            done: false,
        }
    }
}

impl<I, T, E> Iterator for TryBatches<I>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.iter.next() {
                Some(Ok(item)) => batch.push(item),
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

/// Batching adapter for any iterator.
pub trait BatchExt: Iterator + Sized {
    /// Group `Ok` items into batches of `size`, stopping at the first `Err`.
    fn try_batches<T, E>(self, size: usize) -> TryBatches<Self>
    where
        Self: Iterator<Item = Result<T, E>>,
    {
        TryBatches::new(self, size)
    }
}

impl<I: Iterator> BatchExt for I {}
