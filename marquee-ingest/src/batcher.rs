//! Fixed-size row grouping
//!
//! Wraps a fallible row stream and yields owned batches of at most
//! `batch_size` rows. Every batch but the last is full; an empty stream yields
//! no batch at all. An error from the underlying stream is passed through once
//! and ends the sequence; rows gathered before it are dropped with it.

use std::num::NonZeroUsize;

pub struct Batches<I> {
    rows: I,
    batch_size: NonZeroUsize,
    done: bool,
}

impl<I> Batches<I> {
    pub fn new(rows: I, batch_size: NonZeroUsize) -> Self {
        Self {
            rows,
            batch_size,
            done: false,
        }
    }
}

impl<I, T, E> Iterator for Batches<I>
where
    I: Iterator<Item = Result<T, E>>,
{
    type Item = Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size.get());
        while batch.len() < self.batch_size.get() {
            match self.rows.next() {
                Some(Ok(row)) => batch.push(row),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
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

/// `.batched(n)` on any fallible row stream
pub trait BatchExt: Iterator + Sized {
    fn batched(self, batch_size: NonZeroUsize) -> Batches<Self> {
        Batches::new(self, batch_size)
    }
}

impl<I: Iterator> BatchExt for I {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn rows(n: usize) -> impl Iterator<Item = Result<usize, String>> {
        (0..n).map(Ok)
    }

    #[test]
    fn test_full_batches_then_remainder() {
        let sizes: Vec<usize> = rows(4500)
            .batched(size(2000))
            .map(|b| b.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2000, 2000, 500]);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_batch() {
        let sizes: Vec<usize> = rows(4000)
            .batched(size(2000))
            .map(|b| b.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2000, 2000]);
    }

    #[test]
    fn test_rows_are_pulled_one_batch_at_a_time() {
        let pulled = Cell::new(0usize);
        let mut batches = rows(4500)
            .inspect(|_| pulled.set(pulled.get() + 1))
            .batched(size(2000));

        assert_eq!(pulled.get(), 0);
        assert_eq!(batches.next().unwrap().unwrap().len(), 2000);
        assert_eq!(pulled.get(), 2000);
        assert_eq!(batches.next().unwrap().unwrap().len(), 2000);
        assert_eq!(pulled.get(), 4000);
    }

    #[test]
    fn test_empty_stream_yields_no_batch() {
        assert_eq!(rows(0).batched(size(3)).count(), 0);
    }

    #[test]
    fn test_order_is_preserved() {
        let flattened: Vec<usize> = rows(7)
            .batched(size(3))
            .flat_map(|b| b.unwrap())
            .collect();
        assert_eq!(flattened, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_error_ends_sequence() {
        let source = vec![Ok(1), Ok(2), Err("boom".to_string()), Ok(3)].into_iter();
        let batches: Vec<Result<Vec<i32>, String>> = source.batched(size(2)).collect();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], Ok(vec![1, 2]));
        assert_eq!(batches[1], Err("boom".to_string()));
    }
}
