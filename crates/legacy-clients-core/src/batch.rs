use crate::error::{LoaderError, Result};

/// A bounded group of items written or serialized as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    /// 1-based position of this batch in the run.
    pub sequence: usize,
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Buffers items and hands them out in fixed-size batches, preserving the
/// order they were pushed in.
#[derive(Debug)]
pub struct BatchAccumulator<T> {
    threshold: usize,
    buffer: Vec<T>,
    flushed: usize,
}

impl<T> BatchAccumulator<T> {
    pub fn new(threshold: usize) -> Result<Self> {
        if threshold == 0 {
            return Err(LoaderError::Config("batch threshold must be at least 1".into()));
        }
        Ok(Self {
            threshold,
            buffer: Vec::with_capacity(threshold),
            flushed: 0,
        })
    }

    /// Add an item; returns a full batch once the threshold is reached.
    pub fn push(&mut self, item: T) -> Option<Batch<T>> {
        self.buffer.push(item);
        if self.buffer.len() >= self.threshold {
            Some(self.take())
        } else {
            None
        }
    }

    /// Flush whatever is buffered, even a partial batch.
    pub fn finish(&mut self) -> Option<Batch<T>> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.take())
        }
    }

    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn batches_flushed(&self) -> usize {
        self.flushed
    }

    fn take(&mut self) -> Batch<T> {
        self.flushed += 1;
        let items = std::mem::replace(&mut self.buffer, Vec::with_capacity(self.threshold));
        Batch {
            sequence: self.flushed,
            items,
        }
    }
}
