//! Tag store iteration

use crate::codec::{Cursor, IndicatorCodec};
use crate::error::Result;
use crate::storage::Storage;

use super::TagStore;

/// Forward iterator over `(tag, value)` pairs
///
/// Holds the store mutably so the current pair can be removed in place with
/// [`TagIter::remove_current`]. Stops after the first error.
pub struct TagIter<'a, S, C> {
    store: &'a mut TagStore<S, C>,
    cursor: Cursor,
    /// Start of the pair most recently returned by `next`
    current: Option<u64>,
    done: bool,
}

impl<'a, S: Storage, C: IndicatorCodec> TagIter<'a, S, C> {
    pub(crate) fn new(store: &'a mut TagStore<S, C>) -> Self {
        Self {
            store,
            cursor: Cursor::new(),
            current: None,
            done: false,
        }
    }

    /// Remove the pair last returned by `next`; iteration continues with the
    /// pair that followed it. Returns false if there is nothing to remove.
    pub fn remove_current(&mut self) -> Result<bool> {
        let Some(start) = self.current.take() else {
            return Ok(false);
        };
        self.store.remove_range(start, self.cursor.offset())?;
        self.cursor.seek(start);
        Ok(true)
    }

    /// Offset of the next pair
    pub fn offset(&self) -> u64 {
        self.cursor.offset()
    }
}

impl<S: Storage, C: IndicatorCodec> Iterator for TagIter<'_, S, C> {
    type Item = Result<(String, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.current = None;

        let pair = match self.store.pair_at(self.cursor.offset()) {
            Ok(Some(pair)) => pair,
            Ok(None) => return None,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        match self.store.read_pair(&pair) {
            Ok(entry) => {
                self.current = Some(pair.start());
                self.cursor.seek(pair.end());
                Some(Ok(entry))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
