use std::collections::VecDeque;

/// Undo/redo stack pair used by command managers and memento caretakers.
///
/// The back of `undo` is the most recent entry. With a capacity set, the
/// oldest undo entry is evicted once the limit is exceeded.
#[derive(Debug)]
pub struct History<T> {
    undo: VecDeque<T>,
    redo: Vec<T>,
    capacity: Option<usize>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> History<T> {
    pub fn new() -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            capacity: None,
        }
    }

    pub fn bounded(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            ..Self::new()
        }
    }

    /// Push a fresh entry: clears redo and returns whatever was evicted.
    pub fn record(&mut self, item: T) -> Option<T> {
        self.redo.clear();
        self.push_undo(item)
    }

    /// Re-push onto undo without touching redo (used by redo itself).
    pub fn push_undo(&mut self, item: T) -> Option<T> {
        self.undo.push_back(item);
        match self.capacity {
            Some(limit) if self.undo.len() > limit => self.undo.pop_front(),
            _ => None,
        }
    }

    pub fn pop_undo(&mut self) -> Option<T> {
        self.undo.pop_back()
    }

    pub fn push_redo(&mut self, item: T) {
        self.redo.push(item);
    }

    pub fn pop_redo(&mut self) -> Option<T> {
        self.redo.pop()
    }

    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    pub fn peek_undo(&self) -> Option<&T> {
        self.undo.back()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        history.record(1);
        history.record(2);
        let top = history.pop_undo().unwrap();
        history.push_redo(top);
        assert_eq!(history.redo_len(), 1);

        history.record(3);
        assert_eq!(history.redo_len(), 0);
        assert_eq!(history.peek_undo(), Some(&3));
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let mut history = History::bounded(2);
        assert_eq!(history.record('a'), None);
        assert_eq!(history.record('b'), None);
        assert_eq!(history.record('c'), Some('a'));
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.pop_undo(), Some('c'));
        assert_eq!(history.pop_undo(), Some('b'));
        assert_eq!(history.pop_undo(), None);
    }

    #[test]
    fn test_push_undo_keeps_redo() {
        let mut history = History::new();
        history.push_redo(1);
        history.push_redo(2);
        let item = history.pop_redo().unwrap();
        history.push_undo(item);
        assert_eq!(history.redo_len(), 1);
        assert_eq!(history.undo_len(), 1);
    }

    #[test]
    fn test_empty_pops_are_none() {
        let mut history: History<u8> = History::default();
        assert!(history.pop_undo().is_none());
        assert!(history.pop_redo().is_none());
        history.record(1);
        history.clear();
        assert_eq!(history.undo_len(), 0);
    }
}
