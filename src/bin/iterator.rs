use itertools::Itertools;
use patterns::prelude::*;
use std::collections::VecDeque;
use std::fmt;
use std::process::ExitCode;

// =============================================================================
// Role: explicit cursor with has_next / next / reset
// =============================================================================

/// External iterator over borrowed elements. Any number of cursors may be
/// open on one collection at a time; the borrow checker rules out mutating
/// the collection while one is alive.
trait Cursor<'a> {
    type Item: 'a;

    fn has_next(&self) -> bool;
    fn next_item(&mut self) -> Result<&'a Self::Item>;
    fn reset(&mut self);

    /// Bridge to `std::iter::Iterator` for use with adapters.
    fn adapt(self) -> CursorIter<'a, Self>
    where
        Self: Sized,
    {
        CursorIter(self, std::marker::PhantomData)
    }
}

struct CursorIter<'a, C>(C, std::marker::PhantomData<&'a ()>);

impl<'a, C: Cursor<'a>> Iterator for CursorIter<'a, C> {
    type Item = &'a C::Item;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_item().ok()
    }
}

fn exhausted() -> PatternError {
    PatternError::exhausted("iterate over")
}

struct ForwardCursor<'a, T> {
    items: &'a [T],
    position: usize,
}

impl<'a, T> ForwardCursor<'a, T> {
    fn new(items: &'a [T]) -> Self {
        Self { items, position: 0 }
    }
}

impl<'a, T> Cursor<'a> for ForwardCursor<'a, T> {
    type Item = T;

    fn has_next(&self) -> bool {
        self.position < self.items.len()
    }

    fn next_item(&mut self) -> Result<&'a T> {
        let item = self.items.get(self.position).ok_or_else(exhausted)?;
        self.position += 1;
        Ok(item)
    }

    fn reset(&mut self) {
        self.position = 0;
    }
}

struct ReverseCursor<'a, T> {
    items: &'a [T],
    remaining: usize,
}

impl<'a, T> ReverseCursor<'a, T> {
    fn new(items: &'a [T]) -> Self {
        Self {
            items,
            remaining: items.len(),
        }
    }
}

impl<'a, T> Cursor<'a> for ReverseCursor<'a, T> {
    type Item = T;

    fn has_next(&self) -> bool {
        self.remaining > 0
    }

    fn next_item(&mut self) -> Result<&'a T> {
        if self.remaining == 0 {
            return Err(exhausted());
        }
        self.remaining -= 1;
        Ok(&self.items[self.remaining])
    }

    fn reset(&mut self) {
        self.remaining = self.items.len();
    }
}

/// Keeps `position` parked on a matching element (or the end) after every
/// move, so `has_next` and `next_item` always agree.
struct FilteredCursor<'a, T> {
    items: &'a [T],
    predicate: Box<dyn Fn(&T) -> bool + 'a>,
    position: usize,
}

impl<'a, T> FilteredCursor<'a, T> {
    fn new(items: &'a [T], predicate: impl Fn(&T) -> bool + 'a) -> Self {
        let mut cursor = Self {
            items,
            predicate: Box::new(predicate),
            position: 0,
        };
        cursor.skip_rejected();
        cursor
    }

    fn skip_rejected(&mut self) {
        while self
            .items
            .get(self.position)
            .is_some_and(|item| !(self.predicate)(item))
        {
            self.position += 1;
        }
    }
}

impl<'a, T> Cursor<'a> for FilteredCursor<'a, T> {
    type Item = T;

    fn has_next(&self) -> bool {
        self.position < self.items.len()
    }

    fn next_item(&mut self) -> Result<&'a T> {
        let item = self.items.get(self.position).ok_or_else(exhausted)?;
        self.position += 1;
        self.skip_rejected();
        Ok(item)
    }

    fn reset(&mut self) {
        self.position = 0;
        self.skip_rejected();
    }
}

// =============================================================================
// Aggregates: book collection and classroom
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Book {
    title: String,
    author: String,
    year: u16,
}

impl Book {
    fn new(title: &str, author: &str, year: u16) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            year,
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" by {} ({})", self.title, self.author, self.year)
    }
}

struct BookCollection {
    books: Vec<Book>,
    out: Narrator,
}

impl BookCollection {
    fn new(out: &Narrator) -> Self {
        Self {
            books: Vec::new(),
            out: out.clone(),
        }
    }

    fn add_book(&mut self, book: Book) {
        narrate!(self.out, "📚 Added: {book}");
        self.books.push(book);
    }

    fn remove_book(&mut self, title: &str) -> Result<Book> {
        let index = self
            .books
            .iter()
            .position(|book| book.title == title)
            .ok_or_else(|| PatternError::not_found(format!("book \"{title}\"")))?;
        let removed = self.books.remove(index);
        narrate!(self.out, "🗑️ Removed: {removed}");
        Ok(removed)
    }

    fn create_iterator(&self) -> ForwardCursor<'_, Book> {
        ForwardCursor::new(&self.books)
    }

    fn len(&self) -> usize {
        self.books.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Student {
    name: String,
    grade: u8,
    subject: String,
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Grade: {}, Subject: {})", self.name, self.grade, self.subject)
    }
}

#[derive(Default)]
struct Classroom {
    students: Vec<Student>,
}

impl Classroom {
    fn enroll(&mut self, name: &str, grade: u8, subject: &str) -> Result<()> {
        if grade > 100 {
            return Err(PatternError::invalid_argument(format!(
                "grade {grade} for {name} is above 100"
            )));
        }
        self.students.push(Student {
            name: name.to_string(),
            grade,
            subject: subject.to_string(),
        });
        Ok(())
    }

    fn forward(&self) -> ForwardCursor<'_, Student> {
        ForwardCursor::new(&self.students)
    }

    fn reverse(&self) -> ReverseCursor<'_, Student> {
        ReverseCursor::new(&self.students)
    }

    fn high_grades(&self) -> FilteredCursor<'_, Student> {
        FilteredCursor::new(&self.students, |student| student.grade >= 90)
    }

    fn by_subject<'a>(&'a self, subject: &'a str) -> FilteredCursor<'a, Student> {
        FilteredCursor::new(&self.students, move |student| student.subject == subject)
    }
}

// =============================================================================
// Binary search tree with four traversal orders
// =============================================================================

struct Node<T> {
    value: T,
    left: Option<Box<Node<T>>>,
    right: Option<Box<Node<T>>>,
}

struct BinaryTree<T> {
    root: Option<Box<Node<T>>>,
    len: usize,
}

impl<T: Ord> BinaryTree<T> {
    fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Duplicates are ignored; returns whether the value was added.
    fn insert(&mut self, value: T) -> bool {
        let mut slot = &mut self.root;
        while let Some(node) = slot {
            slot = match value.cmp(&node.value) {
                std::cmp::Ordering::Less => &mut node.left,
                std::cmp::Ordering::Greater => &mut node.right,
                std::cmp::Ordering::Equal => return false,
            };
        }
        *slot = Some(Box::new(Node {
            value,
            left: None,
            right: None,
        }));
        self.len += 1;
        true
    }

    fn pre_order(&self) -> PreOrder<'_, T> {
        PreOrder {
            stack: self.root.as_deref().into_iter().collect(),
        }
    }

    fn in_order(&self) -> InOrder<'_, T> {
        let mut walk = InOrder { stack: Vec::new() };
        walk.push_left_spine(self.root.as_deref());
        walk
    }

    fn post_order(&self) -> PostOrder<'_, T> {
        PostOrder {
            stack: self.root.as_deref().map(|node| (node, false)).into_iter().collect(),
        }
    }

    fn breadth_first(&self) -> BreadthFirst<'_, T> {
        BreadthFirst {
            queue: self.root.as_deref().into_iter().collect(),
        }
    }
}

struct PreOrder<'a, T> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T> Iterator for PreOrder<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.stack.pop()?;
        self.stack.extend(node.right.as_deref());
        self.stack.extend(node.left.as_deref());
        Some(&node.value)
    }
}

struct InOrder<'a, T> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T> InOrder<'a, T> {
    fn push_left_spine(&mut self, mut node: Option<&'a Node<T>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, T> Iterator for InOrder<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(&node.value)
    }
}

/// Each node is pushed twice: once to expand its children, once to emit.
struct PostOrder<'a, T> {
    stack: Vec<(&'a Node<T>, bool)>,
}

impl<'a, T> Iterator for PostOrder<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        while let Some((node, expanded)) = self.stack.pop() {
            if expanded {
                return Some(&node.value);
            }
            self.stack.push((node, true));
            if let Some(right) = node.right.as_deref() {
                self.stack.push((right, false));
            }
            if let Some(left) = node.left.as_deref() {
                self.stack.push((left, false));
            }
        }
        None
    }
}

struct BreadthFirst<'a, T> {
    queue: VecDeque<&'a Node<T>>,
}

impl<'a, T> Iterator for BreadthFirst<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.queue.pop_front()?;
        self.queue.extend(node.left.as_deref());
        self.queue.extend(node.right.as_deref());
        Some(&node.value)
    }
}

// =============================================================================
// Number sequence: a lazy range with a step
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NumberSequence {
    start: i64,
    end: i64,
    step: i64,
}

impl NumberSequence {
    /// Half-open `[start, end)`, counting up or down by `step`.
    fn new(start: i64, end: i64, step: i64) -> Result<Self> {
        if step == 0 {
            return Err(PatternError::invalid_argument("step must not be zero"));
        }
        Ok(Self { start, end, step })
    }
}

impl IntoIterator for NumberSequence {
    type Item = i64;
    type IntoIter = SequenceIter;

    fn into_iter(self) -> SequenceIter {
        SequenceIter {
            next: self.start,
            end: self.end,
            step: self.step,
        }
    }
}

struct SequenceIter {
    next: i64,
    end: i64,
    step: i64,
}

impl Iterator for SequenceIter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let in_range = if self.step > 0 {
            self.next < self.end
        } else {
            self.next > self.end
        };
        if !in_range {
            return None;
        }
        let current = self.next;
        self.next += self.step;
        Some(current)
    }
}

// =============================================================================
// Demo (cargo run --bin iterator)
// =============================================================================

fn book_demo(out: &Narrator) -> Result<()> {
    out.section(1, "Traditional Iterator Pattern - Book Collection");

    let mut library = BookCollection::new(out);
    library.add_book(Book::new("1984", "George Orwell", 1949));
    library.add_book(Book::new("To Kill a Mockingbird", "Harper Lee", 1960));
    library.add_book(Book::new("The Great Gatsby", "F. Scott Fitzgerald", 1925));
    library.add_book(Book::new("Pride and Prejudice", "Jane Austen", 1813));

    out.blank();
    out.say("Iterating through books:");
    let mut cursor = library.create_iterator();
    while cursor.has_next() {
        narrate!(out, "📖 {}", cursor.next_item()?);
    }
    cursor.next_item().or_narrate(out)?;

    out.blank();
    out.say("Two cursors at once:");
    let mut fast = library.create_iterator();
    let mut slow = library.create_iterator();
    fast.next_item()?;
    fast.next_item()?;
    narrate!(out, "fast is at {}, slow is at {}", fast.next_item()?.title, slow.next_item()?.title);
    fast.reset();
    narrate!(out, "after reset fast starts over at {}", fast.next_item()?.title);

    out.blank();
    narrate!(out, "Total books: {}", library.len());
    library.remove_book("The Great Gatsby")?;
    library.remove_book("Moby Dick").or_narrate(out)?;
    narrate!(out, "Books left: {}", library.len());
    Ok(())
}

fn classroom_demo(out: &Narrator) -> Result<()> {
    out.section(2, "Different Iterator Types - Classroom");

    let mut room = Classroom::default();
    for (name, grade, subject) in [
        ("Alice", 95, "Math"),
        ("Bob", 87, "Science"),
        ("Charlie", 92, "Math"),
        ("Diana", 78, "English"),
        ("Eve", 96, "Science"),
    ] {
        room.enroll(name, grade, subject)?;
        narrate!(out, "👨‍🎓 Added student: {name} (Grade: {grade}, Subject: {subject})");
    }
    room.enroll("Mallory", 140, "Math").or_narrate(out)?;

    out.blank();
    out.say("Forward iteration:");
    for student in room.forward().adapt() {
        narrate!(out, "👨‍🎓 {student}");
    }

    out.blank();
    out.say("Reverse iteration:");
    let mut reverse = room.reverse();
    while reverse.has_next() {
        narrate!(out, "👩‍🎓 {}", reverse.next_item()?);
    }

    out.blank();
    out.say("High grade students (>=90):");
    for student in room.high_grades().adapt() {
        narrate!(out, "🏆 {student}");
    }

    out.blank();
    out.say("Math students only:");
    let mut math = room.by_subject("Math");
    while math.has_next() {
        narrate!(out, "📐 {}", math.next_item()?);
    }
    let average = room.by_subject("Science").adapt().map(|s| f64::from(s.grade)).sum::<f64>()
        / room.by_subject("Science").adapt().count().max(1) as f64;
    narrate!(out, "Science average: {average:.1}");
    Ok(())
}

fn tree_demo(out: &Narrator) {
    out.section(3, "Tree Traversal Iterators");

    let mut tree = BinaryTree::new();
    for value in [50, 30, 70, 20, 40, 60, 80, 30] {
        if !tree.insert(value) {
            narrate!(out, "Skipped duplicate {value}");
        }
    }
    out.say("Tree structure:");
    out.say("        50");
    out.say("      /    \\");
    out.say("    30      70");
    out.say("   /  \\    /  \\");
    out.say("  20  40  60  80");

    out.blank();
    narrate!(out, "Nodes: {}", tree.len);
    narrate!(out, "Pre-order:     {}", tree.pre_order().join(" "));
    narrate!(out, "In-order:      {}", tree.in_order().join(" "));
    narrate!(out, "Post-order:    {}", tree.post_order().join(" "));
    narrate!(out, "Breadth-first: {}", tree.breadth_first().join(" "));
    narrate!(
        out,
        "Values below 45 (in-order, filtered): {}",
        tree.in_order().filter(|v| **v < 45).join(", ")
    );
}

fn sequence_demo(out: &Narrator) -> Result<()> {
    out.section(4, "Number Sequences and Iterator Adapters");

    let squares: Vec<i64> = NumberSequence::new(1, 11, 1)?.into_iter().map(|n| n * n).collect();
    narrate!(out, "Squares: {}", squares.iter().join(" "));
    narrate!(out, "Sum: {}", squares.iter().sum::<i64>());
    narrate!(out, "Count > 25: {}", squares.iter().filter(|n| **n > 25).count());
    narrate!(
        out,
        "Gaps between squares: {}",
        squares.iter().tuple_windows().map(|(a, b)| b - a).join(" ")
    );

    out.blank();
    let countdown = NumberSequence::new(10, 0, -3)?;
    narrate!(out, "Countdown by 3: {}", countdown.into_iter().join(" "));
    let mut evens = NumberSequence::new(1, 11, 1)?.into_iter().filter(|n| n % 2 == 0);
    narrate!(out, "Even numbers only: {}", evens.join(" "));
    let mut above_five = NumberSequence::new(1, 11, 1)?.into_iter().filter(|n| *n > 5);
    narrate!(out, "Numbers > 5: {}", above_five.join(" "));

    NumberSequence::new(0, 10, 0).or_narrate(out)?;

    out.blank();
    out.say("Working with standard containers:");
    let fruits = ["apple", "banana", "cherry", "date", "elderberry"];
    for fruit in &fruits {
        narrate!(out, "🍎 {fruit}");
    }
    narrate!(out, "Reversed: {}", fruits.iter().rev().join(", "));
    let long_words = fruits.iter().filter(|f| f.len() > 5).count();
    narrate!(out, "Words longer than 5 characters: {long_words}");
    if let Some(position) = fruits.iter().position(|f| *f == "cherry") {
        narrate!(out, "Found 'cherry' at position: {position}");
    }
    Ok(())
}

fn main() -> ExitCode {
    patterns::runner::run("Iterator", |out, _config| {
        book_demo(out)?;
        classroom_demo(out)?;
        tree_demo(out);
        sequence_demo(out)?;

        out.section(5, "Iterator Pattern Benefits");
        out.checklist(&[
            "Provides uniform interface for traversing collections",
            "Supports multiple simultaneous traversals",
            "Decouples algorithms from data structures",
            "Supports different traversal strategies",
            "Composes with the standard iterator adapters",
        ]);
        Ok(())
    })
}

// =============================================================================
// Tests (cargo test --bin iterator)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_room() -> Classroom {
        let mut room = Classroom::default();
        room.enroll("A", 95, "Math").unwrap();
        room.enroll("B", 50, "Math").unwrap();
        room.enroll("C", 91, "Art").unwrap();
        room.enroll("D", 10, "Art").unwrap();
        room
    }

    fn names<'a>(cursor: impl Cursor<'a, Item = Student>) -> Vec<&'a str> {
        cursor.adapt().map(|s| s.name.as_str()).collect()
    }

    fn sample_tree() -> BinaryTree<i32> {
        let mut tree = BinaryTree::new();
        for value in [50, 30, 70, 20, 40, 60, 80] {
            tree.insert(value);
        }
        tree
    }

    #[test]
    fn test_forward_cursor_exhausts_then_resets() {
        let items = [1, 2];
        let mut cursor = ForwardCursor::new(&items);
        assert_eq!(*cursor.next_item().unwrap(), 1);
        assert_eq!(*cursor.next_item().unwrap(), 2);
        assert!(!cursor.has_next());
        let err = cursor.next_item().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Exhausted);
        cursor.reset();
        assert_eq!(*cursor.next_item().unwrap(), 1);
    }

    #[test]
    fn test_reverse_and_filtered_orders() {
        let room = sample_room();
        assert_eq!(names(room.reverse()), vec!["D", "C", "B", "A"]);
        assert_eq!(names(room.high_grades()), vec!["A", "C"]);
        assert_eq!(names(room.by_subject("Art")), vec!["C", "D"]);
        assert!(names(room.by_subject("History")).is_empty());
    }

    #[test]
    fn test_filtered_has_next_agrees_with_next() {
        let items = [1, 3, 5, 6];
        let mut cursor = FilteredCursor::new(&items, |n| n % 2 == 0);
        assert!(cursor.has_next());
        assert_eq!(*cursor.next_item().unwrap(), 6);
        assert!(!cursor.has_next());
        assert!(cursor.next_item().is_err());

        let none = [1, 3];
        let cursor = FilteredCursor::new(&none, |n| n % 2 == 0);
        assert!(!cursor.has_next());
    }

    #[test]
    fn test_independent_cursors() {
        let room = sample_room();
        let mut first = room.forward();
        let mut second = room.forward();
        first.next_item().unwrap();
        first.next_item().unwrap();
        assert_eq!(second.next_item().unwrap().name, "A");
        assert_eq!(first.next_item().unwrap().name, "C");
    }

    #[test]
    fn test_grade_above_hundred_is_rejected() {
        let mut room = Classroom::default();
        let err = room.enroll("X", 101, "Math").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(room.students.is_empty());
    }

    #[test]
    fn test_remove_missing_book_is_not_found() {
        let out = Narrator::capture();
        let mut library = BookCollection::new(&out);
        library.add_book(Book::new("1984", "George Orwell", 1949));
        assert_eq!(library.remove_book("Dune").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(library.remove_book("1984").unwrap().year, 1949);
        assert_eq!(library.len(), 0);
    }

    #[test]
    fn test_tree_traversals() {
        let tree = sample_tree();
        fn walk<'a>(order: impl Iterator<Item = &'a i32>) -> Vec<i32> {
            order.copied().collect()
        }
        assert_eq!(walk(tree.pre_order()), vec![50, 30, 20, 40, 70, 60, 80]);
        assert_eq!(walk(tree.in_order()), vec![20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(walk(tree.post_order()), vec![20, 40, 30, 60, 80, 70, 50]);
        assert_eq!(walk(tree.breadth_first()), vec![50, 30, 70, 20, 40, 60, 80]);
    }

    #[test]
    fn test_empty_tree_and_duplicates() {
        let mut tree: BinaryTree<i32> = BinaryTree::new();
        assert_eq!(tree.pre_order().count(), 0);
        assert_eq!(tree.post_order().count(), 0);
        assert!(tree.insert(1));
        assert!(!tree.insert(1));
        assert_eq!(tree.len, 1);
    }

    #[test]
    fn test_sequences() {
        let up: Vec<i64> = NumberSequence::new(0, 10, 3).unwrap().into_iter().collect();
        assert_eq!(up, vec![0, 3, 6, 9]);
        let down: Vec<i64> = NumberSequence::new(10, 0, -4).unwrap().into_iter().collect();
        assert_eq!(down, vec![10, 6, 2]);
        assert_eq!(NumberSequence::new(5, 5, 1).unwrap().into_iter().count(), 0);
        assert!(NumberSequence::new(0, 1, 0).is_err());
    }

    #[test]
    fn test_demo_runs() {
        let out = Narrator::capture();
        book_demo(&out).unwrap();
        classroom_demo(&out).unwrap();
        tree_demo(&out);
        sequence_demo(&out).unwrap();
        assert!(out.contains("❌ Nothing to iterate over"));
        assert!(out.contains("fast is at The Great Gatsby, slow is at 1984"));
        assert!(out.contains("❌ Not found: book \"Moby Dick\""));
        assert!(out.contains("Science average: 91.5"));
        assert!(out.contains("In-order:      20 30 40 50 60 70 80"));
        assert!(out.contains("Sum: 385"));
        assert!(out.contains("Countdown by 3: 10 7 4 1"));
    }

    proptest! {
        #[test]
        fn prop_in_order_is_sorted_and_deduplicated(
            values in prop::collection::vec(-100i32..100, 0..60),
        ) {
            let mut tree = BinaryTree::new();
            for value in &values {
                tree.insert(*value);
            }
            let walked: Vec<i32> = tree.in_order().copied().collect();
            let expected: Vec<i32> = values.iter().copied().sorted().dedup().collect();
            prop_assert_eq!(&walked, &expected);
            prop_assert_eq!(tree.pre_order().count(), expected.len());
            prop_assert_eq!(tree.post_order().count(), expected.len());
            prop_assert_eq!(tree.breadth_first().count(), expected.len());
        }

        #[test]
        fn prop_filtered_cursor_matches_std_filter(
            values in prop::collection::vec(0u8..20, 0..50),
        ) {
            let cursor = FilteredCursor::new(&values, |n| n % 3 == 0);
            let walked: Vec<u8> = cursor.adapt().copied().collect();
            let expected: Vec<u8> = values.iter().copied().filter(|n| n % 3 == 0).collect();
            prop_assert_eq!(walked, expected);
        }
    }
}
