use crate::error::QueueError;
use std::cmp::Ordering;

/// Binary min-heap ordered by a caller-supplied comparator. Equal elements
/// come out in no particular order.
pub struct PriorityQueue<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    items: Vec<T>,
    compare: F,
}

impl<T, F> PriorityQueue<T, F>
where
    F: Fn(&T, &T) -> Ordering,
{
    pub fn new(compare: F) -> PriorityQueue<T, F> {
        PriorityQueue { items: Vec::new(), compare }
    }

    pub fn with_capacity(capacity: usize, compare: F) -> PriorityQueue<T, F> {
        PriorityQueue {
            items: Vec::with_capacity(capacity),
            compare,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn peek(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn enqueue(&mut self, item: T) {
        self.items.push(item);
        self.sift_up(self.items.len() - 1);
    }

    pub fn dequeue(&mut self) -> Result<T, QueueError> {
        if self.items.is_empty() {
            return Err(QueueError::Empty);
        }

        let last = self.items.len() - 1;
        self.items.swap(0, last);

        let item = self.items.pop().ok_or(QueueError::Empty)?;

        if !self.items.is_empty() {
            self.sift_down(0);
        }

        Ok(item)
    }

    fn less(&self, a: usize, b: usize) -> bool {
        (self.compare)(&self.items[a], &self.items[b]) == Ordering::Less
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;

            if !self.less(index, parent) {
                break;
            }

            self.items.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.items.len();

        loop {
            let left = 2 * index + 1;
            let right = left + 1;

            if left >= len {
                break;
            }

            // Ties go to the left child.
            let child = if right < len && self.less(right, left) { right } else { left };

            if !self.less(child, index) {
                break;
            }

            self.items.swap(index, child);
            index = child;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_dequeue_fails() {
        let mut queue = PriorityQueue::new(|a: &u32, b: &u32| a.cmp(b));

        assert_eq!(queue.dequeue(), Err(QueueError::Empty));

        queue.enqueue(3);
        assert_eq!(queue.dequeue(), Ok(3));
        assert_eq!(queue.dequeue(), Err(QueueError::Empty));
    }

    #[test]
    fn comparator_decides_order() {
        let mut queue = PriorityQueue::new(|a: &(u32, char), b: &(u32, char)| b.0.cmp(&a.0));

        for item in [(1, 'a'), (5, 'b'), (3, 'c')] {
            queue.enqueue(item);
        }

        assert_eq!(queue.peek(), Some(&(5, 'b')));
        assert_eq!(queue.dequeue().unwrap().1, 'b');
        assert_eq!(queue.dequeue().unwrap().1, 'c');
        assert_eq!(queue.dequeue().unwrap().1, 'a');
    }

    #[derive(Clone, Debug)]
    enum Op {
        Push(i32),
        Pop,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(-50i32..50).prop_map(Op::Push), Just(Op::Pop)]
    }

    proptest! {
        #[test]
        fn matches_sorted_model(ops in prop::collection::vec(op(), 0..200)) {
            let mut queue = PriorityQueue::new(|a: &i32, b: &i32| a.cmp(b));
            let mut model: Vec<i32> = Vec::new();

            for op in ops {
                match op {
                    Op::Push(value) => {
                        queue.enqueue(value);
                        model.push(value);
                    }
                    Op::Pop => {
                        model.sort_unstable_by(|a, b| b.cmp(a));
                        match model.pop() {
                            Some(expected) => prop_assert_eq!(queue.dequeue(), Ok(expected)),
                            None => prop_assert_eq!(queue.dequeue(), Err(QueueError::Empty)),
                        }
                    }
                }
            }

            let mut previous = i32::MIN;
            while let Ok(value) = queue.dequeue() {
                prop_assert!(value >= previous);
                previous = value;
            }
        }
    }
}
