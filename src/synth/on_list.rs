/// Pool indices of key-on voices, oldest first.
///
/// A fixed-capacity ring: storage is allocated once at construction and
/// never grows, so every operation is safe on the render path. Front is the
/// voice that has been on the longest (the steal candidate), back is the one
/// triggered most recently.
#[derive(Debug, Clone)]
pub struct OnList {
    slots: Box<[usize]>,
    head: usize,
    len: usize,
}

impl OnList {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    #[inline]
    fn slot(&self, pos: usize) -> usize {
        (self.head + pos) % self.slots.len()
    }

    /// Append as newest. Returns false, leaving the list unchanged, when full.
    pub fn push_back(&mut self, index: usize) -> bool {
        if self.is_full() {
            return false;
        }
        let slot = self.slot(self.len);
        self.slots[slot] = index;
        self.len += 1;
        true
    }

    /// Remove and return the oldest entry.
    pub fn pop_front(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let index = self.slots[self.head];
        self.head = (self.head + 1) % self.slots.len();
        self.len -= 1;
        Some(index)
    }

    pub fn front(&self) -> Option<usize> {
        self.get(0)
    }

    pub fn back(&self) -> Option<usize> {
        self.len.checked_sub(1).and_then(|pos| self.get(pos))
    }

    /// Entry at `pos`, counting from the oldest.
    pub fn get(&self, pos: usize) -> Option<usize> {
        (pos < self.len).then(|| self.slots[self.slot(pos)])
    }

    pub fn contains(&self, index: usize) -> bool {
        self.iter().any(|i| i == index)
    }

    /// Remove `index` wherever it sits, keeping the order of the rest.
    pub fn remove(&mut self, index: usize) -> bool {
        let Some(pos) = self.iter().position(|i| i == index) else {
            return false;
        };
        for p in pos..self.len - 1 {
            let (dst, src) = (self.slot(p), self.slot(p + 1));
            self.slots[dst] = self.slots[src];
        }
        self.len -= 1;
        true
    }

    /// Keep only entries for which `keep` returns true, preserving order.
    pub fn retain(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let mut kept = 0;
        for pos in 0..self.len {
            let index = self.slots[self.slot(pos)];
            if keep(index) {
                let dst = self.slot(kept);
                self.slots[dst] = index;
                kept += 1;
            }
        }
        self.len = kept;
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).map(move |pos| self.slots[self.slot(pos)])
    }
}
