/// Two fixed-size sample slots written alternately.
///
/// Exactly one slot is active (writable) at a time. When the active slot
/// fills up the slots swap, and the filled one is exposed through
/// [`completed_block`](Self::completed_block) until the next write.
///
/// No internal locking: the capture thread owns the buffer outright.
#[derive(Debug)]
pub struct DoubleBuffer {
    slots: [Box<[i16]>; 2],
    active: usize,
    write_offset: usize,
    completed: Option<usize>,
}

/// Result of [`DoubleBuffer::write_into`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Samples consumed from the input.
    pub accepted: usize,
    /// Whether the active slot filled up with this write.
    pub completed: bool,
}

impl DoubleBuffer {
    /// Panics if `block_size` is zero; `CaptureConfig::validate` rejects that.
    pub fn new(block_size: usize) -> Self {
        assert!(block_size > 0, "block size must be positive");
        Self {
            slots: [
                vec![0; block_size].into_boxed_slice(),
                vec![0; block_size].into_boxed_slice(),
            ],
            active: 0,
            write_offset: 0,
            completed: None,
        }
    }

    pub fn block_size(&self) -> usize {
        self.slots[0].len()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    /// Samples still needed to complete the active slot.
    pub fn remaining_space(&self) -> usize {
        self.block_size() - self.write_offset
    }

    /// Unwritten tail of the active slot, for reading device data in place.
    ///
    /// Follow with [`commit`](Self::commit) to account for what was written.
    pub fn spare_mut(&mut self) -> &mut [i16] {
        let offset = self.write_offset;
        &mut self.slots[self.active][offset..]
    }

    /// Advance the write cursor by `count` samples written via
    /// [`spare_mut`](Self::spare_mut). Returns `true` when the slot completed.
    ///
    /// `count` is clamped to the remaining space.
    pub fn commit(&mut self, count: usize) -> bool {
        self.completed = None;
        self.write_offset += count.min(self.remaining_space());
        if self.write_offset < self.block_size() {
            return false;
        }

        self.completed = Some(self.active);
        self.active ^= 1;
        self.write_offset = 0;
        true
    }

    /// Append up to `remaining_space()` samples from `samples`.
    pub fn write_into(&mut self, samples: &[i16]) -> WriteOutcome {
        let accepted = samples.len().min(self.remaining_space());
        self.spare_mut()[..accepted].copy_from_slice(&samples[..accepted]);
        let completed = self.commit(accepted);
        WriteOutcome { accepted, completed }
    }

    /// The slot that filled on the most recent write, if that write completed one.
    pub fn completed_block(&self) -> Option<&[i16]> {
        self.completed.map(|index| &*self.slots[index])
    }
}
