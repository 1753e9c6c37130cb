// Sun Oct 18 2026 - Alex

use crate::memory::Address;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct MemoryRange {
    start: Address,
    end: Address,
}

impl MemoryRange {
    pub fn new(start: Address, end: Address) -> Self {
        let end = if end < start { start } else { end };
        Self { start, end }
    }

    pub fn from_start_size(start: Address, size: u64) -> Self {
        Self::new(start, Address::new(start.as_u64().saturating_add(size)))
    }

    pub fn start(&self) -> Address {
        self.start
    }

    pub fn end(&self) -> Address {
        self.end
    }

    pub fn size(&self) -> u64 {
        self.end.as_u64() - self.start.as_u64()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn contains(&self, addr: Address) -> bool {
        addr >= self.start && addr < self.end
    }

    pub fn contains_span(&self, addr: Address, len: u64) -> bool {
        self.contains(addr)
            && addr
                .as_u64()
                .checked_add(len)
                .map_or(false, |end| end <= self.end.as_u64())
    }

    /// Start addresses of consecutive `stride`-sized entries; a trailing partial
    /// entry is not yielded.
    pub fn entries(&self, stride: u64) -> Entries {
        let remaining = if stride == 0 { 0 } else { self.size() / stride };
        Entries {
            next: self.start,
            stride,
            remaining,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entries {
    next: Address,
    stride: u64,
    remaining: u64,
}

impl Iterator for Entries {
    type Item = Address;

    fn next(&mut self) -> Option<Address> {
        if self.remaining == 0 {
            return None;
        }
        let entry = self.next;
        self.next = entry + self.stride;
        self.remaining -= 1;
        Some(entry)
    }
}

impl fmt::Display for MemoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
