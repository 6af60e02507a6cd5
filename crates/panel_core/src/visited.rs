use std::collections::{HashSet, VecDeque};

/// Upper bound on tracked URLs; keeps the ephemeral background process
/// from accumulating unbounded state.
pub const MAX_VISITED: usize = 100;

/// Bounded set of visited URLs with FIFO eviction.
///
/// Insertion order is the only order: revisiting a cached URL does not
/// refresh its position (deliberately FIFO-on-insert, not LRU — the
/// observed variants of this behavior disagree, and this contract fixes
/// the simpler one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitedCache {
    order: VecDeque<String>,
    members: HashSet<String>,
    capacity: usize,
}

impl Default for VisitedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitedCache {
    pub fn new() -> Self {
        Self::with_capacity(MAX_VISITED)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// O(1) membership test.
    pub fn has(&self, url: &str) -> bool {
        self.members.contains(url)
    }

    /// Records a visit, returning whether `url` was already present
    /// before this call. New URLs are appended, evicting the oldest
    /// entry first when at capacity.
    pub fn record_visit(&mut self, url: &str) -> bool {
        if self.members.contains(url) {
            return true;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.order.push_back(url.to_string());
        self.members.insert(url.to_string());
        false
    }

    /// Drops every cached URL that no open tab holds any more, keeping
    /// the insertion order of the survivors intact.
    pub fn evict_closed_tabs(&mut self, open_urls: &HashSet<String>) {
        self.order.retain(|url| open_urls.contains(url));
        self.members.retain(|url| open_urls.contains(url));
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Oldest entry still cached, i.e. the next eviction candidate.
    pub fn oldest(&self) -> Option<&str> {
        self.order.front().map(String::as_str)
    }
}
