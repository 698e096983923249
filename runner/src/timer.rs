//! Cooperative timers advanced by the tick loop.
//!
//! Nothing here runs on its own: [`TimerQueue::advance`] is called once per tick with the
//! elapsed time and returns the kinds that came due, in due order. The caller reacts to
//! them synchronously within the same tick.

/// Shortest allowed repeat period. Guards `advance` against spinning on a zero period.
const MIN_PERIOD: f64 = 1.0e-3;

/// Tolerance for "due now" comparisons on accumulated time.
const DUE_EPS: f64 = 1.0e-9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct Entry<K> {
    id: TimerId,
    due: f64,
    period: Option<f64>,
    kind: K,
}

#[derive(Clone, Debug)]
pub struct TimerQueue<K> {
    now: f64,
    next_id: u64,
    entries: Vec<Entry<K>>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            now: 0.0,
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<K: Clone> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds advanced since the queue was created.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, delay: f32, period: Option<f64>, kind: K) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            due: self.now + f64::from(delay.max(0.0)),
            period,
            kind,
        });
        id
    }

    /// Fire `kind` once, `delay` seconds from now.
    pub fn schedule_once(&mut self, delay: f32, kind: K) -> TimerId {
        self.insert(delay, None, kind)
    }

    /// Fire `kind` after `delay`, then every `period` seconds until cancelled.
    pub fn schedule_repeating(&mut self, delay: f32, period: f32, kind: K) -> TimerId {
        self.insert(delay, Some(f64::from(period).max(MIN_PERIOD)), kind)
    }

    /// Returns whether the timer was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Cancel every pending timer whose kind matches. Returns how many were cancelled.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.kind));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_pending(&self, mut pred: impl FnMut(&K) -> bool) -> bool {
        self.entries.iter().any(|e| pred(&e.kind))
    }

    /// Advance time by `dt` and collect everything that came due.
    ///
    /// Firings are ordered by due time, ties by scheduling order. A repeating timer
    /// fires once for every period covered by `dt`.
    pub fn advance(&mut self, dt: f32) -> Vec<K> {
        self.now += f64::from(dt.max(0.0));
        let now = self.now + DUE_EPS;

        let mut fired: Vec<(f64, TimerId, K)> = Vec::new();
        self.entries.retain_mut(|entry| {
            while entry.due <= now {
                fired.push((entry.due, entry.id, entry.kind.clone()));
                match entry.period {
                    Some(period) => entry.due += period,
                    None => return false,
                }
            }
            true
        });

        fired.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        fired.into_iter().map(|(_, _, kind)| kind).collect()
    }
}
