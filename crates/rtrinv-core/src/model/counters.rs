// # Interface Counters
//
// Transient traffic counters collected on every poll.
//
// Only the two most recent samples are kept: enough to compute a rate
// between the last two polls. Nothing here is persisted.

use chrono::{DateTime, Utc};

/// One counters sample for an interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IfCounters {
    pub in_octets: u64,
    pub in_unicast: u64,
    pub in_multicast: u64,
    pub in_broadcast: u64,
    pub out_octets: u64,
    pub out_unicast: u64,
    pub out_multicast: u64,
    pub out_broadcast: u64,
    /// When the poller received the sample
    pub local_time: DateTime<Utc>,
    /// Device sysUpTime at sampling, in hundredths of a second
    pub remote_time: u64,
}

impl IfCounters {
    /// An all-zero sample taken at `local_time`
    pub fn zero(local_time: DateTime<Utc>, remote_time: u64) -> Self {
        Self {
            in_octets: 0,
            in_unicast: 0,
            in_multicast: 0,
            in_broadcast: 0,
            out_octets: 0,
            out_unicast: 0,
            out_multicast: 0,
            out_broadcast: 0,
            local_time,
            remote_time,
        }
    }
}

/// Per-second rates between two samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfRates {
    pub in_bits_per_sec: f64,
    pub out_bits_per_sec: f64,
    pub in_unicast_per_sec: f64,
    pub out_unicast_per_sec: f64,
    pub in_multicast_per_sec: f64,
    pub out_multicast_per_sec: f64,
    pub in_broadcast_per_sec: f64,
    pub out_broadcast_per_sec: f64,
    /// Seconds between the two samples
    pub interval_secs: f64,
}

/// Current and previous counters samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterHistory {
    pub current: Option<IfCounters>,
    pub previous: Option<IfCounters>,
}

impl CounterHistory {
    /// Record a new sample, shifting the current one into `previous`
    pub fn push(&mut self, sample: IfCounters) {
        self.previous = self.current.replace(sample);
    }

    /// History that continues `self` with the sample carried in `fresh`
    ///
    /// Pollers put their new sample in `current`; this keeps the last sample
    /// of the previous poll as `previous`. Without a fresh sample the old
    /// history is kept as is.
    pub fn advanced(&self, fresh: &CounterHistory) -> CounterHistory {
        let mut next = *self;
        if let Some(sample) = fresh.current {
            next.push(sample);
        }
        next
    }

    /// Rates between `previous` and `current`
    ///
    /// Prefers the device clock when it advanced, falling back to local
    /// receive times. Returns `None` when either sample is missing, time did
    /// not advance, or any counter went backwards (device reset).
    pub fn rates(&self) -> Option<IfRates> {
        let (prev, cur) = (self.previous?, self.current?);

        let interval_secs = if cur.remote_time > prev.remote_time {
            (cur.remote_time - prev.remote_time) as f64 / 100.0
        } else {
            let millis = cur.local_time.signed_duration_since(prev.local_time).num_milliseconds();
            if millis <= 0 {
                return None;
            }
            millis as f64 / 1000.0
        };

        let per_sec = |c: u64, p: u64| c.checked_sub(p).map(|d| d as f64 / interval_secs);

        Some(IfRates {
            in_bits_per_sec: per_sec(cur.in_octets, prev.in_octets)? * 8.0,
            out_bits_per_sec: per_sec(cur.out_octets, prev.out_octets)? * 8.0,
            in_unicast_per_sec: per_sec(cur.in_unicast, prev.in_unicast)?,
            out_unicast_per_sec: per_sec(cur.out_unicast, prev.out_unicast)?,
            in_multicast_per_sec: per_sec(cur.in_multicast, prev.in_multicast)?,
            out_multicast_per_sec: per_sec(cur.out_multicast, prev.out_multicast)?,
            in_broadcast_per_sec: per_sec(cur.in_broadcast, prev.in_broadcast)?,
            out_broadcast_per_sec: per_sec(cur.out_broadcast, prev.out_broadcast)?,
            interval_secs,
        })
    }
}
