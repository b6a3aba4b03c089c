use serde::{Deserialize, Serialize};

/// Closed interval `[start_ts, end_ts]` of UTC millis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpan {
    start_ts: i64,
    end_ts: i64,
}

impl TimeSpan {
    pub fn new(start_ts: i64, end_ts: i64) -> Self {
        Self { start_ts, end_ts }
    }

    pub fn get_start(&self) -> i64 {
        self.start_ts
    }

    pub fn get_end(&self) -> i64 {
        self.end_ts
    }

    pub fn contains(&self, ts: i64) -> bool {
        self.start_ts <= ts && ts <= self.end_ts
    }
}
