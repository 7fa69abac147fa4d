use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::AppConfig;
use crate::types::{AlertRecord, RebalanceOutcome, RiskAssessment};

/// Bounded in-memory log of acted-upon assessments. Oldest entries are
/// evicted once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct AlertHistory {
    records: VecDeque<AlertRecord>,
    capacity: usize,
}

impl AlertHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn from_config(app: &AppConfig) -> Self {
        Self::new(app.alert_history_capacity)
    }

    /// Record an assessment together with what the rebalancer did about it.
    pub fn record(&mut self, user: &str, assessment: &RiskAssessment, result: RebalanceOutcome) {
        self.push(AlertRecord {
            timestamp: unix_now(),
            user: user.to_string(),
            risk_level: assessment.risk_level,
            action: assessment.recommended_action,
            reasons: assessment.reasons.clone(),
            result,
        });
    }

    pub fn push(&mut self, record: AlertRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Up to `n` most recent records, oldest first.
    pub fn recent(&self, n: usize) -> Vec<&AlertRecord> {
        let skip = self.records.len().saturating_sub(n);
        self.records.iter().skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
