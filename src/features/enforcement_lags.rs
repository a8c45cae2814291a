//! Enforcement lag/rolling and derived risk statistics.
//!
//! Unlike the occupancy aggregates these use exact timestamp arithmetic over
//! the key's sorted history. Only `dow_hour_avg` filters to strictly-past
//! rows; the lag/rolling statistics deliberately do not. The classifier was
//! trained with that asymmetry, so it stays.

use crate::data::tables::{
    EnforcementHistory, EnforcementRecord, mean_ticket_rate, quantile_linear,
};
use crate::features::FeatureVector;
use time::{Duration, PrimitiveDateTime};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnforcementLagFeatures {
    /// 1 if a ticket was issued at exactly (t − 1h), 0 otherwise.
    pub enforcement_lag_1: f64,
    pub tickets_lag_1: f64,
    pub enforcement_lag_24: f64,
    pub tickets_lag_24: f64,
    /// Mean of (tickets > 0) over the rows found at {t−1h..t−3h}.
    pub rolling_3: f64,
    pub rolling_24: f64,
    pub tickets_rolling_24: f64,
    pub dow_hour_avg: f64,
}

impl EnforcementLagFeatures {
    pub fn apply(&self, features: &mut FeatureVector) {
        features.insert("enforcement_lag_1", self.enforcement_lag_1);
        features.insert("tickets_lag_1", self.tickets_lag_1);
        features.insert("enforcement_lag_24", self.enforcement_lag_24);
        features.insert("tickets_lag_24", self.tickets_lag_24);
        features.insert("enforcement_rolling_3", self.rolling_3);
        features.insert("enforcement_rolling_24", self.rolling_24);
        features.insert("tickets_rolling_24", self.tickets_rolling_24);
        features.insert("enforcement_dow_hour_avg", self.dow_hour_avg);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnforcementRiskFeatures {
    pub lpr_scans: f64,
    pub amp_sessions: f64,
    pub unpaid_estimate: f64,
    /// min(1, amp_sessions / lpr_scans); 0 when there are no scans.
    pub compliance_ratio: f64,
    pub zone_avg_enforcement: f64,
    pub vulnerability_score: f64,
    pub high_risk: bool,
}

impl EnforcementRiskFeatures {
    pub fn apply(&self, features: &mut FeatureVector) {
        features.insert("lpr_scans", self.lpr_scans);
        features.insert("amp_sessions", self.amp_sessions);
        features.insert("unpaid_estimate", self.unpaid_estimate);
        features.insert("compliance_ratio", self.compliance_ratio);
        features.insert("zone_avg_enforcement", self.zone_avg_enforcement);
        features.insert("vulnerability_score", self.vulnerability_score);
        features.insert("high_risk", if self.high_risk { 1.0 } else { 0.0 });
    }
}

/// Exact-timestamp lag and rolling statistics; all 0.0 when the key has no
/// history or no row exists at the looked-up instant.
pub fn lag_features(
    history: &EnforcementHistory,
    key: &str,
    dt: PrimitiveDateTime,
) -> EnforcementLagFeatures {
    let rows = history.key_rows(key);
    if rows.is_empty() {
        return EnforcementLagFeatures::default();
    }

    let mut features = EnforcementLagFeatures::default();

    if let Some(row) = history.row_at(key, dt - Duration::hours(1)) {
        features.enforcement_lag_1 = ticket_flag(row);
        features.tickets_lag_1 = f64::from(row.tickets_issued);
    }
    if let Some(row) = history.row_at(key, dt - Duration::hours(24)) {
        features.enforcement_lag_24 = ticket_flag(row);
        features.tickets_lag_24 = f64::from(row.tickets_issued);
    }

    let rolling_3: Vec<&EnforcementRecord> = (1..=3)
        .filter_map(|offset| history.row_at(key, dt - Duration::hours(offset)))
        .collect();
    if !rolling_3.is_empty() {
        features.rolling_3 =
            rolling_3.iter().map(|r| ticket_flag(r)).sum::<f64>() / rolling_3.len() as f64;
    }

    let rolling_24: Vec<&EnforcementRecord> = (1..=24)
        .filter_map(|offset| history.row_at(key, dt - Duration::hours(offset)))
        .collect();
    if !rolling_24.is_empty() {
        features.rolling_24 =
            rolling_24.iter().map(|r| ticket_flag(r)).sum::<f64>() / rolling_24.len() as f64;
        features.tickets_rolling_24 = rolling_24
            .iter()
            .map(|r| f64::from(r.tickets_issued))
            .sum();
    }

    // Causal filter: strictly-past rows only. The lags above intentionally
    // skip this filter.
    let day_of_week = dt.weekday().number_days_from_monday();
    let hour = dt.hour();
    let past: Vec<&EnforcementRecord> = rows
        .iter()
        .filter(|r| r.timestamp < dt && r.day_of_week == day_of_week && r.hour == hour)
        .collect();
    if !past.is_empty() {
        features.dow_hour_avg =
            past.iter().map(|r| ticket_flag(r)).sum::<f64>() / past.len() as f64;
    }

    features
}

/// Derived risk features estimated from the key's historical patterns at the
/// same day-of-week and hour.
pub fn risk_features(
    history: &EnforcementHistory,
    key: &str,
    dt: PrimitiveDateTime,
) -> EnforcementRiskFeatures {
    let rows = history.key_rows(key);
    if rows.is_empty() {
        return EnforcementRiskFeatures::default();
    }

    let mut features = EnforcementRiskFeatures {
        zone_avg_enforcement: mean_ticket_rate(rows),
        ..EnforcementRiskFeatures::default()
    };

    let day_of_week = dt.weekday().number_days_from_monday();
    let hour = dt.hour();
    let similar: Vec<&EnforcementRecord> = rows
        .iter()
        .filter(|r| r.day_of_week == day_of_week && r.hour == hour)
        .collect();
    if similar.is_empty() {
        return features;
    }

    let n = similar.len() as f64;
    features.lpr_scans = similar.iter().map(|r| r.lpr_scans).sum::<f64>() / n;
    features.amp_sessions = similar.iter().map(|r| r.amp_sessions).sum::<f64>() / n;
    features.unpaid_estimate = similar.iter().map(|r| r.unpaid_estimate).sum::<f64>() / n;

    if features.lpr_scans > 0.0 {
        features.compliance_ratio = (features.amp_sessions / features.lpr_scans).min(1.0);
    }
    features.vulnerability_score = features.unpaid_estimate * features.zone_avg_enforcement;

    let mut unpaid: Vec<f64> = rows.iter().map(|r| r.unpaid_estimate).collect();
    unpaid.sort_by(|a, b| a.total_cmp(b));
    let unpaid_75th = quantile_linear(&unpaid, 0.75);
    features.high_risk = features.unpaid_estimate > unpaid_75th
        && features.zone_avg_enforcement > history.median_key_enforcement();

    features
}

fn ticket_flag(record: &EnforcementRecord) -> f64 {
    if record.has_ticket() { 1.0 } else { 0.0 }
}
