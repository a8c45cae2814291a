//! Zone/lot capacity mapping built once at startup.
//!
//! A zone name is either an aggregate label spanning several physical lots or
//! a leaf identifier the occupancy model was trained on directly. Each lot may
//! additionally map to one instrumented sub-zone name; the coverage ratio says
//! how much of the lot's capacity that sub-zone's sensor network observes.

use std::collections::HashMap;
use thiserror::Error;

/// Minimum instrumentation coverage for a lot to use the instrumented
/// occupancy path.
pub const INSTRUMENTED_COVERAGE_MIN: f64 = 0.8;

/// Raw description of one lot, as loaded from the dataset.
#[derive(Debug, Clone)]
pub struct LotSpec {
    pub number: u32,
    pub zone_name: String,
    pub location: String,
    pub zone_type: String,
    pub capacity: f64,
    /// Instrumented sub-zone names covering this lot; only the first one is
    /// used for predictions.
    pub instrumented_zones: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Lot {
    pub number: u32,
    pub zone_name: String,
    pub location: String,
    pub zone_type: String,
    pub capacity: f64,
    pub instrumented_zone: Option<String>,
    /// Fraction of this lot's capacity observed by the sensor network, 0.0
    /// when the lot is uninstrumented.
    pub coverage_ratio: f64,
}

impl Lot {
    /// Reserved lots are excluded from recommendations entirely.
    pub fn is_restricted(&self) -> bool {
        ["University", "ADA", "Guest"]
            .iter()
            .any(|tag| self.zone_type.contains(tag))
    }

    /// Paid/hourly lots are the only ones where instrumented occupancy covers
    /// every parker; permit lots only meter the fraction who pay.
    pub fn is_paid_hourly(&self) -> bool {
        let location = self.location.to_lowercase();
        self.zone_name.starts_with("Yellow")
            || location.contains("garage")
            || location.contains("meter")
            || location.contains("hourly")
    }

    /// Paid lots run emptier than permit lots; the time-pattern heuristic
    /// scales them down.
    pub fn is_paid_type(&self) -> bool {
        self.zone_type == "Paid"
    }

    pub fn has_instrumented_coverage(&self) -> bool {
        self.instrumented_zone.is_some() && self.coverage_ratio >= INSTRUMENTED_COVERAGE_MIN
    }
}

#[derive(Debug, Error)]
pub enum CapacityError {
    #[error("lot {lot} has negative capacity {capacity}")]
    NegativeCapacity { lot: u32, capacity: f64 },
    #[error("duplicate lot number {0}")]
    DuplicateLot(u32),
}

/// Immutable zone/lot capacity index. Built once at startup, read-only for the
/// serving lifetime.
#[derive(Debug)]
pub struct CapacityMap {
    lots: Vec<Lot>,
    lot_index: HashMap<u32, usize>,
    zone_lots: HashMap<String, Vec<usize>>,
    zone_capacity: HashMap<String, f64>,
}

impl CapacityMap {
    /// Builds the map from lot specs plus the instrumented sub-zone capacities
    /// observed in the occupancy training data.
    pub fn build(
        specs: Vec<LotSpec>,
        instrumented_capacities: &HashMap<String, f64>,
    ) -> Result<Self, CapacityError> {
        let mut lots = Vec::with_capacity(specs.len());
        let mut lot_index = HashMap::new();
        let mut zone_lots: HashMap<String, Vec<usize>> = HashMap::new();
        let mut zone_capacity: HashMap<String, f64> = HashMap::new();

        for spec in specs {
            if spec.capacity < 0.0 {
                return Err(CapacityError::NegativeCapacity {
                    lot: spec.number,
                    capacity: spec.capacity,
                });
            }

            for name in spec
                .instrumented_zones
                .iter()
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
            {
                *zone_capacity.entry(name.to_string()).or_insert(0.0) += spec.capacity;
            }

            *zone_capacity.entry(spec.zone_name.clone()).or_insert(0.0) += spec.capacity;

            // A lot contributes to at most one instrumented zone name.
            let instrumented_zone = spec
                .instrumented_zones
                .iter()
                .map(|n| n.trim())
                .find(|n| !n.is_empty())
                .map(str::to_string);
            let coverage_ratio = match &instrumented_zone {
                Some(name) => {
                    let instrumented = instrumented_capacities.get(name).copied().unwrap_or(0.0);
                    if spec.capacity > 0.0 && instrumented > 0.0 {
                        instrumented / spec.capacity
                    } else {
                        0.0
                    }
                }
                None => 0.0,
            };

            let idx = lots.len();
            if lot_index.insert(spec.number, idx).is_some() {
                return Err(CapacityError::DuplicateLot(spec.number));
            }
            zone_lots
                .entry(spec.zone_name.clone())
                .or_default()
                .push(idx);
            lots.push(Lot {
                number: spec.number,
                zone_name: spec.zone_name,
                location: spec.location,
                zone_type: spec.zone_type,
                capacity: spec.capacity,
                instrumented_zone,
                coverage_ratio,
            });
        }

        Ok(Self {
            lots,
            lot_index,
            zone_lots,
            zone_capacity,
        })
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn lot(&self, number: u32) -> Option<&Lot> {
        self.lot_index.get(&number).map(|&idx| &self.lots[idx])
    }

    /// Member lots of an aggregate zone label; empty for leaf zone names.
    pub fn zone_lots(&self, zone: &str) -> impl Iterator<Item = &Lot> {
        self.zone_lots
            .get(zone)
            .map(|idxs| idxs.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(|&idx| &self.lots[idx])
    }

    pub fn is_aggregate_zone(&self, zone: &str) -> bool {
        self.zone_lots.get(zone).is_some_and(|idxs| !idxs.is_empty())
    }

    pub fn zone_capacity(&self, zone: &str) -> Option<f64> {
        self.zone_capacity.get(zone).copied()
    }

    /// All known zone labels (aggregate and instrumented), sorted, with
    /// fully-restricted aggregate zones excluded.
    pub fn recommendable_zones(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .zone_capacity
            .keys()
            .map(String::as_str)
            .filter(|name| {
                let mut members = self.zone_lots(name).peekable();
                members.peek().is_none() || self.zone_lots(name).any(|lot| !lot.is_restricted())
            })
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of lots answering to a zone label, either as their aggregate
    /// zone or as their instrumented sub-zone.
    pub fn lots_for_label(&self, name: &str) -> usize {
        self.lots
            .iter()
            .filter(|lot| {
                lot.zone_name == name || lot.instrumented_zone.as_deref() == Some(name)
            })
            .count()
    }
}
