//! Shared service state: the historical tables plus whichever model bundles
//! loaded at startup. Everything is immutable after construction, so handlers
//! share it behind a plain `Arc` with no locking.

use crate::data::{CapacityMap, Dataset};
use crate::data::tables::{
    CalendarTable, EnforcementHistory, GameDays, OccupancyHistory, WeatherTable,
};
use crate::features::FeatureBuilder;
use crate::model::{EnforcementBundle, OccupancyBundle, ZoneEncoder};

#[derive(Debug)]
pub struct ServiceState {
    pub calendar: CalendarTable,
    pub games: GameDays,
    pub weather: WeatherTable,
    pub occupancy_history: OccupancyHistory,
    pub enforcement_history: EnforcementHistory,
    pub capacities: CapacityMap,
    pub occupancy: Option<OccupancyBundle>,
    pub enforcement: Option<EnforcementBundle>,
    encoder: ZoneEncoder,
}

impl ServiceState {
    /// Both models were fit against the same label encoding, so one encoder
    /// serves both; the occupancy artifact's class list wins when present.
    pub fn new(
        dataset: Dataset,
        occupancy: Option<OccupancyBundle>,
        enforcement: Option<EnforcementBundle>,
    ) -> Self {
        let classes = occupancy
            .as_ref()
            .map(|b| b.zone_classes.clone())
            .filter(|c| !c.is_empty())
            .or_else(|| enforcement.as_ref().map(|b| b.zone_classes.clone()))
            .unwrap_or_default();

        Self {
            calendar: dataset.calendar,
            games: dataset.games,
            weather: dataset.weather,
            occupancy_history: dataset.occupancy_history,
            enforcement_history: dataset.enforcement_history,
            capacities: dataset.capacities,
            occupancy,
            enforcement,
            encoder: ZoneEncoder::new(classes),
        }
    }

    pub fn occupancy_enabled(&self) -> bool {
        self.occupancy.is_some()
    }

    pub fn enforcement_enabled(&self) -> bool {
        self.enforcement.is_some()
    }

    pub fn encoder(&self) -> &ZoneEncoder {
        &self.encoder
    }

    pub fn feature_builder(&self) -> FeatureBuilder<'_> {
        FeatureBuilder::new(
            &self.calendar,
            &self.games,
            &self.weather,
            &self.capacities,
            &self.occupancy_history,
            &self.enforcement_history,
            &self.encoder,
        )
    }
}
