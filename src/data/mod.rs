pub mod capacity;
pub mod load;
pub mod tables;

pub use capacity::{CapacityMap, Lot, LotSpec};
pub use load::{Dataset, DatasetError, load_dataset_from_path};
pub use tables::{
    CalendarEvent, CalendarTable, EnforcementHistory, EnforcementRecord, EventType, GameDays,
    OccupancyHistory, OccupancyRecord, WeatherDay, WeatherTable,
};
