//! Data model for the cancer registry survival pipeline.
//!
//! Raw rows carry source text; every other type holds canonical codes and
//! calendar dates, with malformed source values represented as `None`.

pub mod codes;
pub mod columns;
pub mod enums;
pub mod error;
pub mod groups;
pub mod lookup;
pub mod options;
pub mod records;
pub mod survival;

pub use codes::{PersonId, RegionCode, SiteCode};
pub use columns::{MortalityColumns, TumorColumns};
pub use enums::{BehaviorCode, CauseOfDeath, Sex, VitalStatus};
pub use error::{CodeError, Result};
pub use groups::{OTHER_GROUP, TumorGroup, TumorGroups};
pub use lookup::ColumnLookup;
pub use options::{DuplicatePolicy, LinkageOptions, StrataDimension};
pub use records::{LinkedRecord, MortalityRecord, RawMortalityRow, RawTumorRow, TumorRecord};
pub use survival::{DAYS_PER_YEAR, StratumKey, SurvivalObservation, TimeUnit};
