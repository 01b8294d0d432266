//! Domain types for CandleLab.

pub mod bar;
pub mod position;
pub mod series;
pub mod signal;
pub mod structure;
pub mod timeframe;
pub mod trade;
pub mod zone;

pub use bar::{Bar, BarError, MAX_PRICE, MAX_VOLUME};
pub use position::{ExitFill, ExitReason, Position, PositionError};
pub use series::{Series, SeriesError};
pub use signal::{CandidateSignal, Side, SignalDetails, SignalError, StrategyId, StructureTag};
pub use structure::{MarketStructure, PriceZone, TrendDirection};
pub use timeframe::{Timeframe, TimeframeError};
pub use trade::TradeRecord;
pub(crate) use trade::{saturating_div, saturating_sum};
pub use zone::{Bias, PriceBand, Zone, ZoneKind};
