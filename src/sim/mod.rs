//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame delta capped by the session clock
//! - Stable iteration order (entities by index, links by `BTreeMap`)
//! - Worlds never read each other; cross values go through the coordinator
//! - No rendering or platform dependencies

pub mod character;
pub mod clock;
pub mod coordinator;
pub mod event;
pub mod level;
pub mod link;
pub mod mechanics;
pub mod session;
pub mod smooth;
pub mod world;

pub use character::{Character, Steering};
pub use clock::SessionClock;
pub use coordinator::{CrossWorldCoordinator, Phase, ProximityReading};
pub use event::{FeedbackCue, GameEvent, WinEvent, WorldId};
pub use level::{ContentWarning, LevelCatalog, LevelData, ValidationReport, WorldExtents, validate};
pub use link::LinkTable;
pub use mechanics::{Barrier, Bridge, HeatPlate, IceWall, Portal, Windmill};
pub use session::{GameSession, HudSnapshot, TickInput};
pub use smooth::ClampedSmoother;
pub use world::{CrossSignal, HeatMap, WorldOutput, WorldSimulation};
