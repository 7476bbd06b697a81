//! Level geometry and load-time content checks
//!
//! Levels are authored elsewhere and handed to the core as data. Loading never
//! fails on wiring mistakes (a bridge nobody powers just stays retracted), but
//! every such mistake is reported so broken levels don't ship silently.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::link::LinkTable;
use crate::consts::{DEFAULT_WORLD_HEIGHT, DEFAULT_WORLD_WIDTH};
use crate::error::{LevelError, LevelResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindmillSpec {
    pub position: Vec2,
    pub link_index: u32,
    /// Falls back to the tuning default when absent
    #[serde(default)]
    pub threshold: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeSpec {
    pub origin: Vec2,
    pub max_width: f32,
    pub link_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatPlateSpec {
    pub position: Vec2,
    pub radius: f32,
    pub link_index: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IceWallSpec {
    pub position: Vec2,
    pub size: Vec2,
    pub link_index: u32,
    /// Seconds of full heat to melt completely
    pub melt_time: f32,
    #[serde(default)]
    pub refreeze_rate: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarrierSpec {
    pub position: Vec2,
    pub size: Vec2,
    #[serde(default = "default_barrier_threshold")]
    pub threshold: f32,
}

fn default_barrier_threshold() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalSpec {
    pub position: Vec2,
    pub radius: f32,
}

/// Extents used to normalize each world's coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldExtents {
    pub surge: Vec2,
    pub flow: Vec2,
}

impl Default for WorldExtents {
    fn default() -> Self {
        let size = Vec2::new(DEFAULT_WORLD_WIDTH, DEFAULT_WORLD_HEIGHT);
        Self {
            surge: size,
            flow: size,
        }
    }
}

/// Complete description of one level across both worlds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelData {
    pub index: usize,
    pub title: String,
    #[serde(default)]
    pub world_size: WorldExtents,
    pub surge_start: Vec2,
    pub flow_start: Vec2,
    #[serde(default)]
    pub windmills: Vec<WindmillSpec>,
    #[serde(default)]
    pub bridges: Vec<BridgeSpec>,
    #[serde(default)]
    pub heat_plates: Vec<HeatPlateSpec>,
    #[serde(default)]
    pub ice_walls: Vec<IceWallSpec>,
    #[serde(default)]
    pub surge_barriers: Vec<BarrierSpec>,
    #[serde(default)]
    pub flow_barriers: Vec<BarrierSpec>,
    pub surge_portal: PortalSpec,
    pub flow_portal: PortalSpec,
    /// Play the scripted opening glide before handing over flow input
    #[serde(default)]
    pub onboarding: bool,
}

impl LevelData {
    /// Parse a level from JSON and reject unusable geometry
    pub fn from_json(json: &str) -> LevelResult<Self> {
        let level: LevelData = serde_json::from_str(json)?;
        level.check_geometry()?;
        Ok(level)
    }

    /// Hard errors: values the simulation cannot run with
    pub fn check_geometry(&self) -> LevelResult<()> {
        let level = self.index;
        let finite = |v: Vec2| v.is_finite();
        let bad = |what: String, detail: String| LevelError::InvalidGeometry {
            level,
            what,
            detail,
        };

        if !finite(self.surge_start) || !finite(self.flow_start) {
            return Err(bad("start position".into(), "non-finite".into()));
        }
        for (name, portal) in [("surge portal", &self.surge_portal), ("flow portal", &self.flow_portal)] {
            if !finite(portal.position) || !portal.radius.is_finite() || portal.radius < 0.0 {
                return Err(bad(name.into(), format!("radius {}", portal.radius)));
            }
        }
        for (i, b) in self.bridges.iter().enumerate() {
            if !finite(b.origin) || !b.max_width.is_finite() || b.max_width < 0.0 {
                return Err(bad(format!("bridge {i}"), format!("max width {}", b.max_width)));
            }
        }
        for (i, p) in self.heat_plates.iter().enumerate() {
            if !finite(p.position) || !p.radius.is_finite() || p.radius < 0.0 {
                return Err(bad(format!("heat plate {i}"), format!("radius {}", p.radius)));
            }
        }
        for (i, w) in self.windmills.iter().enumerate() {
            if !finite(w.position) {
                return Err(bad(format!("windmill {i}"), "non-finite position".into()));
            }
        }
        for (i, w) in self.ice_walls.iter().enumerate() {
            if !finite(w.position) || !finite(w.size) {
                return Err(bad(format!("ice wall {i}"), "non-finite geometry".into()));
            }
            if !w.melt_time.is_finite() || w.melt_time <= 0.0 {
                return Err(LevelError::InvalidMeltTime {
                    level,
                    wall: i,
                    melt_time: w.melt_time,
                });
            }
        }
        for (i, b) in self.surge_barriers.iter().chain(&self.flow_barriers).enumerate() {
            if !finite(b.position) || !finite(b.size) || !b.threshold.is_finite() {
                return Err(bad(format!("barrier {i}"), "non-finite geometry".into()));
            }
        }
        Ok(())
    }
}

/// A wiring mistake that leaves part of a level inert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentWarning {
    /// No windmill shares this bridge's link; it never extends
    UnpoweredBridge { bridge: usize, link: u32 },
    /// No heat plate shares this wall's link; it never melts
    UnheatedIceWall { wall: usize, link: u32 },
    /// A windmill spins for no bridge
    IdleWindmill { windmill: usize, link: u32 },
    /// A heat plate warms no wall
    IdleHeatPlate { plate: usize, link: u32 },
}

impl std::fmt::Display for ContentWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentWarning::UnpoweredBridge { bridge, link } => {
                write!(f, "bridge {bridge} on link {link} has no windmill")
            }
            ContentWarning::UnheatedIceWall { wall, link } => {
                write!(f, "ice wall {wall} on link {link} has no heat plate")
            }
            ContentWarning::IdleWindmill { windmill, link } => {
                write!(f, "windmill {windmill} on link {link} powers no bridge")
            }
            ContentWarning::IdleHeatPlate { plate, link } => {
                write!(f, "heat plate {plate} on link {link} heats no ice wall")
            }
        }
    }
}

/// Result of the load-time content pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub level_index: usize,
    pub warnings: Vec<ContentWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Check producer/consumer wiring; logs each finding as a warning
pub fn validate(level: &LevelData) -> ValidationReport {
    let windmills = LinkTable::from_links(level.windmills.iter().map(|w| w.link_index));
    let bridges = LinkTable::from_links(level.bridges.iter().map(|b| b.link_index));
    let plates = LinkTable::from_links(level.heat_plates.iter().map(|p| p.link_index));
    let walls = LinkTable::from_links(level.ice_walls.iter().map(|w| w.link_index));

    let mut warnings = Vec::new();
    for (bridge, spec) in level.bridges.iter().enumerate() {
        if !windmills.contains(spec.link_index) {
            warnings.push(ContentWarning::UnpoweredBridge {
                bridge,
                link: spec.link_index,
            });
        }
    }
    for (wall, spec) in level.ice_walls.iter().enumerate() {
        if !plates.contains(spec.link_index) {
            warnings.push(ContentWarning::UnheatedIceWall {
                wall,
                link: spec.link_index,
            });
        }
    }
    for (windmill, spec) in level.windmills.iter().enumerate() {
        if !bridges.contains(spec.link_index) {
            warnings.push(ContentWarning::IdleWindmill {
                windmill,
                link: spec.link_index,
            });
        }
    }
    for (plate, spec) in level.heat_plates.iter().enumerate() {
        if !walls.contains(spec.link_index) {
            warnings.push(ContentWarning::IdleHeatPlate {
                plate,
                link: spec.link_index,
            });
        }
    }

    for warning in &warnings {
        log::warn!("Level {} content: {}", level.index, warning);
    }

    ValidationReport {
        level_index: level.index,
        warnings,
    }
}

/// Ordered set of levels with clamped lookup
#[derive(Debug, Clone)]
pub struct LevelCatalog {
    levels: Vec<LevelData>,
}

impl LevelCatalog {
    /// Returns None for an empty list
    pub fn new(levels: Vec<LevelData>) -> Option<Self> {
        if levels.is_empty() {
            None
        } else {
            Some(Self { levels })
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Level at `index`, clamped into range
    pub fn get(&self, index: usize) -> &LevelData {
        &self.levels[index.min(self.levels.len() - 1)]
    }

    /// The level after `index`, if any
    pub fn next_after(&self, index: usize) -> Option<&LevelData> {
        self.levels.get(index + 1)
    }

    /// The four introductory levels
    pub fn builtin() -> Self {
        Self {
            levels: builtin_levels(),
        }
    }
}

fn v(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

fn portal(x: f32, y: f32, radius: f32) -> PortalSpec {
    PortalSpec {
        position: v(x, y),
        radius,
    }
}

fn builtin_levels() -> Vec<LevelData> {
    vec![
        LevelData {
            index: 0,
            title: "First Sight".into(),
            world_size: WorldExtents::default(),
            surge_start: v(60.0, 200.0),
            flow_start: v(60.0, 100.0),
            windmills: vec![WindmillSpec {
                position: v(150.0, 180.0),
                link_index: 0,
                threshold: None,
            }],
            bridges: vec![BridgeSpec {
                origin: v(120.0, 140.0),
                max_width: 100.0,
                link_index: 0,
            }],
            heat_plates: vec![HeatPlateSpec {
                position: v(200.0, 180.0),
                radius: 35.0,
                link_index: 0,
            }],
            ice_walls: vec![IceWallSpec {
                position: v(220.0, 100.0),
                size: v(45.0, 70.0),
                link_index: 0,
                melt_time: 1.0,
                refreeze_rate: None,
            }],
            surge_barriers: vec![],
            flow_barriers: vec![],
            surge_portal: portal(280.0, 180.0, 30.0),
            flow_portal: portal(280.0, 100.0, 30.0),
            onboarding: true,
        },
        LevelData {
            index: 1,
            title: "First Contact".into(),
            world_size: WorldExtents::default(),
            surge_start: v(80.0, 160.0),
            flow_start: v(80.0, 120.0),
            windmills: vec![WindmillSpec {
                position: v(180.0, 140.0),
                link_index: 0,
                threshold: None,
            }],
            bridges: vec![BridgeSpec {
                origin: v(220.0, 120.0),
                max_width: 80.0,
                link_index: 0,
            }],
            heat_plates: vec![],
            ice_walls: vec![],
            surge_barriers: vec![],
            flow_barriers: vec![],
            surge_portal: portal(350.0, 160.0, 28.0),
            flow_portal: portal(350.0, 120.0, 28.0),
            onboarding: false,
        },
        LevelData {
            index: 2,
            title: "Warmth & Thaw".into(),
            world_size: WorldExtents::default(),
            surge_start: v(100.0, 260.0),
            flow_start: v(80.0, 150.0),
            windmills: vec![],
            bridges: vec![],
            heat_plates: vec![HeatPlateSpec {
                position: v(220.0, 200.0),
                radius: 28.0,
                link_index: 0,
            }],
            ice_walls: vec![IceWallSpec {
                position: v(280.0, 140.0),
                size: v(60.0, 110.0),
                link_index: 0,
                melt_time: 3.0,
                refreeze_rate: None,
            }],
            surge_barriers: vec![],
            flow_barriers: vec![],
            surge_portal: portal(360.0, 110.0, 26.0),
            flow_portal: portal(360.0, 120.0, 26.0),
            onboarding: false,
        },
        LevelData {
            index: 3,
            title: "Shared Burden".into(),
            world_size: WorldExtents::default(),
            surge_start: v(90.0, 260.0),
            flow_start: v(90.0, 150.0),
            windmills: vec![WindmillSpec {
                position: v(220.0, 210.0),
                link_index: 0,
                threshold: None,
            }],
            bridges: vec![BridgeSpec {
                origin: v(190.0, 140.0),
                max_width: 120.0,
                link_index: 0,
            }],
            heat_plates: vec![HeatPlateSpec {
                position: v(300.0, 220.0),
                radius: 28.0,
                link_index: 0,
            }],
            ice_walls: vec![IceWallSpec {
                position: v(300.0, 140.0),
                size: v(60.0, 110.0),
                link_index: 0,
                melt_time: 4.0,
                refreeze_rate: None,
            }],
            surge_barriers: vec![BarrierSpec {
                position: v(250.0, 120.0),
                size: v(40.0, 28.0),
                threshold: 1.0,
            }],
            flow_barriers: vec![BarrierSpec {
                position: v(250.0, 120.0),
                size: v(40.0, 28.0),
                threshold: 1.0,
            }],
            surge_portal: portal(380.0, 120.0, 26.0),
            flow_portal: portal(380.0, 120.0, 26.0),
            onboarding: false,
        },
    ]
}
