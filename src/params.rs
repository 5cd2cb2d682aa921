//! Live-editable scene parameters and the panel bridge
//!
//! The panel writes into a *staging* copy; once per frame the controller
//! commits it, diffing against the previously committed copy to find out
//! which parts of the room need rebuilding. Nothing downstream of
//! [`ParameterPanel`] validates values: clamping happens where the widgets
//! write.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::gfx::scene::rgb;

/// Everything the tweak panel can change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParameters {
    /// Show the XZ grid
    pub grid_x: bool,
    /// Show the YZ grid
    pub grid_y: bool,
    /// Show the XY grid
    pub grid_z: bool,
    pub ground: bool,
    pub axes: bool,
    pub vase_x: f32,
    pub vase_z: f32,
    /// Radians about the vertical axis
    pub vase_rotation: f32,
    pub fog_density: f32,
    pub fog_color: [f32; 3],
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            grid_x: false,
            grid_y: false,
            grid_z: false,
            ground: false,
            axes: false,
            vase_x: 0.0,
            vase_z: 0.0,
            vase_rotation: 0.0,
            fog_density: 0.00025,
            fog_color: rgb(0x808080),
        }
    }
}

bitflags! {
    /// Parts of the room whose inputs changed between two snapshots
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Invalidation: u8 {
        /// Vase placement: the vase, its flowers and flower heads
        const VASE = 1 << 0;
        /// Grid, ground and axes overlays
        const HELPERS = 1 << 1;
        const FOG = 1 << 2;
    }
}

impl SceneParameters {
    /// Field-by-field comparison against `next`
    ///
    /// Returns an empty set exactly when both snapshots are elementwise equal.
    pub fn diff(&self, next: &SceneParameters) -> Invalidation {
        let mut changed = Invalidation::empty();

        if self.grid_x != next.grid_x
            || self.grid_y != next.grid_y
            || self.grid_z != next.grid_z
            || self.ground != next.ground
            || self.axes != next.axes
        {
            changed |= Invalidation::HELPERS;
        }

        if self.vase_x != next.vase_x
            || self.vase_z != next.vase_z
            || self.vase_rotation != next.vase_rotation
        {
            changed |= Invalidation::VASE;
        }

        if self.fog_density != next.fog_density || self.fog_color != next.fog_color {
            changed |= Invalidation::FOG;
        }

        changed
    }
}

/// Slider bounds for one numeric parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl SliderRange {
    pub const fn new(min: f32, max: f32, step: f32) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

/// Which slider ranges the panel offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelVariant {
    /// Vase can move up to the back wall
    #[default]
    Room,
    /// Vase can move past the back wall
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRanges {
    pub vase_x: SliderRange,
    pub vase_z: SliderRange,
    pub vase_rotation: SliderRange,
    pub fog_density: SliderRange,
}

impl ParameterRanges {
    pub fn for_variant(variant: PanelVariant) -> Self {
        let vase_x = match variant {
            PanelVariant::Room => SliderRange::new(-20.0, 115.0, 0.5),
            PanelVariant::Wide => SliderRange::new(-20.0, 200.0, 0.5),
        };

        Self {
            vase_x,
            vase_z: SliderRange::new(-100.0, 100.0, 0.5),
            vase_rotation: SliderRange::new(-PI, PI, 0.1),
            fog_density: SliderRange::new(0.0, 0.002, 0.00005),
        }
    }

    pub fn clamp(&self, params: &SceneParameters) -> SceneParameters {
        SceneParameters {
            vase_x: self.vase_x.clamp(params.vase_x),
            vase_z: self.vase_z.clamp(params.vase_z),
            vase_rotation: self.vase_rotation.clamp(params.vase_rotation),
            fog_density: self.fog_density.clamp(params.fog_density),
            fog_color: params.fog_color.map(|c| c.clamp(0.0, 1.0)),
            ..*params
        }
    }
}

/// Staging/committed parameter pair shared by the panel and the controller
#[derive(Debug, Clone)]
pub struct ParameterPanel {
    staging: SceneParameters,
    committed: SceneParameters,
    ranges: ParameterRanges,
}

impl ParameterPanel {
    pub fn new(initial: SceneParameters, variant: PanelVariant) -> Self {
        let ranges = ParameterRanges::for_variant(variant);
        let initial = ranges.clamp(&initial);
        Self {
            staging: initial,
            committed: initial,
            ranges,
        }
    }

    pub fn ranges(&self) -> &ParameterRanges {
        &self.ranges
    }

    /// The copy the widgets edit
    pub fn staging(&self) -> &SceneParameters {
        &self.staging
    }

    /// The copy the last commit applied
    pub fn committed(&self) -> &SceneParameters {
        &self.committed
    }

    /// Edits the staging copy; the result is clamped to the slider ranges
    pub fn edit(&mut self, apply: impl FnOnce(&mut SceneParameters)) {
        apply(&mut self.staging);
        self.staging = self.ranges.clamp(&self.staging);
    }

    /// Publishes the staging copy and reports what changed since the last commit
    pub fn commit(&mut self) -> Invalidation {
        let changed = self.committed.diff(&self.staging);
        self.committed = self.staging;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_params(rng: &mut impl Rng) -> SceneParameters {
        SceneParameters {
            grid_x: rng.random(),
            grid_y: rng.random(),
            grid_z: rng.random(),
            ground: rng.random(),
            axes: rng.random(),
            vase_x: rng.random_range(-20.0..115.0),
            vase_z: rng.random_range(-100.0..100.0),
            vase_rotation: rng.random_range(-PI..PI),
            fog_density: rng.random_range(0.0..0.002),
            fog_color: [rng.random(), rng.random(), rng.random()],
        }
    }

    #[test]
    fn test_equal_snapshots_never_invalidate() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let params = random_params(&mut rng);
            let copy = params;
            assert!(params.diff(&copy).is_empty());
        }
    }

    #[test]
    fn test_each_field_maps_to_its_subtree() {
        let base = SceneParameters::default();

        let axes = SceneParameters { axes: true, ..base };
        assert_eq!(base.diff(&axes), Invalidation::HELPERS);

        let moved = SceneParameters { vase_z: -20.0, ..base };
        assert_eq!(base.diff(&moved), Invalidation::VASE);

        let foggy = SceneParameters {
            fog_color: [1.0, 0.0, 0.0],
            ..base
        };
        assert_eq!(base.diff(&foggy), Invalidation::FOG);

        let both = SceneParameters {
            ground: true,
            vase_rotation: 1.2,
            ..base
        };
        assert_eq!(base.diff(&both), Invalidation::HELPERS | Invalidation::VASE);
    }

    #[test]
    fn test_commit_is_idempotent() {
        let mut panel = ParameterPanel::new(SceneParameters::default(), PanelVariant::Room);
        panel.edit(|p| p.axes = true);

        assert_eq!(panel.commit(), Invalidation::HELPERS);
        assert!(panel.commit().is_empty());
        assert!(panel.committed().axes);
    }

    #[test]
    fn test_staging_edits_do_not_touch_committed() {
        let mut panel = ParameterPanel::new(SceneParameters::default(), PanelVariant::Room);
        panel.edit(|p| p.vase_x = 50.0);
        assert_eq!(panel.committed().vase_x, 0.0);
        assert_eq!(panel.staging().vase_x, 50.0);
    }

    #[test]
    fn test_edit_clamps_to_variant_range() {
        let mut room = ParameterPanel::new(SceneParameters::default(), PanelVariant::Room);
        room.edit(|p| {
            p.vase_x = 180.0;
            p.vase_z = -500.0;
            p.vase_rotation = 4.0;
        });
        assert_eq!(room.staging().vase_x, 115.0);
        assert_eq!(room.staging().vase_z, -100.0);
        assert_eq!(room.staging().vase_rotation, PI);

        let mut wide = ParameterPanel::new(SceneParameters::default(), PanelVariant::Wide);
        wide.edit(|p| p.vase_x = 180.0);
        assert_eq!(wide.staging().vase_x, 180.0);
    }
}
