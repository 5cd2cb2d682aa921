//! The room's tweak panel
//!
//! Widgets read the staging parameters, and every change goes back through
//! [`ParameterPanel::edit`], which keeps values inside the slider ranges.

use crate::params::{ParameterPanel, SceneParameters, SliderRange};

/// Rounds `value` to the slider's step, inside its range
pub fn snap(range: &SliderRange, value: f32) -> f32 {
    let stepped = if range.step > 0.0 {
        range.min + ((value - range.min) / range.step).round() * range.step
    } else {
        value
    };
    range.clamp(stepped)
}

fn stepped_slider(ui: &imgui::Ui, label: &str, range: &SliderRange, value: &mut f32) -> bool {
    let mut edited = *value;
    if ui
        .slider_config(label, range.min, range.max)
        .display_format("%.5g")
        .build(&mut edited)
    {
        *value = snap(range, edited);
        return true;
    }
    false
}

/// Draws the "Controls" window and writes any change into the staging copy
pub fn parameter_panel(ui: &imgui::Ui, panel: &mut ParameterPanel) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    let ranges = *panel.ranges();
    let mut params: SceneParameters = *panel.staging();
    let mut changed = false;

    ui.window("Controls")
        .size([300.0, 0.0], imgui::Condition::FirstUseEver)
        .position([display_size[0] - 310.0, 10.0], imgui::Condition::FirstUseEver)
        .collapsible(true)
        .always_auto_resize(true)
        .build(|| {
            if ui.collapsing_header("Grid display", imgui::TreeNodeFlags::empty()) {
                changed |= ui.checkbox("Show XZ grid", &mut params.grid_x);
                changed |= ui.checkbox("Show YZ grid", &mut params.grid_y);
                changed |= ui.checkbox("Show XY grid", &mut params.grid_z);
                changed |= ui.checkbox("Show ground", &mut params.ground);
                changed |= ui.checkbox("Show axes", &mut params.axes);
            }

            if ui.collapsing_header("Vase settings", imgui::TreeNodeFlags::empty()) {
                changed |= stepped_slider(ui, "x position", &ranges.vase_x, &mut params.vase_x);
                changed |= stepped_slider(ui, "z position", &ranges.vase_z, &mut params.vase_z);
                changed |= stepped_slider(ui, "rotation", &ranges.vase_rotation, &mut params.vase_rotation);
            }

            if ui.collapsing_header("Fog", imgui::TreeNodeFlags::empty()) {
                changed |= stepped_slider(ui, "density", &ranges.fog_density, &mut params.fog_density);
                changed |= ui.color_edit3("colour", &mut params.fog_color);
            }
        });

    if changed {
        panel.edit(|staging| *staging = params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{PanelVariant, ParameterRanges};

    #[test]
    fn test_snap_to_step() {
        let ranges = ParameterRanges::for_variant(PanelVariant::Room);
        assert_eq!(snap(&ranges.vase_x, 50.26), 50.5);
        assert_eq!(snap(&ranges.vase_x, 500.0), 115.0);
        assert_eq!(snap(&ranges.vase_z, -100.2), -100.0);

        let density = snap(&ranges.fog_density, 0.00026);
        assert!((density - 0.00025).abs() < 1e-9);
    }

    #[test]
    fn test_untouched_panel_leaves_parameters_alone() {
        let mut context = imgui::Context::create();
        context.set_ini_filename(None);
        context.io_mut().display_size = [846.0, 494.0];
        context.fonts().build_rgba32_texture();

        let mut panel = ParameterPanel::new(SceneParameters::default(), PanelVariant::Room);
        let ui = context.frame();
        parameter_panel(ui, &mut panel);
        context.render();

        assert_eq!(panel.staging(), &SceneParameters::default());
        assert!(panel.commit().is_empty());
    }
}
