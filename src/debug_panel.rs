use imgui::{Condition, ProgressBar};

use crate::diorama::{Diorama, LoadingStatus};

const SUN_INTENSITY_RANGE: (f32, f32) = (0.0, 2.0);
const SUN_HORIZONTAL_RANGE: (f32, f32) = (-100.0, 100.0);
const SUN_HEIGHT_RANGE: (f32, f32) = (0.0, 100.0);

/// Light and sky controls bound directly to the diorama state.
pub fn draw(ui: &imgui::Ui, diorama: &mut Diorama) {
    ui.window("Debug")
        .size([320.0, 280.0], Condition::FirstUseEver)
        .position([10.0, 10.0], Condition::FirstUseEver)
        .build(|| {
            let sun = &mut diorama.lights.sun;

            ui.slider(
                "Sun intensity",
                SUN_INTENSITY_RANGE.0,
                SUN_INTENSITY_RANGE.1,
                &mut sun.intensity,
            );
            ui.slider(
                "Sun X",
                SUN_HORIZONTAL_RANGE.0,
                SUN_HORIZONTAL_RANGE.1,
                &mut sun.position.x,
            );
            ui.slider(
                "Sun Y",
                SUN_HEIGHT_RANGE.0,
                SUN_HEIGHT_RANGE.1,
                &mut sun.position.y,
            );
            ui.slider(
                "Sun Z",
                SUN_HORIZONTAL_RANGE.0,
                SUN_HORIZONTAL_RANGE.1,
                &mut sun.position.z,
            );

            ui.separator();

            ui.color_edit3("Ambient", &mut diorama.lights.ambient.color);
            ui.color_edit3("Sky", &mut diorama.lights.sky_color);

            ui.separator();

            let mut selected = None;
            for (index, viewpoint) in diorama.config.viewpoints.iter().enumerate() {
                let label = viewpoint_label(index, &viewpoint.label);
                if ui.button(&label) {
                    selected = Some(index);
                }
                ui.same_line();
            }
            ui.new_line();

            if let Some(index) = selected {
                diorama.go_to_viewpoint(index);
            }

            let scheduler = diorama.scheduler();
            ui.text(format!(
                "Objects: {}  Tweens: {}  Drifts: {}  Mixers: {}",
                diorama.scene.object_count(),
                scheduler.active_tween_count(),
                scheduler.drift_count(),
                scheduler.mixer_count()
            ));
            if scheduler.has_camera_move() {
                ui.text("Scripted camera move");
            }

            if let Some(status) = diorama.loading_status() {
                ui.separator();
                ProgressBar::new(status.fraction)
                    .overlay_text(progress_label(&status))
                    .build(ui);
            }
        });
}

fn viewpoint_label(index: usize, label: &str) -> String {
    if label.is_empty() {
        format!("Viewpoint {}", index + 1)
    } else {
        format!("{} ({})", label, index + 1)
    }
}

fn progress_label(status: &LoadingStatus) -> String {
    format!(
        "{:.1}% ({}/{} bytes)",
        status.fraction * 100.0,
        status.loaded_bytes,
        status.total_bytes
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_label_shows_percentage_and_bytes() {
        let status = LoadingStatus {
            loaded_bytes: 10,
            total_bytes: 60,
            fraction: 10.0 / 60.0,
        };

        assert_eq!(progress_label(&status), "16.7% (10/60 bytes)");
    }

    #[test]
    fn unnamed_viewpoints_are_numbered_from_one() {
        assert_eq!(viewpoint_label(0, ""), "Viewpoint 1");
        assert_eq!(viewpoint_label(1, "Beach"), "Beach (2)");
    }
}
