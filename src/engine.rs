use std::time::Duration;

use crate::{debug_panel, diorama::Diorama};

/// One frame of simulation followed by the debug panel, which sees this frame's state.
pub fn update(diorama: &mut Diorama, ui: &imgui::Ui, delta: Duration) {
    diorama.tick(delta);
    debug_panel::draw(ui, diorama);
}
