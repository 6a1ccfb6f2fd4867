pub mod debug_panel_pass;
pub mod lit_pass;
pub mod pass;
pub mod shadow_pass;
pub mod sky_pass;
