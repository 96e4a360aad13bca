pub mod controls;
pub mod overlay;
pub mod scrub;
