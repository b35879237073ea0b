pub mod export;
pub mod import;
pub mod parents;
pub mod quality_gate;
