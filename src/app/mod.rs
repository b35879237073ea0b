pub mod ports;
pub mod import_use_case;
pub mod roster_use_case;
pub mod timeout;
