pub mod analysis;
pub mod data;
pub mod export;
