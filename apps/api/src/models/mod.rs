pub mod analysis;
pub mod research;
