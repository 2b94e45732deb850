pub mod noi;
pub mod ratios;
