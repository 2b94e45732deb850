pub mod comparison;
