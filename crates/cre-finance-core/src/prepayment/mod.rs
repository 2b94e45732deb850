pub mod penalty;
