pub mod ae;
pub mod booking;
pub mod brief;
