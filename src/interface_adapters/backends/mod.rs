pub mod live;
pub mod simulated;
