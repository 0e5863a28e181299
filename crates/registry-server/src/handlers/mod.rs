pub mod hit;
pub mod robots;
