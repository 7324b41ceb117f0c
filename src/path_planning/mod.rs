// Path Planning algorithms module

pub mod rrt_star;

pub use rrt_star::*;
