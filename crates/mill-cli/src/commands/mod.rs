pub mod batch;
pub mod follower;
pub mod solve;
pub mod util;
