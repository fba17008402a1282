pub mod review;
pub mod token;
