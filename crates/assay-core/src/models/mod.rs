pub mod assessment;
pub mod assignment;
pub mod profile;
pub mod token;
