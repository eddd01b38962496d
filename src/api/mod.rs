pub mod articles;
pub mod errors;
pub mod response;
