pub mod model;
pub mod printer;
