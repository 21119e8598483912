pub mod errors;
pub mod history;
