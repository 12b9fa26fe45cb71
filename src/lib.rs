pub mod engine;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod series;
pub mod source;
pub mod timeparse;
pub mod window;
