pub mod categories;
pub mod config;
pub mod document;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod locate;
pub mod pipeline;
pub mod series;
