pub mod analyzers;
pub mod classify;
pub mod error;
pub mod fetch;
pub mod output;
pub mod survey;
