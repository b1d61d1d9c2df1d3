pub mod classify;
pub mod manager;
pub mod name;
pub mod ranker;
pub mod resolver;
