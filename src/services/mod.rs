pub mod generator;
pub mod history;
pub mod merge;
pub mod providers;
pub mod recommendations;
pub mod title_search;

pub use generator::CandidateGenerator;
pub use history::{HistoryProvider, MemoryStore, SessionResolver};
