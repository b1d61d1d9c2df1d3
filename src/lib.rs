pub mod io;
pub mod matching;
pub mod models;
pub mod oracle;
pub mod utils;

// Re-export the matching surface for the binary and for callers embedding the engine
pub use matching::classify::report_bucket;
pub use matching::manager::{run_deal_matching, ResultSink};
pub use matching::resolver::MatchResolver;
pub use models::core::{Query, ReferenceEntity};
pub use models::matching::{
    Candidate, ConfidenceBucket, MatchResult, Provenance, VerificationState,
};
pub use oracle::{OracleAdapter, VerificationOracle};
