//! URL frontier for a crawl session
//!
//! The frontier tree records which URLs a session has seen and at which depth
//! each was scheduled. URLs are stored without their scheme, split on `/`,
//! so pages of the same site share their path prefixes.

mod tree;

pub use tree::{FrontierNode, FrontierTree, ROOT_SEGMENT, UNSCHEDULED};
