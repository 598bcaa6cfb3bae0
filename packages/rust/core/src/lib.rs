//! Task resolution for taskdocs.
//!
//! Ties the fetch layer, the public index, the detail extractor and the live
//! inventory together behind [`Resolver`].

pub mod resolver;
pub mod search;

pub use resolver::{CategorySummary, ResolvedTask, Resolver, SearchResult};
pub use search::filter_tasks;
