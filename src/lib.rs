pub mod error;
pub mod flatten;
pub mod info;
pub mod matcher;
pub mod pipeline;
pub mod records;
pub mod region_query;
pub mod table;
pub mod variant;

pub use error::{Error, Result};
pub use flatten::{flatten, Flattener, VariantRow};
pub use info::{Info, InfoField, InfoValue};
pub use matcher::{match_candidates, ClinVarAnnotation, ClinVarMatcher};
pub use region_query::{HtslibTabix, InMemoryIndex, RegionIndexQuery, TabixCommand};
pub use variant::{Quality, VariantRecord};
