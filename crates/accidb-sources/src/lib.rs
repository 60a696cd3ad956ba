//! Source adapters for accidb.
//!
//! Each adapter maps the raw records of one upstream database into
//! [`accidb_core::entity::EntityGroup`]s. Adapters are generic over the
//! [`FieldExtractor`](accidb_core::extract::FieldExtractor) they consult, so the
//! same code runs against rule sets, a model, or a canned test double.
//!
//! | source  | input                        | extraction            |
//! |---------|------------------------------|-----------------------|
//! | ARIA    | CSV export rows              | [`rules::RuleExtractor`] over the consequence summary |
//! | EPICEA  | scraped field dictionaries   | model-assisted, over the accident summary |

pub mod aria;
pub mod epicea;
pub mod rules;

pub use aria::AriaNormalizer;
pub use epicea::EpiceaNormalizer;
pub use rules::RuleExtractor;
