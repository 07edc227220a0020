//! Report assembly pipeline: statement gating, provider rule dispatch,
//! narrative parsing, IP aggregation and enrichment, section extraction,
//! and the three output renderers.

pub mod assemble;
pub mod condition;
pub mod enrich;
pub mod extract;
pub mod ip;
pub mod narratives;
pub mod providers;
pub mod render;
pub mod statements;

pub use assemble::{assemble, AssembledReport, AssemblyOptions};
pub use condition::Condition;
pub use enrich::{ArinClient, Enricher, GeoLookup, LookupError, MaxMindClient, RegistryLookup};
pub use ip::{IpPools, QUERY_CAP};
pub use providers::ProviderRules;
pub use statements::{Slot, StatementRegistry};
