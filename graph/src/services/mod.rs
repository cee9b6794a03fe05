pub mod lookup;
pub mod traversal;

pub use lookup::{EntityLookupService, OffshoreHit};
pub use traversal::GraphTraversalService;
