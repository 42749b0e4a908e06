mod friendship;
mod group;
mod ledger;
mod profile;

pub use friendship::*;
pub use group::*;
pub use ledger::*;
pub use profile::*;
