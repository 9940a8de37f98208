mod store;

pub use store::*;

// repo

mod address_repo;
mod login_repo;
mod person_repo;
mod sequence_source;

pub use address_repo::*;
pub use login_repo::*;
pub use person_repo::*;
pub use sequence_source::*;
