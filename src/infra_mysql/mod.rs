mod address_repo_mysql;
mod login_repo_mysql;
mod person_repo_mysql;
mod sequence_source_mysql;

pub use address_repo_mysql::*;
pub use login_repo_mysql::*;
pub use person_repo_mysql::*;
pub use sequence_source_mysql::*;

mod util;
