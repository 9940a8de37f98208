mod address;
mod person;
mod tax_id;
mod user;

pub use address::*;
pub use person::*;
pub use tax_id::*;
pub use user::*;
