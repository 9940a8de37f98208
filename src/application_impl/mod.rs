pub mod legacy_checksum;

mod auth_service_impl;
mod credential_hasher_impl;
mod id_allocator;
mod lookup_service_impl;
mod registration_service_impl;
mod token_codec_impl;

pub use auth_service_impl::*;
pub use credential_hasher_impl::*;
pub use id_allocator::*;
pub use lookup_service_impl::*;
pub use registration_service_impl::*;
pub use token_codec_impl::*;
