/// Registry domain layer: credentials, roles, paging, storage selection.
pub mod api;
pub mod client;
pub mod credentials;
pub mod errors;
pub mod pages;
pub mod roles;
pub mod storage;
#[cfg(test)]
pub mod testing;

pub use api::{PageQuery, Record, RegistryApi};
pub use client::{DEFAULT_WSDL_URL, MastrClient};
pub use credentials::Credentials;
pub use errors::MastrError;
pub use pages::Pages;
pub use roles::Role;
pub use storage::StorageCriteria;
