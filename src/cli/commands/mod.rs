pub mod indexes;
pub mod ping;
pub mod roles;
