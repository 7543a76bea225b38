pub mod error;
#[cfg(test)]
pub mod memory;
pub mod rbac_repo;
pub mod user_repo;
