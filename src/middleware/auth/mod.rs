pub mod gateway;
pub mod rbac;
