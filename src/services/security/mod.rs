pub mod sanitize;
pub mod signatures;

pub use sanitize::sanitize;
pub use signatures::AttackSignatures;
