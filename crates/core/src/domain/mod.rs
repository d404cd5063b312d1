pub mod approval;
pub mod claim;
pub mod policy;
