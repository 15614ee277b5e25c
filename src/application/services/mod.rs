//! Application services - Business logic orchestration

pub mod approval_service;

pub use approval_service::ApprovalPolicy;
