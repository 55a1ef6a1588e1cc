//! Account risk scoring and automated protective actions.

pub mod analyzer;

pub use analyzer::{ResponseAction, RiskAssessment, RiskLevel, SecurityRiskAnalyzer};
