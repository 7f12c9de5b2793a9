//! Revenue attribution & conversion-value reconciliation engine.
//!
//! Combines ad-platform engagement counters with independently connected
//! revenue sources into one trustworthy conversion value per campaign, the
//! derived KPI set, and a data-quality score for the run.

pub mod aggregator;
pub mod derive;
pub mod engine;
pub mod matcher;
pub mod precedence;
pub mod quality;
pub mod report;
pub mod resolver;
pub mod validator;

pub use engine::ReconciliationEngine;
pub use report::{ReconciliationReport, SourceResolution};
