pub mod columns;
pub mod comparison;
pub mod config;
pub mod curation;
pub mod dataset;
pub mod error;
pub mod experience;
pub mod export;
pub mod grading;
pub mod model;
pub mod normalize;
pub mod padj;
pub mod population;
pub mod report;
pub mod scoring;
pub mod settings;
pub mod team_stats;
