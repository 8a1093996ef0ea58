// src/lib.rs — Library root for review-eval

pub mod api;
pub mod cli;
pub mod collectors;
pub mod evaluator;
pub mod infra;
pub mod provider;
pub mod scoring;
