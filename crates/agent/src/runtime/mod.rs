//! Runtime module — boot sequence and the poll loop.

pub mod boot;
pub mod run;
