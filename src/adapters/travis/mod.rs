//! Travis CI build-matrix adapter.

pub mod build_matrix;
pub mod models;

pub use build_matrix::BuildMatrixAdapter;
