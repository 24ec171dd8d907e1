//! Pie chart construction and PNG export.
//!
//! [`pie`] turns scores into chart specs (slices, labels, title) without
//! touching any drawing code, and [`render`] rasterizes a spec into PNG bytes.

pub mod pie;
pub mod render;

pub use pie::{ChartArtifact, OTHERS_LABEL, PieChart, PieSlice, pass_fail, top_n_title, top_n_with_others};
pub use render::render_png;
