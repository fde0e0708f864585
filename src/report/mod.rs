//! Presentation of analysis results: number formatting and plots

pub mod format;
pub mod plot;

pub use format::{format_value, format_value_with_uncertainty, round_value_with_uncertainty};
pub use plot::{plot_censor_composition, plot_survival, Legend, PlotAxes, PlotOptions, PlotView};
