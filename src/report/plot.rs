//! Plotting of apparent lifetimes and censoring composition
//!
//! Drawing goes through the [`PlotAxes`] trait so that any backend (a
//! plotting crate, an SVG writer, a GUI canvas) can render the figures.

use super::format::{format_value, format_value_with_uncertainty};
use crate::estimation::ApparentLifetimeTable;
use crate::fitting::{lifetime_model, prepare_apparent_lifetimes, LifetimeResult};
use crate::tracks::CensorComposition;

/// Number of points on the fitted curve
pub const CURVE_POINTS: usize = 100;

/// Names of the censoring types, indexed by censoring flags
pub const CENSOR_NAMES: [&str; 4] = ["fully within", "at start", "at end", "at start and end"];

/// Minimal drawing surface
pub trait PlotAxes {
    /// Color handle returned by one call and passed to later ones
    type Color: Clone;

    /// Draw markers with optional symmetric y error bars; returns the color used
    fn error_bars(&mut self, x: &[f64], y: &[f64], yerr: Option<&[f64]>) -> Self::Color;

    /// Draw a line, optionally with a legend entry
    fn line(&mut self, x: &[f64], y: &[f64], color: &Self::Color, label: Option<&str>);

    /// Shade the region between two curves
    fn fill_between(&mut self, x: &[f64], lower: &[f64], upper: &[f64], color: &Self::Color);

    /// Draw one layer of a stacked bar chart
    fn bar(&mut self, categories: &[String], heights: &[f64], bottom: &[f64], label: &str);

    /// Set the x axis label
    fn set_xlabel(&mut self, label: &str);

    /// Set the y axis label
    fn set_ylabel(&mut self, label: &str);
}

/// Quantities on the axes of [`plot_survival`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotView {
    /// Apparent lifetime against frame interval
    #[default]
    Lifetime,
    /// Apparent off rate `1/τ_app` against `1/Δt`, where the model is a line
    Rate,
}

/// Legend entry of the fitted curve
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Legend {
    /// No legend entry
    None,
    /// Fit result only
    #[default]
    Result,
    /// A caption line followed by the fit result
    Prefixed(String),
}

/// Options of [`plot_survival`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlotOptions {
    /// Axes quantities
    pub view: PlotView,
    /// Report the half-life `ln 2 · t_on` in the legend instead of the lifetime
    pub halflife: bool,
    /// Legend entry of the fitted curve
    pub legend: Legend,
    /// Time unit shown in labels
    pub time_unit: Option<String>,
}

/// x axis label of lifetime plots
pub fn rec_interval_label(time_unit: Option<&str>) -> String {
    match time_unit {
        Some(u) => format!(r"recording interval $\Delta t$ [{}]", u),
        None => r"recording interval $\Delta t$".to_string(),
    }
}

/// y axis label of lifetime plots
pub fn app_lifetime_label(time_unit: Option<&str>) -> String {
    match time_unit {
        Some(u) => format!(r"apparent lifetime $\tau_\text{{app}}$ [{}]", u),
        None => r"apparent lifetime $\tau_\text{app}$".to_string(),
    }
}

fn inverse_interval_label(time_unit: Option<&str>) -> String {
    match time_unit {
        Some(u) => format!(r"inverse recording interval $1/\Delta t$ [1/{}]", u),
        None => r"inverse recording interval $1/\Delta t$".to_string(),
    }
}

fn app_rate_label(time_unit: Option<&str>) -> String {
    match time_unit {
        Some(u) => format!(r"apparent off rate $1/\tau_\text{{app}}$ [1/{}]", u),
        None => r"apparent off rate $1/\tau_\text{app}$".to_string(),
    }
}

/// Legend text of a fit result, e.g. `$\tau_\mathrm{lt} = (2.00 ± 0.15) \mathrm{s}$`
pub fn lifetime_label(fit: &LifetimeResult, halflife: bool, time_unit: Option<&str>) -> String {
    let mul = if halflife { std::f64::consts::LN_2 } else { 1.0 };
    let subscript = if halflife { r"\frac{1}{2}" } else { r"\mathrm{lt}" };
    match fit.lifetime_err {
        None => {
            let val = format_value(fit.lifetime * mul, 2);
            match time_unit {
                Some(u) => format!(r"$\tau_{} = {} \mathrm{{{}}}$", subscript, val, u),
                None => format!(r"$\tau_{} = {}$", subscript, val),
            }
        }
        Some(err) => {
            let val = format_value_with_uncertainty(fit.lifetime * mul, err * mul, 2, true);
            match time_unit {
                Some(u) => format!(r"$\tau_{} = ({}) \mathrm{{{}}}$", subscript, val, u),
                None => format!(r"$\tau_{} = {}$", subscript, val),
            }
        }
    }
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    if n < 2 {
        return vec![start; n];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
        .collect()
}

fn reciprocal(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| 1.0 / v).collect()
}

/// Plot apparent lifetimes with the fitted two-rate model
///
/// Points are the rows that pass [`prepare_apparent_lifetimes`]. The curve
/// spans the smallest to the largest plotted interval. When the fit carries
/// uncertainties, a band between the models at `(t_on − err, c − err)` and
/// `(t_on + err, c + err)` is shaded; its lower edge is 0 if either error
/// reaches its parameter.
pub fn plot_survival<A: PlotAxes>(
    ax: &mut A,
    table: &ApparentLifetimeTable,
    fit: &LifetimeResult,
    min_track_count: usize,
    options: &PlotOptions,
) {
    let rows = prepare_apparent_lifetimes(table, min_track_count);
    let time_unit = options.time_unit.as_deref();
    let rate = options.view == PlotView::Rate;

    let intervals: Vec<f64> = rows.iter().map(|r| r.interval).collect();
    let lifetimes: Vec<f64> = rows.iter().map(|r| r.lifetime_app).collect();
    let errors: Option<Vec<f64>> = rows.iter().map(|r| r.lifetime_app_err).collect();

    let color = if rate {
        // d(1/τ) = dτ / τ²
        let yerr = errors.map(|e| {
            e.iter()
                .zip(&lifetimes)
                .map(|(e, lt)| e / (lt * lt))
                .collect::<Vec<_>>()
        });
        ax.error_bars(&reciprocal(&intervals), &reciprocal(&lifetimes), yerr.as_deref())
    } else {
        ax.error_bars(&intervals, &lifetimes, errors.as_deref())
    };

    if let (Some(&first), Some(&last)) = (intervals.first(), intervals.last()) {
        if fit.is_finite() {
            let curve_x = linspace(first, last, CURVE_POINTS);
            let curve_y: Vec<f64> = curve_x.iter().map(|&x| fit.apparent_lifetime(x)).collect();
            let label = match &options.legend {
                Legend::None => None,
                Legend::Result => Some(lifetime_label(fit, options.halflife, time_unit)),
                Legend::Prefixed(caption) => Some(format!(
                    "{}\n{}",
                    caption,
                    lifetime_label(fit, options.halflife, time_unit)
                )),
            };
            if rate {
                ax.line(&reciprocal(&curve_x), &reciprocal(&curve_y), &color, label.as_deref());
            } else {
                ax.line(&curve_x, &curve_y, &color, label.as_deref());
            }

            if let Some((lower, upper)) = uncertainty_band(fit, &curve_x) {
                if rate {
                    // Reciprocal swaps the edges; a zero lifetime edge is unbounded
                    ax.fill_between(
                        &reciprocal(&curve_x),
                        &reciprocal(&upper),
                        &reciprocal(&lower),
                        &color,
                    );
                } else {
                    ax.fill_between(&curve_x, &lower, &upper, &color);
                }
            }
        } else {
            log::debug!("Fit result is not finite, drawing data points only");
        }
    }

    if rate {
        ax.set_xlabel(&inverse_interval_label(time_unit));
        ax.set_ylabel(&app_rate_label(time_unit));
    } else {
        ax.set_xlabel(&rec_interval_label(time_unit));
        ax.set_ylabel(&app_lifetime_label(time_unit));
    }
}

/// Lower and upper model curves from the fit uncertainties
fn uncertainty_band(fit: &LifetimeResult, curve_x: &[f64]) -> Option<(Vec<f64>, Vec<f64>)> {
    if fit.lifetime_err.is_none() && fit.bleach_err.is_none() {
        return None;
    }
    let lt_err = fit.lifetime_err.unwrap_or(0.0);
    let bl_err = fit.bleach_err.unwrap_or(0.0);
    if !lt_err.is_finite() || !bl_err.is_finite() {
        return None;
    }

    let lower = if lt_err >= fit.lifetime || bl_err >= fit.bleach {
        vec![0.0; curve_x.len()]
    } else {
        curve_x
            .iter()
            .map(|&x| lifetime_model(x, fit.lifetime - lt_err, fit.bleach - bl_err))
            .collect()
    };
    let upper = curve_x
        .iter()
        .map(|&x| lifetime_model(x, fit.lifetime + lt_err, fit.bleach + bl_err))
        .collect();
    Some((lower, upper))
}

/// Stacked bar chart of track counts per censoring type and interval
pub fn plot_censor_composition<A: PlotAxes>(
    ax: &mut A,
    composition: &[CensorComposition],
    time_unit: Option<&str>,
) {
    let categories: Vec<String> = composition.iter().map(|c| c.interval.to_string()).collect();
    let mut bottom = vec![0.0; composition.len()];
    for (kind, name) in CENSOR_NAMES.iter().enumerate() {
        let heights: Vec<f64> = composition.iter().map(|c| c.counts[kind] as f64).collect();
        ax.bar(&categories, &heights, &bottom, name);
        for (b, h) in bottom.iter_mut().zip(&heights) {
            *b += h;
        }
    }
    ax.set_xlabel(&rec_interval_label(time_unit));
    ax.set_ylabel("average track count");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::ApparentLifetimeRow;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        ErrorBars { x: Vec<f64>, y: Vec<f64>, yerr: Option<Vec<f64>> },
        Line { x: Vec<f64>, y: Vec<f64>, label: Option<String> },
        Fill { lower: Vec<f64>, upper: Vec<f64> },
        Bar { categories: Vec<String>, heights: Vec<f64>, bottom: Vec<f64>, label: String },
        XLabel(String),
        YLabel(String),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl PlotAxes for Recorder {
        type Color = u32;

        fn error_bars(&mut self, x: &[f64], y: &[f64], yerr: Option<&[f64]>) -> u32 {
            self.calls.push(Call::ErrorBars {
                x: x.to_vec(),
                y: y.to_vec(),
                yerr: yerr.map(<[f64]>::to_vec),
            });
            7
        }

        fn line(&mut self, x: &[f64], y: &[f64], color: &u32, label: Option<&str>) {
            assert_eq!(*color, 7);
            self.calls.push(Call::Line {
                x: x.to_vec(),
                y: y.to_vec(),
                label: label.map(str::to_string),
            });
        }

        fn fill_between(&mut self, _x: &[f64], lower: &[f64], upper: &[f64], color: &u32) {
            assert_eq!(*color, 7);
            self.calls.push(Call::Fill {
                lower: lower.to_vec(),
                upper: upper.to_vec(),
            });
        }

        fn bar(&mut self, categories: &[String], heights: &[f64], bottom: &[f64], label: &str) {
            self.calls.push(Call::Bar {
                categories: categories.to_vec(),
                heights: heights.to_vec(),
                bottom: bottom.to_vec(),
                label: label.to_string(),
            });
        }

        fn set_xlabel(&mut self, label: &str) {
            self.calls.push(Call::XLabel(label.to_string()));
        }

        fn set_ylabel(&mut self, label: &str) {
            self.calls.push(Call::YLabel(label.to_string()));
        }
    }

    fn table(with_errors: bool) -> ApparentLifetimeTable {
        let rows = [(0.01, 500), (0.02, 500), (0.04, 5), (0.08, 500)]
            .iter()
            .map(|&(dt, n)| ApparentLifetimeRow {
                interval: dt,
                lifetime_app: lifetime_model(dt, 2.0, 50.0),
                lifetime_app_err: with_errors.then_some(0.01),
                track_count: n,
            })
            .collect();
        ApparentLifetimeTable::from_rows(rows)
    }

    fn fit() -> LifetimeResult {
        LifetimeResult {
            lifetime: 2.0,
            bleach: 50.0,
            lifetime_err: Some(0.15),
            bleach_err: Some(3.0),
        }
    }

    #[test]
    fn test_axis_labels() {
        assert_eq!(rec_interval_label(Some("s")), r"recording interval $\Delta t$ [s]");
        assert_eq!(rec_interval_label(None), r"recording interval $\Delta t$");
        assert_eq!(app_lifetime_label(Some("s")), r"apparent lifetime $\tau_\text{app}$ [s]");
    }

    #[test]
    fn test_lifetime_label() {
        assert_eq!(
            lifetime_label(&fit(), false, Some("s")),
            r"$\tau_\mathrm{lt} = (2.00 ± 0.15) \mathrm{s}$"
        );
        assert_eq!(lifetime_label(&fit(), false, None), r"$\tau_\mathrm{lt} = 2.00 ± 0.15$");

        let no_err = LifetimeResult {
            lifetime_err: None,
            bleach_err: None,
            ..fit()
        };
        // ln 2 · 2 = 1.386…
        assert_eq!(
            lifetime_label(&no_err, true, Some("s")),
            r"$\tau_\frac{1}{2} = 1.4 \mathrm{s}$"
        );
    }

    #[test]
    fn test_plot_survival_lifetime_view() {
        let mut ax = Recorder::default();
        let options = PlotOptions {
            time_unit: Some("s".into()),
            ..Default::default()
        };
        plot_survival(&mut ax, &table(true), &fit(), 10, &options);

        assert_eq!(ax.calls.len(), 5);
        match &ax.calls[0] {
            Call::ErrorBars { x, yerr, .. } => {
                // Sparse 0.04 interval is not plotted
                assert_eq!(x, &vec![0.01, 0.02, 0.08]);
                assert_eq!(yerr.as_ref().map(Vec::len), Some(3));
            }
            other => panic!("unexpected call {:?}", other),
        }
        match &ax.calls[1] {
            Call::Line { x, y, label } => {
                assert_eq!(x.len(), CURVE_POINTS);
                assert_eq!(x[0], 0.01);
                assert_eq!(x[CURVE_POINTS - 1], 0.08);
                assert!((y[0] - lifetime_model(0.01, 2.0, 50.0)).abs() < 1e-12);
                assert!(label.as_deref().unwrap().contains("2.00 ± 0.15"));
            }
            other => panic!("unexpected call {:?}", other),
        }
        match &ax.calls[2] {
            Call::Fill { lower, upper } => {
                assert!(lower.iter().zip(upper).all(|(l, u)| l < u));
                assert!(lower[0] > 0.0);
            }
            other => panic!("unexpected call {:?}", other),
        }
        assert_eq!(ax.calls[3], Call::XLabel(rec_interval_label(Some("s"))));
        assert_eq!(ax.calls[4], Call::YLabel(app_lifetime_label(Some("s"))));
    }

    #[test]
    fn test_band_lower_edge_zero_for_large_errors() {
        let wide = LifetimeResult {
            lifetime_err: Some(3.0),
            ..fit()
        };
        let mut ax = Recorder::default();
        plot_survival(&mut ax, &table(false), &wide, 10, &PlotOptions::default());
        let fill = ax.calls.iter().find_map(|c| match c {
            Call::Fill { lower, .. } => Some(lower.clone()),
            _ => None,
        });
        assert!(fill.unwrap().iter().all(|&l| l == 0.0));
    }

    #[test]
    fn test_no_band_without_errors() {
        let bare = LifetimeResult {
            lifetime_err: None,
            bleach_err: None,
            ..fit()
        };
        let mut ax = Recorder::default();
        let options = PlotOptions {
            legend: Legend::Prefixed("wild type".into()),
            ..Default::default()
        };
        plot_survival(&mut ax, &table(false), &bare, 10, &options);
        assert!(!ax.calls.iter().any(|c| matches!(c, Call::Fill { .. })));
        let label = ax.calls.iter().find_map(|c| match c {
            Call::Line { label, .. } => label.clone(),
            _ => None,
        });
        assert_eq!(label.unwrap(), "wild type\n$\\tau_\\mathrm{lt} = 2.0$");
    }

    #[test]
    fn test_rate_view_is_linear() {
        let mut ax = Recorder::default();
        let options = PlotOptions {
            view: PlotView::Rate,
            legend: Legend::None,
            ..Default::default()
        };
        plot_survival(&mut ax, &table(false), &fit(), 10, &options);
        match &ax.calls[1] {
            Call::Line { x, y, label } => {
                assert!(label.is_none());
                for (&inv_dt, &rate) in x.iter().zip(y) {
                    let expected = 1.0 / 2.0 + inv_dt / 50.0;
                    assert!((rate - expected).abs() < 1e-9);
                }
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_plot_censor_composition() {
        let composition = vec![
            CensorComposition {
                interval: 0.01,
                counts: [5, 1, 2, 0],
            },
            CensorComposition {
                interval: 0.02,
                counts: [3, 0, 1, 1],
            },
        ];
        let mut ax = Recorder::default();
        plot_censor_composition(&mut ax, &composition, Some("s"));

        assert_eq!(ax.calls.len(), 6);
        match &ax.calls[2] {
            Call::Bar {
                categories,
                heights,
                bottom,
                label,
            } => {
                assert_eq!(categories, &vec!["0.01".to_string(), "0.02".to_string()]);
                assert_eq!(heights, &vec![2.0, 1.0]);
                assert_eq!(bottom, &vec![6.0, 3.0]);
                assert_eq!(label, "at end");
            }
            other => panic!("unexpected call {:?}", other),
        }
        assert_eq!(ax.calls[5], Call::YLabel("average track count".into()));
    }
}
