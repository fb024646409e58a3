//! Minimal SVG chart rendering for analysis artifacts.
//!
//! The numeric JSON is the contract; these charts are a quick visual check.
//! Each metric with a recognizable x-axis gets its other series drawn as
//! polylines, with gaps where cells are null.

use crate::domain::result::AnalysisResult;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 360.0;
const PADDING: f64 = 48.0;

const PALETTE: [&str; 4] = ["#4fc3f7", "#81c784", "#ff8a65", "#90a4ae"];

/// Candidate x-axis series, in preference order.
const X_AXES: [&str; 5] = [
    "price",
    "kelly_fraction",
    "hour",
    "lorenz_pct_trades",
    "hist_lo",
];

/// Render a line chart for the result's primary series, or None when no
/// recognizable x-axis is present (e.g. label-keyed tables).
pub fn render(result: &AnalysisResult) -> Option<String> {
    let x_name = X_AXES.iter().find(|n| result.series.contains_key(**n))?;
    let xs: Vec<f64> = result.series[*x_name].iter().map(|v| v.unwrap_or(0.0)).collect();
    if xs.len() < 2 {
        return None;
    }

    let ys: Vec<(&String, &Vec<Option<f64>>)> = result
        .series
        .iter()
        .filter(|(name, _)| name.as_str() != *x_name)
        .take(PALETTE.len())
        .collect();
    if ys.is_empty() {
        return None;
    }

    let (x_min, x_max) = bounds(xs.iter().copied());
    let (y_min, y_max) = bounds(ys.iter().flat_map(|(_, v)| v.iter().flatten().copied()));
    if !(x_max > x_min) || !y_min.is_finite() {
        return None;
    }
    let y_span = if y_max > y_min { y_max - y_min } else { 1.0 };

    let plot_w = WIDTH - 2.0 * PADDING;
    let plot_h = HEIGHT - 2.0 * PADDING;
    let sx = |x: f64| PADDING + (x - x_min) / (x_max - x_min) * plot_w;
    let sy = |y: f64| HEIGHT - PADDING - (y - y_min) / y_span * plot_h;

    let mut body = String::new();
    body.push_str(&format!(
        r##"<rect width="{WIDTH}" height="{HEIGHT}" fill="#0e1117"/>
<line x1="{p}" y1="{p}" x2="{p}" y2="{b}" stroke="#333"/>
<line x1="{p}" y1="{b}" x2="{r}" y2="{b}" stroke="#333"/>
"##,
        p = PADDING,
        b = HEIGHT - PADDING,
        r = WIDTH - PADDING,
    ));

    for (i, (name, values)) in ys.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        // break the polyline at null cells instead of bridging them
        let mut segments: Vec<Vec<String>> = vec![Vec::new()];
        for (x, value) in xs.iter().zip(values.iter()) {
            match value {
                Some(y) => segments
                    .last_mut()
                    .unwrap()
                    .push(format!("{:.1},{:.1}", sx(*x), sy(*y))),
                None => {
                    if !segments.last().unwrap().is_empty() {
                        segments.push(Vec::new());
                    }
                }
            }
        }
        for segment in segments.iter().filter(|s| s.len() > 1) {
            body.push_str(&format!(
                r#"<polyline points="{}" fill="none" stroke="{color}" stroke-width="1.5"/>
"#,
                segment.join(" ")
            ));
        }
        body.push_str(&format!(
            r#"<text x="{x}" y="{y}" fill="{color}" font-size="12" font-family="sans-serif">{name}</text>
"#,
            x = PADDING + 6.0,
            y = PADDING + 16.0 + 16.0 * i as f64,
        ));
    }

    body.push_str(&format!(
        r##"<text x="{x}" y="20" fill="#e0e0e0" font-size="14" font-family="sans-serif">{}</text>
"##,
        result.metric_name,
        x = PADDING,
    ));

    Some(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}">
{body}</svg>
"#
    ))
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}
