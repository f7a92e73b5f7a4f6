//! Column detection and reading-order assignment.
//!
//! Reading order is never the content-stream insertion order. Runs are
//! clustered by their left edge; when two or more well-populated clusters
//! are separated by a clear gap the page is treated as multi-column, and
//! runs are ordered column by column, top to bottom, left to right.

use crate::text::TextRun;

/// Minimum number of runs sharing a left edge before the cluster counts
/// as a column.
pub const MIN_RUNS_PER_COLUMN: usize = 3;

/// Maximum spread (points) between left edges inside one cluster.
pub const CLUSTER_TOLERANCE_PT: f64 = 8.0;

/// Minimum gap (points) between neighboring clusters for the page to be
/// considered multi-column.
pub const COLUMN_GAP_PT: f64 = 24.0;

/// Detect column left edges from the runs on one page.
///
/// Returns the representative left edge of each detected column, sorted
/// left to right. A single-element vector means one column (or no clear
/// multi-modal structure).
pub fn detect_column_edges(runs: &[TextRun]) -> Vec<f64> {
    if runs.is_empty() {
        return vec![0.0];
    }

    let mut edges: Vec<f64> = runs.iter().map(|r| r.bbox.x0).collect();
    edges.sort_by(|a, b| a.partial_cmp(b).unwrap());

    // Single-link clustering over the sorted left edges.
    let mut clusters: Vec<(f64, usize)> = Vec::new(); // (leftmost edge, count)
    let mut cluster_start = edges[0];
    let mut prev = edges[0];
    let mut count = 1;
    for &x in &edges[1..] {
        if x - prev <= CLUSTER_TOLERANCE_PT {
            count += 1;
        } else {
            clusters.push((cluster_start, count));
            cluster_start = x;
            count = 1;
        }
        prev = x;
    }
    clusters.push((cluster_start, count));

    let qualified: Vec<f64> = clusters
        .iter()
        .filter(|(_, n)| *n >= MIN_RUNS_PER_COLUMN)
        .map(|(x, _)| *x)
        .collect();

    // Multi-column needs at least two populated clusters with a clear gap
    // between each neighbor pair.
    if qualified.len() >= 2
        && qualified
            .windows(2)
            .all(|w| w[1] - w[0] >= COLUMN_GAP_PT)
    {
        qualified
    } else {
        vec![edges[0]]
    }
}

/// Index of the column a run belongs to, given sorted column edges.
fn column_index(x0: f64, edges: &[f64]) -> usize {
    // Boundaries sit midway between neighboring column edges.
    edges
        .windows(2)
        .take_while(|w| x0 >= (w[0] + w[1]) / 2.0)
        .count()
}

/// Sort runs into reading order and assign `reading_order_index`.
///
/// Primary key: column index. Secondary: top edge. Tertiary: left edge.
pub fn assign_reading_order(runs: &mut [TextRun]) {
    let edges = detect_column_edges(runs);
    runs.sort_by(|a, b| {
        let col_a = column_index(a.bbox.x0, &edges);
        let col_b = column_index(b.bbox.x0, &edges);
        col_a
            .cmp(&col_b)
            .then(a.bbox.top.partial_cmp(&b.bbox.top).unwrap())
            .then(a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap())
    });
    for (i, run) in runs.iter_mut().enumerate() {
        run.reading_order_index = i;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::text::{FontWeight, Rgb};

    fn run(x0: f64, top: f64) -> TextRun {
        TextRun {
            page: 0,
            text: "x".to_string(),
            bbox: BBox::new(x0, top, x0 + 50.0, top + 10.0),
            font_family: "Arial".to_string(),
            font_family_raw: "ArialMT".to_string(),
            size_pt: 10.0,
            weight: FontWeight::Regular,
            color: Rgb::BLACK,
            reading_order_index: 0,
        }
    }

    #[test]
    fn empty_page_single_default_edge() {
        assert_eq!(detect_column_edges(&[]), vec![0.0]);
    }

    #[test]
    fn single_column_detected() {
        let runs: Vec<TextRun> = (0..6).map(|i| run(72.0, 100.0 + i as f64 * 14.0)).collect();
        let edges = detect_column_edges(&runs);
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn two_columns_detected() {
        let mut runs = Vec::new();
        for i in 0..5 {
            runs.push(run(56.0, 100.0 + i as f64 * 14.0));
            runs.push(run(310.0, 100.0 + i as f64 * 14.0));
        }
        let edges = detect_column_edges(&runs);
        assert_eq!(edges, vec![56.0, 310.0]);
    }

    #[test]
    fn sparse_cluster_does_not_form_column() {
        // Only two runs at the right edge: below MIN_RUNS_PER_COLUMN
        let mut runs: Vec<TextRun> = (0..5).map(|i| run(56.0, 100.0 + i as f64 * 14.0)).collect();
        runs.push(run(400.0, 100.0));
        runs.push(run(400.0, 130.0));
        assert_eq!(detect_column_edges(&runs).len(), 1);
    }

    #[test]
    fn narrow_gap_is_single_column() {
        let mut runs = Vec::new();
        for i in 0..5 {
            runs.push(run(56.0, 100.0 + i as f64 * 14.0));
            runs.push(run(70.0, 100.0 + i as f64 * 14.0));
        }
        // 14pt apart: inside cluster tolerance? No (8pt), but gap < 24pt
        assert_eq!(detect_column_edges(&runs).len(), 1);
    }

    #[test]
    fn single_column_order_is_top_then_left() {
        let mut runs = vec![run(100.0, 300.0), run(72.0, 100.0), run(150.0, 100.0)];
        assign_reading_order(&mut runs);
        assert_eq!(runs[0].bbox.top, 100.0);
        assert_eq!(runs[0].bbox.x0, 72.0);
        assert_eq!(runs[1].bbox.x0, 150.0);
        assert_eq!(runs[2].bbox.top, 300.0);
        let indices: Vec<usize> = runs.iter().map(|r| r.reading_order_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn two_column_page_orders_column_one_first() {
        // Hand-labeled fixture: left column x0=56, right column x0=310,
        // interleaved insertion order.
        let mut runs = Vec::new();
        for i in 0..4 {
            runs.push(run(310.0, 100.0 + i as f64 * 20.0));
            runs.push(run(56.0, 100.0 + i as f64 * 20.0));
        }
        assign_reading_order(&mut runs);

        let split = runs.iter().position(|r| r.bbox.x0 > 200.0).unwrap();
        assert_eq!(split, 4, "all column-1 runs must precede column 2");
        assert!(runs[..split].iter().all(|r| r.bbox.x0 < 200.0));
        assert!(runs[split..].iter().all(|r| r.bbox.x0 > 200.0));

        // Strictly increasing reading order within each column, top to bottom
        for col in [&runs[..split], &runs[split..]] {
            for pair in col.windows(2) {
                assert!(pair[0].bbox.top <= pair[1].bbox.top);
                assert!(pair[0].reading_order_index < pair[1].reading_order_index);
            }
        }
    }
}
