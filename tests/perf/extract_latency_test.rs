use std::time::Instant;

use crate::collation::sort_by_name;
use crate::extract::extract;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

fn clipboard_mix() -> Vec<String> {
    (0..100)
        .flat_map(|i| {
            [
                format!("https://pbs.twimg.com/media/ABCDEFGHIJK{i:04}?format=jpg&name=orig"),
                format!("https://64.media.tumblr.com/abc/tumblr_n{i:05}xyzo1_1280.jpg"),
                format!("https://example.org/files/Holiday%20Photo%20{i}.jpeg"),
                format!("Quarterly report {i}.pdf"),
            ]
        })
        .collect()
}

#[test]
fn extraction_batch_p95_under_60ms() {
    let inputs = clipboard_mix();

    for raw in inputs.iter().take(100) {
        let _ = extract(raw);
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(40);
        for _ in 0..40 {
            let start = Instant::now();
            for raw in &inputs {
                let _ = extract(raw);
            }
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 60.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 60.0ms); batches={batch_p95:?}",
    );
}

#[test]
fn sorting_two_thousand_names_under_500ms() {
    let mut names: Vec<String> = (0..2_000)
        .rev()
        .map(|i| format!("Écran_{i:05}.png"))
        .collect();

    let start = Instant::now();
    sort_by_name(&mut names, |name| name.as_str());
    let elapsed = start.elapsed().as_secs_f64() * 1000.0;

    assert_eq!(names[0], "Écran_00000.png");
    assert!(elapsed <= 500.0, "sort took {elapsed:.3}ms (budget 500.0ms)");
}
