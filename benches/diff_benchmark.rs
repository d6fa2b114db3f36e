//! Diff engine benchmark: Measure edit computation and batch planning.
//!
//! Both run once per key on the emitting thread, so they must stay far
//! below the 50ms commit gap.

use backtype::{diff, plan_batch_commit, Batch};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn runes(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// A word of `len` runes with a diacritic every third rune.
fn word(len: usize, seed: usize) -> Vec<char> {
    const ALPHABET: [char; 8] = ['t', 'ô', 'i', 'n', 'g', 'ư', 'ờ', 'a'];
    (0..len).map(|i| ALPHABET[(i + seed) % ALPHABET.len()]).collect()
}

fn diff_typical_word(c: &mut Criterion) {
    let old = runes("nguoiw");
    let new = runes("người");

    c.bench_function("diff_word_correction", |b| {
        b.iter(|| diff(black_box(&old), black_box(&new)));
    });
}

fn diff_identical(c: &mut Criterion) {
    let old = word(64, 0);
    let new = old.clone();

    c.bench_function("diff_64_identical", |b| {
        b.iter(|| diff(black_box(&old), black_box(&new)));
    });
}

fn diff_by_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_by_length");

    for len in [8, 32, 128, 512] {
        let old = word(len, 0);
        let mut new = old.clone();
        // Change the rune in the middle so half the text is replaced
        new[len / 2] = 'ế';

        group.bench_with_input(BenchmarkId::new("mid_change", len), &(old, new), |b, (old, new)| {
            b.iter(|| diff(black_box(old), black_box(new)));
        });
    }

    group.finish();
}

fn batch_replay(c: &mut Criterion) {
    // Ten queued words, as after a stall in a slow consumer
    let words: Vec<String> = (0..10).map(|i| word(6, i).into_iter().collect()).collect();
    let old = runes("ngu");

    c.bench_function("batch_ten_words", |b| {
        b.iter(|| {
            let mut batch = Batch::with_head("nguo".to_string(), false);
            for w in &words {
                batch.extend(w.clone(), false);
                batch.extend(format!("{w} "), true);
            }
            let new: Vec<char> = batch.text().chars().collect();
            plan_batch_commit(black_box(&old), black_box(&new), 1, false)
        });
    });
}

criterion_group!(benches, diff_typical_word, diff_identical, diff_by_length, batch_replay);
criterion_main!(benches);
