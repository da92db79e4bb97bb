//! cargo bench --bench nfa_match
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use triregex::Regex;

pub fn criterion_benchmark(c: &mut Criterion) {
    {
        let mut re = Regex::new(r"[0-9]{4}-[0-9]{2}-[0-9]{2}").unwrap();
        c.bench_function("match_literal_class_concat", |b| {
            b.iter(|| re.is_match(black_box(b"order placed on 2010-03-14 at noon")))
        });
    }

    {
        let mut re = Regex::new(r"^(ab)*c$").unwrap();
        c.bench_function("match_star_repetition", |b| {
            b.iter(|| re.is_match(black_box(b"abababababababababababababababc")))
        });
    }

    {
        let mut re = Regex::builder()
            .partial_match(false)
            .build(r"^(\w+)\s(\1)$")
            .unwrap();
        c.bench_function("match_back_reference", |b| {
            b.iter(|| re.is_match(black_box(b"echo echo")))
        });
    }

    {
        let mut re = Regex::new(r"(abc){2,5}d").unwrap();
        c.bench_function("match_bounded_repetition", |b| {
            b.iter(|| re.is_match(black_box(b"abcabcabcabcd")))
        });
    }

    {
        let mut re = Regex::new(r"(a|b|c|d|e)+end").unwrap();
        c.bench_function("match_alternation_and_captures", |b| {
            b.iter(|| re.captures(black_box(b"abcdabcdabcdend")))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
