//! Benchmarks for the hot-path pieces of the memory and output pipeline:
//! hot-window selection (runs every turn), cold-memory similarity search
//! (scales with archive size), and output-sanitizer buffering (runs per
//! streamed chunk). Retargeted from the teacher's token-estimation/
//! message-truncation benchmarks onto their orchestrator-side successors.

use std::sync::Arc;

use async_trait::async_trait;
use chat_orchestrator::{EmbeddingProvider, ExecutionPath, HotWindow, Message, OutputSanitizer};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;
use uuid::Uuid;

struct ConstantEmbedder;

#[async_trait]
impl EmbeddingProvider for ConstantEmbedder {
    async fn embed(&self, _text: &str) -> chat_orchestrator::Result<Vec<f32>> {
        Ok(vec![0.3, 0.7, 0.1])
    }
}

fn message_with_seq(seq: u64, text_size: usize) -> Message {
    let mut m = Message::user(Uuid::new_v4(), "a".repeat(text_size));
    m.sequence_number = seq;
    m
}

fn embedded_candidates(count: usize) -> Vec<Message> {
    (0..count)
        .map(|i| {
            let mut m = message_with_seq(i as u64, 50);
            m.embedding = Some(vec![(i % 3) as f32 * 0.3, 0.5, 0.2]);
            m
        })
        .collect()
}

fn bench_hot_window_select_by_history_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("hot_window_select");

    for count in [10, 100, 1_000, 10_000].iter() {
        let messages: Vec<Message> = (0..*count as u64).map(|i| message_with_seq(i, 100)).collect();
        let window = HotWindow::new(50);
        group.bench_with_input(BenchmarkId::from_parameter(count), &messages, |b, msgs| {
            b.iter(|| window.select(black_box(msgs)));
        });
    }

    group.finish();
}

fn bench_cold_memory_retrieve_by_archive_size(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("cold_memory_retrieve");
    let embedder = ConstantEmbedder;

    for count in [10, 100, 1_000].iter() {
        let cold = chat_orchestrator::ColdMemory::new(5);
        let candidates = embedded_candidates(*count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &candidates, |b, msgs| {
            b.iter(|| {
                rt.block_on(cold.retrieve(black_box(&embedder), black_box("query text"), black_box(msgs)))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_memory_composition_by_hot_window(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("memory_composition");
    let embedder = ConstantEmbedder;
    let conversation_id = Uuid::new_v4();

    for hot_size in [10, 50, 200].iter() {
        let composer = chat_orchestrator::MemoryComposer::new("You are a helpful assistant.", *hot_size, 5);
        let history: Vec<Message> = (0..*hot_size as u64 * 2).map(|i| message_with_seq(i, 80)).collect();
        let archive = embedded_candidates(200);

        group.bench_with_input(BenchmarkId::from_parameter(hot_size), &(history, archive), |b, (h, a)| {
            b.iter(|| {
                rt.block_on(composer.compose(
                    conversation_id,
                    black_box(h),
                    black_box(a),
                    Some("a running summary of the conversation so far"),
                    &embedder,
                    "query text",
                ))
                .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_output_sanitizer_buffering(c: &mut Criterion) {
    let mut group = c.benchmark_group("output_sanitizer_buffering");

    for chunk_count in [10, 100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(chunk_count), chunk_count, |b, &n| {
            b.iter(|| {
                let mut sanitizer = OutputSanitizer::new(ExecutionPath::Tool);
                for i in 0..n {
                    black_box(sanitizer.content(format!("token {i} ")));
                }
                sanitizer.end_iteration(false)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_hot_window_select_by_history_size,
    bench_cold_memory_retrieve_by_archive_size,
    bench_memory_composition_by_hot_window,
    bench_output_sanitizer_buffering,
);
criterion_main!(benches);
