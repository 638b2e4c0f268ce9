//! Move generation stays quiet below trace level.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use strictly_chess::{Position, all_legal_moves, classify};
use tracing::span::{Attributes, Id};
use tracing::{Subscriber, subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

/// Counts spans that pass its filter.
struct SpanCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for SpanCounter {
    fn on_new_span(&self, _attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

fn spans_at(level: LevelFilter) -> usize {
    let count = Arc::new(AtomicUsize::new(0));
    let registry = Registry::default().with(SpanCounter(Arc::clone(&count)).with_filter(level));
    subscriber::with_default(registry, || {
        let position = Position::start();
        assert_eq!(all_legal_moves(&position).len(), 20);
        classify(&position);
    });
    count.load(Ordering::SeqCst)
}

#[test]
fn test_move_generation_spans_are_trace_level() {
    assert_eq!(spans_at(LevelFilter::DEBUG), 0);
    // One span per generator call once trace is on.
    assert!(spans_at(LevelFilter::TRACE) > 20);
}
