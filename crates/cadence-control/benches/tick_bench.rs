// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use cadence_control::{Action, Args};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

fn counting_leaf(counter: &Arc<AtomicU64>, priority: i32) -> Action {
    let counter = Arc::clone(counter);
    Action::unnamed()
        .with_priority(priority)
        .with_function(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
}

fn wide_tree(counter: &Arc<AtomicU64>) -> Action {
    let root = Action::phase("root");
    for phase_index in 0..5 {
        let phase = Action::phase(format!("phase_{phase_index}"))
            .with_priority(phase_index * 10)
            .with_parent(&root);
        for i in 0..200 {
            phase.register(&counting_leaf(counter, i % 7));
        }
    }
    root
}

fn deep_tree(counter: &Arc<AtomicU64>) -> Action {
    let root = Action::phase("root");
    let mut tip = root.clone();
    for _ in 0..256 {
        let next = counting_leaf(counter, 1).with_parent(&tip);
        tip = next;
    }
    root
}

fn bench_ticks(c: &mut Criterion) {
    let counter = Arc::new(AtomicU64::new(0));
    let wide = wide_tree(&counter);
    let deep = deep_tree(&counter);
    let args = Args::new().with("gain", 0.5);

    let mut group = c.benchmark_group("Action Tree Tick");

    group.bench_function("Wide (5 phases x 200 leaves)", |b| {
        b.iter(|| wide.run(black_box(&args)));
    });

    group.bench_function("Deep (256 levels)", |b| {
        b.iter(|| deep.run(black_box(&args)));
    });

    group.finish();
    black_box(counter.load(Ordering::Relaxed));
}

criterion_group!(benches, bench_ticks);
criterion_main!(benches);
