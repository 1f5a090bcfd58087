use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;

use cachemodel::cache::{Cache, WriteMissPolicy, WritePolicy};
use cachemodel::memory::BackingStore;
use cachemodel::replacement_policies::PolicyKind;
use cachemodel::simulator::{Access, Simulator};

const SEQUENCE_LENGTH: usize = 100_000;
const MEMORY_SIZE: u64 = 1 << 20;

fn sequential_accesses() -> Vec<Access> {
    (0..SEQUENCE_LENGTH)
        .map(|i| Access::read((i as u64 * 4) % MEMORY_SIZE))
        .collect()
}

fn random_accesses() -> Vec<Access> {
    let mut rng = rand::rng();
    (0..SEQUENCE_LENGTH)
        .map(|_| {
            let address = rng.random_range(0..MEMORY_SIZE);
            if rng.random_bool(0.3) {
                Access::write(address, rng.random())
            } else {
                Access::read(address)
            }
        })
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Simulate");
    let workloads = [("sequential", sequential_accesses()), ("random", random_accesses())];
    for kind in [PolicyKind::Lru, PolicyKind::Fifo, PolicyKind::Random] {
        for (name, accesses) in &workloads {
            group.bench_with_input(
                BenchmarkId::new(format!("{kind:?}"), name),
                accesses,
                |bench, accesses| {
                    bench.iter(|| {
                        let cache = Cache::new(
                            256,
                            16,
                            4,
                            kind,
                            WritePolicy::WriteBack,
                            WriteMissPolicy::WriteAllocate,
                        )
                        .unwrap();
                        let memory = BackingStore::new(MEMORY_SIZE, 16);
                        let mut simulator = Simulator::new(cache, Some(memory));
                        simulator.load_accesses(accesses.clone());
                        simulator.run_all().unwrap();
                    });
                },
            );
        }
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
