use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chpt_md::Graph;

fn complete_graph(n: u32) -> Graph {
    let mut graph = Graph::new(n as usize);
    for u in 0..n {
        for v in u + 1..n {
            graph.add_edge(u, v).unwrap();
        }
    }
    graph
}

fn path_graph(n: u32) -> Graph {
    let mut graph = Graph::new(n as usize);
    for u in 1..n {
        graph.add_edge(u - 1, u).unwrap();
    }
    graph
}

fn petersen_graph() -> Graph {
    let mut graph = Graph::new(10);
    let edges = [
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 4),
        (4, 0),
        (5, 7),
        (7, 9),
        (9, 6),
        (6, 8),
        (8, 5),
        (0, 5),
        (1, 6),
        (2, 7),
        (3, 8),
        (4, 9),
    ];
    for (u, v) in edges {
        graph.add_edge(u, v).unwrap();
    }
    graph
}

fn criterion_benchmark(c: &mut Criterion) {
    let petersen = petersen_graph();
    let complete = complete_graph(128);
    let path = path_graph(128);

    c.bench_function("petersen", |b| b.iter(|| chpt_md::compute(black_box(&petersen))));
    c.bench_function("complete_128", |b| b.iter(|| chpt_md::compute(black_box(&complete))));
    c.bench_function("path_128", |b| b.iter(|| chpt_md::compute(black_box(&path))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
