use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use weft_core::{
    create_root, reconcile_children, HostTree, KeyedListMapper, MemoryTree, NodeId,
};

const LIST_SIZES: &[usize] = &[16, 128, 1024];

struct ListFixture {
    tree: MemoryTree,
    parent: NodeId,
    nodes: Vec<NodeId>,
}

impl ListFixture {
    fn new(len: usize) -> Self {
        let mut tree = MemoryTree::new();
        let parent = tree.create_element("list");
        let nodes: Vec<NodeId> = (0..len)
            .map(|i| tree.create_text(&format!("row {i}")))
            .collect();
        for &node in &nodes {
            tree.append_child(parent, node).expect("append");
        }
        Self {
            tree,
            parent,
            nodes,
        }
    }

    /// Swap neighbours pairwise; every other node moves.
    fn shuffled(&self) -> Vec<NodeId> {
        let mut target = self.nodes.clone();
        for pair in target.chunks_mut(2) {
            pair.reverse();
        }
        target
    }
}

fn bench_reconcile_shuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_shuffle");
    for &len in LIST_SIZES {
        group.bench_with_input(BenchmarkId::new("nodes", len), &len, |b, &len| {
            let mut fixture = ListFixture::new(len);
            let ordered = fixture.nodes.clone();
            let shuffled = fixture.shuffled();
            b.iter(|| {
                reconcile_children(&mut fixture.tree, fixture.parent, &ordered, &shuffled, None)
                    .expect("shuffle");
                reconcile_children(&mut fixture.tree, fixture.parent, &shuffled, &ordered, None)
                    .expect("restore");
                black_box(fixture.tree.mutations());
            });
        });
    }
    group.finish();
}

fn bench_reconcile_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile_reverse");
    for &len in LIST_SIZES {
        group.bench_with_input(BenchmarkId::new("nodes", len), &len, |b, &len| {
            let mut fixture = ListFixture::new(len);
            let mut current = fixture.nodes.clone();
            b.iter(|| {
                let target: Vec<NodeId> = current.iter().rev().copied().collect();
                reconcile_children(&mut fixture.tree, fixture.parent, &current, &target, None)
                    .expect("reverse");
                current = target;
            });
        });
    }
    group.finish();
}

fn bench_mapper_rotate(c: &mut Criterion) {
    let mut group = c.benchmark_group("keyed_mapper_rotate");
    for &len in LIST_SIZES {
        group.bench_with_input(BenchmarkId::new("items", len), &len, |b, &len| {
            create_root(|root| {
                let mut items: Vec<u32> = (0..len as u32).collect();
                let mut mapper: KeyedListMapper<u32, u32, u32> = KeyedListMapper::new();
                mapper.update(&items, |item, _| *item);
                b.iter(|| {
                    items.rotate_left(1);
                    black_box(mapper.update(&items, |item, _| *item).len());
                });
                root.dispose();
            });
        });
    }
    group.finish();
}

criterion_group!(
    reconcile,
    bench_reconcile_shuffle,
    bench_reconcile_reverse,
    bench_mapper_rotate
);
criterion_main!(reconcile);
