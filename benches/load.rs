use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use household_loader::index::index;
use household_loader::model::{Address, Household, ImportRecord, Member, Sex};
use household_loader::{
    denormalize, CollectionKind, Dataset, ImportKey, InMemoryDocumentStore, Loader, LoaderConfig,
    RunContext,
};

const HOUSEHOLDS: usize = 500;

/// A family of four per household, plus one departed member in ten with no
/// household at all.
fn make_dataset() -> Dataset {
    let mut members = Vec::new();
    let mut households = Vec::new();
    let mut addresses = Vec::new();

    for h in 0..HOUSEHOLDS {
        let hk = format!("H{h}");
        let mut household = Household::headed_by(format!("M{h}-0"))
            .with_spouse(format!("M{h}-1"))
            .with_address(format!("A{h}"));
        for m in 0..4 {
            let mut member = Member::new(format!("Family{h}"), format!("Given{m}"), Sex::Female);
            member.household = Some(ImportKey::new(hk.clone()));
            if m >= 2 {
                member.father = Some(ImportKey::new(format!("M{h}-0")));
                member.mother = Some(ImportKey::new(format!("M{h}-1")));
                household = household.with_other(format!("M{h}-{m}"));
            }
            members.push(ImportRecord::new(format!("M{h}-{m}"), member));
        }
        if h % 10 == 0 {
            members.push(ImportRecord::new(
                format!("D{h}"),
                Member::new(format!("Family{h}"), "Departed", Sex::Male),
            ));
        }
        households.push(ImportRecord::new(hk, household));
        addresses.push(ImportRecord::new(
            format!("A{h}"),
            Address::new(format!("{h} High Street"), "Ely"),
        ));
    }

    Dataset {
        members,
        households,
        addresses,
    }
}

fn bench_denormalize(c: &mut Criterion) {
    let dataset = make_dataset();
    let addresses = index(CollectionKind::Addresses, dataset.addresses, usize::MAX).unwrap();
    let members = index(CollectionKind::Members, dataset.members, usize::MAX).unwrap();
    let households = index(CollectionKind::Households, dataset.households, usize::MAX).unwrap();

    let mut group = c.benchmark_group("load");
    group.throughput(Throughput::Elements(HOUSEHOLDS as u64));
    group.bench_function("denormalize", |b| {
        b.iter(|| {
            let ctx = RunContext::new(usize::MAX);
            denormalize(&ctx, &households, &members, &addresses).unwrap()
        });
    });
    group.finish();
}

fn bench_full_load(c: &mut Criterion) {
    let dataset = make_dataset();
    let config = LoaderConfig::default().progress_every(usize::MAX);

    let mut group = c.benchmark_group("load");
    group.throughput(Throughput::Elements(HOUSEHOLDS as u64));
    group.bench_function("in_memory", |b| {
        b.iter_batched(
            || {
                let store = Arc::new(InMemoryDocumentStore::new());
                (Loader::new(store, config.clone()), dataset.clone())
            },
            |(loader, dataset)| loader.run(dataset).unwrap(),
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(load, bench_denormalize, bench_full_load);
criterion_main!(load);
