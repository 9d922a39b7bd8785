use count_store::memory::MemoryCounterStore;
use count_store::{CounterKey, CounterStore, GraphId, TypeId};

fn key() -> CounterKey {
    CounterKey::instances(&GraphId::new("kb"), &TypeId::new("person"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_sum_regardless_of_interleaving() {
    let store = MemoryCounterStore::new();
    let deltas: Vec<i64> =
        (0..64).map(|i| if i % 3 == 0 { -7 } else { 11 }).collect();
    let expected: i64 = deltas.iter().sum();

    let tasks: Vec<_> = deltas
        .into_iter()
        .map(|d| {
            let store = store.clone();
            tokio::spawn(async move { store.increment_count(&key(), d).await })
        })
        .collect();

    for t in tasks {
        t.await.unwrap().unwrap();
    }
    assert_eq!(store.get_count(&key()).await.unwrap(), expected);
}

#[tokio::test]
async fn grouping_of_deltas_does_not_change_the_total() {
    let one_by_one = MemoryCounterStore::new();
    for d in [5, -2, 9, 40, -1] {
        one_by_one.increment_count(&key(), d).await.unwrap();
    }

    let grouped = MemoryCounterStore::new();
    grouped.increment_count(&key(), 5 - 2).await.unwrap();
    grouped.increment_count(&key(), 9 + 40 - 1).await.unwrap();

    assert_eq!(
        one_by_one.get_count(&key()).await.unwrap(),
        grouped.get_count(&key()).await.unwrap()
    );
    assert_eq!(grouped.get_count(&key()).await.unwrap(), 51);
}
