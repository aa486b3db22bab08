use avl_map::AvlMap;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "avl_map=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut map = AvlMap::new();

    for key in [5, 3, 8, 1, 4, 7, 9] {
        map.insert(key, key * 10);
        map.assert_invariants();
        println!("{:?}", map.keys().collect::<Vec<_>>());
    }

    for key in [10, 11, 12] {
        map.insert(key, key * 10);
        map.assert_invariants();
    }

    let mut dot = String::new();
    map.as_tree()
        .dotgraph("demo", &mut dot)
        .expect("writing to a String cannot fail");
    println!("{dot}");

    let removed = map.remove_range(3..8);
    map.assert_invariants();
    println!("removed {removed}: {map:?}");

    let first = map.pop_first().map(|(key, _)| key);
    assert_eq!(first, Some(1));
    map.assert_invariants();

    drop(map);
}
