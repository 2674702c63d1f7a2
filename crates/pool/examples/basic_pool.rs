//! Basic pooling example
//!
//! Demonstrates the reuse-or-construct pattern with a maintenance timer and
//! a destroy handler standing in for the host's native teardown.

use std::time::Duration;

use atlas_pool::{PoolConfig, PoolMaintainer, PoolManager, Poolable};

/// A stand-in for an expensive scene object.
#[derive(Debug)]
struct Billboard {
    label: String,
    visible: bool,
}

impl Billboard {
    fn create(label: &str) -> Self {
        // Imagine an allocation in the host scene graph here.
        Self {
            label: label.to_string(),
            visible: true,
        }
    }
}

impl Poolable for Billboard {
    fn recycle(&mut self) {
        self.label.clear();
        self.visible = false;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = PoolConfig {
        max_size: 4,
        resize_interval: Duration::from_millis(200),
        destroy_count: 2,
        ..Default::default()
    };
    let manager = PoolManager::with_config(config)?;
    manager.set_destroy_handler(|entry| {
        println!("host teardown for a {}", entry.type_name());
    });

    let maintainer = PoolMaintainer::spawn(manager.clone());

    // Reuse-or-construct: the first request misses, later ones hit.
    for frame in 0..8 {
        let billboard = manager
            .get_from_pool::<Billboard>()
            .unwrap_or_else(|| Billboard::create("poi-marker"));
        println!("frame {frame}: using {billboard:?}");
        manager.add_to_pool(billboard);
    }
    println!("stats after reuse loop: {:?}", manager.stats());

    // Overfill the bucket and let the timer trim it back to the cap.
    for _ in 0..10 {
        manager.add_to_pool(Billboard::create("burst"));
    }
    tokio::time::sleep(Duration::from_millis(1100)).await;
    println!("stats after maintenance: {:?}", manager.stats());

    maintainer.shutdown();
    manager.clear_pool();
    Ok(())
}
