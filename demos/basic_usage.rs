// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic typesense-sync usage example.
//!
//! Demonstrates:
//! 1. Describing two related models
//! 2. Deriving and creating their collections (parent first, then a joined child)
//! 3. Re-running update with no changes (no-op)
//! 4. Changing the configuration and sending the minimal diff
//! 5. Displaying metrics
//!
//! Runs against an in-process engine unless `TYPESENSE_API_KEY` is set, in
//! which case it talks to `localhost:8108`:
//!
//! ```bash
//! docker run -p 8108:8108 -e TYPESENSE_API_KEY=xyz -e TYPESENSE_DATA_DIR=/tmp typesense/typesense:27.1
//! TYPESENSE_API_KEY=xyz cargo run --example basic_usage
//! ```

use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use typesense_sync::model::{Attribute, ModelDescription, NativeType, RelationTarget};
use typesense_sync::schema::Selection;
use typesense_sync::{
    CollectionConfig, CollectionRegistry, CollectionSync, InMemoryClient, SearchClient, SyncOutcome,
    TypesenseClient, TypesenseConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           typesense-sync: Basic Usage Example                 ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Pick a client
    // ─────────────────────────────────────────────────────────────────────────
    let client: Arc<dyn SearchClient> = match std::env::var("TYPESENSE_API_KEY") {
        Ok(api_key) => {
            println!("🌐 Using Typesense at localhost:8108");
            Arc::new(TypesenseClient::new(TypesenseConfig {
                api_key,
                ..Default::default()
            })?)
        }
        Err(_) => {
            println!("🧪 Using the in-memory engine (set TYPESENSE_API_KEY for a real server)");
            Arc::new(InMemoryClient::new())
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Describe the models
    // ─────────────────────────────────────────────────────────────────────────
    let author = ModelDescription::new("Author")
        .attribute(Attribute::new("id", NativeType::BigAuto))
        .attribute(Attribute::new("name", NativeType::Char))
        .attribute(Attribute::new("born", NativeType::Date).nullable());

    let book = ModelDescription::new("Book")
        .attribute(Attribute::new("id", NativeType::BigAuto))
        .attribute(Attribute::new("title", NativeType::Char))
        .attribute(Attribute::foreign_key(
            "author",
            RelationTarget::primary_key("Author", NativeType::BigAuto),
        ))
        .attribute(Attribute::new("publication_year", NativeType::Integer))
        .attribute(Attribute::new("price", NativeType::Decimal));

    let registry = Arc::new(CollectionRegistry::new());

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Create collections, parent first so the child can join to it
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📦 Creating collections...");

    let authors = CollectionSync::new(
        client.clone(),
        Arc::new(author),
        CollectionConfig::default(),
        registry.clone(),
    );
    let created = authors.create().await?;
    let names: Vec<_> = created.field_names().collect();
    println!("   └─ {} → {:?}", created.name, names);

    let book = Arc::new(book);
    let book_config = CollectionConfig::default()
        .parents(Selection::All)
        .use_joins(true)
        .facet_fields(["author"]);
    let books =
        CollectionSync::new(client.clone(), book.clone(), book_config.clone(), registry.clone());
    let created = books.create().await?;
    for field in &created.fields {
        println!(
            "   └─ {}.{}: {} facet={} sort={} optional={}{}",
            created.name,
            field.name,
            field.field_type,
            field.facet,
            field.sort,
            field.optional,
            field.reference.as_deref().map(|r| format!(" → {}", r)).unwrap_or_default()
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Update with nothing changed
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n🔁 Updating with unchanged configuration...");
    let outcome = books.update().await?;
    println!("   └─ {:?}", outcome);

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Change the configuration and send the diff
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n✏️  Faceting on price, dropping publication_year...");
    let changed = CollectionSync::new(
        client.clone(),
        book,
        book_config
            .skip_index_fields(["publication_year"])
            .facet_fields(["author", "price"]),
        registry,
    );
    match changed.update().await? {
        SyncOutcome::Unchanged => println!("   └─ nothing to do"),
        SyncOutcome::Updated(diff) => {
            let added: Vec<_> = diff.added.iter().map(|f| &f.name).collect();
            let changed: Vec<_> = diff.changed.iter().map(|f| &f.name).collect();
            println!("   └─ added:   {:?}", added);
            println!("   └─ removed: {:?}", diff.removed);
            println!("   └─ changed: {:?}", changed);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 6. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("\n📈 Raw Metrics:");
    dump_metrics(&snapshotter);

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║                    Example complete!                          ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    Ok(())
}

/// Dump all captured metrics
fn dump_metrics(snapshotter: &Snapshotter) {
    let mut counters = vec![];
    let mut histograms = vec![];

    for (composite_key, _, _, value) in snapshotter.snapshot().into_vec() {
        let (_, key) = composite_key.into_parts();
        let labels: Vec<_> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
        let label_str = if labels.is_empty() {
            String::new()
        } else {
            format!("{{{}}}", labels.join(","))
        };
        let name = format!("{}{}", key.name(), label_str);

        match value {
            DebugValue::Counter(v) => counters.push((name, v)),
            DebugValue::Gauge(v) => counters.push((name, v.into_inner() as u64)),
            DebugValue::Histogram(samples) => {
                let count = samples.len();
                let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                histograms.push((name, count, sum));
            }
        }
    }

    counters.sort();
    histograms.sort_by(|a, b| a.0.cmp(&b.0));

    for (name, value) in &counters {
        println!("   ├─ {} = {}", name, value);
    }
    for (name, count, sum) in &histograms {
        println!("   ├─ {} count={} sum={:.4}", name, count, sum);
    }
    if counters.is_empty() && histograms.is_empty() {
        println!("   └─ (no metrics recorded)");
    }
}
