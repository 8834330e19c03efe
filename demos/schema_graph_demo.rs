//! Walkthrough of the schema-governed graph
//!
//! This demo shows:
//! - Loading a schema description from YAML
//! - Creating nodes and editing them with commands in both notations
//! - Grouped index lookups following property changes
//! - Reference materialization with `query`
//! - Mirroring nodes into a key-value store and undoing from history

use schemagraph::{
    Graph, GraphConfig, GraphSnapshot, MemoryKeyValueStore, PersistenceInterceptor, Schema, SchemaDefinition,
};
use serde_json::json;

const SCHEMA: &str = r#"
types:
  Person:
    properties:
      name: string
      born: date
      tags: [array, string]
  Employee:
    parent: Person
    properties:
      boss: Person
      reports: [array, Employee]
indexes:
  by_name:
    type: Person
    properties: [name]
  by_boss:
    type: Employee
    properties: [boss]
"#;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("=== Schema Graph Demo ===\n");

    // 1. Schema and graph
    println!("1. Loading schema");
    let schema = Schema::new(SchemaDefinition::from_yaml_str(SCHEMA)?)?;
    for name in schema.type_names() {
        let chain: Vec<&str> = schema.type_chain(name.as_str())?.iter().map(|t| t.as_str()).collect();
        println!("   ✓ {} (chain: {})", name, chain.join(" -> "));
    }

    let store = MemoryKeyValueStore::new();
    let mut graph = Graph::builder(schema)
        .config(GraphConfig::default().with_history(true))
        .interceptor(PersistenceInterceptor::new(store.clone()))
        .build();
    println!("   ✓ Interceptors: {:?}\n", graph.interceptor_names());

    // 2. Nodes
    println!("2. Creating nodes");
    graph.create(json!({"id": "ann", "type": "Employee", "name": "Ann", "boss": "ann"}))?;
    graph.exec(json!(["create", {"id": "bea", "type": "Employee", "name": "Bea", "boss": "ann"}]))?;
    graph.exec(json!({"op": "create", "args": {"id": "cid", "type": "Employee", "name": "Cid", "boss": "ann"}}))?;
    println!("   ✓ {} nodes, {} mirrored\n", graph.len(), store.len());

    // 3. Edits
    println!("3. Editing");
    graph.set(["bea", "born"], "1990-05-01T00:00:00Z")?;
    graph.update(["ann", "reports"], json!({"push": "bea"}))?;
    graph.update(["ann", "reports"], json!({"push": "cid"}))?;
    let op = graph.exec(json!(["set", "cid", "name", {"value": "Cyd"}]))?;
    println!("   ✓ Applied {}", serde_json::to_string(&op)?);

    // 4. Lookups
    println!("\n4. Lookups");
    let reports: Vec<String> = graph
        .find("by_boss", Some("ann"))
        .iter()
        .map(|n| n.id.to_string())
        .collect();
    println!("   ✓ Reports of ann by index: {:?}", reports);
    println!("   ✓ by_name 'Cid': {}", graph.find("by_name", Some("Cid")).len());
    println!("   ✓ by_name 'Cyd': {}", graph.find("by_name", Some("Cyd")).len());

    let materialized = graph.query(["ann", "reports"])?;
    let names: Vec<String> = materialized
        .nodes()
        .iter()
        .filter_map(|n| n.get_property("name").map(|v| v.to_text()))
        .collect();
    println!("   ✓ Materialized reports: {:?}", names);

    // 5. Undo
    println!("\n5. Undo");
    if let Some(history) = graph.history().cloned() {
        let last = history.undo_operations().into_iter().next();
        if let Some(undo) = last {
            graph.apply(undo)?;
        }
    }
    println!("   ✓ by_name 'Cid' after undo: {}", graph.find("by_name", Some("Cid")).len());

    // 6. Recovery
    println!("\n6. Recovering from the mirror");
    let nodes = PersistenceInterceptor::new(store).recover()?;
    let mut restored = Graph::new(graph.schema().clone());
    restored.import(GraphSnapshot { nodes })?;
    println!("   ✓ Restored {} nodes, identical: {}", restored.len(), restored.export() == graph.export());

    println!("\n=== Demo Complete ===");
    Ok(())
}
