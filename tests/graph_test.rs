use chrono::{DateTime, Utc};
use schemagraph::{
    Graph, GraphConfig, GraphError, NodeId, PropertyTypeSpec, PropertyValue, QueryResult, Schema, SchemaDefinition,
    SchemaError,
};
use serde_json::json;

fn schema() -> Schema {
    let definition = SchemaDefinition::new()
        .with_type(
            "Person",
            None,
            [
                ("name", PropertyTypeSpec::from("string")),
                ("age", "number".into()),
                ("active", "boolean".into()),
                ("born", "date".into()),
                ("meta", "object".into()),
                ("tags", vec!["array", "string"].into()),
            ],
        )
        .with_type(
            "Employee",
            Some("Person"),
            [("boss", PropertyTypeSpec::from("Person")), ("age", "string".into())],
        )
        .with_type(
            "Team",
            None,
            [
                ("title", PropertyTypeSpec::from("string")),
                ("members", vec!["array", "Person"].into()),
                ("rotas", vec!["array", "array", "Person"].into()),
                ("lead", "Person".into()),
            ],
        )
        .with_index("by_name", "Person", &["name"]);
    Schema::new(definition).unwrap()
}

fn person(graph: &mut Graph, id: &str, name: &str) {
    graph
        .create(json!({"id": id, "type": "Person", "name": name}))
        .unwrap();
}

#[test]
fn test_find_follows_renames() {
    let mut graph = Graph::new(schema());
    person(&mut graph, "p1", "Ann");

    let found = graph.find("by_name", Some("Ann"));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, NodeId::new("p1"));

    graph.set(["p1", "name"], "Bea").unwrap();
    assert!(graph.find("by_name", Some("Ann")).is_empty());
    assert_eq!(graph.find("by_name", Some("Bea"))[0].id, NodeId::new("p1"));
}

#[test]
fn test_duplicate_create_leaves_table_unchanged() {
    let mut graph = Graph::with_config(schema(), GraphConfig::default().with_history(true));
    person(&mut graph, "p1", "Ann");

    let err = graph
        .create(json!({"id": "p1", "type": "Person", "name": "Other"}))
        .unwrap_err();
    assert_eq!(err, GraphError::DuplicateNode(NodeId::new("p1")));
    assert_eq!(graph.len(), 1);
    assert_eq!(
        graph.get_node("p1").unwrap().get_property("name"),
        Some(&PropertyValue::from("Ann"))
    );
    assert!(graph.find("by_name", Some("Other")).is_empty());
    assert_eq!(graph.history().unwrap().len(), 1);
}

#[test]
fn test_create_requires_id_and_type() {
    let mut graph = Graph::new(schema());
    for raw in [json!({"type": "Person"}), json!({"id": "p1"}), json!({"id": "", "type": "Person"})] {
        assert_eq!(graph.create(raw).unwrap_err(), GraphError::MissingIdOrType);
    }
    let err = graph.create(json!({"id": "x", "type": "Robot"})).unwrap_err();
    assert_eq!(err, GraphError::Schema(SchemaError::UnknownType("Robot".into())));
    assert!(graph.is_empty());
}

#[test]
fn test_created_node_has_exactly_schema_properties() {
    let mut graph = Graph::new(schema());
    graph
        .create(json!({"id": "p1", "type": "Person", "name": "Ann", "shoeSize": 44}))
        .unwrap();

    let node = graph.get("p1").unwrap().as_node().unwrap();
    let keys: Vec<&str> = node.properties.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "age", "active", "born", "meta", "tags"]);
    assert_eq!(node.get_property("age"), Some(&PropertyValue::from(0i64)));
    assert_eq!(node.get_property("active"), Some(&PropertyValue::from(false)));
    assert_eq!(node.get_property("tags"), Some(&PropertyValue::Array(vec![])));
    assert!(matches!(node.get_property("born"), Some(PropertyValue::Date(_))));
}

#[test]
fn test_create_coerces_and_rejects_before_insert() {
    let mut graph = Graph::new(schema());
    for bad in [
        json!({"id": "p1", "type": "Person", "age": "abc"}),
        json!({"id": "p1", "type": "Person", "tags": "x"}),
        json!({"id": "p1", "type": "Person", "active": "yes"}),
    ] {
        assert!(matches!(graph.create(bad), Err(GraphError::Schema(_))));
    }
    assert!(graph.is_empty());
    assert!(graph.find("by_name", Some("")).is_empty());

    graph
        .create(json!({"id": "p1", "type": "Person", "age": "41", "born": "2024-03-01T12:00:00Z"}))
        .unwrap();
    let born: DateTime<Utc> = "2024-03-01T12:00:00Z".parse().unwrap();
    let node = graph.get_node("p1").unwrap();
    assert_eq!(node.get_property("age"), Some(&PropertyValue::Number(41.0)));
    assert_eq!(node.get_property("born"), Some(&PropertyValue::Date(born)));
    graph.update(["p1", "tags"], json!({"push": "y"})).unwrap();

    let mut other = Graph::new(schema());
    other.merge(&graph).unwrap();
    assert_eq!(other.export(), graph.export());
}

#[test]
fn test_inherited_properties_and_overrides() {
    let schema = schema();
    let person = schema.properties("Person").unwrap();
    let employee = schema.properties("Employee").unwrap();
    for key in person.keys() {
        assert!(employee.contains_key(key));
    }
    assert_eq!(schema.property_type("Employee", "age").unwrap().to_string(), "string");
    assert_eq!(schema.property_type("Person", "age").unwrap().to_string(), "number");

    let mut graph = Graph::new(schema);
    person_and_employee(&mut graph);
    let node = graph.get_node("e1").unwrap();
    assert_eq!(node.get_property("age"), Some(&PropertyValue::from("")));

    // subtypes are indexed by their ancestors' indexes
    assert_eq!(graph.find("by_name", Some("Eve"))[0].id, NodeId::new("e1"));
}

fn person_and_employee(graph: &mut Graph) {
    person(graph, "p1", "Ann");
    graph
        .create(json!({"id": "e1", "type": "Employee", "name": "Eve", "boss": "p1"}))
        .unwrap();
}

#[test]
fn test_unknown_property_fails_cleanly() {
    let mut graph = Graph::with_config(schema(), GraphConfig::default().with_history(true));
    person(&mut graph, "p1", "Ann");

    let err = graph.get(["p1", "unknownProp"]).unwrap_err();
    assert!(matches!(err, GraphError::Schema(SchemaError::PropertyNotFound { .. })));

    let err = graph.set(["p1", "unknownProp"], "x").unwrap_err();
    assert!(matches!(err, GraphError::Schema(SchemaError::PropertyNotFound { .. })));
    assert_eq!(graph.get_node("p1").unwrap().property_count(), 6);
    assert_eq!(graph.history().unwrap().len(), 1);
}

#[test]
fn test_missing_node_and_container() {
    let mut graph = Graph::new(schema());
    person(&mut graph, "p1", "Ann");

    assert_eq!(graph.get("p9").unwrap_err(), GraphError::NodeNotFound(NodeId::new("p9")));
    assert!(matches!(
        graph.get(["p1", "meta", "address", "city"]),
        Err(GraphError::KeyError(_))
    ));
}

#[test]
fn test_set_then_get_returns_coerced_value() {
    let mut graph = Graph::new(schema());
    person(&mut graph, "p1", "Ann");

    graph.set(["p1", "age"], "42").unwrap();
    graph.set(["p1", "active"], "true").unwrap();
    graph.set(["p1", "born"], "2024-01-02T03:04:05Z").unwrap();
    graph.set(["p1", "meta"], r#"{"city": "Oslo"}"#).unwrap();
    graph.set(["p1", "tags"], r#"["a", "b"]"#).unwrap();

    let value = |path: [&str; 2]| graph.get(path).unwrap().as_value().cloned().unwrap();
    assert_eq!(value(["p1", "age"]), PropertyValue::Number(42.0));
    assert_eq!(value(["p1", "active"]), PropertyValue::Boolean(true));
    let born: DateTime<Utc> = "2024-01-02T03:04:05Z".parse().unwrap();
    assert_eq!(value(["p1", "born"]), PropertyValue::Date(born));
    assert_eq!(value(["p1", "meta"]), PropertyValue::from(json!({"city": "Oslo"})));
    assert_eq!(value(["p1", "tags"]), PropertyValue::from(json!(["a", "b"])));
}

#[test]
fn test_coercion_failures_leave_value_untouched() {
    let mut graph = Graph::new(schema());
    person(&mut graph, "p1", "Ann");

    let err = graph.set(["p1", "active"], "yes").unwrap_err();
    assert_eq!(err, GraphError::Schema(SchemaError::InvalidBoolean("yes".into())));

    let err = graph.set(["p1", "age"], json!([1, 2])).unwrap_err();
    assert!(matches!(err, GraphError::Schema(SchemaError::TypeMismatch { .. })));

    assert_eq!(
        graph.get(["p1", "age"]).unwrap(),
        QueryResult::Value(PropertyValue::from(0i64))
    );
}

#[test]
fn test_nested_set_and_get() {
    let mut graph = Graph::new(schema());
    graph
        .create(json!({"id": "p1", "type": "Person", "meta": {"address": {"city": "Oslo"}}, "tags": ["a"]}))
        .unwrap();

    graph.set(["p1", "meta", "address", "city"], "Bergen").unwrap();
    assert_eq!(
        graph.get(["p1", "meta", "address", "city"]).unwrap(),
        QueryResult::Value("Bergen".into())
    );

    graph.set(schemagraph::Path::new("p1").key("tags").index(0), "z").unwrap();
    assert_eq!(
        graph.get(["p1", "tags"]).unwrap(),
        QueryResult::Value(PropertyValue::from(json!(["z"])))
    );
}

#[test]
fn test_set_on_whole_node_is_unsupported() {
    let mut graph = Graph::new(schema());
    person(&mut graph, "p1", "Ann");
    let err = graph.set("p1", json!({"name": "Bea"})).unwrap_err();
    assert!(matches!(err, GraphError::UnsupportedOperation(_)));
}

#[test]
fn test_query_resolves_references_in_order() {
    let mut graph = Graph::new(schema());
    person(&mut graph, "p1", "Ann");
    person(&mut graph, "p2", "Bea");
    graph
        .create(json!({
            "id": "t1", "type": "Team", "title": "Core",
            "members": ["p2", "p1"], "rotas": [["p1"], ["p2", "p1"]], "lead": "p2"
        }))
        .unwrap();

    // get keeps the raw ids
    assert_eq!(
        graph.get(["t1", "members"]).unwrap(),
        QueryResult::Value(PropertyValue::from(json!(["p2", "p1"])))
    );

    let members = graph.query(["t1", "members"]).unwrap();
    let ids: Vec<&str> = members.nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["p2", "p1"]);

    let rotas = graph.query(["t1", "rotas"]).unwrap();
    match &rotas {
        QueryResult::List(rows) => {
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[1].nodes().len(), 2);
        }
        other => panic!("unexpected {:?}", other),
    }

    let lead = graph.query(["t1", "lead"]).unwrap();
    assert_eq!(lead.as_node().map(|n| n.id.as_str()), Some("p2"));

    assert_eq!(graph.query(["t1", "title"]).unwrap(), QueryResult::Value("Core".into()));
}

#[test]
fn test_path_through_reference() {
    let mut graph = Graph::new(schema());
    person_and_employee(&mut graph);

    // a path ending on a reference yields the id
    assert_eq!(graph.get(["e1", "boss"]).unwrap(), QueryResult::Value("p1".into()));

    // continuing with the referenced id re-roots on that node
    graph.set(["e1", "boss", "p1", "name"], "Ada").unwrap();
    assert_eq!(
        graph.get_node("p1").unwrap().get_property("name"),
        Some(&PropertyValue::from("Ada"))
    );
}

#[test]
fn test_traverse_and_nodes_order() {
    let mut graph = Graph::new(schema());
    for (id, name) in [("p1", "Ann"), ("p2", "Bea"), ("p3", "Cid")] {
        person(&mut graph, id, name);
    }
    let ids: Vec<&str> = graph.nodes().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);

    let view = [NodeId::new("p3"), NodeId::new("p1")];
    let nodes = graph.traverse(&view).unwrap();
    assert_eq!(nodes[0].id, NodeId::new("p3"));
    assert_eq!(nodes[1].id, NodeId::new("p1"));
}

#[test]
fn test_delete_and_reset() {
    let mut graph = Graph::new(schema());
    person(&mut graph, "p1", "Ann");
    person(&mut graph, "p2", "Bea");

    let op = graph.delete("p1").unwrap();
    assert_eq!(op.name(), "delete");
    assert!(!graph.contains("p1"));
    assert!(graph.find("by_name", Some("Ann")).is_empty());
    assert_eq!(graph.delete("p1").unwrap_err(), GraphError::NodeNotFound(NodeId::new("p1")));

    graph.reset().unwrap();
    assert!(graph.is_empty());
    assert!(graph.find("by_name", Some("Bea")).is_empty());
    person(&mut graph, "p1", "Ann");
    assert_eq!(graph.len(), 1);
}
