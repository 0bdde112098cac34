//! End-to-end pipeline tests
//!
//! Drives both pipelines over a miniature dictionary and model file:
//! raw IDD blocks -> SchemaRegistry -> SchemaGraph, and raw IDF records
//! -> extraction -> InstanceGraph, then cross-checks the two graphs
//! through their shared type names.

use serde_json::{json, Value};

use idfgraph::{
    extract, AmbiguityPolicy, BuildConfig, DuplicatePolicy, InstanceGraph, InstanceGraphBuilder,
    RawObject, RawTypeBlock, SchemaGraph, SchemaRegistry,
};

fn block(entries: Value) -> RawTypeBlock {
    entries
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_object().unwrap().clone())
        .collect()
}

/// A miniature data dictionary: zones, surfaces referencing zones, and
/// week schedules referencing day schedules through an extensible block
fn dictionary() -> Vec<RawTypeBlock> {
    vec![
        block(json!([
            {
                "idfobj": "Version",
                "group": "Simulation Parameters",
                "unique-object": [""],
                "format": ["singleLine"]
            },
            { "field": ["Version Identifier"], "default": ["23.1"] }
        ])),
        block(json!([
            {
                "idfobj": "Zone",
                "group": "Thermal Zones and Surfaces",
                "memo": ["Defines a thermal zone", "of the building."]
            },
            { "field": ["Name"], "type": ["alpha"], "reference": ["ZoneNames"], "required-field": [""] },
            { "field": ["Volume"], "type": ["real"], "units": ["m3", "m3"], "minimum>": ["0"] }
        ])),
        block(json!([
            { "idfobj": "BuildingSurface:Detailed", "group": "Thermal Zones and Surfaces" },
            { "field": ["Name"], "type": ["alpha"], "required-field": [""] },
            {
                "field": ["Zone Name"],
                "type": ["object-list"],
                "object-list": ["ZoneNames"],
                "validobjects": ["Zone"],
                "required-field": [""]
            }
        ])),
        block(json!([
            { "idfobj": "Schedule:Day:Hourly", "group": "Schedules" },
            { "field": ["Name"], "reference": ["DayScheduleNames"] }
        ])),
        block(json!([
            {
                "idfobj": "Schedule:Week:Compact",
                "group": "Schedules",
                "extensible:1": ""
            },
            { "field": ["Name"], "reference": ["WeekScheduleNames"] },
            { "field": ["DayType List 1"], "begin-extensible": [""] },
            {
                "field": ["Schedule:Day Name 1"],
                "object-list": ["DayScheduleNames"],
                "validobjects": ["Schedule:Day:Hourly"]
            }
        ])),
    ]
}

/// A miniature model file conforming to the dictionary above
fn model() -> Vec<RawObject> {
    vec![
        RawObject::new("VERSION").with_field("Version Identifier", "23.1"),
        RawObject::new("ZONE")
            .with_field("Name", "Core_Zone")
            .with_field("Volume", 250.0),
        RawObject::new("ZONE")
            .with_field("Name", "Perimeter_Zone")
            .with_field("Volume", 180.5),
        RawObject::new("BUILDINGSURFACE:DETAILED")
            .with_field("Name", "North_Wall")
            .with_field("Zone Name", "Perimeter_Zone"),
        RawObject::new("BUILDINGSURFACE:DETAILED")
            .with_field("Name", "Core_Ceiling")
            .with_field("Zone Name", "Core_Zone"),
        RawObject::new("SCHEDULE:DAY:HOURLY").with_field("Name", "Workday"),
        RawObject::new("SCHEDULE:WEEK:COMPACT")
            .with_field("Name", "Office_Week")
            .with_field("DayType List 1", "Weekdays")
            .with_field("Schedule:Day Name 1", "Workday"),
    ]
}

#[test]
fn registry_ingests_full_dictionary() {
    let registry = SchemaRegistry::ingest(dictionary()).unwrap();
    assert_eq!(registry.len(), 5);

    let version = registry.get("Version").unwrap();
    assert!(version.header.unique_object);
    assert_eq!(version.header.format.as_deref(), Some("singleLine"));

    let zone = registry.get("ZONE").unwrap();
    assert_eq!(
        zone.header.memo.as_deref(),
        Some("Defines a thermal zone of the building.")
    );
    let volume = zone.field("Volume").unwrap();
    assert_eq!(volume.units.as_deref(), Some("m3"));
    assert_eq!(volume.minimum_strict.as_deref(), Some("0"));

    let week = registry.get("Schedule:Week:Compact").unwrap();
    assert_eq!(week.header.extensible, Some(1));
    assert_eq!(
        week.extensible_field().map(|f| f.name.as_str()),
        Some("DayType List 1")
    );
    assert!(week.field("DayType List 1").unwrap().begins_extensible);
}

#[test]
fn registry_group_catalog_matches_dictionary() {
    let registry = SchemaRegistry::ingest(dictionary()).unwrap();
    let groups: Vec<&str> = registry.groups().collect();
    assert_eq!(
        groups,
        vec![
            "Schedules",
            "Simulation Parameters",
            "Thermal Zones and Surfaces"
        ]
    );
    let schedules = registry.schemas_in_group("Schedules");
    assert_eq!(schedules.len(), 2);
    assert_eq!(schedules[0].type_name, "SCHEDULE:DAY:HOURLY");
}

#[test]
fn schema_graph_reflects_declared_references() {
    let registry = SchemaRegistry::ingest(dictionary()).unwrap();
    let graph = SchemaGraph::build(&registry).unwrap();

    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 2);

    assert_eq!(
        graph.references("BuildingSurface:Detailed"),
        vec![("ZONE", "Zone Name")]
    );
    assert_eq!(
        graph.referenced_by("Schedule:Day:Hourly"),
        vec![("SCHEDULE:WEEK:COMPACT", "Schedule:Day Name 1")]
    );
}

#[test]
fn instance_graph_resolves_model_references() {
    let extraction = extract(model()).unwrap();
    assert!(extraction.diagnostics.is_empty());

    let graph = InstanceGraph::build(extraction).unwrap();
    assert_eq!(graph.node_count(), 7);
    assert_eq!(graph.edge_count(), 3);

    // Reversed storage: successors of a zone are its dependents
    let core = graph.find("ZONE", "Core_Zone").unwrap();
    let dependents = graph.referenced_by(core.id);
    assert_eq!(dependents.len(), 1);
    assert_eq!(dependents[0].0.name, "Core_Ceiling");
    assert_eq!(dependents[0].1.field, "Zone Name");

    // The anonymous VERSION object got a synthesized name
    assert!(graph.find("VERSION", "VERSION_000").is_some());

    // The week schedule points at its day schedule
    let week = graph.find("SCHEDULE:WEEK:COMPACT", "Office_Week").unwrap();
    let targets = graph.references(week.id);
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].0.name, "Workday");
}

#[test]
fn instance_edges_stay_within_declared_type_pairs() {
    let registry = SchemaRegistry::ingest(dictionary()).unwrap();
    let schema_graph = SchemaGraph::build(&registry).unwrap();
    let instance_graph = InstanceGraph::build(extract(model()).unwrap()).unwrap();

    // Every resolved instance edge must correspond to a schema edge for
    // the same field between the same type pair
    for node in instance_graph.nodes() {
        for (dependent, label) in instance_graph.referenced_by(node.id) {
            let (source_type, target_type) = &label.type_pair;
            assert_eq!(source_type, &dependent.object_type);
            assert_eq!(target_type, &node.object_type);

            let fields = schema_graph.edge_fields(source_type, target_type);
            assert!(
                fields.contains(&label.field.as_str()),
                "instance edge {} -> {} via '{}' has no schema counterpart",
                source_type,
                target_type,
                label.field
            );
        }
    }
}

#[test]
fn ambiguous_names_drop_edges_by_default_and_filter_with_schema() {
    let mut records = model();
    // A zone list sharing a zone's name makes "Zone Name" ambiguous
    records.push(RawObject::new("ZONELIST").with_field("Name", "Core_Zone"));

    let graph = InstanceGraph::build(extract(records.clone()).unwrap()).unwrap();
    // The Core_Ceiling -> Core_Zone edge is dropped, the others survive
    assert_eq!(graph.edge_count(), 2);
    let ambiguous: Vec<_> = graph
        .diagnostics()
        .with_code(idfgraph::DiagnosticCode::AmbiguousReference)
        .collect();
    assert_eq!(ambiguous.len(), 1);
    assert_eq!(ambiguous[0].context.len(), 2);

    // SchemaFiltered narrows candidates to the declared target types
    let registry = SchemaRegistry::ingest(dictionary()).unwrap();
    let graph = InstanceGraphBuilder::new()
        .with_registry(&registry)
        .with_ambiguity(AmbiguityPolicy::SchemaFiltered)
        .build(extract(records).unwrap())
        .unwrap();
    assert_eq!(graph.edge_count(), 3);
}

#[test]
fn duplicate_type_policy_is_configurable_end_to_end() {
    let mut blocks = dictionary();
    blocks.push(block(json!([
        { "idfobj": "Zone", "group": "Thermal Zones and Surfaces" },
        { "field": ["Name"], "reference": ["ZoneNames"] }
    ])));

    let registry = SchemaRegistry::ingest(blocks.clone()).unwrap();
    assert_eq!(registry.len(), 5);
    assert_eq!(registry.diagnostics().len(), 1);

    let reject = BuildConfig {
        duplicate_types: DuplicatePolicy::Reject,
        ..BuildConfig::default()
    };
    assert!(SchemaRegistry::ingest_with(blocks, &reject).is_err());
}

#[test]
fn rebuilding_from_same_registry_is_deterministic() {
    let registry = SchemaRegistry::ingest(dictionary()).unwrap();
    let a = SchemaGraph::build(&registry).unwrap();
    let b = SchemaGraph::build(&registry).unwrap();
    assert_eq!(a.node_count(), b.node_count());
    assert_eq!(a.edge_count(), b.edge_count());
    assert_eq!(a.to_dot(), b.to_dot());

    let x = InstanceGraph::build(extract(model()).unwrap()).unwrap();
    let y = InstanceGraph::build(extract(model()).unwrap()).unwrap();
    assert_eq!(x.edge_count(), y.edge_count());
}
