// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use arbor_core::edit::{HealOptions, ResampleTarget};
use arbor_core::metrics::{geodesic_matrix, GeodesicMatrix, Weighting};
use arbor_core::{
    Connector, Dotprops, GraphBackend, Length, LengthUnit, MeshNeuron, NodeId, NodeLabel, RawNode,
    Segment, Skeleton, Units, Vec3, VoxelNeuron,
};
use serde_json::json;
mod common;
use common::neuron;

#[test]
fn node_rows_round_trip_through_json() {
    let s = neuron();
    let json = serde_json::to_string(&s.table().to_rows()).expect("serialize rows");
    let rows: Vec<RawNode> = serde_json::from_str(&json).expect("deserialize rows");
    let connectors: Vec<Connector> = s.connectors().cloned().collect();
    let json = serde_json::to_string(&connectors).expect("serialize connectors");
    let connectors: Vec<Connector> = serde_json::from_str(&json).expect("deserialize connectors");

    let back = Skeleton::builder(s.name())
        .nodes(rows)
        .soma(1)
        .connectors(connectors)
        .build()
        .expect("valid round trip");
    assert_eq!(back.table_digest(), s.table_digest());
    assert_eq!(back.connectors().count(), 4);
}

#[test]
fn labels_and_units_keep_their_variants() {
    let row = RawNode::new(7, None, [1.5, -2.0, 0.25])
        .with_radius(0.5)
        .with_label(NodeLabel::Custom(42));
    let json = serde_json::to_string(&row).expect("serialize");
    let back: RawNode = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, row);

    let units = Units::new(LengthUnit::Nanometer, 8.0).expect("positive scale");
    let back: Units = serde_json::from_str(&serde_json::to_string(&units).expect("serialize"))
        .expect("deserialize");
    assert_eq!(back, units);

    let target = ResampleTarget::Spacing(Length::new(2.0, LengthUnit::Micrometer));
    let back: ResampleTarget =
        serde_json::from_str(&serde_json::to_string(&target).expect("serialize")).expect("deserialize");
    assert_eq!(back, target);
}

#[test]
fn backend_names_are_snake_case() {
    assert_eq!(
        serde_json::to_string(&GraphBackend::Compact).expect("serialize"),
        "\"compact\""
    );
    let back: GraphBackend = serde_json::from_str("\"reference\"").expect("deserialize");
    assert_eq!(back, GraphBackend::Reference);
}

#[test]
fn analysis_outputs_serialize() {
    let s = neuron();
    let segments = s.segments();
    let back: Vec<Segment> =
        serde_json::from_str(&serde_json::to_string(&segments).expect("serialize")).expect("deserialize");
    assert_eq!(back, segments);

    let m = geodesic_matrix(&s, Some(&[NodeId(4), NodeId(8)][..]), Weighting::Cable).expect("known ids");
    let back: GeodesicMatrix =
        serde_json::from_str(&serde_json::to_string(&m).expect("serialize")).expect("deserialize");
    assert_eq!(back, m);

    let edges = s.heal_edges(&HealOptions::default()).expect("unitless");
    assert!(edges.is_empty());
}

#[test]
fn neuron_shapes_are_validated_when_deserialized() {
    let square = MeshNeuron::new(
        "square",
        Units::unitless(),
        vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .expect("valid mesh");
    let mut value = serde_json::to_value(&square).expect("serialize");
    let back: MeshNeuron = serde_json::from_value(value.clone()).expect("deserialize");
    assert_eq!(back, square);
    assert!((back.area() - 1.0).abs() < 1e-12);

    value["faces"] = json!([[0, 1, 2], [0, 2, 9]]);
    let err = serde_json::from_value::<MeshNeuron>(value).expect_err("face out of range");
    assert!(err.to_string().contains("face 1 references vertex 9"), "{err}");

    let voxels = VoxelNeuron::new("v", Units::unitless(), Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO, vec![[0, 0, 0]])
        .expect("valid voxels");
    let mut value = serde_json::to_value(&voxels).expect("serialize");
    assert_eq!(serde_json::from_value::<VoxelNeuron>(value.clone()).expect("deserialize"), voxels);
    value["voxel_size"] = serde_json::to_value(Vec3::new(1.0, 0.0, 1.0)).expect("serialize");
    assert!(serde_json::from_value::<VoxelNeuron>(value).is_err());

    let dots = Dotprops::new("d", Units::unitless(), vec![Vec3::ZERO], vec![Vec3::new(0.0, 0.0, 1.0)])
        .expect("valid dotprops");
    let mut value = serde_json::to_value(&dots).expect("serialize");
    value["tangents"] = json!([]);
    assert!(serde_json::from_value::<Dotprops>(value).is_err());
}
