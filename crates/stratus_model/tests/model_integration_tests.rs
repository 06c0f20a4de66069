//! Integration tests for the Stratus data model.

use std::collections::HashMap;

use serde_json::json;

use stratus_model::{
    gc_output_resources, order_output_resources, GraphError, HealthState, OutputResource,
    OutputResourceKind, Resource, ResourceId, ResourceIdentity, ResourceType,
    SecretValueReference,
};

fn container_id() -> ResourceId {
    ResourceId::parse(
        "/planes/radius/local/resourceGroups/default/providers/Applications.Core/containers/web",
    )
    .unwrap()
}

fn chain() -> Vec<OutputResource> {
    vec![
        OutputResource::new(
            "ServiceAccount",
            ResourceType::kubernetes(OutputResourceKind::ServiceAccount),
        ),
        OutputResource::new("Role", ResourceType::kubernetes(OutputResourceKind::KubernetesRole)),
        OutputResource::new(
            "RoleBinding",
            ResourceType::kubernetes(OutputResourceKind::KubernetesRoleBinding),
        )
        .with_dependency("Role")
        .with_dependency("ServiceAccount"),
        OutputResource::new("Deployment", ResourceType::kubernetes(OutputResourceKind::Deployment))
            .with_dependency("RoleBinding"),
        OutputResource::new("Service", ResourceType::kubernetes(OutputResourceKind::Service))
            .with_dependency("Deployment"),
    ]
}

/// Every permutation of the input yields an order where dependencies come first.
#[test]
fn test_ordering_respects_dependencies_for_any_input_order() {
    let items = chain();
    let mut permutations = Vec::new();
    permute(&items, 0, &mut permutations);
    assert_eq!(permutations.len(), 120);

    for input in permutations {
        let ordered = order_output_resources(&input).unwrap();
        assert_eq!(ordered.len(), input.len());

        let position: HashMap<&str, usize> = ordered
            .iter()
            .enumerate()
            .map(|(i, r)| (r.local_id.as_str(), i))
            .collect();
        for resource in &ordered {
            for dependency in resource.get_dependencies().unwrap() {
                assert!(
                    position[dependency.as_str()] < position[resource.local_id.as_str()],
                    "{} must come after {}",
                    resource.local_id,
                    dependency
                );
            }
        }
    }
}

fn permute(items: &[OutputResource], start: usize, out: &mut Vec<Vec<OutputResource>>) {
    if start == items.len() {
        out.push(items.to_vec());
        return;
    }
    let mut working = items.to_vec();
    for i in start..working.len() {
        working.swap(start, i);
        permute(&working, start + 1, out);
        working.swap(start, i);
    }
}

#[test]
fn test_ordering_is_deterministic() {
    let first = order_output_resources(&chain()).unwrap();
    let second = order_output_resources(&chain()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_cycle_between_output_resources() {
    let items = vec![
        OutputResource::new("A", ResourceType::kubernetes(OutputResourceKind::Secret))
            .with_dependency("B"),
        OutputResource::new("B", ResourceType::kubernetes(OutputResourceKind::Secret))
            .with_dependency("A"),
    ];
    let err = order_output_resources(&items).unwrap_err();
    assert!(matches!(err, GraphError::Cycle { .. }));
    assert!(err.to_string().contains("A -> B"));
}

#[test]
fn test_gc_worked_examples() {
    let a = OutputResource::new("A", ResourceType::kubernetes(OutputResourceKind::Deployment));
    let b = OutputResource::new("B", ResourceType::kubernetes(OutputResourceKind::Service));
    let c = OutputResource::new("C", ResourceType::kubernetes(OutputResourceKind::Secret));

    // A removed from the render.
    assert_eq!(
        gc_output_resources(&[b.clone(), c.clone()], &[a.clone(), b.clone(), c.clone()]),
        vec![a.clone()]
    );

    // A changed provider under the same local ID.
    let moved = OutputResource::new(
        "A",
        ResourceType::azure(OutputResourceKind::Deployment),
    );
    assert_eq!(
        gc_output_resources(&[moved, b.clone()], &[a.clone(), b.clone()]),
        vec![a]
    );
}

#[test]
fn test_persisted_resource_round_trips_through_yaml() {
    let mut resource = Resource::new(
        container_id(),
        "shop",
        json!({"image": "nginx:latest"}).as_object().cloned().unwrap(),
    );
    let mut deployment = OutputResource::new(
        "Deployment",
        ResourceType::kubernetes(OutputResourceKind::Deployment),
    )
    .with_identity(ResourceIdentity::kubernetes("Deployment", "apps/v1", "default", "web"))
    .with_resource(json!({"kind": "Deployment"}));
    deployment.status.health_state = HealthState::Healthy;
    deployment
        .persisted_properties
        .insert("replicas".to_string(), "2".to_string());

    resource.status.output_resources.push(deployment);
    resource
        .computed_values
        .insert("host".to_string(), json!("web.default.svc"));
    resource.secret_values.insert(
        "password".to_string(),
        SecretValueReference::from_output("Deployment").with_action("listKeys"),
    );

    let yaml = serde_yaml::to_string(&resource).unwrap();
    assert!(!yaml.contains("resource:"));

    let parsed: Resource = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed.id, resource.id);
    assert_eq!(parsed.computed_values, resource.computed_values);
    assert_eq!(parsed.secret_values, resource.secret_values);

    let persisted = &parsed.status.output_resources[0];
    assert!(persisted.resource.is_none());
    assert!(persisted.has_identity());
    assert_eq!(persisted.status.health_state, HealthState::Healthy);
    assert_eq!(persisted.persisted_properties["replicas"], "2");
}

#[test]
fn test_operation_id_truncates_to_resource_id() {
    let operation = container_id()
        .append("operationResults", "2f6bc7f0")
        .unwrap();
    assert_eq!(operation.truncate(), container_id());
    assert_eq!(
        operation.truncate().resource_type().as_deref(),
        Some("Applications.Core/containers")
    );
}
