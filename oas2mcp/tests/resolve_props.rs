//! Termination properties of reference resolution over arbitrary
//! (possibly cyclic) reference graphs.

use oas2mcp::document::ReferenceTable;
use oas2mcp::resolve::{ResolvedSchema, ResolvedShape};
use oas2mcp::{compile, Mode, Resolver, SchemaKind, SchemaNode};
use proptest::prelude::*;

fn pointer(index: usize) -> String {
    format!("#/components/schemas/S{}", index)
}

/// Schema `i` is an object whose properties reference the schemas listed in
/// `edges[i]`. Each schema carries its own name as description so the path
/// taken through the graph stays visible after resolution.
fn reference_table(edges: &[Vec<usize>]) -> ReferenceTable {
    let mut table = ReferenceTable::default();
    for (i, targets) in edges.iter().enumerate() {
        let mut node = SchemaNode::of_kind(SchemaKind::Object);
        node.description = Some(format!("S{}", i));
        for (slot, target) in targets.iter().enumerate() {
            node.properties
                .insert(format!("p{}", slot), SchemaNode::reference(pointer(*target)));
        }
        table.insert(pointer(i), node);
    }
    table
}

/// Walk every root-to-leaf path, checking no schema repeats along it.
/// Returns the deepest object nesting seen.
fn check_paths(schema: &ResolvedSchema, path: &mut Vec<String>) -> Result<usize, String> {
    let ResolvedShape::Object(object) = &schema.shape else {
        return Ok(0);
    };
    let name = schema.description.clone().unwrap_or_default();
    if path.contains(&name) {
        return Err(format!("{} revisited along {:?}", name, path));
    }

    path.push(name);
    let mut deepest = 0;
    for child in object.properties.values() {
        deepest = deepest.max(check_paths(child, path)?);
    }
    path.pop();
    Ok(deepest + 1)
}

fn graph() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..6).prop_flat_map(|n| prop::collection::vec(prop::collection::vec(0..n, 0..3), n))
}

proptest! {
    #[test]
    fn prop_resolution_terminates_without_revisits(edges in graph(), max_depth in 0usize..10) {
        let table = reference_table(&edges);
        let resolver = Resolver::new(&table, max_depth);

        for i in 0..edges.len() {
            let resolved = resolver.resolve_root(&SchemaNode::reference(pointer(i)));
            prop_assert!(resolved.is_ok());
            let resolved = resolved.unwrap();

            let deepest = check_paths(&resolved, &mut Vec::new());
            prop_assert!(deepest.is_ok(), "{:?}", deepest);
            let deepest = deepest.unwrap();
            prop_assert!(deepest <= max_depth + 1);
            prop_assert!(deepest <= edges.len());

            // both strictness modes accept whatever the resolver produced
            let _ = compile(&resolved, Mode::Input);
            let _ = compile(&resolved, Mode::Output);
        }
    }

    #[test]
    fn prop_self_reference_is_permissive(max_depth in 0usize..10) {
        let mut table = ReferenceTable::default();
        table.insert(pointer(0), SchemaNode::reference(pointer(0)));
        let resolver = Resolver::new(&table, max_depth);

        let resolved = resolver.resolve_root(&SchemaNode::reference(pointer(0))).unwrap();
        prop_assert_eq!(resolved.shape, ResolvedShape::Unresolved);
    }
}
