use std::collections::{BTreeMap, BTreeSet};

/// Worker to worker RPC dependencies: component name to the components it calls.
pub type Dependencies = BTreeMap<String, Vec<String>>;

/// Every component some other component depends on, deduplicated and sorted.
///
/// Components that only appear as keys are not part of the result. Names are not checked
/// against the known components and cycles are not detected.
pub fn all_dependencies(dependencies: &Dependencies) -> Vec<String> {
    dependencies
        .values()
        .flatten()
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// `(component, dependency)` pairs in component order, then declared dependency order.
pub fn stub_dependency_pairs(dependencies: &Dependencies) -> Vec<(&str, &str)> {
    dependencies
        .iter()
        .flat_map(|(component, deps)| {
            deps.iter().map(move |dep| (component.as_str(), dep.as_str()))
        })
        .collect()
}
