use std::{collections::HashSet, fmt};

use super::Dependencies;

#[derive(Debug, PartialEq, Eq)]
pub enum UnknownName<'a> {
    /// A dependency map key with no component directory.
    Component(&'a str),
    Dependency { component: &'a str, dependency: &'a str },
}

impl fmt::Display for UnknownName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownName::Component(component) => write!(
                f,
                "Component '{}' has dependencies but no component directory",
                component
            ),
            UnknownName::Dependency {
                component,
                dependency,
            } => write!(
                f,
                "Component '{}' depends on '{}' which is not a known component",
                component, dependency
            ),
        }
    }
}

/// Names in the dependency map that have no component directory. Informational only, the
/// build goes on and the stub step reports the missing WIT sources.
pub fn unknown_names<'a>(
    dependencies: &'a Dependencies,
    components: &[String],
) -> Vec<UnknownName<'a>> {
    let known: HashSet<&str> = components.iter().map(String::as_str).collect();

    let mut unknown = Vec::new();
    for (component, deps) in dependencies {
        if !known.contains(component.as_str()) {
            unknown.push(UnknownName::Component(component));
        }
        for dependency in deps {
            if !known.contains(dependency.as_str()) {
                unknown.push(UnknownName::Dependency {
                    component,
                    dependency,
                });
            }
        }
    }
    unknown
}

pub fn report_unknown_dependencies(
    dependencies: &Dependencies,
    components: &[String],
    verbose: bool,
) {
    if !verbose {
        return;
    }

    for name in unknown_names(dependencies, components) {
        println!("Info: {}", name);
    }
}
