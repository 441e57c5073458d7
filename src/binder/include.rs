//! `<include>` processing
//!
//! An include names a model directory (`<uri>`) or, in older documents, a
//! file (`filename` attribute). The target is read as a document of its own
//! and its first entity is attached to the including element, after the
//! overrides written inside the `<include>` are applied. A model included
//! into a model is flattened: its links and joints move into the parent
//! under scoped names.

use super::rename::rename_by_substitution;
use super::{Reader, Scope};
use crate::documents::XmlElement;
use crate::element::{Element, Node};
use crate::error::{Error, Result};
use crate::names::{is_valid_name, scoped_name};
use crate::types::{Pose, Vector3};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Attach the entity named by `include` to `element`.
///
/// An include whose target cannot be found is logged and skipped; a target
/// that is found but fails to read or bind fails the enclosing element.
pub(crate) fn process_include(
    reader: &Reader,
    element: &mut Element,
    include: &XmlElement,
    scope: Scope<'_>,
) -> Result<()> {
    let Some(file) = resolve_target(reader, include) else {
        return Ok(());
    };

    let include_depth = scope.include_depth + 1;
    reader.limits.check_include_depth(include_depth)?;

    let mut included = reader.read_path(&file, include_depth)?;
    if included.children.is_empty() {
        tracing::warn!(file = %file.display(), "included document has no entity, skipping");
        return Ok(());
    }

    apply_overrides(&mut included.children[0], include)?;
    add_plugins(reader, &mut included.children[0], include, scope)?;

    if element.name == "model" && included.children[0].name == "model" {
        return flatten_nested_model(reader, element, included, &file, include_depth);
    }

    let mut entity = included.children.swap_remove(0);
    entity.include_source = Some(file);
    element.children.push(entity);
    Ok(())
}

fn resolve_target(reader: &Reader, include: &XmlElement) -> Option<PathBuf> {
    if let Some(uri) = include.child_text("uri").map(str::trim) {
        let Some(dir) = reader.resolver.resolve(uri, true, true) else {
            let e = Error::UnresolvableInclude {
                target: uri.to_string(),
            };
            tracing::warn!(error = %e, "skipping include");
            return None;
        };

        if !dir.is_dir() {
            tracing::warn!(uri = %uri, path = %dir.display(), "include uri is not a directory, skipping");
            return None;
        }

        let file = reader.helper.uri_to_filename(&dir);
        if file.is_none() {
            tracing::warn!(uri = %uri, path = %dir.display(), "unable to find the document of included model, skipping");
        }
        return file;
    }

    if let Some(name) = include.attribute("filename") {
        tracing::warn!(filename = %name, "<include filename='...'/> is deprecated, use <include><uri>...</uri></include>");
        let file = reader.resolver.resolve(name, false, false);
        if file.is_none() {
            let e = Error::UnresolvableInclude {
                target: name.to_string(),
            };
            tracing::warn!(error = %e, "skipping include");
        }
        return file;
    }

    tracing::warn!("<include> has neither <uri> nor filename, skipping");
    None
}

/// `<name>`, `<pose>` and `<static>` inside the include replace the
/// included entity's own values.
fn apply_overrides(entity: &mut Element, include: &XmlElement) -> Result<()> {
    if let Some(name) = include.child_text("name").map(str::trim) {
        if !is_valid_name(name) {
            return Err(Error::ParseFailure {
                key: "name".to_string(),
                value: name.to_string(),
                type_name: "string".to_string(),
            });
        }
        match entity.attribute_mut("name") {
            Some(param) => param.try_set_from_string(name)?,
            None => tracing::warn!(entity = %entity.name, "included entity has no name to override"),
        }
    }

    for key in ["pose", "static"] {
        let Some(text) = include.child_text(key) else {
            continue;
        };
        if !entity.has_element_description(key) {
            tracing::warn!(entity = %entity.name, element = %key, "included entity cannot take this override");
            continue;
        }
        if let Some(value) = entity.get_or_add_element(key)?.value_mut() {
            value.try_set_from_string(text)?;
        }
    }

    Ok(())
}

fn add_plugins(
    reader: &Reader,
    entity: &mut Element,
    include: &XmlElement,
    scope: Scope<'_>,
) -> Result<()> {
    let plugins: Vec<&XmlElement> = include.children_named("plugin").collect();
    if plugins.is_empty() {
        return Ok(());
    }

    let Some(desc) = entity.element_description("plugin").cloned() else {
        tracing::warn!(entity = %entity.name, "included entity does not take plugins");
        return Ok(());
    };

    let parent = entity.name.clone();
    for plugin in plugins {
        let bound = reader.bind_node(
            Some(plugin),
            &desc,
            scope.child(&parent),
            &entity.original_version,
        )?;
        entity.children.push(bound);
    }
    Ok(())
}

/// Splice the links, joints and other children of an included model into
/// `model`, renaming links and joints to `included::name` and moving their
/// frames by the included model's pose.
fn flatten_nested_model(
    reader: &Reader,
    model: &mut Element,
    mut included: Element,
    file: &Path,
    include_depth: usize,
) -> Result<()> {
    let nested = &mut included.children[0];
    let model_pose: Pose = nested.get("pose")?;
    let model_name: String = nested.get("name")?;
    let rotation = model_pose.rot();

    let mut renames = BTreeMap::new();
    for child in nested.children.iter_mut() {
        match child.name.as_str() {
            "link" => {
                let name: String = child.get("name")?;
                renames.insert(name.clone(), scoped_name(&model_name, &name));

                if child.has_element_description("pose") {
                    let offset: Pose = child.get("pose")?;
                    let pose = child.get_or_add_element("pose")?;
                    if let Some(value) = pose.value_mut() {
                        value.set(model_pose.compose(&offset));
                    }
                }
            }
            "joint" => {
                let name: String = child.get("name")?;
                renames.insert(name.clone(), scoped_name(&model_name, &name));

                if let Some(axis) = child.element_mut("axis") {
                    let xyz: Vector3 = axis.get("xyz")?;
                    if let Some(value) = axis.get_or_add_element("xyz")?.value_mut() {
                        value.set(rotation.rotate_vector(xyz));
                    }
                }
            }
            _ => {}
        }
    }

    // the re-bound text carries the converted version, not the declared one
    let declared = included.original_version.clone();
    let text = rename_by_substitution(&included.to_xml_string(), &renames);
    let rebound = reader.read_str_at(&text, &file.display().to_string(), include_depth)?;

    let Some(nested) = rebound.children.into_iter().find(|c| c.name == "model") else {
        return Err(Error::Xml(format!(
            "flattened model from [{}] lost its <model>",
            file.display()
        )));
    };

    for mut child in nested.children {
        if child.name == "pose" {
            continue;
        }
        child.include_source = Some(file.to_path_buf());
        stamp_version(&mut child, &declared);
        model.children.push(child);
    }

    tracing::debug!(model = %model_name, file = %file.display(), "flattened nested model");
    Ok(())
}

fn stamp_version(element: &mut Element, version: &str) {
    element.original_version = version.to_string();
    for child in element.children.iter_mut() {
        stamp_version(child, version);
    }
}
