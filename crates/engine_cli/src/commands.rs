//! Subcommand implementations. Each one works on a loaded [`Scene`] and
//! returns the text to print, so they can be tested without files.

use std::fmt::{self, Write as _};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use engine_scene::{EntityId, Scene, SceneConfig, path};
use tracing::{info, warn};

/// Scene with the default component set and a document read into it.
pub fn load(text: &str, config: SceneConfig) -> Result<(Scene, EntityId)> {
    let registry = engine_defaults::default_registry()?;
    let mut scene = Scene::with_config(Rc::new(registry), config);
    let root = scene.load_json_str(text).context("can't read scene document")?;
    info!(
        root = %scene.entity_path(root),
        entities = scene.entity_count(),
        components = scene.component_count(),
        "scene loaded"
    );
    Ok((scene, root))
}

/// Indented outline of the branch under `root`.
pub fn tree(scene: &Scene, root: EntityId) -> Result<String> {
    let mut out = String::new();
    write_tree(scene, root, 0, &mut out)?;
    Ok(out)
}

fn write_tree(scene: &Scene, entity: EntityId, depth: usize, out: &mut String) -> fmt::Result {
    let components: Vec<&str> = scene
        .components_of(entity)
        .iter()
        .filter_map(|c| scene.component_name(*c))
        .collect();
    let name = scene.name(entity).unwrap_or_default();
    write!(out, "{:indent$}{name}", "", indent = depth * 2)?;
    if !components.is_empty() {
        write!(out, " [{}]", components.join(", "))?;
    }
    out.push('\n');
    for &child in scene.children(entity) {
        write_tree(scene, child, depth + 1, out)?;
    }
    Ok(())
}

/// Relative path from the entity at `from` to every entity in the tree.
pub fn paths(scene: &Scene, root: EntityId, from: &str) -> Result<String> {
    let origin = scene
        .entity_by_path(root, from)
        .ok_or_else(|| anyhow!("no entity at '{from}'"))?;
    let mut out = String::new();
    for entity in scene.branch_entities(root) {
        if let Some(relative) = scene.relative_path_to(origin, entity) {
            writeln!(out, "{:<24} {}", scene.entity_path(entity), relative)?;
        }
    }
    Ok(out)
}

/// Resolve an entity path, or a component path with its properties.
pub fn resolve(scene: &Scene, root: EntityId, target: &str) -> Result<String> {
    if path::split_component_path(target).is_some() {
        let component = scene
            .component_by_path(root, target)
            .ok_or_else(|| anyhow!("no component at '{target}'"))?;
        let properties = scene.write_component_json(component)?;
        return Ok(format!(
            "{}\n{}\n",
            scene.component_path(component),
            serde_json::to_string_pretty(&properties)?
        ));
    }
    let entity = scene
        .entity_by_path(root, target)
        .ok_or_else(|| anyhow!("no entity at '{target}'"))?;
    Ok(format!("{}\n", scene.entity_path(entity)))
}

/// Deep copy of the whole document, optionally renamed, as JSON text.
pub fn copy(scene: &mut Scene, root: EntityId, name: Option<&str>) -> Result<String> {
    let copy = match name {
        Some(name) => scene.copy_deep_named(root, name, true)?,
        None => scene.copy_deep(root, true)?,
    };
    Ok(scene.to_json_string_pretty(copy)?)
}

/// Fail when references in the document never resolved.
pub fn validate(scene: &Scene) -> Result<String> {
    let pending = scene.pending_references();
    for reference in &pending {
        warn!(
            owner = ?reference.owner.map(|c| scene.component_path(c)),
            path = %path::component_path(&reference.path, &reference.component_type),
            "unresolved reference"
        );
    }
    if !pending.is_empty() {
        bail!("{} unresolved reference(s)", pending.len());
    }
    Ok(format!(
        "ok: {} entities, {} components\n",
        scene.entity_count(),
        scene.component_count()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = r#"{
        "name": "level",
        "components": { "TransformNode": {} },
        "children": {
            "lamp": { "name": "lamp", "components": { "PointLight": { "range": 4.0 } } },
            "camera": {
                "name": "camera",
                "components": { "LookAt": { "target": "lamp" } }
            }
        }
    }"#;

    #[test]
    fn test_tree_outline() {
        let (scene, root) = load(LEVEL, SceneConfig::default()).unwrap();
        assert_eq!(
            tree(&scene, root).unwrap(),
            "level [TransformNode]\n  lamp [PointLight, TransformNode]\n  camera [LookAt]\n"
        );
    }

    #[test]
    fn test_paths_from_child() {
        let (scene, root) = load(LEVEL, SceneConfig::default()).unwrap();
        let out = paths(&scene, root, "camera").unwrap();
        let relatives: Vec<&str> = out.lines().filter_map(|l| l.split_whitespace().nth(1)).collect();
        assert_eq!(relatives, vec!["..", "../lamp", "."]);
        assert!(paths(&scene, root, "missing").is_err());
    }

    #[test]
    fn test_resolve_component_and_entity() {
        let (scene, root) = load(LEVEL, SceneConfig::default()).unwrap();
        let out = resolve(&scene, root, "lamp:PointLight").unwrap();
        assert!(out.starts_with("level/lamp:PointLight\n"));
        assert!(out.contains("\"range\": 4.0"));
        assert_eq!(resolve(&scene, root, "camera").unwrap(), "level/camera\n");
        assert!(resolve(&scene, root, "camera:Mesh").is_err());
    }

    #[test]
    fn test_copy_renames_root() {
        let (mut scene, root) = load(LEVEL, SceneConfig::default()).unwrap();
        let text = copy(&mut scene, root, Some("level_copy")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["name"], "level_copy");
        assert_eq!(json["children"]["camera"]["components"]["LookAt"]["target"], "lamp");
    }

    #[test]
    fn test_validate_reports_dangling_references() {
        let (scene, _) = load(LEVEL, SceneConfig::default()).unwrap();
        assert!(validate(&scene).unwrap().starts_with("ok:"));

        let dangling = r#"{ "name": "x", "components": { "LookAt": { "target": "nowhere" } } }"#;
        let (scene, _) = load(dangling, SceneConfig::default()).unwrap();
        assert!(validate(&scene).is_err());
    }

    #[test]
    fn test_strict_load_rejects_unknown_types() {
        let doc = r#"{ "name": "x", "components": { "Ghost": {} } }"#;
        assert!(load(doc, SceneConfig::default()).is_ok());
        assert!(load(doc, SceneConfig::new().with_strict_json(true)).is_err());
    }
}
