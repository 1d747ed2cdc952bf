//! Relative path grammar shared by entity lookup and reference properties.
//!
//! Paths address entities the way filesystem paths address directories:
//!
//! | token    | meaning                                              |
//! |----------|------------------------------------------------------|
//! | `.`      | the entity the lookup starts from                    |
//! | `..`     | its parent (`../` when more segments follow)         |
//! | `/`      | separates child names                                |
//! | `:`      | separates an entity path from a component type name  |
//! | `.`      | after the type name, separates a property name       |
//! | `res://` | restarts the lookup at the scene's resource root     |
//!
//! This module only parses and formats. Walking the tree happens in
//! [`Scene::entity_by_path`](crate::Scene::entity_by_path).

pub const TO_SELF: &str = ".";
pub const TO_PARENT: &str = "..";
pub const DELIMITER: char = '/';
pub const UP_DELIMITER: &str = "../";
pub const COMPONENT_DELIMITER: char = ':';
pub const PROPERTY_DELIMITER: char = '.';
pub const RESOURCE_ROOT_PREFIX: &str = "res://";

/// Where a parsed path starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathBase {
    /// The entity the lookup was issued from.
    Current,
    /// The scene's resource root.
    ResourceRoot,
}

/// One step of an entity path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Current,
    Parent,
    Child(&'a str),
}

/// A parsed entity path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPath<'a> {
    pub base: PathBase,
    pub segments: Vec<Segment<'a>>,
}

impl<'a> EntityPath<'a> {
    /// Parse an entity path.
    ///
    /// Returns `None` for the empty string and for paths containing empty
    /// segments (`a//b`, `a/`). `res://` on its own addresses the resource
    /// root.
    #[must_use]
    pub fn parse(path: &'a str) -> Option<Self> {
        let (base, rest) = match path.strip_prefix(RESOURCE_ROOT_PREFIX) {
            Some(rest) => (PathBase::ResourceRoot, rest),
            None => (PathBase::Current, path),
        };
        if rest.is_empty() {
            return match base {
                PathBase::ResourceRoot => Some(Self {
                    base,
                    segments: Vec::new(),
                }),
                PathBase::Current => None,
            };
        }

        let mut segments = Vec::new();
        for part in rest.split(DELIMITER) {
            segments.push(match part {
                "" => return None,
                TO_SELF => Segment::Current,
                TO_PARENT => Segment::Parent,
                name => Segment::Child(name),
            });
        }
        Some(Self { base, segments })
    }
}

/// Split `entity/path:ComponentType` at the last `:`.
///
/// The entity part may be empty, meaning the entity the lookup starts from.
/// Returns `None` when there is no component name.
#[must_use]
pub fn split_component_path(path: &str) -> Option<(&str, &str)> {
    let colon = path.rfind(COMPONENT_DELIMITER)?;
    if path.starts_with(RESOURCE_ROOT_PREFIX) && colon < RESOURCE_ROOT_PREFIX.len() {
        return None;
    }
    let (entity, component) = (&path[..colon], &path[colon + 1..]);
    if component.is_empty() {
        return None;
    }
    Some((entity, component))
}

/// Whether `name` can be used as an entity name.
///
/// A name must survive a trip through [`EntityPath::parse`] as a single
/// child segment: it is not empty, not `.` or `..`, and holds no `/`. Names
/// with `:` stay valid because component paths split at the last `:`.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != TO_SELF && name != TO_PARENT && !name.contains(DELIMITER)
}

/// Split `entity/path:ComponentType.property` into its three parts.
///
/// The property is separated by the first `.` after the last `:`. Returns
/// `None` when the component or property name is missing.
#[must_use]
pub fn split_property_path(path: &str) -> Option<(&str, &str, &str)> {
    let (entity, rest) = split_component_path(path)?;
    let (component, property) = rest.split_once(PROPERTY_DELIMITER)?;
    if component.is_empty() || property.is_empty() {
        return None;
    }
    Some((entity, component, property))
}

/// Append `child` to an entity path.
#[must_use]
pub fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_owned()
    } else {
        format!("{parent}{DELIMITER}{child}")
    }
}

/// Format `entity:Component`.
#[must_use]
pub fn component_path(entity_path: &str, component: &str) -> String {
    format!("{entity_path}{COMPONENT_DELIMITER}{component}")
}

/// Split `name_12` into `("name", 12)`.
///
/// Suffixes that do not fit in a `u64` count as no suffix.
#[must_use]
pub fn split_numeric_suffix(name: &str) -> Option<(&str, u64)> {
    let head = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if head.len() == name.len() {
        return None;
    }
    let prefix = head.strip_suffix('_')?;
    let number = name[head.len()..].parse().ok()?;
    Some((prefix, number))
}

/// Candidate names tried after `candidate` collides with a sibling.
///
/// `light` yields `light_1`, `light_2`, ...; `light_4` yields `light_5`,
/// `light_6`, ...
pub fn candidate_names(candidate: &str) -> impl Iterator<Item = String> + '_ {
    let (prefix, start) = match split_numeric_suffix(candidate) {
        Some((prefix, n)) if n < u64::MAX => (prefix, n + 1),
        _ => (candidate, 1),
    };
    (start..=u64::MAX).map(move |n| format!("{prefix}_{n}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_property_path() {
        assert_eq!(split_property_path("a/b:Light.color"), Some(("a/b", "Light", "color")));
        assert_eq!(split_property_path(":Light.color"), Some(("", "Light", "color")));
        assert_eq!(split_property_path("../x.y:Light.color"), Some(("../x.y", "Light", "color")));
        assert_eq!(split_property_path("a:Light"), None);
        assert_eq!(split_property_path("a:Light."), None);
        assert_eq!(split_property_path("a:.color"), None);
    }

    #[test]
    fn test_valid_names() {
        for name in ["a", "light_2", "x:y", "..a", "res:"] {
            assert!(is_valid_name(name), "{name}");
        }
        for name in ["", ".", "..", "a/b", "res://x", "/"] {
            assert!(!is_valid_name(name), "{name:?}");
        }
    }

    #[test]
    fn test_parse_child_chain() {
        let path = EntityPath::parse("a/b/c").unwrap();
        assert_eq!(path.base, PathBase::Current);
        assert_eq!(
            path.segments,
            vec![Segment::Child("a"), Segment::Child("b"), Segment::Child("c")]
        );
    }

    #[test]
    fn test_parse_up_and_self() {
        let path = EntityPath::parse("../../x").unwrap();
        assert_eq!(
            path.segments,
            vec![Segment::Parent, Segment::Parent, Segment::Child("x")]
        );
        assert_eq!(EntityPath::parse(".").unwrap().segments, vec![Segment::Current]);
        assert_eq!(EntityPath::parse("..").unwrap().segments, vec![Segment::Parent]);
    }

    #[test]
    fn test_parse_resource_root() {
        let path = EntityPath::parse("res://materials/wood").unwrap();
        assert_eq!(path.base, PathBase::ResourceRoot);
        assert_eq!(
            path.segments,
            vec![Segment::Child("materials"), Segment::Child("wood")]
        );
        assert!(EntityPath::parse("res://").unwrap().segments.is_empty());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(EntityPath::parse("").is_none());
        assert!(EntityPath::parse("a//b").is_none());
        assert!(EntityPath::parse("a/").is_none());
        assert!(EntityPath::parse("/a").is_none());
    }

    #[test]
    fn test_split_component_path() {
        assert_eq!(split_component_path("a/b:Light"), Some(("a/b", "Light")));
        assert_eq!(split_component_path(":Light"), Some(("", "Light")));
        assert_eq!(split_component_path("res://a:Mesh"), Some(("res://a", "Mesh")));
        assert_eq!(split_component_path("a/b"), None);
        assert_eq!(split_component_path("a:"), None);
        assert_eq!(split_component_path("res://a"), None);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", "b"), "a/b");
        assert_eq!(component_path("a/b", "Mesh"), "a/b:Mesh");
    }

    #[test]
    fn test_split_numeric_suffix() {
        assert_eq!(split_numeric_suffix("light_12"), Some(("light", 12)));
        assert_eq!(split_numeric_suffix("light"), None);
        assert_eq!(split_numeric_suffix("light12"), None);
        assert_eq!(split_numeric_suffix("light_"), None);
        assert_eq!(split_numeric_suffix("light_99999999999999999999999"), None);
    }

    #[test]
    fn test_candidate_names_without_suffix() {
        let names: Vec<_> = candidate_names("box").take(3).collect();
        assert_eq!(names, vec!["box_1", "box_2", "box_3"]);
    }

    #[test]
    fn test_candidate_names_continue_suffix() {
        let names: Vec<_> = candidate_names("box_4").take(2).collect();
        assert_eq!(names, vec!["box_5", "box_6"]);
    }

    #[test]
    fn test_candidate_names_max_suffix_restarts() {
        let candidate = format!("box_{}", u64::MAX);
        let first = candidate_names(&candidate).next().unwrap();
        assert_eq!(first, format!("{candidate}_1"));
    }
}
