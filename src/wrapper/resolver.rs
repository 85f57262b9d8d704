//! Resolution of dotted target paths such as `A.prototype.x#set`.

use regex::Regex;

use crate::error::{Error, Result};
use crate::host::object::{get_property, HostObjectType};
use crate::host::realm::Realm;
use crate::host::value::HostValue;

/// Suffix selecting the setter half of a property.
pub const SETTER_SUFFIX: &str = "#set";

/// Root name that may never be wrapped.
pub const RESERVED_ROOT: &str = "libWrapper";

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[a-zA-Z_$][0-9a-zA-Z_$]*$").unwrap();
    static ref DOTTED_IDENTIFIER: Regex = Regex::new(r"^[a-zA-Z_$][0-9a-zA-Z_$.]*$").unwrap();
}

/// The slot a target path designates.
#[derive(Clone)]
pub struct ResolvedTarget {
    /// Object the leaf is looked up on.
    pub object: HostObjectType,
    /// Leaf property name.
    pub name: String,
    /// The target without the setter suffix.
    pub path: String,
    pub is_setter: bool,
}

pub fn split_target_and_setter(target: &str) -> (&str, bool) {
    match target.strip_suffix(SETTER_SUFFIX) {
        Some(path) => (path, true),
        None => (target, false),
    }
}

pub fn is_valid_identifier(ident: &str, allow_dot: bool) -> bool {
    if allow_dot {
        DOTTED_IDENTIFIER.is_match(ident)
    } else {
        IDENTIFIER.is_match(ident)
    }
}

/// Resolve `target` against the realm's global object.
///
/// Every segment must be a plain identifier and every segment but the last
/// must resolve to an object. A single segment names a slot on the global
/// object itself.
pub fn resolve(realm: &Realm, target: &str, package: &str) -> Result<ResolvedTarget> {
    let (path, is_setter) = split_target_and_setter(target);
    let segments: Vec<&str> = path.split('.').collect();

    if segments.iter().any(|s| !is_valid_identifier(s, false)) {
        return Err(Error::configuration(
            package,
            format!("Invalid target '{}'.", path),
        ));
    }
    if segments[0] == RESERVED_ROOT {
        return Err(Error::configuration(
            package,
            "Not allowed to wrap libWrapper internals.",
        ));
    }

    let (name, scopes) = match segments.split_last() {
        Some((name, scopes)) => (*name, scopes),
        None => {
            return Err(Error::configuration(
                package,
                format!("Invalid target '{}'.", path),
            ))
        }
    };

    let mut object = realm.global().clone();
    for (index, scope) in scopes.iter().enumerate() {
        let value = if index == 0 {
            realm.get_global(scope)
        } else {
            get_property(&object, scope)
        };
        object = match value {
            Ok(HostValue::Object(o)) => o,
            Ok(_) | Err(Error::Reference(_)) => {
                return Err(Error::configuration(
                    package,
                    format!("Could not find target '{}'.", path),
                ))
            }
            Err(e) => return Err(e),
        };
    }

    Ok(ResolvedTarget {
        object,
        name: name.to_string(),
        path: path.to_string(),
        is_setter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::object::{new_class, object_create, set_property};
    use std::rc::Rc;

    fn realm_with_class() -> Realm {
        let realm = Realm::new();
        let class = new_class("A", None).unwrap();
        realm.define_global("A", class).unwrap();
        realm
    }

    #[test]
    fn test_split_setter_suffix() {
        assert_eq!(split_target_and_setter("A.prototype.x#set"), ("A.prototype.x", true));
        assert_eq!(split_target_and_setter("A.prototype.x"), ("A.prototype.x", false));
    }

    #[test]
    fn test_identifier_validation() {
        assert!(is_valid_identifier("_private$1", false));
        assert!(!is_valid_identifier("1abc", false));
        assert!(!is_valid_identifier("a.b", false));
        assert!(is_valid_identifier("a.b.c", true));
        assert!(!is_valid_identifier("a b", true));
    }

    #[test]
    fn test_resolve_prototype_slot() {
        let realm = realm_with_class();
        let target = resolve(&realm, "A.prototype.x#set", "pkg").unwrap();
        assert_eq!(target.name, "x");
        assert_eq!(target.path, "A.prototype.x");
        assert!(target.is_setter);
        assert_eq!(target.object.borrow().class_name(), "A");
    }

    #[test]
    fn test_resolve_single_segment_is_global_slot() {
        let realm = realm_with_class();
        let target = resolve(&realm, "A", "pkg").unwrap();
        assert!(Rc::ptr_eq(&target.object, realm.global()));
        assert_eq!(target.name, "A");
    }

    #[test]
    fn test_resolve_rejects_bad_targets() {
        let realm = realm_with_class();
        let nested = object_create(None);
        set_property(&nested, "value", 3).unwrap();
        realm.define_global("nested", nested).unwrap();

        for bad in &["", "A..x", "A.proto-type.x", "1A.x", "libWrapper.register"] {
            assert!(
                matches!(resolve(&realm, bad, "pkg"), Err(Error::Configuration { .. })),
                "{} should be rejected",
                bad
            );
        }
        // Intermediate segments must resolve to objects.
        assert!(matches!(
            resolve(&realm, "Missing.prototype.x", "pkg"),
            Err(Error::Configuration { .. })
        ));
        assert!(resolve(&realm, "nested.value.x", "pkg").is_err());
    }
}
