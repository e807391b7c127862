//! Canonical node id construction. Every id format lives here
//! so that the harness (which mints ids while extracting), core (which
//! looks nodes up by id while resolving), and the assembler (which dedups
//! by id) can never disagree about the string shape.

/// Reserved package name for compilation units with no `package` declaration.
pub const SENTINEL_PACKAGE: &str = "<default>";

pub fn module_id(package: &str) -> String {
    format!("module:{}", package)
}

pub fn class_id(fqn: &str) -> String {
    format!("class:{}", fqn)
}

pub fn interface_id(fqn: &str) -> String {
    format!("interface:{}", fqn)
}

pub fn method_id(owner_fqn: &str, simple_name: &str, signature: &str) -> String {
    format!("method:{}#{}{}", owner_fqn, simple_name, signature)
}

pub fn constructor_id(owner_fqn: &str, signature: &str) -> String {
    format!("constructor:{}::<init>{}", owner_fqn, signature)
}

pub fn field_id(owner_fqn: &str, simple_name: &str) -> String {
    format!("field:{}#{}", owner_fqn, simple_name)
}

/// A best-effort synthetic destination id for a call that could not be
/// resolved to a concrete node.
pub fn synthetic_method_id(best_guess_owner: &str, name: &str) -> String {
    format!("method:{}#{}(?)", best_guess_owner, name)
}

/// Synthetic destination id for an `extends`/type reference that names a
/// class outside the analyzed file set.
pub fn synthetic_class_id(raw_name: &str) -> String {
    format!("class:{}(?)", raw_name)
}

/// Synthetic destination id for an `extends`/`implements` reference that
/// names an interface outside the analyzed file set.
pub fn synthetic_interface_id(raw_name: &str) -> String {
    format!("interface:{}(?)", raw_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_method_id_with_signature() {
        assert_eq!(
            method_id("com.example.Foo", "bar", "(String,int)"),
            "method:com.example.Foo#bar(String,int)"
        );
    }

    #[test]
    fn formats_empty_signature_method_id() {
        assert_eq!(method_id("com.example.Foo", "bar", "()"), "method:com.example.Foo#bar()");
    }

    #[test]
    fn formats_constructor_id() {
        assert_eq!(
            constructor_id("com.example.Foo", "()"),
            "constructor:com.example.Foo::<init>()"
        );
    }

    #[test]
    fn formats_sentinel_module_id() {
        assert_eq!(module_id(SENTINEL_PACKAGE), "module:<default>");
    }
}
