//! Namespace and import context used to resolve names written in a file

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::lexer::LineInfo;

/// Strip a leading `\` from a name
pub fn normalize(name: &str) -> &str {
    name.trim().trim_start_matches('\\')
}

/// The part of a name after its last `\`
pub fn simple_name(name: &str) -> &str {
    let name = normalize(name);
    name.rsplit('\\').next().unwrap_or(name)
}

/// The namespace part of a name, if any
pub fn namespace_of(name: &str) -> Option<&str> {
    normalize(name).rsplit_once('\\').map(|(ns, _)| ns)
}

/// Case-insensitive comparison of two class-like names, ignoring leading `\`
pub fn same_name(a: &str, b: &str) -> bool {
    normalize(a).eq_ignore_ascii_case(normalize(b))
}

fn namespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*namespace\s+([A-Za-z_\x80-\xff][\w\\\x80-\xff]*)?\s*[;{]").unwrap()
    })
}

fn import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*use\s+\\?([A-Za-z_\x80-\xff][\w\\\x80-\xff]*)(?:\s+as\s+([A-Za-z_\x80-\xff][\w\x80-\xff]*))?\s*;").unwrap()
    })
}

/// Namespace and class imports in effect at some point of a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameContext {
    namespace: Option<String>,
    /// Lowercase alias -> fully qualified name
    imports: HashMap<String, String>,
}

impl NameContext {
    pub fn new(namespace: Option<String>) -> Self {
        Self {
            namespace,
            imports: HashMap::new(),
        }
    }

    /// Collect the context in effect at line `until` (exclusive).
    ///
    /// Only statements outside of any class-like body are considered: depth 0,
    /// or depth 1 directly inside a braced `namespace { }` block.
    pub fn collect(infos: &[LineInfo], until: usize) -> Self {
        let mut context = NameContext::default();
        let mut braced_namespace = false;

        for info in infos.iter().take(until) {
            let allowed_depth = if braced_namespace { 1 } else { 0 };
            if info.depth > allowed_depth {
                continue;
            }

            if let Some(caps) = namespace_re().captures(&info.code) {
                context.namespace = caps.get(1).map(|m| m.as_str().to_string());
                context.imports.clear();
                braced_namespace = info.code.trim_end().ends_with('{');
                continue;
            }

            if let Some(caps) = import_re().captures(&info.code) {
                let Some(full) = caps.get(1) else { continue };
                let full = full.as_str();
                // `use function` / `use const` are not class imports
                if full.eq_ignore_ascii_case("function") || full.eq_ignore_ascii_case("const") {
                    continue;
                }
                let alias = caps
                    .get(2)
                    .map(|m| m.as_str())
                    .unwrap_or_else(|| simple_name(full));
                context.add_import(alias, full);
            }
        }

        context
    }

    pub fn add_import(&mut self, alias: &str, full: &str) {
        self.imports
            .insert(alias.to_ascii_lowercase(), normalize(full).to_string());
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Resolve a class-like name as written in code to its fully qualified form
    pub fn resolve(&self, written: &str) -> String {
        let written = written.trim();
        if let Some(full) = written.strip_prefix('\\') {
            return full.to_string();
        }
        if let Some(rest) = written.strip_prefix("namespace\\") {
            return self.qualify(rest);
        }

        let (first, rest) = match written.split_once('\\') {
            Some((first, rest)) => (first, Some(rest)),
            None => (written, None),
        };
        if let Some(imported) = self.imports.get(&first.to_ascii_lowercase()) {
            return match rest {
                Some(rest) => format!("{}\\{}", imported, rest),
                None => imported.clone(),
            };
        }

        self.qualify(written)
    }

    /// How a fully qualified name should be written so that it resolves back to itself
    pub fn spell(&self, full: &str) -> String {
        let full = normalize(full);
        if self.namespace.is_some() || self.imports_shadow(full) {
            format!("\\{}", full)
        } else {
            full.to_string()
        }
    }

    fn imports_shadow(&self, full: &str) -> bool {
        let first = full.split('\\').next().unwrap_or(full);
        self.imports.contains_key(&first.to_ascii_lowercase())
    }

    fn qualify(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}\\{}", ns, name),
            None => name.to_string(),
        }
    }
}
