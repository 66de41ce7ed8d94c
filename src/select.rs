//! Documentation selection.
//!
//! Given the capability snapshots for a resolved declaration, decide
//! which documentation text (if any) belongs in the stub. The rules are
//! ordered; each one either yields text, yields a definite absence, or
//! falls through to the next.

use crate::runtime::{DocValue, ResolvedSymbol, SymbolFacts, SymbolProvider};
use crate::syntax::DefKind;

/// Validate that a chosen documentation slot actually holds text.
fn text_or_warn(doc: &DocValue, qualname: &str) -> Option<String> {
    match doc {
        DocValue::Text(t) => Some(t.clone()),
        DocValue::Descriptor => {
            tracing::warn!("documentation for {} is a descriptor, not text", qualname);
            None
        }
        DocValue::Other(type_name) => {
            tracing::warn!(
                "documentation for {} is {}, not text",
                qualname,
                type_name
            );
            None
        }
    }
}

/// Select documentation for a class or function declaration.
pub fn select(
    provider: &dyn SymbolProvider,
    resolved: &ResolvedSymbol,
    kind: DefKind,
    qualname: &str,
    name: &str,
) -> Option<String> {
    match kind {
        DefKind::Class => select_class(resolved, qualname),
        DefKind::Function => select_def(provider, resolved, qualname, name),
    }
}

fn select_class(resolved: &ResolvedSymbol, qualname: &str) -> Option<String> {
    match resolved.symbol.doc.as_ref()? {
        // The documentation slot can be inherited from a metaclass as an
        // unresolved descriptor; that is not this class's documentation.
        DocValue::Descriptor => {
            tracing::debug!("ignoring descriptor-typed documentation for {}", qualname);
            None
        }
        doc => text_or_warn(doc, qualname),
    }
}

fn select_def(
    provider: &dyn SymbolProvider,
    resolved: &ResolvedSymbol,
    qualname: &str,
    name: &str,
) -> Option<String> {
    let symbol = &resolved.symbol;

    if symbol.is_routine() || symbol.is_data_descriptor() {
        let text = text_or_warn(symbol.doc.as_ref()?, qualname)?;
        // Constructor and allocator hooks inherited from the root object
        // type carry boilerplate text that says nothing about this
        // class.
        if resolved.owner.is_class()
            && !resolved.owner.is_root_type
            && (name == "__init__" || name == "__new__")
            && provider.root_hook_doc(name).as_deref() == Some(text.as_str())
        {
            tracing::trace!("ignoring inherited hook documentation for {}", qualname);
            return None;
        }
        return Some(text);
    }

    // The attribute-access view is a plain value; the owner's own
    // namespace may still hold a descriptor with documentation of its
    // own.
    if let Some(raw) = &resolved.raw_entry {
        if raw.is_data_descriptor() {
            if let Some(DocValue::Text(text)) = &raw.doc {
                if !text.is_empty() {
                    tracing::debug!("using descriptor documentation for {}", qualname);
                    return Some(text.clone());
                }
            }
        }
    }

    // For plain instances, only take documentation that belongs to the
    // instance itself rather than its type: usable when the type's own
    // slot is empty or holds an unresolved descriptor.
    if !symbol.is_class() {
        let type_slot_unresolved = matches!(
            symbol.type_doc.as_ref(),
            None | Some(DocValue::Descriptor)
        );
        if type_slot_unresolved {
            if let Some(DocValue::Text(text)) = &symbol.doc {
                if !text.is_empty() {
                    tracing::debug!("using instance documentation for {}", qualname);
                    return Some(text.clone());
                }
            }
        }
    }

    None
}

/// Select documentation for the module itself. No fallback.
pub fn select_module(facts: &SymbolFacts, module_path: &str) -> Option<String> {
    text_or_warn(facts.doc.as_ref()?, module_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{LoadError, RuntimeFacts, SymbolKind};

    fn facts(kind: SymbolKind) -> SymbolFacts {
        SymbolFacts {
            kind,
            doc: None,
            type_doc: None,
            has_source: false,
            is_root_type: false,
        }
    }

    fn with_doc(kind: SymbolKind, doc: &str) -> SymbolFacts {
        SymbolFacts {
            doc: Some(DocValue::Text(doc.to_string())),
            ..facts(kind)
        }
    }

    /// Provider that only answers the root hook query.
    struct Hooks;

    impl SymbolProvider for Hooks {
        fn load(&self, _: &str) -> Result<(), LoadError> {
            Ok(())
        }
        fn module_facts(&self, _: &str) -> Option<SymbolFacts> {
            None
        }
        fn resolve(&self, _: &str, _: &str) -> Option<ResolvedSymbol> {
            None
        }
        fn root_hook_doc(&self, member: &str) -> Option<String> {
            match member {
                "__init__" => Some("Initialize self.".to_string()),
                "__new__" => Some("Create and return a new object.".to_string()),
                _ => None,
            }
        }
        fn is_builtin(&self, _: &str) -> bool {
            false
        }
        fn runtime_facts(&self) -> Option<RuntimeFacts> {
            None
        }
    }

    #[test]
    fn test_plain_function_uses_own_doc() {
        let resolved = ResolvedSymbol {
            owner: facts(SymbolKind::Instance),
            symbol: with_doc(SymbolKind::Routine, "does X"),
            raw_entry: None,
        };
        assert_eq!(
            select(&Hooks, &resolved, DefKind::Function, "f", "f").as_deref(),
            Some("does X")
        );
    }

    #[test]
    fn test_inherited_init_boilerplate_is_dropped() {
        let resolved = ResolvedSymbol {
            owner: facts(SymbolKind::Class),
            symbol: with_doc(SymbolKind::Routine, "Initialize self."),
            raw_entry: None,
        };
        assert_eq!(
            select(&Hooks, &resolved, DefKind::Function, "C.__init__", "__init__"),
            None
        );

        // A class-specific constructor doc survives.
        let resolved = ResolvedSymbol {
            owner: facts(SymbolKind::Class),
            symbol: with_doc(SymbolKind::Routine, "Build a C from parts."),
            raw_entry: None,
        };
        assert_eq!(
            select(&Hooks, &resolved, DefKind::Function, "C.__init__", "__init__").as_deref(),
            Some("Build a C from parts.")
        );

        // On the root type itself the text is authoritative.
        let resolved = ResolvedSymbol {
            owner: SymbolFacts {
                is_root_type: true,
                ..facts(SymbolKind::Class)
            },
            symbol: with_doc(SymbolKind::Routine, "Initialize self."),
            raw_entry: None,
        };
        assert_eq!(
            select(&Hooks, &resolved, DefKind::Function, "object.__init__", "__init__")
                .as_deref(),
            Some("Initialize self.")
        );
    }

    #[test]
    fn test_property_raw_entry_wins_over_instance_view() {
        let resolved = ResolvedSymbol {
            owner: facts(SymbolKind::Class),
            symbol: with_doc(SymbolKind::Instance, "the computed value"),
            raw_entry: Some(with_doc(SymbolKind::DataDescriptor, "The property doc.")),
        };
        assert_eq!(
            select(&Hooks, &resolved, DefKind::Function, "C.attr", "attr").as_deref(),
            Some("The property doc.")
        );
    }

    #[test]
    fn test_instance_doc_fallback_requires_unresolved_type_slot() {
        // Type slot holds text: the instance doc is just the type's and
        // must not be attached.
        let mut symbol = with_doc(SymbolKind::Instance, "instance doc");
        symbol.type_doc = Some(DocValue::Text("type doc".to_string()));
        let resolved = ResolvedSymbol {
            owner: facts(SymbolKind::Instance),
            symbol,
            raw_entry: Some(facts(SymbolKind::Instance)),
        };
        assert_eq!(select(&Hooks, &resolved, DefKind::Function, "x", "x"), None);

        // Type slot is a descriptor: the instance's own text applies.
        let mut symbol = with_doc(SymbolKind::Instance, "instance doc");
        symbol.type_doc = Some(DocValue::Descriptor);
        let resolved = ResolvedSymbol {
            owner: facts(SymbolKind::Instance),
            symbol,
            raw_entry: Some(facts(SymbolKind::Instance)),
        };
        assert_eq!(
            select(&Hooks, &resolved, DefKind::Function, "x", "x").as_deref(),
            Some("instance doc")
        );
    }

    #[test]
    fn test_class_descriptor_doc_is_absent() {
        let resolved = ResolvedSymbol {
            owner: facts(SymbolKind::Instance),
            symbol: SymbolFacts {
                doc: Some(DocValue::Descriptor),
                ..facts(SymbolKind::Class)
            },
            raw_entry: None,
        };
        assert_eq!(select(&Hooks, &resolved, DefKind::Class, "C", "C"), None);

        let resolved = ResolvedSymbol {
            owner: facts(SymbolKind::Instance),
            symbol: with_doc(SymbolKind::Class, "A class."),
            raw_entry: None,
        };
        assert_eq!(
            select(&Hooks, &resolved, DefKind::Class, "C", "C").as_deref(),
            Some("A class.")
        );
    }

    #[test]
    fn test_non_text_doc_is_absent() {
        let resolved = ResolvedSymbol {
            owner: facts(SymbolKind::Instance),
            symbol: SymbolFacts {
                doc: Some(DocValue::Other("int".to_string())),
                ..facts(SymbolKind::Routine)
            },
            raw_entry: None,
        };
        assert_eq!(select(&Hooks, &resolved, DefKind::Function, "f", "f"), None);
    }

    #[test]
    fn test_module_doc_has_no_fallback() {
        assert_eq!(
            select_module(&with_doc(SymbolKind::Instance, "Module doc."), "m").as_deref(),
            Some("Module doc.")
        );
        assert_eq!(select_module(&facts(SymbolKind::Instance), "m"), None);
    }
}
