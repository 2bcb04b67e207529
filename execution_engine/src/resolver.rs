//! Resolves host functions and memory imports from within the WASM sandbox.

use std::cell::RefCell;

use wasmi::{
    memory_units::Pages, FuncInstance, FuncRef, MemoryDescriptor, MemoryInstance, MemoryRef,
    ModuleImportResolver, Signature, ValueType,
};

use crate::function_index::FunctionIndex;

/// The largest linear memory a contract may import, in 64 KiB pages.
pub(crate) const MAX_MEMORY_PAGES: u32 = 128;

/// An import resolver for the `"env"` module: the host-function table plus an
/// optionally imported linear memory.
pub(crate) struct RuntimeModuleImportResolver {
    memory: RefCell<Option<MemoryRef>>,
}

impl RuntimeModuleImportResolver {
    pub(crate) fn new() -> Self {
        RuntimeModuleImportResolver {
            memory: RefCell::new(None),
        }
    }

    /// Returns the memory the module imported, if it imported one. Modules
    /// exporting their own memory never hit `resolve_memory`.
    pub(crate) fn memory_ref(&self) -> Option<MemoryRef> {
        self.memory.borrow().clone()
    }
}

impl ModuleImportResolver for RuntimeModuleImportResolver {
    fn resolve_func(&self, field_name: &str, signature: &Signature) -> Result<FuncRef, wasmi::Error> {
        let (index, param_count) = FunctionIndex::from_import_name(field_name).ok_or_else(|| {
            wasmi::Error::Instantiation(format!("export {} not found", field_name))
        })?;

        let expected = Signature::new(vec![ValueType::I32; param_count], Some(ValueType::I32));
        if *signature != expected {
            return Err(wasmi::Error::Instantiation(format!(
                "export {} has an unsupported signature {:?}",
                field_name, signature
            )));
        }

        Ok(FuncInstance::alloc_host(expected, index as usize))
    }

    fn resolve_memory(
        &self,
        field_name: &str,
        descriptor: &MemoryDescriptor,
    ) -> Result<MemoryRef, wasmi::Error> {
        if field_name != "memory" {
            return Err(wasmi::Error::Instantiation(format!(
                "export {} not found",
                field_name
            )));
        }
        if descriptor.initial() > MAX_MEMORY_PAGES {
            return Err(wasmi::Error::Instantiation(format!(
                "requested {} pages of memory, maximum is {}",
                descriptor.initial(),
                MAX_MEMORY_PAGES
            )));
        }
        let memory = MemoryInstance::alloc(
            Pages(descriptor.initial() as usize),
            descriptor.maximum().map(|pages| Pages(pages as usize)),
        )?;
        *self.memory.borrow_mut() = Some(memory.clone());
        Ok(memory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_import_with_matching_signature_resolves() {
        let resolver = RuntimeModuleImportResolver::new();
        let signature = Signature::new(vec![ValueType::I32; 5], Some(ValueType::I32));
        assert!(resolver.resolve_func("__read_state", &signature).is_ok());
    }

    #[test]
    fn mismatched_signature_is_rejected() {
        let resolver = RuntimeModuleImportResolver::new();
        let signature = Signature::new(vec![ValueType::I64; 5], Some(ValueType::I32));
        assert!(resolver.resolve_func("__read_state", &signature).is_err());
    }

    #[test]
    fn unknown_import_is_rejected() {
        let resolver = RuntimeModuleImportResolver::new();
        let signature = Signature::new(vec![ValueType::I32; 2], Some(ValueType::I32));
        assert!(resolver.resolve_func("__gas", &signature).is_err());
    }
}
