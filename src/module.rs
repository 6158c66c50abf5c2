// ABOUTME: Module storage and the registry that owns every loaded module

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ast::Function;
use crate::error::{AttoError, FileIOError};
use crate::lexer::lex;
use crate::token::Token;

pub const CORE_MODULE: &str = "__core__";
pub const MAIN_MODULE: &str = "__main__";

/// A small `Copy` handle standing in for a module reference. Per the
/// registry's redesign notes, nothing outside `ModuleRegistry` holds a
/// pointer or `Rc` to a `Module` — every reference is this index plus a
/// lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub usize);

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub path: Option<PathBuf>,
    pub code: String,
    pub tokens: Vec<Token>,
    pub functions: HashMap<String, Function>,
    pub imports: Vec<ModuleId>,
    pub parsed: bool,
}

impl Module {
    pub fn new(name: impl Into<String>, path: Option<PathBuf>, code: String) -> Self {
        Module {
            name: name.into(),
            path,
            code,
            tokens: Vec::new(),
            functions: HashMap::new(),
            imports: Vec::new(),
            parsed: false,
        }
    }

    pub fn has_func(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

/// Reads source text for an `__import`ed path. Kept as a trait so the
/// parser never touches the filesystem directly — the default
/// implementation reads real files; tests substitute an in-memory loader.
pub trait ModuleLoader {
    fn load(&self, path: &Path) -> Result<String, AttoError>;
}

pub struct FsModuleLoader;

impl ModuleLoader for FsModuleLoader {
    fn load(&self, path: &Path) -> Result<String, AttoError> {
        std::fs::read_to_string(path).map_err(|e| {
            AttoError::FileIO(FileIOError {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })
    }
}

/// Owns every loaded module. One entry per distinct module name;
/// `__core__` and `__main__` are reserved names populated by the host.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: Vec<Module>,
    by_name: HashMap<String, ModuleId>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        ModuleRegistry::default()
    }

    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub fn id_by_name(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: ModuleId) -> &str {
        &self.modules[id.0].name
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.name.as_str())
    }

    /// Register a brand-new module by name, returning its id. The caller
    /// is expected to lex/parse it immediately afterwards — registration
    /// happens first so a module can see itself (and be seen by a
    /// sibling import cycle check) while it's still being built.
    pub fn register(&mut self, module: Module) -> ModuleId {
        let name = module.name.clone();
        let id = ModuleId(self.modules.len());
        self.modules.push(module);
        self.by_name.insert(name, id);
        id
    }

    /// Resolve an `__import` path relative to `importer`'s directory,
    /// returning the existing module if one with that stem is already
    /// registered, or reading and registering a new one via `loader`.
    pub fn import(
        &mut self,
        importer: ModuleId,
        raw_path: &Path,
        loader: &dyn ModuleLoader,
    ) -> Result<ModuleId, AttoError> {
        let resolved = if raw_path.is_relative() {
            match &self.get(importer).path {
                Some(p) => p
                    .parent()
                    .map(|dir| dir.join(raw_path))
                    .unwrap_or_else(|| raw_path.to_path_buf()),
                None => raw_path.to_path_buf(),
            }
        } else {
            raw_path.to_path_buf()
        };

        let stem = resolved
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| resolved.display().to_string());

        if let Some(id) = self.by_name.get(&stem) {
            return Ok(*id);
        }

        let code = loader.load(&resolved)?;
        let mut module = Module::new(stem.clone(), Some(resolved), code);
        module.tokens = lex(&stem, &module.code, 1, 1)?;
        Ok(self.register(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_increasing_ids() {
        let mut reg = ModuleRegistry::new();
        let a = reg.register(Module::new("a", None, String::new()));
        let b = reg.register(Module::new("b", None, String::new()));
        assert_eq!(a, ModuleId(0));
        assert_eq!(b, ModuleId(1));
        assert_eq!(reg.id_by_name("a"), Some(a));
        assert_eq!(reg.id_by_name("b"), Some(b));
    }

    struct StubLoader(&'static str);
    impl ModuleLoader for StubLoader {
        fn load(&self, _path: &Path) -> Result<String, AttoError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn import_reuses_already_registered_module_by_stem() {
        let mut reg = ModuleRegistry::new();
        let main = reg.register(Module::new(MAIN_MODULE, Some(PathBuf::from("main.at")), String::new()));
        let loader = StubLoader("fn id x is x");
        let helper = reg.import(main, Path::new("helper.at"), &loader).unwrap();
        let again = reg.import(main, Path::new("helper.at"), &loader).unwrap();
        assert_eq!(helper, again);
        assert_eq!(reg.get(helper).code, "fn id x is x");
    }

    #[test]
    fn import_lexes_the_loaded_source_so_it_can_be_parsed() {
        let mut reg = ModuleRegistry::new();
        let main = reg.register(Module::new(MAIN_MODULE, Some(PathBuf::from("main.at")), String::new()));
        let loader = StubLoader("fn id x is x");
        let helper = reg.import(main, Path::new("helper.at"), &loader).unwrap();
        assert!(!reg.get(helper).tokens.is_empty());
    }
}
