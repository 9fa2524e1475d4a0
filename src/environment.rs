use crate::error::RuntimeError;
use crate::value::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Handle to a scope in an `Environment`. Stale handles to released scopes
/// are rejected rather than aliased, because a reused slot bumps its
/// generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId {
    index: usize,
    generation: u32,
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    variables: HashMap<String, Value>,
    constants: HashSet<String>,
    // A function was declared here, so its closure may outlive the call.
    captured: bool,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    scope: Option<Scope>,
}

/// Arena of lexical scopes. The global scope lives as long as the arena;
/// call scopes are released when the call returns unless captured.
#[derive(Debug)]
pub struct Environment {
    slots: Vec<Slot>,
    free: Vec<usize>,
    global: ScopeId,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    pub fn new() -> Environment {
        let mut global = Scope::default();
        for (name, value) in vec![
            ("true", Value::Boolean(true)),
            ("false", Value::Boolean(false)),
            ("null", Value::Null),
        ] {
            global.variables.insert(name.to_string(), value);
            global.constants.insert(name.to_string());
        }
        global.captured = true;

        Environment {
            slots: vec![Slot {
                generation: 0,
                scope: Some(global),
            }],
            free: Vec::new(),
            global: ScopeId {
                index: 0,
                generation: 0,
            },
        }
    }
    pub fn global(&self) -> ScopeId {
        self.global
    }
    pub fn new_child(&mut self, parent: ScopeId) -> Result<ScopeId, RuntimeError> {
        self.scope(parent)?;
        let scope = Scope {
            parent: Some(parent),
            ..Scope::default()
        };
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.scope = Some(scope);
                ScopeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    scope: Some(scope),
                });
                ScopeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        debug!(?id, ?parent, "allocated scope");
        Ok(id)
    }
    /// Frees a scope unless a function was declared in it. Returns whether
    /// the slot was reclaimed.
    ///
    /// Captured scopes are never reclaimed, even after every function
    /// declared in them is dropped. Each call of a function that declares an
    /// inner function therefore keeps one slot alive for the arena's lifetime.
    pub fn release(&mut self, id: ScopeId) -> bool {
        let slot = match self.slots.get_mut(id.index) {
            Some(slot) if slot.generation == id.generation => slot,
            _ => return false,
        };
        match &slot.scope {
            Some(scope) if !scope.captured => {}
            _ => return false,
        }
        slot.scope = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        debug!(?id, "released scope");
        true
    }
    pub fn mark_captured(&mut self, id: ScopeId) -> Result<(), RuntimeError> {
        self.scope_mut(id)?.captured = true;
        Ok(())
    }
    pub fn live_scopes(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Fails if `name` is already declared in this very scope. Shadowing an
    /// ancestor's binding is allowed.
    pub fn declare_var(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Value,
        constant: bool,
    ) -> Result<Value, RuntimeError> {
        let scope = self.scope_mut(scope)?;
        if scope.variables.contains_key(name) {
            return Err(RuntimeError::AlreadyDeclared {
                name: name.to_string(),
            });
        }
        scope.variables.insert(name.to_string(), value.clone());
        if constant {
            scope.constants.insert(name.to_string());
        }
        Ok(value)
    }
    /// Overwrites the binding in the scope that declared `name`.
    pub fn assign_var(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Value,
    ) -> Result<Value, RuntimeError> {
        let owner = self.resolve(scope, name)?;
        let owner = self.scope_mut(owner)?;
        if owner.constants.contains(name) {
            return Err(RuntimeError::ConstantReassignment {
                name: name.to_string(),
            });
        }
        owner.variables.insert(name.to_string(), value.clone());
        Ok(value)
    }
    pub fn lookup_var(&self, scope: ScopeId, name: &str) -> Result<Value, RuntimeError> {
        let owner = self.resolve(scope, name)?;
        self.scope(owner)?
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: name.to_string(),
            })
    }
    /// Nearest scope, starting at `scope` and walking parents, that declares `name`.
    pub fn resolve(&self, scope: ScopeId, name: &str) -> Result<ScopeId, RuntimeError> {
        let mut current = scope;
        loop {
            let cur = self.scope(current)?;
            if cur.variables.contains_key(name) {
                return Ok(current);
            }
            match cur.parent {
                Some(parent) => current = parent,
                None => {
                    return Err(RuntimeError::UndefinedVariable {
                        name: name.to_string(),
                    })
                }
            }
        }
    }

    fn scope(&self, id: ScopeId) -> Result<&Scope, RuntimeError> {
        match self.slots.get(id.index) {
            Some(Slot {
                generation,
                scope: Some(scope),
            }) if *generation == id.generation => Ok(scope),
            _ => Err(released(id)),
        }
    }
    fn scope_mut(&mut self, id: ScopeId) -> Result<&mut Scope, RuntimeError> {
        match self.slots.get_mut(id.index) {
            Some(Slot {
                generation,
                scope: Some(scope),
            }) if *generation == id.generation => Ok(scope),
            _ => Err(released(id)),
        }
    }
}

fn released(id: ScopeId) -> RuntimeError {
    RuntimeError::ScopeReleased {
        index: id.index,
        generation: id.generation,
    }
}

#[cfg(test)]
mod environment_tests {
    use crate::environment::Environment;
    use crate::error::RuntimeError;
    use crate::value::Value;

    #[test]
    fn test_declare_and_lookup() {
        let mut env = Environment::new();
        let global = env.global();
        env.declare_var(global, "foo", Value::from("bar"), false)
            .unwrap();
        assert_eq!(env.lookup_var(global, "foo"), Ok(Value::from("bar")));
        assert_eq!(env.lookup_var(global, "true"), Ok(Value::from(true)));
        assert_eq!(env.lookup_var(global, "null"), Ok(Value::Null));
    }

    #[test]
    fn test_redeclare_in_same_scope() {
        let mut env = Environment::new();
        let global = env.global();
        env.declare_var(global, "x", Value::from(1.0), false).unwrap();
        assert_eq!(
            env.declare_var(global, "x", Value::from(2.0), false),
            Err(RuntimeError::AlreadyDeclared {
                name: "x".to_string()
            })
        );
    }

    #[test]
    fn test_shadowing() {
        let mut env = Environment::new();
        let global = env.global();
        env.declare_var(global, "x", Value::from(1.0), true).unwrap();
        let child = env.new_child(global).unwrap();
        env.declare_var(child, "x", Value::from(2.0), false).unwrap();
        assert_eq!(env.lookup_var(child, "x"), Ok(Value::from(2.0)));
        assert_eq!(env.lookup_var(global, "x"), Ok(Value::from(1.0)));
        assert_eq!(env.resolve(child, "x"), Ok(child));
    }

    #[test]
    fn test_assign_mutates_declaring_scope() {
        let mut env = Environment::new();
        let global = env.global();
        env.declare_var(global, "x", Value::from(1.0), false).unwrap();
        let child = env.new_child(global).unwrap();
        env.assign_var(child, "x", Value::from(5.0)).unwrap();
        assert_eq!(env.resolve(child, "x"), Ok(global));
        assert_eq!(env.lookup_var(global, "x"), Ok(Value::from(5.0)));
    }

    #[test]
    fn test_constants_are_protected() {
        let mut env = Environment::new();
        let global = env.global();
        env.declare_var(global, "x", Value::from(1.0), true).unwrap();
        assert_eq!(
            env.assign_var(global, "x", Value::from(2.0)),
            Err(RuntimeError::ConstantReassignment {
                name: "x".to_string()
            })
        );
        assert_eq!(env.lookup_var(global, "x"), Ok(Value::from(1.0)));
        assert!(env.assign_var(global, "true", Value::from(false)).is_err());
    }

    #[test]
    fn test_unresolved_name() {
        let mut env = Environment::new();
        let child = env.new_child(env.global()).unwrap();
        assert_eq!(
            env.lookup_var(child, "missing"),
            Err(RuntimeError::UndefinedVariable {
                name: "missing".to_string()
            })
        );
        assert!(env.assign_var(child, "missing", Value::Null).is_err());
    }

    #[test]
    fn test_release_reuses_slots() {
        let mut env = Environment::new();
        let global = env.global();
        let child = env.new_child(global).unwrap();
        assert_eq!(env.live_scopes(), 2);
        assert!(env.release(child));
        assert_eq!(env.live_scopes(), 1);
        assert!(matches!(
            env.lookup_var(child, "true"),
            Err(RuntimeError::ScopeReleased { .. })
        ));

        let reused = env.new_child(global).unwrap();
        assert_ne!(reused, child);
        assert!(env.lookup_var(child, "true").is_err());
        assert_eq!(env.lookup_var(reused, "true"), Ok(Value::from(true)));
    }

    #[test]
    fn test_captured_scopes_survive_release() {
        let mut env = Environment::new();
        let global = env.global();
        let child = env.new_child(global).unwrap();
        env.declare_var(child, "count", Value::from(0.0), false)
            .unwrap();
        env.mark_captured(child).unwrap();
        assert!(!env.release(child));
        assert!(!env.release(global));
        assert_eq!(env.lookup_var(child, "count"), Ok(Value::from(0.0)));
    }

    #[test]
    fn test_captured_scopes_outlive_their_functions() {
        let mut env = Environment::new();
        let global = env.global();
        for _ in 0..3 {
            let child = env.new_child(global).unwrap();
            env.mark_captured(child).unwrap();
            assert!(!env.release(child));
        }
        assert_eq!(env.live_scopes(), 4);
    }
}
