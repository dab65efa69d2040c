use crate::{depend::DependOnRelated, error::InternalError, value::Value};
use std::{any::Any, rc::Rc};

///
/// ErasedCompute
///
/// Type-erased recomputation rule stored on descriptors. The registry holds
/// descriptors for many entity types, so the instance crosses this boundary
/// as `&dyn Any`; the typed adapter below restores the concrete type.
///

pub(crate) trait ErasedCompute {
    fn compute(&self, instance: &dyn Any) -> Result<Value, InternalError>;
}

// Typed adapter that implements ErasedCompute for a specific entity type.
struct TypedCompute<E> {
    func: Rc<dyn Fn(&E) -> Result<Value, InternalError>>,
}

impl<E: 'static> ErasedCompute for TypedCompute<E> {
    fn compute(&self, instance: &dyn Any) -> Result<Value, InternalError> {
        let instance = instance.downcast_ref::<E>().ok_or_else(|| {
            InternalError::descriptor_internal(
                "compute rule invoked with an instance of a different entity type",
            )
        })?;

        (self.func)(instance)
    }
}

///
/// TokenCompute
///
/// Compute rule for cache-key descriptors: ignores the instance and issues
/// a fresh token on every invocation.
///

pub(crate) struct TokenCompute;

impl ErasedCompute for TokenCompute {
    fn compute(&self, _instance: &dyn Any) -> Result<Value, InternalError> {
        Ok(Value::Int(super::token::next_token()))
    }
}

///
/// ComputeRule
///
/// A compute function paired explicitly with its dependency declarations.
/// The pairing is a value, constructed up front; dependency metadata is
/// never attached to a callable after the fact.
///

pub struct ComputeRule<E> {
    func: Rc<dyn Fn(&E) -> Result<Value, InternalError>>,
    depend: Vec<DependOnRelated>,
}

impl<E: 'static> ComputeRule<E> {
    pub fn new(func: impl Fn(&E) -> Result<Value, InternalError> + 'static) -> Self {
        Self {
            func: Rc::new(func),
            depend: Vec::new(),
        }
    }

    /// Append a dependency edge. May be called repeatedly; each call adds
    /// one independently matchable declaration.
    #[must_use]
    pub fn depends_on(mut self, dep: DependOnRelated) -> Self {
        self.depend.push(dep);
        self
    }

    pub(crate) fn into_parts(self) -> (Rc<dyn ErasedCompute>, Vec<DependOnRelated>) {
        let erased: Rc<dyn ErasedCompute> = Rc::new(TypedCompute { func: self.func });

        (erased, self.depend)
    }
}

///
/// SkipRule
///
/// Predicate that suppresses dependency-triggered recomputation for a given
/// instance. Absence means "never skip". Pre-save computation of computed
/// fields is unconditional and does not consult this rule.
///

#[derive(Clone)]
pub struct SkipRule {
    predicate: Rc<dyn Fn(&dyn Any) -> bool>,
}

impl SkipRule {
    pub fn new<E: 'static>(predicate: impl Fn(&E) -> bool + 'static) -> Self {
        Self {
            predicate: Rc::new(move |instance: &dyn Any| {
                // A wrong-type instance cannot satisfy the predicate; fall
                // through to recomputation rather than silently skipping.
                instance.downcast_ref::<E>().is_some_and(&predicate)
            }),
        }
    }

    #[must_use]
    pub(crate) fn should_skip(&self, instance: &dyn Any) -> bool {
        (self.predicate)(instance)
    }
}
