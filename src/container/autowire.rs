//! Auto-wiring: building values from their declared constructors.

use smallvec::SmallVec;

use super::{Container, ResolutionContext, ResolutionTracer};
use crate::constructor::{self, Arguments, Produced};
use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::error::{DiError, DiResult};
use crate::internal::StackGuard;
use crate::overrides::ParameterOverride;
use crate::registration::{erase_value, AnyArc};

impl Container {
    /// Builds a `ty` on this container without consulting registrations for
    /// `ty` itself. Disposable results are tracked here.
    pub(crate) fn create(
        &self,
        ty: &TypeDescriptor,
        ctx: &ResolutionContext<'_>,
        overrides: &[ParameterOverride],
        mut tracer: Option<&mut ResolutionTracer>,
    ) -> DiResult<Option<AnyArc>> {
        step!(tracer, "Creating instance of {}...", ty);
        match ty.kind() {
            TypeKind::Container => Ok(Some(erase_value(self.clone()))),
            TypeKind::Deferred(synthesize) | TypeKind::Invocable { synthesize, .. } => {
                step!(tracer, "Creating factory...");
                Ok(Some(synthesize(self)))
            }
            TypeKind::Closed { template, .. } => {
                step!(tracer, "No registration for {} in family {}", ty, template.name());
                Ok(None)
            }
            TypeKind::Plain(_) => {
                let ctx = ctx.with_resolved(ty.clone());
                let Some(produced) = self.construct(ty, &ctx, overrides, tracer)? else {
                    return Ok(None);
                };
                self.track(produced.disposer);
                Ok(Some(produced.value))
            }
        }
    }

    /// Selects a constructor of `ty`, resolves its parameters and invokes it.
    ///
    /// A parameter takes the first matching override; failing that, the
    /// parameter's declared type is resolved from this container without
    /// overrides. Unresolvable parameters reach the constructor as empty slots.
    pub(crate) fn construct(
        &self,
        ty: &TypeDescriptor,
        ctx: &ResolutionContext<'_>,
        overrides: &[ParameterOverride],
        mut tracer: Option<&mut ResolutionTracer>,
    ) -> DiResult<Option<Produced>> {
        let constructors = ty.constructors();
        let Some(constructor) = constructor::select(&constructors) else {
            step!(tracer, "No suitable constructor found for {}", ty);
            return Ok(None);
        };
        let _guard = StackGuard::enter(ty.frame(), ty.type_name(), self.max_depth())?;

        let mut values = SmallVec::with_capacity(constructor.parameters().len());
        for parameter in constructor.parameters() {
            step!(
                tracer,
                "Resolving {} constructor parameter {} of type {}",
                ty,
                parameter.name(),
                parameter.declared_type()
            );
            let overridden = match overrides.iter().find(|o| o.matches(parameter)) {
                Some(found) => found.value_for(parameter, self)?,
                None => None,
            };
            let value = match overridden {
                Some(value) => Some(value),
                None => self.try_get(
                    parameter.declared_type(),
                    None,
                    &[],
                    self,
                    Some(ctx),
                    tracer.as_deref_mut(),
                )?,
            };
            values.push(value);
        }

        let arguments = Arguments::new(constructor.parameters(), values);
        constructor
            .invoke(&arguments)
            .map(Some)
            .map_err(|source| DiError::ConstructionFailed {
                type_name: ty.type_name(),
                source,
            })
    }
}
