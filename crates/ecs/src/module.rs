use std::any::{Any, type_name};
use std::fmt;

use crate::aspect::AspectRef;
use crate::store::Aspects;

/// An engine subsystem notified whenever any aspect is attached or detached.
///
/// Modules are registered once and live as long as the registry. They are
/// polymorphic over aspect type; filter with [`AspectRef::is`] or
/// [`AspectRef::downcast_ref`] when only some types matter.
pub trait Module: 'static {
    fn name(&self) -> &'static str {
        type_name::<Self>()
    }

    /// Reveille: `aspect` has just been attached and is already queryable
    /// through `aspects`.
    fn on_attach(&mut self, aspect: AspectRef<'_>, aspects: &Aspects);

    /// Taps: `aspect` is about to be detached. It is still queryable through
    /// `aspects` for the duration of the call and gone right after.
    fn on_detach(&mut self, aspect: AspectRef<'_>, aspects: &Aspects);
}

trait ModuleSlot {
    fn module(&self) -> &dyn Module;
    fn module_mut(&mut self) -> &mut dyn Module;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<M: Module> ModuleSlot for M {
    fn module(&self) -> &dyn Module {
        self
    }

    fn module_mut(&mut self) -> &mut dyn Module {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Ordered list of registered modules. Registration is additive only.
#[derive(Default)]
pub struct ModuleDispatcher {
    modules: Vec<Box<dyn ModuleSlot>>,
}

impl ModuleDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<M: Module>(&mut self, module: M) {
        tracing::debug!(module = module.name(), "registered module");
        self.modules.push(Box::new(module));
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.module().name()).collect()
    }

    /// The first registered module of type `M`.
    pub fn get<M: Module>(&self) -> Option<&M> {
        self.modules
            .iter()
            .find_map(|m| m.as_any().downcast_ref::<M>())
    }

    pub fn get_mut<M: Module>(&mut self) -> Option<&mut M> {
        self.modules
            .iter_mut()
            .find_map(|m| m.as_any_mut().downcast_mut::<M>())
    }

    pub fn reveille(&mut self, aspect: AspectRef<'_>, aspects: &Aspects) {
        for slot in &mut self.modules {
            let module = slot.module_mut();
            tracing::trace!(
                module = module.name(),
                aspect = aspect.type_name(),
                entity = %aspect.entity(),
                "reveille"
            );
            module.on_attach(aspect, aspects);
        }
    }

    pub fn taps(&mut self, aspect: AspectRef<'_>, aspects: &Aspects) {
        for slot in &mut self.modules {
            let module = slot.module_mut();
            tracing::trace!(
                module = module.name(),
                aspect = aspect.type_name(),
                entity = %aspect.entity(),
                "taps"
            );
            module.on_detach(aspect, aspects);
        }
    }
}

impl fmt::Debug for ModuleDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aspect::Aspect;
    use vesper_common::EntityId;

    #[derive(Debug)]
    struct Marker;
    impl Aspect for Marker {}

    /// Appends its label to a log on every callback.
    struct Labelled {
        label: &'static str,
        log: Vec<String>,
    }

    impl Module for Labelled {
        fn name(&self) -> &'static str {
            self.label
        }

        fn on_attach(&mut self, aspect: AspectRef<'_>, _aspects: &Aspects) {
            self.log.push(format!("{}+{}", self.label, aspect.entity().0));
        }

        fn on_detach(&mut self, aspect: AspectRef<'_>, _aspects: &Aspects) {
            self.log.push(format!("{}-{}", self.label, aspect.entity().0));
        }
    }

    struct Silent;

    impl Module for Silent {
        fn on_attach(&mut self, _aspect: AspectRef<'_>, _aspects: &Aspects) {}
        fn on_detach(&mut self, _aspect: AspectRef<'_>, _aspects: &Aspects) {}
    }

    #[test]
    fn dispatch_reaches_every_module_in_registration_order() {
        let mut dispatcher = ModuleDispatcher::new();
        dispatcher.register(Labelled {
            label: "first",
            log: Vec::new(),
        });
        dispatcher.register(Silent);
        assert_eq!(dispatcher.len(), 2);

        let aspects = Aspects::new();
        let marker = Marker;
        dispatcher.reveille(AspectRef::new(EntityId(1), &marker), &aspects);
        dispatcher.taps(AspectRef::new(EntityId(1), &marker), &aspects);

        let first = dispatcher.get::<Labelled>().unwrap();
        assert_eq!(first.log, vec!["first+1", "first-1"]);

        let names = dispatcher.names();
        assert_eq!(names[0], "first");
        assert!(names[1].ends_with("Silent"));
    }

    #[test]
    fn typed_lookup_misses_unregistered_modules() {
        let mut dispatcher = ModuleDispatcher::new();
        assert!(dispatcher.is_empty());
        assert!(dispatcher.get::<Silent>().is_none());
        dispatcher.register(Silent);
        assert!(dispatcher.get_mut::<Silent>().is_some());
        assert!(dispatcher.get::<Labelled>().is_none());
    }
}
