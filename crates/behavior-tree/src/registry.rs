//! Class-name registry used to instantiate nodes from data.
//!
//! Each entry maps a class name to a factory taking the node's [`Params`].
//! Hosts register their own kinds next to the built-ins and hand the registry
//! to [`TreeDocument::instantiate`](crate::TreeDocument::instantiate).

use std::collections::BTreeMap;

use crate::behavior::{Action, Condition, Decorator};
use crate::error::RegistryError;
use crate::{
    AlwaysSucceed, Blackboard, BlackboardFlag, Cooldown, FloatAtMost, ForceResult, Inverter,
    Params, SetFlag, Wait,
};

pub type ActionFactory = Box<dyn Fn(&Params) -> Box<dyn Action> + Send + Sync>;
pub type ConditionFactory = Box<dyn Fn(&Params) -> Box<dyn Condition> + Send + Sync>;
pub type DecoratorFactory = Box<dyn Fn(&Params) -> Box<dyn Decorator> + Send + Sync>;
pub type BlackboardFactory = Box<dyn Fn() -> Blackboard + Send + Sync>;

#[derive(Default)]
pub struct NodeRegistry {
    actions: BTreeMap<String, ActionFactory>,
    conditions: BTreeMap<String, ConditionFactory>,
    decorators: BTreeMap<String, DecoratorFactory>,
    blackboards: BTreeMap<String, BlackboardFactory>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the kinds shipped by this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_action("SetFlag", SetFlag::from_params);
        registry.register_action("Wait", Wait::from_params);
        registry.register_condition("BlackboardFlag", BlackboardFlag::from_params);
        registry.register_condition("FloatAtMost", FloatAtMost::from_params);
        registry.register_decorator("Inverter", |_| Inverter);
        registry.register_decorator("AlwaysSucceed", |_| AlwaysSucceed);
        registry.register_decorator("ForceResult", ForceResult::from_params);
        registry.register_decorator("Cooldown", Cooldown::from_params);
        registry
    }

    /// Registers (or replaces) an action class.
    pub fn register_action<A, F>(&mut self, class: impl Into<String>, factory: F)
    where
        A: Action + 'static,
        F: Fn(&Params) -> A + Send + Sync + 'static,
    {
        self.actions.insert(
            class.into(),
            Box::new(move |params: &Params| -> Box<dyn Action> { Box::new(factory(params)) }),
        );
    }

    pub fn register_condition<C, F>(&mut self, class: impl Into<String>, factory: F)
    where
        C: Condition + 'static,
        F: Fn(&Params) -> C + Send + Sync + 'static,
    {
        self.conditions.insert(
            class.into(),
            Box::new(move |params: &Params| -> Box<dyn Condition> { Box::new(factory(params)) }),
        );
    }

    pub fn register_decorator<D, F>(&mut self, class: impl Into<String>, factory: F)
    where
        D: Decorator + 'static,
        F: Fn(&Params) -> D + Send + Sync + 'static,
    {
        self.decorators.insert(
            class.into(),
            Box::new(move |params: &Params| -> Box<dyn Decorator> { Box::new(factory(params)) }),
        );
    }

    pub fn register_blackboard<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn() -> Blackboard + Send + Sync + 'static,
    {
        self.blackboards.insert(class.into(), Box::new(factory));
    }

    pub fn create_action(
        &self,
        class: &str,
        params: &Params,
    ) -> Result<Box<dyn Action>, RegistryError> {
        let factory = self
            .actions
            .get(class)
            .ok_or_else(|| not_found("action", class))?;
        Ok(factory(params))
    }

    pub fn create_condition(
        &self,
        class: &str,
        params: &Params,
    ) -> Result<Box<dyn Condition>, RegistryError> {
        let factory = self
            .conditions
            .get(class)
            .ok_or_else(|| not_found("condition", class))?;
        Ok(factory(params))
    }

    pub fn create_decorator(
        &self,
        class: &str,
        params: &Params,
    ) -> Result<Box<dyn Decorator>, RegistryError> {
        let factory = self
            .decorators
            .get(class)
            .ok_or_else(|| not_found("decorator", class))?;
        Ok(factory(params))
    }

    pub fn create_blackboard(&self, class: &str) -> Result<Blackboard, RegistryError> {
        let factory = self
            .blackboards
            .get(class)
            .ok_or_else(|| not_found("blackboard", class))?;
        Ok(factory())
    }

    pub fn action_classes(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn condition_classes(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    pub fn decorator_classes(&self) -> impl Iterator<Item = &str> {
        self.decorators.keys().map(String::as_str)
    }

    pub fn blackboard_classes(&self) -> impl Iterator<Item = &str> {
        self.blackboards.keys().map(String::as_str)
    }
}

fn not_found(category: &'static str, class: &str) -> RegistryError {
    RegistryError::NotFound {
        category,
        class: class.to_owned(),
    }
}
