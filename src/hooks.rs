//! Priority-ordered extension points.
//!
//! Handlers are plain data: a name, a priority and a function. Lower priorities run first;
//! equal priorities keep registration order.

use std::fmt;
use std::sync::Arc;

use crate::error::StoreError;

type FilterFn<T, C> = Arc<dyn Fn(T, &C) -> Result<T, StoreError> + Send + Sync>;
type EventFn<E> = Arc<dyn Fn(&E) -> Result<(), StoreError> + Send + Sync>;

pub struct FilterHandler<T, C> {
    pub name: String,
    pub priority: i32,
    apply: FilterFn<T, C>,
}

impl<T, C> FilterHandler<T, C> {
    pub fn new<F>(name: impl Into<String>, priority: i32, apply: F) -> Self
    where
        F: Fn(T, &C) -> Result<T, StoreError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            apply: Arc::new(apply),
        }
    }
}

impl<T, C> Clone for FilterHandler<T, C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            priority: self.priority,
            apply: Arc::clone(&self.apply),
        }
    }
}

/// Threads a value through every handler in priority order.
pub struct FilterPipeline<T, C> {
    hook: &'static str,
    handlers: Vec<FilterHandler<T, C>>,
}

impl<T, C> FilterPipeline<T, C> {
    pub fn new(hook: &'static str) -> Self {
        Self {
            hook,
            handlers: Vec::new(),
        }
    }

    pub fn with(mut self, handler: FilterHandler<T, C>) -> Self {
        self.push(handler);
        self
    }

    pub fn push(&mut self, handler: FilterHandler<T, C>) {
        self.handlers.push(handler);
        self.handlers.sort_by_key(|h| h.priority);
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|h| h.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Stops at the first failing handler; its error is tagged with the hook name.
    pub fn apply(&self, mut value: T, context: &C) -> Result<T, StoreError> {
        for handler in &self.handlers {
            value = (handler.apply)(value, context).map_err(|e| self.tag(&handler.name, e))?;
        }
        Ok(value)
    }

    fn tag(&self, handler: &str, err: StoreError) -> StoreError {
        match err {
            StoreError::Hook { .. } => err,
            other => StoreError::Hook {
                hook: self.hook,
                message: format!("{handler}: {other}"),
            },
        }
    }
}

impl<T, C> fmt::Debug for FilterPipeline<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterPipeline")
            .field("hook", &self.hook)
            .field("handlers", &self.handlers.iter().map(|h| &h.name).collect::<Vec<_>>())
            .finish()
    }
}

pub struct EventHandler<E> {
    pub name: String,
    pub priority: i32,
    on: EventFn<E>,
}

impl<E> EventHandler<E> {
    pub fn new<F>(name: impl Into<String>, priority: i32, on: F) -> Self
    where
        F: Fn(&E) -> Result<(), StoreError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority,
            on: Arc::new(on),
        }
    }
}

/// Notifies every handler in priority order.
pub struct EventPipeline<E> {
    hook: &'static str,
    handlers: Vec<EventHandler<E>>,
}

impl<E> EventPipeline<E> {
    pub fn new(hook: &'static str) -> Self {
        Self {
            hook,
            handlers: Vec::new(),
        }
    }

    pub fn with(mut self, handler: EventHandler<E>) -> Self {
        self.push(handler);
        self
    }

    pub fn push(&mut self, handler: EventHandler<E>) {
        self.handlers.push(handler);
        self.handlers.sort_by_key(|h| h.priority);
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn trigger(&self, event: &E) -> Result<(), StoreError> {
        for handler in &self.handlers {
            (handler.on)(event).map_err(|e| StoreError::Hook {
                hook: self.hook,
                message: format!("{}: {e}", handler.name),
            })?;
        }
        Ok(())
    }
}

impl<E> fmt::Debug for EventPipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPipeline")
            .field("hook", &self.hook)
            .field("handlers", &self.handlers.iter().map(|h| &h.name).collect::<Vec<_>>())
            .finish()
    }
}
