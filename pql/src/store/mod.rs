//! Persistence of the "current" query text between user actions.
//!
//! The editing operations never touch a slot. Callers load once, apply their
//! edits, and save once.

mod atomic;
mod file;

pub use file::FileSlot;

use log::trace;

use crate::builder::{apply_all_with, Mutation};
use crate::query::DEFAULT_MAX_DEPTH;
use crate::Result;

/// A single named place holding the current PQL text.
pub trait QuerySlot {
    fn load_current(&self) -> Result<String>;
    fn save_current(&mut self, text: &str) -> Result<()>;
}

/// Load, apply `mutations` in order, save, and return the new text.
///
/// Nothing is saved if any edit fails.
pub fn apply_to_slot<'a, S>(
    slot: &mut S,
    mutations: impl IntoIterator<Item = &'a Mutation>,
) -> Result<String>
where
    S: QuerySlot + ?Sized,
{
    apply_to_slot_with(slot, mutations, DEFAULT_MAX_DEPTH)
}

/// [`apply_to_slot`] with a custom parser nesting limit.
pub fn apply_to_slot_with<'a, S>(
    slot: &mut S,
    mutations: impl IntoIterator<Item = &'a Mutation>,
    max_depth: usize,
) -> Result<String>
where
    S: QuerySlot + ?Sized,
{
    let current = slot.load_current()?;
    let updated = apply_all_with(&current, mutations, max_depth)?;
    trace!("Query slot updated: {:?} -> {:?}", current, updated);
    slot.save_current(&updated)?;
    Ok(updated)
}

/// In-process slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySlot {
    text: String,
}

impl MemorySlot {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl QuerySlot for MemorySlot {
    fn load_current(&self) -> Result<String> {
        Ok(self.text.clone())
    }

    fn save_current(&mut self, text: &str) -> Result<()> {
        self.text = text.to_string();
        Ok(())
    }
}

/// Slot backed by two injected functions, e.g. reading and writing a URL parameter.
pub struct FnSlot<L, S> {
    load: L,
    save: S,
}

impl<L, S> FnSlot<L, S>
where
    L: Fn() -> Result<String>,
    S: FnMut(&str) -> Result<()>,
{
    pub fn new(load: L, save: S) -> Self {
        Self { load, save }
    }
}

impl<L, S> QuerySlot for FnSlot<L, S>
where
    L: Fn() -> Result<String>,
    S: FnMut(&str) -> Result<()>,
{
    fn load_current(&self) -> Result<String> {
        (self.load)()
    }

    fn save_current(&mut self, text: &str) -> Result<()> {
        (self.save)(text)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::ast::Limit;
    use crate::Error;

    fn add(category: &str, facet: &str, term: &str) -> Mutation {
        Mutation::AddTerm {
            category: category.to_string(),
            facet: facet.to_string(),
            term: term.into(),
        }
    }

    #[test]
    fn test_memory_slot() {
        let mut slot = MemorySlot::default();
        let text = apply_to_slot(&mut slot, &[add("donor", "gender", "male")]).unwrap();
        assert_eq!(text, r#"eq(donor.gender,"male")"#);
        assert_eq!(slot.load_current().unwrap(), text);

        apply_to_slot(&mut slot, &[add("donor", "gender", "female")]).unwrap();
        assert_eq!(
            slot.load_current().unwrap(),
            r#"in(donor.gender,"male","female")"#
        );
    }

    #[test]
    fn test_fn_slot_loads_and_saves_once() {
        let param = Rc::new(RefCell::new(String::from("limit(0,10)")));
        let saves = Rc::new(RefCell::new(0));

        let read = Rc::clone(&param);
        let write = Rc::clone(&param);
        let counter = Rc::clone(&saves);
        let mut slot = FnSlot::new(
            move || Ok(read.borrow().clone()),
            move |text: &str| {
                *write.borrow_mut() = text.to_string();
                *counter.borrow_mut() += 1;
                Ok(())
            },
        );

        let steps = [
            add("donor", "age", "22"),
            Mutation::SetLimit(Limit::new(10, Some(10))),
        ];
        apply_to_slot(&mut slot, &steps).unwrap();

        assert_eq!(*param.borrow(), r#"eq(donor.age,"22"),limit(10,10)"#);
        assert_eq!(*saves.borrow(), 1);
    }

    #[test]
    fn test_failed_edit_saves_nothing() {
        let mut slot = MemorySlot::new("eq(donor.age,");
        let result = apply_to_slot(&mut slot, &[add("donor", "age", "22")]);
        assert!(matches!(result, Err(Error::Parse(_))));
        assert_eq!(slot.load_current().unwrap(), "eq(donor.age,");
    }

    #[test]
    fn test_slot_depth_limit() {
        let deep = format!("{}eq(a.b,1){}", "not(".repeat(69), ")".repeat(69));
        let mut slot = MemorySlot::new(deep.clone());
        let step = [add("donor", "age", "22")];

        let result = apply_to_slot(&mut slot, &step);
        assert!(matches!(result, Err(Error::Parse(_))));
        assert_eq!(slot.load_current().unwrap(), deep);

        let text = apply_to_slot_with(&mut slot, &step, 100).unwrap();
        assert!(text.starts_with(r#"eq(donor.age,"22"),not("#));
        assert_eq!(slot.load_current().unwrap(), text);
    }

    #[test]
    fn test_dyn_slot() {
        let mut slot: Box<dyn QuerySlot> = Box::new(MemorySlot::default());
        apply_to_slot(slot.as_mut(), &[Mutation::IncludesFacets]).unwrap();
        assert_eq!(slot.load_current().unwrap(), "facets(*)");
    }
}
