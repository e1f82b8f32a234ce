//! Submission order of the files on a tool page.
//!
//! The [`OrderingController`] is the model behind the rearrangeable file
//! list. It only stores the user's arrangement; the order sent to the server
//! is derived from it *and* the live collection each time
//! [`OrderingController::current_order`] is called, so it can never lag
//! behind a later reorder, admission or removal.

use crate::collection::{FileId, ManagedFileCollection};
use crate::error::DeskError;
use tracing::debug;

/// User arrangement of collection members.
#[derive(Debug, Clone, Default)]
pub struct OrderingController {
    arrangement: Vec<FileId>,
}

impl OrderingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current order: arranged members first, in arrangement order, then any
    /// members the arrangement has not seen yet, in insertion order. Ids no
    /// longer in the collection are skipped.
    pub fn current_order(&self, collection: &ManagedFileCollection) -> Vec<FileId> {
        let mut order: Vec<FileId> = self
            .arrangement
            .iter()
            .copied()
            .filter(|id| collection.get(*id).is_some())
            .collect();
        for id in collection.ids() {
            if !order.contains(&id) {
                order.push(id);
            }
        }
        order
    }

    /// Declared names in current order. This is the `order[]` list.
    pub fn current_names(&self, collection: &ManagedFileCollection) -> Vec<String> {
        self.current_order(collection)
            .into_iter()
            .filter_map(|id| collection.get(id).map(|f| f.name().to_string()))
            .collect()
    }

    /// Move the file shown at position `from` to position `to`.
    pub fn move_item(
        &mut self,
        collection: &ManagedFileCollection,
        from: usize,
        to: usize,
    ) -> Result<(), DeskError> {
        let mut order = self.current_order(collection);
        let len = order.len();
        for index in [from, to] {
            if index >= len {
                return Err(DeskError::IndexOutOfRange { index, len });
            }
        }
        let id = order.remove(from);
        order.insert(to, id);
        debug!("Moved {} from {} to {}", id, from, to);
        self.arrangement = order;
        Ok(())
    }

    /// Replace the arrangement with an explicit list of names.
    ///
    /// `names` must be a permutation of the current members' names. When
    /// several members share a name they are matched left to right in
    /// current order.
    pub fn set_order<S: AsRef<str>>(
        &mut self,
        collection: &ManagedFileCollection,
        names: &[S],
    ) -> Result<(), DeskError> {
        let mut pool = self.current_order(collection);
        if names.len() != pool.len() {
            return Err(DeskError::InvalidOrder(format!(
                "expected {} names, got {}",
                pool.len(),
                names.len()
            )));
        }
        let mut arrangement = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let pos = pool
                .iter()
                .position(|id| collection.get(*id).is_some_and(|f| f.name() == name))
                .ok_or_else(|| {
                    DeskError::InvalidOrder(format!(
                        "'{name}' is not in the list (or listed twice)"
                    ))
                })?;
            arrangement.push(pool.remove(pos));
        }
        debug!("Order set to {:?}", arrangement);
        self.arrangement = arrangement;
        Ok(())
    }

    /// Drop the arrangement; order falls back to insertion order.
    pub fn reset(&mut self) {
        self.arrangement.clear();
    }
}
