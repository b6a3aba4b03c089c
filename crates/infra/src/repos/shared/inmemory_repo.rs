use barbershop_booking_domain::{Entity, ID};
use std::sync::Mutex;

/// Useful functions for creating inmemory repositories

pub fn insert<T: Clone>(val: &T, collection: &Mutex<Vec<T>>) {
    let mut collection = collection.lock().unwrap();
    collection.push(val.clone());
}

pub fn save<T: Clone + Entity>(val: &T, collection: &Mutex<Vec<T>>) {
    let mut collection = collection.lock().unwrap();
    for item in collection.iter_mut() {
        if item.id() == val.id() {
            *item = val.clone();
        }
    }
}

pub fn find<T: Clone + Entity>(val_id: &ID, collection: &Mutex<Vec<T>>) -> Option<T> {
    let collection = collection.lock().unwrap();
    collection.iter().find(|item| item.id() == val_id).cloned()
}

pub fn find_by<T: Clone, F: FnMut(&T) -> bool>(collection: &Mutex<Vec<T>>, mut compare: F) -> Vec<T> {
    let collection = collection.lock().unwrap();
    collection.iter().filter(|item| compare(item)).cloned().collect()
}

/// Applies `update` to every matching item while holding the lock and
/// returns the updated items
pub fn update_many<T: Clone, F: Fn(&T) -> bool, U: Fn(&mut T)>(
    collection: &Mutex<Vec<T>>,
    compare: F,
    update: U,
) -> Vec<T> {
    let mut collection = collection.lock().unwrap();
    let mut updated = Vec::new();
    for item in collection.iter_mut() {
        if compare(item) {
            update(item);
            updated.push(item.clone());
        }
    }
    updated
}

/// Compare-and-set on a single item. `update` is only applied when the item
/// exists and `precondition` holds, which is checked under the same lock.
pub fn update_if<T: Clone + Entity, P: Fn(&T) -> bool, U: FnOnce(&mut T)>(
    val_id: &ID,
    collection: &Mutex<Vec<T>>,
    precondition: P,
    update: U,
) -> bool {
    let mut collection = collection.lock().unwrap();
    match collection.iter_mut().find(|item| item.id() == val_id) {
        Some(item) if precondition(item) => {
            update(item);
            true
        }
        _ => false,
    }
}
