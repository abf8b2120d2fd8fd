use std::collections::BTreeMap;

use serde_json::Value;

pub const WILDCARD_KEY: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextChange<'a> {
    pub key: &'a str,
    pub new_value: Option<&'a Value>,
    pub old_value: Option<&'a Value>,
}

type Listener = Box<dyn FnMut(&ContextChange<'_>)>;

struct Subscription {
    handle: SubscriptionHandle,
    key: String,
    listener: Listener,
}

#[derive(Default)]
pub struct ContextStore {
    values: BTreeMap<String, Value>,
    subscriptions: Vec<Subscription>,
    next_handle: u64,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: Value) {
        let old_value = self.values.insert(key.to_string(), value.clone());
        self.notify(key, Some(&value), old_value.as_ref());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn unset(&mut self, key: &str) {
        let Some(old_value) = self.values.remove(key) else {
            return;
        };
        self.notify(key, None, Some(&old_value));
    }

    pub fn clear(&mut self) {
        let keys = self.values.keys().cloned().collect::<Vec<_>>();
        for key in keys {
            self.unset(&key);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.values.clone()
    }

    pub fn subscribe(
        &mut self,
        key: &str,
        listener: impl FnMut(&ContextChange<'_>) + 'static,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next_handle);
        self.next_handle += 1;
        self.subscriptions.push(Subscription {
            handle,
            key: key.to_string(),
            listener: Box::new(listener),
        });
        handle
    }

    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let index = self
            .subscriptions
            .iter()
            .position(|subscription| subscription.handle == handle);

        let Some(index) = index else {
            return false;
        };

        self.subscriptions.remove(index);
        true
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn notify(&mut self, key: &str, new_value: Option<&Value>, old_value: Option<&Value>) {
        let change = ContextChange {
            key,
            new_value,
            old_value,
        };

        for subscription in &mut self.subscriptions {
            if subscription.key == key {
                (subscription.listener)(&change);
            }
        }
        for subscription in &mut self.subscriptions {
            if subscription.key == WILDCARD_KEY {
                (subscription.listener)(&change);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::{ContextStore, WILDCARD_KEY};

    fn recorder(
        store: &mut ContextStore,
        key: &str,
        log: &Rc<RefCell<Vec<(String, Option<serde_json::Value>, Option<serde_json::Value>)>>>,
        tag: &str,
    ) {
        let log = Rc::clone(log);
        let tag = tag.to_string();
        store.subscribe(key, move |change| {
            log.borrow_mut().push((
                format!("{tag}:{}", change.key),
                change.new_value.cloned(),
                change.old_value.cloned(),
            ));
        });
    }

    #[test]
    fn set_then_get_returns_stored_value() {
        let mut store = ContextStore::new();
        store.set("repositories", json!({"in_scope": true}));
        assert_eq!(store.get("repositories"), Some(&json!({"in_scope": true})));
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn overwrite_fires_change_with_old_value() {
        let mut store = ContextStore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        recorder(&mut store, "count", &log, "a");

        store.set("count", json!(1));
        store.set("count", json!(2));

        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], ("a:count".to_string(), Some(json!(1)), None));
        assert_eq!(
            events[1],
            ("a:count".to_string(), Some(json!(2)), Some(json!(1)))
        );
    }

    #[test]
    fn unset_on_absent_key_is_silent() {
        let mut store = ContextStore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        recorder(&mut store, "count", &log, "a");

        store.unset("count");
        assert!(log.borrow().is_empty());

        store.set("count", json!(7));
        store.unset("count");
        store.unset("count");

        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ("a:count".to_string(), None, Some(json!(7))));
    }

    #[test]
    fn wildcard_subscribers_run_after_key_subscribers() {
        let mut store = ContextStore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        recorder(&mut store, WILDCARD_KEY, &log, "wild");
        recorder(&mut store, "count", &log, "keyed");

        store.set("count", json!(1));

        let order = log
            .borrow()
            .iter()
            .map(|(tag, _, _)| tag.clone())
            .collect::<Vec<_>>();
        assert_eq!(order, vec!["keyed:count".to_string(), "wild:count".to_string()]);
    }

    #[test]
    fn unsubscribe_stops_delivery_and_is_idempotent() {
        let mut store = ContextStore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = {
            let log = Rc::clone(&log);
            store.subscribe("count", move |change| {
                log.borrow_mut().push(change.key.to_string());
            })
        };

        store.set("count", json!(1));
        assert!(store.unsubscribe(handle));
        assert!(!store.unsubscribe(handle));
        store.set("count", json!(2));

        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn clear_unsets_every_key() {
        let mut store = ContextStore::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        recorder(&mut store, WILDCARD_KEY, &log, "wild");

        store.set("a", json!(1));
        store.set("b", json!(2));
        store.clear();

        assert!(store.is_empty());
        let removals = log
            .borrow()
            .iter()
            .filter(|(_, new_value, _)| new_value.is_none())
            .count();
        assert_eq!(removals, 2);
    }
}
