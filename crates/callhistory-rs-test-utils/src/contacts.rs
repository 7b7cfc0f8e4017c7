use async_trait::async_trait;
use callhistory_rs_protocol::{ContactDirectory, ContactMatch, ContactRecord, DataSourceError};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn contact(id: i64, display_name: &str, phone_number: &str) -> ContactRecord {
    ContactRecord {
        id,
        display_name: display_name.to_string(),
        phone_number: phone_number.to_string(),
        photo_ref: None,
    }
}

/// In-memory contact directory that counts lookups.
#[derive(Debug, Clone, Default)]
pub struct StubDirectory {
    contacts: Arc<Mutex<Vec<ContactRecord>>>,
    lookups: Arc<Mutex<Vec<String>>>,
    failing_numbers: Arc<Mutex<HashSet<String>>>,
    list_failure: Arc<Mutex<Option<DataSourceError>>>,
    list_calls: Arc<AtomicUsize>,
}

impl StubDirectory {
    pub fn new(contacts: Vec<ContactRecord>) -> Self {
        let directory = Self::default();
        directory.set_contacts(contacts);
        directory
    }

    pub fn set_contacts(&self, contacts: Vec<ContactRecord>) {
        *self.contacts.lock() = contacts;
    }

    /// Make lookups of `number` fail until cleared.
    pub fn fail_lookup(&self, number: &str) {
        self.failing_numbers.lock().insert(number.to_string());
    }

    pub fn clear_failures(&self) {
        self.failing_numbers.lock().clear();
        *self.list_failure.lock() = None;
    }

    pub fn fail_list(&self, error: DataSourceError) {
        *self.list_failure.lock() = Some(error);
    }

    /// Every number passed to `lookup_by_number`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContactDirectory for StubDirectory {
    async fn lookup_by_number(
        &self,
        number: &str,
    ) -> Result<Option<ContactMatch>, DataSourceError> {
        self.lookups.lock().push(number.to_string());
        if self.failing_numbers.lock().contains(number) {
            return Err(DataSourceError::QueryFailed(format!("lookup {number}")));
        }
        Ok(self
            .contacts
            .lock()
            .iter()
            .find(|contact| contact.phone_number == number)
            .map(|contact| ContactMatch {
                name: contact.display_name.clone(),
                photo_ref: contact.photo_ref.clone(),
            }))
    }

    async fn list_all(&self) -> Result<Vec<ContactRecord>, DataSourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.list_failure.lock().clone() {
            return Err(error);
        }
        let mut contacts = self.contacts.lock().clone();
        contacts.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(contacts)
    }
}
