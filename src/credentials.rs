//! Password storage in the operating system's keyring.

use eyre::{WrapErr, eyre};
use keyring::Entry;

/// Keyring service name that passwords are stored under; the account is the DDI username.
const SERVICE_NAME: &str = "ddi";

fn entry(username: &str) -> eyre::Result<Entry> {
    Entry::new(SERVICE_NAME, username)
        .map_err(|e| eyre!(e))
        .wrap_err_with(|| format!("Failed to open keyring entry for {username}"))
}

/// Reads the password held by `entry`. A missing entry is not an error.
fn read_entry(entry: &Entry) -> eyre::Result<Option<String>> {
    match entry.get_password() {
        Ok(password) => Ok(Some(password)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(eyre!(e).wrap_err("Failed to read password from keyring")),
    }
}

fn write_entry(entry: &Entry, password: &str) -> eyre::Result<()> {
    entry
        .set_password(password)
        .map_err(|e| eyre!(e))
        .wrap_err("Failed to write password to keyring")
}

/// Stores `password` for `username`, replacing any previous value.
pub fn store_password(username: &str, password: &str) -> eyre::Result<()> {
    log::debug!("Setting password for user: {username}");
    write_entry(&entry(username)?, password)
}

/// The stored password for `username`, if the keyring has one and can be read.
///
/// An unusable keyring (e.g. no secret service on a headless box) is logged and treated as empty.
fn keyring_password(username: &str, entry: eyre::Result<Entry>) -> Option<String> {
    match entry.and_then(|entry| read_entry(&entry)) {
        Ok(Some(password)) => {
            log::debug!("Using password from keyring for user: {username}");
            Some(password)
        },
        Ok(None) => {
            log::debug!("No password in keyring for user: {username}");
            None
        },
        Err(e) => {
            log::warn!("{e:#}");
            None
        },
    }
}

/// Works out which password to use: explicit flag or environment, then the keyring, then an interactive prompt.
pub fn resolve_password(explicit: Option<String>, username: &str) -> eyre::Result<String> {
    if let Some(password) = explicit {
        return Ok(password);
    }

    match keyring_password(username, entry(username)) {
        Some(password) => Ok(password),
        None => crate::prompt::password(&format!("Password for {username}")),
    }
}


#[cfg(test)]
mod tests {
    use keyring::mock::MockCredential;

    use super::*;

    /// An entry backed by keyring's in-memory mock store.
    ///
    /// Mock credentials aren't shared between entries, so each test keeps hold of the one it creates.
    fn mock_entry(username: &str) -> Entry {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        Entry::new(SERVICE_NAME, username).unwrap()
    }

    #[test]
    fn explicit_password_wins() {
        let password = resolve_password(Some("hunter2".to_string()), "test_user").unwrap();
        assert_eq!(password, "hunter2");
    }

    #[test]
    fn stored_password_round_trips() {
        let entry = mock_entry("test_user");
        assert_eq!(read_entry(&entry).unwrap(), None);

        write_entry(&entry, "test_password").unwrap();
        assert_eq!(read_entry(&entry).unwrap().as_deref(), Some("test_password"));

        write_entry(&entry, "new_password").unwrap();
        assert_eq!(read_entry(&entry).unwrap().as_deref(), Some("new_password"));
    }

    #[test]
    fn keyring_hit_is_used() {
        let entry = mock_entry("test_user");
        write_entry(&entry, "test_password").unwrap();
        assert_eq!(keyring_password("test_user", Ok(entry)).as_deref(), Some("test_password"));
    }

    #[test]
    fn missing_entry_falls_through() {
        let entry = mock_entry("nobody");
        assert_eq!(keyring_password("nobody", Ok(entry)), None);
    }

    #[test]
    fn broken_keyring_falls_through() {
        let entry = mock_entry("test_user");
        write_entry(&entry, "test_password").unwrap();

        let mock: &MockCredential = entry.get_credential().downcast_ref().unwrap();
        mock.set_error(keyring::Error::PlatformFailure("secret service unavailable".into()));
        assert!(read_entry(&entry).is_err());

        mock.set_error(keyring::Error::PlatformFailure("secret service unavailable".into()));
        assert_eq!(keyring_password("test_user", Ok(entry)), None);

        assert_eq!(keyring_password("test_user", Err(eyre!("no keyring"))), None);
    }
}
